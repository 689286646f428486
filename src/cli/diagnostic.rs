use std::fmt;
use utf_d::{ConversionError, Encoding, ErrorKind, FullResult};

/// Bytes shown on each side of the offending unit.
const CONTEXT: usize = 8;

/// Malformed input, rendered with the offending bytes in hex and a caret
/// under the first bad one.
#[derive(Debug)]
pub struct Diagnostic {
    /// What the input was supposed to be, e.g. `UTF-16LE` or `base64`.
    subject: String,
    kind: ErrorKind,
    /// Index of the bad unit.
    position: usize,
    unit_size: usize,
    /// Hex of the bytes around the error.
    window: String,
    /// Column of the caret within `window`.
    caret: usize,
}

impl Diagnostic {
    /// `input` is the raw byte input; `error.position` is in units of `encoding`.
    pub fn new(encoding: Encoding, error: ConversionError, input: &[u8]) -> Self {
        Self::build(encoding.to_string(), error.kind, error.position, encoding.unit_size(), input)
    }

    /// A failed Base64 decode; `input_count` locates the bad character.
    pub fn base64(result: FullResult, input: &[u8]) -> Self {
        Self::build("base64".to_string(), result.error, result.input_count, 1, input)
    }

    fn build(subject: String, kind: ErrorKind, position: usize, unit_size: usize, input: &[u8]) -> Self {
        let at = (position * unit_size).min(input.len());
        let start = at.saturating_sub(CONTEXT);
        let end = (at + unit_size + CONTEXT).min(input.len());
        let before = hex::encode(&input[start..at]);
        let window = hex::encode(&input[start..end]);
        // two hex digits per byte, plus the separating spaces added below
        let caret = before.len() / 2 * 3;
        Self {
            subject,
            kind,
            position,
            unit_size,
            window: spaced(&window),
            caret,
        }
    }

    pub fn byte_offset(&self) -> usize {
        self.position * self.unit_size
    }
}

fn spaced(hex: &str) -> String {
    hex.as_bytes()
        .chunks(2)
        .map(|pair| String::from_utf8_lossy(pair).into_owned())
        .collect::<Vec<_>>()
        .join(" ")
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let use_color = should_use_color();
        let kind = self.kind;

        if use_color {
            writeln!(
                f,
                "\x1b[1;31merror:\x1b[0m invalid {}: {} ({kind})",
                self.subject,
                kind.description()
            )?;
        } else {
            writeln!(f, "error: invalid {}: {} ({kind})", self.subject, kind.description())?;
        }
        writeln!(f)?;

        writeln!(f, "  {}", self.window)?;
        write!(f, "  {}", " ".repeat(self.caret))?;
        if use_color {
            writeln!(f, "\x1b[1;31m^^\x1b[0m")?;
        } else {
            writeln!(f, "^^")?;
        }
        writeln!(f)?;

        let unit = match self.unit_size {
            1 => "byte",
            2 => "16-bit unit",
            _ => "32-bit unit",
        };
        if use_color {
            write!(f, "\x1b[1;36mat:\x1b[0m ")?;
        } else {
            write!(f, "at: ")?;
        }
        if self.unit_size == 1 {
            write!(f, "{unit} {}", self.position)
        } else {
            write!(f, "{unit} {} (byte offset {})", self.position, self.byte_offset())
        }
    }
}

impl std::error::Error for Diagnostic {}

/// Check if colored output should be used
pub fn should_use_color() -> bool {
    if std::env::var("NO_COLOR").is_ok() {
        return false;
    }

    use std::io::IsTerminal;
    std::io::stderr().is_terminal()
}
