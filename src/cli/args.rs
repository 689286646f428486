use clap::{Args, Subcommand};
use std::path::PathBuf;
use utf_d::{Base64Options, Encoding, LastChunkHandling};

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Convert text between encodings
    Transcode(TranscodeArgs),
    /// Check that input is well formed
    Validate(ValidateArgs),
    /// Encode or decode Base64
    Base64(Base64Args),
    /// Guess the encoding of the input
    Detect(DetectArgs),
    /// Show known encodings and backends
    List,
}

/// Arguments for transcoding
#[derive(Args, Debug)]
pub struct TranscodeArgs {
    /// Input file (reads from stdin if not provided)
    pub file: Option<PathBuf>,

    /// Source encoding
    #[arg(short = 'f', long, value_name = "ENCODING")]
    pub from: Option<Encoding>,

    /// Target encoding
    #[arg(short = 't', long, value_name = "ENCODING")]
    pub to: Option<Encoding>,

    /// Replace malformed input instead of failing
    #[arg(long)]
    pub lossy: bool,

    /// Drop a leading byte-order mark
    #[arg(long, overrides_with = "keep_bom")]
    pub strip_bom: bool,

    /// Keep a leading byte-order mark as text
    #[arg(long, overrides_with = "strip_bom")]
    pub keep_bom: bool,

    /// Write a byte-order mark before the output
    #[arg(long)]
    pub emit_bom: bool,

    /// Output file (writes to stdout if not provided)
    #[arg(short = 'o', long)]
    pub output: Option<PathBuf>,
}

/// Arguments for validation
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Input file (reads from stdin if not provided)
    pub file: Option<PathBuf>,

    /// Encoding to check against (autodetected if not provided)
    #[arg(short = 'e', long, value_name = "ENCODING")]
    pub encoding: Option<Encoding>,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for Base64
#[derive(Args, Debug)]
pub struct Base64Args {
    /// Input file (reads from stdin if not provided)
    pub file: Option<PathBuf>,

    /// Decode instead of encode
    #[arg(short = 'd', long)]
    pub decode: bool,

    /// Use the URL-safe alphabet
    #[arg(long, conflicts_with = "options")]
    pub url: bool,

    /// Named option set, e.g. default, url, default_accept_garbage
    #[arg(long, value_name = "NAME")]
    pub options: Option<Base64Options>,

    /// Handling of an incomplete final group when decoding
    #[arg(long, value_name = "MODE")]
    pub last_chunk: Option<LastChunkHandling>,

    /// Wrap encoded output after N characters (0 disables)
    #[arg(short = 'w', long, value_name = "N")]
    pub wrap: Option<usize>,

    /// Output file (writes to stdout if not provided)
    #[arg(short = 'o', long)]
    pub output: Option<PathBuf>,
}

/// Arguments for encoding detection
#[derive(Args, Debug)]
pub struct DetectArgs {
    /// Input file (reads from stdin if not provided)
    pub file: Option<PathBuf>,
}
