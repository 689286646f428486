use crate::cli::{Context, Diagnostic, args::ValidateArgs, read_input};
use serde::Serialize;
use std::process::ExitCode;
use utf_d::convenience::validate_encoded_with;
use utf_d::{ConversionError, Encoding, ErrorKind, autodetect_encoding};

#[derive(Serialize)]
struct Report {
    encoding: Encoding,
    valid: bool,
    error: Option<ErrorKind>,
    /// Index of the bad unit, counted from the start of the input.
    position: Option<usize>,
    /// Code units checked, excluding a byte-order mark.
    length: usize,
}

pub fn handle(args: ValidateArgs, ctx: &Context) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let input = read_input(args.file.as_deref())?;
    // nothing validates: report against UTF-8, the likeliest intent
    let encoding = args
        .encoding
        .or_else(|| autodetect_encoding(&input))
        .unwrap_or(Encoding::Utf8);

    let bom = encoding.bom();
    let skip = if !bom.is_empty() && input.starts_with(bom) { bom.len() } else { 0 };
    let result = validate_encoded_with(ctx.codec, &input[skip..], encoding)
        .map_err(|e| ConversionError::new(e.kind, e.position + skip / encoding.unit_size()));

    let report = match result {
        Ok(length) => Report {
            encoding,
            valid: true,
            error: None,
            position: None,
            length,
        },
        Err(e) => Report {
            encoding,
            valid: false,
            error: Some(e.kind),
            position: Some(e.position),
            length: (input.len() - skip) / encoding.unit_size(),
        },
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        match result {
            Ok(length) => println!("valid {encoding} ({length} code units)"),
            Err(e) => eprintln!("{}", Diagnostic::new(encoding, e, &input)),
        }
    }

    Ok(if report.valid { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}
