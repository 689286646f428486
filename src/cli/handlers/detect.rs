use crate::cli::{Context, args::DetectArgs, read_input};
use std::process::ExitCode;
use utf_d::{autodetect_encoding, bom_byte_size, check_bom, detect_encodings};

pub fn handle(args: DetectArgs, _ctx: &Context) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let input = read_input(args.file.as_deref())?;

    match check_bom(&input) {
        Some(encoding) => println!("bom: {encoding} ({} bytes)", bom_byte_size(&input)),
        None => println!("bom: none"),
    }

    let Some(best) = autodetect_encoding(&input) else {
        println!("encoding: unknown");
        return Ok(ExitCode::FAILURE);
    };
    println!("encoding: {best}");

    let candidates: Vec<String> = detect_encodings(&input).iter().map(|e| e.to_string()).collect();
    if candidates.len() > 1 {
        println!("candidates: {}", candidates.join(", "));
    }
    Ok(ExitCode::SUCCESS)
}
