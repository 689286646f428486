use crate::cli::Context;
use std::process::ExitCode;
use utf_d::{Base64Options, Encoding, available_implementations};

pub fn handle(ctx: &Context) -> Result<ExitCode, Box<dyn std::error::Error>> {
    println!("Encodings:");
    for encoding in Encoding::ALL {
        let bom = encoding.bom();
        let bom = if bom.is_empty() {
            "none".to_string()
        } else {
            hex::encode(bom)
        };
        println!("  {:<10} {}-byte units, BOM {bom}", encoding.name(), encoding.unit_size());
    }

    println!("\nImplementations:");
    for descriptor in available_implementations() {
        let marker = if descriptor.name == ctx.codec.name() { "*" } else { " " };
        let status = if descriptor.is_supported() { "supported" } else { "unsupported" };
        let features: Vec<&str> = descriptor.required_features.iter().map(|f| f.name()).collect();
        let features = if features.is_empty() {
            String::new()
        } else {
            format!(" [{}]", features.join(", "))
        };
        println!(
            "{marker} {:<10} {:<12} {}{features}",
            descriptor.name, status, descriptor.description
        );
    }

    let options: Vec<&str> = Base64Options::ALL.iter().map(|o| o.name()).collect();
    println!("\nBase64 options: {}", options.join(", "));
    Ok(ExitCode::SUCCESS)
}
