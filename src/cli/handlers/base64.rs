use crate::cli::{Context, Diagnostic, args::Base64Args, read_input, write_output};
use std::process::ExitCode;
use tracing::debug;
use utf_d::{
    Base64Options, base64_length_from_binary, base64_length_from_binary_with_lines,
    maximal_binary_length_from_base64,
};

/// MIME line length, used when neither the flag nor the settings give one.
const DEFAULT_LINE_LENGTH: usize = 76;

pub fn handle(args: Base64Args, ctx: &Context) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let input = read_input(args.file.as_deref())?;
    let defaults = &ctx.settings.base64;
    let options = if args.url {
        Base64Options::Url
    } else {
        args.options.or(defaults.options).unwrap_or_default()
    };

    let output = if args.decode {
        let last_chunk = args.last_chunk.or(defaults.last_chunk).unwrap_or_default();
        debug!(options = options.name(), last_chunk = last_chunk.name(), "decoding base64");
        let mut output = vec![0u8; maximal_binary_length_from_base64(&input)];
        let result = ctx.codec.base64_to_binary(&input, &mut output, options, last_chunk);
        if !result.is_ok() {
            return Err(Box::new(Diagnostic::base64(result, &input)));
        }
        output.truncate(result.output_count);
        output
    } else {
        let line_length = args.wrap.or(defaults.line_length).unwrap_or(DEFAULT_LINE_LENGTH);
        debug!(options = options.name(), line_length, "encoding base64");
        let mut output = if line_length == 0 {
            let mut output = vec![0u8; base64_length_from_binary(input.len(), options)];
            let written = ctx.codec.binary_to_base64(&input, &mut output, options);
            output.truncate(written);
            output
        } else {
            let needed = base64_length_from_binary_with_lines(input.len(), options, line_length);
            let mut output = vec![0u8; needed];
            let written = ctx
                .codec
                .binary_to_base64_with_lines(&input, &mut output, line_length, options);
            output.truncate(written);
            output
        };
        if !output.is_empty() {
            output.push(b'\n');
        }
        output
    };

    write_output(args.output.as_deref(), &output)?;
    Ok(ExitCode::SUCCESS)
}
