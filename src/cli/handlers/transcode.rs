use crate::cli::{Context, Diagnostic, args::TranscodeArgs, read_input, write_output};
use std::process::ExitCode;
use tracing::debug;
use utf_d::convenience::{transcode_lossy_with, transcode_with};
use utf_d::{ConversionError, Encoding, check_bom};

pub fn handle(args: TranscodeArgs, ctx: &Context) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let input = read_input(args.file.as_deref())?;
    let defaults = &ctx.settings.transcode;

    // an explicit --from beats the byte-order mark, which beats the settings
    let from = args
        .from
        .or_else(|| check_bom(&input))
        .or(defaults.from)
        .unwrap_or(Encoding::Utf8);
    let to = args.to.or(defaults.to).unwrap_or(Encoding::UTF16LE);
    let lossy = args.lossy || defaults.lossy.unwrap_or(false);
    let strip_bom = !args.keep_bom && (args.strip_bom || defaults.strip_bom.unwrap_or(true));
    let emit_bom = args.emit_bom || defaults.emit_bom.unwrap_or(false);

    // a mark for some other encoding is ordinary text
    let skip = if strip_bom && !from.bom().is_empty() && input.starts_with(from.bom()) {
        from.bom().len()
    } else {
        0
    };
    let body = &input[skip..];
    debug!(%from, %to, lossy, bom = skip, bytes = body.len(), "transcoding");

    let converted = if lossy {
        transcode_lossy_with(ctx.codec, body, from, to)
    } else {
        transcode_with(ctx.codec, body, from, to).map_err(|e| {
            let error = ConversionError::new(e.kind, e.position + skip / from.unit_size());
            Diagnostic::new(from, error, &input)
        })?
    };

    let mut output = Vec::with_capacity(converted.len() + 4);
    if emit_bom {
        output.extend_from_slice(to.bom());
    }
    output.extend_from_slice(&converted);
    write_output(args.output.as_deref(), &output)?;
    Ok(ExitCode::SUCCESS)
}
