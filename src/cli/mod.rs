mod args;
mod diagnostic;
mod global;
mod handlers;

use args::Commands;
use clap::Parser;
use global::GlobalArgs;
use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;
use utf_d::{Codec, Settings, active_implementation, implementation_by_name};

pub use diagnostic::Diagnostic;

#[derive(Parser)]
#[command(name = "utf-d")]
#[command(version)]
#[command(about = "Fast Unicode transcoding, validation and Base64 on the best SIMD backend for this CPU", long_about = None)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Everything a handler needs besides its own arguments.
pub struct Context {
    pub settings: Settings,
    pub codec: &'static dyn Codec,
}

pub fn run() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.global.verbose);

    let settings = Settings::load_with_overrides(cli.global.config.as_deref())?;
    let codec = resolve_codec(&cli.global, &settings)?;
    debug!(implementation = codec.name(), "using implementation");
    let ctx = Context { settings, codec };

    match cli.command {
        Commands::Transcode(args) => handlers::transcode::handle(args, &ctx),
        Commands::Validate(args) => handlers::validate::handle(args, &ctx),
        Commands::Base64(args) => handlers::base64::handle(args, &ctx),
        Commands::Detect(args) => handlers::detect::handle(args, &ctx),
        Commands::List => handlers::list::handle(&ctx),
    }
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .without_time()
        .init();
}

/// `--implementation` wins over `[dispatch] implementation`; without
/// either the detected backend is used.
fn resolve_codec(global: &GlobalArgs, settings: &Settings) -> Result<&'static dyn Codec, String> {
    let requested = global
        .implementation
        .as_deref()
        .or(settings.dispatch.implementation.as_deref());
    match requested {
        None => Ok(active_implementation()),
        Some(name) => implementation_by_name(name).ok_or_else(|| {
            format!("implementation '{name}' is unknown or not supported on this CPU (see `utf-d list`)")
        }),
    }
}

pub fn read_input(file: Option<&Path>) -> io::Result<Vec<u8>> {
    match file {
        Some(path) => fs::read(path),
        None => {
            let mut buffer = Vec::new();
            io::stdin().read_to_end(&mut buffer)?;
            Ok(buffer)
        }
    }
}

pub fn write_output(file: Option<&Path>, data: &[u8]) -> io::Result<()> {
    match file {
        Some(path) => fs::write(path, data),
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(data)?;
            stdout.flush()
        }
    }
}
