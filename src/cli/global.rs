use clap::{ArgAction, Args};

/// Global arguments that apply to all subcommands
#[derive(Args, Debug)]
pub struct GlobalArgs {
    /// Settings file applied after the built-in, user and local ones
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<String>,

    /// Use this backend instead of the detected one (see `utf-d list`)
    #[arg(long, global = true, value_name = "NAME")]
    pub implementation: Option<String>,

    /// More log output on stderr (-v debug, -vv trace)
    #[arg(short = 'v', long, global = true, action = ArgAction::Count)]
    pub verbose: u8,
}
