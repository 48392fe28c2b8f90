use std::process::ExitCode;

use clap::{Parser, Subcommand};
use vartab::cmd::{ExtractCMD, TargSumCMD};

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(short = 'v', long = "verbose", global = true)]
    /// Also print the underlying toolkit invocations
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Reformat one individual's genotype calls over intervals into variant tables
    Extract(ExtractCMD),
    /// Summarize per-gene targetability tables into cohort-wide fractions
    Targsum(TargSumCMD),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let result = match cli.command {
        Commands::Extract(mut cmd) => cmd.try_execute(),
        Commands::Targsum(mut cmd) => cmd.try_execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        return ExitCode::FAILURE;
    }
    return ExitCode::SUCCESS;
}
