//! SWC Designer CLI - batch front end for multi-module SWC projects
//!
//! Checks a project for merge issues, generates C skeletons, answers
//! ownership queries and toggles modules in the master descriptor.

use clap::{Parser, Subcommand};
use commands::{
    check::CheckCommand, example::ExampleCommand, find::FindCommand, generate::GenerateCommand,
    modules::ModulesCommand,
};

mod commands;

/// SWC Designer - merge multi-module component models and generate C code
#[derive(Debug, Parser)]
#[command(name = "swc-designer")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Load and merge a project, reporting every issue
    #[command(name = "check")]
    Check(CheckCommand),

    /// Generate C skeletons
    #[command(name = "generate")]
    Generate(GenerateCommand),

    /// Show which module declares a UID
    #[command(name = "find")]
    Find(FindCommand),

    /// List modules, or enable/disable one
    #[command(name = "modules")]
    Modules(ModulesCommand),

    /// Write the example multi-module project
    #[command(name = "example")]
    Example(ExampleCommand),
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Command::Check(cmd) => cmd.execute(),
        Command::Generate(cmd) => cmd.execute(),
        Command::Find(cmd) => cmd.execute(),
        Command::Modules(cmd) => cmd.execute(),
        Command::Example(cmd) => cmd.execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
