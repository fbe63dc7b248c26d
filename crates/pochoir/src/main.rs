//! # pochoir
//!
//! Pochoir - Build-time scoped class names for templates and style modules.
//!
//! ## Name Origin
//!
//! **Pochoir** (/pɔ.ʃwaʁ/) is the French stencil technique: colour is laid
//! through a cut-out so it lands only where the stencil allows. Class names
//! are laid down the same way, each one confined to the module that cut it.

mod commands;

use clap::{Parser, Subcommand};
use tracing::Level;

#[derive(Parser)]
#[command(name = "pochoir")]
#[command(
    about = "Build-time scoped class names for templates and style modules",
    long_about = None
)]
#[command(version, disable_version_flag = true)]
struct Cli {
    /// Print version
    #[arg(short = 'V', long, action = clap::ArgAction::Version)]
    version: (),

    /// Log every file and ledger step
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Rewrite style modules and templates (default command)
    Build(commands::build::BuildArgs),

    /// Print the scoped name of one class
    Hash(commands::hash::HashArgs),
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(false)
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::INFO })
        .init();

    match cli.command {
        Some(Commands::Build(args)) => commands::build::run(args),
        Some(Commands::Hash(args)) => commands::hash::run(args),
        None => {
            // Default to build command with default args
            commands::build::run(commands::build::BuildArgs::default());
        }
    }
}
