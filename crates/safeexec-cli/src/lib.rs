//! safeexec command-line interface.

pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Exit code for rejected input (invalid command, argument or path).
pub const EXIT_VALIDATION: i32 = 2;

/// Exit code when a streamed command hits its timeout.
pub const EXIT_TIMEOUT: i32 = 124;

/// safeexec - run external programs without a shell
#[derive(Parser)]
#[command(name = "safeexec")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Increase logging verbosity
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to config file
    #[arg(short, long, env = "SAFEEXEC_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Run a command to completion and print its output
    Exec(commands::exec::ExecArgs),

    /// Run a command, streaming its output as it arrives
    Spawn(commands::spawn::SpawnArgs),

    /// Run a command described by a JSON5 request file
    Run(commands::run::RunArgs),

    /// Check names and paths without running anything
    Check(commands::check::CheckArgs),

    /// Quote text for a POSIX shell
    Escape {
        /// Text to quote
        text: String,
    },

    /// Configuration management
    Config(commands::config::ConfigArgs),

    /// Show version information
    Version,
}

/// Run the CLI with the given arguments, returning the process exit code.
pub async fn run(cli: Cli) -> anyhow::Result<i32> {
    let config_path = cli.config;
    match cli.command {
        Commands::Exec(args) => commands::exec::run(args, config_path.as_deref()).await,
        Commands::Spawn(args) => commands::spawn::run(args, config_path.as_deref()).await,
        Commands::Run(args) => commands::run::run(args, config_path.as_deref()).await,
        Commands::Check(args) => commands::check::run(args),
        Commands::Escape { text } => {
            println!("{}", safeexec::escape_shell_arg(&text));
            Ok(0)
        }
        Commands::Config(args) => commands::config::run(args, config_path.as_deref()),
        Commands::Version => {
            println!("safeexec {}", env!("CARGO_PKG_VERSION"));
            Ok(0)
        }
    }
}

/// Filter directive used when `RUST_LOG` is not set.
pub fn default_filter(verbose: u8) -> &'static str {
    match verbose {
        0 => "safeexec=info,safeexec_cli=info",
        1 => "safeexec=debug,safeexec_cli=debug",
        _ => "safeexec=trace,safeexec_cli=trace",
    }
}

/// Initialize logging to stderr so stdout carries only child output.
pub fn init_logging(verbose: u8) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter(verbose).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
