//! safeexec CLI entry point.

use clap::Parser;
use safeexec::SafeExecError;
use safeexec_cli::{init_logging, run, Cli, EXIT_VALIDATION};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    match run(cli).await {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {:#}", err);
            let code = match err.downcast_ref::<SafeExecError>() {
                Some(e) if e.is_validation() => EXIT_VALIDATION,
                _ => 1,
            };
            std::process::exit(code);
        }
    }
}
