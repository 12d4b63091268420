//! Streaming execution command.

use std::io::Write;
use std::path::Path;

use clap::Args;
use console::style;
use safeexec::{safe_spawn, CommandResult, ProcessError, SafeCommandOptions, SpawnOptions};
use tracing::{info, warn};

use super::{load_config, CommandOptionArgs};
use crate::EXIT_TIMEOUT;

/// Spawn command arguments.
#[derive(Args, Debug)]
pub struct SpawnArgs {
    #[command(flatten)]
    pub options: CommandOptionArgs,

    /// Program to run, followed by its arguments (passed verbatim)
    #[arg(
        value_name = "COMMAND",
        required = true,
        num_args = 1..,
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    pub argv: Vec<String>,
}

impl SpawnArgs {
    pub fn command(&self) -> &str {
        &self.argv[0]
    }

    pub fn args(&self) -> &[String] {
        &self.argv[1..]
    }
}

/// Run the spawn command.
pub async fn run(args: SpawnArgs, config_path: Option<&Path>) -> anyhow::Result<i32> {
    let config = load_config(config_path)?;
    let options = args.options.resolve(&config);
    stream(args.command(), args.args(), options).await
}

/// Stream a command to our stdout and stderr, terminating it on Ctrl-C.
pub(crate) async fn stream(
    command: &str,
    args: &[String],
    options: SafeCommandOptions,
) -> anyhow::Result<i32> {
    let spawn_options = SpawnOptions::from_options(options)
        .on_stdout(|chunk| {
            let mut out = std::io::stdout().lock();
            let _ = out.write_all(chunk.as_bytes());
            let _ = out.flush();
        })
        .on_stderr(|chunk| {
            let mut err = std::io::stderr().lock();
            let _ = err.write_all(chunk.as_bytes());
        });

    let child = safe_spawn(command, args, spawn_options)?;
    let handle = child.handle().clone();
    info!(command, pid = ?handle.pid(), "Streaming command");

    let wait = child.wait();
    tokio::pin!(wait);

    let outcome = loop {
        tokio::select! {
            outcome = &mut wait => break outcome,
            signal = tokio::signal::ctrl_c() => {
                if let Err(e) = signal {
                    warn!(error = %e, "Failed to listen for Ctrl-C");
                }
                info!("Interrupted, terminating child");
                if !handle.terminate() {
                    break (&mut wait).await;
                }
            }
        }
    };

    match outcome {
        Ok(result) => Ok(report(&result)),
        Err(e) if e.is_timeout() => {
            eprintln!("{} {}", style("safeexec:").red().bold(), e);
            Ok(EXIT_TIMEOUT)
        }
        Err(e) => Err(e.into()),
    }
}

/// Shell-style exit code for a settled streamed process.
pub(crate) fn exit_code_for(result: &CommandResult) -> i32 {
    match (&result.exit_code, &result.error) {
        (Some(code), _) => *code,
        (None, Some(ProcessError::Signal { signal })) => 128 + signal,
        (None, _) => 1,
    }
}

fn report(result: &CommandResult) -> i32 {
    if let Some(err) = &result.error {
        eprintln!("{} {}", style("safeexec:").red().bold(), err);
    }
    exit_code_for(result)
}
