//! Buffered execution command.

use std::io::Write;
use std::path::Path;

use clap::Args;
use console::style;
use safeexec::{safe_execute, CommandResult, ProcessError};

use super::{load_config, CommandOptionArgs};

/// Exec command arguments.
#[derive(Args, Debug)]
pub struct ExecArgs {
    #[command(flatten)]
    pub options: CommandOptionArgs,

    /// Print the result as JSON instead of replaying output
    #[arg(long)]
    pub json: bool,

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

impl ExecArgs {
    pub fn command(&self) -> &str {
        &self.argv[0]
    }

    pub fn args(&self) -> &[String] {
        &self.argv[1..]
    }
}

/// Run the exec command.
pub async fn run(args: ExecArgs, config_path: Option<&Path>) -> anyhow::Result<i32> {
    let config = load_config(config_path)?;
    let options = args.options.resolve(&config);

    let result = safe_execute(args.command(), args.args(), &options).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        replay(&result)?;
    }

    Ok(result.exit_code_or_failure())
}

/// Write captured output back to our own streams and report any failure.
pub(crate) fn replay(result: &CommandResult) -> anyhow::Result<()> {
    std::io::stdout().write_all(result.stdout.as_bytes())?;
    std::io::stderr().write_all(result.stderr.as_bytes())?;

    // The exit code already carries a plain non-zero exit.
    if let Some(err) = result
        .error
        .as_ref()
        .filter(|e| !matches!(e, ProcessError::NonZeroExit { .. }))
    {
        eprintln!("{} {}", style("safeexec:").red().bold(), err);
    }
    Ok(())
}
