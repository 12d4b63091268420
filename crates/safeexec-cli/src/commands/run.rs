//! Run a command described by a JSON5 request.
//!
//! ```json5
//! {
//!   command: "grep",
//!   args: ["-n", "needle", "notes.txt"],
//!   options: { cwd: "/srv/docs", timeout_ms: 5000 },
//!   stream: false,
//! }
//! ```
//!
//! Arguments arrive untyped, so anything other than a string is rejected
//! before a process is created.

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Args;
use safeexec::{arguments_from_json, safe_execute, SafeCommandOptions};
use serde::Deserialize;

use super::exec::replay;
use super::load_config;

/// Run command arguments.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Request file, or `-` for stdin
    pub request: PathBuf,

    /// Print the result as JSON instead of replaying output
    #[arg(long)]
    pub json: bool,
}

/// A command request as read from disk.
#[derive(Debug, Deserialize)]
pub struct RunRequest {
    pub command: String,

    #[serde(default)]
    pub args: Vec<serde_json::Value>,

    #[serde(default)]
    pub options: SafeCommandOptions,

    /// Stream output instead of buffering it.
    #[serde(default)]
    pub stream: bool,
}

impl RunRequest {
    pub fn parse(content: &str) -> anyhow::Result<Self> {
        json5::from_str(content).context("Invalid request")
    }
}

/// Run the run command.
pub async fn run(args: RunArgs, config_path: Option<&Path>) -> anyhow::Result<i32> {
    let content = read_request(&args.request)?;
    let request = RunRequest::parse(&content)?;
    let command_args = arguments_from_json(&request.args)?;

    let config = load_config(config_path)?;
    let options = request.options.or(&config.command_options());

    if request.stream {
        return super::spawn::stream(&request.command, &command_args, options).await;
    }

    let result = safe_execute(&request.command, &command_args, &options).await?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        replay(&result)?;
    }
    Ok(result.exit_code_or_failure())
}

fn read_request(path: &Path) -> anyhow::Result<String> {
    if path == Path::new("-") {
        let mut content = String::new();
        std::io::stdin().read_to_string(&mut content)?;
        return Ok(content);
    }
    std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read request {}", path.display()))
}
