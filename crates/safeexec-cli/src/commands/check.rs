//! Input checks that never run anything.

use std::path::PathBuf;

use clap::Args;
use console::{style, Emoji};
use safeexec::{is_valid_filename, is_valid_package_name, sanitize_file_path, validate_command};

static CHECK: Emoji = Emoji("✓", "+");
static CROSS: Emoji = Emoji("✗", "x");

/// Check command arguments.
#[derive(Args, Debug)]
pub struct CheckArgs {
    #[command(subcommand)]
    pub command: CheckCommand,
}

#[derive(clap::Subcommand, Debug)]
pub enum CheckCommand {
    /// Check a command name
    Command { name: String },

    /// Check an npm package name
    Package { name: String },

    /// Check a bare filename
    Filename { name: String },

    /// Sanitize a path, optionally confined to a base directory
    Path {
        path: String,

        /// Directory the path must stay inside
        #[arg(long)]
        base: Option<PathBuf>,
    },
}

/// Run the check command. Exits 0 when the input is acceptable, 1 otherwise.
pub fn run(args: CheckArgs) -> anyhow::Result<i32> {
    let (ok, detail) = match &args.command {
        CheckCommand::Command { name } => match validate_command(name) {
            Ok(()) => (true, format!("valid command: {}", name)),
            Err(e) => (false, e.to_string()),
        },
        CheckCommand::Package { name } => (
            is_valid_package_name(name),
            format!("package name: {}", name),
        ),
        CheckCommand::Filename { name } => {
            (is_valid_filename(name), format!("filename: {}", name))
        }
        CheckCommand::Path { path, base } => match sanitize_file_path(path, base.as_deref()) {
            Ok(resolved) => (true, resolved.display().to_string()),
            Err(e) => (false, e.to_string()),
        },
    };

    if ok {
        println!("{} {}", style(CHECK).green(), detail);
        Ok(0)
    } else {
        println!("{} {}", style(CROSS).red(), detail);
        Ok(1)
    }
}
