//! Configuration management commands.

use std::path::Path;

use clap::Args;
use safeexec::{ConfigError, ExecConfig};
use serde_json::Value;

use super::{config_path, load_config};

/// Config command arguments.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(clap::Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show the effective configuration
    Show,

    /// Get a configuration value
    Get {
        /// Configuration key (dot-separated path)
        key: String,
    },

    /// Set a configuration value
    Set {
        /// Configuration key
        key: String,

        /// Value to set
        value: String,
    },

    /// Write a default configuration file
    Init {
        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,
    },

    /// Show configuration file path
    Path,

    /// Validate configuration
    Validate,
}

/// Run the config command.
pub fn run(args: ConfigArgs, path: Option<&Path>) -> anyhow::Result<i32> {
    match args.command {
        ConfigCommand::Show => {
            let config = load_config(path)?;
            println!("{}", config.to_json5()?);
        }

        ConfigCommand::Get { key } => {
            let json = serde_json::to_value(load_config(path)?)?;
            match get_value(&json, &key) {
                Some(v) => println!("{}", serde_json::to_string_pretty(v)?),
                None => anyhow::bail!("Key not found: {}", key),
            }
        }

        ConfigCommand::Set { key, value } => {
            let file = config_path(path)?;
            let config = match ExecConfig::load(&file) {
                Err(ConfigError::NotFound(_)) => ExecConfig::default(),
                other => other?,
            };

            let mut json = serde_json::to_value(&config)?;
            set_value(&mut json, &key, &value);

            let updated: ExecConfig = serde_json::from_value(json)
                .map_err(|e| anyhow::anyhow!("Invalid configuration after set: {}", e))?;
            updated.validate()?;
            updated.save(&file)?;

            println!("Set {} = {}", key, value);
        }

        ConfigCommand::Init { force } => {
            let file = config_path(path)?;
            if file.exists() && !force {
                anyhow::bail!(
                    "Config file already exists: {}. Use --force to overwrite.",
                    file.display()
                );
            }

            ExecConfig::default().save(&file)?;
            println!("Created config file: {}", file.display());
        }

        ConfigCommand::Path => {
            println!("{}", config_path(path)?.display());
        }

        ConfigCommand::Validate => {
            let file = config_path(path)?;
            match ExecConfig::load(&file) {
                Ok(_) => println!("Configuration is valid"),
                Err(ConfigError::NotFound(_)) => {
                    println!("No config file at {}, using defaults", file.display())
                }
                Err(e) => anyhow::bail!("Configuration error: {}", e),
            }
        }
    }

    Ok(0)
}

/// Walk a dot-separated key path.
fn get_value<'a>(json: &'a Value, key: &str) -> Option<&'a Value> {
    key.split('.')
        .try_fold(json, |acc, k| acc.get(k))
}

/// Set a dot-separated key, creating intermediate objects. The value is
/// parsed as JSON first, falling back to a plain string.
fn set_value(json: &mut Value, key: &str, value: &str) {
    let parsed: Value =
        serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));

    let parts: Vec<&str> = key.split('.').collect();
    let mut current = json;
    for (i, part) in parts.iter().enumerate() {
        if i == parts.len() - 1 {
            current[*part] = parsed;
            return;
        }
        if !current.get(*part).map_or(false, Value::is_object) {
            current[*part] = serde_json::json!({});
        }
        current = &mut current[*part];
    }
}
