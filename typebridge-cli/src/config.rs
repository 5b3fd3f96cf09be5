//! Configuration management for the CLI.
//!
//! This module handles loading configuration from `typebridge.toml` files
//! and merging with command-line arguments.

use crate::error::{CliResult, ConfigError};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use typebridge::PlanSettings;

/// Default configuration filename.
pub const CONFIG_FILENAME: &str = "typebridge.toml";

/// Main configuration structure.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Output configuration.
    pub output: OutputConfig,

    /// Plan settings: `[exchange]`, `[[types]]` and `[families]`.
    #[serde(flatten)]
    pub plan: PlanSettings,
}

/// Output configuration.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// How `plan` prints its result.
    pub format: OutputFormat,
}

/// Output format of the `plan` command.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable summary.
    #[default]
    Summary,
    /// Machine-readable JSON.
    Json,
}

/// Configuration manager for loading and merging configs.
pub struct ConfigManager;

impl ConfigManager {
    /// Load configuration from a file path.
    ///
    /// If the path is None, attempts to load from the default location and
    /// falls back to the default configuration when that file is missing.
    /// An explicitly given path must exist.
    pub fn load(path: Option<&Path>) -> CliResult<Config> {
        let config_path = match path {
            Some(path) if !path.exists() => {
                return Err(ConfigError::not_found(path.to_path_buf()).into());
            }
            Some(path) => path.to_path_buf(),
            None => PathBuf::from(CONFIG_FILENAME),
        };

        if !config_path.exists() {
            return Ok(Config::default());
        }

        let content = std::fs::read_to_string(&config_path).map_err(|e| ConfigError::Io {
            path: config_path.clone(),
            source: e,
        })?;

        Self::parse(&content, config_path)
    }

    /// Parse configuration content read from `path`.
    pub fn parse(content: &str, path: PathBuf) -> CliResult<Config> {
        let config: Config =
            toml::from_str(content).map_err(|e| ConfigError::invalid_toml(path, e.to_string()))?;
        Ok(config)
    }

    /// Merge CLI arguments into configuration.
    ///
    /// CLI arguments take precedence over config file values.
    pub fn merge_cli_args(mut config: Config, args: &CliArgs) -> Config {
        if let Some(format) = args.format {
            config.output.format = format;
        }

        if args.no_exchange {
            config.plan.exchange.enabled = false;
        }

        config
    }

    /// Generate default configuration file content with comments.
    pub fn default_config_content() -> &'static str {
        r#"# typebridge configuration file

[output]
# How `typebridge plan` prints its result (summary, json)
format = "summary"

[exchange]
# Set to false when the target language does not exchange structural types
enabled = true

# Structural leaf types the target language cannot represent
exclude = []

# Per-type placement overrides. Configured values win over code-declared ones.
#
# [[types]]
# type = "app.models.User"
# folder = "models"
# file_name = "user"
# type_name = "Account"
#
# [[types]]
# type = "app.models.Role"
# same_file_as = "app.models.User"

[families]
# Extra names for types, usable anywhere a type name is expected
# Page = "app.paging.Page<T>"
"#
    }
}

/// CLI arguments that can override configuration.
#[derive(Debug, Default)]
pub struct CliArgs {
    /// Output format override.
    pub format: Option<OutputFormat>,

    /// Disable the exchangeable set.
    pub no_exchange: bool,
}
