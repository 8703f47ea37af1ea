//! Application configuration schemas.
//!
//! All configuration structs are deserialized via the `config` crate from an
//! optional TOML file plus `DXFCHECK__*` environment variables. Each
//! sub-module represents a logical configuration section, and every field
//! has a default so an empty configuration is valid.

pub mod harness;
pub mod logging;
pub mod preview;
pub mod suite;
pub mod tool;

use std::path::Path;

use serde::{Deserialize, Serialize};
use validator::Validate;

use self::harness::HarnessConfig;
use self::logging::LoggingConfig;
use self::preview::PreviewConfig;
use self::suite::SuiteConfig;
use self::tool::{RunnerConfig, ToolConfig};

use crate::error::AppError;

/// Environment variable naming an additional configuration file.
pub const CONFIG_PATH_ENV: &str = "DXFCHECK_CONFIG";

/// Prefix of environment variables that override individual settings.
pub const ENV_PREFIX: &str = "DXFCHECK";

/// Root application configuration.
#[derive(Debug, Clone, Default, Validate, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Fixture discovery, report and task scheduling settings.
    #[validate(nested)]
    pub harness: HarnessConfig,
    /// External geometry-extraction tool settings.
    pub tool: ToolConfig,
    /// Child process execution settings.
    #[validate(nested)]
    pub runner: RunnerConfig,
    /// Library-rendered preview settings.
    #[validate(nested)]
    pub preview: PreviewConfig,
    /// Optional CAD-suite adapter settings.
    pub suite: SuiteConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration.
    ///
    /// Merges, in increasing priority: `config/default.toml` (optional),
    /// the file at `path` (required when given), and environment variables
    /// prefixed with `DXFCHECK__` (for example `DXFCHECK__TOOL__EXECUTABLE`).
    /// The merged result is validated before it is returned.
    pub fn load(path: Option<&Path>) -> Result<Self, AppError> {
        let mut builder = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false));

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        let config = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("harness.adapters")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        let app: AppConfig = config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))?;

        app.validate()?;
        Ok(app)
    }

    /// Load configuration, taking the extra file path from `DXFCHECK_CONFIG`.
    pub fn load_from_env() -> Result<Self, AppError> {
        match std::env::var_os(CONFIG_PATH_ENV) {
            Some(path) => Self::load(Some(Path::new(&path))),
            None => Self::load(None),
        }
    }
}
