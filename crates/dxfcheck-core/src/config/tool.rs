//! External tool and child process configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Configuration of the external geometry-extraction executable.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolConfig {
    /// Executable path or name resolved on `PATH`.
    pub executable: PathBuf,
    /// Simplification tolerance passed verbatim after `-e`.
    pub epsilon: String,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            executable: PathBuf::from("dxf2precitec"),
            epsilon: ".1".to_string(),
        }
    }
}

/// Child process execution settings shared by every adapter that shells out.
#[derive(Debug, Clone, Default, Validate, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Pipe stdout/stderr instead of inheriting them, and attach stderr to
    /// failures.
    pub capture_output: bool,
    /// Kill the child after this many seconds. Unset means wait forever.
    #[validate(range(min = 1))]
    pub timeout_seconds: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_defaults() {
        let config = ToolConfig::default();
        assert_eq!(config.executable, PathBuf::from("dxf2precitec"));
        assert_eq!(config.epsilon, ".1");
    }

    #[test]
    fn test_runner_defaults_inherit_and_no_timeout() {
        let config = RunnerConfig::default();
        assert!(!config.capture_output);
        assert!(config.timeout_seconds.is_none());
    }

    #[test]
    fn test_runner_zero_timeout_rejected() {
        let config = RunnerConfig {
            timeout_seconds: Some(0),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
