//! Optional CAD-suite adapter configuration.
//!
//! The suite adapter runs a conversion script under the interpreter bundled
//! with an installed CAD suite. The interpreter is looked up from explicit
//! configuration, the Windows uninstall registry entry, or `PATH`.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// CAD-suite adapter configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SuiteConfig {
    /// Explicit interpreter path. Skips every other lookup when set.
    pub interpreter: Option<PathBuf>,
    /// Uninstall registry subkey of the suite (Windows only).
    pub registry_key: Option<String>,
    /// Interpreter location relative to the suite's install directory.
    pub bundled_interpreter: PathBuf,
    /// Interpreter name searched on `PATH` when the suite library is
    /// expected to be importable directly.
    pub path_interpreter: String,
    /// Conversion script invoked as `<interpreter> <script> <input> <output>`.
    pub script: PathBuf,
    /// Column label used in the report.
    pub label: String,
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self {
            interpreter: None,
            registry_key: None,
            bundled_interpreter: PathBuf::from("bin").join("python.exe"),
            path_interpreter: "python3".to_string(),
            script: PathBuf::from("suite_preview.py"),
            label: "CAD suite".to_string(),
        }
    }
}
