//! Harness configuration: fixtures, report, adapter selection, scheduling.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use validator::Validate;

/// The conversion back ends a harness task can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdapterKind {
    /// In-process preview rendered with the `dxf` crate.
    Library,
    /// External geometry-extraction tool (preview + structured geometry).
    Tool,
    /// Conversion script run under an installed CAD suite's interpreter.
    Suite,
}

impl fmt::Display for AdapterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Library => write!(f, "library"),
            Self::Tool => write!(f, "tool"),
            Self::Suite => write!(f, "suite"),
        }
    }
}

/// Harness run configuration.
#[derive(Debug, Clone, Validate, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Directory scanned for fixtures.
    ///
    /// If unset, `fixtures/` next to the running executable is used.
    pub fixtures_dir: Option<PathBuf>,

    /// Extension (without dot) identifying drawing fixtures.
    #[validate(length(min = 1))]
    pub fixture_extension: String,

    /// Report file. Relative paths resolve inside the fixtures directory.
    pub report_file: PathBuf,

    /// Adapters run for every fixture, in order.
    #[validate(length(min = 1))]
    pub adapters: Vec<AdapterKind>,

    /// Upper bound on tasks in flight. Unset means every task at once.
    #[validate(range(min = 1))]
    pub max_concurrent_tasks: Option<usize>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            fixtures_dir: None,
            fixture_extension: default_fixture_extension(),
            report_file: default_report_file(),
            adapters: default_adapters(),
            max_concurrent_tasks: None,
        }
    }
}

fn default_fixture_extension() -> String {
    "dxf".to_string()
}

fn default_report_file() -> PathBuf {
    PathBuf::from("summary.html")
}

fn default_adapters() -> Vec<AdapterKind> {
    vec![AdapterKind::Library, AdapterKind::Tool]
}

impl HarnessConfig {
    /// Resolve the effective fixtures directory.
    pub fn effective_fixtures_dir(&self) -> std::io::Result<PathBuf> {
        if let Some(dir) = &self.fixtures_dir {
            return Ok(dir.clone());
        }

        let exe = std::env::current_exe()?;
        let base = exe.parent().map(Path::to_path_buf).unwrap_or_default();
        Ok(base.join("fixtures"))
    }

    /// Resolve the report path against the fixtures directory.
    pub fn effective_report_path(&self, fixtures_dir: &Path) -> PathBuf {
        if self.report_file.is_absolute() {
            self.report_file.clone()
        } else {
            fixtures_dir.join(&self.report_file)
        }
    }
}
