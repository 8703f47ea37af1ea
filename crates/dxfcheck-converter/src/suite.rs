//! CAD-suite installation lookup.
//!
//! Finds the interpreter that runs the suite's conversion script by
//! querying, in order:
//! 1. Explicit configuration (`suite.interpreter`)
//! 2. The Windows registry uninstall entry (`suite.registry_key`)
//! 3. The system PATH (`suite.path_interpreter`)
//!
//! The result is a capability value; callers never branch on the OS.

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

use dxfcheck_core::config::suite::SuiteConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Registry path holding per-application uninstall entries.
#[cfg(windows)]
const UNINSTALL_KEY_PATH: &str = r"SOFTWARE\Microsoft\Windows\CurrentVersion\Uninstall";

/// Errors from a single lookup source.
#[derive(Debug, Error)]
enum LookupError {
    #[error("{source_name}: not configured")]
    NotConfigured { source_name: &'static str },

    #[error("configured interpreter {path} does not exist")]
    InterpreterMissing { path: PathBuf },

    #[cfg(windows)]
    #[error("registry: {reason}")]
    Registry { reason: String },

    #[error("{name} not found on PATH")]
    NotOnPath { name: String },
}

/// How the suite was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupMethod {
    /// `suite.interpreter` was set and exists.
    ExplicitConfig,
    /// Found through the Windows uninstall registry entry.
    WindowsRegistry,
    /// Found on the system PATH.
    SystemPath,
}

/// A usable CAD-suite installation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuiteInstallation {
    /// Interpreter that runs the conversion script.
    pub interpreter: PathBuf,
    /// Suite installation directory, when known.
    pub install_dir: Option<PathBuf>,
    /// Version from the registry, when known.
    pub display_version: Option<String>,
    /// How the installation was found.
    pub method: LookupMethod,
}

/// Outcome of a suite lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SuiteCapability {
    Available(SuiteInstallation),
    Unavailable { reason: String },
}

impl SuiteCapability {
    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available(_))
    }
}

/// CAD-suite lookup engine.
#[derive(Debug, Clone)]
pub struct SuiteDiscovery {
    config: SuiteConfig,
}

impl SuiteDiscovery {
    pub fn new(config: SuiteConfig) -> Self {
        Self { config }
    }

    /// Look up the suite using the process `PATH`.
    pub fn lookup(&self) -> SuiteCapability {
        let path_var = std::env::var_os("PATH");
        self.lookup_with_path(path_var.as_deref())
    }

    /// Look up the suite against an explicit `PATH` value.
    pub fn lookup_with_path(&self, path_var: Option<&OsStr>) -> SuiteCapability {
        info!("Looking up CAD suite installation");
        let mut reasons = Vec::new();

        match self.from_explicit() {
            Ok(installation) => return Self::found(installation),
            Err(e @ LookupError::NotConfigured { .. }) => debug!(error = %e, "Skipping explicit interpreter"),
            Err(e) => {
                warn!(error = %e, "Configured suite interpreter unusable, trying fallbacks");
                reasons.push(e.to_string());
            }
        }

        #[cfg(windows)]
        match self.from_registry() {
            Ok(installation) => return Self::found(installation),
            Err(e) => {
                debug!(error = %e, "Registry lookup failed, trying PATH");
                reasons.push(e.to_string());
            }
        }

        match self.from_path(path_var) {
            Ok(installation) => return Self::found(installation),
            Err(e) => {
                debug!(error = %e, "PATH lookup failed");
                reasons.push(e.to_string());
            }
        }

        SuiteCapability::Unavailable {
            reason: format!("CAD suite not found ({})", reasons.join("; ")),
        }
    }

    fn found(installation: SuiteInstallation) -> SuiteCapability {
        info!(
            interpreter = %installation.interpreter.display(),
            method = ?installation.method,
            version = ?installation.display_version,
            "Found CAD suite"
        );
        SuiteCapability::Available(installation)
    }

    fn from_explicit(&self) -> Result<SuiteInstallation, LookupError> {
        let path = self
            .config
            .interpreter
            .as_ref()
            .ok_or(LookupError::NotConfigured {
                source_name: "suite.interpreter",
            })?;

        if !path.is_file() {
            return Err(LookupError::InterpreterMissing { path: path.clone() });
        }

        Ok(SuiteInstallation {
            interpreter: path.clone(),
            install_dir: None,
            display_version: None,
            method: LookupMethod::ExplicitConfig,
        })
    }

    /// Query HKLM then HKCU for the uninstall entry and resolve the bundled
    /// interpreter below its install location.
    #[cfg(windows)]
    fn from_registry(&self) -> Result<SuiteInstallation, LookupError> {
        use winreg::RegKey;
        use winreg::enums::{HKEY_CURRENT_USER, HKEY_LOCAL_MACHINE, KEY_READ};

        let subkey = self
            .config
            .registry_key
            .as_deref()
            .ok_or(LookupError::NotConfigured {
                source_name: "suite.registry_key",
            })?;

        let roots = [(HKEY_LOCAL_MACHINE, "HKLM"), (HKEY_CURRENT_USER, "HKCU")];
        for (root_key, root_name) in &roots {
            let app_key = match RegKey::predef(*root_key)
                .open_subkey_with_flags(UNINSTALL_KEY_PATH, KEY_READ)
                .and_then(|uninstall| uninstall.open_subkey_with_flags(subkey, KEY_READ))
            {
                Ok(key) => key,
                Err(e) => {
                    debug!(root = root_name, error = %e, "Uninstall entry not found");
                    continue;
                }
            };

            let Some(install_dir) = ["InstallLocation", "Inno Setup: App Path"]
                .iter()
                .filter_map(|name| app_key.get_value::<String, _>(name).ok())
                .map(PathBuf::from)
                .find(|p| p.is_dir())
            else {
                debug!(root = root_name, "Uninstall entry has no install location");
                continue;
            };

            let interpreter = install_dir.join(&self.config.bundled_interpreter);
            if !interpreter.is_file() {
                warn!(
                    install_dir = %install_dir.display(),
                    interpreter = %interpreter.display(),
                    "Suite installed but bundled interpreter missing"
                );
                continue;
            }

            return Ok(SuiteInstallation {
                interpreter,
                install_dir: Some(install_dir),
                display_version: app_key.get_value("DisplayVersion").ok(),
                method: LookupMethod::WindowsRegistry,
            });
        }

        Err(LookupError::Registry {
            reason: format!("{subkey} not found in HKLM or HKCU uninstall registry"),
        })
    }

    fn from_path(&self, path_var: Option<&OsStr>) -> Result<SuiteInstallation, LookupError> {
        let name = &self.config.path_interpreter;
        let interpreter = path_var
            .and_then(|p| lookup_in_path(name, p))
            .ok_or_else(|| LookupError::NotOnPath { name: name.clone() })?;

        Ok(SuiteInstallation {
            install_dir: interpreter.parent().map(Path::to_path_buf),
            interpreter,
            display_version: None,
            method: LookupMethod::SystemPath,
        })
    }
}

/// Find `name` in the directories of a `PATH`-style value.
pub fn lookup_in_path(name: &str, path_var: &OsStr) -> Option<PathBuf> {
    std::env::split_paths(path_var)
        .flat_map(|dir| candidates(&dir, name))
        .find(|candidate| candidate.is_file())
}

fn candidates(dir: &Path, name: &str) -> Vec<PathBuf> {
    let mut out = vec![dir.join(name)];
    if cfg!(windows) && Path::new(name).extension().is_none() {
        let mut exe = OsString::from(name);
        exe.push(".exe");
        out.push(dir.join(exe));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SuiteConfig {
        SuiteConfig {
            path_interpreter: "suite-python".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_explicit_interpreter_wins() {
        let temp = tempfile::tempdir().expect("tempdir");
        let interpreter = temp.path().join("python");
        std::fs::write(&interpreter, "").expect("write");

        let discovery = SuiteDiscovery::new(SuiteConfig {
            interpreter: Some(interpreter.clone()),
            ..config()
        });
        match discovery.lookup_with_path(None) {
            SuiteCapability::Available(installation) => {
                assert_eq!(installation.interpreter, interpreter);
                assert_eq!(installation.method, LookupMethod::ExplicitConfig);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_missing_explicit_falls_back_to_path() {
        let temp = tempfile::tempdir().expect("tempdir");
        std::fs::write(temp.path().join("suite-python"), "").expect("write");
        let path_var = std::env::join_paths([temp.path()]).expect("join");

        let discovery = SuiteDiscovery::new(SuiteConfig {
            interpreter: Some(PathBuf::from("/nonexistent/python")),
            ..config()
        });
        match discovery.lookup_with_path(Some(&path_var)) {
            SuiteCapability::Available(installation) => {
                assert_eq!(installation.method, LookupMethod::SystemPath);
                assert_eq!(installation.install_dir.as_deref(), Some(temp.path()));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_unavailable_reason_lists_sources() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path_var = std::env::join_paths([temp.path()]).expect("join");

        let capability = SuiteDiscovery::new(config()).lookup_with_path(Some(&path_var));
        assert!(!capability.is_available());
        match capability {
            SuiteCapability::Unavailable { reason } => {
                assert!(reason.contains("suite-python not found on PATH"), "{reason}");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_lookup_in_path_skips_directories() {
        let first = tempfile::tempdir().expect("tempdir");
        let second = tempfile::tempdir().expect("tempdir");
        std::fs::create_dir(first.path().join("tool")).expect("mkdir");
        std::fs::write(second.path().join("tool"), "").expect("write");

        let path_var = std::env::join_paths([first.path(), second.path()]).expect("join");
        assert_eq!(
            lookup_in_path("tool", &path_var),
            Some(second.path().join("tool"))
        );
        assert_eq!(lookup_in_path("absent", &path_var), None);
    }
}
