//! Error types for adapters and harness runs.
//!
//! Adapter failures are consolidated into [`ConversionError`]; run-level
//! failures into [`HarnessError`]. Both map cleanly to
//! `dxfcheck_core::error::AppError`.

use std::path::PathBuf;

use dxfcheck_core::config::harness::AdapterKind;
use dxfcheck_core::error::{AppError, ErrorKind};
use thiserror::Error;

use crate::runner::RunnerError;

/// Unified error type for a single adapter invocation.
#[derive(Debug, Error)]
pub enum ConversionError {
    /// An external process could not be run or reported failure.
    #[error(transparent)]
    Runner(#[from] RunnerError),

    /// The drawing could not be loaded by the DXF library.
    #[error("Failed to load drawing {path}: {source}")]
    Parse {
        /// The drawing that failed to load.
        path: PathBuf,
        /// Library error.
        #[source]
        source: dxf::DxfError,
    },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Blocking render task panicked or was aborted.
    #[error("Task join error: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl From<ConversionError> for AppError {
    fn from(err: ConversionError) -> Self {
        let kind = match &err {
            ConversionError::Runner(_) => ErrorKind::ExternalProcess,
            ConversionError::Parse { .. } => ErrorKind::Render,
            ConversionError::Io(_) => ErrorKind::Storage,
            ConversionError::Join(_) => ErrorKind::Internal,
        };
        AppError::with_source(kind, err.to_string(), err)
    }
}

/// The failure of one conversion task.
#[derive(Debug, Error)]
#[error("{fixture} [{adapter}]: {error}")]
pub struct TaskFailure {
    /// File name of the fixture whose task failed.
    pub fixture: String,
    /// Adapter that raised the error.
    pub adapter: AdapterKind,
    /// The adapter's error.
    #[source]
    pub error: ConversionError,
}

/// Errors that end a harness run.
#[derive(Debug, Error)]
pub enum HarnessError {
    /// The fixtures directory could not be listed.
    #[error("Cannot read fixtures directory {path}: {source}")]
    FixturesDir {
        /// Directory that was scanned.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The report file could not be written.
    #[error("Cannot write report {path}: {source}")]
    Report {
        /// Report path.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// At least one conversion task failed. Every task ran to completion.
    #[error("{} of {total} conversion task(s) failed; first: {}", .failures.len(), first_failure(.failures))]
    TasksFailed {
        /// Number of scheduled tasks.
        total: usize,
        /// Failures in fixture discovery order.
        failures: Vec<TaskFailure>,
    },
}

fn first_failure(failures: &[TaskFailure]) -> String {
    failures
        .first()
        .map(ToString::to_string)
        .unwrap_or_else(|| "none".to_string())
}

impl From<HarnessError> for AppError {
    fn from(err: HarnessError) -> Self {
        let kind = match &err {
            HarnessError::FixturesDir { source, .. }
                if source.kind() == std::io::ErrorKind::NotFound =>
            {
                ErrorKind::NotFound
            }
            HarnessError::FixturesDir { .. } | HarnessError::Report { .. } => ErrorKind::Storage,
            HarnessError::TasksFailed { .. } => ErrorKind::RunFailed,
        };
        AppError::with_source(kind, err.to_string(), err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failure(fixture: &str) -> TaskFailure {
        TaskFailure {
            fixture: fixture.to_string(),
            adapter: AdapterKind::Tool,
            error: ConversionError::Io(std::io::Error::other("disk full")),
        }
    }

    #[test]
    fn test_tasks_failed_message_leads_with_first_failure() {
        let err = HarnessError::TasksFailed {
            total: 3,
            failures: vec![failure("a.dxf"), failure("b.dxf")],
        };
        let msg = err.to_string();
        assert!(msg.starts_with("2 of 3 conversion task(s) failed"));
        assert!(msg.contains("a.dxf [tool]: IO error: disk full"));
        assert!(!msg.contains("b.dxf"));
    }

    #[test]
    fn test_harness_error_maps_to_app_error_kind() {
        let err = HarnessError::FixturesDir {
            path: PathBuf::from("/missing"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };
        let app: AppError = err.into();
        assert_eq!(app.kind, ErrorKind::NotFound);

        let app: AppError = HarnessError::TasksFailed {
            total: 1,
            failures: vec![failure("a.dxf")],
        }
        .into();
        assert_eq!(app.kind, ErrorKind::RunFailed);
    }

    #[test]
    fn test_conversion_error_maps_to_app_error_kind() {
        let app: AppError = ConversionError::Runner(RunnerError::Failed {
            program: "dxf2precitec".to_string(),
            args: vec!["dxf2precitec".to_string()],
            code: Some(2),
            stderr: None,
        })
        .into();
        assert_eq!(app.kind, ErrorKind::ExternalProcess);

        let app: AppError = ConversionError::Io(std::io::Error::other("disk full")).into();
        assert_eq!(app.kind, ErrorKind::Storage);
    }
}
