//! # dxfcheck-converter
//!
//! Runs every DXF fixture in a directory through independent conversion
//! pipelines concurrently and writes an HTML report that puts their previews
//! side by side.
//!
//! ## Pipelines
//!
//! - **library**: in-process SVG preview rendered with the `dxf` crate
//! - **tool**: the external geometry-extraction executable (SVG preview plus
//!   JSON geometry)
//! - **suite**: optional preview script run under an installed CAD suite
//!
//! ## Architecture
//!
//! - [`fixtures`]: directory scan in file-name order
//! - [`artifacts`]: output naming next to each fixture
//! - [`adapters`]: the [`adapters::Adapter`] trait and the per-fixture chain
//! - [`runner`]: child process execution with status checking
//! - [`harness`]: fan-out, report, fan-in
//! - [`report`]: streamed HTML table

pub mod adapters;
pub mod artifacts;
pub mod error;
pub mod fixtures;
pub mod harness;
pub mod metrics;
pub mod preview;
pub mod progress;
pub mod report;
pub mod runner;
pub mod suite;

pub use adapters::{Adapter, AdapterChain};
pub use artifacts::{ArtifactKind, ArtifactSet};
pub use error::{ConversionError, HarnessError, TaskFailure};
pub use fixtures::{Fixture, FixtureDiscovery};
pub use harness::{Harness, RunPhase, RunSummary};
pub use preview::{PreviewStats, render_file};
pub use progress::{ConsoleProgress, ProgressSink, SilentProgress};
pub use runner::{CommandLine, CommandRunner, ExecutionResult, RunnerError};
pub use suite::{SuiteCapability, SuiteDiscovery, SuiteInstallation};
