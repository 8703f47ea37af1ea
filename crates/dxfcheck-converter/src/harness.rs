//! Harness orchestrator: discovery, fan-out, report, fan-in.
//!
//! Every fixture becomes one conversion task running the adapter chain. All
//! tasks run concurrently and always run to completion; failures are
//! collected in discovery order and returned together once every task has
//! finished.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use dxfcheck_core::config::AppConfig;
use futures::future::join_all;
use serde::Serialize;
use tokio::sync::Semaphore;
use tracing::{Instrument, error, info, info_span, instrument};
use uuid::Uuid;

use crate::adapters::AdapterChain;
use crate::artifacts::ArtifactSet;
use crate::error::{HarnessError, TaskFailure};
use crate::fixtures::{Fixture, FixtureDiscovery};
use crate::metrics::{MetricsSnapshot, RunMetrics};
use crate::progress::{ConsoleProgress, ProgressSink};
use crate::report::ReportWriter;
use crate::runner::CommandRunner;

/// Lifecycle of a harness run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Idle,
    Discovering,
    /// Tasks are being built for this many fixtures.
    Scheduling(usize),
    AwaitingAll,
    Completed,
    Failed,
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Discovering => write!(f, "discovering"),
            Self::Scheduling(n) => write!(f, "scheduling({n})"),
            Self::AwaitingAll => write!(f, "awaiting_all"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Outcome of a successful run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub fixtures_dir: PathBuf,
    pub report_path: PathBuf,
    /// Fixtures in discovery order.
    pub fixtures: Vec<String>,
    pub metrics: MetricsSnapshot,
    pub elapsed_ms: u64,
}

/// Runs every fixture through the adapter chain and writes the report.
#[derive(Debug)]
pub struct Harness {
    fixtures_dir: PathBuf,
    extension: String,
    report_path: PathBuf,
    adapters: AdapterChain,
    progress: Arc<dyn ProgressSink>,
    limiter: Option<Arc<Semaphore>>,
    phase: Mutex<RunPhase>,
}

impl Harness {
    pub fn new(
        fixtures_dir: impl Into<PathBuf>,
        extension: impl Into<String>,
        report_path: impl Into<PathBuf>,
        adapters: AdapterChain,
    ) -> Self {
        Self {
            fixtures_dir: fixtures_dir.into(),
            extension: extension.into(),
            report_path: report_path.into(),
            adapters,
            progress: Arc::new(ConsoleProgress),
            limiter: None,
            phase: Mutex::new(RunPhase::Idle),
        }
    }

    /// Build a harness from loaded configuration.
    pub fn from_config(config: &AppConfig) -> Result<Self, HarnessError> {
        let harness = &config.harness;
        let fixtures_dir = harness
            .effective_fixtures_dir()
            .map_err(|source| HarnessError::FixturesDir {
                path: PathBuf::from("fixtures"),
                source,
            })?;
        let report_path = harness.effective_report_path(&fixtures_dir);
        let runner = Arc::new(CommandRunner::new(config.runner.clone()));
        let adapters = AdapterChain::from_config(config, runner);

        Ok(Self::new(
            fixtures_dir,
            harness.fixture_extension.clone(),
            report_path,
            adapters,
        )
        .with_max_concurrent_tasks(harness.max_concurrent_tasks))
    }

    pub fn with_progress(mut self, progress: Arc<dyn ProgressSink>) -> Self {
        self.progress = progress;
        self
    }

    /// Bound the number of tasks in flight. `None` runs every task at once.
    pub fn with_max_concurrent_tasks(mut self, limit: Option<usize>) -> Self {
        self.limiter = limit.map(|n| Arc::new(Semaphore::new(n.max(1))));
        self
    }

    pub fn fixtures_dir(&self) -> &Path {
        &self.fixtures_dir
    }

    pub fn report_path(&self) -> &Path {
        &self.report_path
    }

    pub fn phase(&self) -> RunPhase {
        self.phase.lock().map(|p| *p).unwrap_or(RunPhase::Failed)
    }

    fn set_phase(&self, phase: RunPhase) {
        if let Ok(mut current) = self.phase.lock() {
            let from = *current;
            info!(from = %from, to = %phase, "Run phase changed");
            *current = phase;
        }
    }

    /// Execute one full run.
    ///
    /// Returns [`HarnessError::TasksFailed`] when any task failed, after
    /// every task has finished.
    #[instrument(skip(self), fields(run_id, fixtures_dir = %self.fixtures_dir.display()))]
    pub async fn run(&self) -> Result<RunSummary, HarnessError> {
        let run_id = Uuid::now_v7();
        tracing::Span::current().record("run_id", tracing::field::display(run_id));

        let result = self.run_inner(run_id).await;
        match &result {
            Ok(summary) => {
                self.set_phase(RunPhase::Completed);
                info!(
                    tasks = summary.fixtures.len(),
                    elapsed_ms = summary.elapsed_ms,
                    "Run completed"
                );
            }
            Err(e) => {
                self.set_phase(RunPhase::Failed);
                error!(error = %e, "Run failed");
            }
        }
        result
    }

    async fn run_inner(&self, run_id: Uuid) -> Result<RunSummary, HarnessError> {
        let start = Instant::now();

        self.set_phase(RunPhase::Discovering);
        let fixtures = FixtureDiscovery::new(&self.fixtures_dir, &self.extension)
            .discover()
            .await
            .map_err(|source| HarnessError::FixturesDir {
                path: self.fixtures_dir.clone(),
                source,
            })?;

        self.set_phase(RunPhase::Scheduling(fixtures.len()));
        let jobs: Vec<(Fixture, ArtifactSet)> = fixtures
            .into_iter()
            .map(|fixture| {
                let artifacts = ArtifactSet::derive(&fixture);
                (fixture, artifacts)
            })
            .collect();

        let metrics = RunMetrics::new();
        let tasks: Vec<_> = jobs
            .iter()
            .map(|(fixture, artifacts)| {
                let span = info_span!("task", fixture = fixture.file_name());
                self.run_task(fixture, artifacts, &metrics).instrument(span)
            })
            .collect();

        self.write_report(&jobs).await?;

        self.set_phase(RunPhase::AwaitingAll);
        let outcomes = join_all(tasks).await;

        let total = outcomes.len();
        let failures: Vec<TaskFailure> = outcomes.into_iter().filter_map(Result::err).collect();
        if !failures.is_empty() {
            return Err(HarnessError::TasksFailed { total, failures });
        }

        Ok(RunSummary {
            run_id,
            fixtures_dir: self.fixtures_dir.clone(),
            report_path: self.report_path.clone(),
            fixtures: jobs.iter().map(|(f, _)| f.file_name().to_string()).collect(),
            metrics: metrics.snapshot(),
            elapsed_ms: start.elapsed().as_millis() as u64,
        })
    }

    async fn run_task(
        &self,
        fixture: &Fixture,
        artifacts: &ArtifactSet,
        metrics: &RunMetrics,
    ) -> Result<Duration, TaskFailure> {
        let _permit = match &self.limiter {
            Some(limiter) => limiter.acquire().await.ok(),
            None => None,
        };

        self.progress.task_started(fixture);
        metrics.record_started();
        let start = Instant::now();

        let outcome = self
            .adapters
            .run(fixture, artifacts)
            .await
            .map(|()| start.elapsed());

        match &outcome {
            Ok(elapsed) => {
                metrics.record_success(*elapsed);
                info!(elapsed_ms = elapsed.as_millis() as u64, "Task completed");
            }
            Err(failure) => {
                metrics.record_failure(failure.adapter);
                error!(adapter = %failure.adapter, error = %failure.error, "Task failed");
            }
        }
        self.progress
            .task_finished(fixture, outcome.as_ref().copied());
        outcome
    }

    async fn write_report(&self, jobs: &[(Fixture, ArtifactSet)]) -> Result<(), HarnessError> {
        let report_error = |source: std::io::Error| HarnessError::Report {
            path: self.report_path.clone(),
            source,
        };

        let mut report = ReportWriter::create(&self.report_path, self.adapters.preview_columns())
            .await
            .map_err(report_error)?;
        for (fixture, artifacts) in jobs {
            report
                .write_fixture(fixture, artifacts)
                .await
                .map_err(report_error)?;
        }
        report.finish().await.map_err(report_error)?;
        Ok(())
    }
}
