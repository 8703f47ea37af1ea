//! Per-task progress notifications.

use std::time::Duration;

use crate::error::TaskFailure;
use crate::fixtures::Fixture;

/// Receives task lifecycle events. Called concurrently from every task.
pub trait ProgressSink: Send + Sync + std::fmt::Debug {
    fn task_started(&self, fixture: &Fixture);

    fn task_finished(&self, fixture: &Fixture, outcome: Result<Duration, &TaskFailure>);
}

/// Prints one line per event to stdout.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleProgress;

impl ProgressSink for ConsoleProgress {
    fn task_started(&self, fixture: &Fixture) {
        println!("start {}", fixture.file_name());
    }

    fn task_finished(&self, fixture: &Fixture, outcome: Result<Duration, &TaskFailure>) {
        println!("{}", finished_line(fixture, outcome));
    }
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentProgress;

impl ProgressSink for SilentProgress {
    fn task_started(&self, _fixture: &Fixture) {}

    fn task_finished(&self, _fixture: &Fixture, _outcome: Result<Duration, &TaskFailure>) {}
}

fn finished_line(fixture: &Fixture, outcome: Result<Duration, &TaskFailure>) -> String {
    match outcome {
        Ok(elapsed) => format!("done {} ({} ms)", fixture.file_name(), elapsed.as_millis()),
        Err(failure) => format!("FAILED {}: {}", fixture.file_name(), failure.error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConversionError;
    use dxfcheck_core::config::harness::AdapterKind;

    #[test]
    fn test_finished_lines() {
        let fixture = Fixture::from_path("/f/square.dxf").expect("fixture");
        assert_eq!(
            finished_line(&fixture, Ok(Duration::from_millis(42))),
            "done square.dxf (42 ms)"
        );

        let failure = TaskFailure {
            fixture: "square.dxf".to_string(),
            adapter: AdapterKind::Library,
            error: ConversionError::Io(std::io::Error::other("disk full")),
        };
        assert_eq!(
            finished_line(&fixture, Err(&failure)),
            "FAILED square.dxf: IO error: disk full"
        );
    }
}
