//! Adapter C: preview rendered by an installed CAD suite.

use std::sync::Arc;

use async_trait::async_trait;
use dxfcheck_core::config::harness::AdapterKind;
use dxfcheck_core::config::suite::SuiteConfig;
use tracing::instrument;

use super::Adapter;
use crate::artifacts::{ArtifactKind, ArtifactSet};
use crate::error::ConversionError;
use crate::fixtures::Fixture;
use crate::runner::{CommandLine, CommandRunner};
use crate::suite::SuiteInstallation;

/// Runs `<interpreter> <script> <input> <preview>`.
#[derive(Debug, Clone)]
pub struct SuiteAdapter {
    installation: SuiteInstallation,
    config: SuiteConfig,
    runner: Arc<CommandRunner>,
}

impl SuiteAdapter {
    pub fn new(installation: SuiteInstallation, config: SuiteConfig, runner: Arc<CommandRunner>) -> Self {
        Self {
            installation,
            config,
            runner,
        }
    }

    pub fn command_line(&self, fixture: &Fixture, artifacts: &ArtifactSet) -> CommandLine {
        CommandLine::new(&self.installation.interpreter)
            .arg(&self.config.script)
            .arg(fixture.path())
            .arg(artifacts.get(ArtifactKind::SuitePreview))
    }
}

#[async_trait]
impl Adapter for SuiteAdapter {
    fn kind(&self) -> AdapterKind {
        AdapterKind::Suite
    }

    fn name(&self) -> &str {
        &self.config.label
    }

    fn preview(&self) -> Option<ArtifactKind> {
        Some(ArtifactKind::SuitePreview)
    }

    #[instrument(skip_all, fields(fixture = fixture.file_name(), adapter = "suite"))]
    async fn convert(
        &self,
        fixture: &Fixture,
        artifacts: &ArtifactSet,
    ) -> Result<(), ConversionError> {
        self.runner.run(&self.command_line(fixture, artifacts)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::suite::LookupMethod;

    fn adapter() -> SuiteAdapter {
        SuiteAdapter::new(
            SuiteInstallation {
                interpreter: "/opt/suite/bin/python".into(),
                install_dir: Some("/opt/suite".into()),
                display_version: None,
                method: LookupMethod::ExplicitConfig,
            },
            SuiteConfig::default(),
            Arc::new(CommandRunner::default()),
        )
    }

    #[test]
    fn test_command_line() {
        let fixture = Fixture::from_path("/data/fixtures/gear.dxf").expect("fixture");
        let cmd = adapter().command_line(&fixture, &ArtifactSet::derive(&fixture));
        assert_eq!(cmd.program(), std::path::Path::new("/opt/suite/bin/python"));
        assert_eq!(
            cmd.argv(),
            ["suite_preview.py", "/data/fixtures/gear.dxf", "/data/fixtures/gear_B.svg"]
        );
    }

    #[test]
    fn test_column_label() {
        let adapter = adapter();
        assert_eq!(adapter.name(), "CAD suite");
        assert_eq!(adapter.preview(), Some(ArtifactKind::SuitePreview));
    }
}
