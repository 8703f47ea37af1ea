//! Adapter B: the external geometry-extraction tool.
//!
//! One invocation writes both the tool's preview and the structured
//! geometry file:
//!
//! `<exe> -svg <preview> -e <epsilon> -optstart -optdir -- <input> <geometry>`

use std::sync::Arc;

use async_trait::async_trait;
use dxfcheck_core::config::harness::AdapterKind;
use dxfcheck_core::config::tool::ToolConfig;
use tracing::instrument;

use super::Adapter;
use crate::artifacts::{ArtifactKind, ArtifactSet};
use crate::error::ConversionError;
use crate::fixtures::Fixture;
use crate::runner::{CommandLine, CommandRunner};

/// Runs the external tool through the command runner.
#[derive(Debug, Clone)]
pub struct ToolAdapter {
    config: ToolConfig,
    runner: Arc<CommandRunner>,
    name: String,
}

impl ToolAdapter {
    pub fn new(config: ToolConfig, runner: Arc<CommandRunner>) -> Self {
        let name = config
            .executable
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| config.executable.to_string_lossy().into_owned());
        Self {
            config,
            runner,
            name,
        }
    }

    /// The exact command line used for `fixture`.
    pub fn command_line(&self, fixture: &Fixture, artifacts: &ArtifactSet) -> CommandLine {
        CommandLine::new(&self.config.executable)
            .arg("-svg")
            .arg(artifacts.get(ArtifactKind::ToolPreview))
            .arg("-e")
            .arg(&self.config.epsilon)
            .args(["-optstart", "-optdir", "--"])
            .arg(fixture.path())
            .arg(artifacts.get(ArtifactKind::Geometry))
    }
}

#[async_trait]
impl Adapter for ToolAdapter {
    fn kind(&self) -> AdapterKind {
        AdapterKind::Tool
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn preview(&self) -> Option<ArtifactKind> {
        Some(ArtifactKind::ToolPreview)
    }

    #[instrument(skip_all, fields(fixture = fixture.file_name(), adapter = "tool"))]
    async fn convert(
        &self,
        fixture: &Fixture,
        artifacts: &ArtifactSet,
    ) -> Result<(), ConversionError> {
        let command = self.command_line(fixture, artifacts);
        self.runner.run(&command).await?;
        Ok(())
    }
}
