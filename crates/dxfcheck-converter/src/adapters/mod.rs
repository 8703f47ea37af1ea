//! Conversion adapters and the per-fixture adapter chain.

pub mod library;
pub mod suite;
pub mod tool;

use std::sync::Arc;

use async_trait::async_trait;
use dxfcheck_core::config::AppConfig;
use dxfcheck_core::config::harness::AdapterKind;
use tracing::{debug, info, warn};

use crate::artifacts::{ArtifactKind, ArtifactSet};
use crate::error::{ConversionError, TaskFailure};
use crate::fixtures::Fixture;
use crate::report::ReportColumn;
use crate::runner::CommandRunner;
use crate::suite::{SuiteCapability, SuiteDiscovery};

pub use library::LibraryAdapter;
pub use suite::SuiteAdapter;
pub use tool::ToolAdapter;

/// A conversion back end run once per fixture.
#[async_trait]
pub trait Adapter: Send + Sync + std::fmt::Debug {
    /// Which back end this is.
    fn kind(&self) -> AdapterKind;

    /// Human-readable name, used as the report column heading.
    fn name(&self) -> &str;

    /// The preview artifact this adapter writes, if any.
    fn preview(&self) -> Option<ArtifactKind>;

    /// Convert `fixture`, writing into `artifacts`.
    async fn convert(&self, fixture: &Fixture, artifacts: &ArtifactSet)
    -> Result<(), ConversionError>;
}

/// Ordered list of adapters run for every fixture.
#[derive(Debug, Clone, Default)]
pub struct AdapterChain {
    adapters: Vec<Arc<dyn Adapter>>,
}

impl AdapterChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the chain listed in `harness.adapters`.
    ///
    /// The suite adapter is looked up here; when the suite is not installed
    /// it is dropped with a warning.
    pub fn from_config(config: &AppConfig, runner: Arc<CommandRunner>) -> Self {
        let mut chain = Self::new();
        for kind in &config.harness.adapters {
            if chain.contains(*kind) {
                warn!(adapter = %kind, "Adapter listed twice, ignoring duplicate");
                continue;
            }
            match kind {
                AdapterKind::Library => {
                    chain.register(Arc::new(LibraryAdapter::new(config.preview.clone())));
                }
                AdapterKind::Tool => {
                    chain.register(Arc::new(ToolAdapter::new(
                        config.tool.clone(),
                        Arc::clone(&runner),
                    )));
                }
                AdapterKind::Suite => {
                    match SuiteDiscovery::new(config.suite.clone()).lookup() {
                        SuiteCapability::Available(installation) => {
                            chain.register(Arc::new(SuiteAdapter::new(
                                installation,
                                config.suite.clone(),
                                Arc::clone(&runner),
                            )));
                        }
                        SuiteCapability::Unavailable { reason } => {
                            warn!(reason = %reason, "CAD suite unavailable, suite adapter disabled");
                        }
                    }
                }
            }
        }
        chain
    }

    /// Append an adapter.
    pub fn register(&mut self, adapter: Arc<dyn Adapter>) {
        info!(adapter = %adapter.kind(), name = adapter.name(), "Registered adapter");
        self.adapters.push(adapter);
    }

    pub fn contains(&self, kind: AdapterKind) -> bool {
        self.adapters.iter().any(|a| a.kind() == kind)
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }

    /// Report columns: the previews of the registered adapters, in order.
    pub fn preview_columns(&self) -> Vec<ReportColumn> {
        self.adapters
            .iter()
            .filter_map(|a| a.preview().map(|kind| ReportColumn::new(a.name(), kind)))
            .collect()
    }

    /// Run every adapter on `fixture` in order. The first failure ends the
    /// task; later adapters are not run.
    pub async fn run(&self, fixture: &Fixture, artifacts: &ArtifactSet) -> Result<(), TaskFailure> {
        for adapter in &self.adapters {
            debug!(fixture = fixture.file_name(), adapter = %adapter.kind(), "Running adapter");
            adapter
                .convert(fixture, artifacts)
                .await
                .map_err(|error| TaskFailure {
                    fixture: fixture.file_name().to_string(),
                    adapter: adapter.kind(),
                    error,
                })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_chain_columns() {
        let chain = AdapterChain::from_config(&AppConfig::default(), Arc::new(CommandRunner::default()));
        assert_eq!(chain.len(), 2);
        assert_eq!(
            chain.preview_columns(),
            vec![
                ReportColumn::new("library (dxf crate)", ArtifactKind::LibraryPreview),
                ReportColumn::new("dxf2precitec", ArtifactKind::ToolPreview),
            ]
        );
    }

    #[test]
    fn test_order_follows_config_and_duplicates_dropped() {
        let mut config = AppConfig::default();
        config.harness.adapters = vec![AdapterKind::Tool, AdapterKind::Library, AdapterKind::Tool];
        let chain = AdapterChain::from_config(&config, Arc::new(CommandRunner::default()));
        let kinds: Vec<_> = chain.preview_columns().into_iter().map(|c| c.kind).collect();
        assert_eq!(kinds, vec![ArtifactKind::ToolPreview, ArtifactKind::LibraryPreview]);
    }

    #[test]
    fn test_unavailable_suite_is_dropped() {
        let mut config = AppConfig::default();
        config.harness.adapters = vec![AdapterKind::Library, AdapterKind::Suite];
        config.suite.interpreter = Some("/nonexistent/suite/python".into());
        config.suite.path_interpreter = "dxfcheck-no-such-interpreter".to_string();
        let chain = AdapterChain::from_config(&config, Arc::new(CommandRunner::default()));
        assert!(chain.contains(AdapterKind::Library));
        assert!(!chain.contains(AdapterKind::Suite));
    }
}
