//! Adapter A: preview rendered in-process with the `dxf` crate.

use async_trait::async_trait;
use dxfcheck_core::config::harness::AdapterKind;
use dxfcheck_core::config::preview::PreviewConfig;
use tracing::instrument;

use super::Adapter;
use crate::artifacts::{ArtifactKind, ArtifactSet};
use crate::error::ConversionError;
use crate::fixtures::Fixture;
use crate::preview;

const NAME: &str = "library (dxf crate)";

/// Renders `<stem>_A.svg` on the blocking pool.
#[derive(Debug, Clone)]
pub struct LibraryAdapter {
    config: PreviewConfig,
}

impl LibraryAdapter {
    pub fn new(config: PreviewConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Adapter for LibraryAdapter {
    fn kind(&self) -> AdapterKind {
        AdapterKind::Library
    }

    fn name(&self) -> &str {
        NAME
    }

    fn preview(&self) -> Option<ArtifactKind> {
        Some(ArtifactKind::LibraryPreview)
    }

    #[instrument(skip_all, fields(fixture = fixture.file_name(), adapter = "library"))]
    async fn convert(
        &self,
        fixture: &Fixture,
        artifacts: &ArtifactSet,
    ) -> Result<(), ConversionError> {
        let input = fixture.path().to_path_buf();
        let output = artifacts.get(ArtifactKind::LibraryPreview).to_path_buf();
        let config = self.config.clone();

        tokio::task::spawn_blocking(move || preview::render_file(&input, &output, &config))
            .await??;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dxf::Drawing;
    use dxf::entities::{Circle, Entity, EntityType};

    #[tokio::test]
    async fn test_writes_library_preview() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("circle.dxf");
        let mut drawing = Drawing::new();
        drawing.add_entity(Entity::new(EntityType::Circle(Circle {
            center: dxf::Point::new(0.0, 0.0, 0.0),
            radius: 3.0,
            ..Default::default()
        })));
        drawing.save_file(&path).expect("save");

        let fixture = Fixture::from_path(&path).expect("fixture");
        let artifacts = ArtifactSet::derive(&fixture);
        LibraryAdapter::new(PreviewConfig::default())
            .convert(&fixture, &artifacts)
            .await
            .expect("convert");

        let svg = std::fs::read_to_string(temp.path().join("circle_A.svg")).expect("svg");
        assert!(svg.contains(" Z\"/>"));
    }

    #[tokio::test]
    async fn test_unreadable_drawing_fails() {
        let temp = tempfile::tempdir().expect("tempdir");
        let fixture = Fixture::from_path(temp.path().join("gone.dxf")).expect("fixture");
        let artifacts = ArtifactSet::derive(&fixture);
        let err = LibraryAdapter::new(PreviewConfig::default())
            .convert(&fixture, &artifacts)
            .await
            .expect_err("should fail");
        assert!(matches!(err, ConversionError::Parse { .. }));
    }
}
