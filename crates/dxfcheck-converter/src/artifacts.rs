//! Output artifact naming.
//!
//! Every artifact lives next to its fixture and is named
//! `<fixture-stem><suffix>.<extension>`. Derivation is pure: no I/O.

use std::path::{Path, PathBuf};

use crate::fixtures::Fixture;

/// The kinds of files adapters produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    /// Preview rendered in-process by the DXF library.
    LibraryPreview,
    /// Preview written by the external tool (`-svg`).
    ToolPreview,
    /// Structured geometry written by the external tool.
    Geometry,
    /// Preview rendered by the CAD suite.
    SuitePreview,
}

impl ArtifactKind {
    /// Every kind, in artifact-set order.
    pub const ALL: [ArtifactKind; 4] = [
        ArtifactKind::LibraryPreview,
        ArtifactKind::ToolPreview,
        ArtifactKind::Geometry,
        ArtifactKind::SuitePreview,
    ];

    /// File name suffix appended to the fixture stem.
    pub fn suffix(&self) -> &'static str {
        match self {
            Self::LibraryPreview => "_A",
            Self::ToolPreview => "_out",
            Self::Geometry => "",
            Self::SuitePreview => "_B",
        }
    }

    /// File extension.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Geometry => "json",
            Self::LibraryPreview | Self::ToolPreview | Self::SuitePreview => "svg",
        }
    }

    /// Whether the artifact is an image shown in the report.
    pub fn is_preview(&self) -> bool {
        !matches!(self, Self::Geometry)
    }

    /// Artifact file name for a fixture stem.
    pub fn file_name_for(&self, stem: &str) -> String {
        format!("{stem}{}.{}", self.suffix(), self.extension())
    }
}

/// The derived output paths of one fixture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactSet {
    library_preview: PathBuf,
    tool_preview: PathBuf,
    geometry: PathBuf,
    suite_preview: PathBuf,
}

impl ArtifactSet {
    /// Derive every artifact path for `fixture`.
    pub fn derive(fixture: &Fixture) -> Self {
        let path_for = |kind: ArtifactKind| {
            fixture
                .path()
                .with_file_name(kind.file_name_for(fixture.stem()))
        };

        Self {
            library_preview: path_for(ArtifactKind::LibraryPreview),
            tool_preview: path_for(ArtifactKind::ToolPreview),
            geometry: path_for(ArtifactKind::Geometry),
            suite_preview: path_for(ArtifactKind::SuitePreview),
        }
    }

    /// Path of the artifact of the given kind.
    pub fn get(&self, kind: ArtifactKind) -> &Path {
        match kind {
            ArtifactKind::LibraryPreview => &self.library_preview,
            ArtifactKind::ToolPreview => &self.tool_preview,
            ArtifactKind::Geometry => &self.geometry,
            ArtifactKind::SuitePreview => &self.suite_preview,
        }
    }

    /// File name (no directory) of the artifact of the given kind.
    pub fn file_name(&self, kind: ArtifactKind) -> String {
        self.get(kind)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}
