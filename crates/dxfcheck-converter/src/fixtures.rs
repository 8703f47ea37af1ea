//! Fixture discovery: lists drawing files in a directory, sorted by name.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

/// A drawing file used to exercise the conversion pipelines.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fixture {
    path: PathBuf,
    file_name: String,
    stem: String,
}

impl Fixture {
    /// Build a fixture from a file path. Returns `None` for paths without a
    /// UTF-8 file name.
    pub fn from_path(path: impl Into<PathBuf>) -> Option<Self> {
        let path = path.into();
        let file_name = path.file_name()?.to_str()?.to_string();
        let stem = path.file_stem()?.to_str()?.to_string();
        Some(Self {
            path,
            file_name,
            stem,
        })
    }

    /// Full path to the drawing.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name including extension, e.g. `square.dxf`.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Base name without extension, e.g. `square`.
    pub fn stem(&self) -> &str {
        &self.stem
    }
}

/// Scans one directory for fixtures with a given extension.
#[derive(Debug, Clone)]
pub struct FixtureDiscovery {
    dir: PathBuf,
    extension: String,
}

impl FixtureDiscovery {
    /// Create a discovery over `dir` matching `extension` (without dot,
    /// case-insensitive).
    pub fn new(dir: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            extension: extension.into().trim_start_matches('.').to_string(),
        }
    }

    /// List matching fixtures in lexicographic file-name order.
    ///
    /// An empty directory yields an empty list. A missing or unreadable
    /// directory is an error.
    pub async fn discover(&self) -> std::io::Result<Vec<Fixture>> {
        let mut fixtures = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.dir).await?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if !self.matches_extension(&path) {
                continue;
            }

            let is_file = tokio::fs::metadata(&path)
                .await
                .map(|m| m.is_file())
                .unwrap_or(false);
            if !is_file {
                continue;
            }

            match Fixture::from_path(&path) {
                Some(fixture) => fixtures.push(fixture),
                None => warn!(path = %path.display(), "Skipping fixture with non UTF-8 name"),
            }
        }

        fixtures.sort_by(|a, b| a.file_name.cmp(&b.file_name));

        info!(
            dir = %self.dir.display(),
            count = fixtures.len(),
            "Discovered fixtures"
        );
        Ok(fixtures)
    }

    fn matches_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(&self.extension))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(dir: &Path, name: &str) {
        std::fs::write(dir.join(name), "0\nSECTION\n0\nEOF\n").expect("write");
    }

    #[test]
    fn test_fixture_names() {
        let fixture = Fixture::from_path("/data/fixtures/square.dxf").expect("fixture");
        assert_eq!(fixture.file_name(), "square.dxf");
        assert_eq!(fixture.stem(), "square");
        assert_eq!(fixture.path(), Path::new("/data/fixtures/square.dxf"));
    }

    #[tokio::test]
    async fn test_discover_sorted_and_filtered() {
        let temp = tempfile::tempdir().expect("tempdir");
        touch(temp.path(), "square.dxf");
        touch(temp.path(), "circle.dxf");
        touch(temp.path(), "arc.DXF");
        touch(temp.path(), "notes.txt");
        touch(temp.path(), "square_A.svg");
        std::fs::create_dir(temp.path().join("nested.dxf")).expect("mkdir");

        let fixtures = FixtureDiscovery::new(temp.path(), "dxf")
            .discover()
            .await
            .expect("discover");

        let names: Vec<_> = fixtures.iter().map(Fixture::file_name).collect();
        assert_eq!(names, vec!["arc.DXF", "circle.dxf", "square.dxf"]);
    }

    #[tokio::test]
    async fn test_discover_empty_directory() {
        let temp = tempfile::tempdir().expect("tempdir");
        let fixtures = FixtureDiscovery::new(temp.path(), ".dxf")
            .discover()
            .await
            .expect("discover");
        assert!(fixtures.is_empty());
    }

    #[tokio::test]
    async fn test_discover_missing_directory_fails() {
        let result = FixtureDiscovery::new("/nonexistent/dxfcheck/fixtures", "dxf")
            .discover()
            .await;
        assert_eq!(
            result.expect_err("should fail").kind(),
            std::io::ErrorKind::NotFound
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_non_utf8_names_are_skipped() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let temp = tempfile::tempdir().expect("tempdir");
        touch(temp.path(), "circle.dxf");
        let raw = temp.path().join(OsStr::from_bytes(b"bad\xff.dxf"));
        if std::fs::write(&raw, "").is_err() {
            // Filesystem refuses non UTF-8 names.
            return;
        }

        let fixtures = FixtureDiscovery::new(temp.path(), "dxf")
            .discover()
            .await
            .expect("discover");
        let names: Vec<_> = fixtures.iter().map(Fixture::file_name).collect();
        assert_eq!(names, vec!["circle.dxf"]);
    }

    #[tokio::test]
    async fn test_discover_is_repeatable() {
        let temp = tempfile::tempdir().expect("tempdir");
        touch(temp.path(), "b.dxf");
        touch(temp.path(), "a.dxf");

        let discovery = FixtureDiscovery::new(temp.path(), "dxf");
        let first = discovery.discover().await.expect("discover");
        let second = discovery.discover().await.expect("discover");
        assert_eq!(first, second);
    }
}
