//! HTML comparison report.
//!
//! One table: a header row naming each preview column, then per fixture a
//! full-width title row and a row of image cells referencing the preview
//! artifacts by file name.

use std::path::{Path, PathBuf};

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, info};

use crate::artifacts::{ArtifactKind, ArtifactSet};
use crate::fixtures::Fixture;

/// Everything but RFC 3986 unreserved characters is encoded in image links.
const LINK_ESCAPE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

fn link(file_name: &str) -> String {
    utf8_percent_encode(file_name, LINK_ESCAPE).to_string()
}

/// One image column of the report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportColumn {
    /// Column heading.
    pub label: String,
    /// Preview artifact shown in this column.
    pub kind: ArtifactKind,
}

impl ReportColumn {
    pub fn new(label: impl Into<String>, kind: ArtifactKind) -> Self {
        Self {
            label: label.into(),
            kind,
        }
    }
}

/// Streams the report to disk. Created once per run.
pub struct ReportWriter {
    path: PathBuf,
    columns: Vec<ReportColumn>,
    out: BufWriter<File>,
    rows: usize,
}

impl ReportWriter {
    /// Create (or truncate) the report and write the table header.
    pub async fn create(path: &Path, columns: Vec<ReportColumn>) -> std::io::Result<Self> {
        let file = File::create(path).await?;
        let mut writer = Self {
            path: path.to_path_buf(),
            columns,
            out: BufWriter::new(file),
            rows: 0,
        };
        writer.write_header().await?;
        debug!(path = %path.display(), columns = writer.columns.len(), "Report opened");
        Ok(writer)
    }

    async fn write_header(&mut self) -> std::io::Result<()> {
        let mut head = String::from(
            "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>DXF conversion summary</title>\n</head>\n<body>\n<table border=\"1\">\n<tr>",
        );
        for column in &self.columns {
            head.push_str("<th>");
            head.push_str(&htmlize::escape_text(column.label.as_str()));
            head.push_str("</th>");
        }
        head.push_str("</tr>\n");
        self.out.write_all(head.as_bytes()).await
    }

    /// Append the row group of one fixture.
    pub async fn write_fixture(
        &mut self,
        fixture: &Fixture,
        artifacts: &ArtifactSet,
    ) -> std::io::Result<()> {
        let span = self.columns.len().max(1);
        let mut rows = format!(
            "<tr><th colspan=\"{span}\">{}</th></tr>\n<tr>",
            htmlize::escape_text(fixture.file_name())
        );
        for column in &self.columns {
            let src = link(&artifacts.file_name(column.kind));
            rows.push_str("<td><img src=\"");
            rows.push_str(&htmlize::escape_attribute(src.as_str()));
            rows.push_str("\" alt=\"");
            rows.push_str(&htmlize::escape_attribute(column.label.as_str()));
            rows.push_str("\"></td>");
        }
        rows.push_str("</tr>\n");

        self.out.write_all(rows.as_bytes()).await?;
        self.rows += 1;
        Ok(())
    }

    /// Close the markup and flush. Returns the number of fixture row groups.
    pub async fn finish(mut self) -> std::io::Result<usize> {
        self.out
            .write_all(b"</table>\n</body>\n</html>\n")
            .await?;
        self.out.flush().await?;
        info!(path = %self.path.display(), fixtures = self.rows, "Report written");
        Ok(self.rows)
    }
}
