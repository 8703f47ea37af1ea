//! In-process preview rendering with the `dxf` crate.
//!
//! Everything here is synchronous and CPU-bound. Async callers run it on the
//! blocking pool.

pub mod geometry;
pub mod svg;

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Instant;

use dxf::Drawing;
use dxfcheck_core::config::preview::PreviewConfig;
use serde::Serialize;
use tracing::{debug, info};

use crate::error::ConversionError;
use geometry::{Flattener, flatten};

/// Summary of one rendered preview.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PreviewStats {
    /// Entities drawn.
    pub entities_drawn: usize,
    /// Unsupported entities by type name.
    pub entities_skipped: BTreeMap<&'static str, usize>,
    /// Drawing extent in drawing units, `None` when nothing was drawn.
    pub extent: Option<(f64, f64)>,
    /// Canvas edge length in pixels.
    pub canvas_size: u32,
    /// Render time in milliseconds.
    pub duration_ms: u64,
}

/// Render an already loaded drawing to SVG markup.
pub fn render_drawing(drawing: &Drawing, config: &PreviewConfig) -> (String, PreviewStats) {
    let start = Instant::now();
    let flat = flatten(drawing, &Flattener::new(config.tolerance));
    let markup = svg::render(&flat, config);

    let stats = PreviewStats {
        entities_drawn: flat.drawn,
        entities_skipped: flat.skipped,
        extent: (!flat.bounds.is_empty()).then(|| (flat.bounds.width(), flat.bounds.height())),
        canvas_size: config.canvas_size,
        duration_ms: start.elapsed().as_millis() as u64,
    };
    (markup, stats)
}

/// Load `input`, render it and write the SVG to `output`.
///
/// Blocking. An empty drawing produces an empty canvas.
pub fn render_file(
    input: &Path,
    output: &Path,
    config: &PreviewConfig,
) -> Result<PreviewStats, ConversionError> {
    debug!(input = %input.display(), "Loading drawing");
    let drawing = Drawing::load_file(input).map_err(|source| ConversionError::Parse {
        path: input.to_path_buf(),
        source,
    })?;

    let (markup, stats) = render_drawing(&drawing, config);
    std::fs::write(output, markup)?;

    info!(
        input = %input.display(),
        output = %output.display(),
        drawn = stats.entities_drawn,
        skipped = stats.entities_skipped.values().sum::<usize>(),
        elapsed_ms = stats.duration_ms,
        "Rendered library preview"
    );
    Ok(stats)
}
