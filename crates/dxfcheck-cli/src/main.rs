//! `dxf-preview`: render one drawing to an SVG preview with the in-process
//! library renderer.

use std::path::PathBuf;

use clap::Parser;

use dxfcheck_converter::preview::{self, PreviewStats};
use dxfcheck_core::config::AppConfig;
use dxfcheck_core::AppResult;
use dxfcheck_core::logging;

mod output;

use output::OutputFormat;

/// Render a DXF drawing to a square SVG preview
#[derive(Debug, Parser)]
#[command(name = "dxf-preview", version, about, long_about = None)]
struct Cli {
    /// Input drawing
    input: PathBuf,

    /// Output SVG file
    output: PathBuf,

    /// Canvas edge length in pixels (overrides `preview.canvas_size`)
    #[arg(short, long)]
    size: Option<u32>,

    /// Additional configuration file
    #[arg(short, long, env = "DXFCHECK_CONFIG")]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(&cli) {
        tracing::error!(error = %e, input = %cli.input.display(), "Preview failed");
        output::print_error(&e.to_string());
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> AppResult<()> {
    let mut config = AppConfig::load(cli.config.as_deref())?;
    if let Some(size) = cli.size {
        config.preview.canvas_size = size;
        validator::Validate::validate(&config)?;
    }
    logging::init(&config.logging);

    tracing::info!(
        input = %cli.input.display(),
        output = %cli.output.display(),
        canvas_size = config.preview.canvas_size,
        "Rendering preview"
    );
    let stats = preview::render_file(&cli.input, &cli.output, &config.preview)?;
    tracing::info!(
        drawn = stats.entities_drawn,
        elapsed_ms = stats.duration_ms,
        "Preview written"
    );
    report(cli, &stats);
    Ok(())
}

fn report(cli: &Cli, stats: &PreviewStats) {
    match cli.format {
        OutputFormat::Json => output::print_json(stats),
        OutputFormat::Text => {
            output::print_success(&format!("Wrote {}", cli.output.display()));
            output::print_kv("entities", &stats.entities_drawn.to_string());
            let skipped: usize = stats.entities_skipped.values().sum();
            if skipped > 0 {
                let detail: Vec<String> = stats
                    .entities_skipped
                    .iter()
                    .map(|(name, count)| format!("{name}={count}"))
                    .collect();
                output::print_kv("skipped", &format!("{skipped} ({})", detail.join(", ")));
            }
            if let Some((w, h)) = stats.extent {
                output::print_kv("extent", &format!("{w:.3} x {h:.3}"));
            }
            output::print_kv("canvas", &format!("{0} x {0} px", stats.canvas_size));
            output::print_kv("elapsed", &format!("{} ms", stats.duration_ms));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_positional_and_size() {
        let cli = Cli::try_parse_from(["dxf-preview", "in.dxf", "out.svg", "--size", "256"])
            .expect("parse");
        assert_eq!(cli.input, PathBuf::from("in.dxf"));
        assert_eq!(cli.output, PathBuf::from("out.svg"));
        assert_eq!(cli.size, Some(256));
        assert_eq!(cli.format, OutputFormat::Text);
    }

    #[test]
    fn test_output_is_required() {
        assert!(Cli::try_parse_from(["dxf-preview", "in.dxf"]).is_err());
    }

    #[test]
    fn test_renders_drawing_at_requested_size() {
        use dxf::Drawing;
        use dxf::entities::{Entity, EntityType, Line};

        let temp = tempfile::tempdir().expect("tempdir");
        let input = temp.path().join("line.dxf");
        let mut drawing = Drawing::new();
        drawing.add_entity(Entity::new(EntityType::Line(Line {
            p1: dxf::Point::new(0.0, 0.0, 0.0),
            p2: dxf::Point::new(10.0, 10.0, 0.0),
            ..Default::default()
        })));
        drawing.save_file(&input).expect("save");

        let output = temp.path().join("line.svg");
        let cli = Cli::try_parse_from([
            "dxf-preview".into(),
            input.into_os_string(),
            output.clone().into_os_string(),
            "--size".into(),
            "128".into(),
            "--format".into(),
            "json".into(),
        ])
        .expect("parse");
        run(&cli).expect("render");

        let svg = std::fs::read_to_string(output).expect("svg");
        assert!(svg.contains("width=\"128\""));
        assert!(svg.contains("<path d=\"M0 128 L128 0\"/>"));
    }

    #[test]
    fn test_invalid_size_rejected() {
        let temp = tempfile::tempdir().expect("tempdir");
        let cli = Cli::try_parse_from([
            "dxf-preview".into(),
            temp.path().join("in.dxf").into_os_string(),
            temp.path().join("out.svg").into_os_string(),
            "--size".into(),
            "4".into(),
        ])
        .expect("parse");
        let err = run(&cli).expect_err("size 4 is below the minimum");
        assert_eq!(err.kind, dxfcheck_core::error::ErrorKind::Configuration);
        assert!(!temp.path().join("out.svg").exists());
    }
}
