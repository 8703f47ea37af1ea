//! SVG serialisation of flattened geometry onto a square canvas.

use std::fmt::Write as _;

use dxfcheck_core::config::preview::PreviewConfig;

use super::geometry::{Bounds, FlattenedDrawing, Point2, Shape};

/// Maps drawing coordinates onto the canvas: uniform scale so the larger
/// side of the bounds spans the canvas, centred, Y flipped.
#[derive(Debug, Clone, Copy)]
pub struct Viewport {
    size: f64,
    scale: f64,
    offset_x: f64,
    offset_y: f64,
}

impl Viewport {
    pub fn fit(bounds: &Bounds, size: u32) -> Self {
        let size = f64::from(size);
        if bounds.is_empty() {
            return Self {
                size,
                scale: 1.0,
                offset_x: 0.0,
                offset_y: 0.0,
            };
        }

        let extent = bounds.width().max(bounds.height());
        let scale = if extent > 0.0 { size / extent } else { 1.0 };
        Self {
            size,
            scale,
            offset_x: (size - bounds.width() * scale) / 2.0 - bounds.min_x * scale,
            offset_y: (size - bounds.height() * scale) / 2.0 - bounds.min_y * scale,
        }
    }

    pub fn map(&self, p: Point2) -> Point2 {
        Point2::new(
            p.x * self.scale + self.offset_x,
            self.size - (p.y * self.scale + self.offset_y),
        )
    }
}

/// Render `drawing` as a complete SVG document.
pub fn render(drawing: &FlattenedDrawing, config: &PreviewConfig) -> String {
    let viewport = Viewport::fit(&drawing.bounds, config.canvas_size);
    let size = config.canvas_size;
    let stroke = htmlize::escape_attribute(config.stroke_color.as_str());
    let stroke_width = coord(config.stroke_width);

    let mut svg = String::with_capacity(256 + drawing.shapes.len() * 64);
    let _ = writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{size}" height="{size}" viewBox="0 0 {size} {size}">"#
    );
    let _ = writeln!(
        svg,
        r#"<g fill="none" stroke="{stroke}" stroke-width="{stroke_width}" stroke-linecap="round" stroke-linejoin="round">"#
    );

    for shape in &drawing.shapes {
        match shape {
            Shape::Path(polyline) if !polyline.points.is_empty() => {
                svg.push_str(r#"<path d=""#);
                for (i, p) in polyline.points.iter().enumerate() {
                    let p = viewport.map(*p);
                    let cmd = if i == 0 { "M" } else { " L" };
                    let _ = write!(svg, "{cmd}{} {}", coord(p.x), coord(p.y));
                }
                if polyline.closed {
                    svg.push_str(" Z");
                }
                svg.push_str("\"/>\n");
            }
            Shape::Path(_) => {}
            Shape::Dot(point) => {
                let p = viewport.map(*point);
                let _ = writeln!(
                    svg,
                    r#"<circle cx="{}" cy="{}" r="{}" fill="{stroke}" stroke="none"/>"#,
                    coord(p.x),
                    coord(p.y),
                    stroke_width
                );
            }
        }
    }

    svg.push_str("</g>\n</svg>\n");
    svg
}

/// Coordinate text with at most three decimals and no trailing zeros.
fn coord(v: f64) -> String {
    let text = format!("{v:.3}");
    let text = text.trim_end_matches('0').trim_end_matches('.');
    match text {
        "-0" | "" => "0".to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preview::geometry::Polyline;

    fn square(side: f64) -> FlattenedDrawing {
        let mut drawing = FlattenedDrawing::default();
        let points = vec![
            Point2::new(0.0, 0.0),
            Point2::new(side, 0.0),
            Point2::new(side, side),
            Point2::new(0.0, side),
        ];
        for p in &points {
            drawing.bounds.include(*p);
        }
        drawing.shapes.push(Shape::Path(Polyline {
            points,
            closed: true,
        }));
        drawing
    }

    #[test]
    fn test_coord_formatting() {
        assert_eq!(coord(12.0), "12");
        assert_eq!(coord(0.1234), "0.123");
        assert_eq!(coord(-0.0001), "0");
        assert_eq!(coord(2.5), "2.5");
    }

    #[test]
    fn test_square_fills_canvas_with_y_flipped() {
        let svg = render(&square(10.0), &PreviewConfig::default());
        assert!(svg.starts_with("<svg "));
        assert!(svg.contains(r#"viewBox="0 0 512 512""#));
        assert!(svg.contains(r#"<path d="M0 512 L512 512 L512 0 L0 0 Z"/>"#));
    }

    #[test]
    fn test_wide_drawing_is_centred_vertically() {
        let mut drawing = FlattenedDrawing::default();
        let points = vec![Point2::new(0.0, 0.0), Point2::new(20.0, 10.0)];
        for p in &points {
            drawing.bounds.include(*p);
        }
        drawing.shapes.push(Shape::Path(Polyline {
            points,
            closed: false,
        }));

        let config = PreviewConfig {
            canvas_size: 100,
            ..Default::default()
        };
        let svg = render(&drawing, &config);
        assert!(svg.contains(r#"d="M0 75 L100 25""#), "{svg}");
    }

    #[test]
    fn test_empty_drawing_renders_empty_canvas() {
        let svg = render(&FlattenedDrawing::default(), &PreviewConfig::default());
        assert!(!svg.contains("<path"));
        assert!(svg.trim_end().ends_with("</svg>"));
    }

    #[test]
    fn test_stroke_color_is_escaped() {
        let config = PreviewConfig {
            stroke_color: "red\" onload=\"x".to_string(),
            ..Default::default()
        };
        let svg = render(&square(1.0), &config);
        assert!(svg.contains("stroke=\"red&quot; onload=&quot;x\""));
    }
}
