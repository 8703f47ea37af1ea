//! Flattening of drawing entities into 2D polylines.

use std::collections::BTreeMap;
use std::f64::consts::{FRAC_PI_2, TAU};

use dxf::Drawing;
use dxf::entities::{Entity, EntityType};
use tracing::debug;

const MIN_SEGMENTS_PER_TURN: f64 = 8.0;
const MAX_SEGMENTS: usize = 4096;
const EPSILON: f64 = 1e-12;

/// A point in world XY.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point2 {
    pub x: f64,
    pub y: f64,
}

impl Point2 {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    fn distance(&self, other: &Point2) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }
}

/// An open or closed chain of straight segments.
#[derive(Debug, Clone, PartialEq)]
pub struct Polyline {
    pub points: Vec<Point2>,
    pub closed: bool,
}

/// A flattened primitive ready for rendering.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Path(Polyline),
    Dot(Point2),
}

impl Shape {
    fn points(&self) -> &[Point2] {
        match self {
            Shape::Path(polyline) => &polyline.points,
            Shape::Dot(point) => std::slice::from_ref(point),
        }
    }
}

/// Axis-aligned bounding box. Empty until a point is included.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Default for Bounds {
    fn default() -> Self {
        Self {
            min_x: f64::INFINITY,
            min_y: f64::INFINITY,
            max_x: f64::NEG_INFINITY,
            max_y: f64::NEG_INFINITY,
        }
    }
}

impl Bounds {
    pub fn include(&mut self, p: Point2) {
        if !p.x.is_finite() || !p.y.is_finite() {
            return;
        }
        self.min_x = self.min_x.min(p.x);
        self.min_y = self.min_y.min(p.y);
        self.max_x = self.max_x.max(p.x);
        self.max_y = self.max_y.max(p.y);
    }

    pub fn is_empty(&self) -> bool {
        self.min_x > self.max_x || self.min_y > self.max_y
    }

    pub fn width(&self) -> f64 {
        if self.is_empty() { 0.0 } else { self.max_x - self.min_x }
    }

    pub fn height(&self) -> f64 {
        if self.is_empty() { 0.0 } else { self.max_y - self.min_y }
    }
}

/// The model-space geometry of one drawing.
#[derive(Debug, Clone, Default)]
pub struct FlattenedDrawing {
    pub shapes: Vec<Shape>,
    pub bounds: Bounds,
    /// Entities turned into shapes.
    pub drawn: usize,
    /// Unsupported entities by type name.
    pub skipped: BTreeMap<&'static str, usize>,
}

impl FlattenedDrawing {
    fn push(&mut self, shape: Shape) {
        for p in shape.points() {
            self.bounds.include(*p);
        }
        self.shapes.push(shape);
    }
}

/// Turns curves into chords whose deviation stays below a tolerance
/// relative to the curve radius.
#[derive(Debug, Clone, Copy)]
pub struct Flattener {
    max_step: f64,
}

impl Flattener {
    pub fn new(relative_tolerance: f64) -> Self {
        let t = relative_tolerance.clamp(1e-9, 1.0);
        let max_step = (2.0 * (1.0 - t).acos()).min(TAU / MIN_SEGMENTS_PER_TURN);
        Self { max_step }
    }

    /// Number of chords used for a sweep of `sweep` radians.
    pub fn segments_for(&self, sweep: f64) -> usize {
        let n = (sweep.abs() / self.max_step).ceil();
        (n as usize).clamp(1, MAX_SEGMENTS)
    }

    /// Points on a circular arc, start and end included. `sweep` is signed,
    /// positive counter-clockwise.
    pub fn arc(&self, center: Point2, radius: f64, start: f64, sweep: f64) -> Vec<Point2> {
        let n = self.segments_for(sweep);
        (0..=n)
            .map(|i| {
                let a = start + sweep * (i as f64) / (n as f64);
                Point2::new(center.x + radius * a.cos(), center.y + radius * a.sin())
            })
            .collect()
    }

    /// Points of a bulged polyline segment from `p1` to `p2`, excluding `p1`.
    pub fn bulge(&self, p1: Point2, p2: Point2, bulge: f64) -> Vec<Point2> {
        let chord = p1.distance(&p2);
        if bulge.abs() < EPSILON || chord < EPSILON {
            return vec![p2];
        }

        let sweep = 4.0 * bulge.atan();
        let radius = chord / (2.0 * (sweep / 2.0).sin());
        // Signed distance from the chord midpoint to the centre, along the
        // left normal of p1->p2.
        let offset = radius * (sweep / 2.0).cos();
        let mid = Point2::new((p1.x + p2.x) / 2.0, (p1.y + p2.y) / 2.0);
        let (nx, ny) = (-(p2.y - p1.y) / chord, (p2.x - p1.x) / chord);
        let center = Point2::new(mid.x + nx * offset, mid.y + ny * offset);

        let start = (p1.y - center.y).atan2(p1.x - center.x);
        let mut points = self.arc(center, radius.abs(), start, sweep);
        points.remove(0);
        if let Some(last) = points.last_mut() {
            *last = p2;
        }
        points
    }

    /// Points on an elliptical arc between two parameters (radians).
    pub fn ellipse(
        &self,
        center: Point2,
        major: Point2,
        minor: Point2,
        start: f64,
        end: f64,
    ) -> Vec<Point2> {
        let mut sweep = end - start;
        if sweep <= EPSILON {
            sweep += TAU;
        }
        let n = self.segments_for(sweep);
        (0..=n)
            .map(|i| {
                let t = start + sweep * (i as f64) / (n as f64);
                Point2::new(
                    center.x + major.x * t.cos() + minor.x * t.sin(),
                    center.y + major.y * t.cos() + minor.y * t.sin(),
                )
            })
            .collect()
    }

    /// Samples a non-rational B-spline. Returns `None` when the knot vector
    /// does not match the control points.
    pub fn b_spline(&self, degree: usize, knots: &[f64], control: &[Point2]) -> Option<Vec<Point2>> {
        let n = control.len();
        if degree == 0 || n <= degree || knots.len() != n + degree + 1 {
            return None;
        }

        let per_span = self.segments_for(FRAC_PI_2);
        let mut points = Vec::new();
        for span in degree..n {
            let (u0, u1) = (knots[span], knots[span + 1]);
            if u1 - u0 <= EPSILON {
                continue;
            }
            let first = if points.is_empty() { 0 } else { 1 };
            for i in first..=per_span {
                let u = u0 + (u1 - u0) * (i as f64) / (per_span as f64);
                points.push(de_boor(degree, knots, control, span, u));
                if points.len() >= MAX_SEGMENTS {
                    return Some(points);
                }
            }
        }

        (!points.is_empty()).then_some(points)
    }

    /// A smooth curve passing through every fit point (uniform Catmull-Rom).
    /// Approximates the interpolating spline a CAD package would build from
    /// the same points. For closed curves the final segment wraps to the
    /// first point, which is not repeated in the output.
    pub fn through(&self, fit: &[Point2], closed: bool) -> Vec<Point2> {
        let n = fit.len();
        if n < 3 {
            return fit.to_vec();
        }

        let at = |i: isize| -> Point2 {
            if closed {
                fit[i.rem_euclid(n as isize) as usize]
            } else {
                fit[i.clamp(0, n as isize - 1) as usize]
            }
        };
        let spans = if closed { n } else { n - 1 };
        let per_span = self.segments_for(FRAC_PI_2);
        let mut points = vec![fit[0]];
        for span in 0..spans as isize {
            let (p0, p1, p2, p3) = (at(span - 1), at(span), at(span + 1), at(span + 2));
            for i in 1..=per_span {
                points.push(catmull_rom(p0, p1, p2, p3, i as f64 / per_span as f64));
            }
            if let Some(last) = points.last_mut() {
                *last = p2;
            }
        }
        if closed {
            points.pop();
        }
        points.truncate(MAX_SEGMENTS);
        points
    }
}

fn catmull_rom(p0: Point2, p1: Point2, p2: Point2, p3: Point2, t: f64) -> Point2 {
    let t2 = t * t;
    let t3 = t2 * t;
    let blend = |a: f64, b: f64, c: f64, d: f64| {
        0.5 * (2.0 * b + (c - a) * t + (2.0 * a - 5.0 * b + 4.0 * c - d) * t2
            + (3.0 * b - a - 3.0 * c + d) * t3)
    };
    Point2::new(blend(p0.x, p1.x, p2.x, p3.x), blend(p0.y, p1.y, p2.y, p3.y))
}

fn de_boor(degree: usize, knots: &[f64], control: &[Point2], span: usize, u: f64) -> Point2 {
    let mut d: Vec<Point2> = (0..=degree).map(|j| control[j + span - degree]).collect();
    for r in 1..=degree {
        for j in (r..=degree).rev() {
            let lo = knots[j + span - degree];
            let hi = knots[j + 1 + span - r];
            let alpha = if hi - lo > EPSILON { (u - lo) / (hi - lo) } else { 0.0 };
            d[j] = Point2::new(
                (1.0 - alpha) * d[j - 1].x + alpha * d[j].x,
                (1.0 - alpha) * d[j - 1].y + alpha * d[j].y,
            );
        }
    }
    d[degree]
}

/// Object coordinate system derived from an extrusion direction using the
/// arbitrary axis algorithm.
#[derive(Debug, Clone, Copy)]
struct Ocs {
    ax: [f64; 3],
    ay: [f64; 3],
}

impl Ocs {
    /// `None` when the extrusion is +Z and OCS equals WCS.
    fn from_normal(normal: &dxf::Vector) -> Option<Self> {
        let len = (normal.x * normal.x + normal.y * normal.y + normal.z * normal.z).sqrt();
        if len < EPSILON {
            return None;
        }
        let n = [normal.x / len, normal.y / len, normal.z / len];
        if n[0].abs() < EPSILON && n[1].abs() < EPSILON && n[2] > 0.0 {
            return None;
        }

        let ax = if n[0].abs() < 1.0 / 64.0 && n[1].abs() < 1.0 / 64.0 {
            normalize(cross([0.0, 1.0, 0.0], n))
        } else {
            normalize(cross([0.0, 0.0, 1.0], n))
        };
        let ay = normalize(cross(n, ax));
        Some(Self { ax, ay })
    }

    fn to_world(&self, p: Point2) -> Point2 {
        Point2::new(
            p.x * self.ax[0] + p.y * self.ay[0],
            p.x * self.ax[1] + p.y * self.ay[1],
        )
    }
}

fn cross(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

fn normalize(v: [f64; 3]) -> [f64; 3] {
    let len = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
    if len < EPSILON {
        v
    } else {
        [v[0] / len, v[1] / len, v[2] / len]
    }
}

fn map_ocs(ocs: Option<Ocs>, points: Vec<Point2>) -> Vec<Point2> {
    match ocs {
        Some(ocs) => points.into_iter().map(|p| ocs.to_world(p)).collect(),
        None => points,
    }
}

fn xy(p: &dxf::Point) -> Point2 {
    Point2::new(p.x, p.y)
}

/// Flatten every model-space entity of `drawing`.
pub fn flatten(drawing: &Drawing, flattener: &Flattener) -> FlattenedDrawing {
    let mut out = FlattenedDrawing::default();
    for entity in drawing.entities() {
        if entity.common.is_in_paper_space {
            continue;
        }
        match flatten_entity(entity, flattener) {
            Ok(Some(shape)) => {
                out.drawn += 1;
                out.push(shape);
            }
            Ok(None) => {}
            Err(name) => *out.skipped.entry(name).or_insert(0) += 1,
        }
    }

    if !out.skipped.is_empty() {
        debug!(skipped = ?out.skipped, "Skipped unsupported entities");
    }
    out
}

/// `Ok(None)` for supported but degenerate entities, `Err(type name)` for
/// unsupported ones.
fn flatten_entity(entity: &Entity, f: &Flattener) -> Result<Option<Shape>, &'static str> {
    let shape = match &entity.specific {
        EntityType::Line(line) => Some(Shape::Path(Polyline {
            points: vec![xy(&line.p1), xy(&line.p2)],
            closed: false,
        })),
        EntityType::Circle(circle) => {
            let ocs = Ocs::from_normal(&circle.normal);
            let mut points = f.arc(xy(&circle.center), circle.radius, 0.0, TAU);
            points.pop();
            Some(Shape::Path(Polyline {
                points: map_ocs(ocs, points),
                closed: true,
            }))
        }
        EntityType::Arc(arc) => {
            let ocs = Ocs::from_normal(&arc.normal);
            let mut sweep = (arc.end_angle - arc.start_angle).rem_euclid(360.0);
            if sweep < EPSILON {
                sweep = 360.0;
            }
            let points = f.arc(
                xy(&arc.center),
                arc.radius,
                arc.start_angle.to_radians(),
                sweep.to_radians(),
            );
            Some(Shape::Path(Polyline {
                points: map_ocs(ocs, points),
                closed: false,
            }))
        }
        EntityType::Ellipse(ellipse) => {
            let major = Point2::new(ellipse.major_axis.x, ellipse.major_axis.y);
            let n = &ellipse.normal;
            let m = &ellipse.major_axis;
            let r = ellipse.minor_axis_ratio;
            // minor = ratio * (normal x major), projected to XY
            let minor = Point2::new(
                r * (n.y * m.z - n.z * m.y),
                r * (n.z * m.x - n.x * m.z),
            );
            let full = (ellipse.end_parameter - ellipse.start_parameter - TAU).abs() < 1e-9
                || (ellipse.end_parameter - ellipse.start_parameter).abs() < EPSILON;
            let mut points = f.ellipse(
                xy(&ellipse.center),
                major,
                minor,
                ellipse.start_parameter,
                ellipse.end_parameter,
            );
            if full {
                points.pop();
            }
            Some(Shape::Path(Polyline {
                points,
                closed: full,
            }))
        }
        EntityType::LwPolyline(poly) => {
            let vertices: Vec<(Point2, f64)> = poly
                .vertices
                .iter()
                .map(|v| (Point2::new(v.x, v.y), v.bulge))
                .collect();
            let closed = poly.flags & 1 != 0;
            bulged_polyline(f, &vertices, closed).map(|mut polyline| {
                polyline.points = map_ocs(Ocs::from_normal(&poly.extrusion_direction), polyline.points);
                Shape::Path(polyline)
            })
        }
        EntityType::Polyline(poly) => {
            let vertices: Vec<(Point2, f64)> = poly
                .vertices()
                .map(|v| (xy(&v.location), v.bulge))
                .collect();
            bulged_polyline(f, &vertices, poly.flags & 1 != 0).map(|mut polyline| {
                polyline.points = map_ocs(Ocs::from_normal(&poly.normal), polyline.points);
                Shape::Path(polyline)
            })
        }
        EntityType::Spline(spline) => {
            let closed = spline.flags & 1 != 0;
            let points = if spline.fit_points.len() >= 2 {
                let fit: Vec<Point2> = spline.fit_points.iter().map(xy).collect();
                Some(f.through(&fit, closed))
            } else {
                let control: Vec<Point2> = spline.control_points.iter().map(xy).collect();
                let degree = usize::try_from(spline.degree_of_curve).unwrap_or(0);
                f.b_spline(degree, &spline.knot_values, &control)
                    .or_else(|| (control.len() >= 2).then_some(control))
            };
            points.map(|points| Shape::Path(Polyline { points, closed }))
        }
        EntityType::ModelPoint(point) => Some(Shape::Dot(xy(&point.location))),
        EntityType::Insert(_) => return Err("INSERT"),
        EntityType::Text(_) => return Err("TEXT"),
        EntityType::MText(_) => return Err("MTEXT"),
        EntityType::Solid(_) => return Err("SOLID"),
        _ => return Err("OTHER"),
    };
    Ok(shape)
}

fn bulged_polyline(f: &Flattener, vertices: &[(Point2, f64)], closed: bool) -> Option<Polyline> {
    let (first, _) = *vertices.first()?;
    let mut points = vec![first];
    for pair in vertices.windows(2) {
        let ((p1, bulge), (p2, _)) = (pair[0], pair[1]);
        points.extend(f.bulge(p1, p2, bulge));
    }
    if closed && vertices.len() > 1 {
        if let Some(&(last, bulge)) = vertices.last() {
            let mut closing = f.bulge(last, first, bulge);
            // The closing point is the first vertex; `Z` draws that segment.
            closing.pop();
            points.extend(closing);
        }
    }
    Some(Polyline { points, closed })
}
