//! Guide paths: ordered line and circular-arc spans with C0 continuity.

use nalgebra::UnitQuaternion;

use crate::error::{GeomError, Result};
use crate::{Point3, Vec3, EPSILON};

/// Tolerance for span-to-span connectivity checks.
const CONNECT_TOL: f64 = 1e-7;

/// A straight path span.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Line {
    /// Start point.
    pub p1: Point3,
    /// End point.
    pub p2: Point3,
}

impl Line {
    /// Line from `p1` to `p2`.
    pub fn new(p1: Point3, p2: Point3) -> Self {
        Self { p1, p2 }
    }

    /// Span length.
    pub fn length(&self) -> f64 {
        (self.p2 - self.p1).norm()
    }

    /// Point at parameter `t` in [0, 1].
    pub fn point_at(&self, t: f64) -> Point3 {
        self.p1 + (self.p2 - self.p1) * t
    }
}

/// A circular-arc span, swept counter-clockwise about `normal`.
#[derive(Debug, Clone, PartialEq)]
pub struct Arc {
    center: Point3,
    radius: f64,
    start_angle: f64,
    end_angle: f64,
    normal: Vec3,
    rot: UnitQuaternion<f64>,
}

impl Arc {
    /// Arc around `center` from `start_angle` to `end_angle` (radians,
    /// counter-clockwise) in the plane perpendicular to `normal`.
    pub fn new(
        center: Point3,
        radius: f64,
        start_angle: f64,
        end_angle: f64,
        normal: Vec3,
    ) -> Result<Self> {
        if radius <= 0.0 {
            return Err(GeomError::InvalidArc("radius must be positive".into()));
        }
        let n = normal.norm();
        if n < EPSILON {
            return Err(GeomError::InvalidArc("normal must be non-zero".into()));
        }
        let normal = normal / n;
        Ok(Self {
            center,
            radius,
            start_angle: wrap_angle(start_angle),
            end_angle: wrap_angle(end_angle),
            normal,
            rot: tilt(&normal),
        })
    }

    /// Arc through `start` and `end` around `center`, plane from the three
    /// points.
    pub fn from_points(start: Point3, end: Point3, center: Point3) -> Result<Self> {
        let v1 = start - center;
        let v2 = end - center;
        let radius = v1.norm();
        if (v2.norm() - radius).abs() > CONNECT_TOL {
            return Err(GeomError::InvalidArc(
                "start and end must be equidistant from center".into(),
            ));
        }
        let normal = v1.cross(&v2);
        if normal.norm() < EPSILON {
            return Err(GeomError::InvalidArc(
                "start, end and center are collinear".into(),
            ));
        }
        let normal = normal.normalize();
        let rot = tilt(&normal);
        // angles measured in the arc's local frame
        let inv = rot.inverse();
        let l1 = inv * v1;
        let l2 = inv * v2;
        Arc::new(
            center,
            radius,
            l1.y.atan2(l1.x),
            l2.y.atan2(l2.x),
            normal,
        )
    }

    /// Arc center.
    pub fn center(&self) -> &Point3 {
        &self.center
    }

    /// Arc radius.
    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Plane normal.
    pub fn normal(&self) -> &Vec3 {
        &self.normal
    }

    /// Counter-clockwise angular span in (0, 2*pi].
    pub fn angle_span(&self) -> f64 {
        let span = self.end_angle - self.start_angle;
        if span <= 0.0 {
            span + 2.0 * std::f64::consts::PI
        } else {
            span
        }
    }

    /// Arc length.
    pub fn length(&self) -> f64 {
        self.radius * self.angle_span()
    }

    /// Point at parameter `t` in [0, 1].
    pub fn point_at(&self, t: f64) -> Point3 {
        let angle = self.start_angle + t * self.angle_span();
        let local = Vec3::new(self.radius * angle.cos(), self.radius * angle.sin(), 0.0);
        self.center + self.rot * local
    }

    /// Start point (t = 0).
    pub fn start_point(&self) -> Point3 {
        self.point_at(0.0)
    }

    /// End point (t = 1).
    pub fn end_point(&self) -> Point3 {
        self.point_at(1.0)
    }
}

/// Rotation taking the z axis to `normal`.
fn tilt(normal: &Vec3) -> UnitQuaternion<f64> {
    UnitQuaternion::rotation_between(&Vec3::z(), normal)
        .unwrap_or_else(|| UnitQuaternion::from_axis_angle(&Vec3::x_axis(), std::f64::consts::PI))
}

fn wrap_angle(a: f64) -> f64 {
    let two_pi = 2.0 * std::f64::consts::PI;
    let mut a = a % two_pi;
    if a < 0.0 {
        a += two_pi;
    }
    a
}

/// One span of a guide path.
#[derive(Debug, Clone, PartialEq)]
pub enum Span {
    /// Straight segment.
    Line(Line),
    /// Circular arc.
    Arc(Arc),
}

impl Span {
    /// Span length.
    pub fn length(&self) -> f64 {
        match self {
            Span::Line(l) => l.length(),
            Span::Arc(a) => a.length(),
        }
    }

    /// Point at parameter `t` in [0, 1].
    pub fn point_at(&self, t: f64) -> Point3 {
        match self {
            Span::Line(l) => l.point_at(t),
            Span::Arc(a) => a.point_at(t),
        }
    }

    /// Start point.
    pub fn start_point(&self) -> Point3 {
        self.point_at(0.0)
    }

    /// End point.
    pub fn end_point(&self) -> Point3 {
        self.point_at(1.0)
    }
}

/// An ordered sequence of C0-continuous spans.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Path {
    spans: Vec<Span>,
}

impl Path {
    /// Empty path.
    pub fn new() -> Self {
        Self::default()
    }

    /// The spans in order.
    pub fn spans(&self) -> &[Span] {
        &self.spans
    }

    /// Number of spans.
    pub fn len(&self) -> usize {
        self.spans.len()
    }

    /// True if the path has no spans.
    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    /// Append a line span, checking connectivity to the previous span.
    pub fn append_line(&mut self, p1: Point3, p2: Point3) -> Result<()> {
        self.append(Span::Line(Line::new(p1, p2)))
    }

    /// Append an arc span, checking connectivity to the previous span.
    pub fn append_arc(&mut self, arc: Arc) -> Result<()> {
        self.append(Span::Arc(arc))
    }

    /// Append any span, checking connectivity to the previous span.
    pub fn append(&mut self, span: Span) -> Result<()> {
        if let Some(last) = self.spans.last() {
            if (span.start_point() - last.end_point()).norm() > CONNECT_TOL {
                return Err(GeomError::DisconnectedSpan);
            }
        }
        self.spans.push(span);
        Ok(())
    }

    /// Path start point.
    pub fn start_point(&self) -> Result<Point3> {
        self.spans
            .first()
            .map(Span::start_point)
            .ok_or(GeomError::EmptyPath)
    }

    /// Path end point.
    pub fn end_point(&self) -> Result<Point3> {
        self.spans
            .last()
            .map(Span::end_point)
            .ok_or(GeomError::EmptyPath)
    }

    /// Total arc length.
    pub fn length(&self) -> f64 {
        self.spans.iter().map(Span::length).sum()
    }

    /// True if the end point coincides with the start point.
    pub fn is_closed(&self) -> bool {
        match (self.start_point(), self.end_point()) {
            (Ok(s), Ok(e)) => (s - e).norm() < CONNECT_TOL,
            _ => false,
        }
    }

    /// Point at arc length `s` from the start, clamped to the path ends.
    pub fn point_at_arclen(&self, s: f64) -> Result<Point3> {
        if self.spans.is_empty() {
            return Err(GeomError::EmptyPath);
        }
        if s <= 0.0 {
            return self.start_point();
        }
        let mut remaining = s;
        for span in &self.spans {
            let len = span.length();
            if remaining <= len || len < EPSILON {
                let t = if len < EPSILON { 0.0 } else { remaining / len };
                return Ok(span.point_at(t.min(1.0)));
            }
            remaining -= len;
        }
        self.end_point()
    }

    /// Sample the path at arc-length steps `0, s, 2s, ...` plus the end
    /// point.
    pub fn sample(&self, sampling: f64) -> Result<Vec<Point3>> {
        if sampling <= 0.0 {
            return Err(GeomError::InvalidSampling);
        }
        if self.spans.is_empty() {
            return Err(GeomError::EmptyPath);
        }
        let total = self.length();
        let mut points = Vec::new();
        let mut s = 0.0;
        while s < total - EPSILON {
            points.push(self.point_at_arclen(s)?);
            s += sampling;
        }
        points.push(self.end_point()?);
        Ok(points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::{FRAC_PI_2, PI};

    #[test]
    fn test_line_length_and_point() {
        let l = Line::new(Point3::new(0.0, 0.0, 0.0), Point3::new(10.0, 0.0, 0.0));
        assert!((l.length() - 10.0).abs() < 1e-12);
        let p = l.point_at(0.3);
        assert!((p.x - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_arc_quarter_circle() {
        let a = Arc::new(Point3::origin(), 2.0, 0.0, FRAC_PI_2, Vec3::z()).unwrap();
        assert_relative_eq!(a.length(), PI, epsilon = 1e-12);
        let s = a.start_point();
        assert!((s.x - 2.0).abs() < 1e-12 && s.y.abs() < 1e-12);
        let e = a.end_point();
        assert!(e.x.abs() < 1e-12 && (e.y - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_arc_from_points() {
        let a = Arc::from_points(
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::origin(),
        )
        .unwrap();
        assert!((a.radius() - 1.0).abs() < 1e-12);
        assert!((a.length() - FRAC_PI_2).abs() < 1e-9);
    }

    #[test]
    fn test_arc_rejects_bad_input() {
        assert!(Arc::new(Point3::origin(), 0.0, 0.0, 1.0, Vec3::z()).is_err());
        assert!(Arc::from_points(
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(3.0, 0.0, 0.0),
            Point3::origin(),
        )
        .is_err());
    }

    #[test]
    fn test_path_connectivity() {
        let mut p = Path::new();
        p.append_line(Point3::origin(), Point3::new(10.0, 0.0, 0.0))
            .unwrap();
        // disconnected span rejected, path unchanged
        let r = p.append_line(Point3::new(11.0, 0.0, 0.0), Point3::new(20.0, 0.0, 0.0));
        assert_eq!(r, Err(GeomError::DisconnectedSpan));
        assert_eq!(p.len(), 1);

        p.append_line(Point3::new(10.0, 0.0, 0.0), Point3::new(10.0, 5.0, 0.0))
            .unwrap();
        assert!((p.length() - 15.0).abs() < 1e-12);
    }

    #[test]
    fn test_path_sampling_includes_endpoint() {
        let mut p = Path::new();
        p.append_line(Point3::origin(), Point3::new(10.0, 0.0, 0.0))
            .unwrap();
        let samples = p.sample(1.0).unwrap();
        assert_eq!(samples.len(), 11);
        assert!((samples[0].x - 0.0).abs() < 1e-12);
        assert!((samples[10].x - 10.0).abs() < 1e-12);
        assert!(p.sample(0.0).is_err());
    }

    #[test]
    fn test_path_arclen_across_spans() {
        let mut p = Path::new();
        p.append_line(Point3::origin(), Point3::new(4.0, 0.0, 0.0))
            .unwrap();
        p.append_line(Point3::new(4.0, 0.0, 0.0), Point3::new(4.0, 4.0, 0.0))
            .unwrap();
        let m = p.point_at_arclen(6.0).unwrap();
        assert!((m.x - 4.0).abs() < 1e-12);
        assert!((m.y - 2.0).abs() < 1e-12);
        // clamped past the end
        let e = p.point_at_arclen(100.0).unwrap();
        assert!((e.y - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_line_arc_path() {
        let mut p = Path::new();
        p.append_line(Point3::new(-2.0, 0.0, 0.0), Point3::new(2.0, 0.0, 0.0))
            .unwrap();
        // quarter arc continuing from (2, 0) around (2, 2)
        let arc = Arc::new(
            Point3::new(2.0, 2.0, 0.0),
            2.0,
            -FRAC_PI_2,
            0.0,
            Vec3::z(),
        )
        .unwrap();
        p.append_arc(arc).unwrap();
        assert_relative_eq!(p.length(), 4.0 + PI, epsilon = 1e-9);
        let e = p.end_point().unwrap();
        assert!((e.x - 4.0).abs() < 1e-9 && (e.y - 2.0).abs() < 1e-9);
    }
}
