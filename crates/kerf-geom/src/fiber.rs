//! Fibers and contact intervals.
//!
//! A fiber is an axis-aligned horizontal segment at fixed z along which a
//! cutter is virtually swept. Push-cutter calls accumulate intervals of the
//! fiber parameter where the cutter collides with the surface; the fiber
//! keeps that list sorted and non-overlapping.

use crate::clpoint::CcPoint;
use crate::error::{GeomError, Result};
use crate::{Point3, EPSILON};

/// Direction of a fiber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FiberDir {
    /// Parallel to the x axis.
    X,
    /// Parallel to the y axis.
    Y,
}

/// A closed sub-range of a fiber's parameter with contact annotations at
/// both endpoints.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval {
    /// Lower parameter bound.
    pub lower: f64,
    /// Upper parameter bound.
    pub upper: f64,
    /// Contact at the lower bound.
    pub lower_cc: CcPoint,
    /// Contact at the upper bound.
    pub upper_cc: CcPoint,
}

impl Default for Interval {
    fn default() -> Self {
        Self::new()
    }
}

impl Interval {
    /// An empty interval; any update makes it non-empty.
    pub fn new() -> Self {
        Self {
            lower: f64::INFINITY,
            upper: f64::NEG_INFINITY,
            lower_cc: CcPoint::none(),
            upper_cc: CcPoint::none(),
        }
    }

    /// Interval with explicit bounds and annotations.
    pub fn from_bounds(lower: f64, upper: f64, lower_cc: CcPoint, upper_cc: CcPoint) -> Self {
        Self {
            lower,
            upper,
            lower_cc,
            upper_cc,
        }
    }

    /// True if no parameter has been recorded.
    pub fn is_empty(&self) -> bool {
        self.lower > self.upper
    }

    /// True if the interval has (near-)zero length.
    pub fn is_degenerate(&self) -> bool {
        self.is_empty() || self.upper - self.lower < EPSILON
    }

    /// Extend both bounds to include parameter `t` with contact `cc`.
    pub fn update(&mut self, t: f64, cc: CcPoint) {
        self.update_lower(t, cc);
        self.update_upper(t, cc);
    }

    /// Lower the lower bound to `t` if it improves it.
    ///
    /// On a tie within tolerance the annotation with the higher
    /// facet-over-edge-over-vertex priority survives.
    pub fn update_lower(&mut self, t: f64, cc: CcPoint) {
        if t < self.lower - EPSILON {
            self.lower = t;
            self.lower_cc = cc;
        } else if (t - self.lower).abs() <= EPSILON
            && cc.ctype.priority() > self.lower_cc.ctype.priority()
        {
            self.lower_cc = cc;
        }
        if self.upper < self.lower {
            // first update on an empty interval
            self.upper = self.lower;
            self.upper_cc = self.lower_cc;
        }
    }

    /// Raise the upper bound to `t` if it improves it.
    pub fn update_upper(&mut self, t: f64, cc: CcPoint) {
        if t > self.upper + EPSILON {
            self.upper = t;
            self.upper_cc = cc;
        } else if (t - self.upper).abs() <= EPSILON
            && cc.ctype.priority() > self.upper_cc.ctype.priority()
        {
            self.upper_cc = cc;
        }
        if self.lower > self.upper {
            self.lower = self.upper;
            self.lower_cc = self.upper_cc;
        }
    }

    /// True if the two intervals overlap or touch within tolerance.
    pub fn overlaps(&self, other: &Interval) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && self.lower <= other.upper + EPSILON
            && other.lower <= self.upper + EPSILON
    }

    /// True if `t` lies inside the interval within tolerance.
    pub fn contains(&self, t: f64) -> bool {
        !self.is_empty() && t >= self.lower - EPSILON && t <= self.upper + EPSILON
    }
}

/// An axis-aligned horizontal segment at fixed z carrying contact intervals.
#[derive(Debug, Clone, PartialEq)]
pub struct Fiber {
    p1: Point3,
    p2: Point3,
    dir: FiberDir,
    /// Sorted, non-overlapping contact intervals.
    pub ints: Vec<Interval>,
}

impl Fiber {
    /// Build a fiber between two points differing in exactly one of x or y.
    pub fn new(p1: Point3, p2: Point3) -> Result<Self> {
        let dx = (p2.x - p1.x).abs();
        let dy = (p2.y - p1.y).abs();
        let dz = (p2.z - p1.z).abs();
        if dz > EPSILON {
            return Err(GeomError::DegenerateFiber);
        }
        let dir = if dx > EPSILON && dy <= EPSILON {
            FiberDir::X
        } else if dy > EPSILON && dx <= EPSILON {
            FiberDir::Y
        } else {
            return Err(GeomError::DegenerateFiber);
        };
        Ok(Self {
            p1,
            p2,
            dir,
            ints: Vec::new(),
        })
    }

    /// Start point (t = 0).
    pub fn p1(&self) -> &Point3 {
        &self.p1
    }

    /// End point (t = 1).
    pub fn p2(&self) -> &Point3 {
        &self.p2
    }

    /// Fiber direction.
    pub fn dir(&self) -> FiberDir {
        self.dir
    }

    /// Z height of the fiber.
    pub fn z(&self) -> f64 {
        self.p1.z
    }

    /// Point at parameter `t` in [0, 1].
    pub fn point(&self, t: f64) -> Point3 {
        self.p1 + (self.p2 - self.p1) * t
    }

    /// Parameter for a coordinate along the fiber direction.
    pub fn tval(&self, coord: f64) -> f64 {
        match self.dir {
            FiberDir::X => (coord - self.p1.x) / (self.p2.x - self.p1.x),
            FiberDir::Y => (coord - self.p1.y) / (self.p2.y - self.p1.y),
        }
    }

    /// Length of the fiber.
    pub fn length(&self) -> f64 {
        (self.p2 - self.p1).norm()
    }

    /// True if any interval covers parameter `t`.
    pub fn covers(&self, t: f64) -> bool {
        self.ints.iter().any(|i| i.contains(t))
    }

    /// Merge a new interval into the canonical sorted list.
    ///
    /// Bounds within tolerance of [0, 1] are clamped; intervals entirely
    /// outside or empty are dropped. Overlapping intervals are fused, the
    /// annotation at a fused endpoint being the one whose endpoint survives
    /// (ties resolved facet over edge over vertex).
    pub fn add_interval(&mut self, interval: Interval) {
        let mut iv = interval;
        if iv.is_empty() {
            return;
        }
        // clamp into the parameter range
        if iv.lower < 0.0 {
            iv.lower = 0.0;
        }
        if iv.upper > 1.0 {
            iv.upper = 1.0;
        }
        if iv.upper < iv.lower {
            return;
        }

        // fuse with every overlapping existing interval
        let mut fused = iv;
        let mut keep = Vec::with_capacity(self.ints.len() + 1);
        for existing in self.ints.drain(..) {
            if fused.overlaps(&existing) {
                fused = fuse(&fused, &existing);
            } else {
                keep.push(existing);
            }
        }
        let at = keep
            .iter()
            .position(|i| i.lower > fused.lower)
            .unwrap_or(keep.len());
        keep.insert(at, fused);
        self.ints = keep;
    }
}

/// Union of two overlapping intervals with endpoint-survival annotations.
fn fuse(a: &Interval, b: &Interval) -> Interval {
    let mut out = *a;
    out.update_lower(b.lower, b.lower_cc);
    out.update_upper(b.upper, b.upper_cc);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clpoint::CcType;

    fn cc(ctype: CcType) -> CcPoint {
        CcPoint::new(Point3::origin(), ctype)
    }

    #[test]
    fn test_fiber_direction_validation() {
        let x = Fiber::new(Point3::new(0.0, 1.0, 2.0), Point3::new(5.0, 1.0, 2.0)).unwrap();
        assert_eq!(x.dir(), FiberDir::X);
        let y = Fiber::new(Point3::new(1.0, 0.0, 2.0), Point3::new(1.0, 5.0, 2.0)).unwrap();
        assert_eq!(y.dir(), FiberDir::Y);

        let diag = Fiber::new(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 0.0));
        assert!(diag.is_err());
        let degenerate = Fiber::new(Point3::new(1.0, 1.0, 0.0), Point3::new(1.0, 1.0, 0.0));
        assert!(degenerate.is_err());
        let sloped = Fiber::new(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 0.0, 1.0));
        assert!(sloped.is_err());
    }

    #[test]
    fn test_point_and_tval() {
        let f = Fiber::new(Point3::new(-5.0, 3.0, 0.0), Point3::new(15.0, 3.0, 0.0)).unwrap();
        let p = f.point(0.25);
        assert!((p.x - 0.0).abs() < 1e-12);
        assert!((f.tval(5.0) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_interval_update_bootstraps() {
        let mut i = Interval::new();
        assert!(i.is_empty());
        i.update(0.4, cc(CcType::Vertex));
        assert!(!i.is_empty());
        assert!((i.lower - 0.4).abs() < 1e-12);
        assert!((i.upper - 0.4).abs() < 1e-12);
        i.update(0.2, cc(CcType::EdgeCyl));
        i.update(0.7, cc(CcType::Facet));
        assert!((i.lower - 0.2).abs() < 1e-12);
        assert!((i.upper - 0.7).abs() < 1e-12);
        assert_eq!(i.lower_cc.ctype, CcType::EdgeCyl);
        assert_eq!(i.upper_cc.ctype, CcType::Facet);
    }

    #[test]
    fn test_interval_tie_prefers_facet() {
        let mut i = Interval::new();
        i.update(0.5, cc(CcType::Vertex));
        i.update_upper(0.5, cc(CcType::Facet));
        assert_eq!(i.upper_cc.ctype, CcType::Facet);
        // lower tie resolved too
        i.update_lower(0.5, cc(CcType::EdgeCyl));
        assert_eq!(i.lower_cc.ctype, CcType::EdgeCyl);
    }

    #[test]
    fn test_add_interval_merges_overlaps() {
        let mut f = Fiber::new(Point3::new(0.0, 0.0, 0.0), Point3::new(10.0, 0.0, 0.0)).unwrap();
        f.add_interval(Interval::from_bounds(
            0.1,
            0.3,
            cc(CcType::Vertex),
            cc(CcType::Vertex),
        ));
        f.add_interval(Interval::from_bounds(
            0.5,
            0.7,
            cc(CcType::EdgeCyl),
            cc(CcType::EdgeCyl),
        ));
        assert_eq!(f.ints.len(), 2);

        // bridge the gap
        f.add_interval(Interval::from_bounds(
            0.25,
            0.55,
            cc(CcType::Facet),
            cc(CcType::Facet),
        ));
        assert_eq!(f.ints.len(), 1);
        assert!((f.ints[0].lower - 0.1).abs() < 1e-12);
        assert!((f.ints[0].upper - 0.7).abs() < 1e-12);
        assert_eq!(f.ints[0].lower_cc.ctype, CcType::Vertex);
        assert_eq!(f.ints[0].upper_cc.ctype, CcType::EdgeCyl);
    }

    #[test]
    fn test_add_interval_clamps_and_drops() {
        let mut f = Fiber::new(Point3::new(0.0, 0.0, 0.0), Point3::new(10.0, 0.0, 0.0)).unwrap();
        f.add_interval(Interval::from_bounds(
            -0.05,
            0.2,
            cc(CcType::Vertex),
            cc(CcType::Vertex),
        ));
        assert_eq!(f.ints.len(), 1);
        assert!((f.ints[0].lower - 0.0).abs() < 1e-12);

        f.add_interval(Interval::new()); // empty: ignored
        assert_eq!(f.ints.len(), 1);
    }

    #[test]
    fn test_canonical_list_stays_sorted() {
        let mut f = Fiber::new(Point3::new(0.0, 0.0, 0.0), Point3::new(10.0, 0.0, 0.0)).unwrap();
        for (lo, hi) in [(0.8, 0.9), (0.0, 0.1), (0.4, 0.5)] {
            f.add_interval(Interval::from_bounds(
                lo,
                hi,
                cc(CcType::Vertex),
                cc(CcType::Vertex),
            ));
        }
        let lowers: Vec<f64> = f.ints.iter().map(|i| i.lower).collect();
        assert_eq!(lowers, vec![0.0, 0.4, 0.8]);
        for i in &f.ints {
            assert!(i.lower <= i.upper);
            assert!(i.lower >= 0.0 && i.upper <= 1.0);
        }
    }
}
