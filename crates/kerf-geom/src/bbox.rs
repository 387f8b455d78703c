//! Axis-aligned bounding boxes with projection-selectable overlap tests.

use crate::Point3;

/// Projection plane used by overlap queries.
///
/// The selector is a property of the query, not of the box: the same box can
/// be tested for overlap in the XY plane by a drop-cutter query and in the
/// YZ plane by an x-fiber push query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Projection {
    /// Overlap in x and y only.
    Xy,
    /// Overlap in y and z only.
    Yz,
    /// Overlap in x and z only.
    Xz,
    /// Full 3D overlap.
    Xyz,
}

/// An axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bbox {
    /// Minimum corner.
    pub min: Point3,
    /// Maximum corner.
    pub max: Point3,
}

impl Default for Bbox {
    /// The empty (inverted) box, matching `Bbox::empty()`.
    fn default() -> Self {
        Self::empty()
    }
}

impl Bbox {
    /// An empty (inverted) box that unions correctly with anything.
    pub fn empty() -> Self {
        Self {
            min: Point3::new(f64::INFINITY, f64::INFINITY, f64::INFINITY),
            max: Point3::new(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
        }
    }

    /// Box spanning the two corners (components sorted per axis).
    pub fn new(a: Point3, b: Point3) -> Self {
        Self {
            min: Point3::new(a.x.min(b.x), a.y.min(b.y), a.z.min(b.z)),
            max: Point3::new(a.x.max(b.x), a.y.max(b.y), a.z.max(b.z)),
        }
    }

    /// True if no point has been added.
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x
    }

    /// Grow the box to contain `p`.
    pub fn extend(&mut self, p: &Point3) {
        self.min.x = self.min.x.min(p.x);
        self.min.y = self.min.y.min(p.y);
        self.min.z = self.min.z.min(p.z);
        self.max.x = self.max.x.max(p.x);
        self.max.y = self.max.y.max(p.y);
        self.max.z = self.max.z.max(p.z);
    }

    /// Grow the box to contain another box.
    pub fn extend_box(&mut self, other: &Bbox) {
        if !other.is_empty() {
            self.extend(&other.min);
            self.extend(&other.max);
        }
    }

    /// Union of two boxes.
    pub fn union(&self, other: &Bbox) -> Bbox {
        let mut b = *self;
        b.extend_box(other);
        b
    }

    /// True if `p` lies inside the box (inclusive).
    pub fn contains(&self, p: &Point3) -> bool {
        p.x >= self.min.x
            && p.x <= self.max.x
            && p.y >= self.min.y
            && p.y <= self.max.y
            && p.z >= self.min.z
            && p.z <= self.max.z
    }

    /// Overlap test in the selected projection plane.
    pub fn overlaps(&self, other: &Bbox, proj: Projection) -> bool {
        let x = self.min.x <= other.max.x && self.max.x >= other.min.x;
        let y = self.min.y <= other.max.y && self.max.y >= other.min.y;
        let z = self.min.z <= other.max.z && self.max.z >= other.min.z;
        match proj {
            Projection::Xy => x && y,
            Projection::Yz => y && z,
            Projection::Xz => x && z,
            Projection::Xyz => x && y && z,
        }
    }

    /// Box inflated by `dx`, `dy`, `dz` on each side.
    pub fn inflated(&self, dx: f64, dy: f64, dz: f64) -> Bbox {
        Bbox {
            min: Point3::new(self.min.x - dx, self.min.y - dy, self.min.z - dz),
            max: Point3::new(self.max.x + dx, self.max.y + dy, self.max.z + dz),
        }
    }

    /// Midpoint of the box along axis 0 (x), 1 (y) or 2 (z).
    pub fn mid(&self, axis: usize) -> f64 {
        (self.min[axis] + self.max[axis]) / 2.0
    }

    /// Extent of the box along an axis.
    pub fn extent(&self, axis: usize) -> f64 {
        self.max[axis] - self.min[axis]
    }
}
