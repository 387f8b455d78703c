#![warn(missing_docs)]

//! Geometry primitives for the kerf CAM kernel.
//!
//! Thin wrappers around nalgebra plus the domain types every engine in the
//! workspace consumes: triangles and surfaces, bounding boxes with
//! projection-selectable overlap tests, cutter-location and cutter-contact
//! points, fibers with contact intervals, and guide paths built from line
//! and arc spans.

pub mod bbox;
pub mod clpoint;
pub mod error;
pub mod fiber;
pub mod path;
pub mod triangle;

pub use bbox::{Bbox, Projection};
pub use clpoint::{CcPoint, CcType, ClPoint};
pub use error::{GeomError, Result};
pub use fiber::{Fiber, FiberDir, Interval};
pub use path::{Arc, Line, Path, Span};
pub use triangle::{Surface, Triangle};

/// A point in 3D space.
pub type Point3 = nalgebra::Point3<f64>;

/// A vector in 3D space.
pub type Vec3 = nalgebra::Vector3<f64>;

/// Absolute tolerance for unitless comparisons.
pub const EPSILON: f64 = 1e-10;

/// Horizontal (xy-plane) distance between two points.
pub fn xy_distance(a: &Point3, b: &Point3) -> f64 {
    let dx = a.x - b.x;
    let dy = a.y - b.y;
    (dx * dx + dy * dy).sqrt()
}

/// True if `value` is within [`EPSILON`] of zero.
pub fn is_zero(value: f64) -> bool {
    value.abs() < EPSILON
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_xy_distance_ignores_z() {
        let a = Point3::new(0.0, 0.0, 5.0);
        let b = Point3::new(3.0, 4.0, -7.0);
        assert!((xy_distance(&a, &b) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_is_zero() {
        assert!(is_zero(0.0));
        assert!(is_zero(1e-11));
        assert!(!is_zero(1e-9));
    }
}
