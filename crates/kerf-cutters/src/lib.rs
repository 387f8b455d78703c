#![warn(missing_docs)]

//! Milling cutter shapes and their contact kernels.
//!
//! A [`Cutter`] is one of four rotationally-symmetric shapes, always
//! axis-aligned with +z. Each shape answers the two fundamental contact
//! questions against a single triangle:
//!
//! - [`Cutter::drop_cutter`]: at a fixed (x, y), the lowest z at which the
//!   cutter still clears the triangle (the vertical primitive);
//! - [`Cutter::push_cutter`]: at a fixed z, the fiber-parameter interval
//!   over which the cutter collides with the triangle (the horizontal
//!   primitive).
//!
//! Reference points: center of the flat bottom (cylindrical), center of the
//! sphere (ball), center of the torus-ring plane (bull), the tip (cone).

mod drop;
mod push;
mod solvers;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use kerf_geom::{Bbox, ClPoint, Fiber, Interval, Point3, Triangle, EPSILON};

/// Errors from cutter construction and shape operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CutterError {
    /// Radius not strictly positive.
    #[error("cutter radius must be positive")]
    InvalidRadius,

    /// Shaft shorter than the active cutting shape.
    #[error("shaft length must extend through the active cutting shape")]
    InvalidLength,

    /// Corner radius outside (0, r).
    #[error("corner radius must satisfy 0 < corner radius < radius")]
    InvalidCornerRadius,

    /// Cone half-angle outside (0, pi/2).
    #[error("cone half-angle must lie strictly inside (0, pi/2)")]
    InvalidAngle,

    /// Offsetting not defined for this shape.
    #[error("offsetting a {0} cutter is not supported")]
    UnsupportedOffset(&'static str),
}

/// Result type for cutter operations.
pub type Result<T> = std::result::Result<T, CutterError>;

/// A rotationally-symmetric milling cutter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Cutter {
    /// Flat end mill. Reference point: center of the flat bottom.
    Cylindrical {
        /// Cutter radius in mm.
        radius: f64,
        /// Shaft length in mm.
        length: f64,
    },
    /// Ball end mill. Reference point: center of the sphere.
    Ball {
        /// Sphere radius in mm.
        radius: f64,
        /// Shaft length in mm.
        length: f64,
    },
    /// Bull (corner-radius) end mill. Reference point: center of the
    /// torus-ring plane; the tube ring of radius `radius - corner_radius`
    /// lies in that plane.
    Bull {
        /// Outer radius in mm.
        radius: f64,
        /// Corner (tube) radius in mm.
        corner_radius: f64,
        /// Shaft length in mm.
        length: f64,
    },
    /// Conical cutter. Reference point: the tip.
    Cone {
        /// Base radius in mm.
        radius: f64,
        /// Half-angle from the axis, radians, strictly inside (0, pi/2).
        half_angle: f64,
        /// Shaft length in mm.
        length: f64,
    },
}

impl Cutter {
    /// Validated cylindrical cutter.
    pub fn cylindrical(radius: f64, length: f64) -> Result<Self> {
        let c = Cutter::Cylindrical { radius, length };
        c.validate()?;
        Ok(c)
    }

    /// Validated ball cutter.
    pub fn ball(radius: f64, length: f64) -> Result<Self> {
        let c = Cutter::Ball { radius, length };
        c.validate()?;
        Ok(c)
    }

    /// Validated bull cutter.
    pub fn bull(radius: f64, corner_radius: f64, length: f64) -> Result<Self> {
        let c = Cutter::Bull {
            radius,
            corner_radius,
            length,
        };
        c.validate()?;
        Ok(c)
    }

    /// Validated cone cutter.
    pub fn cone(radius: f64, half_angle: f64, length: f64) -> Result<Self> {
        let c = Cutter::Cone {
            radius,
            half_angle,
            length,
        };
        c.validate()?;
        Ok(c)
    }

    /// Check the shape invariants.
    pub fn validate(&self) -> Result<()> {
        let r = self.radius();
        if !(r > 0.0) || !r.is_finite() {
            return Err(CutterError::InvalidRadius);
        }
        match *self {
            Cutter::Cylindrical { length, .. } => {
                if length < r {
                    return Err(CutterError::InvalidLength);
                }
            }
            Cutter::Ball { length, .. } => {
                if length < r {
                    return Err(CutterError::InvalidLength);
                }
            }
            Cutter::Bull {
                radius,
                corner_radius,
                length,
            } => {
                if !(corner_radius > 0.0) || corner_radius >= radius {
                    return Err(CutterError::InvalidCornerRadius);
                }
                if length < radius {
                    return Err(CutterError::InvalidLength);
                }
            }
            Cutter::Cone {
                half_angle, length, ..
            } => {
                if !(half_angle > 0.0) || half_angle >= std::f64::consts::FRAC_PI_2 {
                    return Err(CutterError::InvalidAngle);
                }
                if length < r {
                    return Err(CutterError::InvalidLength);
                }
            }
        }
        Ok(())
    }

    /// Cutter radius.
    pub fn radius(&self) -> f64 {
        match *self {
            Cutter::Cylindrical { radius, .. }
            | Cutter::Ball { radius, .. }
            | Cutter::Bull { radius, .. }
            | Cutter::Cone { radius, .. } => radius,
        }
    }

    /// Shaft length.
    pub fn length(&self) -> f64 {
        match *self {
            Cutter::Cylindrical { length, .. }
            | Cutter::Ball { length, .. }
            | Cutter::Bull { length, .. }
            | Cutter::Cone { length, .. } => length,
        }
    }

    /// Distance from the reference point down to the lowest cutter point.
    pub fn bottom_offset(&self) -> f64 {
        match *self {
            Cutter::Cylindrical { .. } | Cutter::Cone { .. } => 0.0,
            Cutter::Ball { radius, .. } => radius,
            Cutter::Bull { corner_radius, .. } => corner_radius,
        }
    }

    /// Drop profile: the CL z above a point contacted at horizontal
    /// distance `d`, or `None` when `d` exceeds the radius.
    pub fn drop_height(&self, d: f64) -> Option<f64> {
        let r = self.radius();
        if d > r + EPSILON {
            return None;
        }
        let d = d.min(r);
        match *self {
            Cutter::Cylindrical { .. } => Some(0.0),
            Cutter::Ball { radius, .. } => Some((radius * radius - d * d).sqrt()),
            Cutter::Bull {
                radius,
                corner_radius,
                ..
            } => {
                let ring = radius - corner_radius;
                if d <= ring {
                    Some(corner_radius)
                } else {
                    let dr = d - ring;
                    Some((corner_radius * corner_radius - dr * dr).sqrt())
                }
            }
            Cutter::Cone { half_angle, .. } => Some(-d / half_angle.tan()),
        }
    }

    /// Cross-section radius at height `h` above the reference point, 0
    /// outside the cutter.
    pub fn width(&self, h: f64) -> f64 {
        let r = self.radius();
        let l = self.length();
        match *self {
            Cutter::Cylindrical { .. } => {
                if (0.0..=l).contains(&h) {
                    r
                } else {
                    0.0
                }
            }
            Cutter::Ball { radius, .. } => {
                if h < -radius || h > l {
                    0.0
                } else if h <= 0.0 {
                    (radius * radius - h * h).sqrt()
                } else {
                    r
                }
            }
            Cutter::Bull {
                radius,
                corner_radius,
                ..
            } => {
                if h < -corner_radius || h > l {
                    0.0
                } else if h <= 0.0 {
                    (radius - corner_radius)
                        + (corner_radius * corner_radius - h * h).sqrt()
                } else {
                    r
                }
            }
            Cutter::Cone { half_angle, .. } => {
                let base = r / half_angle.tan();
                if h < 0.0 || h > l {
                    0.0
                } else if h <= base {
                    h * half_angle.tan()
                } else {
                    r
                }
            }
        }
    }

    /// Cutter grown by `delta`, the original shapes permitting: a grown
    /// cylinder becomes a bull, a grown ball a larger ball, a grown bull a
    /// bull with a larger tube. Cones are not closed under offsetting.
    pub fn offset(&self, delta: f64) -> Result<Self> {
        if !(delta > 0.0) {
            return Err(CutterError::InvalidRadius);
        }
        match *self {
            Cutter::Cylindrical { radius, length } => {
                Cutter::bull(radius + delta, delta, length + delta)
            }
            Cutter::Ball { radius, length } => Cutter::ball(radius + delta, length + delta),
            Cutter::Bull {
                radius,
                corner_radius,
                length,
            } => Cutter::bull(radius + delta, corner_radius + delta, length + delta),
            Cutter::Cone { .. } => Err(CutterError::UnsupportedOffset("cone")),
        }
    }

    /// Explicit footprint pre-filter: does the cutter disk at the CL point
    /// overlap the triangle's xy bounding box?
    pub fn overlaps(&self, cl: &ClPoint, t: &Triangle) -> bool {
        let r = self.radius();
        let bb = t.bbox();
        cl.pos.x >= bb.min.x - r
            && cl.pos.x <= bb.max.x + r
            && cl.pos.y >= bb.min.y - r
            && cl.pos.y <= bb.max.y + r
    }

    /// Bounding box of the cutter solid placed at a CL point; used to build
    /// conservative spatial-index queries.
    pub fn query_box(&self, cl: &ClPoint) -> Bbox {
        let r = self.radius();
        let zlo = if cl.pos.z.is_finite() {
            cl.pos.z - self.bottom_offset()
        } else {
            f64::NEG_INFINITY
        };
        let zhi = if cl.pos.z.is_finite() {
            cl.pos.z + self.length()
        } else {
            f64::INFINITY
        };
        Bbox::new(
            Point3::new(cl.pos.x - r, cl.pos.y - r, zlo),
            Point3::new(cl.pos.x + r, cl.pos.y + r, zhi),
        )
    }

    /// Drop the cutter onto one triangle: raise `cl.z` to the contact
    /// height if the triangle supports the cutter higher than `cl.z`.
    ///
    /// Returns true iff the CL point was lifted. Exception- and
    /// allocation-free; this is the hot inner call of the batch engines.
    pub fn drop_cutter(&self, cl: &mut ClPoint, t: &Triangle) -> bool {
        let mut hit = drop::vertex_drop(self, cl, t);
        hit |= drop::facet_drop(self, cl, t);
        hit |= drop::edge_drop(self, cl, t);
        hit
    }

    /// Push the cutter along one fiber against one triangle.
    ///
    /// Returns the contiguous parameter range over which the cutter
    /// contacts the triangle, or `None` if they never touch.
    pub fn push_cutter(&self, fiber: &Fiber, t: &Triangle) -> Option<Interval> {
        let mut interval = Interval::new();
        push::vertex_push(self, &mut interval, fiber, t);
        push::facet_push(self, &mut interval, fiber, t);
        push::edge_push(self, &mut interval, fiber, t);
        if interval.is_empty() {
            None
        } else {
            Some(interval)
        }
    }

    /// Short shape name for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Cutter::Cylindrical { .. } => "cylindrical",
            Cutter::Ball { .. } => "ball",
            Cutter::Bull { .. } => "bull",
            Cutter::Cone { .. } => "cone",
        }
    }
}

impl std::fmt::Display for Cutter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Cutter::Cylindrical { radius, length } => {
                write!(f, "Cylindrical(r={radius}, L={length})")
            }
            Cutter::Ball { radius, length } => write!(f, "Ball(r={radius}, L={length})"),
            Cutter::Bull {
                radius,
                corner_radius,
                length,
            } => write!(f, "Bull(r={radius}, r2={corner_radius}, L={length})"),
            Cutter::Cone {
                radius,
                half_angle,
                length,
            } => write!(f, "Cone(r={radius}, angle={half_angle}, L={length})"),
        }
    }
}
