#![warn(missing_docs)]

//! kerf: a 3-axis CAM toolpath kernel.
//!
//! Given a triangulated surface and a rotationally-symmetric milling
//! cutter, kerf computes collision-free cutter positions: drop-cutter
//! heights over points and paths, and waterline contours at fixed
//! z-heights.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use kerf::{BatchDropCutter, ClPoint, Cutter, Point3, Surface};
//!
//! // a single triangle as the workpiece
//! let mut surface = Surface::new();
//! surface.add_triangle(
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(10.0, 0.0, 0.0),
//!     Point3::new(0.0, 10.0, 0.0),
//! );
//!
//! // a 6 mm flat end mill
//! let cutter = Cutter::cylindrical(3.0, 20.0).unwrap();
//!
//! let mut op = BatchDropCutter::new(Arc::new(surface), cutter, 4).unwrap();
//! op.append(ClPoint::at_xy(5.0, 5.0));
//! op.run().unwrap();
//!
//! assert!(op.points()[0].pos.z.abs() < 1e-9);
//! ```

pub use kerf_cutters::{Cutter, CutterError};
pub use kerf_geom::{
    Arc as PathArc, Bbox, CcPoint, CcType, ClPoint, Fiber, FiberDir, GeomError, Interval, Line,
    Path, Point3, Projection, Span, Surface, Triangle, Vec3, EPSILON,
};
pub use kerf_index::{AabbTree, KdTree, TriangleIndex};
pub use kerf_ops::{
    AdaptivePathDropCutter, BatchDropCutter, BatchPushCutter, OpError, PathDropCutter, Waterline,
    Weave,
};

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    /// Square pyramid: apex (5,5,5), base 10x10 at z=0.
    fn pyramid() -> Surface {
        let apex = Point3::new(5.0, 5.0, 5.0);
        let c = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(10.0, 0.0, 0.0),
            Point3::new(10.0, 10.0, 0.0),
            Point3::new(0.0, 10.0, 0.0),
        ];
        let mut s = Surface::new();
        for i in 0..4 {
            s.add_triangle(c[i], c[(i + 1) % 4], apex);
        }
        s.add_triangle(c[0], c[2], c[1]);
        s.add_triangle(c[0], c[3], c[2]);
        s
    }

    fn loop_bbox(lp: &[Point3]) -> Bbox {
        let mut bb = Bbox::empty();
        for p in lp {
            bb.extend(p);
        }
        bb
    }

    #[test]
    fn test_pyramid_waterlines_shrink_with_height() {
        let cutter = Cutter::cylindrical(1.0, 20.0).unwrap();
        let mut wl = Waterline::new(Arc::new(pyramid()), cutter, 0.5, 4).unwrap();
        let per_z = wl.run_multi(&[1.0, 3.0]).unwrap();
        assert_eq!(per_z.len(), 2);
        assert_eq!(per_z[0].len(), 1);
        assert_eq!(per_z[1].len(), 1);

        let low = loop_bbox(&per_z[0][0]);
        let high = loop_bbox(&per_z[1][0]);
        // the contour hugs the sloped flanks, so it tightens as z rises
        assert!(high.min.x > low.min.x + 1.0);
        assert!(high.max.x < low.max.x - 1.0);
        assert!(high.min.y > low.min.y + 1.0);
        assert!(high.max.y < low.max.y - 1.0);
    }

    #[test]
    fn test_guide_path_with_arc_over_pyramid() {
        let cutter = Cutter::ball(0.5, 10.0).unwrap();
        let mut op = PathDropCutter::new(Arc::new(pyramid()), cutter, 0.25).unwrap();
        op.set_min_z(0.0);

        let mut path = Path::new();
        path.append_line(Point3::new(1.0, 5.0, 0.0), Point3::new(5.0, 5.0, 0.0))
            .unwrap();
        // quarter turn from (5,5) around (5,7) ending at (7,7)
        let arc = PathArc::new(
            Point3::new(5.0, 7.0, 0.0),
            2.0,
            -std::f64::consts::FRAC_PI_2,
            0.0,
            Vec3::z(),
        )
        .unwrap();
        path.append_arc(arc).unwrap();

        let pts = op.run(&path).unwrap();
        assert!(pts.len() > 20);
        // every sample was lifted onto the pyramid flanks
        for p in pts {
            assert!(p.pos.z >= 0.0);
            assert!(p.pos.z <= 5.0 + 0.5 + 1e-9);
        }
        // the highest samples sit nearest the apex axis
        let top = pts
            .iter()
            .max_by(|a, b| a.pos.z.partial_cmp(&b.pos.z).unwrap())
            .unwrap();
        let d_top = (top.pos.x - 5.0).hypot(top.pos.y - 5.0);
        let d_first = (pts[0].pos.x - 5.0).hypot(pts[0].pos.y - 5.0);
        assert!(d_top < d_first);
    }

    #[test]
    fn test_facade_surface_to_waterline() {
        let mut surface = Surface::new();
        // a flat square plate at z = 1
        surface.add_triangle(
            Point3::new(0.0, 0.0, 1.0),
            Point3::new(4.0, 0.0, 1.0),
            Point3::new(0.0, 4.0, 1.0),
        );
        surface.add_triangle(
            Point3::new(4.0, 4.0, 1.0),
            Point3::new(4.0, 0.0, 1.0),
            Point3::new(0.0, 4.0, 1.0),
        );
        let cutter = Cutter::cylindrical(1.0, 10.0).unwrap();
        let mut wl = Waterline::new(Arc::new(surface), cutter, 0.5, 4).unwrap();
        let loops = wl.run(0.5).unwrap();
        assert_eq!(loops.len(), 1);
    }
}
