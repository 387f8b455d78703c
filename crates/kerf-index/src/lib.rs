#![warn(missing_docs)]

//! Spatial indices over triangulated surfaces.
//!
//! Two interchangeable static trees keyed on triangle bounding boxes: a
//! median-split KD-tree and a SAH-built AABB hierarchy. Both build from a
//! shared [`Surface`] in O(n log n), answer conservative box-overlap queries
//! in a selectable projection plane, and are safe for concurrent reads after
//! build. Queries return indices into the surface's triangle arena, never
//! borrowed triangles, so the tree and the surface stay lifetime-decoupled.

pub mod aabb;
pub mod kdtree;

pub use aabb::AabbTree;
pub use kdtree::KdTree;

use std::sync::Arc;

use kerf_geom::{Bbox, Projection, Surface};

/// A static triangle index answering projected box-overlap queries.
///
/// The query is conservative: it may return triangles whose geometry does
/// not actually overlap the box (callers re-filter), but it never omits a
/// triangle whose bounding box overlaps in the selected projection.
pub trait TriangleIndex: Send + Sync {
    /// The surface the index was built over.
    fn surface(&self) -> &Arc<Surface>;

    /// The projection plane queries are evaluated in.
    fn projection(&self) -> Projection;

    /// Ids of all triangles whose bounding box overlaps `query` in the
    /// index's projection plane, appended to `out`.
    fn query_into(&self, query: &Bbox, out: &mut Vec<u32>);

    /// Convenience wrapper allocating a fresh id vector.
    fn query(&self, query: &Bbox) -> Vec<u32> {
        let mut out = Vec::new();
        self.query_into(query, &mut out);
        out
    }
}

#[cfg(test)]
pub(crate) mod test_surfaces {
    use kerf_geom::{Point3, Surface};

    /// A 10x10 grid of unit quads (200 triangles) on a paraboloid.
    pub fn bumpy_grid() -> Surface {
        let mut s = Surface::new();
        let z = |x: f64, y: f64| 0.05 * (x * x + y * y);
        for i in 0..10 {
            for j in 0..10 {
                let (x0, y0) = (i as f64, j as f64);
                let (x1, y1) = (x0 + 1.0, y0 + 1.0);
                s.add_triangle(
                    Point3::new(x0, y0, z(x0, y0)),
                    Point3::new(x1, y0, z(x1, y0)),
                    Point3::new(x0, y1, z(x0, y1)),
                );
                s.add_triangle(
                    Point3::new(x1, y1, z(x1, y1)),
                    Point3::new(x0, y1, z(x0, y1)),
                    Point3::new(x1, y0, z(x1, y0)),
                );
            }
        }
        s
    }
}

#[cfg(test)]
mod tests {
    use super::test_surfaces::bumpy_grid;
    use super::*;
    use kerf_geom::Point3;

    fn brute_force(surface: &Surface, query: &Bbox, proj: Projection) -> Vec<u32> {
        surface
            .triangles()
            .iter()
            .enumerate()
            .filter(|(_, t)| t.bbox().overlaps(query, proj))
            .map(|(i, _)| i as u32)
            .collect()
    }

    fn check_matches_brute_force(index: &dyn TriangleIndex) {
        let surface = index.surface().clone();
        let queries = [
            Bbox::new(Point3::new(2.0, 2.0, -1.0), Point3::new(4.5, 3.5, 1.0)),
            Bbox::new(Point3::new(-5.0, -5.0, -5.0), Point3::new(0.5, 0.5, 5.0)),
            Bbox::new(Point3::new(9.0, 9.0, 0.0), Point3::new(20.0, 20.0, 20.0)),
            Bbox::new(Point3::new(40.0, 40.0, 0.0), Point3::new(41.0, 41.0, 1.0)),
        ];
        for q in &queries {
            let mut got = index.query(q);
            got.sort_unstable();
            let want = brute_force(&surface, q, index.projection());
            assert_eq!(got, want, "query {q:?}");
        }
    }

    #[test]
    fn test_kdtree_matches_brute_force() {
        for bucket in [1, 4, 16] {
            let index = KdTree::build(Arc::new(bumpy_grid()), Projection::Xy, bucket);
            check_matches_brute_force(&index);
        }
    }

    #[test]
    fn test_aabb_matches_brute_force() {
        let index = AabbTree::build(Arc::new(bumpy_grid()), Projection::Xy, 4);
        check_matches_brute_force(&index);
    }

    #[test]
    fn test_yz_projection_query() {
        let index = KdTree::build(Arc::new(bumpy_grid()), Projection::Yz, 2);
        check_matches_brute_force(&index);
    }

    #[test]
    fn test_empty_surface() {
        let index = KdTree::build(Arc::new(Surface::new()), Projection::Xy, 1);
        let q = Bbox::new(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 1.0));
        assert!(index.query(&q).is_empty());
    }

    #[test]
    fn test_concurrent_queries() {
        let index = Arc::new(KdTree::build(Arc::new(bumpy_grid()), Projection::Xy, 4));
        let q = Bbox::new(Point3::new(1.0, 1.0, -1.0), Point3::new(8.0, 8.0, 9.0));
        let expect = index.query(&q).len();
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let index = index.clone();
                std::thread::spawn(move || {
                    let q =
                        Bbox::new(Point3::new(1.0, 1.0, -1.0), Point3::new(8.0, 8.0, 9.0));
                    index.query(&q).len()
                })
            })
            .collect();
        for h in handles {
            assert_eq!(h.join().unwrap(), expect);
        }
    }
}
