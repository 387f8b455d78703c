//! Drop-cutter contact checks: vertex, facet and edge features.
//!
//! Each check computes the CL z at which the cutter just touches the
//! feature and lifts the CL point if that z beats the current one. The
//! union of the three checks over a triangle is the exact drop height for
//! a convex cutter.

use kerf_geom::{xy_distance, CcPoint, CcType, ClPoint, Point3, Triangle, EPSILON};

use crate::{solvers, Cutter};

/// Contact against the three triangle vertices.
pub(crate) fn vertex_drop(c: &Cutter, cl: &mut ClPoint, t: &Triangle) -> bool {
    let mut hit = false;
    for v in t.vertices() {
        let d = xy_distance(&cl.pos, v);
        if let Some(dz) = c.drop_height(d) {
            let tag = match c {
                Cutter::Cylindrical { .. } => CcType::VertexCyl,
                _ => CcType::Vertex,
            };
            hit |= cl.lift(v.z + dz, CcPoint::new(*v, tag));
        }
    }
    hit
}

/// Contact against the triangle's interior plane region.
pub(crate) fn facet_drop(c: &Cutter, cl: &mut ClPoint, t: &Triangle) -> bool {
    let n = t.up_normal();
    if n.z < EPSILON {
        return false; // vertical facets cannot support the cutter from below
    }
    let nxy = (n.x * n.x + n.y * n.y).sqrt();
    let pz = match t.z_at_xy(cl.pos.x, cl.pos.y) {
        Some(z) => z,
        None => return false,
    };

    if nxy < EPSILON {
        // horizontal facet: contact directly under the axis
        let (z, tag) = match *c {
            Cutter::Cylindrical { .. } => (pz, CcType::FacetCyl),
            Cutter::Ball { radius, .. } => (pz + radius, CcType::Facet),
            Cutter::Bull { corner_radius, .. } => (pz + corner_radius, CcType::Facet),
            Cutter::Cone { .. } => (pz, CcType::FacetTip),
        };
        if t.contains_xy(cl.pos.x, cl.pos.y) {
            let cc = Point3::new(cl.pos.x, cl.pos.y, pz);
            return cl.lift(z, CcPoint::new(cc, tag));
        }
        return false;
    }

    // tilted facet: the contact point sits at a fixed horizontal offset
    // from the axis, in the downhill direction of the plane
    let plane_z_at = |x: f64, y: f64| {
        let d = n.dot(&t.vertices()[0].coords);
        (d - n.x * x - n.y * y) / n.z
    };
    let mut hit = false;
    let try_contact = |off: f64, dz_above_cc: f64, tag: CcType, cl: &mut ClPoint| {
        let ccx = cl.pos.x - off * n.x;
        let ccy = cl.pos.y - off * n.y;
        if t.contains_xy(ccx, ccy) {
            let ccz = plane_z_at(ccx, ccy);
            let cc = CcPoint::new(Point3::new(ccx, ccy, ccz), tag);
            if cl.lift(ccz + dz_above_cc, cc) {
                return true;
            }
        }
        false
    };

    match *c {
        Cutter::Cylindrical { radius, .. } => {
            // bottom rim rests on the plane; CL is level with the contact
            hit |= try_contact(radius / nxy, 0.0, CcType::FacetCyl, cl);
        }
        Cutter::Ball { radius, .. } => {
            // sphere center sits r along the normal from the contact
            hit |= try_contact(radius, radius * n.z, CcType::Facet, cl);
        }
        Cutter::Bull {
            radius,
            corner_radius,
            ..
        } => {
            let ring = radius - corner_radius;
            hit |= try_contact(
                ring / nxy + corner_radius,
                corner_radius * n.z,
                CcType::Facet,
                cl,
            );
        }
        Cutter::Cone {
            radius, half_angle, ..
        } => {
            let cot = 1.0 / half_angle.tan();
            let slope = nxy / n.z;
            if slope <= cot + EPSILON {
                // shallow plane: the tip rests on it
                hit |= try_contact(0.0, 0.0, CcType::FacetTip, cl);
            }
            if slope >= cot - EPSILON {
                // steep plane: the base rim rests on it
                let base_height = radius * cot;
                hit |= try_contact(radius / nxy, -base_height, CcType::Facet, cl);
            }
        }
    }
    hit
}

/// Contact against the three triangle edges.
pub(crate) fn edge_drop(c: &Cutter, cl: &mut ClPoint, t: &Triangle) -> bool {
    let mut hit = false;
    for (e0, e1) in t.edges() {
        hit |= single_edge_drop(c, cl, &e0, &e1);
    }
    hit
}

fn single_edge_drop(c: &Cutter, cl: &mut ClPoint, e0: &Point3, e1: &Point3) -> bool {
    // edge in cl-centered horizontal coordinates
    let q0x = e0.x - cl.pos.x;
    let q0y = e0.y - cl.pos.y;
    let ex = e1.x - e0.x;
    let ey = e1.y - e0.y;
    let ez = e1.z - e0.z;

    let a = ex * ex + ey * ey;
    if a < EPSILON * EPSILON {
        return false; // vertical edge in projection: vertex checks cover it
    }
    let b = 2.0 * (q0x * ex + q0y * ey);
    let cq = q0x * q0x + q0y * q0y;
    let rho2 = move |s: f64| a * s * s + b * s + cq;
    let edge_z = move |s: f64| e0.z + s * ez;
    let horizontal = ez.abs() < EPSILON;

    // s-interval where the horizontal distance stays below `radius`
    let chord = |radius: f64| -> Option<(f64, f64)> {
        let disc = b * b - 4.0 * a * (cq - radius * radius);
        if disc <= 0.0 {
            return None;
        }
        let sq = disc.sqrt();
        let lo = ((-b - sq) / (2.0 * a)).max(0.0);
        let hi = ((-b + sq) / (2.0 * a)).min(1.0);
        if lo > hi {
            None
        } else {
            Some((lo, hi))
        }
    };
    let point_at = |s: f64| Point3::new(e0.x + s * ex, e0.y + s * ey, e0.z + s * ez);
    let d_perp = (cq - b * b / (4.0 * a)).max(0.0).sqrt();

    let mut hit = false;
    match *c {
        Cutter::Cylindrical { radius, .. } => {
            // flat bottom: max edge z over the rim chord, attained at an end
            if let Some((lo, hi)) = chord(radius) {
                let (s, z) = if edge_z(lo) >= edge_z(hi) {
                    (lo, edge_z(lo))
                } else {
                    (hi, edge_z(hi))
                };
                let tag = if d_perp < EPSILON {
                    CcType::EdgeShaft
                } else if horizontal {
                    CcType::EdgeHorizCyl
                } else {
                    CcType::EdgeCyl
                };
                hit |= cl.lift(z, CcPoint::new(point_at(s), tag));
            }
        }
        Cutter::Ball { radius, .. } => {
            // sphere tangent to the edge line, center on the cutter axis
            let elen = (a + ez * ez).sqrt();
            let eh = [ex / elen, ey / elen, ez / elen];
            // m = (e0 - axis) x ehat, k = zhat x ehat
            let w0 = [q0x, q0y, e0.z];
            let m = [
                w0[1] * eh[2] - w0[2] * eh[1],
                w0[2] * eh[0] - w0[0] * eh[2],
                w0[0] * eh[1] - w0[1] * eh[0],
            ];
            let k = [-eh[1], eh[0], 0.0];
            let ak = k[0] * k[0] + k[1] * k[1];
            let mk = m[0] * k[0] + m[1] * k[1];
            let mm = m[0] * m[0] + m[1] * m[1] + m[2] * m[2];
            let disc = mk * mk - ak * (mm - radius * radius);
            if ak > EPSILON && disc >= 0.0 {
                let zc = (mk + disc.sqrt()) / ak;
                // foot of the contact on the edge
                let s = ((0.0 - w0[0]) * eh[0] + (0.0 - w0[1]) * eh[1] + (zc - w0[2]) * eh[2])
                    / elen;
                if (-EPSILON..=1.0 + EPSILON).contains(&s) {
                    let s = s.clamp(0.0, 1.0);
                    let tag = if horizontal {
                        CcType::EdgeHoriz
                    } else {
                        CcType::EdgeBall
                    };
                    hit |= cl.lift(zc, CcPoint::new(point_at(s), tag));
                }
            }
        }
        Cutter::Bull {
            radius,
            corner_radius,
            ..
        } => {
            let ring = radius - corner_radius;
            // flat bottom disc: linear max over its chord
            if ring > EPSILON {
                if let Some((lo, hi)) = chord(ring) {
                    let (s, z) = if edge_z(lo) >= edge_z(hi) {
                        (lo, edge_z(lo))
                    } else {
                        (hi, edge_z(hi))
                    };
                    let tag = if horizontal {
                        CcType::EdgeHoriz
                    } else {
                        CcType::Edge
                    };
                    hit |= cl.lift(z + corner_radius, CcPoint::new(point_at(s), tag));
                }
            }
            // torus band: maximize the clearance height over the feasible
            // band |rho - ring| <= r2, which may be two sub-intervals
            if let Some((olo, ohi)) = chord(radius) {
                let g = |s: f64| {
                    let dr = rho2(s).sqrt() - ring;
                    let under = corner_radius * corner_radius - dr * dr;
                    if under < 0.0 {
                        f64::NEG_INFINITY
                    } else {
                        edge_z(s) + under.sqrt()
                    }
                };
                let mut spans = [(olo, ohi), (f64::INFINITY, f64::NEG_INFINITY)];
                if ring > corner_radius {
                    let inner = ring - corner_radius;
                    if let Some((ilo, ihi)) = chord(inner) {
                        if ihi - ilo > EPSILON {
                            spans = [(olo, ilo), (ihi, ohi)];
                        }
                    }
                }
                for (lo, hi) in spans {
                    if hi - lo < EPSILON {
                        continue;
                    }
                    let (s, z) = solvers::max_scan(&g, lo, hi, 32);
                    if z.is_finite() {
                        let tag = if horizontal {
                            CcType::EdgeHorizTor
                        } else {
                            CcType::Edge
                        };
                        hit |= cl.lift(z, CcPoint::new(point_at(s), tag));
                    }
                }
            }
        }
        Cutter::Cone {
            radius, half_angle, ..
        } => {
            let cot = 1.0 / half_angle.tan();
            if let Some((lo, hi)) = chord(radius) {
                // slant side: concave height function over the chord
                let g = |s: f64| edge_z(s) - rho2(s).max(0.0).sqrt() * cot;
                let (s, z) = solvers::max_scan(&g, lo, hi, 32);
                hit |= cl.lift(z, CcPoint::new(point_at(s), CcType::EdgeCone));

                // base rim: cylinder of radius r at the base height
                let base_height = radius * cot;
                let (s, z) = if edge_z(lo) >= edge_z(hi) {
                    (lo, edge_z(lo))
                } else {
                    (hi, edge_z(hi))
                };
                hit |= cl.lift(
                    z - base_height,
                    CcPoint::new(point_at(s), CcType::EdgeConeBase),
                );
            }
        }
    }
    hit
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use kerf_geom::Point3;

    fn flat_triangle() -> Triangle {
        Triangle::new(
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(10.0, 0.0, 0.0),
            Point3::new(0.0, 10.0, 0.0),
        )
        .unwrap()
    }

    fn sloped_triangle() -> Triangle {
        // rises 1:1 in x
        Triangle::new(
            Point3::new(0.0, -10.0, 0.0),
            Point3::new(10.0, -10.0, 10.0),
            Point3::new(0.0, 10.0, 0.0),
        )
        .unwrap()
    }

    #[test]
    fn test_cylinder_flat_facet() {
        let c = Cutter::cylindrical(3.0, 20.0).unwrap();
        let mut cl = ClPoint::at_xy(5.0, 5.0);
        assert!(c.drop_cutter(&mut cl, &flat_triangle()));
        assert!(cl.pos.z.abs() < 1e-9);
        assert_eq!(cl.cc.ctype, CcType::FacetCyl);
        assert!((cl.cc.pos - Point3::new(5.0, 5.0, 0.0)).norm() < 1e-9);
    }

    #[test]
    fn test_ball_flat_facet() {
        // the sphere-center reference rides r above a horizontal plane
        let c = Cutter::ball(5.0, 20.0).unwrap();
        let mut cl = ClPoint::at_xy(5.0, 5.0);
        assert!(c.drop_cutter(&mut cl, &flat_triangle()));
        assert!((cl.pos.z - 5.0).abs() < 1e-9);
        assert!(cl.cc.ctype.is_facet() || cl.cc.ctype.is_edge());
        assert!((cl.cc.pos - Point3::new(5.0, 5.0, 0.0)).norm() < 1e-9);
    }

    #[test]
    fn test_ball_sloped_facet() {
        let c = Cutter::ball(2.0, 20.0).unwrap();
        let t = sloped_triangle();
        let mut cl = ClPoint::at_xy(2.0, 0.0);
        assert!(c.drop_cutter(&mut cl, &t));
        // plane has normal (-1,0,1)/sqrt(2); center z = P.z + r/nz
        let nz = 1.0 / 2.0_f64.sqrt();
        assert_relative_eq!(cl.pos.z, 2.0 + 2.0 / nz, epsilon = 1e-9);
        assert_eq!(cl.cc.ctype, CcType::Facet);
    }

    #[test]
    fn test_bull_flat_facet() {
        let c = Cutter::bull(3.0, 1.0, 20.0).unwrap();
        let mut cl = ClPoint::at_xy(4.0, 4.0);
        assert!(c.drop_cutter(&mut cl, &flat_triangle()));
        // ring-plane reference rides r2 above a horizontal plane
        assert!((cl.pos.z - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_cone_flat_facet_tip() {
        let c = Cutter::cone(3.0, 0.6, 20.0).unwrap();
        let mut cl = ClPoint::at_xy(2.0, 2.0);
        assert!(c.drop_cutter(&mut cl, &flat_triangle()));
        assert!(cl.pos.z.abs() < 1e-9);
        assert_eq!(cl.cc.ctype, CcType::FacetTip);
    }

    #[test]
    fn test_vertex_contact_ball() {
        let c = Cutter::ball(2.0, 20.0).unwrap();
        let t = flat_triangle();
        // directly over the corner vertex
        let mut cl = ClPoint::at_xy(0.0, 0.0);
        assert!(c.drop_cutter(&mut cl, &t));
        assert!((cl.pos.z - 2.0).abs() < 1e-9);

        // off the facet, near the vertex: pure vertex contact
        let mut cl = ClPoint::at_xy(-1.0, -1.0);
        assert!(c.drop_cutter(&mut cl, &t));
        let d2: f64 = 2.0;
        assert!((cl.pos.z - (4.0 - d2).sqrt()).abs() < 1e-9);
        assert_eq!(cl.cc.ctype, CcType::Vertex);
    }

    #[test]
    fn test_vertex_contact_cone_drops_tip_below() {
        let c = Cutter::cone(3.0, std::f64::consts::FRAC_PI_4, 20.0).unwrap();
        let v = Point3::new(0.0, 0.0, 5.0);
        let t = Triangle::new(v, Point3::new(0.1, 0.0, 5.0), Point3::new(0.0, 0.1, 5.0)).unwrap();
        let mut cl = ClPoint::at_xy(2.0, 0.0);
        assert!(c.drop_cutter(&mut cl, &t));
        // side contact: the tip sits d*cot below the nearest vertex, which
        // is (0.1, 0, 5) at d = 1.9; the tiny facet does not reach (2,0)
        assert!((cl.pos.z - 3.1).abs() < 1e-6, "z = {}", cl.pos.z);
    }

    #[test]
    fn test_edge_contact_cylinder_rim() {
        let c = Cutter::cylindrical(3.0, 20.0).unwrap();
        // horizontal edge at z=4 along x, 2 units to the side of the axis
        let t = Triangle::new(
            Point3::new(-10.0, 2.0, 4.0),
            Point3::new(10.0, 2.0, 4.0),
            Point3::new(0.0, 12.0, 4.0),
        )
        .unwrap();
        let mut cl = ClPoint::at_xy(0.0, 0.0);
        assert!(c.drop_cutter(&mut cl, &t));
        // flat bottom touches the edge at its own height
        assert!((cl.pos.z - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_edge_contact_ball_off_axis() {
        let c = Cutter::ball(2.0, 20.0).unwrap();
        // horizontal edge along x at y=1, z=0
        let t = Triangle::new(
            Point3::new(-10.0, 1.0, 0.0),
            Point3::new(10.0, 1.0, 0.0),
            Point3::new(0.0, 11.0, 0.0),
        )
        .unwrap();
        let mut cl = ClPoint::at_xy(0.0, 0.0);
        c.drop_cutter(&mut cl, &t);
        // the axis is outside the facet, so the edge tangency at
        // perpendicular distance 1 governs
        assert!((cl.pos.z - 3.0_f64.sqrt()).abs() < 1e-9, "z = {}", cl.pos.z);

        // further off: edge tangency at distance 1.5
        let mut cl = ClPoint::at_xy(0.0, -0.5);
        c.drop_cutter(&mut cl, &t);
        let expect: f64 = (4.0_f64 - 1.5 * 1.5).sqrt();
        assert!((cl.pos.z - expect).abs() < 1e-9, "z = {}", cl.pos.z);
    }

    #[test]
    fn test_bull_limits_match_cylinder_and_ball() {
        // limit shapes: bull(r2->0) ~ cylinder, bull(r2->r) ~ ball
        let t = sloped_triangle();
        let positions = [(2.0, 0.0), (5.0, 1.0), (7.5, -2.0), (0.5, 3.0)];

        let cyl = Cutter::cylindrical(3.0, 20.0).unwrap();
        let near_cyl = Cutter::bull(3.0, 1e-7, 20.0).unwrap();
        for &(x, y) in &positions {
            let mut a = ClPoint::at_xy(x, y);
            let mut b = ClPoint::at_xy(x, y);
            cyl.drop_cutter(&mut a, &t);
            near_cyl.drop_cutter(&mut b, &t);
            assert!((a.pos.z - b.pos.z).abs() < 1e-5, "cyl limit at ({x},{y})");
        }

        let ball = Cutter::ball(3.0, 20.0).unwrap();
        let near_ball = Cutter::bull(3.0, 3.0 - 1e-7, 20.0).unwrap();
        for &(x, y) in &positions {
            let mut a = ClPoint::at_xy(x, y);
            let mut b = ClPoint::at_xy(x, y);
            ball.drop_cutter(&mut a, &t);
            near_ball.drop_cutter(&mut b, &t);
            assert!((a.pos.z - b.pos.z).abs() < 1e-4, "ball limit at ({x},{y})");
        }
    }

    #[test]
    fn test_drop_is_monotonic() {
        // a point already above the triangle never moves down
        let cutters = [
            Cutter::cylindrical(3.0, 20.0).unwrap(),
            Cutter::ball(2.0, 20.0).unwrap(),
            Cutter::bull(3.0, 1.0, 20.0).unwrap(),
            Cutter::cone(3.0, 0.7, 20.0).unwrap(),
        ];
        let t = sloped_triangle();
        for c in &cutters {
            let mut cl = ClPoint::new(5.0, 0.0, 100.0);
            let before = cl.pos.z;
            let lifted = c.drop_cutter(&mut cl, &t);
            assert!(!lifted);
            assert!(cl.pos.z >= before);
        }
    }

    #[test]
    fn test_dropped_ball_clears_surface() {
        // after a drop, no sampled surface point may poke into the sphere
        let r = 2.0;
        let c = Cutter::ball(r, 20.0).unwrap();
        let t = sloped_triangle();
        for (x, y) in [(1.0, 0.0), (4.0, -3.0), (6.0, 2.0), (9.5, 0.0)] {
            let mut cl = ClPoint::at_xy(x, y);
            if !c.drop_cutter(&mut cl, &t) {
                continue;
            }
            let verts = t.vertices();
            for i in 0..40 {
                for j in 0..(40 - i) {
                    let (u, v) = (i as f64 / 40.0, j as f64 / 40.0);
                    let p = verts[0]
                        + (verts[1] - verts[0]) * u
                        + (verts[2] - verts[0]) * v;
                    let dist = (p - cl.pos).norm();
                    // points below the center must stay outside the sphere
                    if p.z <= cl.pos.z {
                        assert!(dist >= r - 1e-7, "penetration at ({x},{y}): {dist}");
                    }
                }
            }
        }
    }

    #[test]
    fn test_no_contact_far_away() {
        let c = Cutter::ball(2.0, 20.0).unwrap();
        let mut cl = ClPoint::at_xy(100.0, 100.0);
        assert!(!c.drop_cutter(&mut cl, &flat_triangle()));
        assert_eq!(cl.pos.z, f64::NEG_INFINITY);
        assert_eq!(cl.cc.ctype, CcType::None);
    }
}
