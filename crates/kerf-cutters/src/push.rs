//! Push-cutter contact checks: vertex, facet and edge features.
//!
//! The cutter reference point slides along a fiber at fixed z. Every check
//! contributes tangency parameter values; the union of all contributions
//! over one triangle is the triangle's contact interval, because the cutter
//! solid is convex and the contact set's extreme points are tangencies with
//! some triangle feature.

use kerf_geom::{CcPoint, CcType, Fiber, FiberDir, Interval, Point3, Triangle, Vec3, EPSILON};

use crate::{solvers, Cutter};

fn axis_u(f: &Fiber, p: &Point3) -> f64 {
    match f.dir() {
        FiberDir::X => p.x,
        FiberDir::Y => p.y,
    }
}

fn perp_of(f: &Fiber, p: &Point3) -> f64 {
    match f.dir() {
        FiberDir::X => p.y,
        FiberDir::Y => p.x,
    }
}

fn fiber_perp(f: &Fiber) -> f64 {
    perp_of(f, f.p1())
}

fn axis_point_xy(f: &Fiber, u: f64) -> (f64, f64) {
    match f.dir() {
        FiberDir::X => (u, f.p1().y),
        FiberDir::Y => (f.p1().x, u),
    }
}

/// Closest point on the edge to the axis position, in the horizontal
/// metric of the projection.
fn edge_closest(e0: &Point3, e1: &Point3, ax: f64, ay: f64) -> Point3 {
    let gx = e1.x - e0.x;
    let gy = e1.y - e0.y;
    let len2 = gx * gx + gy * gy;
    let sigma = if len2 < 1e-20 {
        0.5
    } else {
        (((ax - e0.x) * gx + (ay - e0.y) * gy) / len2).clamp(0.0, 1.0)
    };
    e0 + (e1 - e0) * sigma
}

/// Orientation tag for an edge contact: which side of the triangle normal
/// the cutter axis sits on.
fn side_tag(n: &Vec3, ax: f64, ay: f64, cc: &Point3) -> CcType {
    let s = (ax - cc.x) * n.x + (ay - cc.y) * n.y;
    if s > EPSILON {
        CcType::EdgePos
    } else if s < -EPSILON {
        CcType::EdgeNeg
    } else {
        CcType::Edge
    }
}

/// Record a tangency pair [u_in, u_out], clipped to the fiber range.
fn update_pair<F>(interval: &mut Interval, f: &Fiber, u_in: f64, u_out: f64, cc_at: F)
where
    F: Fn(f64) -> CcPoint,
{
    let ta = f.tval(u_in);
    let tb = f.tval(u_out);
    let (tl, th) = if ta <= tb { (ta, tb) } else { (tb, ta) };
    if th < -EPSILON || tl > 1.0 + EPSILON {
        return;
    }
    for t in [tl.clamp(0.0, 1.0), th.clamp(0.0, 1.0)] {
        let u = axis_u(f, &f.point(t));
        interval.update(t, cc_at(u));
    }
}

/// Contact of the swept cutter with the triangle vertices.
pub(crate) fn vertex_push(c: &Cutter, interval: &mut Interval, f: &Fiber, t: &Triangle) {
    let fz = f.z();
    let fp = fiber_perp(f);
    for v in t.vertices() {
        let w = c.width(v.z - fz);
        if w <= EPSILON {
            continue;
        }
        let dp = (perp_of(f, v) - fp).abs();
        if dp > w {
            continue;
        }
        let q = (w * w - dp * dp).max(0.0).sqrt();
        let vu = axis_u(f, v);
        update_pair(interval, f, vu - q, vu + q, |_| CcPoint::new(*v, CcType::Vertex));
    }
}

/// Tangency of the swept cutter with the facet plane, clipped to the
/// triangle interior.
pub(crate) fn facet_push(c: &Cutter, interval: &mut Interval, f: &Fiber, t: &Triangle) {
    let n = t.up_normal();
    if n.z < EPSILON {
        return; // vertical facet: edges carry the contact
    }
    let nxy = (n.x * n.x + n.y * n.y).sqrt();
    if nxy < EPSILON {
        return; // horizontal facet does not resist horizontal motion
    }
    let fz = f.z();
    let fp = fiber_perp(f);
    let dconst = n.dot(&t.vertices()[0].coords);

    // (CL height above the plane point under the axis, cc offset, tag)
    let mut candidates: [Option<(f64, f64, CcType)>; 2] = [None, None];
    match *c {
        Cutter::Cylindrical { radius, .. } => {
            candidates[0] = Some((radius * nxy / n.z, radius / nxy, CcType::FacetCyl));
        }
        Cutter::Ball { radius, .. } => {
            candidates[0] = Some((radius / n.z, radius, CcType::Facet));
        }
        Cutter::Bull {
            radius,
            corner_radius,
            ..
        } => {
            let ring = radius - corner_radius;
            candidates[0] = Some((
                (ring * nxy + corner_radius) / n.z,
                ring / nxy + corner_radius,
                CcType::Facet,
            ));
        }
        Cutter::Cone {
            radius, half_angle, ..
        } => {
            let cot = 1.0 / half_angle.tan();
            let slope = nxy / n.z;
            if slope <= cot + EPSILON {
                candidates[0] = Some((0.0, 0.0, CcType::FacetTip));
            }
            if slope >= cot - EPSILON {
                candidates[1] = Some((radius * nxy / n.z - radius * cot, radius / nxy, CcType::Facet));
            }
        }
    }

    for (k, off, tag) in candidates.into_iter().flatten() {
        let mut record = |t_at: f64, ax: f64, ay: f64| {
            let ccx = ax - off * n.x;
            let ccy = ay - off * n.y;
            if t.contains_xy(ccx, ccy) {
                let ccz = (dconst - n.x * ccx - n.y * ccy) / n.z;
                interval.update(t_at, CcPoint::new(Point3::new(ccx, ccy, ccz), tag));
            }
        };

        // axis position where the tangency CL height equals the fiber z
        let u_star = match f.dir() {
            FiberDir::X => {
                if n.x.abs() >= EPSILON {
                    Some((dconst - n.y * fp - n.z * (fz - k)) / n.x)
                } else {
                    None
                }
            }
            FiberDir::Y => {
                if n.y.abs() >= EPSILON {
                    Some((dconst - n.x * fp - n.z * (fz - k)) / n.y)
                } else {
                    None
                }
            }
        };
        if let Some(u_star) = u_star {
            let t_star = f.tval(u_star);
            if (-EPSILON..=1.0 + EPSILON).contains(&t_star) {
                let (ax, ay) = axis_point_xy(f, u_star);
                record(t_star.clamp(0.0, 1.0), ax, ay);
            }
        }

        // contact persisting through a fiber end still bounds the interval
        for t_end in [0.0, 1.0] {
            let p = f.point(t_end);
            let plane_z = (dconst - n.x * p.x - n.y * p.y) / n.z;
            if plane_z + k > fz + EPSILON {
                record(t_end, p.x, p.y);
            }
        }
    }
}

/// Contact of the swept cutter with the triangle edges.
pub(crate) fn edge_push(c: &Cutter, interval: &mut Interval, f: &Fiber, t: &Triangle) {
    let n = t.up_normal();
    for (e0, e1) in t.edges() {
        single_edge_push(c, interval, f, &n, &e0, &e1);
    }
}

fn horizontal_tag(c: &Cutter, h: f64) -> CcType {
    match c {
        Cutter::Cylindrical { .. } => CcType::EdgeHorizCyl,
        Cutter::Bull { corner_radius, .. } => {
            if h <= 0.0 && h >= -corner_radius {
                CcType::EdgeHorizTor
            } else {
                CcType::EdgeHorizCyl
            }
        }
        _ => CcType::EdgeHoriz,
    }
}

fn single_edge_push(
    c: &Cutter,
    interval: &mut Interval,
    f: &Fiber,
    n: &Vec3,
    e0: &Point3,
    e1: &Point3,
) {
    let fz = f.z();
    let fp = fiber_perp(f);
    let ez = e1.z - e0.z;

    if ez.abs() < EPSILON {
        // horizontal edge: constant cross-section radius along the edge
        let h = e0.z - fz;
        let w = c.width(h);
        if w <= EPSILON {
            return;
        }
        let a2 = [axis_u(f, e0), perp_of(f, e0)];
        let b2 = [axis_u(f, e1), perp_of(f, e1)];
        if let Some((ulo, uhi)) = solvers::capsule_overlap(a2, b2, fp, w) {
            let tag = horizontal_tag(c, h);
            update_pair(interval, f, ulo, uhi, |u| {
                let (ax, ay) = axis_point_xy(f, u);
                CcPoint::new(edge_closest(e0, e1, ax, ay), tag)
            });
        }
        return;
    }

    match *c {
        Cutter::Cylindrical { radius, length } => {
            // clip the edge to the cutter's z-range, then a capsule test on
            // its projection
            let s0 = (fz - e0.z) / ez;
            let s1 = (fz + length - e0.z) / ez;
            let (slo, shi) = if s0 <= s1 { (s0, s1) } else { (s1, s0) };
            let slo = slo.max(0.0);
            let shi = shi.min(1.0);
            if slo >= shi {
                return;
            }
            let p0 = e0 + (e1 - e0) * slo;
            let p1 = e0 + (e1 - e0) * shi;
            let a2 = [axis_u(f, &p0), perp_of(f, &p0)];
            let b2 = [axis_u(f, &p1), perp_of(f, &p1)];
            if let Some((ulo, uhi)) = solvers::capsule_overlap(a2, b2, fp, radius) {
                update_pair(interval, f, ulo, uhi, |u| {
                    let (ax, ay) = axis_point_xy(f, u);
                    let cc = edge_closest(&p0, &p1, ax, ay);
                    let tag = side_tag(n, ax, ay, &cc);
                    CcPoint::new(cc, tag)
                });
            }
        }
        _ => {
            // general edge against a ball, bull or cone: bracket the zero
            // of the solid-clearance function along the fiber
            numeric_edge_push(c, interval, f, n, e0, e1);
        }
    }
}

/// Solid-clearance formulation: the cutter at axis position u intersects
/// the edge iff some edge point lies horizontally closer to the axis than
/// the cutter's cross-section radius at that height. The contact set is an
/// interval; its ends are bracketed and bisected to tolerance.
fn numeric_edge_push(
    c: &Cutter,
    interval: &mut Interval,
    f: &Fiber,
    n: &Vec3,
    e0: &Point3,
    e1: &Point3,
) {
    let fz = f.z();
    let fp = fiber_perp(f);
    let r = c.radius();

    let u0 = axis_u(f, e0);
    let u1 = axis_u(f, e1);
    let scan_lo = u0.min(u1) - r - 1.0;
    let scan_hi = u0.max(u1) + r + 1.0;

    let clearance = |u: f64| -> f64 {
        let (ax, ay) = axis_point_xy(f, u);
        let g = |s: f64| {
            let p = e0 + (e1 - e0) * s;
            let dx = p.x - ax;
            let dy = p.y - ay;
            (dx * dx + dy * dy).sqrt() - c.width(p.z - fz)
        };
        solvers::min_scan(&g, 0.0, 1.0, 32).1
    };

    let (u_star, f_min) = solvers::min_scan(&clearance, scan_lo, scan_hi, 128);
    if f_min > 0.0 {
        return;
    }
    let u_in = solvers::bisect(&clearance, scan_lo, u_star);
    let u_out = solvers::bisect(&clearance, u_star, scan_hi);

    update_pair(interval, f, u_in, u_out, |u| {
        let (ax, ay) = axis_point_xy(f, u);
        // contact is the edge point achieving the minimum clearance
        let g = |s: f64| {
            let p = e0 + (e1 - e0) * s;
            let dx = p.x - ax;
            let dy = p.y - ay;
            (dx * dx + dy * dy).sqrt() - c.width(p.z - fz)
        };
        let (s, _) = solvers::min_scan(&g, 0.0, 1.0, 32);
        let cc = e0 + (e1 - e0) * s;
        let tag = side_tag(n, ax, ay, &cc);
        CcPoint::new(cc, tag)
    });
}
