//! Weave: planar subdivision of crossing x- and y-fiber segments, and
//! extraction of the closed loops bounding the cut region.
//!
//! Every fiber interval contributes one axis-aligned segment at the weave's
//! z-height. Interval endpoints are CL vertices (true contour points);
//! crossings between x- and y-segments are internal scaffolding vertices.
//! Loops are the contour-face cycles of a deterministic turn-rule walk;
//! each reports the CL vertices it passes, in order.

use kerf_geom::{Fiber, FiberDir, Point3, EPSILON};

/// Neighbor slots: east, north, west, south.
const DIR_E: usize = 0;
const DIR_N: usize = 1;
const DIR_W: usize = 2;
const DIR_S: usize = 3;

fn turn_right(d: usize) -> usize {
    (d + 3) % 4
}

fn turn_left(d: usize) -> usize {
    (d + 1) % 4
}

fn reverse(d: usize) -> usize {
    (d + 2) % 4
}

#[derive(Debug, Clone)]
struct Vertex {
    x: f64,
    y: f64,
    cl: bool,
    adj: [Option<u32>; 4],
}

#[derive(Debug)]
struct Segment {
    /// Fixed coordinate: y for an x-segment, x for a y-segment.
    fixed: f64,
    /// Span along the segment direction.
    lo: f64,
    hi: f64,
    /// (coordinate along the segment, vertex id)
    verts: Vec<(f64, u32)>,
}

impl Segment {
    fn covers(&self, coord: f64) -> bool {
        coord >= self.lo - EPSILON && coord <= self.hi + EPSILON
    }

    fn find_near(&self, coord: f64) -> Option<u32> {
        self.verts
            .iter()
            .find(|(c, _)| (c - coord).abs() < EPSILON)
            .map(|&(_, id)| id)
    }
}

/// Planar subdivision of one z-height's fiber grid.
pub struct Weave {
    z: f64,
    xfibers: Vec<Fiber>,
    yfibers: Vec<Fiber>,
    verts: Vec<Vertex>,
    alias: Vec<u32>,
    xsegs: Vec<Segment>,
    ysegs: Vec<Segment>,
    loops: Vec<Vec<Point3>>,
}

impl Weave {
    /// Empty weave at a z-height.
    pub fn new(z: f64) -> Self {
        Self {
            z,
            xfibers: Vec::new(),
            yfibers: Vec::new(),
            verts: Vec::new(),
            alias: Vec::new(),
            xsegs: Vec::new(),
            ysegs: Vec::new(),
            loops: Vec::new(),
        }
    }

    /// Add a pushed fiber; fibers without intervals contribute nothing.
    pub fn add_fiber(&mut self, fiber: Fiber) {
        if fiber.ints.is_empty() {
            return;
        }
        match fiber.dir() {
            FiberDir::X => self.xfibers.push(fiber),
            FiberDir::Y => self.yfibers.push(fiber),
        }
    }

    /// Build the planar graph: segments, endpoint vertices, crossings and
    /// the per-segment adjacency links.
    pub fn build(&mut self) {
        self.make_segments();
        self.make_crossings();
        self.link_segments();
    }

    fn new_vertex(&mut self, x: f64, y: f64, cl: bool) -> u32 {
        let id = self.verts.len() as u32;
        self.verts.push(Vertex {
            x,
            y,
            cl,
            adj: [None; 4],
        });
        self.alias.push(id);
        id
    }

    fn resolve(&self, mut id: u32) -> u32 {
        while self.alias[id as usize] != id {
            id = self.alias[id as usize];
        }
        id
    }

    fn make_segments(&mut self) {
        let xfibers = std::mem::take(&mut self.xfibers);
        for f in &xfibers {
            for iv in &f.ints {
                if iv.is_degenerate() {
                    continue;
                }
                let p_lo = f.point(iv.lower);
                let p_hi = f.point(iv.upper);
                let (lo, hi) = (p_lo.x.min(p_hi.x), p_lo.x.max(p_hi.x));
                let y = f.p1().y;
                let v_lo = self.new_vertex(lo, y, true);
                let v_hi = self.new_vertex(hi, y, true);
                self.xsegs.push(Segment {
                    fixed: y,
                    lo,
                    hi,
                    verts: vec![(lo, v_lo), (hi, v_hi)],
                });
            }
        }
        let yfibers = std::mem::take(&mut self.yfibers);
        for f in &yfibers {
            for iv in &f.ints {
                if iv.is_degenerate() {
                    continue;
                }
                let p_lo = f.point(iv.lower);
                let p_hi = f.point(iv.upper);
                let (lo, hi) = (p_lo.y.min(p_hi.y), p_lo.y.max(p_hi.y));
                let x = f.p1().x;
                let v_lo = self.new_vertex(x, lo, true);
                let v_hi = self.new_vertex(x, hi, true);
                self.ysegs.push(Segment {
                    fixed: x,
                    lo,
                    hi,
                    verts: vec![(lo, v_lo), (hi, v_hi)],
                });
            }
        }
        self.xfibers = xfibers;
        self.yfibers = yfibers;
    }

    fn make_crossings(&mut self) {
        for xi in 0..self.xsegs.len() {
            for yi in 0..self.ysegs.len() {
                let x = self.ysegs[yi].fixed;
                let y = self.xsegs[xi].fixed;
                if !self.xsegs[xi].covers(x) || !self.ysegs[yi].covers(y) {
                    continue;
                }
                let on_x = self.xsegs[xi].find_near(x);
                let on_y = self.ysegs[yi].find_near(y);
                match (on_x, on_y) {
                    (None, None) => {
                        let id = self.new_vertex(x, y, false);
                        self.xsegs[xi].verts.push((x, id));
                        self.ysegs[yi].verts.push((y, id));
                    }
                    (Some(id), None) => self.ysegs[yi].verts.push((y, id)),
                    (None, Some(id)) => self.xsegs[xi].verts.push((x, id)),
                    // coincident endpoints of both segments fuse into one
                    // vertex, so corner contours stay connected
                    (Some(a), Some(b)) => {
                        let keep = self.resolve(a);
                        let drop = self.resolve(b);
                        if keep != drop {
                            self.alias[drop as usize] = keep;
                            let was_cl = self.verts[drop as usize].cl;
                            self.verts[keep as usize].cl |= was_cl;
                        }
                    }
                }
            }
        }
    }

    fn link_segments(&mut self) {
        let mut xsegs = std::mem::take(&mut self.xsegs);
        let mut ysegs = std::mem::take(&mut self.ysegs);
        for seg in xsegs.iter_mut().chain(ysegs.iter_mut()) {
            seg.verts
                .sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
        }
        // x-segments run west -> east, y-segments south -> north
        for (segs, fwd, bwd) in [(&xsegs, DIR_E, DIR_W), (&ysegs, DIR_N, DIR_S)] {
            for seg in segs.iter() {
                for pair in seg.verts.windows(2) {
                    let (c1, v1) = pair[0];
                    let (c2, v2) = pair[1];
                    let v1 = self.resolve(v1);
                    let v2 = self.resolve(v2);
                    if v1 == v2 || c2 - c1 < EPSILON {
                        continue; // coincident vertices: no zero-length edge
                    }
                    self.verts[v1 as usize].adj[fwd] = Some(v2);
                    self.verts[v2 as usize].adj[bwd] = Some(v1);
                }
            }
        }
        self.xsegs = xsegs;
        self.ysegs = ysegs;
    }

    /// Deterministic successor: arriving along `d`, leave through the first
    /// available of right turn, straight, left turn, back.
    fn successor(&self, arrived_at: u32, d: usize) -> usize {
        let v = &self.verts[arrived_at as usize];
        for cand in [turn_right(d), d, turn_left(d), reverse(d)] {
            if v.adj[cand].is_some() {
                return cand;
            }
        }
        unreachable!("arrival implies at least the reverse edge exists");
    }

    /// Trace every turn-rule cycle and keep the contour faces.
    ///
    /// With the right-turn-first successor every bounded face of the
    /// subdivision is walked clockwise and the unbounded face
    /// counter-clockwise, so a positive signed area singles out the outer
    /// contour of each connected region. Faces carrying a degree-1 stub
    /// tip (an interval endpoint past the last crossing) are contour faces
    /// too: stubs only poke into uncut area.
    pub fn face_traverse(&mut self) {
        let nv = self.verts.len();
        let mut visited = vec![[false; 4]; nv];
        self.loops.clear();

        for v0 in 0..nv as u32 {
            for d0 in 0..4 {
                if visited[v0 as usize][d0] || self.verts[v0 as usize].adj[d0].is_none() {
                    continue;
                }
                // walk the cycle of (vertex, out-direction) pairs
                let mut cycle: Vec<(u32, usize)> = Vec::new();
                let (mut v, mut d) = (v0, d0);
                loop {
                    visited[v as usize][d] = true;
                    cycle.push((v, d));
                    let next = self.verts[v as usize].adj[d].expect("linked edge");
                    d = self.successor(next, d);
                    v = next;
                    if v == v0 && d == d0 {
                        break;
                    }
                }

                let mut area2 = 0.0;
                let mut has_stub = false;
                for &(v, d) in &cycle {
                    let w = self.verts[v as usize].adj[d].expect("linked edge");
                    let a = &self.verts[v as usize];
                    let b = &self.verts[w as usize];
                    area2 += a.x * b.y - b.x * a.y;
                    if a.adj.iter().flatten().count() == 1 {
                        has_stub = true;
                    }
                }
                if area2 <= EPSILON && !has_stub {
                    continue; // a bounded interior face, not a contour
                }

                let mut pts: Vec<Point3> = Vec::new();
                for &(v, _) in &cycle {
                    let vv = &self.verts[v as usize];
                    if !vv.cl {
                        continue;
                    }
                    let p = Point3::new(vv.x, vv.y, self.z);
                    if pts.last().map_or(true, |q| (q - p).norm() > EPSILON) {
                        pts.push(p);
                    }
                }
                while pts.len() > 1
                    && (pts[0] - pts[pts.len() - 1]).norm() <= EPSILON
                {
                    pts.pop();
                }
                if pts.len() < 3 {
                    continue;
                }
                self.loops.push(pts);
            }
        }
    }

    /// The extracted loops. Each loop is closed implicitly: the last point
    /// connects back to the first.
    pub fn loops(&self) -> &[Vec<Point3>] {
        &self.loops
    }

    /// Consume the weave, returning its loops.
    pub fn into_loops(self) -> Vec<Vec<Point3>> {
        self.loops
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kerf_geom::{CcPoint, CcType, Interval};

    fn cc() -> CcPoint {
        CcPoint::new(Point3::origin(), CcType::EdgePos)
    }

    /// Rectangular region [0,4]x[0,3]: x-fibers at y=0..3, y-fibers at
    /// x=0..4, every interval spanning the full rectangle.
    fn rect_weave() -> Weave {
        let mut w = Weave::new(1.0);
        for yi in 0..4 {
            let y = yi as f64;
            let mut f = Fiber::new(
                Point3::new(-10.0, y, 1.0),
                Point3::new(10.0, y, 1.0),
            )
            .unwrap();
            let lo = f.tval(0.0);
            let hi = f.tval(4.0);
            f.add_interval(Interval::from_bounds(lo, hi, cc(), cc()));
            w.add_fiber(f);
        }
        for xi in 0..5 {
            let x = xi as f64;
            let mut f = Fiber::new(
                Point3::new(x, -10.0, 1.0),
                Point3::new(x, 10.0, 1.0),
            )
            .unwrap();
            let lo = f.tval(0.0);
            let hi = f.tval(3.0);
            f.add_interval(Interval::from_bounds(lo, hi, cc(), cc()));
            w.add_fiber(f);
        }
        w
    }

    #[test]
    fn test_rect_single_loop() {
        let mut w = rect_weave();
        w.build();
        w.face_traverse();
        assert_eq!(w.loops().len(), 1, "one boundary loop");
        let lp = &w.loops()[0];
        // all loop points on the rectangle boundary, at the weave z
        for p in lp {
            assert!((p.z - 1.0).abs() < 1e-12);
            let on_x = p.x.abs() < 1e-9 || (p.x - 4.0).abs() < 1e-9;
            let on_y = p.y.abs() < 1e-9 || (p.y - 3.0).abs() < 1e-9;
            assert!(on_x || on_y, "({}, {}) not on the boundary", p.x, p.y);
        }
        // closed: endpoints adjacent on the boundary; loop has the four
        // corners among its vertices
        assert!(lp.len() >= 4);
    }

    #[test]
    fn test_loop_no_duplicate_closure_point() {
        let mut w = rect_weave();
        w.build();
        w.face_traverse();
        let lp = &w.loops()[0];
        let first = lp.first().unwrap();
        let last = lp.last().unwrap();
        assert!((first.x - last.x).abs() > 1e-12 || (first.y - last.y).abs() > 1e-12);
    }

    #[test]
    fn test_two_islands_two_loops() {
        let mut w = Weave::new(0.0);
        // two disjoint square islands: x in [0,1] and x in [5,6], y in [0,1]
        for yi in 0..2 {
            let y = yi as f64;
            let mut f = Fiber::new(
                Point3::new(-10.0, y, 0.0),
                Point3::new(10.0, y, 0.0),
            )
            .unwrap();
            f.add_interval(Interval::from_bounds(f.tval(0.0), f.tval(1.0), cc(), cc()));
            f.add_interval(Interval::from_bounds(f.tval(5.0), f.tval(6.0), cc(), cc()));
            w.add_fiber(f);
        }
        for &x in &[0.0, 1.0, 5.0, 6.0] {
            let mut f = Fiber::new(
                Point3::new(x, -10.0, 0.0),
                Point3::new(x, 10.0, 0.0),
            )
            .unwrap();
            f.add_interval(Interval::from_bounds(f.tval(0.0), f.tval(1.0), cc(), cc()));
            w.add_fiber(f);
        }
        w.build();
        w.face_traverse();
        assert_eq!(w.loops().len(), 2, "one loop per island");
    }

    #[test]
    fn test_empty_fibers_no_loops() {
        let mut w = Weave::new(0.0);
        let f = Fiber::new(Point3::new(-1.0, 0.0, 0.0), Point3::new(1.0, 0.0, 0.0)).unwrap();
        w.add_fiber(f); // no intervals: ignored
        w.build();
        w.face_traverse();
        assert!(w.loops().is_empty());
    }

    #[test]
    fn test_isolated_segment_dropped() {
        let mut w = Weave::new(0.0);
        let mut f = Fiber::new(Point3::new(-1.0, 0.0, 0.0), Point3::new(1.0, 0.0, 0.0)).unwrap();
        f.add_interval(Interval::from_bounds(0.25, 0.75, cc(), cc()));
        w.add_fiber(f);
        w.build();
        w.face_traverse();
        // a lone segment has only two CL vertices: not a loop
        assert!(w.loops().is_empty());
    }

    #[test]
    fn test_zero_length_interval_dropped() {
        let mut w = Weave::new(0.0);
        let mut f = Fiber::new(Point3::new(-1.0, 0.0, 0.0), Point3::new(1.0, 0.0, 0.0)).unwrap();
        f.add_interval(Interval::from_bounds(0.5, 0.5, cc(), cc()));
        w.add_fiber(f);
        w.build();
        w.face_traverse();
        assert!(w.loops().is_empty());
        assert!(w.xsegs.is_empty());
    }
}
