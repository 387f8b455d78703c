//! Waterline: closed contours where the cutter side grazes the surface at
//! fixed z-heights.

use std::sync::Arc;

use rayon::prelude::*;

use kerf_cutters::Cutter;
use kerf_geom::{Fiber, Point3, Projection, Surface};
use kerf_index::KdTree;

use crate::batch_push::push_fibers;
use crate::error::{OpError, Result};
use crate::weave::Weave;

/// Minimum number of fibers a parallel push task processes.
const PUSH_GRAIN: usize = 16;

/// Computes waterline contours of a surface.
///
/// Per z-height: an x/y fiber grid over the surface's xy extent inflated by
/// twice the cutter radius is pushed against the surface (the two
/// directions in parallel), then the resulting intervals are woven into
/// closed loops.
pub struct Waterline {
    surface: Arc<Surface>,
    cutter: Cutter,
    sampling: f64,
    x_index: Arc<KdTree>,
    y_index: Arc<KdTree>,
    /// Use the parallel path (default).
    pub parallel: bool,
    calls: usize,
    loops: Vec<Vec<Point3>>,
}

impl Waterline {
    /// Build the operation and its two projected spatial indices.
    pub fn new(
        surface: Arc<Surface>,
        cutter: Cutter,
        sampling: f64,
        bucket_size: usize,
    ) -> Result<Self> {
        cutter.validate()?;
        if surface.is_empty() {
            return Err(OpError::EmptySurface);
        }
        if sampling <= 0.0 {
            return Err(OpError::InvalidInput("sampling must be positive".into()));
        }
        if bucket_size < 1 {
            return Err(OpError::InvalidInput("bucket_size must be at least 1".into()));
        }
        let x_index = Arc::new(KdTree::build(surface.clone(), Projection::Yz, bucket_size));
        let y_index = Arc::new(KdTree::build(surface.clone(), Projection::Xz, bucket_size));
        Ok(Self {
            surface,
            cutter,
            sampling,
            x_index,
            y_index,
            parallel: true,
            calls: 0,
            loops: Vec::new(),
        })
    }

    /// Loops from the last `run`.
    pub fn loops(&self) -> &[Vec<Point3>] {
        &self.loops
    }

    /// Number of push-cutter primitive calls in the last run.
    pub fn calls(&self) -> usize {
        self.calls
    }

    /// Clear accumulated results.
    pub fn reset(&mut self) {
        self.loops.clear();
        self.calls = 0;
    }

    /// Compute the waterline at a single z-height.
    pub fn run(&mut self, z: f64) -> Result<&[Vec<Point3>]> {
        let (loops, calls) = self.run_z(z);
        self.loops = loops;
        self.calls = calls;
        Ok(&self.loops)
    }

    /// Compute waterlines for an ascending list of z-heights.
    ///
    /// The output preserves the input order: one loop list per z. Weaves
    /// for different heights are built in parallel.
    pub fn run_multi(&mut self, zheights: &[f64]) -> Result<Vec<Vec<Vec<Point3>>>> {
        if zheights.is_empty() {
            return Err(OpError::InvalidInput("no z-heights given".into()));
        }
        if zheights.windows(2).any(|w| w[1] <= w[0]) {
            return Err(OpError::InvalidInput(
                "z-heights must be strictly ascending".into(),
            ));
        }
        let results: Vec<(Vec<Vec<Point3>>, usize)> = if self.parallel {
            zheights.par_iter().map(|&z| self.run_z(z)).collect()
        } else {
            zheights.iter().map(|&z| self.run_z(z)).collect()
        };
        self.calls = results.iter().map(|(_, c)| c).sum();
        let mut out = Vec::with_capacity(results.len());
        for (loops, _) in results {
            out.push(loops);
        }
        self.loops = out.last().cloned().unwrap_or_default();
        Ok(out)
    }

    /// One z-height: generate fibers, push both directions, weave.
    fn run_z(&self, z: f64) -> (Vec<Vec<Point3>>, usize) {
        let (mut xfibers, mut yfibers) = self.generate_fibers(z);
        let (cx, cy) = if self.parallel {
            rayon::join(
                || {
                    push_fibers(
                        self.x_index.as_ref(),
                        &self.cutter,
                        &mut xfibers,
                        true,
                        PUSH_GRAIN,
                    )
                },
                || {
                    push_fibers(
                        self.y_index.as_ref(),
                        &self.cutter,
                        &mut yfibers,
                        true,
                        PUSH_GRAIN,
                    )
                },
            )
        } else {
            (
                push_fibers(
                    self.x_index.as_ref(),
                    &self.cutter,
                    &mut xfibers,
                    false,
                    PUSH_GRAIN,
                ),
                push_fibers(
                    self.y_index.as_ref(),
                    &self.cutter,
                    &mut yfibers,
                    false,
                    PUSH_GRAIN,
                ),
            )
        };

        let mut weave = Weave::new(z);
        for f in xfibers {
            weave.add_fiber(f);
        }
        for f in yfibers {
            weave.add_fiber(f);
        }
        weave.build();
        weave.face_traverse();
        (weave.into_loops(), cx.0 + cy.0)
    }

    /// Axis-aligned fiber grids over the inflated xy extent of the surface.
    fn generate_fibers(&self, z: f64) -> (Vec<Fiber>, Vec<Fiber>) {
        let bb = self.surface.bbox();
        let r2 = 2.0 * self.cutter.radius();
        let minx = bb.min.x - r2;
        let maxx = bb.max.x + r2;
        let miny = bb.min.y - r2;
        let maxy = bb.max.y + r2;

        let mut xfibers = Vec::new();
        for y in generate_range(miny, maxy, self.sampling) {
            let p1 = Point3::new(minx, y, z);
            let p2 = Point3::new(maxx, y, z);
            if let Ok(f) = Fiber::new(p1, p2) {
                xfibers.push(f);
            }
        }
        let mut yfibers = Vec::new();
        for x in generate_range(minx, maxx, self.sampling) {
            let p1 = Point3::new(x, miny, z);
            let p2 = Point3::new(x, maxy, z);
            if let Ok(f) = Fiber::new(p1, p2) {
                yfibers.push(f);
            }
        }
        (xfibers, yfibers)
    }
}

/// Evenly spaced values covering [start, end] at roughly `sampling` pitch.
fn generate_range(start: f64, end: f64, sampling: f64) -> Vec<f64> {
    let n = ((end - start) / sampling).max(1.0) as usize;
    let d = (end - start) / n as f64;
    (0..=n).map(|k| start + k as f64 * d).collect()
}
