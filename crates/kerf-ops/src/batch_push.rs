//! Batch push-cutter: sweep the cutter along many fibers in parallel.

use std::sync::Arc;

use rayon::prelude::*;

use kerf_cutters::Cutter;
use kerf_geom::{Bbox, Fiber, FiberDir, Point3, Projection, Surface};
use kerf_index::{KdTree, TriangleIndex};

use crate::error::{OpError, Result};

/// Minimum number of fibers a parallel task processes.
const DEFAULT_GRAIN: usize = 16;

/// Pushes the cutter along a batch of same-direction fibers.
///
/// Each fiber's interval list is written by exactly one task, so the
/// parallel path needs no locking.
pub struct BatchPushCutter {
    index: Arc<KdTree>,
    cutter: Cutter,
    dir: FiberDir,
    fibers: Vec<Fiber>,
    calls: usize,
    anomalies: usize,
    /// Use the parallel path (default).
    pub parallel: bool,
    grain: usize,
}

impl BatchPushCutter {
    /// Build the operation and its projected spatial index: x-fibers query
    /// the YZ plane, y-fibers the XZ plane.
    pub fn new(
        surface: Arc<Surface>,
        cutter: Cutter,
        dir: FiberDir,
        bucket_size: usize,
    ) -> Result<Self> {
        cutter.validate()?;
        if surface.is_empty() {
            return Err(OpError::EmptySurface);
        }
        if bucket_size < 1 {
            return Err(OpError::InvalidInput("bucket_size must be at least 1".into()));
        }
        let proj = match dir {
            FiberDir::X => Projection::Yz,
            FiberDir::Y => Projection::Xz,
        };
        let index = Arc::new(KdTree::build(surface, proj, bucket_size));
        Ok(Self {
            index,
            cutter,
            dir,
            fibers: Vec::new(),
            calls: 0,
            anomalies: 0,
            parallel: true,
            grain: DEFAULT_GRAIN,
        })
    }

    /// Fiber direction of this batch.
    pub fn dir(&self) -> FiberDir {
        self.dir
    }

    /// Append a fiber; its direction must match the batch direction.
    pub fn append_fiber(&mut self, fiber: Fiber) -> Result<()> {
        if fiber.dir() != self.dir {
            return Err(OpError::InvalidInput(
                "fiber direction does not match the batch direction".into(),
            ));
        }
        self.fibers.push(fiber);
        Ok(())
    }

    /// The fibers, with interval lists filled in after `run`.
    pub fn fibers(&self) -> &[Fiber] {
        &self.fibers
    }

    /// Move the fibers out of the operation.
    pub fn take_fibers(&mut self) -> Vec<Fiber> {
        std::mem::take(&mut self.fibers)
    }

    /// Number of push-cutter primitive calls in the last run.
    pub fn calls(&self) -> usize {
        self.calls
    }

    /// Number of contacts dropped as algorithmic anomalies in the last run.
    pub fn anomalies(&self) -> usize {
        self.anomalies
    }

    /// Clear accumulated fibers and counters.
    pub fn reset(&mut self) {
        self.fibers.clear();
        self.calls = 0;
        self.anomalies = 0;
    }

    /// Push the cutter along every accumulated fiber.
    pub fn run(&mut self) -> Result<()> {
        let index = self.index.clone();
        let cutter = self.cutter.clone();
        let (calls, anomalies) = push_fibers(
            index.as_ref(),
            &cutter,
            &mut self.fibers,
            self.parallel,
            self.grain,
        );
        self.calls = calls;
        self.anomalies = anomalies;
        Ok(())
    }
}

/// Run the push primitive for a slice of fibers against an index.
///
/// Also used by the waterline operation, which submits per-z fiber sets
/// against shared indices.
pub(crate) fn push_fibers(
    index: &KdTree,
    cutter: &Cutter,
    fibers: &mut [Fiber],
    parallel: bool,
    grain: usize,
) -> (usize, usize) {
    if parallel {
        fibers
            .par_iter_mut()
            .with_min_len(grain.max(1))
            .map_init(
                || Vec::with_capacity(64),
                |scratch, fiber| push_single(index, cutter, fiber, scratch),
            )
            .reduce(|| (0, 0), |a, b| (a.0 + b.0, a.1 + b.1))
    } else {
        let mut scratch = Vec::with_capacity(64);
        let mut totals = (0, 0);
        for fiber in fibers.iter_mut() {
            let (c, a) = push_single(index, cutter, fiber, &mut scratch);
            totals.0 += c;
            totals.1 += a;
        }
        totals
    }
}

fn push_single(
    index: &KdTree,
    cutter: &Cutter,
    fiber: &mut Fiber,
    scratch: &mut Vec<u32>,
) -> (usize, usize) {
    scratch.clear();
    index.query_into(&fiber_query_box(cutter, fiber), scratch);
    let surface = index.surface();
    let mut calls = 0;
    let mut anomalies = 0;
    for &id in scratch.iter() {
        let t = surface.triangle(id as usize);
        if let Some(interval) = cutter.push_cutter(fiber, t) {
            if interval.lower.is_finite() && interval.upper.is_finite() {
                fiber.add_interval(interval);
            } else {
                // an inconsistent contact is dropped; the batch proceeds
                anomalies += 1;
            }
        }
        calls += 1;
    }
    (calls, anomalies)
}

/// Swept-cutter footprint of a fiber, for the conservative index query.
fn fiber_query_box(cutter: &Cutter, fiber: &Fiber) -> Bbox {
    let r = cutter.radius();
    let z = fiber.z();
    let mut bb = Bbox::new(*fiber.p1(), *fiber.p2());
    bb.extend(&Point3::new(
        fiber.p1().x - r,
        fiber.p1().y - r,
        z - cutter.bottom_offset(),
    ));
    bb.extend(&Point3::new(
        fiber.p2().x + r,
        fiber.p2().y + r,
        z + cutter.length(),
    ));
    bb
}
