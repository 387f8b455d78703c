//! Batch drop-cutter: drop many CL points onto a surface in parallel.

use std::sync::Arc;

use rayon::prelude::*;

use kerf_cutters::Cutter;
use kerf_geom::{CcType, ClPoint, Projection, Surface};
use kerf_index::{KdTree, TriangleIndex};

use crate::error::{OpError, Result};

/// Minimum number of points a parallel task processes.
const DEFAULT_GRAIN: usize = 256;

/// Drops a batch of CL points onto a surface.
///
/// Points are accumulated with [`append`](Self::append) and processed by
/// [`run`](Self::run); the output order mirrors the input order. Each point
/// is independent, so the parallel path needs no locks; the drop-call
/// counter is a reduction over per-task counts.
pub struct BatchDropCutter {
    index: Arc<KdTree>,
    cutter: Cutter,
    clpoints: Vec<ClPoint>,
    calls: usize,
    anomalies: usize,
    /// Use the parallel path (default). The serial path remains available
    /// for debugging.
    pub parallel: bool,
    grain: usize,
}

impl BatchDropCutter {
    /// Build the operation and its XY spatial index.
    pub fn new(surface: Arc<Surface>, cutter: Cutter, bucket_size: usize) -> Result<Self> {
        cutter.validate()?;
        if surface.is_empty() {
            return Err(OpError::EmptySurface);
        }
        if bucket_size < 1 {
            return Err(OpError::InvalidInput("bucket_size must be at least 1".into()));
        }
        let index = Arc::new(KdTree::build(surface, Projection::Xy, bucket_size));
        Ok(Self {
            index,
            cutter,
            clpoints: Vec::new(),
            calls: 0,
            anomalies: 0,
            parallel: true,
            grain: DEFAULT_GRAIN,
        })
    }

    /// Append one CL point to the batch.
    pub fn append(&mut self, cl: ClPoint) {
        self.clpoints.push(cl);
    }

    /// Append many CL points.
    pub fn append_points<I: IntoIterator<Item = ClPoint>>(&mut self, points: I) {
        self.clpoints.extend(points);
    }

    /// The accumulated (and, after `run`, dropped) points in input order.
    pub fn points(&self) -> &[ClPoint] {
        &self.clpoints
    }

    /// Move the result points out of the operation.
    pub fn take_points(&mut self) -> Vec<ClPoint> {
        std::mem::take(&mut self.clpoints)
    }

    /// Number of drop-cutter primitive calls in the last run.
    pub fn calls(&self) -> usize {
        self.calls
    }

    /// Number of contacts dropped as algorithmic anomalies in the last run.
    pub fn anomalies(&self) -> usize {
        self.anomalies
    }

    /// Clear accumulated points and counters.
    pub fn reset(&mut self) {
        self.clpoints.clear();
        self.calls = 0;
        self.anomalies = 0;
    }

    /// Drop every accumulated point.
    pub fn run(&mut self) -> Result<()> {
        let index = self.index.clone();
        let cutter = self.cutter.clone();
        let grain = self.grain.max(1);

        let (calls, anomalies) = if self.parallel {
            self.clpoints
                .par_iter_mut()
                .with_min_len(grain)
                .map_init(
                    || Vec::with_capacity(64),
                    |scratch, cl| drop_single(index.as_ref(), &cutter, cl, scratch),
                )
                .reduce(|| (0, 0), |a, b| (a.0 + b.0, a.1 + b.1))
        } else {
            let mut scratch = Vec::with_capacity(64);
            let mut totals = (0, 0);
            for cl in &mut self.clpoints {
                let (c, a) = drop_single(index.as_ref(), &cutter, cl, &mut scratch);
                totals.0 += c;
                totals.1 += a;
            }
            totals
        };
        self.calls = calls;
        self.anomalies = anomalies;
        Ok(())
    }
}

/// Drop one CL point against every candidate triangle under the cutter.
///
/// Shared by the batch and path drop operations.
pub(crate) fn drop_single(
    index: &KdTree,
    cutter: &Cutter,
    cl: &mut ClPoint,
    scratch: &mut Vec<u32>,
) -> (usize, usize) {
    scratch.clear();
    index.query_into(&cutter.query_box(cl), scratch);
    let surface = index.surface();
    let mut calls = 0;
    let mut anomalies = 0;
    for &id in scratch.iter() {
        let t = surface.triangle(id as usize);
        if cutter.overlaps(cl, t) && cl.below(t) {
            let before = *cl;
            cutter.drop_cutter(cl, t);
            calls += 1;
            if cl.cc.ctype == CcType::Error {
                // a contact the kernel flagged as inconsistent is dropped;
                // the rest of the batch proceeds
                *cl = before;
                anomalies += 1;
            }
        }
    }
    (calls, anomalies)
}
