//! Path drop-cutter: drop the cutter along a sampled guide path.

use std::sync::Arc;

use kerf_cutters::Cutter;
use kerf_geom::{xy_distance, ClPoint, Path, Projection, Surface};
use kerf_index::KdTree;

use crate::batch_drop::drop_single;
use crate::error::{OpError, Result};

/// Drops the cutter at arc-length samples of a guide path.
///
/// Samples are ordered along the path, so they run serially against a
/// shared index instead of going through the batch engine.
pub struct PathDropCutter {
    index: Arc<KdTree>,
    cutter: Cutter,
    sampling: f64,
    min_z: f64,
    points: Vec<ClPoint>,
    calls: usize,
    anomalies: usize,
}

impl PathDropCutter {
    /// Build the operation and its XY spatial index.
    pub fn new(surface: Arc<Surface>, cutter: Cutter, sampling: f64) -> Result<Self> {
        cutter.validate()?;
        if surface.is_empty() {
            return Err(OpError::EmptySurface);
        }
        if sampling <= 0.0 {
            return Err(OpError::InvalidInput("sampling must be positive".into()));
        }
        let index = Arc::new(KdTree::build(surface, Projection::Xy, 8));
        Ok(Self {
            index,
            cutter,
            sampling,
            min_z: f64::NEG_INFINITY,
            points: Vec::new(),
            calls: 0,
            anomalies: 0,
        })
    }

    /// Lower z bound the samples start from (default negative infinity).
    pub fn set_min_z(&mut self, min_z: f64) {
        self.min_z = min_z;
    }

    /// The CL points produced by the last run, in path order.
    pub fn points(&self) -> &[ClPoint] {
        &self.points
    }

    /// Move the result points out of the operation.
    pub fn take_points(&mut self) -> Vec<ClPoint> {
        std::mem::take(&mut self.points)
    }

    /// Number of drop-cutter primitive calls in the last run.
    pub fn calls(&self) -> usize {
        self.calls
    }

    /// Number of contacts dropped as algorithmic anomalies in the last run.
    pub fn anomalies(&self) -> usize {
        self.anomalies
    }

    /// Clear results and counters.
    pub fn reset(&mut self) {
        self.points.clear();
        self.calls = 0;
        self.anomalies = 0;
    }

    /// Sample the path and drop the cutter at every sample.
    pub fn run(&mut self, path: &Path) -> Result<&[ClPoint]> {
        if path.is_empty() {
            return Err(OpError::EmptyPath);
        }
        let samples = path.sample(self.sampling)?;
        self.points.clear();
        self.points.reserve(samples.len());
        let mut scratch = Vec::with_capacity(64);
        for p in samples {
            let mut cl = ClPoint::new(p.x, p.y, self.min_z);
            let (c, a) = drop_single(self.index.as_ref(), &self.cutter, &mut cl, &mut scratch);
            self.calls += c;
            self.anomalies += a;
            self.points.push(cl);
        }
        Ok(&self.points)
    }
}

/// Path drop-cutter with recursive midpoint refinement.
///
/// Between consecutive samples whose z difference exceeds `z_jump` or
/// whose contact types disagree, a midpoint is dropped and the two halves
/// are refined further, until the sample spacing falls below
/// `min_sampling`.
pub struct AdaptivePathDropCutter {
    inner: PathDropCutter,
    min_sampling: f64,
    z_jump: f64,
}

impl AdaptivePathDropCutter {
    /// Build the adaptive operation.
    pub fn new(
        surface: Arc<Surface>,
        cutter: Cutter,
        sampling: f64,
        min_sampling: f64,
        z_jump: f64,
    ) -> Result<Self> {
        if min_sampling <= 0.0 {
            return Err(OpError::InvalidInput("min_sampling must be positive".into()));
        }
        if z_jump <= 0.0 {
            return Err(OpError::InvalidInput("z_jump must be positive".into()));
        }
        Ok(Self {
            inner: PathDropCutter::new(surface, cutter, sampling)?,
            min_sampling,
            z_jump,
        })
    }

    /// Lower z bound the samples start from.
    pub fn set_min_z(&mut self, min_z: f64) {
        self.inner.set_min_z(min_z);
    }

    /// The refined CL points of the last run, in path order.
    pub fn points(&self) -> &[ClPoint] {
        self.inner.points()
    }

    /// Number of drop-cutter primitive calls in the last run.
    pub fn calls(&self) -> usize {
        self.inner.calls()
    }

    /// Clear results and counters.
    pub fn reset(&mut self) {
        self.inner.reset();
    }

    /// Run the plain sampling, then refine between rough neighbors.
    pub fn run(&mut self, path: &Path) -> Result<&[ClPoint]> {
        self.inner.run(path)?;
        let coarse = std::mem::take(&mut self.inner.points);
        let mut refined = Vec::with_capacity(coarse.len());
        let mut scratch = Vec::with_capacity(64);
        for pair in coarse.windows(2) {
            refined.push(pair[0]);
            self.subdivide(&pair[0], &pair[1], &mut refined, &mut scratch, 0);
        }
        if let Some(last) = coarse.last() {
            refined.push(*last);
        }
        self.inner.points = refined;
        Ok(self.inner.points())
    }

    fn needs_split(&self, a: &ClPoint, b: &ClPoint) -> bool {
        (a.pos.z - b.pos.z).abs() > self.z_jump || a.cc.ctype != b.cc.ctype
    }

    fn subdivide(
        &mut self,
        a: &ClPoint,
        b: &ClPoint,
        out: &mut Vec<ClPoint>,
        scratch: &mut Vec<u32>,
        depth: usize,
    ) {
        // recursion floor guards degenerate inputs
        if depth > 32 {
            return;
        }
        if xy_distance(&a.pos, &b.pos) <= self.min_sampling || !self.needs_split(a, b) {
            return;
        }
        let mx = 0.5 * (a.pos.x + b.pos.x);
        let my = 0.5 * (a.pos.y + b.pos.y);
        let mut mid = ClPoint::new(mx, my, self.inner.min_z);
        let (c, an) = drop_single(
            self.inner.index.as_ref(),
            &self.inner.cutter,
            &mut mid,
            scratch,
        );
        self.inner.calls += c;
        self.inner.anomalies += an;
        self.subdivide(a, &mid, out, scratch, depth + 1);
        out.push(mid);
        self.subdivide(&mid, b, out, scratch, depth + 1);
    }
}
