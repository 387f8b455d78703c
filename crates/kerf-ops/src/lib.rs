#![warn(missing_docs)]

//! Toolpath operations for the kerf CAM kernel.
//!
//! The top-level entry points of the library: each operation owns a spatial
//! index built from a shared [`Surface`](kerf_geom::Surface), a cutter, and
//! an input batch, and emits CL points, fibers or loops.
//!
//! - [`BatchDropCutter`] drops a batch of CL points (parallel).
//! - [`BatchPushCutter`] pushes the cutter along a batch of same-direction
//!   fibers (parallel).
//! - [`PathDropCutter`] / [`AdaptivePathDropCutter`] drop the cutter along
//!   a sampled guide path.
//! - [`Waterline`] computes closed z-contours via fiber pushes and the
//!   [`Weave`].
//!
//! Operations report failures as [`OpError`] values before any work starts;
//! running batches prefer partial completion, counting skipped anomalies
//! instead of aborting.

mod batch_drop;
mod batch_push;
mod error;
mod path_drop;
mod waterline;
mod weave;

pub use batch_drop::BatchDropCutter;
pub use batch_push::BatchPushCutter;
pub use error::{OpError, Result};
pub use path_drop::{AdaptivePathDropCutter, PathDropCutter};
pub use waterline::Waterline;
pub use weave::Weave;
