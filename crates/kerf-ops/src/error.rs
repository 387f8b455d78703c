//! Error types for toolpath operations.

use thiserror::Error;

/// Errors from configuring or running an operation.
///
/// Validation failures are returned synchronously before any work starts;
/// a running batch prefers partial completion and reports skipped
/// anomalies through its counter instead of failing.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OpError {
    /// A parameter outside its documented domain.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The surface has no (non-degenerate) triangles.
    #[error("surface has no triangles")]
    EmptySurface,

    /// The guide path has no spans.
    #[error("guide path is empty")]
    EmptyPath,

    /// The cutter fails its shape invariants.
    #[error("degenerate cutter: {0}")]
    DegenerateCutter(#[from] kerf_cutters::CutterError),
}

impl From<kerf_geom::GeomError> for OpError {
    fn from(e: kerf_geom::GeomError) -> Self {
        match e {
            kerf_geom::GeomError::EmptyPath => OpError::EmptyPath,
            other => OpError::InvalidInput(other.to_string()),
        }
    }
}

/// Result type for operations.
pub type Result<T> = std::result::Result<T, OpError>;
