//! Error types for geometry construction.

use thiserror::Error;

/// Errors from constructing geometric primitives.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeomError {
    /// Triangle with (near-)zero area.
    #[error("triangle has zero area")]
    DegenerateTriangle,

    /// Fiber endpoints coincide or differ in more than one of x and y.
    #[error("fiber endpoints must differ in exactly one of x or y at fixed z")]
    DegenerateFiber,

    /// Path span whose start does not coincide with the previous span's end.
    #[error("span does not connect to the end of the previous span")]
    DisconnectedSpan,

    /// Arc parameters that do not describe a circular arc.
    #[error("invalid arc: {0}")]
    InvalidArc(String),

    /// Non-positive sampling distance.
    #[error("sampling distance must be positive")]
    InvalidSampling,

    /// Operation on an empty path.
    #[error("path is empty")]
    EmptyPath,
}

/// Result type for geometry operations.
pub type Result<T> = std::result::Result<T, GeomError>;
