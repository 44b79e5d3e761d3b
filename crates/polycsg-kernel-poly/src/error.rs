//! Error types for the polyhedron engine.

use thiserror::Error;

/// Errors raised while loading or validating a [`PolyConfig`](crate::PolyConfig).
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A tolerance that must be strictly positive was not.
    #[error("{field} must be positive and finite, got {value}")]
    NonPositive {
        /// Name of the offending field.
        field: &'static str,
        /// The rejected value.
        value: f64,
    },

    /// An octree split threshold or depth limit was zero.
    #[error("{field} must be greater than zero")]
    ZeroThreshold {
        /// Name of the offending field.
        field: &'static str,
    },

    /// The octree slack factor would shrink the root region.
    #[error("octree slack factor must be >= 1.0, got {0}")]
    InvalidSlack(f64),

    /// The TOML document could not be parsed.
    #[error("invalid config document: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Errors that can occur while building, querying or mutating a polyhedron.
#[derive(Error, Debug)]
pub enum PolyError {
    /// No face survived connectivity building.
    #[error("input has no usable faces")]
    EmptyInput,

    /// A manifold id was out of range.
    #[error("manifold {id} out of range (polyhedron has {count} manifolds)")]
    InvalidManifold {
        /// The requested manifold id.
        id: u32,
        /// Number of manifolds in the polyhedron.
        count: usize,
    },

    /// A per-manifold mask had the wrong length.
    #[error("manifold mask has {actual} entries, expected {expected}")]
    MaskLength {
        /// Number of manifolds.
        expected: usize,
        /// Length of the supplied mask.
        actual: usize,
    },

    /// A transform produced a NaN or infinite coordinate.
    #[error("transform produced a non-finite coordinate at vertex {vertex}")]
    InvalidCoordinate {
        /// Index of the first offending vertex.
        vertex: usize,
    },

    /// A flat face/vertex encoding was truncated or inconsistent.
    #[error("malformed flat encoding: {0}")]
    MalformedEncoding(String),

    /// The configuration was rejected.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Result type for polyhedron operations.
pub type PolyResult<T> = std::result::Result<T, PolyError>;
