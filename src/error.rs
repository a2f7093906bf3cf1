use thiserror::Error;

/// Error describes why a loop is invalid or why a decode operation failed.
///
/// Validation errors are reported, never thrown: `find_validation_error`
/// returns one of the validation variants and leaves the loop untouched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A vertex is not unit length within the numeric tolerance.
    #[error("vertex {0} is not unit length")]
    NotUnitLength(usize),

    /// A loop that is neither empty nor full has fewer than 3 vertices.
    #[error("non-empty, non-full loops must have at least 3 vertices")]
    NotEnoughVertices,

    /// An edge is degenerate because two adjacent vertices are identical.
    #[error("edge {0} is degenerate (duplicate vertex)")]
    DuplicateVertices(usize),

    /// Two non-adjacent edges intersect, possibly at a shared vertex.
    #[error("edges {0} and {1} cross")]
    SelfIntersection(usize, usize),

    /// A decode operation failed: truncated buffer, unknown version, vertex
    /// count over the configured limit, or a nested codec error.
    #[error("decode failed: {0}")]
    Decode(&'static str),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
