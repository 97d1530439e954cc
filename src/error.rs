//! Error types for the tessellation pipeline.
//!
//! Only [`TessellationError`] ever reaches the caller. The per-cell and
//! per-shell errors are recovered inside the orchestrator and surface as
//! log events and as entries in the [`TessellationReport`](crate::TessellationReport).

use thiserror::Error;

/// Result type alias for tessellation operations.
pub type Result<T> = std::result::Result<T, TessellationError>;

/// Fatal errors that abort a tessellation run before any cell is built.
#[derive(Debug, Error)]
pub enum TessellationError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// The rejection sampler hit its retry cap before collecting enough seeds.
    #[error(
        "seed sampling exhausted after {attempts} candidates: found {found} of {requested} interior points"
    )]
    SamplingExhausted {
        requested: usize,
        found: usize,
        attempts: usize,
    },

    #[error("input mesh has no triangles")]
    EmptyMesh,

    #[error("seed {index} has a non-finite coordinate")]
    InvalidSeed { index: usize },
}

/// Invalid user configuration. Raised before any sampling happens.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigurationError {
    #[error("number_of_cells must be >= 1, got {0}")]
    InvalidCellCount(usize),

    #[error("aabb_scale must be > 1.0 to safely close infinite Voronoi regions, got {0}")]
    InvalidAabbScale(f64),

    #[error("max_sampling_attempts must be >= 1")]
    InvalidSamplingAttempts,
}

/// Why a bounded Voronoi cell could not be solved.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CellError {
    #[error("half-space intersection failed")]
    HalfSpaceIntersection,

    #[error("degenerate cell ({vertices} vertices)")]
    Degenerate { vertices: usize },

    #[error("convex hull construction failed")]
    ConvexHull,
}

/// Why clipping a cell against a single shell failed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClipError {
    #[error("clipped geometry contains non-finite coordinates")]
    NonFinite,

    #[error("shell has no non-degenerate triangles")]
    EmptyShell,
}

/// Why a seed produced no output cell.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CellDiscard {
    #[error(transparent)]
    Cell(#[from] CellError),

    #[error("does not intersect any shell")]
    NoShellIntersection,

    #[error("cancelled")]
    Cancelled,
}
