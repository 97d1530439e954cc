use crate::error::ConfigurationError;

/// Minimum number of candidate points the seed sampler examines before giving up.
pub const MIN_SAMPLING_ATTEMPTS: usize = 100_000;

/// Candidate points examined per requested seed when no explicit cap is set.
pub const SAMPLING_ATTEMPTS_PER_CELL: usize = 1_000;

/// Parameters of a tessellation run.
#[derive(Clone, Debug, PartialEq)]
pub struct TessellationConfig {
    /// Number of Voronoi cells (seed points).
    pub number_of_cells: usize,
    /// Scale factor (> 1.0) applied to the largest mesh extent to size the closure box.
    pub aabb_scale: f64,
    /// Upper bound on candidate points drawn by the seed sampler.
    /// `None` resolves to [`TessellationConfig::sampling_attempts`].
    pub max_sampling_attempts: Option<usize>,
    /// Fixed RNG seed for reproducible seed sampling.
    pub rng_seed: Option<u64>,
}

impl Default for TessellationConfig {
    fn default() -> Self {
        Self {
            number_of_cells: 1,
            aabb_scale: 2.0,
            max_sampling_attempts: None,
            rng_seed: None,
        }
    }
}

impl TessellationConfig {
    pub fn new(number_of_cells: usize, aabb_scale: f64) -> Self {
        Self {
            number_of_cells,
            aabb_scale,
            ..Self::default()
        }
    }

    pub fn with_max_sampling_attempts(mut self, attempts: usize) -> Self {
        self.max_sampling_attempts = Some(attempts);
        self
    }

    pub fn with_rng_seed(mut self, seed: u64) -> Self {
        self.rng_seed = Some(seed);
        self
    }

    /// Checks every field. Called before any work on the mesh starts.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.number_of_cells < 1 {
            return Err(ConfigurationError::InvalidCellCount(self.number_of_cells));
        }
        // NaN fails this comparison too.
        if !(self.aabb_scale.is_finite() && self.aabb_scale > 1.0) {
            return Err(ConfigurationError::InvalidAabbScale(self.aabb_scale));
        }
        if self.max_sampling_attempts == Some(0) {
            return Err(ConfigurationError::InvalidSamplingAttempts);
        }
        Ok(())
    }

    /// The effective retry cap for seed sampling.
    pub fn sampling_attempts(&self) -> usize {
        self.max_sampling_attempts.unwrap_or_else(|| {
            self.number_of_cells
                .saturating_mul(SAMPLING_ATTEMPTS_PER_CELL)
                .max(MIN_SAMPLING_ATTEMPTS)
        })
    }
}
