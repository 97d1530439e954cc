//! Rejection sampling of seed points inside a mesh's enclosed volume.

use rand::Rng;
use rayon::prelude::*;
use tracing::{debug, info};

use crate::error::{Result, TessellationError};
use crate::mesh::TriMesh;

/// Candidates drawn per round, as a multiple of the requested seed count.
pub const BATCH_FACTOR: usize = 5;

/// Draws `count` points inside `mesh`.
///
/// Candidates are drawn uniformly in the mesh's bounding box in batches of
/// `BATCH_FACTOR * count` and kept when [`TriMesh::contains`] accepts them.
/// At most `max_attempts` candidates are examined; a mesh that encloses no
/// volume fails with [`TessellationError::SamplingExhausted`].
pub fn sample_seeds<R: Rng>(
    mesh: &TriMesh,
    count: usize,
    max_attempts: usize,
    rng: &mut R,
) -> Result<Vec<[f64; 3]>> {
    let bounds = mesh.bounds().ok_or(TessellationError::EmptyMesh)?;
    let extent = bounds.extent();
    let batch_size = (count * BATCH_FACTOR).max(1);

    info!(count, max_attempts, "sampling seeds");

    let mut seeds: Vec<[f64; 3]> = Vec::with_capacity(count);
    let mut attempts = 0;
    let mut candidates: Vec<[f64; 3]> = Vec::with_capacity(batch_size);

    while seeds.len() < count && attempts < max_attempts {
        let n = batch_size.min(max_attempts - attempts);
        attempts += n;

        candidates.clear();
        for _ in 0..n {
            candidates.push([
                bounds.min[0] + rng.r#gen::<f64>() * extent[0],
                bounds.min[1] + rng.r#gen::<f64>() * extent[1],
                bounds.min[2] + rng.r#gen::<f64>() * extent[2],
            ]);
        }

        let inside: Vec<bool> = candidates
            .par_iter()
            .map(|p| mesh.contains_unchecked(p))
            .collect();

        let before = seeds.len();
        seeds.extend(
            candidates
                .iter()
                .zip(inside)
                .filter_map(|(p, keep)| keep.then_some(*p))
                .take(count - before),
        );
        debug!(accepted = seeds.len() - before, drawn = n, "sampling batch");
    }

    if seeds.len() < count {
        return Err(TessellationError::SamplingExhausted {
            requested: count,
            found: seeds.len(),
            attempts,
        });
    }

    info!(count, attempts, "seed sampling finished");
    Ok(seeds)
}
