//! Half-spaces and the bisector system of a seed.
//!
//! A half-space is the set `{ x : a·x + d <= 0 }`. The bisector half-space of
//! seeds `p_i` and `p_j` holds every point at least as close to `p_i` as to
//! `p_j`:
//!
//! ```text
//! |x - p_i|^2 <= |x - p_j|^2   <=>   2(p_j - p_i)·x - (|p_j|^2 - |p_i|^2) <= 0
//! ```
//!
//! ## Epsilon policy
//!
//! Neighbouring cells share their bisector plane exactly. Both cells are
//! clipped and hulled independently, so floating-point evaluation on that
//! shared plane would otherwise leave micro gaps or micro overlaps. Every
//! bisector is therefore moved towards its own seed by
//!
//! ```text
//! eps = EPSILON_SHIFT_FACTOR * f64::EPSILON * (|a| * max_extent + |d|)
//! ```
//!
//! which is scaled to the magnitude of the coefficients involved. The factor
//! is empirical; see `DESIGN.md` for its validation status at extreme scales.

use crate::geometry::{dot, length, sub};

/// Multiplier on machine epsilon for the bisector shift.
pub const EPSILON_SHIFT_FACTOR: f64 = 1e4;

/// A linear inequality `normal·x + offset <= 0`.
///
/// `id` names the plane that produced it: the index of the other seed for a
/// bisector, or a negative [`box_side`](crate::bounds::box_side) ID for a
/// closure face.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HalfSpace {
    pub normal: [f64; 3],
    pub offset: f64,
    pub id: i32,
}

impl HalfSpace {
    pub fn new(normal: [f64; 3], offset: f64, id: i32) -> Self {
        Self { normal, offset, id }
    }

    /// Bisector half-space of `p_i` against `p_j`, with the inward shift applied.
    pub fn bisector(p_i: &[f64; 3], p_j: &[f64; 3], j: usize, max_extent: f64) -> Self {
        let diff = sub(p_j, p_i);
        let normal = [2.0 * diff[0], 2.0 * diff[1], 2.0 * diff[2]];
        let offset = -(dot(p_j, p_j) - dot(p_i, p_i));

        let scale = length(&normal) * max_extent + offset.abs();
        let eps = EPSILON_SHIFT_FACTOR * f64::EPSILON * scale;

        // Moving the plane towards p_i shrinks the feasible side.
        Self::new(normal, offset + eps, j as i32)
    }

    /// `a·x + d`; non-positive inside.
    #[inline]
    pub fn evaluate(&self, p: &[f64; 3]) -> f64 {
        dot(&self.normal, p) + self.offset
    }

    #[inline]
    pub fn contains(&self, p: &[f64; 3]) -> bool {
        self.evaluate(p) <= 0.0
    }

    /// Euclidean signed distance of `p` to the boundary plane, positive outside.
    /// Undefined for a zero normal.
    #[inline]
    pub fn signed_distance(&self, p: &[f64; 3]) -> f64 {
        self.evaluate(p) / length(&self.normal)
    }

    pub fn is_finite(&self) -> bool {
        self.normal.iter().all(|c| c.is_finite()) && self.offset.is_finite()
    }

    /// True when the normal vanishes, i.e. the inequality reduces to `offset <= 0`.
    pub fn is_trivial(&self) -> bool {
        self.normal == [0.0; 3]
    }
}

/// Chooses which other seeds contribute a bisector to a seed's cell.
///
/// The bisector system is only as good as the seeds this visits: skipping a
/// seed whose bisector actually bounds the cell produces overlapping cells.
pub trait NeighborSelection: Send + Sync {
    /// Call `visitor` with the index of every seed that should bound the cell of `index`.
    fn visit_neighbors<F>(&self, seeds: &[[f64; 3]], index: usize, visitor: F)
    where
        F: FnMut(usize);
}

/// Every other seed contributes a bisector. O(N) per cell, O(N²) per run.
#[derive(Clone, Copy, Debug, Default)]
pub struct AllSeeds;

impl NeighborSelection for AllSeeds {
    fn visit_neighbors<F>(&self, seeds: &[[f64; 3]], index: usize, mut visitor: F)
    where
        F: FnMut(usize),
    {
        (0..seeds.len()).filter(|&j| j != index).for_each(&mut visitor);
    }
}

/// Builds the bisector half-spaces bounding the cell of `seeds[index]`.
pub fn bisector_system<S: NeighborSelection>(
    selection: &S,
    seeds: &[[f64; 3]],
    index: usize,
    max_extent: f64,
) -> Vec<HalfSpace> {
    let p_i = seeds[index];
    let mut halfspaces = Vec::with_capacity(seeds.len().saturating_sub(1));
    selection.visit_neighbors(seeds, index, |j| {
        halfspaces.push(HalfSpace::bisector(&p_i, &seeds[j], j, max_extent));
    });
    halfspaces
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bisector_separates_seeds() {
        let p_i = [0.0, 0.0, 0.0];
        let p_j = [2.0, 0.0, 0.0];
        let hs = HalfSpace::bisector(&p_i, &p_j, 1, 2.0);

        assert_eq!(hs.id, 1);
        assert!(hs.contains(&p_i));
        assert!(!hs.contains(&p_j));
        assert!(hs.contains(&[0.9, 5.0, -3.0]));
        assert!(!hs.contains(&[1.1, 5.0, -3.0]));
    }

    #[test]
    fn test_bisector_shift_is_inward_and_tiny() {
        let p_i = [0.0, 0.0, 0.0];
        let p_j = [2.0, 0.0, 0.0];
        let hs = HalfSpace::bisector(&p_i, &p_j, 1, 2.0);

        // The exact midpoint is excluded by the shift.
        let mid = [1.0, 0.0, 0.0];
        assert!(hs.evaluate(&mid) > 0.0);

        // normal = (4,0,0), d = -4, scale = 4*2 + 4 = 12
        let expected = EPSILON_SHIFT_FACTOR * f64::EPSILON * 12.0;
        assert!((hs.evaluate(&mid) - expected).abs() < 1e-15);
        assert!(hs.signed_distance(&mid) < 1e-10);
    }

    #[test]
    fn test_opposite_bisectors_do_not_overlap() {
        let p_i = [0.3, -1.2, 4.0];
        let p_j = [1.7, 0.4, 2.5];
        let a = HalfSpace::bisector(&p_i, &p_j, 1, 5.0);
        let b = HalfSpace::bisector(&p_j, &p_i, 0, 5.0);

        // Sample along the segment: no point is claimed by both.
        for k in 0..=1000 {
            let t = k as f64 / 1000.0;
            let x = [
                p_i[0] + t * (p_j[0] - p_i[0]),
                p_i[1] + t * (p_j[1] - p_i[1]),
                p_i[2] + t * (p_j[2] - p_i[2]),
            ];
            assert!(!(a.contains(&x) && b.contains(&x)), "overlap at t = {t}");
        }
    }

    #[test]
    fn test_bisector_system_all_pairs() {
        let seeds = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];
        let system = bisector_system(&AllSeeds, &seeds, 2, 1.0);
        assert_eq!(system.len(), 3);
        let ids: Vec<i32> = system.iter().map(|h| h.id).collect();
        assert_eq!(ids, vec![0, 1, 3]);
        assert!(system.iter().all(|h| h.contains(&seeds[2])));
    }

    #[test]
    fn test_coincident_seeds_give_trivial_halfspace() {
        let p = [0.5, 0.5, 0.5];
        let hs = HalfSpace::bisector(&p, &p, 1, 1.0);
        assert!(hs.is_trivial());
    }
}
