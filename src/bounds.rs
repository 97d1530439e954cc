use crate::error::ConfigurationError;
use crate::halfspace::HalfSpace;

/// Closure box face ID for the -X side. Negative to stay clear of seed indices.
pub const BOX_ID_LEFT: i32 = -1;
/// Closure box face ID for the +X side.
pub const BOX_ID_RIGHT: i32 = -2;
/// Closure box face ID for the -Y side.
pub const BOX_ID_FRONT: i32 = -3;
/// Closure box face ID for the +Y side.
pub const BOX_ID_BACK: i32 = -4;
/// Closure box face ID for the -Z side.
pub const BOX_ID_BOTTOM: i32 = -5;
/// Closure box face ID for the +Z side.
pub const BOX_ID_TOP: i32 = -6;

/// Calculates the ID for a bounding box face based on the axis and direction.
///
/// The IDs start at -1 and decrease.
/// - Axis 0 (X) Min: -1
/// - Axis 0 (X) Max: -2
/// - Axis 1 (Y) Min: -3
/// - Axis 1 (Y) Max: -4
/// - Axis 2 (Z) Min: -5
/// - Axis 2 (Z) Max: -6
pub fn box_side(axis: usize, is_max: bool) -> i32 {
    -1 - (axis * 2 + if is_max { 1 } else { 0 }) as i32
}

/// Axis-aligned bounding box in 3D.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    pub min: [f64; 3],
    pub max: [f64; 3],
}

impl BoundingBox {
    pub fn new(min: [f64; 3], max: [f64; 3]) -> Self {
        Self { min, max }
    }

    /// Tight box around a flat `[x, y, z, x, y, z, ...]` array. `None` when empty.
    pub fn from_flat(coords: &[f64]) -> Option<Self> {
        let mut chunks = coords.chunks_exact(3);
        let first = chunks.next()?;
        let mut min = [first[0], first[1], first[2]];
        let mut max = min;
        for p in chunks {
            for axis in 0..3 {
                min[axis] = min[axis].min(p[axis]);
                max[axis] = max[axis].max(p[axis]);
            }
        }
        Some(Self { min, max })
    }

    pub fn extent(&self) -> [f64; 3] {
        [
            self.max[0] - self.min[0],
            self.max[1] - self.min[1],
            self.max[2] - self.min[2],
        ]
    }

    /// Largest side length.
    pub fn max_extent(&self) -> f64 {
        let e = self.extent();
        e[0].max(e[1]).max(e[2])
    }

    pub fn center(&self) -> [f64; 3] {
        [
            0.5 * (self.min[0] + self.max[0]),
            0.5 * (self.min[1] + self.max[1]),
            0.5 * (self.min[2] + self.max[2]),
        ]
    }

    pub fn contains(&self, p: &[f64; 3]) -> bool {
        (0..3).all(|axis| p[axis] >= self.min[axis] && p[axis] <= self.max[axis])
    }

    /// True when the two boxes share at least one point, after growing `self` by `margin`.
    pub fn overlaps(&self, other: &BoundingBox, margin: f64) -> bool {
        (0..3).all(|axis| {
            self.min[axis] - margin <= other.max[axis] && other.min[axis] <= self.max[axis] + margin
        })
    }

    /// Builds the closure box used to turn unbounded Voronoi regions into
    /// bounded polytopes: a cube centred on `center` with half-width
    /// `0.5 * aabb_scale * max_extent`.
    pub fn closure(center: [f64; 3], max_extent: f64, aabb_scale: f64) -> Result<Self, ConfigurationError> {
        if !(aabb_scale.is_finite() && aabb_scale > 1.0) {
            return Err(ConfigurationError::InvalidAabbScale(aabb_scale));
        }
        let half = 0.5 * aabb_scale * max_extent;
        Ok(Self {
            min: [center[0] - half, center[1] - half, center[2] - half],
            max: [center[0] + half, center[1] + half, center[2] + half],
        })
    }

    /// The six faces of the box as half-spaces `a·x + d <= 0`, one per
    /// axis direction, labelled with the [`box_side`] IDs.
    pub fn halfspaces(&self) -> [HalfSpace; 6] {
        let side = |axis: usize, is_max: bool| {
            let mut normal = [0.0; 3];
            let offset = if is_max {
                // x <= max
                normal[axis] = 1.0;
                -self.max[axis]
            } else {
                // x >= min
                normal[axis] = -1.0;
                self.min[axis]
            };
            HalfSpace::new(normal, offset, box_side(axis, is_max))
        };
        [
            side(0, true),
            side(0, false),
            side(1, true),
            side(1, false),
            side(2, true),
            side(2, false),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_box_side_ids() {
        assert_eq!(box_side(0, false), BOX_ID_LEFT);
        assert_eq!(box_side(0, true), BOX_ID_RIGHT);
        assert_eq!(box_side(1, false), BOX_ID_FRONT);
        assert_eq!(box_side(1, true), BOX_ID_BACK);
        assert_eq!(box_side(2, false), BOX_ID_BOTTOM);
        assert_eq!(box_side(2, true), BOX_ID_TOP);
    }

    #[test]
    fn test_from_flat() {
        let b = BoundingBox::from_flat(&[1.0, 2.0, 3.0, -1.0, 5.0, 0.0]).unwrap();
        assert_eq!(b.min, [-1.0, 2.0, 0.0]);
        assert_eq!(b.max, [1.0, 5.0, 3.0]);
        assert_eq!(b.max_extent(), 3.0);
        assert!(BoundingBox::from_flat(&[]).is_none());
    }

    #[test]
    fn test_closure_box() {
        let closure = BoundingBox::closure([0.5, 0.5, 0.5], 1.0, 2.0).unwrap();
        assert_eq!(closure.min, [-0.5, -0.5, -0.5]);
        assert_eq!(closure.max, [1.5, 1.5, 1.5]);

        assert_eq!(
            BoundingBox::closure([0.0; 3], 1.0, 1.0),
            Err(ConfigurationError::InvalidAabbScale(1.0))
        );
    }

    #[test]
    fn test_closure_halfspaces_contain_box() {
        let closure = BoundingBox::new([0.0, 0.0, 0.0], [2.0, 3.0, 4.0]);
        let hs = closure.halfspaces();
        assert!(hs.iter().all(|h| h.contains(&[1.0, 1.5, 2.0])));
        assert!(hs.iter().any(|h| !h.contains(&[2.5, 1.5, 2.0])));
        assert!(hs.iter().any(|h| !h.contains(&[1.0, 1.5, -0.1])));
        // Corners lie on the boundary.
        assert!(hs.iter().all(|h| h.evaluate(&[2.0, 3.0, 4.0]) <= 0.0));
    }
}
