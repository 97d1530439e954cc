use crate::bounds::{box_side, BoundingBox};
use crate::error::CellError;
use crate::geometry::{cross, length, lerp};
use crate::halfspace::HalfSpace;
use crate::mesh::TriMesh;
use crate::polygon::{Plane, Polygon};
use hashbrown::HashMap;

/// Vertices within `CLIP_TOLERANCE * size` of a clipping plane count as on it.
/// Kept far below the bisector shift so it never decides which cell owns a point.
pub const CLIP_TOLERANCE: f64 = 16.0 * f64::EPSILON;

/// Scratch buffer to reuse allocations during clipping.
#[derive(Default, Clone)]
pub struct CellScratch {
    vertices: Vec<f64>,
    face_counts: Vec<u16>,
    face_indices: Vec<u32>,
    face_neighbors: Vec<i32>,
    dists: Vec<f64>,
    is_intersection: Vec<bool>,
    old_to_new: Vec<Option<u32>>,
    intersection_map: Vec<(u64, u32)>,
    lid_segments: Vec<(u32, u32)>,
    face_buffer: Vec<u32>,
    lid_buffer: Vec<u32>,
    lid_map: Vec<u32>,
}

/// A bounded convex Voronoi cell.
///
/// Starts as the closure box and is cut down by one half-space at a time.
/// Faces are stored as vertex loops, counter-clockwise seen from outside.
#[derive(Clone, Debug)]
pub struct ConvexCell {
    pub(crate) id: usize,
    // Flat array of vertices [x, y, z, x, y, z, ...]
    pub(crate) vertices: Vec<f64>,
    // Number of vertices for each face
    pub(crate) face_counts: Vec<u16>,
    // Flattened indices for all faces
    pub(crate) face_indices: Vec<u32>,
    // Half-space ID for each face: the other seed's index, or a negative box side.
    pub(crate) face_neighbors: Vec<i32>,
    tolerance: f64,
}

impl ConvexCell {
    pub fn new(id: usize, bounds: &BoundingBox) -> ConvexCell {
        let [x0, y0, z0] = bounds.min;
        let [x1, y1, z1] = bounds.max;
        let vertices: Vec<f64> = vec![
            x0, y0, z0, // 0
            x1, y0, z0, // 1
            x1, y1, z0, // 2
            x0, y1, z0, // 3
            x0, y0, z1, // 4
            x1, y0, z1, // 5
            x1, y1, z1, // 6
            x0, y1, z1, // 7
        ];

        let face_counts: Vec<u16> = vec![4, 4, 4, 4, 4, 4];

        let face_indices: Vec<u32> = vec![
            3, 2, 1, 0, // Bottom (z-)
            4, 5, 6, 7, // Top (z+)
            0, 1, 5, 4, // Front (y-)
            2, 3, 7, 6, // Back (y+)
            0, 4, 7, 3, // Left (x-)
            1, 2, 6, 5, // Right (x+)
        ];

        ConvexCell {
            id,
            vertices,
            face_counts,
            face_indices,
            face_neighbors: vec![
                box_side(2, false),
                box_side(2, true),
                box_side(1, false),
                box_side(1, true),
                box_side(0, false),
                box_side(0, true),
            ],
            tolerance: CLIP_TOLERANCE * bounds.max_extent(),
        }
    }

    /// Index of the seed that owns this cell.
    pub fn id(&self) -> usize {
        self.id
    }

    /// Flat array of vertices [x, y, z, x, y, z, ...].
    pub fn vertices(&self) -> &[f64] {
        &self.vertices
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / 3
    }

    pub fn face_count(&self) -> usize {
        self.face_counts.len()
    }

    /// Half-space ID for each face.
    pub fn face_neighbors(&self) -> &[i32] {
        &self.face_neighbors
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Rejects a cell with fewer than 4 vertices.
    fn ensure_solid(&self) -> Result<(), CellError> {
        let vertices = self.vertex_count();
        if vertices < 4 {
            return Err(CellError::Degenerate { vertices });
        }
        Ok(())
    }

    fn clear(&mut self) {
        self.vertices.clear();
        self.face_counts.clear();
        self.face_indices.clear();
        self.face_neighbors.clear();
    }

    #[inline]
    fn vertex(&self, i: usize) -> [f64; 3] {
        [self.vertices[i * 3], self.vertices[i * 3 + 1], self.vertices[i * 3 + 2]]
    }

    pub fn faces(&self) -> Vec<Vec<usize>> {
        let mut faces: Vec<Vec<usize>> = Vec::with_capacity(self.face_counts.len());
        let mut offset: usize = 0;
        for &count in &self.face_counts {
            let count: usize = count as usize;
            let face: Vec<usize> = self.face_indices[offset..offset + count]
                .iter()
                .map(|&i| i as usize)
                .collect();
            faces.push(face);
            offset += count;
        }
        faces
    }

    pub fn bounds(&self) -> Option<BoundingBox> {
        BoundingBox::from_flat(&self.vertices)
    }

    pub fn volume(&self) -> f64 {
        let mut volume: f64 = 0.0;
        for face in self.faces() {
            if face.len() < 3 {
                continue;
            }
            // Use the first vertex of the face as a pivot for fan triangulation
            let v0 = self.vertex(face[0]);
            for k in 1..face.len() - 1 {
                let v1 = self.vertex(face[k]);
                let v2 = self.vertex(face[k + 1]);
                volume += v0[0] * (v1[1] * v2[2] - v1[2] * v2[1])
                    + v0[1] * (v1[2] * v2[0] - v1[0] * v2[2])
                    + v0[2] * (v1[0] * v2[1] - v1[1] * v2[0]);
            }
        }
        volume / 6.0
    }

    pub fn centroid(&self) -> [f64; 3] {
        let mut centroid = [0.0; 3];
        let mut total_volume: f64 = 0.0;

        for face in self.faces() {
            if face.len() < 3 {
                continue;
            }
            let v0 = self.vertex(face[0]);
            for k in 1..face.len() - 1 {
                let v1 = self.vertex(face[k]);
                let v2 = self.vertex(face[k + 1]);
                let c = cross(&v1, &v2);
                let det = v0[0] * c[0] + v0[1] * c[1] + v0[2] * c[2];
                total_volume += det;
                for axis in 0..3 {
                    centroid[axis] += det * (v0[axis] + v1[axis] + v2[axis]);
                }
            }
        }

        if total_volume.abs() < 1e-300 {
            return [0.0; 3];
        }
        let factor = 1.0 / (4.0 * total_volume);
        [centroid[0] * factor, centroid[1] * factor, centroid[2] * factor]
    }

    /// Cuts away the part of the cell outside `halfspace`.
    ///
    /// Returns `Ok(true)` if the cell changed. An empty cell after the call
    /// means the half-space excluded it entirely. `Err` means the cut left
    /// a lid that is not a single closed loop.
    pub fn clip(&mut self, halfspace: &HalfSpace, scratch: &mut CellScratch) -> Result<bool, CellError> {
        let norm = length(&halfspace.normal);
        if !(norm > 0.0) {
            // Constant inequality: keeps everything or nothing.
            if halfspace.offset <= 0.0 {
                return Ok(false);
            }
            self.clear();
            return Ok(true);
        }
        let tol = self.tolerance;
        let num_verts = self.vertex_count();

        // 1. Calculate distances
        scratch.dists.clear();
        scratch.dists.reserve(num_verts);
        let mut all_inside = true;
        let mut all_outside = true;
        for i in 0..num_verts {
            let d = halfspace.evaluate(&self.vertex(i)) / norm;
            scratch.dists.push(d);
            if d > tol {
                all_inside = false;
            } else if d < -tol {
                all_outside = false;
            }
        }

        if all_inside {
            return Ok(false);
        }
        if all_outside {
            self.clear();
            return Ok(true);
        }

        // 2. Prepare new data structures
        scratch.vertices.clear();
        scratch.face_counts.clear();
        scratch.face_indices.clear();
        scratch.face_neighbors.clear();
        scratch.is_intersection.clear();
        scratch.old_to_new.clear();
        scratch.old_to_new.resize(num_verts, None);
        scratch.intersection_map.clear();
        scratch.lid_segments.clear();

        // Keep existing vertices that are inside
        for i in 0..num_verts {
            if scratch.dists[i] <= tol {
                let new_idx = (scratch.vertices.len() / 3) as u32;
                scratch.vertices.extend_from_slice(&self.vertices[i * 3..i * 3 + 3]);
                scratch.old_to_new[i] = Some(new_idx);
                scratch.is_intersection.push(false);
            }
        }

        // 3. Clip each face
        let mut index_offset = 0;
        for (face_idx, &count) in self.face_counts.iter().enumerate() {
            let count = count as usize;
            let face_neighbor = self.face_neighbors[face_idx];
            let current = &self.face_indices[index_offset..index_offset + count];
            index_offset += count;

            scratch.face_buffer.clear();
            for i in 0..count {
                let idx_s = current[i] as usize;
                let idx_e = current[(i + 1) % count] as usize;
                let d_s = scratch.dists[idx_s];
                let d_e = scratch.dists[idx_e];
                let s_in = d_s <= tol;
                let e_in = d_e <= tol;

                if s_in && e_in {
                    if let Some(idx) = scratch.old_to_new[idx_e] {
                        scratch.face_buffer.push(idx);
                    }
                } else if s_in != e_in {
                    // The edge crosses the plane; both faces sharing it must reuse one vertex.
                    let key = if idx_s < idx_e {
                        (idx_s as u64) << 32 | idx_e as u64
                    } else {
                        (idx_e as u64) << 32 | idx_s as u64
                    };
                    let idx = match scratch.intersection_map.iter().find(|&&(k, _)| k == key) {
                        Some(&(_, id)) => id,
                        None => {
                            let t = (d_s / (d_s - d_e)).clamp(0.0, 1.0);
                            let p = lerp(&self.vertex(idx_s), &self.vertex(idx_e), t);
                            let new_idx = (scratch.vertices.len() / 3) as u32;
                            scratch.vertices.extend_from_slice(&p);
                            scratch.is_intersection.push(true);
                            scratch.intersection_map.push((key, new_idx));
                            new_idx
                        }
                    };
                    scratch.face_buffer.push(idx);
                    if e_in {
                        if let Some(idx) = scratch.old_to_new[idx_e] {
                            scratch.face_buffer.push(idx);
                        }
                    }
                }
            }

            if scratch.face_buffer.len() >= 3 {
                scratch.face_counts.push(scratch.face_buffer.len() as u16);
                scratch.face_neighbors.push(face_neighbor);

                // Identify the segment on the clipping plane (connecting two intersection points)
                let n = scratch.face_buffer.len();
                for i in 0..n {
                    let u = scratch.face_buffer[i];
                    let v = scratch.face_buffer[(i + 1) % n];
                    if scratch.is_intersection[u as usize] && scratch.is_intersection[v as usize] {
                        scratch.lid_segments.push((v, u)); // Reverse order for the lid face
                    }
                }
                scratch.face_indices.extend_from_slice(&scratch.face_buffer);
            }
        }

        // 4. Reconstruct the "lid" face from segments
        if !scratch.lid_segments.is_empty() {
            scratch.lid_buffer.clear();
            scratch.lid_map.clear();
            scratch.lid_map.resize(scratch.vertices.len() / 3, u32::MAX);
            for &(u, v) in &scratch.lid_segments {
                scratch.lid_map[u as usize] = v;
            }

            let (start, next) = scratch.lid_segments[0];
            scratch.lid_buffer.push(start);
            let mut current = next;
            while current != start && scratch.lid_buffer.len() <= scratch.lid_segments.len() {
                scratch.lid_buffer.push(current);
                current = scratch.lid_map[current as usize];
                if current == u32::MAX {
                    break;
                }
            }

            if current != start || scratch.lid_buffer.len() != scratch.lid_segments.len() {
                return Err(CellError::HalfSpaceIntersection);
            }
            scratch.face_counts.push(scratch.lid_buffer.len() as u16);
            scratch.face_indices.extend_from_slice(&scratch.lid_buffer);
            scratch.face_neighbors.push(halfspace.id);
        }

        std::mem::swap(&mut self.vertices, &mut scratch.vertices);
        std::mem::swap(&mut self.face_counts, &mut scratch.face_counts);
        std::mem::swap(&mut self.face_indices, &mut scratch.face_indices);
        std::mem::swap(&mut self.face_neighbors, &mut scratch.face_neighbors);

        Ok(true)
    }

    /// Triangulated boundary of the cell.
    ///
    /// The faces of a convex polytope are convex, so a fan per face is the
    /// convex hull of the vertex set. The result is rejected unless every
    /// edge is matched by its reverse and the enclosed volume is positive.
    pub fn hull_mesh(&self) -> Result<TriMesh, CellError> {
        let mut indices = Vec::with_capacity(self.face_indices.len() * 3);
        for face in self.faces() {
            for k in 1..face.len().saturating_sub(1) {
                indices.extend_from_slice(&[face[0] as u32, face[k] as u32, face[k + 1] as u32]);
            }
        }

        let mut edges: HashMap<(u32, u32), i32> = HashMap::with_capacity(indices.len());
        for tri in indices.chunks_exact(3) {
            for k in 0..3 {
                let (a, b) = (tri[k], tri[(k + 1) % 3]);
                if a < b {
                    *edges.entry((a, b)).or_insert(0) += 1;
                } else {
                    *edges.entry((b, a)).or_insert(0) -= 1;
                }
            }
        }
        if edges.values().any(|&balance| balance != 0) {
            return Err(CellError::ConvexHull);
        }

        let mesh = TriMesh::new(self.vertices.clone(), indices);
        let volume = mesh.volume();
        if !(volume.is_finite() && volume > 0.0) || !mesh.is_finite() {
            return Err(CellError::ConvexHull);
        }
        Ok(mesh)
    }

    /// Faces as planar polygons with outward normals. Faces too small to
    /// define a plane are skipped.
    pub fn face_polygons(&self) -> Vec<Polygon> {
        self.faces()
            .iter()
            .filter_map(|face| {
                let points: Vec<[f64; 3]> = face.iter().map(|&i| self.vertex(i)).collect();
                Polygon::new(points)
            })
            .collect()
    }

    /// Outward planes of all faces.
    pub fn face_planes(&self) -> Vec<Plane> {
        self.face_polygons().into_iter().map(|p| p.plane).collect()
    }
}

/// Solves the bounded cell of `seed`: the closure box cut by every half-space.
///
/// `seed` must lie strictly inside every half-space; a seed on or outside
/// any boundary is treated as an unsolvable system. `max_extent` is the
/// largest dimension of the input mesh and scales the clip tolerance, so it
/// stays below the bisector shift whatever the closure box size.
pub fn solve_cell(
    id: usize,
    seed: &[f64; 3],
    closure: &BoundingBox,
    halfspaces: &[HalfSpace],
    max_extent: f64,
    scratch: &mut CellScratch,
) -> Result<ConvexCell, CellError> {
    let closure_halfspaces = closure.halfspaces();
    let feasible = halfspaces
        .iter()
        .chain(closure_halfspaces.iter())
        .all(|h| h.is_finite() && h.evaluate(seed) < 0.0);
    if !feasible {
        return Err(CellError::HalfSpaceIntersection);
    }

    let mut cell = ConvexCell::new(id, closure);
    cell.tolerance = CLIP_TOLERANCE * max_extent;
    for halfspace in halfspaces {
        if halfspace.is_trivial() {
            // Feasibility above already rejected a positive constant.
            continue;
        }
        cell.clip(halfspace, scratch)?;
        if cell.is_empty() {
            return Err(CellError::HalfSpaceIntersection);
        }
    }

    // Not reached from here in practice: the seed sits strictly inside every
    // half-space, so a non-empty cell keeps a neighbourhood of it, and an
    // emptied cell has already failed with `HalfSpaceIntersection` above.
    cell.ensure_solid()?;
    Ok(cell)
}
