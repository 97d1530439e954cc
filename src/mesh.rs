use crate::bounds::BoundingBox;
use crate::geometry::{add, cross, dot, is_finite, length, ray_hits_triangle, scale, sub};
use hashbrown::HashMap;

/// Skewed ray directions for the containment test. Axis-aligned rays would
/// graze the diagonals of axis-aligned quads.
const RAY_DIRECTIONS: [[f64; 3]; 3] = [
    [0.815_1, 0.434_2, 0.383_5],
    [-0.341_7, 0.883_0, -0.321_8],
    [0.246_1, -0.370_4, 0.895_7],
];

/// An indexed triangle mesh.
///
/// Vertices are stored flat as `[x, y, z, x, y, z, ...]` and triangles as
/// index triples `[a, b, c, a, b, c, ...]`. Counter-clockwise winding seen
/// from outside is expected for volume and orientation queries, but nothing
/// requires the mesh to be closed.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TriMesh {
    pub vertices: Vec<f64>,
    pub indices: Vec<u32>,
}

impl TriMesh {
    pub fn new(vertices: Vec<f64>, indices: Vec<u32>) -> Self {
        Self { vertices, indices }
    }

    /// Closed, outward-facing box mesh with 8 vertices and 12 triangles.
    pub fn cuboid(bounds: &BoundingBox) -> Self {
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
        let indices: Vec<u32> = vec![
            0, 2, 1, 0, 3, 2, // Bottom (z-)
            4, 5, 6, 4, 6, 7, // Top (z+)
            0, 1, 5, 0, 5, 4, // Front (y-)
            2, 3, 7, 2, 7, 6, // Back (y+)
            0, 4, 7, 0, 7, 3, // Left (x-)
            1, 2, 6, 1, 6, 5, // Right (x+)
        ];
        Self { vertices, indices }
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / 3
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// A mesh without triangles is empty, whatever vertices it carries.
    pub fn is_empty(&self) -> bool {
        self.indices.len() < 3
    }

    #[inline]
    pub fn vertex(&self, i: usize) -> [f64; 3] {
        [self.vertices[i * 3], self.vertices[i * 3 + 1], self.vertices[i * 3 + 2]]
    }

    #[inline]
    pub fn triangle(&self, t: usize) -> [[f64; 3]; 3] {
        [
            self.vertex(self.indices[t * 3] as usize),
            self.vertex(self.indices[t * 3 + 1] as usize),
            self.vertex(self.indices[t * 3 + 2] as usize),
        ]
    }

    pub fn triangles(&self) -> impl Iterator<Item = [[f64; 3]; 3]> + '_ {
        (0..self.triangle_count()).map(move |t| self.triangle(t))
    }

    /// Axis-aligned bounds of the vertices referenced by triangles.
    pub fn bounds(&self) -> Option<BoundingBox> {
        let first = self.vertex(*self.indices.first()? as usize);
        let mut b = BoundingBox::new(first, first);
        for &i in &self.indices {
            let v = self.vertex(i as usize);
            for axis in 0..3 {
                b.min[axis] = b.min[axis].min(v[axis]);
                b.max[axis] = b.max[axis].max(v[axis]);
            }
        }
        Some(b)
    }

    /// Area-weighted mean of the triangle centroids. Falls back to the
    /// bounds centre for meshes with zero surface area.
    pub fn centroid(&self) -> Option<[f64; 3]> {
        let bounds = self.bounds()?;
        let mut weighted = [0.0; 3];
        let mut total_area = 0.0;
        for tri in self.triangles() {
            let area = 0.5 * length(&cross(&sub(&tri[1], &tri[0]), &sub(&tri[2], &tri[0])));
            let center = scale(&add(&add(&tri[0], &tri[1]), &tri[2]), 1.0 / 3.0);
            weighted = add(&weighted, &scale(&center, area));
            total_area += area;
        }
        if total_area > 0.0 && total_area.is_finite() {
            Some(scale(&weighted, 1.0 / total_area))
        } else {
            Some(bounds.center())
        }
    }

    /// Signed enclosed volume (divergence theorem). Positive for a closed,
    /// outward-facing surface.
    pub fn volume(&self) -> f64 {
        self.triangles()
            .map(|[v0, v1, v2]| dot(&v0, &cross(&v1, &v2)))
            .sum::<f64>()
            / 6.0
    }

    pub fn surface_area(&self) -> f64 {
        self.triangles()
            .map(|tri| 0.5 * length(&cross(&sub(&tri[1], &tri[0]), &sub(&tri[2], &tri[0]))))
            .sum()
    }

    /// Every edge is shared by exactly two triangles, traversed once in each
    /// direction.
    pub fn is_watertight(&self) -> bool {
        if self.is_empty() {
            return false;
        }
        let mut directed: HashMap<(u32, u32), u32> = HashMap::with_capacity(self.indices.len());
        for tri in self.indices.chunks_exact(3) {
            for k in 0..3 {
                *directed.entry((tri[k], tri[(k + 1) % 3])).or_insert(0) += 1;
            }
        }
        directed
            .iter()
            .all(|(&(a, b), &count)| count == 1 && directed.get(&(b, a)) == Some(&1))
    }

    /// Inside/outside classification by ray parity.
    ///
    /// Three rays with skewed directions are cast and the majority vote wins,
    /// which tolerates a ray grazing an edge or vertex. Points exactly on the
    /// surface may fall either way. A surface enclosing no volume contains
    /// nothing.
    pub fn contains(&self, point: &[f64; 3]) -> bool {
        match self.bounds() {
            Some(b) if b.contains(point) => self.contains_unchecked(point),
            _ => false,
        }
    }

    /// [`TriMesh::contains`] without the bounding box rejection.
    pub(crate) fn contains_unchecked(&self, point: &[f64; 3]) -> bool {
        let votes = RAY_DIRECTIONS
            .iter()
            .filter(|dir| {
                let hits = self.triangles().filter(|tri| ray_hits_triangle(point, dir, tri)).count();
                hits % 2 == 1
            })
            .count();
        votes >= 2
    }

    pub fn is_finite(&self) -> bool {
        self.vertices.iter().all(|c| c.is_finite())
    }

    /// Concatenates meshes without merging anything; the result may have
    /// several disconnected components.
    pub fn concat(parts: &[TriMesh]) -> TriMesh {
        let mut out = TriMesh::default();
        for part in parts {
            let base = out.vertex_count() as u32;
            out.vertices.extend_from_slice(&part.vertices);
            out.indices.extend(part.indices.iter().map(|&i| i + base));
        }
        out
    }

    /// Copy of the given triangles with unreferenced vertices dropped.
    pub fn submesh(&self, triangles: &[u32]) -> TriMesh {
        let mut builder = TriMeshBuilder::default();
        let mut remap: HashMap<u32, u32> = HashMap::new();
        for &t in triangles {
            let t = t as usize;
            let mut tri = [0u32; 3];
            for k in 0..3 {
                let old = self.indices[t * 3 + k];
                tri[k] = *remap
                    .entry(old)
                    .or_insert_with(|| builder.push_vertex(self.vertex(old as usize)));
            }
            builder.indices.extend_from_slice(&tri);
        }
        builder.build()
    }

    /// Merges vertices with bit-identical positions. Triangle soups (one
    /// vertex triple per triangle) become properly indexed.
    pub fn welded(&self) -> TriMesh {
        let mut builder = TriMeshBuilder::default();
        let mut remap = Vec::with_capacity(self.vertex_count());
        for i in 0..self.vertex_count() {
            remap.push(builder.weld_vertex(self.vertex(i)));
        }
        builder
            .indices
            .extend(self.indices.iter().map(|&i| remap[i as usize]));
        builder.build()
    }
}

/// Incremental mesh assembly with exact vertex welding.
#[derive(Default)]
pub(crate) struct TriMeshBuilder {
    vertices: Vec<f64>,
    indices: Vec<u32>,
    lookup: HashMap<[u64; 3], u32>,
}

impl TriMeshBuilder {
    fn key(p: &[f64; 3]) -> [u64; 3] {
        // +0.0 turns -0.0 into +0.0 so both weld together.
        [(p[0] + 0.0).to_bits(), (p[1] + 0.0).to_bits(), (p[2] + 0.0).to_bits()]
    }

    fn push_vertex(&mut self, p: [f64; 3]) -> u32 {
        let idx = (self.vertices.len() / 3) as u32;
        self.vertices.extend_from_slice(&p);
        idx
    }

    pub(crate) fn weld_vertex(&mut self, p: [f64; 3]) -> u32 {
        if let Some(&idx) = self.lookup.get(&Self::key(&p)) {
            return idx;
        }
        let idx = self.push_vertex(p);
        self.lookup.insert(Self::key(&p), idx);
        idx
    }

    /// Fan-triangulates a convex polygon. Triangles that collapse onto a
    /// welded vertex are dropped.
    pub(crate) fn push_polygon(&mut self, polygon: &[[f64; 3]]) {
        if polygon.len() < 3 {
            return;
        }
        let ids: Vec<u32> = polygon.iter().map(|p| self.weld_vertex(*p)).collect();
        for k in 1..ids.len() - 1 {
            let tri = [ids[0], ids[k], ids[k + 1]];
            if tri[0] != tri[1] && tri[1] != tri[2] && tri[0] != tri[2] {
                self.indices.extend_from_slice(&tri);
            }
        }
    }

    pub(crate) fn is_finite(&self) -> bool {
        self.vertices.chunks_exact(3).all(|p| is_finite(&[p[0], p[1], p[2]]))
    }

    pub(crate) fn build(self) -> TriMesh {
        TriMesh::new(self.vertices, self.indices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_cube() -> TriMesh {
        TriMesh::cuboid(&BoundingBox::new([0.0, 0.0, 0.0], [1.0, 1.0, 1.0]))
    }

    #[test]
    fn test_cuboid_metrics() {
        let mesh = TriMesh::cuboid(&BoundingBox::new([0.0, 0.0, 0.0], [10.0, 20.0, 30.0]));
        assert_eq!(mesh.triangle_count(), 12);
        assert!((mesh.volume() - 6000.0).abs() < 1e-9, "got {}", mesh.volume());
        assert!((mesh.surface_area() - 2200.0).abs() < 1e-9);
        assert!(mesh.is_watertight());

        let c = mesh.centroid().unwrap();
        assert!((c[0] - 5.0).abs() < 1e-9);
        assert!((c[1] - 10.0).abs() < 1e-9);
        assert!((c[2] - 15.0).abs() < 1e-9);
    }

    #[test]
    fn test_contains() {
        let mesh = unit_cube();
        assert!(mesh.contains(&[0.5, 0.5, 0.5]));
        assert!(mesh.contains(&[0.01, 0.99, 0.5]));
        assert!(!mesh.contains(&[1.5, 0.5, 0.5]));
        assert!(!mesh.contains(&[-0.01, 0.5, 0.5]));
    }

    #[test]
    fn test_flat_mesh_contains_nothing() {
        let mesh = TriMesh::new(
            vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
            vec![0, 1, 2, 0, 2, 1],
        );
        assert!(!mesh.contains(&[0.2, 0.2, 0.0]));
        assert!(!mesh.is_watertight() || mesh.volume() == 0.0);
    }

    #[test]
    fn test_open_mesh_is_not_watertight() {
        let mut mesh = unit_cube();
        mesh.indices.truncate(mesh.indices.len() - 3);
        assert!(!mesh.is_watertight());
    }

    #[test]
    fn test_concat_and_submesh() {
        let a = unit_cube();
        let b = TriMesh::cuboid(&BoundingBox::new([2.0, 0.0, 0.0], [3.0, 1.0, 1.0]));
        let both = TriMesh::concat(&[a.clone(), b]);
        assert_eq!(both.triangle_count(), 24);
        assert_eq!(both.vertex_count(), 16);
        assert!((both.volume() - 2.0).abs() < 1e-9);

        let first: Vec<u32> = (0..12).collect();
        let sub = both.submesh(&first);
        assert_eq!(sub.vertex_count(), 8);
        assert!((sub.volume() - 1.0).abs() < 1e-9);
        assert!(sub.is_watertight());
    }

    #[test]
    fn test_weld_triangle_soup() {
        let cube = unit_cube();
        let mut soup = TriMesh::default();
        for (t, tri) in cube.triangles().enumerate() {
            for v in tri {
                soup.vertices.extend_from_slice(&v);
            }
            soup.indices.extend_from_slice(&[t as u32 * 3, t as u32 * 3 + 1, t as u32 * 3 + 2]);
        }
        assert!(!soup.is_watertight());

        let welded = soup.welded();
        assert_eq!(welded.vertex_count(), 8);
        assert!(welded.is_watertight());
    }

    #[test]
    fn test_builder_drops_collapsed_triangles() {
        let mut builder = TriMeshBuilder::default();
        builder.push_polygon(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]);
        let mesh = builder.build();
        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.triangle_count(), 1);
    }
}
