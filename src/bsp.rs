//! Binary space partition over the surface of a shell.
//!
//! Nodes live in a flat arena and both building and clipping walk the tree
//! with an explicit stack, so deep trees built from large meshes never touch
//! the call stack.

use crate::geometry::dot;
use crate::polygon::{split_polygon, Plane, Polygon, Side};

#[derive(Clone, Debug)]
struct BspNode {
    plane: Plane,
    front: Option<usize>,
    back: Option<usize>,
}

/// Partition of space by the planes of a polygon set.
///
/// Every leaf region is crossed by none of the input polygons, so a point
/// test on any fragment that reaches a leaf classifies the whole fragment.
#[derive(Clone, Debug, Default)]
pub struct BspTree {
    nodes: Vec<BspNode>,
    eps: f64,
}

impl BspTree {
    /// Builds the tree, splitting polygons on the plane of the first
    /// polygon of each subset. `eps` is the on-plane distance tolerance.
    pub fn build(polygons: Vec<Polygon>, eps: f64) -> BspTree {
        let mut nodes: Vec<BspNode> = Vec::new();
        let Some(first) = polygons.first() else {
            return BspTree { nodes, eps };
        };
        nodes.push(BspNode {
            plane: first.plane,
            front: None,
            back: None,
        });

        let mut stack: Vec<(usize, Vec<Polygon>)> = vec![(0, polygons)];
        while let Some((idx, polygons)) = stack.pop() {
            let plane = nodes[idx].plane;
            let mut front = Vec::new();
            let mut back = Vec::new();

            // The first polygon defines this node's plane and is consumed here.
            for poly in polygons.into_iter().skip(1) {
                match split_polygon(&poly, &plane, eps) {
                    (Side::Coplanar, _, _) => {}
                    (Side::Front, _, _) => front.push(poly),
                    (Side::Back, _, _) => back.push(poly),
                    (Side::Spanning, f, b) => {
                        front.extend(f);
                        back.extend(b);
                    }
                }
            }

            if let Some(poly) = front.first() {
                let child = nodes.len();
                nodes.push(BspNode {
                    plane: poly.plane,
                    front: None,
                    back: None,
                });
                nodes[idx].front = Some(child);
                stack.push((child, front));
            }
            if let Some(poly) = back.first() {
                let child = nodes.len();
                nodes.push(BspNode {
                    plane: poly.plane,
                    front: None,
                    back: None,
                });
                nodes[idx].back = Some(child);
                stack.push((child, back));
            }
        }

        BspTree { nodes, eps }
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[cfg(test)]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Splits `polygons` along the tree and keeps the fragments for which
    /// `keep` returns true at the leaf they end up in.
    ///
    /// Fragments coplanar with a splitting plane go to the side their normal
    /// points to.
    pub fn clip_polygons<F>(&self, polygons: Vec<Polygon>, mut keep: F) -> Vec<Polygon>
    where
        F: FnMut(&Polygon) -> bool,
    {
        let mut out = Vec::new();
        let mut stack: Vec<(Option<usize>, Vec<Polygon>)> = vec![(
            (!self.nodes.is_empty()).then_some(0),
            polygons,
        )];

        while let Some((node, polygons)) = stack.pop() {
            let Some(idx) = node else {
                out.extend(polygons.into_iter().filter(|poly| keep(poly)));
                continue;
            };
            let node = &self.nodes[idx];
            let mut front = Vec::new();
            let mut back = Vec::new();
            for poly in polygons {
                match split_polygon(&poly, &node.plane, self.eps) {
                    (Side::Coplanar, _, _) => {
                        if dot(&poly.plane.normal, &node.plane.normal) > 0.0 {
                            front.push(poly);
                        } else {
                            back.push(poly);
                        }
                    }
                    (Side::Front, _, _) => front.push(poly),
                    (Side::Back, _, _) => back.push(poly),
                    (Side::Spanning, f, b) => {
                        front.extend(f);
                        back.extend(b);
                    }
                }
            }
            if !front.is_empty() {
                stack.push((node.front, front));
            }
            if !back.is_empty() {
                stack.push((node.back, back));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bounds::BoundingBox;
    use crate::geometry::{cross, length, sub};
    use crate::mesh::TriMesh;

    fn area(poly: &Polygon) -> f64 {
        let v = &poly.vertices;
        (1..v.len() - 1)
            .map(|k| 0.5 * length(&cross(&sub(&v[k], &v[0]), &sub(&v[k + 1], &v[0]))))
            .sum()
    }

    fn cube_polygons(mesh: &TriMesh) -> Vec<Polygon> {
        mesh.triangles().filter_map(|tri| Polygon::new(tri.to_vec())).collect()
    }

    #[test]
    fn test_build_empty() {
        let tree = BspTree::build(Vec::new(), 1e-9);
        assert!(tree.is_empty());
        let square = Polygon::new(vec![[0.0; 3], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0]]).unwrap();
        assert_eq!(tree.clip_polygons(vec![square.clone()], |_| true), vec![square]);
    }

    #[test]
    fn test_build_cube_merges_coplanar_faces() {
        let cube = TriMesh::cuboid(&BoundingBox::new([0.0; 3], [1.0; 3]));
        let tree = BspTree::build(cube_polygons(&cube), 1e-9);
        // One node per face plane.
        assert_eq!(tree.node_count(), 6);
    }

    #[test]
    fn test_clip_section_through_cube() {
        let cube = TriMesh::cuboid(&BoundingBox::new([0.0; 3], [1.0; 3]));
        let tree = BspTree::build(cube_polygons(&cube), 1e-9);

        let section = Polygon::new(vec![
            [-1.0, -1.0, 0.5],
            [2.0, -1.0, 0.5],
            [2.0, 2.0, 0.5],
            [-1.0, 2.0, 0.5],
        ])
        .unwrap();

        let inside = tree.clip_polygons(vec![section.clone()], |p| cube.contains(&p.centroid()));
        let kept: f64 = inside.iter().map(area).sum();
        assert!((kept - 1.0).abs() < 1e-12, "got {kept}");

        let outside = tree.clip_polygons(vec![section], |p| !cube.contains(&p.centroid()));
        let kept: f64 = outside.iter().map(area).sum();
        assert!((kept - 8.0).abs() < 1e-12, "got {kept}");
    }
}
