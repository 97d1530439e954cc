//! Splits a mesh into its shells, the connected components of its surface.
//!
//! Two triangles belong to the same shell when they share an edge. Edges
//! used by more than two triangles connect all of them, so non-manifold
//! input still yields one shell per geometrically connected piece.

use hashbrown::HashMap;
use tracing::{debug, info, warn};

use crate::mesh::TriMesh;

/// A connected component of a mesh's surface.
#[derive(Clone, Debug)]
pub struct Shell {
    /// Position in the decomposition order.
    pub index: usize,
    pub mesh: TriMesh,
    pub watertight: bool,
}

/// Non-fatal findings about the input surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IntegrityNotice {
    /// The mesh has more than one shell. Each is clipped separately.
    MultipleShells(usize),
    /// The mesh is a single shell with open or non-manifold edges.
    NotWatertight,
}

impl std::fmt::Display for IntegrityNotice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IntegrityNotice::MultipleShells(count) => write!(f, "mesh has {count} shells"),
            IntegrityNotice::NotWatertight => write!(f, "mesh is not watertight"),
        }
    }
}

/// Face indices of each connected component, ordered by their lowest face.
pub fn connected_components(mesh: &TriMesh) -> Vec<Vec<u32>> {
    let face_count = mesh.triangle_count();
    if face_count == 0 {
        return Vec::new();
    }

    let mut edge_to_faces: HashMap<(u32, u32), Vec<u32>> = HashMap::with_capacity(face_count * 3 / 2);
    for (f, tri) in mesh.indices.chunks_exact(3).enumerate() {
        for k in 0..3 {
            let (a, b) = (tri[k], tri[(k + 1) % 3]);
            let key = if a < b { (a, b) } else { (b, a) };
            edge_to_faces.entry(key).or_default().push(f as u32);
        }
    }

    let mut face_neighbors: Vec<Vec<u32>> = vec![Vec::new(); face_count];
    for faces in edge_to_faces.values() {
        for (i, &f0) in faces.iter().enumerate() {
            for &f1 in &faces[i + 1..] {
                face_neighbors[f0 as usize].push(f1);
                face_neighbors[f1 as usize].push(f0);
            }
        }
    }

    let mut visited = vec![false; face_count];
    let mut components: Vec<Vec<u32>> = Vec::new();
    for start_face in 0..face_count {
        if visited[start_face] {
            continue;
        }

        let mut component = Vec::new();
        let mut queue = vec![start_face as u32];
        visited[start_face] = true;

        while let Some(face_idx) = queue.pop() {
            component.push(face_idx);
            for &neighbor in &face_neighbors[face_idx as usize] {
                if !visited[neighbor as usize] {
                    visited[neighbor as usize] = true;
                    queue.push(neighbor);
                }
            }
        }

        component.sort_unstable();
        components.push(component);
    }
    components
}

/// Splits `mesh` into shells.
///
/// Vertices at identical positions are merged first so that triangle soups
/// connect through shared geometry rather than shared indices.
pub fn decompose(mesh: &TriMesh) -> Vec<Shell> {
    let welded = mesh.welded();
    let components = connected_components(&welded);

    let shells: Vec<Shell> = components
        .iter()
        .enumerate()
        .map(|(index, faces)| {
            let mesh = welded.submesh(faces);
            let watertight = mesh.is_watertight();
            Shell { index, mesh, watertight }
        })
        .collect();

    debug!(
        shells = shells.len(),
        faces = welded.triangle_count(),
        "decomposed mesh into shells"
    );
    shells
}

/// Integrity notice for a decomposition, if any.
pub fn integrity(shells: &[Shell]) -> Option<IntegrityNotice> {
    match shells {
        [] => None,
        [single] if !single.watertight => Some(IntegrityNotice::NotWatertight),
        [_] => None,
        many => Some(IntegrityNotice::MultipleShells(many.len())),
    }
}

/// Logs the integrity notice for a decomposition.
pub(crate) fn report_integrity(shells: &[Shell]) -> Option<IntegrityNotice> {
    let notice = integrity(shells);
    match notice {
        Some(IntegrityNotice::MultipleShells(count)) => {
            let open = shells.iter().filter(|s| !s.watertight).count();
            info!(shells = count, open_shells = open, "multiple shells detected, clipping each separately");
        }
        Some(IntegrityNotice::NotWatertight) => {
            warn!("mesh is not watertight, containment and clipping may be unreliable");
        }
        None => {}
    }
    notice
}
