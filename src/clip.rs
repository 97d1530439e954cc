//! Intersection of convex cells with the shells of the input mesh.
//!
//! Each shell is intersected with the cell on its own and the non-empty
//! pieces are concatenated. The boundary of `cell ∩ shell` consists of
//!
//! - the parts of the shell surface behind every face plane of the cell, and
//! - the parts of the cell faces that lie inside the shell.
//!
//! The first set comes from clipping shell triangles by the cell planes. The
//! second comes from splitting the cell faces along a BSP tree of the shell
//! surface and testing each leaf fragment against the shell.

use tracing::{debug, info};

use crate::bounds::BoundingBox;
use crate::bsp::BspTree;
use crate::cell::ConvexCell;
use crate::error::{CellDiscard, ClipError};
use crate::geometry::{add, scale};
use crate::mesh::{TriMesh, TriMeshBuilder};
use crate::polygon::{clip_behind, Polygon};
use crate::shells::Shell;

/// On-plane tolerance, relative to the shell's largest extent.
pub const PLANE_TOLERANCE: f64 = 1e-9;

/// Distance of the containment probes from a cell face fragment, relative
/// to the shell's largest extent.
pub const PROBE_OFFSET: f64 = 1e-6;

/// Clipped cells with a volume below this fraction of `max_extent³` are
/// reported as near-zero.
pub const NEAR_ZERO_VOLUME: f64 = 1e-12;

struct PreparedShell {
    shell: Shell,
    bounds: Option<BoundingBox>,
    polygons: Vec<Polygon>,
    tree: BspTree,
    eps: f64,
    probe: f64,
}

impl PreparedShell {
    fn new(shell: Shell) -> Self {
        let bounds = shell.mesh.bounds();
        let size = bounds.map(|b| b.max_extent()).unwrap_or(0.0);
        let eps = PLANE_TOLERANCE * size;
        let polygons: Vec<Polygon> = shell
            .mesh
            .triangles()
            .filter_map(|tri| Polygon::new(tri.to_vec()))
            .collect();
        let tree = BspTree::build(polygons.clone(), eps);
        PreparedShell {
            shell,
            bounds,
            polygons,
            tree,
            eps,
            probe: PROBE_OFFSET * size,
        }
    }

    /// A face fragment is part of the intersection boundary when the shell
    /// encloses both sides of it. Fragments lying on the shell surface fail
    /// on one side and are left to the shell triangles.
    fn encloses_fragment(&self, fragment: &Polygon) -> bool {
        let center = fragment.centroid();
        let offset = scale(&fragment.plane.normal, self.probe);
        self.shell.mesh.contains(&add(&center, &offset))
            && self.shell.mesh.contains(&add(&center, &scale(&offset, -1.0)))
    }
}

/// Per-shell clipping state, prepared once and shared by every cell.
pub struct ShellClipper {
    shells: Vec<PreparedShell>,
    max_extent: f64,
}

impl ShellClipper {
    pub fn new(shells: Vec<Shell>) -> Self {
        let max_extent = shells
            .iter()
            .filter_map(|s| s.mesh.bounds())
            .map(|b| b.max_extent())
            .fold(0.0, f64::max);
        ShellClipper {
            shells: shells.into_iter().map(PreparedShell::new).collect(),
            max_extent,
        }
    }

    pub fn shell_count(&self) -> usize {
        self.shells.len()
    }

    pub fn shells(&self) -> impl Iterator<Item = &Shell> {
        self.shells.iter().map(|s| &s.shell)
    }

    /// Intersects `cell` with one shell. `Ok(None)` when they do not overlap.
    pub fn clip_shell(&self, shell: usize, cell: &ConvexCell) -> Result<Option<TriMesh>, ClipError> {
        let prepared = &self.shells[shell];
        let Some(shell_bounds) = prepared.bounds.filter(|_| !prepared.polygons.is_empty()) else {
            return Err(ClipError::EmptyShell);
        };
        let Some(cell_bounds) = cell.bounds() else {
            return Ok(None);
        };
        if !shell_bounds.overlaps(&cell_bounds, prepared.eps) {
            return Ok(None);
        }

        let faces = cell.face_polygons();
        let mut builder = TriMeshBuilder::default();

        // Shell surface inside the cell.
        for poly in &prepared.polygons {
            let mut piece = Some(poly.clone());
            for face in &faces {
                piece = piece.and_then(|p| clip_behind(p, &face.plane, prepared.eps));
                if piece.is_none() {
                    break;
                }
            }
            if let Some(piece) = piece {
                builder.push_polygon(&piece.vertices);
            }
        }

        // Cell faces inside the shell.
        let inside = prepared
            .tree
            .clip_polygons(faces, |fragment| prepared.encloses_fragment(fragment));
        for fragment in &inside {
            builder.push_polygon(&fragment.vertices);
        }

        if !builder.is_finite() {
            return Err(ClipError::NonFinite);
        }
        let mesh = builder.build();
        Ok((!mesh.is_empty()).then_some(mesh))
    }

    /// Intersects `cell` with every shell and concatenates the results.
    ///
    /// Shells that fail are skipped. The cell is discarded when no shell
    /// contributes anything.
    pub fn clip(&self, cell: &ConvexCell) -> Result<TriMesh, CellDiscard> {
        let mut parts = Vec::new();
        for shell in 0..self.shells.len() {
            match self.clip_shell(shell, cell) {
                Ok(Some(mesh)) => parts.push(mesh),
                Ok(None) => {}
                Err(err) => {
                    debug!(cell = cell.id(), shell, error = %err, "skipping shell");
                }
            }
        }

        if parts.is_empty() {
            return Err(CellDiscard::NoShellIntersection);
        }

        let mesh = if parts.len() == 1 {
            parts.swap_remove(0)
        } else {
            TriMesh::concat(&parts)
        };

        let volume = mesh.volume();
        if !volume.is_finite() || volume.abs() < NEAR_ZERO_VOLUME * self.max_extent.powi(3) {
            info!(cell = cell.id(), volume, "clipped cell has near-zero volume");
        }
        Ok(mesh)
    }
}
