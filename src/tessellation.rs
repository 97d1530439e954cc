use std::sync::atomic::{AtomicBool, Ordering};

use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::bounds::BoundingBox;
use crate::cell::{solve_cell, CellScratch, ConvexCell};
use crate::clip::ShellClipper;
use crate::config::TessellationConfig;
use crate::error::{CellDiscard, CellError, Result, TessellationError};
use crate::halfspace::{bisector_system, AllSeeds, NeighborSelection};
use crate::mesh::TriMesh;
use crate::sampling::sample_seeds;
use crate::shells::{report_integrity, IntegrityNotice, Shell};

/// The part of one seed's Voronoi cell that lies inside the input mesh.
///
/// The mesh may consist of several disconnected pieces when the cell
/// reaches into more than one shell.
#[derive(Clone, Debug)]
pub struct ClippedCell {
    pub seed_index: usize,
    pub seed: [f64; 3],
    pub mesh: TriMesh,
}

impl ClippedCell {
    pub fn volume(&self) -> f64 {
        self.mesh.volume()
    }
}

/// Outcome summary of a tessellation run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TessellationReport {
    pub requested: usize,
    pub produced: usize,
    /// Seed index and cause for every seed without a cell, in seed order.
    pub discarded: Vec<(usize, CellDiscard)>,
    pub integrity: Option<IntegrityNotice>,
}

impl TessellationReport {
    pub fn is_complete(&self) -> bool {
        self.produced == self.requested
    }

    pub fn cancelled(&self) -> usize {
        self.discarded
            .iter()
            .filter(|(_, cause)| *cause == CellDiscard::Cancelled)
            .count()
    }
}

/// Splits a mesh into clipped Voronoi cells.
///
/// Construction decomposes the mesh into shells, places the seeds and sets
/// up the shared closure box. [`Tessellation::calculate`] then builds every
/// cell independently and in parallel.
pub struct Tessellation<S: NeighborSelection = AllSeeds> {
    pub closure: BoundingBox,
    pub seeds: Vec<[f64; 3]>,
    max_extent: f64,
    clipper: ShellClipper,
    integrity: Option<IntegrityNotice>,
    selection: S,
    cells: Vec<ClippedCell>,
    report: TessellationReport,
}

impl Tessellation<AllSeeds> {
    /// Validates `config`, decomposes `mesh` and samples the seeds.
    pub fn new(mesh: &TriMesh, config: &TessellationConfig) -> Result<Self> {
        config.validate()?;
        let (closure, max_extent) = closure_for(mesh, config.aabb_scale)?;

        let shells = crate::shells::decompose(mesh);
        let integrity = report_integrity(&shells);

        let mut rng = StdRng::seed_from_u64(config.rng_seed.unwrap_or_else(get_seed));
        let seeds = sample_seeds(mesh, config.number_of_cells, config.sampling_attempts(), &mut rng)?;

        Ok(Self::assemble(closure, max_extent, shells, integrity, seeds))
    }

    /// Uses the given seeds instead of sampling. Seeds are not checked for
    /// containment; a seed outside every shell simply yields no cell.
    pub fn with_seeds(mesh: &TriMesh, seeds: Vec<[f64; 3]>, aabb_scale: f64) -> Result<Self> {
        TessellationConfig::new(seeds.len(), aabb_scale).validate()?;
        if let Some(index) = seeds.iter().position(|s| !crate::geometry::is_finite(s)) {
            return Err(TessellationError::InvalidSeed { index });
        }
        let (closure, max_extent) = closure_for(mesh, aabb_scale)?;

        let shells = crate::shells::decompose(mesh);
        let integrity = report_integrity(&shells);

        Ok(Self::assemble(closure, max_extent, shells, integrity, seeds))
    }

    fn assemble(
        closure: BoundingBox,
        max_extent: f64,
        shells: Vec<Shell>,
        integrity: Option<IntegrityNotice>,
        seeds: Vec<[f64; 3]>,
    ) -> Self {
        Self {
            closure,
            seeds,
            max_extent,
            clipper: ShellClipper::new(shells),
            integrity,
            selection: AllSeeds,
            cells: Vec::new(),
            report: TessellationReport::default(),
        }
    }
}

impl<S: NeighborSelection> Tessellation<S> {
    /// Replaces the strategy choosing which seeds bound each cell.
    pub fn with_neighbor_selection<T: NeighborSelection>(self, selection: T) -> Tessellation<T> {
        Tessellation {
            closure: self.closure,
            seeds: self.seeds,
            max_extent: self.max_extent,
            clipper: self.clipper,
            integrity: self.integrity,
            selection,
            cells: Vec::new(),
            report: TessellationReport::default(),
        }
    }

    pub fn shells(&self) -> impl Iterator<Item = &Shell> {
        self.clipper.shells()
    }

    pub fn max_extent(&self) -> f64 {
        self.max_extent
    }

    /// Solves the bounded cell of `index` together with its hull mesh, which
    /// is checked to be a closed solid.
    pub fn build_cell(
        &self,
        index: usize,
        scratch: &mut CellScratch,
    ) -> std::result::Result<(ConvexCell, TriMesh), CellError> {
        let halfspaces = bisector_system(&self.selection, &self.seeds, index, self.max_extent);
        let cell = solve_cell(index, &self.seeds[index], &self.closure, &halfspaces, self.max_extent, scratch)?;
        let hull = cell.hull_mesh()?;
        Ok((cell, hull))
    }

    /// Convex hull mesh of the bounded cell of `index`, before shell clipping.
    pub fn hull(&self, index: usize) -> std::result::Result<TriMesh, CellError> {
        let mut scratch = CellScratch::default();
        self.build_cell(index, &mut scratch).map(|(_, hull)| hull)
    }

    /// Full pipeline for one seed.
    pub fn process_seed(&self, index: usize, scratch: &mut CellScratch) -> std::result::Result<ClippedCell, CellDiscard> {
        let (cell, _) = self.build_cell(index, scratch)?;
        let mesh = self.clipper.clip(&cell)?;
        debug!(seed = index, triangles = mesh.triangle_count(), "cell done");
        Ok(ClippedCell {
            seed_index: index,
            seed: self.seeds[index],
            mesh,
        })
    }

    pub fn calculate(&mut self) {
        self.calculate_with_cancel(&AtomicBool::new(false));
    }

    /// Like [`Tessellation::calculate`], but seeds not yet started when
    /// `cancel` is raised are skipped and reported as cancelled.
    pub fn calculate_with_cancel(&mut self, cancel: &AtomicBool) {
        let count = self.seeds.len();
        info!(cells = count, shells = self.clipper.shell_count(), "tessellation started");

        let outcomes: Vec<std::result::Result<ClippedCell, CellDiscard>> = {
            let this = &*self;
            (0..count)
                .into_par_iter()
                .map_init(CellScratch::default, |scratch, i| {
                    if cancel.load(Ordering::Relaxed) {
                        return Err(CellDiscard::Cancelled);
                    }
                    this.process_seed(i, scratch)
                })
                .collect()
        };

        let mut cells = Vec::with_capacity(count);
        let mut discarded = Vec::new();
        for (i, outcome) in outcomes.into_iter().enumerate() {
            match outcome {
                Ok(cell) => cells.push(cell),
                Err(cause) => {
                    if cause != CellDiscard::Cancelled {
                        warn!(seed = i, cause = %cause, "cell discarded");
                    }
                    discarded.push((i, cause));
                }
            }
        }

        self.report = TessellationReport {
            requested: count,
            produced: cells.len(),
            discarded,
            integrity: self.integrity,
        };
        self.cells = cells;

        info!(
            produced = self.report.produced,
            requested = count,
            cancelled = self.report.cancelled(),
            "tessellation finished"
        );
    }

    /// Cells produced by the last calculation, in seed order.
    pub fn cells(&self) -> &[ClippedCell] {
        &self.cells
    }

    pub fn report(&self) -> &TessellationReport {
        &self.report
    }

    pub fn into_cells(self) -> Vec<ClippedCell> {
        self.cells
    }
}

/// Splits `mesh` into up to `number_of_cells` clipped Voronoi cells.
///
/// Seeds that produce no cell are logged and left out, so the result may be
/// shorter than requested.
pub fn tessellate(mesh: &TriMesh, number_of_cells: usize, aabb_scale: f64) -> Result<Vec<ClippedCell>> {
    let config = TessellationConfig::new(number_of_cells, aabb_scale);
    tessellate_with_config(mesh, &config).map(|(cells, _)| cells)
}

/// [`tessellate`] with the full configuration, also returning the report.
pub fn tessellate_with_config(
    mesh: &TriMesh,
    config: &TessellationConfig,
) -> Result<(Vec<ClippedCell>, TessellationReport)> {
    let mut tessellation = Tessellation::new(mesh, config)?;
    tessellation.calculate();
    let report = tessellation.report().clone();
    Ok((tessellation.into_cells(), report))
}

fn closure_for(mesh: &TriMesh, aabb_scale: f64) -> Result<(BoundingBox, f64)> {
    let bounds = mesh.bounds().ok_or(TessellationError::EmptyMesh)?;
    let center = mesh.centroid().unwrap_or_else(|| bounds.center());
    let max_extent = bounds.max_extent();
    if !(max_extent.is_finite() && center.iter().all(|c| c.is_finite())) {
        return Err(TessellationError::EmptyMesh);
    }
    let closure = BoundingBox::closure(center, max_extent, aabb_scale)?;
    Ok((closure, max_extent))
}

fn get_seed() -> u64 {
    #[cfg(target_arch = "wasm32")]
    {
        (js_sys::Math::random() * 4294967296.0) as u64
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        rand::random()
    }
}
