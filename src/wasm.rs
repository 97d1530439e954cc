use crate::config::TessellationConfig;
use crate::mesh::TriMesh;
use crate::tessellation::{tessellate_with_config, ClippedCell, TessellationReport};
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen_rayon::init_thread_pool;

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub fn init_threads(n: usize) -> js_sys::Promise {
    init_thread_pool(n)
}

// --- Split Cell ---

/// One clipped cell as flat vertex and index arrays.
#[wasm_bindgen]
pub struct SplitCell {
    inner: ClippedCell,
}

#[wasm_bindgen]
impl SplitCell {
    #[wasm_bindgen(getter)]
    pub fn seed_index(&self) -> usize {
        self.inner.seed_index
    }

    #[wasm_bindgen(getter)]
    pub fn seed(&self) -> Vec<f64> {
        self.inner.seed.to_vec()
    }

    #[wasm_bindgen(getter)]
    pub fn vertices(&self) -> Vec<f64> {
        self.inner.mesh.vertices.clone()
    }

    #[wasm_bindgen(getter)]
    pub fn indices(&self) -> Vec<u32> {
        self.inner.mesh.indices.clone()
    }

    pub fn volume(&self) -> f64 {
        self.inner.volume()
    }
}

// --- Splitter ---

/// Splits a triangle mesh into clipped Voronoi cells.
#[wasm_bindgen]
pub struct VoronoiSplitter {
    mesh: TriMesh,
    config: TessellationConfig,
    cells: Vec<ClippedCell>,
    report: TessellationReport,
}

#[wasm_bindgen]
impl VoronoiSplitter {
    #[wasm_bindgen(constructor)]
    pub fn new(
        vertices: &[f64],
        indices: &[u32],
        number_of_cells: usize,
        aabb_scale: f64,
        seed: Option<u64>,
    ) -> Result<VoronoiSplitter, JsError> {
        if vertices.len() % 3 != 0 || indices.len() % 3 != 0 {
            return Err(JsError::new("vertices and indices must be multiples of 3"));
        }
        let vertex_count = (vertices.len() / 3) as u32;
        if indices.iter().any(|&i| i >= vertex_count) {
            return Err(JsError::new("triangle index out of range"));
        }

        let mut config = TessellationConfig::new(number_of_cells, aabb_scale);
        config.rng_seed = seed;
        config.validate()?;

        Ok(VoronoiSplitter {
            mesh: TriMesh::new(vertices.to_vec(), indices.to_vec()),
            config,
            cells: Vec::new(),
            report: TessellationReport::default(),
        })
    }

    pub fn calculate(&mut self) -> Result<(), JsError> {
        let (cells, report) = tessellate_with_config(&self.mesh, &self.config)?;
        self.cells = cells;
        self.report = report;
        Ok(())
    }

    #[wasm_bindgen(getter)]
    pub fn count_cells(&self) -> usize {
        self.cells.len()
    }

    /// Number of seeds that produced no cell in the last calculation.
    #[wasm_bindgen(getter)]
    pub fn count_discarded(&self) -> usize {
        self.report.discarded.len()
    }

    pub fn get(&self, index: usize) -> Option<SplitCell> {
        self.cells.get(index).cloned().map(|inner| SplitCell { inner })
    }
}
