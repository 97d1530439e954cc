//! # vorosplit
//!
//! `vorosplit` splits a solid triangle mesh into pieces shaped like the cells
//! of a 3D Voronoi tessellation of its volume. It is used from Rust and,
//! through `wasm-bindgen`, from JavaScript.
//!
//! ## How it works
//!
//! - **Shells**: the input is split into connected surface components, each
//!   clipped on its own. Multi-shell meshes are supported.
//! - **Seeds**: points are rejection-sampled inside the enclosed volume, with
//!   an explicit cap on the number of candidates.
//! - **Cells**: every cell is the closure box cut by the bisector half-spaces
//!   against all other seeds. Bisectors are nudged towards their own seed so
//!   neighbouring cells never overlap.
//! - **Clipping**: each convex cell is intersected with every shell and the
//!   pieces are concatenated.
//!
//! Cells that cannot be built are logged through `tracing` and left out.
//!
//! ## Main Interface
//!
//! The primary entry point is the [`Tessellation`] struct, or the [`tessellate`]
//! function for a one-shot run.

mod bounds;
mod bsp;
mod cell;
mod clip;
mod config;
mod error;
mod geometry;
mod halfspace;
mod mesh;
mod polygon;
mod sampling;
mod shells;
mod tessellation;
pub mod wasm;

pub use bounds::BoundingBox;
pub use bounds::BOX_ID_BACK;
pub use bounds::BOX_ID_BOTTOM;
pub use bounds::BOX_ID_FRONT;
pub use bounds::BOX_ID_LEFT;
pub use bounds::BOX_ID_RIGHT;
pub use bounds::BOX_ID_TOP;
pub use cell::{solve_cell, CellScratch, ConvexCell};
pub use clip::ShellClipper;
pub use config::TessellationConfig;
pub use error::{CellDiscard, CellError, ClipError, ConfigurationError, Result, TessellationError};
pub use halfspace::{bisector_system, AllSeeds, HalfSpace, NeighborSelection, EPSILON_SHIFT_FACTOR};
pub use mesh::TriMesh;
pub use polygon::{Plane, Polygon};
pub use sampling::sample_seeds;
pub use shells::{decompose, integrity, IntegrityNotice, Shell};
pub use tessellation::{tessellate, tessellate_with_config, ClippedCell, Tessellation, TessellationReport};
