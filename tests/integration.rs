use approx::assert_abs_diff_eq;
use rand::rngs::StdRng;
use rand::SeedableRng;
use vorosplit::{
    bisector_system, sample_seeds, tessellate, tessellate_with_config, AllSeeds, BoundingBox, CellDiscard,
    IntegrityNotice, Tessellation, TessellationConfig, TessellationError, TriMesh,
};

fn unit_cube() -> TriMesh {
    TriMesh::cuboid(&BoundingBox::new([0.0, 0.0, 0.0], [1.0, 1.0, 1.0]))
}

fn two_cubes() -> TriMesh {
    TriMesh::concat(&[
        unit_cube(),
        TriMesh::cuboid(&BoundingBox::new([3.0, 0.0, 0.0], [4.0, 1.0, 1.0])),
    ])
}

fn octant_seeds() -> Vec<[f64; 3]> {
    let mut seeds = Vec::with_capacity(8);
    for x in [0.25, 0.75] {
        for y in [0.25, 0.75] {
            for z in [0.25, 0.75] {
                seeds.push([x, y, z]);
            }
        }
    }
    seeds
}

#[test]
fn test_single_cell_cube() {
    let cells = tessellate(&unit_cube(), 1, 2.0).unwrap();
    assert_eq!(cells.len(), 1);
    assert_eq!(cells[0].seed_index, 0);
    assert_abs_diff_eq!(cells[0].volume(), 1.0, epsilon = 1e-9);
    assert!(cells[0].mesh.is_watertight());
}

#[test]
fn test_tessellation_cells_octet() {
    let mut tess = Tessellation::with_seeds(&unit_cube(), octant_seeds(), 2.0).unwrap();
    tess.calculate();

    assert_eq!(tess.cells().len(), 8);
    assert!(tess.report().is_complete());

    let mut total_vol = 0.0;
    for (i, cell) in tess.cells().iter().enumerate() {
        assert_eq!(cell.seed_index, i);
        let vol = cell.volume();
        assert_abs_diff_eq!(vol, 0.125, epsilon = 1e-6);
        total_vol += vol;
    }
    assert_abs_diff_eq!(total_vol, 1.0, epsilon = 1e-6);
}

#[test]
fn test_two_shells_one_seed_each() {
    let mesh = two_cubes();
    let mut tess = Tessellation::with_seeds(&mesh, vec![[0.5, 0.5, 0.5], [3.5, 0.5, 0.5]], 2.0).unwrap();
    assert_eq!(tess.shells().count(), 2);
    tess.calculate();

    let cells = tess.cells();
    assert_eq!(cells.len(), 2);
    assert_eq!(tess.report().integrity, Some(IntegrityNotice::MultipleShells(2)));

    let first = cells[0].mesh.bounds().unwrap();
    assert!(first.max[0] <= 1.0 + 1e-12);
    assert_abs_diff_eq!(cells[0].volume(), 1.0, epsilon = 1e-9);

    let second = cells[1].mesh.bounds().unwrap();
    assert!(second.min[0] >= 3.0 - 1e-12);
    assert_abs_diff_eq!(cells[1].volume(), 1.0, epsilon = 1e-9);
}

#[test]
fn test_cell_spanning_two_shells() {
    // Both seeds sit in the first cube, so the second cell also owns the far cube.
    let mut tess = Tessellation::with_seeds(&two_cubes(), vec![[0.25, 0.5, 0.5], [0.75, 0.5, 0.5]], 2.0).unwrap();
    tess.calculate();
    let cells = tess.cells();
    assert_eq!(cells.len(), 2);
    assert_abs_diff_eq!(cells[0].volume(), 0.5, epsilon = 1e-9);
    assert_abs_diff_eq!(cells[1].volume(), 1.5, epsilon = 1e-9);
}

#[test]
fn test_degenerate_mesh_exhausts_sampling() {
    let flat = TriMesh::new(
        vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0, 0.0],
        vec![0, 1, 2, 0, 2, 3],
    );
    let config = TessellationConfig::new(2, 2.0)
        .with_max_sampling_attempts(5_000)
        .with_rng_seed(9);
    match tessellate_with_config(&flat, &config) {
        Err(TessellationError::SamplingExhausted { requested, found, attempts }) => {
            assert_eq!(requested, 2);
            assert_eq!(found, 0);
            assert_eq!(attempts, 5_000);
        }
        other => panic!("expected SamplingExhausted, got {:?}", other.map(|(c, _)| c.len())),
    }
}

#[test]
fn test_empty_mesh() {
    assert!(matches!(
        tessellate(&TriMesh::default(), 1, 2.0),
        Err(TessellationError::EmptyMesh)
    ));
}

#[test]
fn test_seed_feasibility() {
    let cube = unit_cube();
    let seeds = sample_seeds(&cube, 12, 100_000, &mut StdRng::seed_from_u64(5)).unwrap();
    let tess = Tessellation::with_seeds(&cube, seeds.clone(), 2.0).unwrap();

    for (i, seed) in seeds.iter().enumerate() {
        let system = bisector_system(&AllSeeds, &seeds, i, tess.max_extent());
        assert!(system.iter().all(|h| h.evaluate(seed) < 0.0));
        assert!(tess.closure.halfspaces().iter().all(|h| h.evaluate(seed) < 0.0));

        let hull = tess.hull(i).unwrap();
        assert!(hull.is_watertight());
        assert!(hull.contains(seed));
    }
}

#[test]
fn test_hulls_partition_closure_box() {
    // Cells neither overlap nor leave gaps: their volumes add up to the box.
    let cube = unit_cube();
    let seeds = sample_seeds(&cube, 20, 100_000, &mut StdRng::seed_from_u64(11)).unwrap();
    let tess = Tessellation::with_seeds(&cube, seeds, 2.0).unwrap();

    let extent = tess.closure.extent();
    let box_volume = extent[0] * extent[1] * extent[2];
    let total: f64 = (0..tess.seeds.len()).map(|i| tess.hull(i).unwrap().volume()).sum();
    assert_abs_diff_eq!(total, box_volume, epsilon = 1e-8);
}

#[test]
fn test_bisector_shift_prevents_overlap() {
    let seeds = vec![[0.3, 0.5, 0.5], [0.7, 0.5, 0.5]];
    let tess = Tessellation::with_seeds(&unit_cube(), seeds, 2.0).unwrap();
    let a = tess.hull(0).unwrap().bounds().unwrap();
    let b = tess.hull(1).unwrap().bounds().unwrap();
    assert!(a.max[0] < b.min[0]);
    assert_abs_diff_eq!(a.max[0], 0.5, epsilon = 1e-9);
}

#[test]
fn test_bisector_shift_holds_in_large_closure() {
    // The closure box is a thousand times the mesh; the cells still must not overlap.
    let seeds = vec![[0.3, 0.5, 0.5], [0.7, 0.5, 0.5]];
    let tess = Tessellation::with_seeds(&unit_cube(), seeds, 1e3).unwrap();
    let a = tess.hull(0).unwrap().bounds().unwrap();
    let b = tess.hull(1).unwrap().bounds().unwrap();
    assert!(a.max[0] < b.min[0], "gap {}", b.min[0] - a.max[0]);
    assert_abs_diff_eq!(a.max[0], 0.5, epsilon = 1e-9);
}

#[test]
fn test_cells_stay_inside_mesh() {
    let config = TessellationConfig::new(10, 2.0).with_rng_seed(21);
    let (cells, report) = tessellate_with_config(&unit_cube(), &config).unwrap();
    assert!(cells.len() <= 10);
    assert_eq!(report.requested, 10);
    assert_eq!(report.produced + report.discarded.len(), 10);

    for cell in &cells {
        for v in cell.mesh.vertices.chunks_exact(3) {
            assert!(v.iter().all(|c| (-1e-9..=1.0 + 1e-9).contains(c)), "vertex {v:?} outside mesh");
        }
    }
    let total: f64 = cells.iter().map(|c| c.volume()).sum();
    assert_abs_diff_eq!(total, 1.0, epsilon = 1e-6);
}

#[test]
fn test_seed_order_preserved() {
    let config = TessellationConfig::new(6, 2.0).with_rng_seed(2);
    let mut tess = Tessellation::new(&unit_cube(), &config).unwrap();
    tess.calculate();
    let order: Vec<usize> = tess.cells().iter().map(|c| c.seed_index).collect();
    let mut sorted = order.clone();
    sorted.sort_unstable();
    assert_eq!(order, sorted);
    for cell in tess.cells() {
        assert_eq!(cell.seed, tess.seeds[cell.seed_index]);
    }
}

#[test]
fn test_discarded_seed_is_reported() {
    let mut tess = Tessellation::with_seeds(&unit_cube(), vec![[0.5, 0.5, 0.5], [0.5, 0.5, 5.0]], 20.0).unwrap();
    tess.calculate();
    assert_eq!(tess.cells().len(), 1);
    assert_eq!(tess.report().discarded, vec![(1, CellDiscard::NoShellIntersection)]);
}
