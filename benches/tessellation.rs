use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::rngs::StdRng;
use rand::SeedableRng;
use vorosplit::{sample_seeds, BoundingBox, Tessellation, TessellationConfig, TriMesh};

const NUM_CELLS: usize = 64;

fn two_boxes() -> TriMesh {
    TriMesh::concat(&[
        TriMesh::cuboid(&BoundingBox::new([0.0, 0.0, 0.0], [100.0, 100.0, 100.0])),
        TriMesh::cuboid(&BoundingBox::new([150.0, 0.0, 0.0], [250.0, 100.0, 100.0])),
    ])
}

fn benchmark_sampling(c: &mut Criterion) {
    let mesh = two_boxes();

    c.bench_function(&format!("sample_seeds_{}", NUM_CELLS), |b| {
        let mut rng = StdRng::seed_from_u64(123456789);
        b.iter(|| {
            black_box(sample_seeds(&mesh, NUM_CELLS, 1_000_000, &mut rng).ok());
        })
    });
}

fn benchmark_tessellation_calculate(c: &mut Criterion) {
    let mesh = two_boxes();
    let config = TessellationConfig::new(NUM_CELLS, 2.0).with_rng_seed(123456789);

    let mut tess = match Tessellation::new(&mesh, &config) {
        Ok(tess) => tess,
        Err(err) => panic!("setup failed: {err}"),
    };

    c.bench_function(&format!("calculate_{}_cells", NUM_CELLS), |b| {
        b.iter(|| {
            tess.calculate();
            black_box(tess.cells().len());
        })
    });
}

criterion_group!(benches, benchmark_sampling, benchmark_tessellation_calculate);
criterion_main!(benches);
