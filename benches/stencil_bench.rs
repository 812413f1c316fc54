use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use halo_cg::algs::communicator::NoComm;
use halo_cg::algs::reduction::global_dot;
use halo_cg::algs::stencil::Stencil;
use halo_cg::data::grid::GridSpec;
use halo_cg::data::slab::Slab;
use halo_cg::topology::RowRange;

fn random_slab(nx: usize, ny: usize, seed: u64) -> Slab {
    let mut rng = SmallRng::seed_from_u64(seed);
    let mut s = Slab::new(nx, RowRange::new(1, ny - 1).unwrap()).unwrap();
    for j in 0..=ny {
        for u in s.interior_mut(j) {
            *u = rng.gen_range(-1.0..1.0);
        }
    }
    s
}

fn bench_stencil(c: &mut Criterion) {
    let mut group = c.benchmark_group("stencil");
    for &n in &[64usize, 256, 1024] {
        let spec = GridSpec::with_extent(n, n, 1.0, 1.0).unwrap();
        let st = Stencil::new(&spec);
        let f = random_slab(n, n, 42);
        let mut out = random_slab(n, n, 7);
        group.bench_with_input(BenchmarkId::new("apply", n), &n, |b, _| {
            b.iter(|| st.apply(black_box(&f), &mut out).unwrap())
        });
        group.bench_with_input(BenchmarkId::new("dot", n), &n, |b, _| {
            b.iter(|| global_dot(&NoComm, black_box(&f), black_box(&out)))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_stencil);
criterion_main!(benches);
