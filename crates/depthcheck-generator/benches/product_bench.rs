//! Benchmarks for value generation and fair product enumeration.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use depthcheck_generator::{FairProduct, GenContext, Registry, Tag};

fn bench_fair_product(c: &mut Criterion) {
    let registry = Registry::new();
    let mut group = c.benchmark_group("fair_product");

    for depth in [4usize, 8, 16] {
        group.bench_with_input(BenchmarkId::new("int_x3", depth), &depth, |b, &depth| {
            b.iter(|| {
                let cx = GenContext::new(&registry);
                let tags = [Tag::int(), Tag::int(), Tag::int()];
                black_box(FairProduct::of_tags(&cx, &tags, depth).count())
            })
        });
    }

    group.finish();
}

fn bench_lists(c: &mut Criterion) {
    let registry = Registry::new();
    let mut group = c.benchmark_group("list_generation");

    for depth in [2usize, 3, 4] {
        group.bench_with_input(BenchmarkId::new("list_int", depth), &depth, |b, &depth| {
            let tag = Tag::list(Tag::int());
            b.iter(|| black_box(registry.generate(&tag, depth).len()))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_fair_product, bench_lists);
criterion_main!(benches);
