// Performance benchmarks for index build and batched retrieval
use booksim_core::{FeatureMatrix, Item, Retriever};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::prelude::*;
use rand::rngs::StdRng;

const WORDS: &[&str] = &[
    "dragon", "empire", "winter", "garden", "river", "shadow", "stone", "crown", "ocean", "night",
    "mirror", "forest", "storm", "kingdom", "silver", "harbor", "journey", "secret", "letters", "house",
];

fn generate_catalog(n: usize) -> Vec<Item> {
    let mut rng = StdRng::seed_from_u64(7);
    (0..n)
        .map(|i| {
            let title: Vec<&str> = (0..4).map(|_| WORDS[rng.random_range(0..WORDS.len())]).collect();
            Item::new(title.join(" "), format!("Author {}", i % 400))
                .with_publisher(Some(format!("Publisher {}", i % 60)))
        })
        .collect()
}

fn benchmark_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("build");

    for size in [1000, 10_000].iter() {
        let catalog = generate_catalog(*size);
        group.bench_with_input(BenchmarkId::new("tfidf", size), &catalog, |b, catalog| {
            b.iter(|| {
                let matrix = FeatureMatrix::build(black_box(catalog), 3000).unwrap();
                black_box(matrix);
            });
        });
    }

    group.finish();
}

fn benchmark_recommend(c: &mut Criterion) {
    let mut group = c.benchmark_group("recommend");

    let catalog = generate_catalog(10_000);
    let matrix = FeatureMatrix::build(&catalog, 3000).unwrap();
    let query = catalog[1234].title().to_string();

    for batch_size in [100, 1000, 10_000].iter() {
        let retriever = Retriever::new(*batch_size);
        group.bench_with_input(BenchmarkId::new("batch", batch_size), batch_size, |b, _| {
            b.iter(|| {
                let recs = retriever.recommend(&matrix, &catalog, black_box(&query), 10).unwrap();
                black_box(recs);
            });
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_build, benchmark_recommend);
criterion_main!(benches);
