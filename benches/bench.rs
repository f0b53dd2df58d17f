//! Criterion benchmarks for Curio.
//!
//! Covers the costs that scale with catalog size: document analysis,
//! snapshot construction, nearest-neighbour lookup and uncached
//! related-product requests.

use std::hint::black_box;
use std::sync::Arc;

use chrono::Utc;
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use curio::analysis::{FeatureExtractor, StandardTokenizer, Tokenizer};
use curio::catalog::{MemoryCatalog, Product, ProductId};
use curio::config::{EmbeddingConfig, RecommenderConfig};
use curio::embedding::SnapshotBuilder;
use curio::recommend::HybridRecommender;
use curio::similarity::SimilarityEngine;

/// Generate a synthetic catalog for benchmarking.
fn generate_test_products(count: usize) -> Vec<Product> {
    let adjectives = [
        "wireless", "leather", "organic", "compact", "vintage", "waterproof", "ergonomic",
        "portable", "insulated", "ceramic",
    ];
    let nouns = [
        "headphones", "boots", "backpack", "keyboard", "jacket", "blender", "lamp", "tent",
        "camera", "bottle", "chair", "speaker",
    ];
    let categories = ["Electronics", "Footwear", "Outdoor", "Kitchen", "Furniture"];
    let tags = ["bestseller", "eco", "gift", "premium", "travel", "sale"];

    (0..count)
        .map(|i| {
            let adjective = adjectives[(i * 7) % adjectives.len()];
            let noun = nouns[(i * 13) % nouns.len()];
            let category = (i * 3) % categories.len();
            let tag = (i * 5) % tags.len();
            let price = 500.0 + ((i * 7919) % 80_000) as f64;

            Product::new(i as u64 + 1, format!("{adjective} {noun}"), price)
                .with_description(format!("A {adjective} {noun} built for daily use"))
                .with_category(category as u64 + 1, categories[category])
                .with_tag(tag as u64 + 1, tags[tag])
        })
        .collect()
}

/// Benchmark document extraction and tokenization.
fn bench_analysis(c: &mut Criterion) {
    let mut group = c.benchmark_group("analysis");

    let products = generate_test_products(1000);
    let extractor = FeatureExtractor::new();
    let tokenizer = StandardTokenizer::new();

    group.throughput(Throughput::Elements(products.len() as u64));
    group.bench_function("extract_and_tokenize", |b| {
        b.iter(|| {
            for product in &products {
                let document = extractor.extract(black_box(product));
                black_box(tokenizer.tokenize(&document));
            }
        })
    });

    group.finish();
}

/// Benchmark snapshot construction at several catalog sizes.
fn bench_snapshot_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("snapshot_build");
    group.sample_size(20);

    let builder = SnapshotBuilder::new(&EmbeddingConfig::default());
    for size in [100, 1000, 5000] {
        let products = generate_test_products(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &products, |b, products| {
            b.iter(|| black_box(builder.build(black_box(products), 0, Utc::now()).unwrap()))
        });
    }

    group.finish();
}

/// Benchmark nearest-neighbour lookup.
fn bench_find_similar(c: &mut Criterion) {
    let mut group = c.benchmark_group("find_similar");

    let engine = SimilarityEngine::default();
    for size in [1000, 5000] {
        let products = generate_test_products(size);
        let snapshot = SnapshotBuilder::new(&EmbeddingConfig::default())
            .build(&products, 0, Utc::now())
            .unwrap();

        group.bench_with_input(BenchmarkId::from_parameter(size), &snapshot, |b, snapshot| {
            b.iter(|| black_box(engine.find_similar(ProductId(1), snapshot, 20)))
        });
    }

    group.finish();
}

/// Benchmark uncached related-product requests end to end.
fn bench_related_products(c: &mut Criterion) {
    let mut group = c.benchmark_group("related_products");

    let catalog = Arc::new(MemoryCatalog::with_products(generate_test_products(2000)));
    let recommender = HybridRecommender::new(catalog, RecommenderConfig::default())
        .unwrap()
        .with_seed(7);
    recommender.rebuild_embeddings().unwrap();

    let mut subject = 0u64;
    group.bench_function("uncached_limit_10", |b| {
        b.iter(|| {
            subject = subject % 2000 + 1;
            black_box(recommender.related_products(ProductId(subject), 10).unwrap())
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_analysis,
    bench_snapshot_build,
    bench_find_similar,
    bench_related_products
);
criterion_main!(benches);
