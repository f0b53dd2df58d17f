use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use chrono::{TimeDelta, Utc};

use curio::analysis::{FeatureExtractor, StandardTokenizer};
use curio::cache::ManualClock;
use curio::catalog::{MemoryCatalog, Product, ProductId, ProductStatus};
use curio::config::EmbeddingConfig;
use curio::embedding::{EmbeddingCache, SnapshotBuilder, VocabularyBuilder};
use curio::error::Result;
use curio::similarity::{SimilarityEngine, cosine_similarity};

fn three_products() -> Vec<Product> {
    vec![
        Product::new(1, "Red Shoes", 2000.0).with_category(1, "Footwear"),
        Product::new(2, "Blue Shoes", 2200.0).with_category(1, "Footwear"),
        Product::new(3, "Laptop", 150000.0).with_category(2, "Electronics"),
    ]
}

fn mixed_catalog() -> Vec<Product> {
    let names = [
        ("Trail Running Shoes", "Footwear", 4200.0),
        ("Road Running Shoes", "Footwear", 3900.0),
        ("Leather Hiking Boots", "Footwear", 8900.0),
        ("Wireless Noise Cancelling Headphones", "Electronics", 14900.0),
        ("Wireless Earbuds", "Electronics", 7900.0),
        ("Mechanical Keyboard", "Electronics", 6900.0),
        ("Cotton Running Shirt", "Apparel", 1900.0),
        ("Merino Hiking Socks", "Apparel", 900.0),
        ("Insulated Water Bottle", "Outdoor", 1500.0),
        ("Ultralight Hiking Tent", "Outdoor", 52000.0),
    ];
    names
        .iter()
        .enumerate()
        .map(|(index, (name, category, price))| {
            let category_id = match *category {
                "Footwear" => 1,
                "Electronics" => 2,
                "Apparel" => 3,
                _ => 4,
            };
            Product::new(index as u64 + 1, *name, *price)
                .with_category(category_id, *category)
                .with_description(format!("{name} for everyday use"))
        })
        .collect()
}

#[test]
fn three_product_corpus_ranks_shared_terms_first() -> Result<()> {
    let snapshot = SnapshotBuilder::new(&EmbeddingConfig::default()).build(
        &three_products(),
        0,
        Utc::now(),
    )?;

    let similar = SimilarityEngine::default().find_similar(ProductId(1), &snapshot, 2);
    assert_eq!(similar.len(), 1);
    assert_eq!(similar[0].product_id, ProductId(2));
    assert!(similar[0].score > 0.1);
    Ok(())
}

#[test]
fn every_vector_is_unit_length_or_zero() -> Result<()> {
    let snapshot =
        SnapshotBuilder::new(&EmbeddingConfig::default()).build(&mixed_catalog(), 0, Utc::now())?;
    assert_eq!(snapshot.len(), 10);
    assert!(snapshot.dimension() > 0);

    for vector in snapshot.vectors().values() {
        assert_eq!(vector.len(), snapshot.dimension());
        let norm = vector.norm();
        assert!(norm == 0.0 || (norm - 1.0).abs() < 1e-9, "norm was {norm}");
    }
    Ok(())
}

#[test]
fn cosine_similarity_is_symmetric_over_snapshot_vectors() -> Result<()> {
    let snapshot =
        SnapshotBuilder::new(&EmbeddingConfig::default()).build(&mixed_catalog(), 0, Utc::now())?;
    let vectors: Vec<_> = snapshot.vectors().values().collect();

    for a in &vectors {
        for b in &vectors {
            let ab = cosine_similarity(a.as_slice(), b.as_slice());
            let ba = cosine_similarity(b.as_slice(), a.as_slice());
            assert!((ab - ba).abs() < 1e-12);
        }
        if !a.is_zero() {
            assert!((cosine_similarity(a.as_slice(), a.as_slice()) - 1.0).abs() < 1e-9);
        }
    }
    Ok(())
}

#[test]
fn vocabulary_bounds_apply_to_document_frequency() {
    // "everywhere" is in all 10 documents, "twice" in 2, "once" in 1.
    let documents: Vec<String> = (0..10)
        .map(|i| {
            let mut document = format!("everywhere filler{i}");
            if i < 2 {
                document.push_str(" twice");
            }
            if i == 0 {
                document.push_str(" once");
            }
            document
        })
        .collect();

    let builder = VocabularyBuilder::new(Arc::new(StandardTokenizer::new()));
    let (vocabulary, frequencies) = builder.build(&documents);

    assert_eq!(frequencies.get("everywhere"), Some(10));
    assert!(!vocabulary.contains("everywhere"));
    assert!(!vocabulary.contains("once"));
    assert!(vocabulary.contains("twice"));
    assert_eq!(vocabulary.terms().collect::<Vec<_>>(), vec!["twice"]);
}

#[test]
fn find_similar_respects_threshold_limit_and_order() -> Result<()> {
    let snapshot =
        SnapshotBuilder::new(&EmbeddingConfig::default()).build(&mixed_catalog(), 0, Utc::now())?;
    let engine = SimilarityEngine::default();

    for subject in snapshot.product_ids() {
        for limit in [1, 3, 20] {
            let similar = engine.find_similar(subject, &snapshot, limit);
            assert!(similar.len() <= limit);
            assert!(similar.iter().all(|s| s.product_id != subject));
            assert!(similar.iter().all(|s| s.score > 0.1));
            for pair in similar.windows(2) {
                assert!(
                    pair[0].score > pair[1].score
                        || (pair[0].score == pair[1].score
                            && pair[0].product_id < pair[1].product_id)
                );
            }
        }
    }
    Ok(())
}

#[test]
fn unavailable_products_stay_out_of_the_corpus() -> Result<()> {
    let mut products = mixed_catalog();
    products[0].status = ProductStatus::OutOfStock;
    products[1].stock = 0;

    let snapshot = SnapshotBuilder::new(&EmbeddingConfig::default()).build(&products, 0, Utc::now())?;
    assert_eq!(snapshot.len(), 8);
    assert!(!snapshot.contains(ProductId(1)));
    assert!(!snapshot.contains(ProductId(2)));
    Ok(())
}

#[test]
fn feature_document_weights_fields() {
    let product = Product::new(1, "Trail Shoes", 4200.0)
        .with_description("Grippy")
        .with_category(1, "Footwear")
        .with_tag(1, "Outdoor");

    let document = FeatureExtractor::new().extract(&product);
    assert_eq!(
        document,
        "trail shoes trail shoes trail shoes grippy footwear footwear outdoor outdoor affordable"
    );
}

#[test]
fn snapshot_expires_and_rebuilds_with_manual_clock() -> Result<()> {
    let clock = Arc::new(ManualClock::default());
    let catalog = Arc::new(MemoryCatalog::with_products(three_products()));
    let config = EmbeddingConfig::default();
    let cache = EmbeddingCache::new(
        catalog,
        SnapshotBuilder::new(&config),
        config.snapshot_ttl(),
        clock.clone(),
    );

    let first = cache.get_or_build()?;
    let built_at = first.built_at();

    clock.advance(TimeDelta::hours(12));
    assert!(Arc::ptr_eq(&first, &cache.get_or_build()?));

    clock.advance(TimeDelta::hours(12));
    let second = cache.get_or_build()?;
    assert!(!Arc::ptr_eq(&first, &second));
    assert_eq!(second.built_at(), built_at + TimeDelta::hours(24));
    Ok(())
}

/// Catalog whose listing is slow and counted.
struct SlowCatalog {
    inner: MemoryCatalog,
    listings: AtomicUsize,
}

impl curio::catalog::Catalog for SlowCatalog {
    fn list_active_in_stock_products(&self) -> Result<Vec<Product>> {
        self.listings.fetch_add(1, Ordering::SeqCst);
        thread::sleep(Duration::from_millis(30));
        self.inner.list_active_in_stock_products()
    }

    fn find_products_by_category(
        &self,
        categories: &[curio::catalog::CategoryId],
        exclude: &std::collections::HashSet<ProductId>,
        limit: Option<usize>,
    ) -> Result<Vec<Product>> {
        self.inner.find_products_by_category(categories, exclude, limit)
    }

    fn find_products_by_price_range(
        &self,
        min: f64,
        max: f64,
        exclude: &std::collections::HashSet<ProductId>,
        limit: Option<usize>,
    ) -> Result<Vec<Product>> {
        self.inner.find_products_by_price_range(min, max, exclude, limit)
    }

    fn find_products_by_tags(
        &self,
        tags: &[curio::catalog::TagId],
        exclude: &std::collections::HashSet<ProductId>,
        limit: Option<usize>,
    ) -> Result<Vec<Product>> {
        self.inner.find_products_by_tags(tags, exclude, limit)
    }

    fn find_products_by_ids(&self, ids: &[ProductId]) -> Result<Vec<Product>> {
        self.inner.find_products_by_ids(ids)
    }

    fn most_recently_created(
        &self,
        exclude: &std::collections::HashSet<ProductId>,
        limit: usize,
    ) -> Result<Vec<Product>> {
        self.inner.most_recently_created(exclude, limit)
    }
}

#[test]
fn concurrent_cache_misses_share_one_build() -> Result<()> {
    let catalog = Arc::new(SlowCatalog {
        inner: MemoryCatalog::with_products(mixed_catalog()),
        listings: AtomicUsize::new(0),
    });
    let config = EmbeddingConfig::default();
    let cache = Arc::new(EmbeddingCache::new(
        catalog.clone(),
        SnapshotBuilder::new(&config),
        config.snapshot_ttl(),
        Arc::new(ManualClock::default()),
    ));

    let barrier = Arc::new(std::sync::Barrier::new(8));
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let cache = Arc::clone(&cache);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                cache.get_or_build().map(|snapshot| snapshot.len())
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap()?, 10);
    }
    assert_eq!(catalog.listings.load(Ordering::SeqCst), 1);
    Ok(())
}
