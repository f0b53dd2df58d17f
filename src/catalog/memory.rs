//! In-memory catalog implementation.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

use crate::catalog::{Catalog, CategoryId, Product, ProductId, TagId};
use crate::error::Result;

/// A thread-safe catalog held entirely in memory.
///
/// Every write bumps the corpus version, which makes the embedding cache
/// treat its published snapshot as belonging to an older corpus.
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    products: RwLock<BTreeMap<ProductId, Product>>,
    version: AtomicU64,
}

impl MemoryCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a catalog holding the given products.
    pub fn with_products<I: IntoIterator<Item = Product>>(products: I) -> Self {
        let catalog = Self::new();
        {
            let mut map = catalog.products.write();
            for product in products {
                map.insert(product.id, product);
            }
        }
        catalog
    }

    /// Load a catalog from a JSON array of products.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let products: Vec<Product> = serde_json::from_str(json)?;
        Ok(Self::with_products(products))
    }

    /// Load a catalog from a file containing a JSON array of products.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Insert or replace a product.
    pub fn upsert(&self, product: Product) {
        self.products.write().insert(product.id, product);
        self.version.fetch_add(1, Ordering::SeqCst);
    }

    /// Remove a product, returning it if it existed.
    pub fn remove(&self, id: ProductId) -> Option<Product> {
        let removed = self.products.write().remove(&id);
        if removed.is_some() {
            self.version.fetch_add(1, Ordering::SeqCst);
        }
        removed
    }

    /// Get a copy of a product by ID.
    pub fn get(&self, id: ProductId) -> Option<Product> {
        self.products.read().get(&id).cloned()
    }

    pub fn len(&self) -> usize {
        self.products.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.read().is_empty()
    }

    fn collect_available<F>(
        &self,
        exclude: &HashSet<ProductId>,
        limit: Option<usize>,
        predicate: F,
    ) -> Vec<Product>
    where
        F: Fn(&Product) -> bool,
    {
        self.products
            .read()
            .values()
            .filter(|product| {
                product.is_available() && !exclude.contains(&product.id) && predicate(product)
            })
            .take(limit.unwrap_or(usize::MAX))
            .cloned()
            .collect()
    }
}

impl Catalog for MemoryCatalog {
    fn list_active_in_stock_products(&self) -> Result<Vec<Product>> {
        Ok(self.collect_available(&HashSet::new(), None, |_| true))
    }

    fn find_products_by_category(
        &self,
        categories: &[CategoryId],
        exclude: &HashSet<ProductId>,
        limit: Option<usize>,
    ) -> Result<Vec<Product>> {
        Ok(self.collect_available(exclude, limit, |product| {
            product
                .category_id()
                .is_some_and(|id| categories.contains(&id))
        }))
    }

    fn find_products_by_price_range(
        &self,
        min: f64,
        max: f64,
        exclude: &HashSet<ProductId>,
        limit: Option<usize>,
    ) -> Result<Vec<Product>> {
        Ok(self.collect_available(exclude, limit, |product| {
            product.price >= min && product.price <= max
        }))
    }

    fn find_products_by_tags(
        &self,
        tags: &[TagId],
        exclude: &HashSet<ProductId>,
        limit: Option<usize>,
    ) -> Result<Vec<Product>> {
        Ok(self.collect_available(exclude, limit, |product| {
            product.tag_ids().any(|id| tags.contains(&id))
        }))
    }

    fn find_products_by_ids(&self, ids: &[ProductId]) -> Result<Vec<Product>> {
        let products = self.products.read();
        Ok(ids.iter().filter_map(|id| products.get(id).cloned()).collect())
    }

    fn most_recently_created(
        &self,
        exclude: &HashSet<ProductId>,
        limit: usize,
    ) -> Result<Vec<Product>> {
        let mut products = self.collect_available(exclude, None, |_| true);
        products.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        products.truncate(limit);
        Ok(products)
    }

    fn corpus_version(&self) -> u64 {
        self.version.load(Ordering::SeqCst)
    }
}
