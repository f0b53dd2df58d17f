//! # Curio
//!
//! Content-based product similarity and hybrid recommendations.
//!
//! ## Features
//!
//! - TF-IDF product embeddings with document-frequency filtering
//! - Cosine nearest-neighbour lookup with deterministic tie-breaking
//! - Rule-based candidates (category, price window, shared tags) blended
//!   with similarity results under configurable quotas
//! - Single-flight TTL caches for snapshots and results
//! - Per-user view histories driving personalized recommendations
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use curio::catalog::{MemoryCatalog, Product, ProductId};
//! use curio::config::RecommenderConfig;
//! use curio::recommend::HybridRecommender;
//!
//! let catalog = Arc::new(MemoryCatalog::with_products(vec![
//!     Product::new(1, "Red Shoes", 2000.0).with_category(1, "Footwear"),
//!     Product::new(2, "Blue Shoes", 2200.0).with_category(1, "Footwear"),
//!     Product::new(3, "Laptop", 150000.0).with_category(2, "Electronics"),
//! ]));
//!
//! let recommender = HybridRecommender::new(catalog, RecommenderConfig::default())?
//!     .with_seed(42);
//! let related = recommender.related_products(ProductId(1), 2)?;
//! assert_eq!(related[0], ProductId(2));
//! # Ok::<(), curio::error::RecommendError>(())
//! ```

pub mod analysis;
pub mod cache;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod embedding;
pub mod error;
pub mod history;
pub mod recommend;
pub mod similarity;

pub mod prelude {
    pub use crate::catalog::{Catalog, MemoryCatalog, Product, ProductId, UserId};
    pub use crate::config::RecommenderConfig;
    pub use crate::error::{RecommendError, Result};
    pub use crate::recommend::{HybridRecommender, RecommenderStats};
    pub use crate::similarity::ScoredProduct;
}

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
