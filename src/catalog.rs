//! Product records and the catalog collaborator contract.
//!
//! The catalog owns products; this crate only reads them. [`Catalog`] is
//! the seam through which every rule-based candidate query, popularity
//! lookup and embedding build reaches product data. [`MemoryCatalog`]
//! is a thread-safe in-memory implementation used by the CLI and tests.

pub mod memory;

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{RecommendError, Result};

pub use memory::MemoryCatalog;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                Self(value)
            }
        }
    };
}

define_id!(
    /// Stable product identifier. Natural ordering breaks similarity ties.
    ProductId
);
define_id!(
    /// Identifier of a user whose views drive personalization.
    UserId
);
define_id!(
    /// Identifier of a product category.
    CategoryId
);
define_id!(
    /// Identifier of a product tag.
    TagId
);

/// Lifecycle status of a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductStatus {
    /// Listed and purchasable.
    #[serde(alias = "Active")]
    Active,
    /// Listed with a low stock warning.
    #[serde(alias = "Low Stock")]
    LowStock,
    /// Hidden from the storefront.
    #[serde(alias = "Inactive")]
    Inactive,
    /// Listed but not purchasable.
    #[serde(alias = "Out of Stock")]
    OutOfStock,
}

impl ProductStatus {
    /// Get the display label of this status.
    pub fn label(&self) -> &'static str {
        match self {
            ProductStatus::Active => "Active",
            ProductStatus::LowStock => "Low Stock",
            ProductStatus::Inactive => "Inactive",
            ProductStatus::OutOfStock => "Out of Stock",
        }
    }
}

impl FromStr for ProductStatus {
    type Err = RecommendError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().replace(['_', ' '], "").as_str() {
            "active" => Ok(ProductStatus::Active),
            "lowstock" => Ok(ProductStatus::LowStock),
            "inactive" => Ok(ProductStatus::Inactive),
            "outofstock" => Ok(ProductStatus::OutOfStock),
            _ => Err(RecommendError::invalid_argument(format!(
                "Unknown product status: {s}"
            ))),
        }
    }
}

/// A product category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
}

/// A product tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub id: TagId,
    pub name: String,
}

/// A catalog product as seen by the recommendation core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub tags: Vec<Tag>,
    /// Price in whole currency units.
    pub price: f64,
    pub stock: u32,
    pub status: ProductStatus,
    pub created_at: DateTime<Utc>,
}

impl Product {
    /// Create an active product with one unit of stock and no optional attributes.
    pub fn new<S: Into<String>>(id: impl Into<ProductId>, name: S, price: f64) -> Self {
        Product {
            id: id.into(),
            name: name.into(),
            description: None,
            category: None,
            tags: Vec::new(),
            price,
            stock: 1,
            status: ProductStatus::Active,
            created_at: Utc::now(),
        }
    }

    pub fn with_description<S: Into<String>>(mut self, description: S) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_category<S: Into<String>>(mut self, id: impl Into<CategoryId>, name: S) -> Self {
        self.category = Some(Category {
            id: id.into(),
            name: name.into(),
        });
        self
    }

    pub fn with_tag<S: Into<String>>(mut self, id: impl Into<TagId>, name: S) -> Self {
        self.tags.push(Tag {
            id: id.into(),
            name: name.into(),
        });
        self
    }

    pub fn with_stock(mut self, stock: u32) -> Self {
        self.stock = stock;
        self
    }

    pub fn with_status(mut self, status: ProductStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    /// Whether the product may be recommended: active and in stock.
    pub fn is_available(&self) -> bool {
        self.status == ProductStatus::Active && self.stock > 0
    }

    /// Category identifier, if the product has a category.
    pub fn category_id(&self) -> Option<CategoryId> {
        self.category.as_ref().map(|category| category.id)
    }

    /// Iterate over the product's tag identifiers.
    pub fn tag_ids(&self) -> impl Iterator<Item = TagId> + '_ {
        self.tags.iter().map(|tag| tag.id)
    }
}

/// Read-only product source consumed by the recommendation core.
///
/// All filtered queries (`find_products_by_*`, `most_recently_created`)
/// return only available products and never return an ID contained in
/// `exclude`. A `limit` of `None` asks for every match so that callers can
/// sample from the full eligible set.
pub trait Catalog: Send + Sync {
    /// All products eligible for the embedding corpus.
    fn list_active_in_stock_products(&self) -> Result<Vec<Product>>;

    /// Available products in any of the given categories.
    fn find_products_by_category(
        &self,
        categories: &[CategoryId],
        exclude: &HashSet<ProductId>,
        limit: Option<usize>,
    ) -> Result<Vec<Product>>;

    /// Available products priced within `[min, max]`.
    fn find_products_by_price_range(
        &self,
        min: f64,
        max: f64,
        exclude: &HashSet<ProductId>,
        limit: Option<usize>,
    ) -> Result<Vec<Product>>;

    /// Available products carrying at least one of the given tags.
    fn find_products_by_tags(
        &self,
        tags: &[TagId],
        exclude: &HashSet<ProductId>,
        limit: Option<usize>,
    ) -> Result<Vec<Product>>;

    /// Products with the given IDs regardless of status. Unknown IDs are skipped.
    fn find_products_by_ids(&self, ids: &[ProductId]) -> Result<Vec<Product>>;

    /// Newest available products first.
    fn most_recently_created(
        &self,
        exclude: &HashSet<ProductId>,
        limit: usize,
    ) -> Result<Vec<Product>>;

    /// Version of the eligible corpus; changes whenever products change.
    fn corpus_version(&self) -> u64 {
        0
    }
}
