//! Rule-based candidate strategies.

use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};

use crate::catalog::{Catalog, CategoryId, Product, ProductId, TagId};
use crate::error::Result;

/// Preferences a rule-based strategy matches against.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Signals {
    /// Distinct category IDs, ascending.
    pub categories: Vec<CategoryId>,
    /// Reference price for the price window.
    pub price: Option<f64>,
    /// Distinct tag IDs, ascending.
    pub tags: Vec<TagId>,
}

impl Signals {
    /// Signals of a single product: its category, price and tags.
    pub fn from_product(product: &Product) -> Self {
        Self::from_products(std::slice::from_ref(product))
    }

    /// Aggregate signals of several products.
    ///
    /// Categories and tags are the union over all products; the price is
    /// their average. An empty slice yields empty signals.
    pub fn from_products(products: &[Product]) -> Self {
        let categories: BTreeSet<CategoryId> =
            products.iter().filter_map(Product::category_id).collect();
        let tags: BTreeSet<TagId> = products.iter().flat_map(Product::tag_ids).collect();
        let price = if products.is_empty() {
            None
        } else {
            Some(products.iter().map(|product| product.price).sum::<f64>() / products.len() as f64)
        };

        Signals {
            categories: categories.into_iter().collect(),
            price,
            tags: tags.into_iter().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty() && self.price.is_none() && self.tags.is_empty()
    }
}

/// A catalog query producing rule-based candidates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RuleStrategy {
    /// Products in any of the preferred categories.
    SameCategory,
    /// Products priced within `price × (1 ± tolerance)`.
    PriceWindow { tolerance: f64 },
    /// Products sharing at least one preferred tag.
    SharedTags,
}

impl RuleStrategy {
    pub fn name(&self) -> &'static str {
        match self {
            RuleStrategy::SameCategory => "same_category",
            RuleStrategy::PriceWindow { .. } => "price_window",
            RuleStrategy::SharedTags => "shared_tags",
        }
    }

    /// Every available product matching the signals, minus `exclude`.
    ///
    /// A strategy whose signal is missing matches nothing and does not
    /// query the catalog.
    pub fn candidates(
        &self,
        catalog: &dyn Catalog,
        signals: &Signals,
        exclude: &HashSet<ProductId>,
    ) -> Result<Vec<Product>> {
        match *self {
            RuleStrategy::SameCategory => {
                if signals.categories.is_empty() {
                    return Ok(Vec::new());
                }
                catalog.find_products_by_category(&signals.categories, exclude, None)
            }
            RuleStrategy::PriceWindow { tolerance } => match signals.price {
                Some(price) => {
                    let (min, max) = price_window(price, tolerance);
                    catalog.find_products_by_price_range(min, max, exclude, None)
                }
                None => Ok(Vec::new()),
            },
            RuleStrategy::SharedTags => {
                if signals.tags.is_empty() {
                    return Ok(Vec::new());
                }
                catalog.find_products_by_tags(&signals.tags, exclude, None)
            }
        }
    }
}

/// Inclusive price bounds `price × (1 ± tolerance)`, never below zero.
pub fn price_window(price: f64, tolerance: f64) -> (f64, f64) {
    ((price * (1.0 - tolerance)).max(0.0), price * (1.0 + tolerance))
}

/// One step of a rule-based plan: a strategy and how many IDs it may add.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Phase {
    pub strategy: RuleStrategy,
    /// `None` lets the strategy fill whatever quota remains.
    pub cap: Option<usize>,
}

impl Phase {
    pub fn uncapped(strategy: RuleStrategy) -> Self {
        Phase {
            strategy,
            cap: None,
        }
    }

    pub fn capped(strategy: RuleStrategy, cap: usize) -> Self {
        Phase {
            strategy,
            cap: Some(cap),
        }
    }
}
