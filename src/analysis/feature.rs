//! Product feature extraction.
//!
//! Turns one product into a weighted text document. Weighting is done by
//! repetition so that raw term frequency in the vectorizer reflects field
//! importance: the name counts three times, category and tag names twice,
//! the description once, plus a single price bucket token.

use serde::{Deserialize, Serialize};

use crate::catalog::Product;

const NAME_REPETITIONS: usize = 3;
const CATEGORY_REPETITIONS: usize = 2;
const TAG_REPETITIONS: usize = 2;

/// Price band of a product, expressed as one categorical token.
///
/// Thresholds are fixed currency-unit constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceBucket {
    /// Below 1000.
    BudgetFriendly,
    /// Below 5000.
    Affordable,
    /// Below 15000.
    MidRange,
    /// Below 50000.
    Premium,
    /// 50000 and above.
    Luxury,
}

impl PriceBucket {
    /// Classify a price.
    pub fn for_price(price: f64) -> Self {
        if price < 1000.0 {
            PriceBucket::BudgetFriendly
        } else if price < 5000.0 {
            PriceBucket::Affordable
        } else if price < 15000.0 {
            PriceBucket::MidRange
        } else if price < 50000.0 {
            PriceBucket::Premium
        } else {
            PriceBucket::Luxury
        }
    }

    /// The token emitted into the document.
    pub fn token(&self) -> &'static str {
        match self {
            PriceBucket::BudgetFriendly => "budget_friendly",
            PriceBucket::Affordable => "affordable",
            PriceBucket::MidRange => "mid_range",
            PriceBucket::Premium => "premium",
            PriceBucket::Luxury => "luxury",
        }
    }
}

/// Builds the text document of a product.
#[derive(Debug, Clone, Copy, Default)]
pub struct FeatureExtractor;

impl FeatureExtractor {
    pub fn new() -> Self {
        FeatureExtractor
    }

    /// Build the lowercase document for one product.
    ///
    /// # Examples
    ///
    /// ```
    /// use curio::analysis::feature::FeatureExtractor;
    /// use curio::catalog::Product;
    ///
    /// let product = Product::new(1, "Red Shoes", 2000.0).with_category(1, "Footwear");
    /// let document = FeatureExtractor::new().extract(&product);
    /// assert_eq!(
    ///     document,
    ///     "red shoes red shoes red shoes footwear footwear affordable"
    /// );
    /// ```
    pub fn extract(&self, product: &Product) -> String {
        let mut parts: Vec<&str> = Vec::new();

        parts.extend(std::iter::repeat_n(product.name.as_str(), NAME_REPETITIONS));

        if let Some(description) = product.description.as_deref() {
            parts.push(description);
        }

        if let Some(category) = &product.category {
            parts.extend(std::iter::repeat_n(
                category.name.as_str(),
                CATEGORY_REPETITIONS,
            ));
        }

        for tag in &product.tags {
            parts.extend(std::iter::repeat_n(tag.name.as_str(), TAG_REPETITIONS));
        }

        parts.push(PriceBucket::for_price(product.price).token());

        parts.join(" ").to_lowercase()
    }
}
