//! Text analysis for product documents.
//!
//! - [`feature`] builds one weighted document per product
//! - [`tokenizer`] splits documents into terms
//! - [`stop`] holds the stop word list used by the tokenizer

pub mod feature;
pub mod stop;
pub mod tokenizer;

pub use feature::{FeatureExtractor, PriceBucket};
pub use stop::StopWords;
pub use tokenizer::{StandardTokenizer, Tokenizer};
