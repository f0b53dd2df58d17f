//! Inverse document frequency weights.

use crate::embedding::vocabulary::{DocumentFrequencies, Vocabulary};

/// One `ln(N / df)` weight per vocabulary index.
#[derive(Debug, Clone, Default)]
pub struct IdfTable {
    weights: Vec<f64>,
}

impl IdfTable {
    /// Compute the weights of every vocabulary term.
    ///
    /// A term without a recorded document frequency is treated as
    /// appearing in one document.
    pub fn compute(vocabulary: &Vocabulary, frequencies: &DocumentFrequencies) -> Self {
        let total = frequencies.total_documents() as f64;

        let weights = vocabulary
            .terms()
            .map(|term| {
                let df = frequencies.get(term).unwrap_or(1).max(1) as f64;
                (total / df).ln()
            })
            .collect();

        IdfTable { weights }
    }

    /// Weight of the term at `index`.
    pub fn weight(&self, index: usize) -> Option<f64> {
        self.weights.get(index).copied()
    }

    /// Weight of a term looked up through its vocabulary.
    pub fn weight_of(&self, vocabulary: &Vocabulary, term: &str) -> Option<f64> {
        vocabulary
            .index_of(term)
            .and_then(|index| self.weight(index))
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.weights
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idf_weights() {
        let documents = vec![
            vec!["shoes".to_string(), "red".to_string()],
            vec!["shoes".to_string(), "blue".to_string()],
            vec!["laptop".to_string()],
            vec!["laptop".to_string(), "shoes".to_string()],
        ];
        let frequencies = DocumentFrequencies::from_tokenized(&documents);
        let vocabulary = Vocabulary::from_terms(
            vec!["laptop".to_string(), "shoes".to_string()],
            documents.len(),
        );

        let idf = IdfTable::compute(&vocabulary, &frequencies);
        assert_eq!(idf.len(), 2);

        let laptop = idf.weight_of(&vocabulary, "laptop").unwrap();
        let shoes = idf.weight_of(&vocabulary, "shoes").unwrap();
        assert!((laptop - (4.0f64 / 2.0).ln()).abs() < 1e-12);
        assert!((shoes - (4.0f64 / 3.0).ln()).abs() < 1e-12);
        assert!(laptop > shoes);
    }

    #[test]
    fn test_missing_frequency_defaults_to_one() {
        let frequencies = DocumentFrequencies::from_tokenized(&[
            vec!["a".to_string()],
            vec!["b".to_string()],
            vec!["c".to_string()],
        ]);
        let vocabulary = Vocabulary::from_terms(vec!["unseen".to_string()], 3);

        let idf = IdfTable::compute(&vocabulary, &frequencies);
        assert!((idf.weight(0).unwrap() - 3.0f64.ln()).abs() < 1e-12);
        assert_eq!(idf.weight(1), None);
    }
}
