use serde::{Deserialize, Serialize};

use crate::domain::errors::{DomainError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Embedding(pub Vec<f32>);

impl Embedding {
    pub fn new(vec: Vec<f32>) -> Self {
        Self(vec)
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn dimension(&self) -> usize {
        self.0.len()
    }

    pub fn into_inner(self) -> Vec<f32> {
        self.0
    }

    /// Enforces the process-wide dimension invariant.
    ///
    /// A wrong-length vector would corrupt the shared index or be rejected
    /// by it, so a mismatch is a hard failure, never a warning.
    pub fn ensure_dimension(&self, expected: usize) -> Result<()> {
        if self.0.len() == expected {
            Ok(())
        } else {
            Err(DomainError::DimensionMismatch {
                expected,
                actual: self.0.len(),
            })
        }
    }

    pub fn cosine_similarity(&self, other: &Embedding) -> f32 {
        if self.0.len() != other.0.len() || self.0.is_empty() {
            return 0.0;
        }

        let dot_product: f32 = self.0.iter().zip(other.0.iter()).map(|(a, b)| a * b).sum();
        let norm_a: f32 = self.0.iter().map(|x| x * x).sum::<f32>().sqrt();
        let norm_b: f32 = other.0.iter().map(|x| x * x).sum::<f32>().sqrt();

        if norm_a == 0.0 || norm_b == 0.0 {
            return 0.0;
        }

        dot_product / (norm_a * norm_b)
    }
}

impl From<Vec<f32>> for Embedding {
    fn from(vec: Vec<f32>) -> Self {
        Self(vec)
    }
}

impl AsRef<[f32]> for Embedding {
    fn as_ref(&self) -> &[f32] {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_dimension() {
        let embedding = Embedding::new(vec![0.0; 4]);
        assert!(embedding.ensure_dimension(4).is_ok());

        let err = embedding.ensure_dimension(8).unwrap_err();
        assert!(matches!(
            err,
            DomainError::DimensionMismatch {
                expected: 8,
                actual: 4
            }
        ));
    }

    #[test]
    fn test_cosine_similarity_of_identical_vectors() {
        let a = Embedding::new(vec![1.0, 2.0, 3.0]);
        assert!((a.cosine_similarity(&a) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_similarity_mismatched_or_zero() {
        let a = Embedding::new(vec![1.0, 0.0]);
        let b = Embedding::new(vec![1.0, 0.0, 0.0]);
        assert_eq!(a.cosine_similarity(&b), 0.0);

        let zero = Embedding::new(vec![0.0, 0.0]);
        assert_eq!(a.cosine_similarity(&zero), 0.0);
    }
}
