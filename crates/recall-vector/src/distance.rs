//! Cosine similarity between embeddings.
//!
//! Scores are "higher is more similar". Components that are not
//! numbers (`NaN`) are read as `0.0`, so a single corrupt component degrades
//! the score instead of poisoning it.

use crate::error::{Error, Result};

#[inline]
fn component(v: f32) -> f64 {
    if v.is_nan() {
        0.0
    } else {
        v as f64
    }
}

fn check_dimensions(a: &[f32], b: &[f32]) -> Result<()> {
    if a.len() != b.len() {
        return Err(Error::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }
    Ok(())
}

/// Cosine similarity: `dot(a, b) / (|a| * |b|)`.
///
/// Returns `0.0` when either vector has zero magnitude.
///
/// # Errors
///
/// Returns [`Error::DimensionMismatch`] if `a.len() != b.len()`.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32> {
    check_dimensions(a, b)?;

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;

    for (&x, &y) in a.iter().zip(b.iter()) {
        let (x, y) = (component(x), component(y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let norm_a = norm_a.sqrt();
    let norm_b = norm_b.sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return Ok(0.0);
    }

    // Rounding can push identical vectors a hair past 1.0.
    Ok((dot / (norm_a * norm_b)).clamp(-1.0, 1.0) as f32)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn test_cosine_identical() {
        let v = vec![0.1f32; 10];
        let sim = cosine_similarity(&v, &v).unwrap();
        assert!((sim - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_cosine_orthogonal() {
        let sim = cosine_similarity(&[1.0, 0.0, 0.0, 0.0], &[0.0, 1.0, 0.0, 0.0]).unwrap();
        assert!(sim.abs() < 1e-5);
    }

    #[test]
    fn test_cosine_opposite() {
        let sim = cosine_similarity(&[1.0, 1.0, 1.0], &[-1.0, -1.0, -1.0]).unwrap();
        assert!((sim + 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_cosine_with_zero_components() {
        let a = [0.5, 0.0, 0.5];
        let sim = cosine_similarity(&a, &a).unwrap();
        assert!((sim - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_cosine_dimension_mismatch() {
        let err = cosine_similarity(&[0.1, 0.2, 0.3], &[0.1, 0.2]).unwrap_err();
        assert_eq!(
            err,
            Error::DimensionMismatch {
                expected: 3,
                actual: 2
            }
        );
    }

    #[test]
    fn test_cosine_zero_magnitude_is_zero() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 2.0]).unwrap(), 0.0);
        assert_eq!(cosine_similarity(&[1.0, 2.0], &[0.0, 0.0]).unwrap(), 0.0);
    }

    #[test]
    fn test_cosine_nan_component_reads_as_zero() {
        let sim = cosine_similarity(&[1.0, f32::NAN], &[1.0, 0.0]).unwrap();
        assert!((sim - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_cosine_random_vectors_stay_in_range() {
        let mut rng = rand::rng();
        for _ in 0..50 {
            let a: Vec<f32> = (0..64).map(|_| rng.random_range(-1.0..1.0)).collect();
            let b: Vec<f32> = (0..64).map(|_| rng.random_range(-1.0..1.0)).collect();
            let sim = cosine_similarity(&a, &b).unwrap();
            assert!((-1.0..=1.0).contains(&sim));
            let neg: Vec<f32> = a.iter().map(|x| -x).collect();
            assert!((cosine_similarity(&a, &neg).unwrap() + 1.0).abs() < 1e-4);
        }
    }
}
