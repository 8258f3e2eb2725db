//! Cosine similarity between embedding vectors.

use crate::types::{EmbedError, EmbedResult};

/// Compute cosine similarity between two vectors.
///
/// Fails on empty or mismatched inputs and on zero-norm vectors. `NaN`
/// components are not rejected and yield a `NaN` result.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> EmbedResult<f64> {
    if a.len() != b.len() {
        return Err(EmbedError::Computation(format!(
            "Cannot compute cosine similarity between embeddings of different sizes ({} and {})",
            a.len(),
            b.len()
        )));
    }
    if a.is_empty() {
        return Err(EmbedError::Computation(
            "Cannot compute cosine similarity of empty embeddings".to_string(),
        ));
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;

    for (x, y) in a.iter().zip(b.iter()) {
        let x = *x as f64;
        let y = *y as f64;
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom == 0.0 {
        return Err(EmbedError::Computation(
            "Cannot compute cosine similarity on embedding with 0 norm".to_string(),
        ));
    }

    Ok(dot / denom)
}

/// Scale a vector to unit length. Zero vectors are returned unchanged.
pub fn l2_normalize(v: Vec<f32>) -> Vec<f32> {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        v.iter().map(|x| x / norm).collect()
    } else {
        v
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_identical() {
        let a = vec![1.0, 2.0, 3.0];
        let sim = cosine_similarity(&a, &a).unwrap();
        assert!((sim - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_cosine_orthogonal() {
        let sim = cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).unwrap();
        assert!(sim.abs() < 1e-9);
    }

    #[test]
    fn test_cosine_opposite() {
        let sim = cosine_similarity(&[1.0, 2.0, 3.0], &[-1.0, -2.0, -3.0]).unwrap();
        assert!((sim + 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_cosine_mismatched_lengths() {
        assert!(matches!(
            cosine_similarity(&[1.0, 2.0], &[1.0]),
            Err(EmbedError::Computation(_))
        ));
    }

    #[test]
    fn test_cosine_empty() {
        assert!(cosine_similarity(&[], &[]).is_err());
    }

    #[test]
    fn test_cosine_zero_vector() {
        assert!(cosine_similarity(&[0.0, 0.0, 0.0], &[1.0, 2.0, 3.0]).is_err());
    }

    #[test]
    fn test_cosine_nan_propagates() {
        let sim = cosine_similarity(&[f32::NAN, 1.0], &[1.0, 1.0]).unwrap();
        assert!(sim.is_nan());
    }

    #[test]
    fn test_l2_normalize() {
        let v = l2_normalize(vec![3.0, 4.0]);
        assert!((v[0] - 0.6).abs() < 1e-6);
        assert!((v[1] - 0.8).abs() < 1e-6);
        assert_eq!(l2_normalize(vec![0.0, 0.0]), vec![0.0, 0.0]);
    }
}
