//! Vector operations for embeddings.

use crate::{Error, ErrorContext, Result};

pub type Vector = Vec<f32>;

fn ensure_same_dimensions(a: &[f32], b: &[f32]) -> Result<()> {
    if a.len() != b.len() {
        return Err(Error::invalid_input_with_context(
            format!("Vector dimensions must match: {} != {}", a.len(), b.len()),
            ErrorContext::new().with_source("embedding_service"),
        ));
    }
    Ok(())
}

pub fn dot_product(a: &[f32], b: &[f32]) -> Result<f32> {
    ensure_same_dimensions(a, b)?;
    Ok(a.iter().zip(b.iter()).map(|(x, y)| x * y).sum())
}

pub fn magnitude(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

/// Cosine similarity in `[-1, 1]`; 0.0 when either vector has zero magnitude.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32> {
    let dot = dot_product(a, b)?;
    let mag_a = magnitude(a);
    let mag_b = magnitude(b);
    if mag_a == 0.0 || mag_b == 0.0 {
        return Ok(0.0);
    }
    Ok(dot / (mag_a * mag_b))
}
