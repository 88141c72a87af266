//! Vector math over embedding values.

mod vectors;

pub use vectors::{cosine_similarity, dot_product, magnitude, Vector};
