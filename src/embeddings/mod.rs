//! Text embedding backends.
//!
//! Every backend implements [`EmbeddingProvider`], a single capability that maps
//! already-normalized text to a fixed-length vector. Store and retrieval code only
//! ever see the trait, so swapping backends cannot change ranking or expansion.

pub mod hashing;
pub mod openai;

pub use hashing::HashingEmbedder;
pub use openai::OpenAIEmbedder;

use crate::error::Result;
use std::time::Instant;

/// Embedding vector type shared by the store, retriever and backends.
pub type Embedding = Vec<f32>;

/// Determinism configuration handed once to a backend constructor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmbeddingSettings {
    /// Length of every vector the backend produces
    pub dimensions: usize,
    /// Seed mixed into every hash (ignored by remote backends)
    pub seed: u64,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            dimensions: 384,
            seed: 42,
        }
    }
}

/// Deterministic text -> vector function.
///
/// Implementations must return bit-identical output for identical input, and all
/// vectors from one provider must share a dimension. Input is expected to be the
/// output of [`normalize_text`]; use [`embed_text`] to normalize and embed in one go.
pub trait EmbeddingProvider {
    fn embed(&self, normalized_text: &str) -> Result<Embedding>;
}

impl<P: EmbeddingProvider + ?Sized> EmbeddingProvider for &P {
    fn embed(&self, normalized_text: &str) -> Result<Embedding> {
        (**self).embed(normalized_text)
    }
}

impl<P: EmbeddingProvider + ?Sized> EmbeddingProvider for Box<P> {
    fn embed(&self, normalized_text: &str) -> Result<Embedding> {
        (**self).embed(normalized_text)
    }
}

/// Lower-case and collapse whitespace runs to a single space.
pub fn normalize_text(text: &str) -> String {
    text.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Normalize `text` and embed it with `provider`.
pub fn embed_text<P: EmbeddingProvider + ?Sized>(provider: &P, text: &str) -> Result<Embedding> {
    let normalized = normalize_text(text);
    let start = Instant::now();
    let embedding = provider.embed(&normalized)?;
    log::debug!(
        "Embedded {:?} ({} dims) in {:?}",
        normalized,
        embedding.len(),
        start.elapsed()
    );
    Ok(embedding)
}
