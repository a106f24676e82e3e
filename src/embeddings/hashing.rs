//! Local feature-hashing embedder.
//!
//! Tokens and character trigrams are hashed with seeded SHA-256 into signed
//! buckets, then the vector is scaled to unit length. SHA-256 keeps the output
//! identical across processes and platforms, unlike `DefaultHasher`.

use sha2::{Digest, Sha256};

use super::{Embedding, EmbeddingProvider, EmbeddingSettings};
use crate::error::Result;

const TOKEN_WEIGHT: f32 = 1.0;
const TRIGRAM_WEIGHT: f32 = 0.5;

/// Deterministic, offline embedding backend.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    settings: EmbeddingSettings,
}

impl HashingEmbedder {
    pub fn new(settings: EmbeddingSettings) -> Self {
        Self {
            settings: EmbeddingSettings {
                dimensions: settings.dimensions.max(1),
                seed: settings.seed,
            },
        }
    }

    pub fn dimensions(&self) -> usize {
        self.settings.dimensions
    }

    fn bucket(&self, feature: &str) -> (usize, f32) {
        let mut hasher = Sha256::new();
        hasher.update(self.settings.seed.to_le_bytes());
        hasher.update(feature.as_bytes());
        let digest = hasher.finalize();

        let mut index_bytes = [0u8; 8];
        index_bytes.copy_from_slice(&digest[..8]);
        let index = (u64::from_le_bytes(index_bytes) % self.settings.dimensions as u64) as usize;
        let sign = if digest[8] & 1 == 0 { 1.0 } else { -1.0 };
        (index, sign)
    }

    fn add_feature(&self, vec: &mut [f32], feature: &str, weight: f32) {
        let (index, sign) = self.bucket(feature);
        vec[index] += sign * weight;
    }
}

impl EmbeddingProvider for HashingEmbedder {
    fn embed(&self, normalized_text: &str) -> Result<Embedding> {
        let mut vec = vec![0.0f32; self.settings.dimensions];

        for token in normalized_text.split_whitespace() {
            self.add_feature(&mut vec, &format!("w:{}", token), TOKEN_WEIGHT);

            let padded: Vec<char> = format!(" {} ", token).chars().collect();
            for window in padded.windows(3) {
                let trigram: String = window.iter().collect();
                self.add_feature(&mut vec, &format!("c:{}", trigram), TRIGRAM_WEIGHT);
            }
        }

        normalize(&mut vec);
        Ok(vec)
    }
}

fn normalize(vec: &mut [f32]) {
    let norm = vec.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
        for v in vec.iter_mut() {
            *v /= norm;
        }
    }
}
