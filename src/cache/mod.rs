pub mod embedding_cache;

pub use embedding_cache::{CachedEmbedder, EmbeddingCache};
