pub mod cache;
pub mod config;
pub mod context;
pub mod embeddings;
pub mod error;
pub mod graph;
pub mod ingest;
pub mod search;

#[cfg(test)]
mod test_support;

pub use config::Config;
pub use context::{build_context, format_context, ContextParams, ContextStyle, KnowledgeContext};
pub use embeddings::{EmbeddingProvider, EmbeddingSettings};
pub use error::{KgError, Result};
pub use graph::{expand_subgraph, Triple, TripleStore};
pub use search::{retrieve, Retrieval, ScoredTriple};
