//! End-to-end context building: retrieve seeds, expand them, render both styles.

use crate::context::{render_context, ContextStyle};
use crate::embeddings::EmbeddingProvider;
use crate::error::Result;
use crate::graph::{expand_subgraph, Triple, TripleStore};
use crate::search::{retrieve, Retrieval};

/// Retrieval and expansion knobs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContextParams {
    pub top_k: usize,
    pub threshold: f32,
    pub hops: usize,
    pub max_neighbors_per_hop: usize,
}

impl Default for ContextParams {
    fn default() -> Self {
        Self {
            top_k: 5,
            threshold: 0.5,
            hops: 1,
            max_neighbors_per_hop: 10,
        }
    }
}

/// Everything a caller needs to compose a downstream prompt.
#[derive(Debug, Clone, PartialEq)]
pub struct KnowledgeContext {
    /// Query exactly as the caller passed it
    pub query: String,
    /// Seed ranking plus the best-match diagnostic
    pub retrieval: Retrieval,
    /// Expanded triple set, sorted by `(head, relation, tail)`
    pub triples: Vec<Triple>,
    pub natural: String,
    pub structured: String,
}

impl KnowledgeContext {
    pub fn render(&self, style: ContextStyle) -> &str {
        match style {
            ContextStyle::Natural => &self.natural,
            ContextStyle::Structured => &self.structured,
        }
    }
}

/// Retrieve seed triples for `query`, expand them and render the result.
pub fn build_context<P: EmbeddingProvider>(
    store: &TripleStore<P>,
    query: &str,
    params: &ContextParams,
) -> Result<KnowledgeContext> {
    let retrieval = retrieve(store, query, params.top_k, params.threshold)?;
    let triples = expand_subgraph(
        store,
        &retrieval.triples(),
        params.hops,
        params.max_neighbors_per_hop,
    );

    log::info!(
        "Context for {:?}: {} seed triples expanded to {}",
        query,
        retrieval.ranked.len(),
        triples.len()
    );

    Ok(KnowledgeContext {
        query: query.to_string(),
        natural: render_context(&triples, ContextStyle::Natural),
        structured: render_context(&triples, ContextStyle::Structured),
        retrieval,
        triples,
    })
}
