use crate::embeddings::{embed_text, EmbeddingProvider};
use crate::error::{KgError, Result};
use crate::graph::{Triple, TripleStore};
use std::cmp::Ordering;
use std::time::Instant;

/// A stored triple with its similarity to the query.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredTriple {
    pub triple: Triple,
    pub score: f32,
}

/// Outcome of [`retrieve`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Retrieval {
    /// Triples scoring at or above the threshold, best first, at most `top_k`
    pub ranked: Vec<ScoredTriple>,
    /// Highest-scoring stored triple regardless of threshold; `None` only for an empty store
    pub best: Option<ScoredTriple>,
}

impl Retrieval {
    pub fn triples(&self) -> Vec<Triple> {
        self.ranked.iter().map(|s| s.triple.clone()).collect()
    }

    pub fn best_score(&self) -> Option<f32> {
        self.best.as_ref().map(|s| s.score)
    }

    pub fn best_triple(&self) -> Option<&Triple> {
        self.best.as_ref().map(|s| &s.triple)
    }

    pub fn is_empty(&self) -> bool {
        self.ranked.is_empty()
    }
}

/// Rank stored triples against `query` by cosine similarity.
///
/// Edges are scored in ascending `(head, tail)` order so the float work is the
/// same on every run. Results are ordered by descending score, then
/// `(head, relation, tail)` ascending; ties therefore always resolve
/// alphabetically.
///
/// # Arguments
///
/// * `store` - Triple store whose provider also embeds the query
/// * `query` - Free-text query, normalized like node and edge text
/// * `top_k` - Maximum number of ranked triples to return
/// * `threshold` - Minimum cosine similarity (inclusive) for a ranked triple
pub fn retrieve<P: EmbeddingProvider>(
    store: &TripleStore<P>,
    query: &str,
    top_k: usize,
    threshold: f32,
) -> Result<Retrieval> {
    if store.is_empty() {
        log::debug!("Retrieval skipped: store has no edges");
        return Ok(Retrieval::default());
    }

    let start = Instant::now();
    let query_vec = embed_text(store.provider(), query)?;

    if let Some(dim) = store.dimension() {
        if query_vec.len() != dim {
            return Err(KgError::Embedding(format!(
                "Unexpected query embedding dimension: expected {}, got {}",
                dim,
                query_vec.len()
            )));
        }
    }

    let mut scored: Vec<ScoredTriple> = store
        .edges()
        .map(|edge| ScoredTriple {
            score: cosine_similarity(&query_vec, edge.embedding),
            triple: edge.to_triple(),
        })
        .collect();
    scored.sort_by(rank_order);

    let best = scored.first().cloned();
    let ranked: Vec<ScoredTriple> = scored
        .into_iter()
        .filter(|s| s.score >= threshold)
        .take(top_k)
        .collect();

    log::debug!(
        "Retrieved {} of {} triples (threshold {:.3}, best {:?}) in {:?}",
        ranked.len(),
        store.edge_count(),
        threshold,
        best.as_ref().map(|b| b.score),
        start.elapsed()
    );

    Ok(Retrieval { ranked, best })
}

fn rank_order(a: &ScoredTriple, b: &ScoredTriple) -> Ordering {
    score_order(b.score, a.score).then_with(|| a.triple.cmp(&b.triple))
}

/// Total order on scores where `-0.0` and `0.0` tie.
fn score_order(a: f32, b: f32) -> Ordering {
    let canonical = |s: f32| if s == 0.0 { 0.0 } else { s };
    canonical(a).total_cmp(&canonical(b))
}

/// Compute cosine similarity between two vectors
///
/// Returns `dot / (|a| * |b|)` in `[-1, 1]`, or 0.0 if either vector has zero
/// magnitude or the lengths differ.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let mag_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let mag_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    // Handle zero magnitude vectors
    if mag_a == 0.0 || mag_b == 0.0 {
        return 0.0;
    }

    dot / (mag_a * mag_b)
}
