//! In-memory directed triple store with a node/edge embedding cache.
//!
//! At most one relation is kept per ordered `(head, tail)` pair: adding a second
//! triple for the same pair overwrites the stored relation and its embedding.
//! Nothing is ever removed.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::embeddings::{embed_text, Embedding, EmbeddingProvider};
use crate::error::{KgError, Result};
use crate::graph::Triple;

/// Relation label and embedding stored for one ordered pair.
#[derive(Debug, Clone)]
struct Edge {
    relation: String,
    embedding: Embedding,
}

/// Borrowed view of a stored edge.
#[derive(Debug, Clone, Copy)]
pub struct StoredEdge<'a> {
    pub head: &'a str,
    pub relation: &'a str,
    pub tail: &'a str,
    pub embedding: &'a [f32],
}

impl StoredEdge<'_> {
    pub fn to_triple(&self) -> Triple {
        Triple::new(self.head, self.relation, self.tail)
    }
}

/// Directed graph of entities and relations plus cached embeddings.
///
/// Single-writer: `add` takes `&mut self`, every read takes `&self`.
pub struct TripleStore<P> {
    provider: P,
    /// head -> tail -> edge; BTreeMaps give sorted `(head, tail)` iteration
    out_edges: BTreeMap<String, BTreeMap<String, Edge>>,
    /// Undirected adjacency (outgoing and incoming), sorted
    adjacency: BTreeMap<String, BTreeSet<String>>,
    node_embeddings: HashMap<String, Embedding>,
    edge_count: usize,
    dimension: Option<usize>,
}

impl<P: EmbeddingProvider> TripleStore<P> {
    /// Create an empty store that embeds through `provider`.
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            out_edges: BTreeMap::new(),
            adjacency: BTreeMap::new(),
            node_embeddings: HashMap::new(),
            edge_count: 0,
            dimension: None,
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Insert or overwrite the edge `head -> tail` labelled `relation`.
    ///
    /// Missing node embeddings are computed first (in alphabetical node order),
    /// then the edge embedding from `"head relation tail"`. The edge only becomes
    /// visible once its embedding exists. Not transactional: node embeddings
    /// computed before a provider failure stay cached.
    pub fn add(&mut self, head: &str, relation: &str, tail: &str) -> Result<()> {
        validate_part("head", head)?;
        validate_part("relation", relation)?;
        validate_part("tail", tail)?;

        let mut nodes = [head, tail];
        nodes.sort_unstable();
        for node in nodes {
            if self.node_embeddings.contains_key(node) {
                continue;
            }
            let embedding = embed_text(&self.provider, node).map_err(|e| {
                KgError::Validation(format!("Failed to embed node '{}': {}", node, e))
            })?;
            self.check_dimension(&embedding)?;
            self.node_embeddings.insert(node.to_string(), embedding);
        }

        let edge_text = format!("{} {} {}", head, relation, tail);
        let embedding = embed_text(&self.provider, &edge_text).map_err(|e| {
            KgError::Validation(format!("Failed to embed triple '{}': {}", edge_text, e))
        })?;
        self.check_dimension(&embedding)?;

        let edge = Edge {
            relation: relation.to_string(),
            embedding,
        };
        let previous = self
            .out_edges
            .entry(head.to_string())
            .or_default()
            .insert(tail.to_string(), edge);

        match previous {
            Some(old) if old.relation != relation => {
                log::warn!(
                    "Relation for {} -> {} overwritten: '{}' replaced by '{}'",
                    head,
                    tail,
                    old.relation,
                    relation
                );
            }
            Some(_) => {}
            None => {
                self.edge_count += 1;
                self.adjacency
                    .entry(head.to_string())
                    .or_default()
                    .insert(tail.to_string());
                self.adjacency
                    .entry(tail.to_string())
                    .or_default()
                    .insert(head.to_string());
            }
        }

        log::debug!("Added triple ({}, {}, {})", head, relation, tail);
        Ok(())
    }

    /// Convenience wrapper over [`TripleStore::add`].
    pub fn add_triple(&mut self, triple: &Triple) -> Result<()> {
        self.add(&triple.head, &triple.relation, &triple.tail)
    }

    /// Add triples in order, stopping at the first failure. Returns the count added.
    pub fn extend<'a, I>(&mut self, triples: I) -> Result<usize>
    where
        I: IntoIterator<Item = &'a Triple>,
    {
        let mut added = 0;
        for triple in triples {
            self.add_triple(triple)?;
            added += 1;
        }
        Ok(added)
    }

    fn check_dimension(&mut self, embedding: &[f32]) -> Result<()> {
        match self.dimension {
            Some(dim) if dim != embedding.len() => Err(KgError::Validation(format!(
                "Embedding dimension mismatch: expected {}, got {}",
                dim,
                embedding.len()
            ))),
            Some(_) => Ok(()),
            None => {
                self.dimension = Some(embedding.len());
                Ok(())
            }
        }
    }
}

impl<P> TripleStore<P> {
    /// Distinct entities adjacent to `node` through an outgoing or incoming edge,
    /// sorted alphabetically. Unknown nodes have no neighbors.
    pub fn neighbors(&self, node: &str) -> Vec<&str> {
        self.adjacency
            .get(node)
            .map(|set| set.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Relation stored for the ordered pair `(a, b)`, if any.
    pub fn relation_of(&self, a: &str, b: &str) -> Option<&str> {
        self.edge(a, b).map(|e| e.relation.as_str())
    }

    pub fn has_edge(&self, a: &str, b: &str) -> bool {
        self.edge(a, b).is_some()
    }

    fn edge(&self, a: &str, b: &str) -> Option<&Edge> {
        self.out_edges.get(a).and_then(|tails| tails.get(b))
    }

    pub fn contains_node(&self, node: &str) -> bool {
        self.adjacency.contains_key(node)
    }

    pub fn node_embedding(&self, node: &str) -> Option<&[f32]> {
        self.node_embeddings.get(node).map(Vec::as_slice)
    }

    pub fn edge_embedding(&self, a: &str, b: &str) -> Option<&[f32]> {
        self.edge(a, b).map(|e| e.embedding.as_slice())
    }

    /// Stored edges in ascending `(head, tail)` order.
    pub fn edges(&self) -> impl Iterator<Item = StoredEdge<'_>> + '_ {
        self.out_edges.iter().flat_map(|(head, tails)| {
            tails.iter().map(move |(tail, edge)| StoredEdge {
                head,
                relation: &edge.relation,
                tail,
                embedding: &edge.embedding,
            })
        })
    }

    /// Every stored triple, sorted by `(head, relation, tail)`.
    pub fn triples(&self) -> Vec<Triple> {
        let mut triples: Vec<Triple> = self.edges().map(|e| e.to_triple()).collect();
        triples.sort();
        triples
    }

    pub fn node_count(&self) -> usize {
        self.adjacency.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    pub fn is_empty(&self) -> bool {
        self.edge_count == 0
    }

    /// Dimension shared by every cached embedding, once one exists.
    pub fn dimension(&self) -> Option<usize> {
        self.dimension
    }
}

fn validate_part(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(KgError::Validation(format!(
            "Triple {} must not be empty or whitespace",
            field
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::{EmbeddingSettings, HashingEmbedder};
    use crate::test_support::{FailingEmbedder, KeyedEmbedder};

    fn hashing_store() -> TripleStore<HashingEmbedder> {
        TripleStore::new(HashingEmbedder::new(EmbeddingSettings::default()))
    }

    #[test]
    fn test_add_creates_nodes_edge_and_embeddings() {
        let mut store = hashing_store();
        store.add("Einstein", "born in", "Ulm").unwrap();

        assert_eq!(store.node_count(), 2);
        assert_eq!(store.edge_count(), 1);
        assert!(store.has_edge("Einstein", "Ulm"));
        assert!(!store.has_edge("Ulm", "Einstein"));
        assert_eq!(store.relation_of("Einstein", "Ulm"), Some("born in"));
        assert_eq!(store.relation_of("Ulm", "Einstein"), None);
        assert!(store.node_embedding("Einstein").is_some());
        assert!(store.node_embedding("Ulm").is_some());
        assert!(store.edge_embedding("Einstein", "Ulm").is_some());
        assert_eq!(store.dimension(), Some(384));
    }

    #[test]
    fn test_case_and_whitespace_preserved_in_graph() {
        let mut store = hashing_store();
        store.add("Patent  Office", "located in", "Bern").unwrap();
        assert!(store.contains_node("Patent  Office"));
        assert!(!store.contains_node("patent office"));
    }

    #[test]
    fn test_neighbors_sorted_and_bidirectional() {
        let mut store = hashing_store();
        store.add("B", "r", "D").unwrap();
        store.add("A", "r", "B").unwrap();
        store.add("B", "r", "C").unwrap();
        store.add("C", "r", "B").unwrap();

        assert_eq!(store.neighbors("B"), vec!["A", "C", "D"]);
        assert_eq!(store.neighbors("A"), vec!["B"]);
        assert!(store.neighbors("missing").is_empty());
    }

    #[test]
    fn test_overwrite_replaces_relation_and_edge_embedding() {
        let provider = KeyedEmbedder::new(&[
            ("a r1 b", vec![1.0, 0.0]),
            ("a r2 b", vec![0.0, 1.0]),
        ])
        .with_fallback(vec![0.5, 0.5]);
        let mut store = TripleStore::new(provider);

        store.add("A", "r1", "B").unwrap();
        store.add("A", "r2", "B").unwrap();

        assert_eq!(store.relation_of("A", "B"), Some("r2"));
        assert_eq!(store.edge_count(), 1);
        assert_eq!(store.edge_embedding("A", "B").unwrap(), &[0.0, 1.0]);
        assert_eq!(store.triples(), vec![Triple::new("A", "r2", "B")]);
    }

    #[test]
    fn test_idempotent_re_add() {
        let mut store = hashing_store();
        store.add("A", "r1", "B").unwrap();
        let node_a = store.node_embedding("A").unwrap().to_vec();
        let edge = store.edge_embedding("A", "B").unwrap().to_vec();

        store.add("A", "r1", "B").unwrap();

        assert_eq!(store.node_count(), 2);
        assert_eq!(store.edge_count(), 1);
        assert_eq!(store.node_embedding("A").unwrap(), node_a.as_slice());
        assert_eq!(store.edge_embedding("A", "B").unwrap(), edge.as_slice());
    }

    #[test]
    fn test_node_embedding_computed_once() {
        let mut store = TripleStore::new(KeyedEmbedder::new(&[("a", vec![1.0, 0.0])]));
        store.add("A", "r1", "B").unwrap(); // a, b, edge
        store.add("A", "r2", "C").unwrap(); // c, edge
        store.add("A", "r1", "B").unwrap(); // edge only
        assert_eq!(store.provider().calls(), 6);
    }

    #[test]
    fn test_reverse_pair_is_a_separate_edge() {
        let mut store = hashing_store();
        store.add("A", "r1", "B").unwrap();
        store.add("B", "r2", "A").unwrap();
        assert_eq!(store.edge_count(), 2);
        assert_eq!(store.relation_of("A", "B"), Some("r1"));
        assert_eq!(store.relation_of("B", "A"), Some("r2"));
        assert_eq!(store.neighbors("A"), vec!["B"]);
    }

    #[test]
    fn test_rejects_empty_parts_without_mutation() {
        let mut store = TripleStore::new(FailingEmbedder::on("never"));
        for (h, r, t) in [("", "r", "B"), ("A", "  ", "B"), ("A", "r", "\t\n")] {
            let err = store.add(h, r, t).unwrap_err();
            assert!(matches!(err, KgError::Validation(_)));
        }
        assert!(store.is_empty());
        assert_eq!(store.node_count(), 0);
        assert!(store.provider().seen().is_empty());
    }

    #[test]
    fn test_failed_node_embedding_keeps_earlier_work() {
        let mut store = TripleStore::new(FailingEmbedder::on("bern"));
        let err = store.add("Patent Office", "located in", "Bern").unwrap_err();

        assert!(matches!(err, KgError::Validation(_)));
        // "Bern" sorts before "Patent Office", so nothing was embedded yet
        assert_eq!(store.provider().seen(), vec!["bern"]);
        assert!(store.node_embedding("Patent Office").is_none());

        let mut store = TripleStore::new(FailingEmbedder::on("ulm"));
        let err = store.add("Einstein", "born in", "Ulm").unwrap_err();
        assert!(matches!(err, KgError::Validation(_)));
        assert!(store.node_embedding("Einstein").is_some());
        assert!(store.node_embedding("Ulm").is_none());
        assert!(!store.has_edge("Einstein", "Ulm"));
        assert_eq!(store.node_count(), 0);
    }

    #[test]
    fn test_failed_edge_embedding_keeps_node_embeddings() {
        let mut store = TripleStore::new(FailingEmbedder::on("einstein born in ulm"));
        let err = store.add("Einstein", "born in", "Ulm").unwrap_err();

        assert!(err.to_string().contains("Einstein born in Ulm"));
        assert!(store.node_embedding("Einstein").is_some());
        assert!(store.node_embedding("Ulm").is_some());
        assert!(!store.has_edge("Einstein", "Ulm"));
        assert!(store.is_empty());
    }

    #[test]
    fn test_dimension_mismatch_rejected() {
        let provider =
            KeyedEmbedder::new(&[("a", vec![1.0, 0.0])]).with_fallback(vec![1.0, 0.0, 0.0]);
        let mut store = TripleStore::new(provider);
        let err = store.add("A", "r", "B").unwrap_err();
        assert!(err.to_string().contains("dimension mismatch"));
        assert!(store.is_empty());
    }

    #[test]
    fn test_triples_sorted_and_extend() {
        let mut store = hashing_store();
        let input = vec![
            Triple::new("Ulm", "located in", "Germany"),
            Triple::new("Einstein", "won", "Nobel Prize"),
            Triple::new("Einstein", "born in", "Ulm"),
        ];
        assert_eq!(store.extend(&input).unwrap(), 3);

        let mut expected = input.clone();
        expected.sort();
        assert_eq!(store.triples(), expected);

        let order: Vec<(&str, &str)> = store.edges().map(|e| (e.head, e.tail)).collect();
        assert_eq!(
            order,
            vec![("Einstein", "Nobel Prize"), ("Einstein", "Ulm"), ("Ulm", "Germany")]
        );
    }
}
