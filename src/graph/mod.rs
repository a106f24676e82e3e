//! Knowledge graph module: the triple value type, the in-memory triple store
//! and bounded k-hop subgraph expansion.

mod expansion;
mod store;

pub use expansion::expand_subgraph;
pub use store::{StoredEdge, TripleStore};

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single fact in the knowledge graph (head --relation--> tail).
///
/// Equality, hashing and ordering cover all three fields, in
/// `(head, relation, tail)` order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Triple {
    /// Source entity, e.g. `Einstein`.
    pub head: String,
    /// Relation label, e.g. `developed`.
    pub relation: String,
    /// Target entity, e.g. `Theory of Relativity`.
    pub tail: String,
}

impl Triple {
    pub fn new(
        head: impl Into<String>,
        relation: impl Into<String>,
        tail: impl Into<String>,
    ) -> Self {
        Self {
            head: head.into(),
            relation: relation.into(),
            tail: tail.into(),
        }
    }
}

impl fmt::Display for Triple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.head, self.relation, self.tail)
    }
}
