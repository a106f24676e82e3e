//! Deterministic embedding providers for unit tests.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use crate::embeddings::{Embedding, EmbeddingProvider};
use crate::error::{KgError, Result};

/// Returns a fixed vector per normalized text, or a fallback for unknown text.
pub struct KeyedEmbedder {
    vectors: HashMap<String, Embedding>,
    fallback: Embedding,
    calls: Cell<usize>,
}

impl KeyedEmbedder {
    pub fn new(entries: &[(&str, Embedding)]) -> Self {
        let dim = entries.first().map(|(_, v)| v.len()).unwrap_or(2);
        Self {
            vectors: entries
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
            fallback: vec![0.0; dim],
            calls: Cell::new(0),
        }
    }

    pub fn with_fallback(mut self, fallback: Embedding) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.get()
    }
}

impl EmbeddingProvider for KeyedEmbedder {
    fn embed(&self, normalized_text: &str) -> Result<Embedding> {
        self.calls.set(self.calls.get() + 1);
        Ok(self
            .vectors
            .get(normalized_text)
            .cloned()
            .unwrap_or_else(|| self.fallback.clone()))
    }
}

/// Fails for one exact normalized text and records every request.
pub struct FailingEmbedder {
    fail_on: String,
    seen: RefCell<Vec<String>>,
}

impl FailingEmbedder {
    pub fn on(text: &str) -> Self {
        Self {
            fail_on: text.to_string(),
            seen: RefCell::new(Vec::new()),
        }
    }

    pub fn seen(&self) -> Vec<String> {
        self.seen.borrow().clone()
    }
}

impl EmbeddingProvider for FailingEmbedder {
    fn embed(&self, normalized_text: &str) -> Result<Embedding> {
        self.seen.borrow_mut().push(normalized_text.to_string());
        if normalized_text == self.fail_on {
            return Err(KgError::Embedding(format!("backend unavailable for '{}'", normalized_text)));
        }
        Ok(vec![1.0, 1.0])
    }
}
