use crate::error::{KgError, Result};
use crate::graph::Triple;
use serde::Deserialize;
use std::path::Path;

/// One entry of a triple file: `{"head", "relation", "tail"}` or `[head, relation, tail]`.
#[derive(Deserialize)]
#[serde(untagged)]
enum TripleRecord {
    Object(Triple),
    Tuple(String, String, String),
}

impl From<TripleRecord> for Triple {
    fn from(record: TripleRecord) -> Self {
        match record {
            TripleRecord::Object(triple) => triple,
            TripleRecord::Tuple(head, relation, tail) => Triple::new(head, relation, tail),
        }
    }
}

/// Parse a JSON array of triples. File order is preserved.
pub fn parse_triples(content: &str, source: &str) -> Result<Vec<Triple>> {
    let records: Vec<TripleRecord> = serde_json::from_str(content)
        .map_err(|e| KgError::Parse(format!("JSON parse error in {}: {}", source, e)))?;

    Ok(records.into_iter().map(Triple::from).collect())
}

/// Read and parse a JSON triple file.
pub fn load_triples(path: &Path) -> Result<Vec<Triple>> {
    let content = std::fs::read_to_string(path)?;
    let triples = parse_triples(&content, &path.display().to_string())?;
    log::debug!("Loaded {} triples from {}", triples.len(), path.display());
    Ok(triples)
}
