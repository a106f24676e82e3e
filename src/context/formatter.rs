use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::{KgError, Result};
use crate::graph::Triple;

/// Output layout for a rendered triple set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextStyle {
    /// `"{head} {relation} {tail}."` sentences joined by a space
    Natural,
    /// One `"{head} -> {relation} {tail}; ..."` line per head
    Structured,
}

impl ContextStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContextStyle::Natural => "natural",
            ContextStyle::Structured => "structured",
        }
    }
}

impl FromStr for ContextStyle {
    type Err = KgError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "natural" => Ok(ContextStyle::Natural),
            "structured" => Ok(ContextStyle::Structured),
            other => Err(KgError::Format(other.to_string())),
        }
    }
}

impl fmt::Display for ContextStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Render `triples` in the style named by `style` ("natural" or "structured").
pub fn format_context(triples: &[Triple], style: &str) -> Result<String> {
    let style: ContextStyle = style.parse()?;
    Ok(render_context(triples, style))
}

/// Render `triples` deterministically; input order does not matter.
pub fn render_context(triples: &[Triple], style: ContextStyle) -> String {
    let mut sorted: Vec<&Triple> = triples.iter().collect();
    sorted.sort();

    match style {
        ContextStyle::Natural => sorted
            .iter()
            .map(|t| format!("{} {} {}.", t.head, t.relation, t.tail))
            .collect::<Vec<_>>()
            .join(" "),
        ContextStyle::Structured => {
            let mut groups: BTreeMap<&str, Vec<(&str, &str)>> = BTreeMap::new();
            for t in sorted {
                groups
                    .entry(t.head.as_str())
                    .or_default()
                    .push((t.relation.as_str(), t.tail.as_str()));
            }

            groups
                .into_iter()
                .map(|(head, mut predicates)| {
                    predicates.sort_unstable();
                    let rendered = predicates
                        .iter()
                        .map(|(relation, tail)| format!("{} {}", relation, tail))
                        .collect::<Vec<_>>()
                        .join("; ");
                    format!("{} -> {}", head, rendered)
                })
                .collect::<Vec<_>>()
                .join("\n")
        }
    }
}
