//! Loading triples from disk for the command-line tool.

pub mod triples;

pub use triples::{load_triples, parse_triples};
