pub mod vector;

pub use vector::{cosine_similarity, retrieve, Retrieval, ScoredTriple};
