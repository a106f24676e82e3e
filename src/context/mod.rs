//! Context rendering: triple sets to prompt-ready text, and the
//! retrieve -> expand -> format pipeline.

mod formatter;
mod pipeline;

pub use formatter::{format_context, render_context, ContextStyle};
pub use pipeline::{build_context, ContextParams, KnowledgeContext};
