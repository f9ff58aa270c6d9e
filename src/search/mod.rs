//! Search pipeline: embed, retrieve, rerank, assemble.

mod assemble;
mod pipeline;

pub use assemble::{MatchEntry, ResultAssembler, SearchOutcome, NOT_FOUND_MESSAGE};
pub use pipeline::SearchPipeline;
