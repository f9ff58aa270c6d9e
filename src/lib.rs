//! tubesearch - semantic search over video transcripts
//!
//! Answers a free-text query with the single transcript segment (or a ranked
//! handful) that best matches it, plus a link that opens the video at that
//! moment.
//!
//! # Pipeline
//!
//! 1. `embedding` turns the query into a vector.
//! 2. `retrieval` fetches the nearest segments from a vector index
//!    (Pinecone, Chroma, or an in-memory corpus).
//! 3. `rerank` asks a chat model to choose among them and parses its reply.
//! 4. `search` assembles the chosen segment into a result with a deep link,
//!    using the `timestamp` codec.
//!
//! `server` exposes the pipeline over HTTP; `cli` wraps both.
//!
//! # Example
//!
//! ```rust,no_run
//! use tubesearch::config::Settings;
//! use tubesearch::search::SearchPipeline;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let pipeline = SearchPipeline::from_settings(&settings)?;
//!
//!     let outcome = pipeline.search("best goal ever").await?;
//!     println!("{}", serde_json::to_string_pretty(&outcome)?);
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod completion;
pub mod config;
pub mod embedding;
pub mod error;
pub mod openai;
pub mod rerank;
pub mod retrieval;
pub mod search;
pub mod server;
pub mod timestamp;

#[cfg(test)]
mod mock;

pub use error::{Result, SearchError};
