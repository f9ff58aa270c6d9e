//! Turning a reranker pick into the final answer.
//!
//! Pure functions of their input; no I/O happens here.

use crate::config::LinkSettings;
use crate::error::Result;
use crate::rerank::{RankedMatch, Selection};
use crate::timestamp::Timestamp;
use serde::Serialize;
use tracing::{debug, warn};

/// Message attached to every not-found outcome.
pub const NOT_FOUND_MESSAGE: &str = "No specific match found";

/// A located transcript segment with a deep link.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchEntry {
    pub video_id: String,
    /// Offset into the video, in whole seconds.
    #[serde(rename = "timestamp")]
    pub timestamp_seconds: u64,
    #[serde(rename = "url_with_timestamp")]
    pub url: String,
    pub text: String,
    pub explanation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
}

/// Result of a single-match search.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SearchOutcome {
    Found(MatchEntry),
    NotFound { message: String, explanation: String },
}

impl SearchOutcome {
    fn not_found(explanation: impl Into<String>) -> Self {
        SearchOutcome::NotFound {
            message: NOT_FOUND_MESSAGE.to_string(),
            explanation: explanation.into(),
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, SearchOutcome::Found(_))
    }

    pub fn explanation(&self) -> &str {
        match self {
            SearchOutcome::Found(entry) => &entry.explanation,
            SearchOutcome::NotFound { explanation, .. } => explanation,
        }
    }
}

/// Builds outcomes and deep links from reranked candidates.
#[derive(Debug, Clone)]
pub struct ResultAssembler {
    watch_url: String,
    use_fragment: bool,
}

impl Default for ResultAssembler {
    fn default() -> Self {
        Self::new(&LinkSettings::default())
    }
}

impl ResultAssembler {
    pub fn new(links: &LinkSettings) -> Self {
        Self {
            watch_url: links.watch_url.trim_end_matches('=').to_string(),
            use_fragment: links.use_fragment,
        }
    }

    /// Produce the single-match outcome for a reranker selection.
    ///
    /// `Found` requires both a video identifier and a readable start time;
    /// anything else degrades to `NotFound` with the reranker's explanation.
    pub fn assemble(&self, selection: Selection) -> SearchOutcome {
        let ranked = match selection {
            Selection::Match(ranked) => ranked,
            Selection::NoMatch { explanation } => return SearchOutcome::not_found(explanation),
        };

        match self.entry(&ranked) {
            Ok(Some(entry)) => SearchOutcome::Found(entry),
            Ok(None) => {
                debug!(candidate = %ranked.candidate.id, "Chosen candidate lacks a video id or start time");
                SearchOutcome::not_found(ranked.explanation)
            }
            Err(e) => {
                warn!(candidate = %ranked.candidate.id, "Chosen candidate has a bad timestamp: {}", e);
                SearchOutcome::not_found(format!(
                    "{} (the matching segment could not be located: {})",
                    ranked.explanation, e
                ))
            }
        }
    }

    /// Build entries for a ranked list, dropping any that cannot be linked.
    pub fn assemble_all(&self, matches: Vec<RankedMatch>) -> Vec<MatchEntry> {
        matches
            .iter()
            .filter_map(|ranked| match self.entry(ranked) {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(candidate = %ranked.candidate.id, "Dropping ranked candidate: {}", e);
                    None
                }
            })
            .collect()
    }

    /// `Ok(None)` when a required field is absent, `Err` when the start
    /// time is present but unreadable.
    fn entry(&self, ranked: &RankedMatch) -> Result<Option<MatchEntry>> {
        let candidate = &ranked.candidate;
        let (Some(video_id), Some(start)) = (candidate.item_id(), candidate.start_time()) else {
            return Ok(None);
        };

        let timestamp = Timestamp::from_value(start)?;

        Ok(Some(MatchEntry {
            video_id: video_id.to_string(),
            timestamp_seconds: timestamp.seconds(),
            url: self.deep_link(video_id, &timestamp),
            text: candidate.excerpt().to_string(),
            explanation: ranked.explanation.clone(),
            score: Some(candidate.score),
        }))
    }

    /// `{watch_url}={video_id}&t={offset}`.
    pub fn deep_link(&self, video_id: &str, timestamp: &Timestamp) -> String {
        let offset = if self.use_fragment {
            timestamp.url_fragment()
        } else {
            format!("{}s", timestamp.seconds())
        };
        format!("{}={}&t={}", self.watch_url, video_id, offset)
    }
}
