//! LLM reranking of retrieved transcript segments.
//!
//! The reranker numbers the candidates into a prompt, asks the completion
//! capability to choose among them, and maps the free-text reply back onto
//! the candidate list. Reply parsing lives in [`parse`].

pub mod parse;

use crate::completion::Completion;
use crate::config::Prompts;
use crate::error::Result;
use crate::retrieval::Candidate;
use parse::{parse_best_match, parse_ranked, resolve_index, NO_CLEAR_MATCH, NO_EXPLANATION};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Explanation returned when there was nothing to choose from.
pub const NO_CANDIDATES: &str = "No transcript segments were retrieved for this query.";

/// A candidate chosen by the model, with its stated reason.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedMatch {
    pub candidate: Candidate,
    pub explanation: String,
}

/// Outcome of a single-match rerank.
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    /// The model picked a valid candidate.
    Match(RankedMatch),
    /// No valid pick; carries the model's text or a fallback.
    NoMatch { explanation: String },
}

impl Selection {
    pub fn explanation(&self) -> &str {
        match self {
            Selection::Match(m) => &m.explanation,
            Selection::NoMatch { explanation } => explanation,
        }
    }

    pub fn into_match(self) -> Option<RankedMatch> {
        match self {
            Selection::Match(m) => Some(m),
            Selection::NoMatch { .. } => None,
        }
    }
}

impl From<Option<RankedMatch>> for Selection {
    fn from(value: Option<RankedMatch>) -> Self {
        match value {
            Some(m) => Selection::Match(m),
            None => Selection::NoMatch {
                explanation: NO_CLEAR_MATCH.to_string(),
            },
        }
    }
}

/// Chooses among retrieved candidates with a language model.
pub struct Reranker {
    completion: Arc<dyn Completion>,
    prompts: Prompts,
}

impl Reranker {
    /// Create a reranker with the built-in prompts.
    pub fn new(completion: Arc<dyn Completion>) -> Self {
        Self {
            completion,
            prompts: Prompts::default(),
        }
    }

    /// Set custom prompts (with user-defined variables).
    pub fn with_prompts(mut self, prompts: Prompts) -> Self {
        self.prompts = prompts;
        self
    }

    /// Ask the model for the single best candidate.
    #[instrument(skip(self, candidates), fields(query = %query, candidates = candidates.len()))]
    pub async fn select_best(&self, query: &str, candidates: &[Candidate]) -> Result<Selection> {
        if candidates.is_empty() {
            return Ok(Selection::NoMatch {
                explanation: NO_CANDIDATES.to_string(),
            });
        }

        let prompt = self.render(&self.prompts.rerank.user, query, candidates, None);
        let reply = self
            .completion
            .complete(&self.prompts.rerank.system, &prompt)
            .await?;

        debug!("Rerank reply: {:?}", reply);
        Ok(selection_from_reply(&reply, candidates))
    }

    /// Ask the model for up to `n` candidates in ranked order.
    #[instrument(skip(self, candidates), fields(query = %query, candidates = candidates.len()))]
    pub async fn select_top_n(
        &self,
        query: &str,
        candidates: &[Candidate],
        n: usize,
    ) -> Result<Vec<RankedMatch>> {
        if n == 0 || candidates.is_empty() {
            return Ok(Vec::new());
        }

        let prompt = self.render(&self.prompts.rerank.ranked_user, query, candidates, Some(n));
        let reply = self
            .completion
            .complete(&self.prompts.rerank.ranked_system, &prompt)
            .await?;

        debug!("Ranked rerank reply: {:?}", reply);
        Ok(ranking_from_reply(&reply, candidates, n))
    }

    fn render(&self, template: &str, query: &str, candidates: &[Candidate], n: Option<usize>) -> String {
        let mut vars = HashMap::new();
        vars.insert("query".to_string(), query.to_string());
        vars.insert("candidates".to_string(), format_candidates(candidates));
        vars.insert("count".to_string(), candidates.len().to_string());
        if let Some(n) = n {
            vars.insert("n".to_string(), n.to_string());
        }
        self.prompts.render_with_custom(template, &vars)
    }
}

/// Number candidates 1-based for the prompt.
pub fn format_candidates(candidates: &[Candidate]) -> String {
    candidates
        .iter()
        .enumerate()
        .map(|(i, candidate)| format!("{}. {}", i + 1, candidate.excerpt().trim()))
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn selection_from_reply(reply: &str, candidates: &[Candidate]) -> Selection {
    let parsed = parse_best_match(reply);

    match parsed.index {
        Some(index) => match resolve_index(index, candidates.len()) {
            Some(position) => Selection::Match(RankedMatch {
                candidate: candidates[position].clone(),
                explanation: parsed
                    .explanation
                    .unwrap_or_else(|| NO_EXPLANATION.to_string()),
            }),
            None => {
                // The explanation describes a candidate that does not exist.
                warn!(index, candidates = candidates.len(), "Model picked an out-of-range candidate");
                Selection::NoMatch {
                    explanation: NO_CLEAR_MATCH.to_string(),
                }
            }
        },
        None => {
            debug!("No best-match line in reply");
            let explanation = parsed
                .explanation
                .or_else(|| Some(reply.trim().to_string()).filter(|r| !r.is_empty()))
                .unwrap_or_else(|| NO_CLEAR_MATCH.to_string());
            Selection::NoMatch { explanation }
        }
    }
}

fn ranking_from_reply(reply: &str, candidates: &[Candidate], n: usize) -> Vec<RankedMatch> {
    let mut seen = HashSet::new();
    let mut matches = Vec::new();

    for entry in parse_ranked(reply) {
        if matches.len() == n {
            break;
        }

        let Some(position) = resolve_index(entry.index, candidates.len()) else {
            debug!(index = entry.index, rank = entry.rank, "Skipping out-of-range ranked entry");
            continue;
        };
        if !seen.insert(position) {
            continue;
        }

        let explanation = if entry.explanation.is_empty() {
            NO_EXPLANATION.to_string()
        } else {
            entry.explanation
        };

        matches.push(RankedMatch {
            candidate: candidates[position].clone(),
            explanation,
        });
    }

    matches
}
