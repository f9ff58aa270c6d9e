//! Parsing of free-text reranker replies.
//!
//! Model output is loosely structured, so everything here is permissive:
//! labels are matched case-insensitively, markdown emphasis is ignored, only
//! the first colon separates a label from its value, and nothing in this
//! module returns an error. Bounds checking against the candidate list
//! happens in [`resolve_index`].

use regex::Regex;
use std::sync::LazyLock;

/// Explanation used when the model gave none.
pub const NO_EXPLANATION: &str = "No explanation provided.";

/// Explanation used when the model's reply has no usable content at all.
pub const NO_CLEAR_MATCH: &str = "No clear best match found.";

const BEST_MATCH_LABELS: &[&str] = &["best match"];
const EXPLANATION_LABELS: &[&str] = &["brief explanation", "explanation", "reason"];

/// Leading integer of a label value, tolerating `[2]`, `#2`, `(2)`, `Result 2`.
static INDEX_VALUE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[\[#(]*\s*(?i:(?:result|candidate|index)\s*)?[\[#(]*\s*(-?\d+)").expect("valid index regex")
});

/// `{rank}. {index}` with optional brackets and trailing text. The trailer
/// may follow a separator (`-`, `–`, `—`, `:`, `.`), whitespace, or open
/// directly with a parenthesis.
static RANKED_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(\d+)[.)][*_]*\s*(?i:(?:result|candidate|index)\s*)?[\[#(]?\s*(\d+)[\])]?[*_]*(?:\s*[-–—:.]\s*(.*)|\s+(.+)|(\(.*))?$",
    )
    .expect("valid ranked-line regex")
});

/// Largest jump between consecutive ranks still read as a new entry.
/// Keeps lines like `2024. 5 players` inside an explanation as text.
const MAX_RANK_STEP: u32 = 2;

/// Reply to a single-match prompt.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BestMatchReply {
    /// 1-based index as written by the model (may be out of range).
    pub index: Option<i64>,
    /// Explanation text, if an explanation line was present.
    pub explanation: Option<String>,
}

/// One entry of a ranked-list reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedReply {
    /// Rank as written by the model.
    pub rank: u32,
    /// 1-based candidate index as written by the model.
    pub index: i64,
    /// Accumulated explanation text (may be empty).
    pub explanation: String,
}

/// Parse a `Best match: N` / `Brief explanation: ...` reply.
pub fn parse_best_match(text: &str) -> BestMatchReply {
    let mut reply = BestMatchReply::default();
    let mut in_explanation = false;

    for raw_line in text.lines() {
        let line = clean_line(raw_line);

        if line.is_empty() {
            in_explanation = false;
            continue;
        }

        if let Some(value) = labelled_value(line, BEST_MATCH_LABELS) {
            in_explanation = false;
            if reply.index.is_none() {
                reply.index = leading_index(value);
            }
            continue;
        }

        if let Some(value) = labelled_value(line, EXPLANATION_LABELS) {
            in_explanation = reply.explanation.is_none();
            if in_explanation {
                reply.explanation = Some(value.to_string());
            }
            continue;
        }

        if in_explanation {
            if let Some(explanation) = reply.explanation.as_mut() {
                append_text(explanation, line);
            }
        }
    }

    reply.explanation = reply.explanation.filter(|e| !e.is_empty());
    reply
}

/// Parse a ranked-list reply of `{k}. {index}` lines with explanations.
///
/// Entries appear in the order the model stated them. Explanation text
/// following a ranked line, labelled or not, belongs to that entry until the
/// next ranked line.
pub fn parse_ranked(text: &str) -> Vec<RankedReply> {
    let mut entries: Vec<RankedReply> = Vec::new();

    for raw_line in text.lines() {
        let line = clean_line(raw_line);
        if line.is_empty() {
            continue;
        }

        if let Some(caps) = RANKED_LINE.captures(line) {
            let rank = caps
                .get(1)
                .and_then(|m| m.as_str().parse::<u32>().ok())
                .filter(|rank| follows(entries.last().map(|e| e.rank), *rank));
            let index = caps.get(2).and_then(|m| m.as_str().parse::<i64>().ok());
            if let (Some(rank), Some(index)) = (rank, index) {
                let explanation = caps
                    .get(3)
                    .or_else(|| caps.get(4))
                    .or_else(|| caps.get(5))
                    .map(|m| strip_explanation_label(m.as_str()).to_string())
                    .unwrap_or_default();
                entries.push(RankedReply {
                    rank,
                    index,
                    explanation,
                });
                continue;
            }
        }

        let Some(current) = entries.last_mut() else {
            continue;
        };

        let fragment = labelled_value(line, EXPLANATION_LABELS).unwrap_or(line);
        append_text(&mut current.explanation, fragment);
    }

    entries
}

/// Convert a model-stated 1-based index into a 0-based position, if in range.
pub fn resolve_index(index: i64, len: usize) -> Option<usize> {
    let position = usize::try_from(index).ok()?.checked_sub(1)?;
    (position < len).then_some(position)
}

/// Trim whitespace and leading list/emphasis markers.
fn clean_line(line: &str) -> &str {
    line.trim().trim_start_matches(['*', '#', '>', '_']).trim()
}

/// If `line` is `label: value` for one of `labels`, return the trimmed value.
fn labelled_value<'a>(line: &'a str, labels: &[&str]) -> Option<&'a str> {
    let (head, rest) = line.split_once(':')?;
    let head = head.trim().trim_matches(['*', '_']).trim().to_lowercase();
    labels
        .iter()
        .any(|label| head == *label)
        .then(|| rest.trim().trim_start_matches(['*', '_']).trim())
}

fn strip_explanation_label(text: &str) -> &str {
    let text = labelled_value(text, EXPLANATION_LABELS).unwrap_or(text).trim();
    text.strip_prefix('(')
        .and_then(|t| t.strip_suffix(')'))
        .map(str::trim)
        .unwrap_or(text)
}

/// Whether `rank` can start a new entry after `previous`.
fn follows(previous: Option<u32>, rank: u32) -> bool {
    match previous {
        None => (1..=MAX_RANK_STEP + 1).contains(&rank),
        Some(prev) => rank >= prev && rank - prev <= MAX_RANK_STEP,
    }
}

fn leading_index(value: &str) -> Option<i64> {
    INDEX_VALUE
        .captures(value)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

fn append_text(target: &mut String, fragment: &str) {
    let fragment = fragment.trim();
    if fragment.is_empty() {
        return;
    }
    if !target.is_empty() {
        target.push(' ');
    }
    target.push_str(fragment);
}
