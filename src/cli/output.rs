//! CLI output formatting utilities.

use crate::search::{MatchEntry, SearchOutcome};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

/// Output helper for CLI formatting.
pub struct Output;

impl Output {
    /// Print an info message.
    pub fn info(msg: &str) {
        println!("{} {}", style(">>").cyan().bold(), msg);
    }

    /// Print a success message.
    pub fn success(msg: &str) {
        println!("{} {}", style(">>").green().bold(), msg);
    }

    /// Print a warning message.
    pub fn warning(msg: &str) {
        eprintln!("{} {}", style(">>").yellow().bold(), msg);
    }

    /// Print a header.
    pub fn header(msg: &str) {
        println!("\n{}", style(msg).bold().underlined());
    }

    /// Print a key-value pair.
    pub fn kv(key: &str, value: &str) {
        println!("  {}: {}", style(key).dim(), value);
    }

    /// Print a single-search outcome.
    pub fn search_outcome(outcome: &SearchOutcome) {
        match outcome {
            SearchOutcome::Found(entry) => Self::match_entry(None, entry),
            SearchOutcome::NotFound { message, explanation } => {
                Self::warning(message);
                println!("   {}", explanation);
            }
        }
    }

    /// Print one assembled match, optionally numbered.
    pub fn match_entry(rank: Option<usize>, entry: &MatchEntry) {
        let label = match rank {
            Some(n) => format!("{}.", n),
            None => ">>".to_string(),
        };
        let score = entry
            .score
            .map(|s| format!(" (score: {:.2})", s))
            .unwrap_or_default();

        println!(
            "\n{} {} @ {}s{}",
            style(label).green(),
            style(&entry.video_id).bold(),
            style(entry.timestamp_seconds).cyan(),
            score
        );
        println!("   {}", content_preview(&entry.text, 200));
        println!("   {}", style(&entry.explanation).italic());
        println!("   {}", style(&entry.url).dim());
    }

    /// Create a spinner.
    pub fn spinner(msg: &str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb
    }
}

/// Flatten and truncate content with an ellipsis.
fn content_preview(content: &str, max_chars: usize) -> String {
    let content = content.replace('\n', " ");
    if content.chars().count() <= max_chars {
        content
    } else {
        let cut: String = content.chars().take(max_chars).collect();
        format!("{}...", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_preview() {
        assert_eq!(content_preview("short\ntext", 200), "short text");
        assert_eq!(content_preview("abcdef", 3), "abc...");
        assert_eq!(content_preview("ééééé", 2), "éé...");
    }
}
