//! Search command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::search::SearchPipeline;
use anyhow::Result;

/// Run the search command.
pub async fn run_search(query: &str, top: Option<usize>, settings: Settings) -> Result<()> {
    let pipeline = SearchPipeline::from_settings(&settings)?;

    let spinner = Output::spinner("Searching...");

    match top {
        None => {
            let outcome = pipeline.search(query).await;
            spinner.finish_and_clear();
            Output::search_outcome(&outcome?);
        }
        Some(n) => {
            let results = pipeline.search_multiple(query, Some(n)).await;
            spinner.finish_and_clear();
            let results = results?;

            if results.is_empty() {
                Output::warning("No results found matching your query.");
            } else {
                Output::success(&format!("Found {} results", results.len()));
                for (i, entry) in results.iter().enumerate() {
                    Output::match_entry(Some(i + 1), entry);
                }
            }
        }
    }

    Ok(())
}
