//! The search pipeline.
//!
//! Holds the process-lifetime capability clients. Build it once at startup
//! and share it behind an `Arc`; nothing in it is mutated after construction.

use super::{MatchEntry, ResultAssembler, SearchOutcome};
use crate::completion::{Completion, OpenAICompletion};
use crate::config::{Prompts, Settings};
use crate::embedding::{Embedder, OpenAIEmbedder};
use crate::error::{Result, SearchError};
use crate::rerank::Reranker;
use crate::retrieval::{create_retriever, Candidate, Retriever};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Embed → retrieve → rerank → assemble.
pub struct SearchPipeline {
    embedder: Arc<dyn Embedder>,
    retriever: Arc<dyn Retriever>,
    reranker: Reranker,
    assembler: ResultAssembler,
    top_k: usize,
    default_top_n: usize,
}

impl SearchPipeline {
    /// Create a pipeline from explicit components.
    pub fn new(
        embedder: Arc<dyn Embedder>,
        retriever: Arc<dyn Retriever>,
        reranker: Reranker,
        assembler: ResultAssembler,
    ) -> Self {
        Self {
            embedder,
            retriever,
            reranker,
            assembler,
            top_k: 10,
            default_top_n: 5,
        }
    }

    /// Build every client named in `settings`.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;

        let embedder: Arc<dyn Embedder> = Arc::new(OpenAIEmbedder::with_config(
            &settings.embedding.model,
            settings.embedding.dimensions as usize,
        )?);

        let retriever = create_retriever(settings)?;

        let completion: Arc<dyn Completion> = Arc::new(OpenAICompletion::new(
            &settings.rerank.model,
            settings.rerank.temperature,
            Duration::from_secs(settings.rerank.timeout_seconds),
        )?);

        info!(
            embedding_model = %settings.embedding.model,
            retriever = %settings.retriever.provider,
            rerank_model = %settings.rerank.model,
            "Search pipeline ready"
        );

        Ok(Self::new(
            embedder,
            retriever,
            Reranker::new(completion).with_prompts(prompts),
            ResultAssembler::new(&settings.links),
        )
        .with_top_k(settings.retriever.top_k)
        .with_default_top_n(settings.rerank.top_n))
    }

    /// Set how many candidates are fetched from the index.
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k.max(1);
        self
    }

    /// Set the result count used when a multi-match caller gives none.
    pub fn with_default_top_n(mut self, top_n: usize) -> Self {
        self.default_top_n = top_n;
        self
    }

    /// Find the single best segment for `query`.
    #[instrument(skip(self), fields(query = %query))]
    pub async fn search(&self, query: &str) -> Result<SearchOutcome> {
        let candidates = self.retrieve(query).await?;
        let selection = self.reranker.select_best(query.trim(), &candidates).await?;
        let outcome = self.assembler.assemble(selection);

        info!(found = outcome.is_found(), "Search complete");
        Ok(outcome)
    }

    /// Find up to `n` segments for `query`, best first.
    #[instrument(skip(self), fields(query = %query))]
    pub async fn search_multiple(&self, query: &str, n: Option<usize>) -> Result<Vec<MatchEntry>> {
        let n = n.unwrap_or(self.default_top_n);
        let candidates = self.retrieve(query).await?;
        let ranked = self.reranker.select_top_n(query.trim(), &candidates, n).await?;
        let entries = self.assembler.assemble_all(ranked);

        info!(results = entries.len(), "Multi-result search complete");
        Ok(entries)
    }

    async fn retrieve(&self, query: &str) -> Result<Vec<Candidate>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(SearchError::InvalidInput("Query text must not be empty".to_string()));
        }

        let vector = self.embedder.embed(query).await?;
        if vector.len() != self.embedder.dimensions() {
            return Err(SearchError::Embedding(format!(
                "Expected a {}-dimensional embedding, got {}",
                self.embedder.dimensions(),
                vector.len()
            )));
        }

        let candidates = self.retriever.nearest(&vector, self.top_k).await?;

        debug!("Retrieved {} candidates", candidates.len());
        Ok(candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{candidate, FailingEmbedder, FixedRetriever, ScriptedCompletion, StaticEmbedder};
    use crate::retrieval::{IndexedSegment, MemoryRetriever};
    use serde_json::json;

    fn pipeline(
        embedder: Arc<dyn Embedder>,
        retriever: Arc<dyn Retriever>,
        completion: Arc<dyn Completion>,
    ) -> SearchPipeline {
        SearchPipeline::new(embedder, retriever, Reranker::new(completion), ResultAssembler::default())
    }

    #[tokio::test]
    async fn test_best_goal_ever() {
        let segment = IndexedSegment {
            id: "v1".to_string(),
            vector: vec![1.0, 0.0],
            metadata: json!({"start_time": "00:01:30", "text": "amazing goal"})
                .as_object()
                .cloned()
                .unwrap(),
            text: String::new(),
        };
        let retriever = Arc::new(MemoryRetriever::with_segments(vec![segment]));
        let completion = Arc::new(ScriptedCompletion::new(
            "Best match: 1\nBrief explanation: matches goal description",
        ));
        let embedder = Arc::new(StaticEmbedder::new(vec![0.9, 0.1]));

        let outcome = pipeline(embedder.clone(), retriever, completion.clone())
            .search("best goal ever")
            .await
            .unwrap();

        let SearchOutcome::Found(entry) = outcome else {
            panic!("expected a match");
        };
        assert_eq!(entry.video_id, "v1");
        assert_eq!(entry.timestamp_seconds, 90);
        assert_eq!(entry.url, "https://www.youtube.com/watch?v=v1&t=90s");
        assert_eq!(entry.text, "amazing goal");
        assert_eq!(entry.explanation, "matches goal description");
        assert_eq!(embedder.calls(), 1);
        assert_eq!(completion.calls(), 1);
        assert!(completion.last_user_prompt().unwrap().contains("1. amazing goal"));
    }

    #[tokio::test]
    async fn test_unparseable_completion_is_not_found() {
        let retriever = Arc::new(FixedRetriever::new(vec![candidate("a", 0.9, "v1", "00:01:30", "amazing goal")]));
        let completion = Arc::new(ScriptedCompletion::new("Sorry, I can't help with that."));

        let outcome = pipeline(Arc::new(StaticEmbedder::new(vec![1.0])), retriever, completion)
            .search("best goal ever")
            .await
            .unwrap();

        assert_eq!(
            outcome,
            SearchOutcome::NotFound {
                message: crate::search::NOT_FOUND_MESSAGE.to_string(),
                explanation: "Sorry, I can't help with that.".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_embed_failure_propagates() {
        let completion = Arc::new(ScriptedCompletion::new("Best match: 1"));
        let err = pipeline(Arc::new(FailingEmbedder), Arc::new(FixedRetriever::new(vec![])), completion.clone())
            .search("q")
            .await
            .unwrap_err();
        assert!(err.is_capability());
        assert_eq!(completion.calls(), 0);
    }

    #[tokio::test]
    async fn test_embedding_dimension_mismatch_is_capability_error() {
        let completion = Arc::new(ScriptedCompletion::new("Best match: 1"));
        let err = pipeline(
            Arc::new(StaticEmbedder::with_dimensions(vec![1.0, 0.0], 3)),
            Arc::new(FixedRetriever::new(vec![candidate("a", 0.9, "v1", "00:00:10", "first")])),
            completion.clone(),
        )
        .search("goal")
        .await
        .unwrap_err();

        assert!(matches!(err, SearchError::Embedding(_)));
        assert_eq!(completion.calls(), 0);
    }

    #[tokio::test]
    async fn test_empty_query_rejected() {
        let embedder = Arc::new(StaticEmbedder::new(vec![1.0]));
        let result = pipeline(
            embedder.clone(),
            Arc::new(FixedRetriever::new(vec![])),
            Arc::new(ScriptedCompletion::new("")),
        )
        .search("   ")
        .await;
        assert!(matches!(result, Err(SearchError::InvalidInput(_))));
        assert_eq!(embedder.calls(), 0);
    }

    #[tokio::test]
    async fn test_search_multiple() {
        let candidates = vec![
            candidate("a", 0.9, "v1", "00:00:10", "first"),
            candidate("b", 0.8, "v2", "00:00:20", "second"),
            candidate("c", 0.7, "v3", "00:00:30", "third"),
        ];
        let completion = Arc::new(ScriptedCompletion::new(
            "1. 2\nExplanation: clearest\n2. 7\nExplanation: invalid\n3. 1\nExplanation: also fits",
        ));
        let search = pipeline(
            Arc::new(StaticEmbedder::new(vec![1.0])),
            Arc::new(FixedRetriever::new(candidates)),
            completion,
        )
        .with_default_top_n(5);

        let entries = search.search_multiple("goal", None).await.unwrap();
        let ids: Vec<&str> = entries.iter().map(|e| e.video_id.as_str()).collect();
        assert_eq!(ids, vec!["v2", "v1"]);
        assert_eq!(entries[0].timestamp_seconds, 20);
        assert_eq!(entries[1].explanation, "also fits");
    }

    #[tokio::test]
    async fn test_top_k_limits_candidates() {
        let candidates: Vec<Candidate> = (0..20)
            .map(|i| candidate(&format!("c{}", i), 0.5, "v", "00:00:01", &format!("segment {}", i)))
            .collect();
        let completion = Arc::new(ScriptedCompletion::new("Best match: 3"));
        let search = pipeline(
            Arc::new(StaticEmbedder::new(vec![1.0])),
            Arc::new(FixedRetriever::new(candidates)),
            completion.clone(),
        )
        .with_top_k(3);

        assert!(search.search("q").await.unwrap().is_found());
        let prompt = completion.last_user_prompt().unwrap();
        assert!(prompt.contains("3. segment 2"));
        assert!(!prompt.contains("4. segment 3"));
    }
}
