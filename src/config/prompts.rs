//! Prompt templates for tubesearch.
//!
//! Prompts can be customized by placing a `rerank.toml` file in the custom
//! prompts directory.

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::LazyLock;

/// `{{name}}` placeholder.
static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{(\w+)\}\}").expect("valid placeholder regex"));

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Prompts {
    pub rerank: RerankPrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: HashMap<String, String>,
}

/// Prompts for LLM reranking of retrieved segments.
///
/// Templates see `{{query}}`, `{{candidates}}` and `{{count}}`; the ranked
/// variant also sees `{{n}}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RerankPrompts {
    pub system: String,
    pub user: String,
    pub ranked_system: String,
    pub ranked_user: String,
}

impl Default for RerankPrompts {
    fn default() -> Self {
        Self {
            system: "You are a helpful assistant designed to find the best match for a given query among search results.".to_string(),

            user: r#"Query: {{query}}

Search Results:
{{candidates}}

Based on the query and the search results, which result is the best match?
Return your response in the following format:
Best match: [index of the best match (1-based)]
Brief explanation: [A short explanation of why this is the best match]"#
                .to_string(),

            ranked_system: "You are a helpful assistant designed to rank search results by how well they match a given query.".to_string(),

            ranked_user: r#"Query: {{query}}

Search Results:
{{candidates}}

Rank up to {{n}} of the {{count}} results above that best match the query, best first.
Return your response in the following format, one entry per result:
1. [index of the result (1-based)]
Explanation: [A short explanation of why it matches]
2. [index of the result (1-based)]
Explanation: [A short explanation of why it matches]"#
                .to_string(),
        }
    }
}

impl Prompts {
    /// Load prompts, with optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let rerank_path = custom_path.join("rerank.toml");
            if rerank_path.exists() {
                let content = std::fs::read_to_string(&rerank_path)?;
                prompts.rerank = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    ///
    /// Substitution is a single pass over the template: text inserted for one
    /// placeholder is never scanned again. Unknown placeholders are left as is.
    pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
        PLACEHOLDER
            .replace_all(template, |caps: &Captures| match vars.get(&caps[1]) {
                Some(value) => value.clone(),
                None => caps[0].to_string(),
            })
            .into_owned()
    }

    /// Render a prompt template with both provided variables and custom config variables.
    /// Provided variables take precedence over custom config variables.
    pub fn render_with_custom(&self, template: &str, vars: &HashMap<String, String>) -> String {
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert(key.clone(), value.clone());
        }
        Self::render(template, &merged)
    }
}
