//! `news_search` — semantic search over ingested football articles.

use std::sync::Arc;

use async_trait::async_trait;
use pitchline_rank::Strategy;

use super::context::ArticleSearch;
use super::{Tool, ToolResult};

pub struct NewsSearchTool {
    search: Arc<dyn ArticleSearch>,
}

impl NewsSearchTool {
    pub fn new(search: Arc<dyn ArticleSearch>) -> Self {
        Self { search }
    }
}

#[async_trait]
impl Tool for NewsSearchTool {
    fn name(&self) -> &str {
        "news_search"
    }

    fn description(&self) -> &str {
        "Search for football news articles using semantic search. Use this when users ask \
         about specific players, teams, transfers, injuries, or recent football news. Input \
         should be a search query related to football."
    }

    fn input_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": { "type": "string", "description": "Search query" }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, input: serde_json::Value) -> ToolResult {
        let query = match input.get("query").and_then(|v| v.as_str()) {
            Some(q) => q,
            None => return ToolResult::error("missing required field: query"),
        };

        let results = match self.search.search(query, Strategy::Hybrid, 5).await {
            Ok(r) => r,
            Err(e) => return ToolResult::error(format!("Error searching for news: {e}")),
        };

        if results.is_empty() {
            return ToolResult::success(format!("No relevant articles found for: {query}"));
        }

        let formatted: Vec<String> = results
            .into_iter()
            .take(3)
            .map(|ranked| {
                let c = ranked.candidate;
                let excerpt: String = c.content.chars().take(200).collect();
                let date = c
                    .published_date
                    .map(|d| d.to_rfc3339())
                    .unwrap_or_else(|| "Unknown".to_string());
                format!(
                    "**{}**\nSource: {}\nDate: {}\nRelevance: {:.2}\nSummary: {excerpt}...\nURL: {}\n",
                    c.title,
                    c.source,
                    date,
                    ranked.breakdown.total,
                    c.url.as_deref().unwrap_or(""),
                )
            })
            .collect();

        ToolResult::success(formatted.join("\n"))
    }
}
