//! `fpl_analysis` — Fantasy Premier League-flavoured article search.

use std::sync::Arc;

use async_trait::async_trait;
use pitchline_rank::Strategy;

use super::context::ArticleSearch;
use super::{Tool, ToolResult};

pub struct FplAnalysisTool {
    search: Arc<dyn ArticleSearch>,
}

impl FplAnalysisTool {
    pub fn new(search: Arc<dyn ArticleSearch>) -> Self {
        Self { search }
    }
}

#[async_trait]
impl Tool for FplAnalysisTool {
    fn name(&self) -> &str {
        "fpl_analysis"
    }

    fn description(&self) -> &str {
        "Analyze Fantasy Premier League prospects for players. Use this when users ask about \
         FPL recommendations, player values, or fantasy football advice. Input should be a \
         player name or general FPL query."
    }

    fn input_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": { "type": "string", "description": "FPL-related query" }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, input: serde_json::Value) -> ToolResult {
        let query = match input.get("query").and_then(|v| v.as_str()) {
            Some(q) => q,
            None => return ToolResult::error("missing required field: query"),
        };

        let fpl_query = format!("{query} FPL fantasy premier league value price");
        let results = match self.search.search(&fpl_query, Strategy::Hybrid, 3).await {
            Ok(r) => r,
            Err(e) => return ToolResult::error(format!("Error performing FPL analysis: {e}")),
        };

        let relevant: Vec<String> = results
            .into_iter()
            .filter(|ranked| {
                let title = ranked.candidate.title.to_lowercase();
                let content = ranked.candidate.content.to_lowercase();
                title.contains("fantasy") || content.contains("fpl")
            })
            .map(|ranked| {
                let c = ranked.candidate;
                let excerpt: String = c.content.chars().take(150).collect();
                format!(
                    "FPL Analysis: {}\nKey points: {excerpt}...\nSource: {}\n",
                    c.title, c.source
                )
            })
            .collect();

        if relevant.is_empty() {
            return ToolResult::success(format!(
                "No specific FPL analysis found for: {query}. Consider checking recent performance and injury news."
            ));
        }

        ToolResult::success(relevant.join("\n"))
    }
}
