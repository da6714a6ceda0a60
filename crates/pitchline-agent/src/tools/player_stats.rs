//! `player_stats` — roster lookup, optional live FPL stats, recent news.

use std::sync::Arc;

use async_trait::async_trait;
use pitchline_rank::Strategy;

use super::context::{ArticleSearch, FantasyStats, PlayerDirectory};
use super::{Tool, ToolResult};

pub struct PlayerStatsTool {
    players: Arc<dyn PlayerDirectory>,
    fantasy: Arc<dyn FantasyStats>,
    search: Arc<dyn ArticleSearch>,
}

impl PlayerStatsTool {
    pub fn new(
        players: Arc<dyn PlayerDirectory>,
        fantasy: Arc<dyn FantasyStats>,
        search: Arc<dyn ArticleSearch>,
    ) -> Self {
        Self {
            players,
            fantasy,
            search,
        }
    }
}

#[async_trait]
impl Tool for PlayerStatsTool {
    fn name(&self) -> &str {
        "player_stats"
    }

    fn description(&self) -> &str {
        "Get player statistics, career information, and current status. Use this when users \
         ask about specific player performance, stats, or career details. Input should be a \
         player name."
    }

    fn input_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "name": { "type": "string", "description": "Player name" }
            },
            "required": ["name"]
        })
    }

    async fn execute(&self, input: serde_json::Value) -> ToolResult {
        let name_query = match input.get("name").and_then(|v| v.as_str()) {
            Some(n) => n,
            None => return ToolResult::error("missing required field: name"),
        };

        let matches = match self.players.find(name_query).await {
            Ok(m) => m,
            Err(e) => return ToolResult::error(format!("Error retrieving player information: {e}")),
        };

        if matches.is_empty() {
            return ToolResult::success(format!(
                "Player '{name_query}' not found in database. Please check the spelling or try a different name."
            ));
        }

        if matches.len() > 1 {
            let list: Vec<String> = matches
                .iter()
                .take(5)
                .map(|p| {
                    format!(
                        "- {} ({}, {})",
                        p.name,
                        p.team.as_deref().unwrap_or("Unknown Team"),
                        p.position.as_deref().unwrap_or("Unknown")
                    )
                })
                .collect();
            return ToolResult::success(format!(
                "Multiple players found for '{name_query}':\n{}\n\nPlease be more specific with the player name.",
                list.join("\n")
            ));
        }

        let player = &matches[0];
        let mut lines = vec![
            format!("**{}**", player.name),
            format!("Position: {}", player.position.as_deref().unwrap_or("Unknown")),
            format!("Team: {}", player.team.as_deref().unwrap_or("Unknown Team")),
            format!("Status: {}", player.status.as_deref().unwrap_or("Unknown")),
        ];
        if let Some(nat) = &player.nationality {
            lines.push(format!("Nationality: {nat}"));
        }
        if let Some(age) = player.age {
            lines.push(format!("Age: {age}"));
        }

        match self.fantasy.lookup(&player.name).await {
            Ok(Some(fpl)) => {
                lines.push(String::new());
                lines.push("**FPL Statistics (Current Season):**".to_string());
                lines.push(format!("Price: £{:.1}m", fpl.price_millions));
                lines.push(format!("Total Points: {}", fpl.total_points));
                lines.push(format!("Goals: {}", fpl.goals_scored));
                lines.push(format!("Assists: {}", fpl.assists));
                lines.push(format!("Clean Sheets: {}", fpl.clean_sheets));
                lines.push(format!("Minutes Played: {}", fpl.minutes));
                lines.push(format!("Yellow Cards: {}", fpl.yellow_cards));
                lines.push(format!("Red Cards: {}", fpl.red_cards));
                lines.push(format!("Form: {}", fpl.form));
                lines.push(format!("Points per Game: {}", fpl.points_per_game));
                if fpl.is_goalkeeper {
                    lines.push(format!("Saves: {}", fpl.saves));
                    lines.push(format!("Goals Conceded: {}", fpl.goals_conceded));
                }
            }
            Ok(None) => {}
            Err(_) => lines.push("\n*Note: Live FPL statistics unavailable*".to_string()),
        }

        let team_name = player.team.as_deref().unwrap_or("Unknown Team");
        if let Ok(news) = self
            .search
            .search(&format!("{} {}", player.name, team_name), Strategy::Temporal, 3)
            .await
        {
            if !news.is_empty() {
                lines.push(String::new());
                lines.push("**Recent News:**".to_string());
                for ranked in news.into_iter().take(2) {
                    let c = ranked.candidate;
                    let date = c
                        .published_date
                        .map(|d| d.to_rfc3339())
                        .unwrap_or_else(|| "Unknown Date".to_string());
                    lines.push(format!("- {} ({}, {date})", c.title, c.source));
                }
            }
        }

        ToolResult::success(lines.join("\n"))
    }
}
