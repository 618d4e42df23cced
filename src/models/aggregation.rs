use serde::{Deserialize, Serialize};

use super::session::{CacheUsage, TokenTotals, UserInput};

/// One line of the `sessions` list in `costs_aggregation.json`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SessionSummary {
    pub session_id: Option<String>,
    pub date: Option<String>,
    pub duration: Option<String>,
    pub cost_usd: f64,
}

/// Materialized view over every file in the costs directory.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CostsAggregation {
    /// First time this file was written; survives reruns
    pub created_date: String,
    pub last_update: String,
    pub session_count: usize,
    pub total_tokens: TokenTotals,
    pub cache_usage: CacheUsage,
    pub cost_usd: f64,
    pub cost_formatted: String,
    pub sessions: Vec<SessionSummary>,
}

/// Only the key needed to carry `created_date` over a rewrite.
#[derive(Deserialize, Debug, Default)]
pub struct ExistingAggregation {
    #[serde(default)]
    pub created_date: Option<String>,
}

/// `user_inputs_aggregation.json`: one inner list per session file.
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq)]
pub struct UserInputsAggregation {
    pub inputs: Vec<Vec<UserInput>>,
}
