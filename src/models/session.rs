//! On-disk per-session records.
//!
//! Each hook writes one `{session_id}.json` per session into its category
//! directory. The shared metadata comes first; the hook's payload key
//! (`cost_data` or `user_inputs`) is flattened in after it.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Record written by a hook. `P` is the category payload.
#[derive(Serialize, Debug, Clone)]
pub struct SessionRecord<P> {
    pub session_id: String,
    /// RFC 3339 UTC, assigned when the file is written
    pub timestamp: String,
    pub exit_reason: String,
    pub working_directory: String,
    pub transcript_path: String,
    #[serde(flatten)]
    pub payload: P,
}

/// Lenient view of a record read back from disk. Older or hand-edited files
/// may miss any key.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct StoredSession<P> {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_directory: Option<String>,
    #[serde(flatten)]
    pub payload: P,
}

#[derive(Serialize, Deserialize, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TokenTotals {
    #[serde(default)]
    pub input: u64,
    #[serde(default)]
    pub output: u64,
    #[serde(default)]
    pub total: u64,
}

impl TokenTotals {
    pub fn new(input: u64, output: u64) -> Self {
        Self {
            input,
            output,
            total: input + output,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheUsage {
    #[serde(default)]
    pub cache_read: u64,
    #[serde(default)]
    pub cache_write: u64,
}

/// Cost figures for one session. A missing key means "not computed", never zero.
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(default)]
pub struct CostData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_formatted: Option<String>,
    /// Usage objects exactly as they appeared in the transcript
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_usage_details: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_tokens: Option<TokenTotals>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_usage: Option<CacheUsage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost_usd: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost_formatted: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost_calculation_note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcript_parse_error: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq)]
pub struct CostPayload {
    #[serde(default)]
    pub cost_data: CostData,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum InputKind {
    FreeText,
    SlashCommand,
    QuestionAnswer,
}

/// One thing the user typed or chose during the session.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct UserInput {
    pub input: String,
    #[serde(rename = "type")]
    pub kind: InputKind,
    /// Only set for `question_answer`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
}

impl UserInput {
    pub fn free_text(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            kind: InputKind::FreeText,
            question: None,
        }
    }

    pub fn slash_command(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            kind: InputKind::SlashCommand,
            question: None,
        }
    }

    pub fn question_answer(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            input: answer.into(),
            kind: InputKind::QuestionAnswer,
            question: Some(question.into()),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq)]
pub struct UserInputsPayload {
    #[serde(default)]
    pub user_inputs: Vec<UserInput>,
}
