//! # User Inputs Logger
//!
//! Records what the user typed during a session:
//! - `free_text`: plain prompts
//! - `slash_command`: `/command` invocations (from `<command-name>` tags)
//! - `question_answer`: answers given to AskUserQuestion prompts

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::path::{Path, PathBuf};

use crate::config::ARTIFACTS_DIR;
use crate::error::AggregationError;
use crate::logger::{SessionLogger, load_sessions, write_json};
use crate::models::{HookInformation, UserInput, UserInputsAggregation, UserInputsPayload};
use crate::transcript::read_messages;

pub const CATEGORY: &str = "user_inputs";
pub const AGGREGATION_FILE: &str = "user_inputs_aggregation.json";

const ANSWERS_PREFIX: &str = "User has answered your questions:";
const ANSWERS_SUFFIX: &str = ". You can now continue with the user's answers in mind.";

static COMMAND_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<command-name>([^<]+)</command-name>").unwrap());

static QUESTION_ANSWER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""([^"]+)"="([^"]+)""#).unwrap());

#[derive(Debug, Default, Clone, Copy)]
pub struct UserInputsLogger;

/// Inputs in transcript order.
pub fn extract_inputs(messages: &[Value]) -> Vec<UserInput> {
    let mut result = Vec::new();
    for entry in messages {
        if entry.get("type").and_then(Value::as_str) != Some("user") {
            continue;
        }
        // meta entries are skill expansions, not user input
        if entry.get("isMeta").is_some_and(is_truthy) {
            continue;
        }
        let Some(content) = entry.get("message").and_then(|m| m.get("content")) else {
            continue;
        };
        match content {
            Value::String(text) if !text.is_empty() => {
                if let Some(caps) = COMMAND_NAME_RE.captures(text) {
                    result.push(UserInput::slash_command(caps[1].trim()));
                } else if !text.starts_with('<') {
                    result.push(UserInput::free_text(text.as_str()));
                }
            }
            Value::Array(items) => {
                for item in items {
                    if item.get("type").and_then(Value::as_str) != Some("tool_result") {
                        continue;
                    }
                    if let Some(text) = item.get("content").and_then(Value::as_str) {
                        result.extend(parse_answers(text));
                    }
                }
            }
            _ => {}
        }
    }
    result
}

/// Question/answer pairs from an AskUserQuestion tool result, e.g.
/// `User has answered your questions: "Scope?"="Patient", "Tests?"="Yes". You can now ...`
pub fn parse_answers(text: &str) -> Vec<UserInput> {
    let Some(rest) = text.strip_prefix(ANSWERS_PREFIX) else {
        return Vec::new();
    };
    let rest = rest.strip_prefix(' ').unwrap_or(rest);
    let answers = rest.strip_suffix(ANSWERS_SUFFIX).unwrap_or(rest);
    QUESTION_ANSWER_RE
        .captures_iter(answers)
        .map(|caps| UserInput::question_answer(&caps[1], &caps[2]))
        .collect()
}

fn is_truthy(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

impl SessionLogger for UserInputsLogger {
    type Payload = UserInputsPayload;

    fn category(&self) -> &'static str {
        CATEGORY
    }

    fn session_directory(&self, info: &HookInformation) -> PathBuf {
        info.workspace_dir.join(ARTIFACTS_DIR).join(self.category())
    }

    fn extraction(&self, info: &HookInformation) -> Result<UserInputsPayload> {
        let messages = read_messages(&info.transcript_path)
            .with_context(|| format!("read transcript {}", info.transcript_path.display()))?;
        Ok(UserInputsPayload {
            user_inputs: extract_inputs(&messages),
        })
    }

    /// One inner list per session file, in file-name order. Inputs are not
    /// flattened across sessions.
    fn aggregation(&self, session_directory: &Path) -> Result<PathBuf, AggregationError> {
        let artifacts = session_directory.parent().unwrap_or(session_directory);
        let aggregated_file = artifacts.join(AGGREGATION_FILE);

        let inputs = load_sessions::<UserInputsPayload>(session_directory)?
            .into_iter()
            .map(|s| s.payload.user_inputs)
            .collect();
        write_json(&aggregated_file, &UserInputsAggregation { inputs })?;
        Ok(aggregated_file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_slash_command() {
        let messages = vec![json!({
            "type": "user",
            "message": {"content": "<command-message>test</command-message>\n<command-name>/test-command</command-name>"}
        })];
        assert_eq!(
            extract_inputs(&messages),
            vec![UserInput::slash_command("/test-command")]
        );
        let v = serde_json::to_value(&extract_inputs(&messages)[0]).unwrap();
        assert_eq!(v, json!({"input": "/test-command", "type": "slash_command"}));
    }

    #[test]
    fn test_free_text_and_markup() {
        let messages = vec![
            json!({"type": "user", "message": {"content": "Add a patient banner"}}),
            json!({"type": "user", "message": {"content": "<local-command-stdout>ok</local-command-stdout>"}}),
            json!({"type": "user", "message": {"content": ""}}),
        ];
        assert_eq!(
            extract_inputs(&messages),
            vec![UserInput::free_text("Add a patient banner")]
        );
    }

    #[test]
    fn test_skips_meta_and_non_user_entries() {
        let messages = vec![
            json!({"type": "assistant", "message": {"content": "Hello"}}),
            json!({"type": "user", "isMeta": true, "message": {"content": "Skill body"}}),
            json!({"type": "user", "isMeta": false, "message": {"content": "kept"}}),
            json!({"type": "user"}),
        ];
        assert_eq!(extract_inputs(&messages), vec![UserInput::free_text("kept")]);
    }

    #[test]
    fn test_question_answers_from_tool_result() {
        let messages = vec![json!({
            "type": "user",
            "message": {"content": [
                {"type": "text", "text": "ignored"},
                {"type": "tool_result", "content": "plain tool output"},
                {"type": "tool_result", "content": "User has answered your questions: \"Which scope?\"=\"Patient\", \"Add tests?\"=\"Yes\". You can now continue with the user's answers in mind."}
            ]}
        })];
        let got = extract_inputs(&messages);
        assert_eq!(
            got,
            vec![
                UserInput::question_answer("Which scope?", "Patient"),
                UserInput::question_answer("Add tests?", "Yes"),
            ]
        );
        let v = serde_json::to_value(&got[0]).unwrap();
        assert_eq!(
            v,
            json!({"input": "Patient", "type": "question_answer", "question": "Which scope?"})
        );
    }

    #[test]
    fn test_non_string_tool_result_content_is_ignored() {
        let messages = vec![json!({
            "type": "user",
            "message": {"content": [{"type": "tool_result", "content": [{"type": "text"}]}]}
        })];
        assert!(extract_inputs(&messages).is_empty());
    }

    #[test]
    fn test_order_follows_transcript() {
        let messages = vec![
            json!({"type": "user", "message": {"content": "first"}}),
            json!({"type": "user", "message": {"content": "<command-name>/second</command-name>"}}),
            json!({"type": "user", "message": {"content": "third"}}),
        ];
        let inputs: Vec<_> = extract_inputs(&messages)
            .into_iter()
            .map(|i| i.input)
            .collect();
        assert_eq!(inputs, vec!["first", "/second", "third"]);
    }
}
