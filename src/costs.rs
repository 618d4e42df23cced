//! # Costs Logger
//!
//! Extracts token usage, session duration and USD cost from a transcript and
//! keeps `costs_aggregation.json` in sync with every recorded session.
//!
//! ## Transcript Shapes
//!
//! Usage is read from a top-level `usage` object or, failing that, from
//! `message.usage`. The model id is the first string `model` found at the top
//! level, in `message`, or in `metadata`, scanning messages in order.

use anyhow::Result;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::ARTIFACTS_DIR;
use crate::error::AggregationError;
use crate::logger::{SessionLogger, load_sessions, write_json};
use crate::models::aggregation::ExistingAggregation;
use crate::models::{
    CacheUsage, CostData, CostPayload, CostsAggregation, HookInformation, MessageUsage,
    SessionSummary, TokenTotals, UsageTotals,
};
use crate::pricing::PricingTable;
use crate::timestamp::{self, now_rfc3339};
use crate::transcript::read_messages;
use crate::utils::{format_currency, format_duration, round_to};

pub const CATEGORY: &str = "costs";
pub const AGGREGATION_FILE: &str = "costs_aggregation.json";

pub struct CostsLogger {
    pricing: PricingTable,
}

impl CostsLogger {
    pub fn new(pricing: PricingTable) -> Self {
        Self { pricing }
    }

    /// Build `cost_data` from already-parsed transcript messages.
    pub fn cost_data(&self, messages: &[Value]) -> CostData {
        let mut data = CostData {
            message_count: Some(messages.len()),
            ..CostData::default()
        };

        let model = detect_model(messages);
        data.model = model.clone();

        if let Some(seconds) = session_duration_seconds(messages) {
            data.duration_seconds = Some(round_to(seconds, 2));
            data.duration_formatted = Some(format_duration(seconds));
        }

        let details = usage_records(messages);
        if !details.is_empty() {
            data.token_usage_details = Some(details.into_iter().cloned().collect());
        }

        let usage = sum_usage(messages);
        if usage.records == 0 {
            return data;
        }
        if usage.input > 0 || usage.output > 0 {
            data.total_tokens = Some(TokenTotals::new(usage.input, usage.output));
        }
        if usage.cache_read > 0 || usage.cache_write > 0 {
            data.cache_usage = Some(CacheUsage {
                cache_read: usage.cache_read,
                cache_write: usage.cache_write,
            });
        }
        if let Some(model) = model {
            match self.pricing.cost_for(&model, &usage) {
                Some(cost) => {
                    data.cost_usd = Some(cost);
                    data.cost_formatted = Some(format_currency(cost));
                }
                None => {
                    data.cost_calculation_note =
                        Some(format!("Pricing not available for model: {model}"));
                }
            }
        }
        data
    }
}

/// First string `model` at the top level, in `message`, or in `metadata`.
pub fn detect_model(messages: &[Value]) -> Option<String> {
    messages.iter().find_map(|msg| {
        let obj = msg.as_object()?;
        obj.get("model")
            .and_then(Value::as_str)
            .or_else(|| obj.get("message")?.get("model")?.as_str())
            .or_else(|| obj.get("metadata")?.get("model")?.as_str())
            .map(str::to_string)
    })
}

/// Seconds between the first and last parsable `timestamp`, in message order.
/// `None` with fewer than two valid timestamps.
pub fn session_duration_seconds(messages: &[Value]) -> Option<f64> {
    let mut valid = messages.iter().filter_map(|msg| {
        let raw = msg.get("timestamp")?.as_str()?;
        match timestamp::parse(raw) {
            Ok(ts) => Some(ts),
            Err(e) => {
                tracing::debug!("ignoring {e}");
                None
            }
        }
    });
    let first = valid.next()?;
    let last = valid.last()?;
    Some((last - first).num_milliseconds() as f64 / 1000.0)
}

/// Raw usage value of every message that carries one. A top-level `usage`
/// key takes precedence over `message.usage`.
pub fn usage_records(messages: &[Value]) -> Vec<&Value> {
    messages
        .iter()
        .filter_map(|msg| {
            let obj = msg.as_object()?;
            match obj.get("usage") {
                Some(u) => Some(u),
                None => obj.get("message")?.get("usage"),
            }
        })
        .collect()
}

/// Sum every usage record; values that are not objects contribute nothing.
pub fn sum_usage(messages: &[Value]) -> UsageTotals {
    let mut totals = UsageTotals::default();
    for usage in usage_records(messages) {
        if !usage.is_object() {
            continue;
        }
        match serde_json::from_value::<MessageUsage>(usage.clone()) {
            Ok(u) => totals.add(&u),
            Err(e) => tracing::debug!("ignoring usage record: {e}"),
        }
    }
    totals
}

impl SessionLogger for CostsLogger {
    type Payload = CostPayload;

    fn category(&self) -> &'static str {
        CATEGORY
    }

    fn session_directory(&self, info: &HookInformation) -> PathBuf {
        info.workspace_dir.join(ARTIFACTS_DIR).join(self.category())
    }

    fn extraction(&self, info: &HookInformation) -> Result<CostPayload> {
        let cost_data = match read_messages(&info.transcript_path) {
            Ok(messages) => self.cost_data(&messages),
            Err(e) => CostData {
                transcript_parse_error: Some(e.to_string()),
                ..CostData::default()
            },
        };
        Ok(CostPayload { cost_data })
    }

    fn aggregation(&self, session_directory: &Path) -> Result<PathBuf, AggregationError> {
        let artifacts = session_directory.parent().unwrap_or(session_directory);
        let aggregated_file = artifacts.join(AGGREGATION_FILE);

        let summary = aggregate_costs(session_directory, existing_created_date(&aggregated_file))?;
        write_json(&aggregated_file, &summary)?;
        tracing::info!(
            "  Sessions: {}, Total cost: {}",
            summary.session_count,
            summary.cost_formatted
        );
        Ok(aggregated_file)
    }
}

/// `created_date` of a previous aggregation. A missing or corrupt file
/// silently starts a fresh history.
fn existing_created_date(aggregated_file: &Path) -> Option<String> {
    let contents = fs::read_to_string(aggregated_file).ok()?;
    serde_json::from_str::<ExistingAggregation>(&contents)
        .ok()?
        .created_date
}

/// Full rescan of the costs directory into a summary.
pub fn aggregate_costs(
    session_directory: &Path,
    created_date: Option<String>,
) -> Result<CostsAggregation, AggregationError> {
    let stored = load_sessions::<CostPayload>(session_directory)?;

    let mut total_tokens = TokenTotals::default();
    let mut cache_usage = CacheUsage::default();
    let mut cost_usd = 0.0f64;
    let mut sessions = Vec::with_capacity(stored.len());

    for s in stored {
        let data = s.payload.cost_data;
        if let Some(t) = data.total_tokens {
            total_tokens.input += t.input;
            total_tokens.output += t.output;
            total_tokens.total += t.total;
        }
        if let Some(c) = data.cache_usage {
            cache_usage.cache_read += c.cache_read;
            cache_usage.cache_write += c.cache_write;
        }
        let session_cost = data.cost_usd.unwrap_or(0.0);
        cost_usd += session_cost;
        sessions.push(SessionSummary {
            session_id: s.session_id,
            date: s.timestamp,
            duration: data.duration_formatted,
            cost_usd: session_cost,
        });
    }

    // missing dates sort first
    sessions.sort_by(|a, b| {
        a.date
            .as_deref()
            .unwrap_or("")
            .cmp(b.date.as_deref().unwrap_or(""))
    });

    let now = now_rfc3339();
    Ok(CostsAggregation {
        created_date: created_date.unwrap_or_else(|| now.clone()),
        last_update: now,
        session_count: sessions.len(),
        total_tokens,
        cache_usage,
        cost_usd: round_to(cost_usd, 4),
        cost_formatted: format_currency(cost_usd),
        sessions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn pricing() -> PricingTable {
        PricingTable::from_json(
            r#"{"models": {"claude-sonnet-4-5": {"input": 3.0, "output": 15.0, "cache_write": 3.75, "cache_read": 0.3}}}"#,
        )
        .unwrap()
    }

    #[test]
    fn test_detect_model_locations() {
        let cases = [
            (vec![json!({"model": "claude-sonnet-4-5-20250929"})], Some("claude-sonnet-4-5-20250929")),
            (vec![json!({"message": {"model": "claude-opus-4-5-20251101"}})], Some("claude-opus-4-5-20251101")),
            (vec![json!({"metadata": {"model": "claude-haiku-3-5"}})], Some("claude-haiku-3-5")),
            (vec![json!({"other": "data"}), json!({"content": "text"})], None),
            (vec![], None),
            (vec![json!("not a dict"), json!({"model": "claude-sonnet"})], Some("claude-sonnet")),
            (vec![json!({"message": "not a dict"}), json!({"model": "claude-opus"})], Some("claude-opus")),
            (vec![json!({"message": {"other": "data"}, "metadata": {"model": "claude-haiku"}})], Some("claude-haiku")),
        ];
        for (messages, expected) in cases {
            assert_eq!(detect_model(&messages).as_deref(), expected, "{messages:?}");
        }
    }

    #[test]
    fn test_full_transcript() {
        let messages = vec![
            json!({
                "timestamp": "2025-01-15T10:00:00.000Z",
                "message": {"model": "claude-sonnet-4-5-20250929", "usage": {
                    "input_tokens": 100, "output_tokens": 50,
                    "cache_read_input_tokens": 10, "cache_creation_input_tokens": 5
                }}
            }),
            json!({
                "timestamp": "2025-01-15T10:05:30.000Z",
                "message": {"usage": {
                    "input_tokens": 200, "output_tokens": 100,
                    "cache_read_input_tokens": 20, "cache_creation_input_tokens": 10
                }}
            }),
        ];
        let data = CostsLogger::new(pricing()).cost_data(&messages);

        assert_eq!(data.message_count, Some(2));
        assert_eq!(data.model.as_deref(), Some("claude-sonnet-4-5-20250929"));
        assert_eq!(data.duration_seconds, Some(330.0));
        assert_eq!(data.duration_formatted.as_deref(), Some("5m 30s"));
        assert_eq!(data.total_tokens, Some(TokenTotals::new(300, 150)));
        assert_eq!(data.total_tokens.unwrap().total, 450);
        assert_eq!(
            data.cache_usage,
            Some(CacheUsage {
                cache_read: 30,
                cache_write: 15
            })
        );
        // 300*3e-6 + 150*15e-6 + 15*3.75e-6 + 30*0.3e-6
        let cost = data.cost_usd.unwrap();
        assert!((cost - 0.003215).abs() < 1e-9, "{cost}");
        assert_eq!(data.cost_formatted.as_deref(), Some("$0.0032"));
        assert!(data.cost_calculation_note.is_none());
        let details = data.token_usage_details.unwrap();
        assert_eq!(details.len(), 2);
        assert_eq!(details[1]["input_tokens"], 200);
    }

    #[test]
    fn test_usage_details_keep_raw_values() {
        let messages = vec![
            json!({"usage": "not a dict"}),
            json!({"type": "user", "message": {"content": "hi"}}),
            json!({"message": {"usage": {"input_tokens": 7, "service_tier": "standard"}}}),
        ];
        let data = CostsLogger::new(pricing()).cost_data(&messages);
        assert_eq!(
            data.token_usage_details,
            Some(vec![
                json!("not a dict"),
                json!({"input_tokens": 7, "service_tier": "standard"})
            ])
        );
        assert_eq!(data.total_tokens, Some(TokenTotals::new(7, 0)));
    }

    #[test]
    fn test_minimal_transcript_has_no_computed_keys() {
        let data = CostsLogger::new(pricing()).cost_data(&[json!({"type": "user"})]);
        assert_eq!(data.message_count, Some(1));
        assert!(data.model.is_none());
        assert!(data.total_tokens.is_none());
        assert!(data.cost_usd.is_none());
        assert!(data.duration_seconds.is_none());

        let serialized = serde_json::to_value(&data).unwrap();
        assert_eq!(serialized, json!({"message_count": 1}));
    }

    #[test]
    fn test_unpriced_model_records_note() {
        let messages = vec![json!({
            "model": "unknown-model",
            "usage": {"input_tokens": 10, "output_tokens": 5}
        })];
        let data = CostsLogger::new(pricing()).cost_data(&messages);
        assert!(data.cost_usd.is_none());
        assert_eq!(
            data.cost_calculation_note.as_deref(),
            Some("Pricing not available for model: unknown-model")
        );
    }

    #[test]
    fn test_usage_directly_in_message() {
        let messages = vec![json!({"usage": {"input_tokens": 100, "output_tokens": 50}})];
        let usage = sum_usage(&messages);
        assert_eq!((usage.input, usage.output), (100, 50));
    }

    #[test]
    fn test_top_level_usage_wins_over_nested() {
        let messages = vec![json!({
            "usage": {"input_tokens": 1},
            "message": {"usage": {"input_tokens": 1000}}
        })];
        assert_eq!(sum_usage(&messages).input, 1);
    }

    #[test]
    fn test_non_object_usage_is_ignored() {
        let messages = vec![
            json!({"usage": "not a dict"}),
            json!("plain string"),
            json!({"message": {"usage": {"input_tokens": 100}}}),
        ];
        let usage = sum_usage(&messages);
        assert_eq!(usage.input, 100);
        assert_eq!(usage.records, 1);
    }

    #[test]
    fn test_duration_hours_and_seconds() {
        let hours = vec![
            json!({"timestamp": "2025-01-15T10:00:00Z"}),
            json!({"timestamp": "2025-01-15T12:30:45Z"}),
        ];
        assert_eq!(session_duration_seconds(&hours), Some(9045.0));
        assert_eq!(format_duration(9045.0), "2h 30m 45s");

        let seconds = vec![
            json!({"timestamp": "2025-01-15T10:00:00Z"}),
            json!({"timestamp": "2025-01-15T10:00:45Z"}),
        ];
        assert_eq!(session_duration_seconds(&seconds), Some(45.0));
    }

    #[test]
    fn test_duration_needs_two_valid_timestamps() {
        let messages = vec![
            json!({"timestamp": "garbage"}),
            json!({"timestamp": "2025-01-15T10:00:00Z"}),
            json!({"timestamp": 12345}),
        ];
        assert_eq!(session_duration_seconds(&messages), None);
    }

    #[test]
    fn test_unreadable_transcript_is_recorded() {
        let tmp = tempfile::tempdir().unwrap();
        let info = HookInformation {
            session_id: "s".to_string(),
            exit_reason: "other".to_string(),
            transcript_path: tmp.path().join("missing.jsonl"),
            workspace_dir: tmp.path().to_path_buf(),
            working_directory: tmp.path().to_path_buf(),
        };
        let payload = CostsLogger::new(pricing()).extraction(&info).unwrap();
        assert!(payload.cost_data.transcript_parse_error.is_some());
        assert!(payload.cost_data.message_count.is_none());
    }
}
