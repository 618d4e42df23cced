//! # CPA Hooks
//!
//! Session-end hooks for the plugin assistant workflow.
//!
//! ## Overview
//!
//! When an assistant session ends, the host pipes a small JSON payload on
//! stdin. This crate turns that payload plus the session transcript into
//! artifacts under `{workspace}/.cpa-workflow-artifacts/`:
//! - `costs/{session_id}.json` and `costs_aggregation.json`
//! - `user_inputs/{session_id}.json` and `user_inputs_aggregation.json`
//!
//! It also commits and pushes the plugin once a wrap-up report exists, and
//! can print a cost report over the stored sessions.
//!
//! ## Features
//!
//! - `colors` (default): Enables terminal color output in reports via owo-colors

/// Command-line argument parsing
pub mod cli;

/// Environment and flag resolution
pub mod config;

/// Token, duration and USD cost logging
pub mod costs;

/// Typed errors shared by the hooks
pub mod error;

/// Commit-and-push hook for finished plugins
pub mod git;

/// Shared session logger workflow
pub mod logger;

/// tracing subscriber setup
pub mod logging;

/// Data models for hook input, session records and aggregations
pub mod models;

/// Runs every session-end hook with failure isolation
pub mod orchestrator;

/// Model pricing table and cost calculation
pub mod pricing;

/// Cost reports over stored session files
pub mod report;

/// ISO-8601 timestamp parsing
pub mod timestamp;

/// JSONL transcript reading
pub mod transcript;

/// User input logging
pub mod user_inputs;

/// Utility functions for formatting and stdin
pub mod utils;
