//! # Cost Report
//!
//! Reads stored cost session files back and renders them for a human (summary,
//! detailed) or for other tools (CSV, JSON).

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
#[cfg(feature = "colors")]
use owo_colors::OwoColorize;
use serde_json::Value;

use crate::logger::session_files;
use crate::models::{CostData, CostPayload, StoredSession};
use crate::timestamp;
use crate::utils::{format_currency, format_hours_minutes, format_thousands};

#[cfg(not(feature = "colors"))]
mod color_shim {
    use std::fmt::{self, Display, Formatter};

    pub struct Plain(pub String);

    impl Display for Plain {
        fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
            f.write_str(&self.0)
        }
    }

    pub trait ColorizeShim {
        fn as_str(&self) -> &str;

        fn bold(&self) -> Plain {
            Plain(self.as_str().to_string())
        }
        fn bright_green(&self) -> Plain {
            Plain(self.as_str().to_string())
        }
        fn bright_cyan(&self) -> Plain {
            Plain(self.as_str().to_string())
        }
    }

    impl ColorizeShim for &str {
        fn as_str(&self) -> &str {
            self
        }
    }
    impl ColorizeShim for String {
        fn as_str(&self) -> &str {
            self.as_str()
        }
    }
}

#[cfg(not(feature = "colors"))]
use color_shim::ColorizeShim as OwoColorize;

/// Plugin metadata that can sit next to session files.
const SKIPPED_FILES: [&str; 3] = ["plugin.json", "hooks.json", "settings.local.json"];

const RULE_WIDTH: usize = 70;
const TOP_SESSIONS: usize = 10;

const CSV_HEADER: &str = "session_id,timestamp,model,cost_usd,input_tokens,output_tokens,total_tokens,cache_read,cache_write,duration_seconds,exit_reason";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Summary,
    Detailed,
    Csv,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortBy {
    Date,
    Cost,
    Duration,
    Tokens,
}

#[derive(Debug, Clone, Default)]
pub struct ReportFilter {
    pub since: Option<NaiveDate>,
    /// Case-insensitive substring of the model id
    pub model: Option<String>,
}

/// `YYYY-MM-DD`
pub fn parse_since(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .with_context(|| format!("Invalid date format '{s}'. Use YYYY-MM-DD"))
}

/// One session file. `raw` is kept as read so JSON output is lossless.
#[derive(Debug, Clone)]
pub struct ReportSession {
    pub raw: Value,
    pub record: StoredSession<CostPayload>,
}

impl ReportSession {
    pub fn from_value(raw: Value) -> Result<Self> {
        let record = serde_json::from_value(raw.clone())?;
        Ok(Self { raw, record })
    }

    fn data(&self) -> &CostData {
        &self.record.payload.cost_data
    }

    pub fn timestamp(&self) -> &str {
        self.record.timestamp.as_deref().unwrap_or("")
    }

    pub fn model(&self) -> Option<&str> {
        self.data().model.as_deref()
    }

    pub fn cost(&self) -> f64 {
        self.data().cost_usd.unwrap_or(0.0)
    }

    pub fn duration_seconds(&self) -> f64 {
        self.data().duration_seconds.unwrap_or(0.0)
    }

    pub fn total_tokens(&self) -> u64 {
        self.data().total_tokens.map_or(0, |t| t.total)
    }

    fn matches(&self, filter: &ReportFilter) -> bool {
        if let Some(since) = filter.since {
            match timestamp::parse(self.timestamp()) {
                Ok(ts) if ts.date_naive() >= since => {}
                _ => return false,
            }
        }
        if let Some(needle) = filter.model.as_deref().filter(|m| !m.is_empty()) {
            let model = self.model().unwrap_or("").to_lowercase();
            if !model.contains(&needle.to_lowercase()) {
                return false;
            }
        }
        true
    }
}

/// Session files in `dir` that pass `filter`, in file-name order.
pub fn load_report_sessions(dir: &Path, filter: &ReportFilter) -> Result<Vec<ReportSession>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let files = session_files(dir)?;
    let mut sessions = Vec::with_capacity(files.len());
    for path in files {
        let skipped = path
            .file_name()
            .is_some_and(|n| SKIPPED_FILES.iter().any(|s| n == *s));
        if skipped {
            continue;
        }
        match read_report_session(&path) {
            Ok(s) if s.matches(filter) => sessions.push(s),
            Ok(_) => {}
            Err(e) => tracing::warn!("Could not load {}: {e:#}", path.display()),
        }
    }
    Ok(sessions)
}

fn read_report_session(path: &Path) -> Result<ReportSession> {
    let contents = fs::read_to_string(path)?;
    ReportSession::from_value(serde_json::from_str(&contents)?)
}

/// Date ascending; cost, duration and tokens descending. Ties keep file order.
pub fn sort_sessions(sessions: &mut [ReportSession], sort_by: SortBy) {
    match sort_by {
        SortBy::Date => sessions.sort_by(|a, b| a.timestamp().cmp(b.timestamp())),
        SortBy::Cost => sessions.sort_by(|a, b| b.cost().total_cmp(&a.cost())),
        SortBy::Duration => {
            sessions.sort_by(|a, b| b.duration_seconds().total_cmp(&a.duration_seconds()))
        }
        SortBy::Tokens => sessions.sort_by_key(|s| std::cmp::Reverse(s.total_tokens())),
    }
}

pub fn render(sessions: &[ReportSession], format: ReportFormat) -> Result<String> {
    Ok(match format {
        ReportFormat::Summary => render_summary(sessions),
        ReportFormat::Detailed => render_detailed(sessions),
        ReportFormat::Csv => render_csv(sessions),
        ReportFormat::Json => render_json(sessions)?,
    })
}

#[derive(Debug, Default)]
struct ModelStats {
    count: usize,
    cost: f64,
    tokens: u64,
}

pub fn render_summary(sessions: &[ReportSession]) -> String {
    if sessions.is_empty() {
        return "No session data found.\n".to_string();
    }
    let rule = "=".repeat(RULE_WIDTH);
    let thin = "-".repeat(RULE_WIDTH);

    let mut input = 0u64;
    let mut output = 0u64;
    let mut cache_read = 0u64;
    let mut cache_write = 0u64;
    let mut duration = 0.0f64;
    let mut cost = 0.0f64;
    // first-seen order, so equal costs list in session order
    let mut by_model: Vec<(String, ModelStats)> = Vec::new();

    for s in sessions {
        let data = s.data();
        if let Some(t) = data.total_tokens {
            input += t.input;
            output += t.output;
        }
        if let Some(c) = data.cache_usage {
            cache_read += c.cache_read;
            cache_write += c.cache_write;
        }
        duration += s.duration_seconds();
        cost += s.cost();

        let model = s.model().unwrap_or("unknown");
        let idx = match by_model.iter().position(|(m, _)| m == model) {
            Some(i) => i,
            None => {
                by_model.push((model.to_string(), ModelStats::default()));
                by_model.len() - 1
            }
        };
        let stats = &mut by_model[idx].1;
        stats.count += 1;
        stats.cost += s.cost();
        stats.tokens += s.total_tokens();
    }
    by_model.sort_by(|a, b| b.1.cost.total_cmp(&a.1.cost));

    let mut out = String::new();
    out.push_str(&format!("{rule}\n{}\n{rule}\n", "SESSION COST SUMMARY".bold()));
    out.push_str(&format!("Total Sessions:        {}\n", sessions.len()));
    out.push_str(&format!(
        "Total Cost:            {}\n",
        format_currency(cost).bright_green()
    ));
    out.push_str(&format!("Total Input Tokens:    {}\n", format_thousands(input)));
    out.push_str(&format!("Total Output Tokens:   {}\n", format_thousands(output)));
    out.push_str(&format!(
        "Total Tokens:          {}\n",
        format_thousands(input + output)
    ));
    out.push_str(&format!("Cache Read Tokens:     {}\n", format_thousands(cache_read)));
    out.push_str(&format!("Cache Write Tokens:    {}\n", format_thousands(cache_write)));
    if duration > 0.0 {
        out.push_str(&format!(
            "Total Duration:        {}\n",
            format_hours_minutes(duration)
        ));
    }

    out.push_str(&format!("\n{}\n{thin}\n", "BY MODEL:".bold()));
    for (model, stats) in &by_model {
        out.push_str(&format!("  {}:\n", model.bright_cyan()));
        out.push_str(&format!("    Sessions: {}\n", stats.count));
        out.push_str(&format!("    Cost:     {}\n", format_currency(stats.cost)));
        out.push_str(&format!("    Tokens:   {}\n", format_thousands(stats.tokens)));
    }

    out.push_str(&format!(
        "\n{}\n{thin}\n",
        "TOP 10 MOST EXPENSIVE SESSIONS:".bold()
    ));
    let mut expensive: Vec<&ReportSession> = sessions.iter().collect();
    expensive.sort_by(|a, b| b.cost().total_cmp(&a.cost()));
    for (i, s) in expensive.into_iter().take(TOP_SESSIONS).enumerate() {
        let ts = s.timestamp();
        let date = ts.get(..10).unwrap_or(ts);
        out.push_str(&format!(
            "  {}. {} - {} tokens - {} - {} - {}\n",
            i + 1,
            format_currency(s.cost()),
            format_thousands(s.total_tokens()),
            s.model().unwrap_or("unknown"),
            s.data().duration_formatted.as_deref().unwrap_or("N/A"),
            date
        ));
    }
    out.push_str(&rule);
    out.push('\n');
    out
}

pub fn render_detailed(sessions: &[ReportSession]) -> String {
    let rule = "=".repeat(RULE_WIDTH);
    let thin = "-".repeat(RULE_WIDTH);
    let na = |v: Option<&str>| v.unwrap_or("N/A").to_string();

    let mut out = format!("{rule}\n{}\n{rule}\n", "DETAILED SESSION REPORT".bold());
    for (i, s) in sessions.iter().enumerate() {
        let r = &s.record;
        out.push_str(&format!("\nSession {}/{}\n{thin}\n", i + 1, sessions.len()));
        out.push_str(&format!("Session ID:     {}\n", na(r.session_id.as_deref())));
        out.push_str(&format!("Timestamp:      {}\n", na(r.timestamp.as_deref())));
        out.push_str(&format!("Exit Reason:    {}\n", na(r.exit_reason.as_deref())));
        out.push_str(&format!(
            "Working Dir:    {}\n",
            na(r.working_directory.as_deref())
        ));

        let data = s.data();
        if *data == CostData::default() {
            continue;
        }
        out.push_str(&format!("Model:          {}\n", na(data.model.as_deref())));
        out.push_str(&format!("Cost:           {}\n", format_currency(s.cost())));
        out.push_str(&format!(
            "Duration:       {}\n",
            na(data.duration_formatted.as_deref())
        ));
        if let Some(t) = data.total_tokens {
            out.push_str(&format!("Input Tokens:   {}\n", format_thousands(t.input)));
            out.push_str(&format!("Output Tokens:  {}\n", format_thousands(t.output)));
            out.push_str(&format!("Total Tokens:   {}\n", format_thousands(t.total)));
        }
        if let Some(c) = data.cache_usage {
            out.push_str(&format!("Cache Read:     {}\n", format_thousands(c.cache_read)));
            out.push_str(&format!("Cache Write:    {}\n", format_thousands(c.cache_write)));
        }
    }
    out
}

pub fn render_csv(sessions: &[ReportSession]) -> String {
    let mut out = String::from(CSV_HEADER);
    out.push('\n');
    for s in sessions {
        let r = &s.record;
        let data = s.data();
        let tokens = data.total_tokens.unwrap_or_default();
        let cache = data.cache_usage.unwrap_or_default();
        let row = [
            r.session_id.clone().unwrap_or_default(),
            s.timestamp().to_string(),
            s.model().unwrap_or("").to_string(),
            s.cost().to_string(),
            tokens.input.to_string(),
            tokens.output.to_string(),
            tokens.total.to_string(),
            cache.cache_read.to_string(),
            cache.cache_write.to_string(),
            s.duration_seconds().to_string(),
            r.exit_reason.clone().unwrap_or_default(),
        ];
        out.push_str(&row.join(","));
        out.push('\n');
    }
    out
}

pub fn render_json(sessions: &[ReportSession]) -> Result<String> {
    let raw: Vec<&Value> = sessions.iter().map(|s| &s.raw).collect();
    let mut out = serde_json::to_string_pretty(&raw)?;
    out.push('\n');
    Ok(out)
}
