//! # Pricing Module
//!
//! Loads model pricing from `model_costs.json` and turns token counts into a
//! USD cost.
//!
//! ## Pricing File
//!
//! ```json
//! {
//!   "last_updated": "2025-11-24",
//!   "source": "https://claude.com/pricing#api",
//!   "note": "Prices per million tokens",
//!   "models": {
//!     "claude-sonnet-4-5": {"input": 3.0, "output": 15.0, "cache_write": 3.75, "cache_read": 0.3}
//!   }
//! }
//! ```
//!
//! Prices are stored per million tokens and converted to per-token rates at
//! load time. Model ids are matched after stripping a trailing `-YYYYMMDD`.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::Path;

use crate::error::PricingError;
use crate::models::UsageTotals;
use crate::utils::round_to;

const TOKENS_PER_MILLION: f64 = 1_000_000.0;

static DATE_SUFFIX_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"-\d{8}$").unwrap());

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pricing {
    pub in_per_tok: f64,
    pub out_per_tok: f64,
    pub cache_create_per_tok: f64,
    pub cache_read_per_tok: f64,
}

impl Pricing {
    /// Linear in every counter; rounded to 6 decimals.
    pub fn cost(&self, tokens: &UsageTotals) -> f64 {
        let raw = tokens.input as f64 * self.in_per_tok
            + tokens.output as f64 * self.out_per_tok
            + tokens.cache_write as f64 * self.cache_create_per_tok
            + tokens.cache_read as f64 * self.cache_read_per_tok;
        round_to(raw, 6)
    }
}

#[derive(Deserialize, Debug)]
struct ModelPrices {
    input: f64,
    output: f64,
    cache_write: f64,
    cache_read: f64,
}

#[derive(Deserialize, Debug)]
#[allow(dead_code)]
struct PricingFile {
    last_updated: Option<String>,
    source: Option<String>,
    note: Option<String>,
    #[serde(default)]
    models: HashMap<String, ModelPrices>,
}

/// Per-token prices keyed by base model id (no date suffix).
#[derive(Clone, Debug, Default)]
pub struct PricingTable {
    models: HashMap<String, Pricing>,
}

impl PricingTable {
    pub fn from_json(json: &str) -> Result<Self, PricingError> {
        let file: PricingFile = serde_json::from_str(json)?;
        let models = file
            .models
            .into_iter()
            .map(|(id, p)| {
                (
                    id,
                    Pricing {
                        in_per_tok: p.input / TOKENS_PER_MILLION,
                        out_per_tok: p.output / TOKENS_PER_MILLION,
                        cache_create_per_tok: p.cache_write / TOKENS_PER_MILLION,
                        cache_read_per_tok: p.cache_read / TOKENS_PER_MILLION,
                    },
                )
            })
            .collect();
        Ok(Self { models })
    }

    pub fn load(path: &Path) -> Result<Self, PricingError> {
        let json = fs::read_to_string(path).map_err(|source| match source.kind() {
            io::ErrorKind::NotFound => PricingError::NotFound(path.to_path_buf()),
            _ => PricingError::Io {
                path: path.to_path_buf(),
                source,
            },
        })?;
        Self::from_json(&json)
    }

    /// Missing or broken pricing is not fatal: costs become a note instead.
    pub fn load_or_empty(path: &Path) -> Self {
        match Self::load(path) {
            Ok(table) => {
                tracing::debug!(
                    "loaded pricing for {} models from {}",
                    table.len(),
                    path.display()
                );
                table
            }
            Err(e) => {
                tracing::warn!("{e}");
                Self::default()
            }
        }
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Resolve a (possibly dated) model id to its pricing entry.
    ///
    /// Exact match on the undated id first, then the longest table key that
    /// prefixes the id.
    pub fn lookup(&self, model_id: &str) -> Option<(&str, Pricing)> {
        let base = normalize_model_id(model_id);
        if let Some((k, p)) = self.models.get_key_value(base) {
            return Some((k.as_str(), *p));
        }
        self.models
            .iter()
            .filter(|(k, _)| model_id.starts_with(k.as_str()))
            .max_by_key(|(k, _)| k.len())
            .map(|(k, p)| (k.as_str(), *p))
    }

    pub fn cost_for(&self, model_id: &str, tokens: &UsageTotals) -> Option<f64> {
        self.lookup(model_id).map(|(_, p)| p.cost(tokens))
    }
}

/// `claude-sonnet-4-5-20250929` -> `claude-sonnet-4-5`.
pub fn normalize_model_id(model_id: &str) -> &str {
    match DATE_SUFFIX_RE.find(model_id) {
        Some(m) => &model_id[..m.start()],
        None => model_id,
    }
}
