//! # Configuration
//!
//! Resolves the environment the hooks run in. Every value can come from the
//! environment (`CPA_*`) or the matching command-line flag; clap merges the two.
//!
//! - `CPA_RUNNING`: hooks are no-ops unless it is `1`
//! - `CPA_PLUGIN_DIR` / `CPA_WORKSPACE_DIR`: where artifacts are written
//! - `CPA_PRICING_FILE`: path to `model_costs.json`

use std::env;
use std::path::{Path, PathBuf};

use crate::cli::Args;

pub const CPA_RUNNING: &str = "CPA_RUNNING";
pub const CPA_WORKSPACE_DIR: &str = "CPA_WORKSPACE_DIR";
pub const CPA_PLUGIN_DIR: &str = "CPA_PLUGIN_DIR";

/// Directory under the workspace where every hook writes its artifacts.
pub const ARTIFACTS_DIR: &str = ".cpa-workflow-artifacts";

pub const PRICING_FILE_NAME: &str = "model_costs.json";

#[derive(Debug, Clone)]
pub struct Settings {
    pub cpa_running: bool,
    pub workspace_dir: PathBuf,
    pub pricing_file: PathBuf,
}

impl Settings {
    pub fn from_args(args: &Args) -> Self {
        Self {
            cpa_running: args.cpa_running.as_deref().map(str::trim) == Some("1"),
            workspace_dir: resolve_plugin_dir(
                args.plugin_dir.as_deref(),
                args.workspace_dir.as_deref(),
            ),
            pricing_file: args
                .pricing_file
                .clone()
                .unwrap_or_else(default_pricing_file),
        }
    }

    pub fn artifacts_dir(&self) -> PathBuf {
        self.workspace_dir.join(ARTIFACTS_DIR)
    }
}

fn non_empty(p: Option<&Path>) -> Option<&Path> {
    p.filter(|p| !p.as_os_str().is_empty())
}

/// Plugin dir if set, else workspace dir if set, else the current directory.
pub fn resolve_plugin_dir(plugin_dir: Option<&Path>, workspace_dir: Option<&Path>) -> PathBuf {
    if let Some(p) = non_empty(plugin_dir) {
        return p.to_path_buf();
    }
    if let Some(w) = non_empty(workspace_dir) {
        return w.to_path_buf();
    }
    env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

/// Locate `model_costs.json` when no explicit path was given.
///
/// Order: `$CLAUDE_PLUGIN_ROOT/model_costs.json`, then the first match walking
/// up from the executable's directory, then `./model_costs.json`.
pub fn default_pricing_file() -> PathBuf {
    if let Ok(root) = env::var("CLAUDE_PLUGIN_ROOT") {
        if !root.trim().is_empty() {
            return PathBuf::from(root).join(PRICING_FILE_NAME);
        }
    }
    if let Some(found) = env::current_exe()
        .ok()
        .and_then(|exe| find_upwards(&exe, PRICING_FILE_NAME))
    {
        return found;
    }
    PathBuf::from(PRICING_FILE_NAME)
}

fn find_upwards(start: &Path, name: &str) -> Option<PathBuf> {
    start
        .ancestors()
        .skip(1)
        .map(|dir| dir.join(name))
        .find(|candidate| candidate.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plugin_dir_wins_over_workspace() {
        let got = resolve_plugin_dir(Some(Path::new("/ws/plugin")), Some(Path::new("/ws")));
        assert_eq!(got, PathBuf::from("/ws/plugin"));
    }

    #[test]
    fn empty_plugin_dir_falls_back_to_workspace() {
        let got = resolve_plugin_dir(Some(Path::new("")), Some(Path::new("/ws")));
        assert_eq!(got, PathBuf::from("/ws"));
    }

    #[test]
    fn falls_back_to_cwd() {
        let got = resolve_plugin_dir(None, None);
        assert_eq!(got, env::current_dir().unwrap());
    }

    #[test]
    fn find_upwards_locates_file_in_ancestor() {
        let tmp = tempfile::tempdir().unwrap();
        let nested = tmp.path().join("target").join("release");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(tmp.path().join(PRICING_FILE_NAME), "{}").unwrap();

        let exe = nested.join("cpa-hooks");
        assert_eq!(
            find_upwards(&exe, PRICING_FILE_NAME),
            Some(tmp.path().join(PRICING_FILE_NAME))
        );
    }
}
