//! # Git Commit Hook
//!
//! Commits and pushes plugin changes once a wrap-up report exists.
//!
//! ## Flow
//!
//! plugin dir exists → artifacts dir exists → `wrap-up-report-*.md` exists →
//! stage everything → anything changed? → commit + push.
//!
//! Every missing precondition is a silent success. Git runs as a subprocess
//! with the plugin directory as its working directory; this process's own
//! working directory is never touched.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::SystemTime;

use anyhow::{Context, Result};

use crate::config::ARTIFACTS_DIR;
use crate::error::GitError;
use crate::logger::HookExit;
use crate::models::{CommitOutcome, HookInformation};

const REPORT_PREFIX: &str = "wrap-up-report-";
const REPORT_SUFFIX: &str = ".md";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitOutput {
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl GitOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Seam over the `git` CLI.
pub trait GitRunner {
    fn run(&self, dir: &Path, args: &[&str]) -> Result<GitOutput, GitError>;

    /// Like [`GitRunner::run`] but a non-zero exit is an error.
    fn check(&self, dir: &Path, args: &[&str]) -> Result<GitOutput, GitError> {
        let out = self.run(dir, args)?;
        if out.success() {
            Ok(out)
        } else {
            Err(GitError::Command {
                args: args.join(" "),
                stderr: out.stderr.trim().to_string(),
            })
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemGit;

impl GitRunner for SystemGit {
    fn run(&self, dir: &Path, args: &[&str]) -> Result<GitOutput, GitError> {
        tracing::debug!("git {} (in {})", args.join(" "), dir.display());
        let output = Command::new("git")
            .args(args)
            .current_dir(dir)
            .output()
            .map_err(|source| GitError::Spawn {
                args: args.join(" "),
                source,
            })?;
        Ok(GitOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

pub struct GitCommitPlugin<G: GitRunner = SystemGit> {
    git: G,
}

impl GitCommitPlugin<SystemGit> {
    pub fn new() -> Self {
        Self { git: SystemGit }
    }
}

impl Default for GitCommitPlugin<SystemGit> {
    fn default() -> Self {
        Self::new()
    }
}

impl<G: GitRunner> GitCommitPlugin<G> {
    pub fn with_runner(git: G) -> Self {
        Self { git }
    }

    pub fn runner(&self) -> &G {
        &self.git
    }

    /// Hook entry point: every outcome is exit 0, every error exit 1.
    pub fn run(&self, info: &HookInformation) -> HookExit {
        match self.commit_if_wrapped_up(&info.workspace_dir) {
            Ok(outcome) => {
                match outcome {
                    CommitOutcome::NoChanges { .. } => {
                        tracing::info!("No changes detected in plugin directory, skipping commit")
                    }
                    CommitOutcome::Committed { .. } => {
                        tracing::info!("Plugin changes committed and pushed")
                    }
                    other => tracing::debug!("git commit hook: {other:?}"),
                }
                HookExit::Success
            }
            Err(e) => {
                match e.downcast_ref::<GitError>() {
                    Some(git_err) => tracing::error!("{git_err}"),
                    None => tracing::error!("Error in git commit hook: {e:#}"),
                }
                HookExit::Failure
            }
        }
    }

    pub fn commit_if_wrapped_up(&self, plugin_dir: &Path) -> Result<CommitOutcome> {
        if !plugin_dir.exists() {
            return Ok(CommitOutcome::NotAPluginDir);
        }
        let artifacts_dir = plugin_dir.join(ARTIFACTS_DIR);
        if !artifacts_dir.exists() {
            return Ok(CommitOutcome::NoArtifacts);
        }
        let Some(report) = latest_wrap_up_report(&artifacts_dir)? else {
            return Ok(CommitOutcome::NoReport);
        };
        if let Some(name) = report.file_name() {
            tracing::info!("Wrap-up report found: {}", name.to_string_lossy());
        }

        self.stage_files(plugin_dir)?;
        if !self.has_changes(plugin_dir)? {
            return Ok(CommitOutcome::NoChanges { report });
        }

        tracing::info!("Committing plugin changes...");
        match self.commit_and_push(plugin_dir)? {
            Some(message) => Ok(CommitOutcome::Committed { report, message }),
            None => Ok(CommitOutcome::NoChanges { report }),
        }
    }

    pub fn stage_files(&self, plugin_dir: &Path) -> Result<(), GitError> {
        self.git.check(plugin_dir, &["add", "-A", "."])?;
        Ok(())
    }

    /// Anything modified, added or deleted under the plugin directory.
    pub fn has_changes(&self, plugin_dir: &Path) -> Result<bool, GitError> {
        let out = self.git.check(plugin_dir, &["status", "--porcelain", "."])?;
        Ok(!out.stdout.trim().is_empty())
    }

    /// Returns the commit message, or `None` when nothing was staged.
    pub fn commit_and_push(&self, plugin_dir: &Path) -> Result<Option<String>, GitError> {
        self.git.check(plugin_dir, &["add", "-A", "."])?;

        // exit 1 means staged changes exist
        let staged = self.git.run(plugin_dir, &["diff", "--cached", "--quiet"])?;
        if staged.success() {
            tracing::info!("No changes to commit");
            return Ok(None);
        }

        let message = commit_message(plugin_dir);
        self.git.check(plugin_dir, &["commit", "-m", &message])?;
        self.git.check(plugin_dir, &["push"])?;
        Ok(Some(message))
    }
}

pub fn commit_message(plugin_dir: &Path) -> String {
    let plugin_name = plugin_dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!("complete {plugin_name} wrap-up")
}

/// Most recently modified `wrap-up-report-*.md` directly in `artifacts_dir`.
pub fn latest_wrap_up_report(artifacts_dir: &Path) -> Result<Option<PathBuf>> {
    let mut latest: Option<(SystemTime, PathBuf)> = None;
    let entries = fs::read_dir(artifacts_dir)
        .with_context(|| format!("read {}", artifacts_dir.display()))?;
    for entry in entries.flatten() {
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if !(name.starts_with(REPORT_PREFIX) && name.ends_with(REPORT_SUFFIX)) {
            continue;
        }
        let modified = entry
            .metadata()
            .and_then(|m| m.modified())
            .with_context(|| format!("stat {}", entry.path().display()))?;
        if latest.as_ref().is_none_or(|(t, _)| modified > *t) {
            latest = Some((modified, entry.path()));
        }
    }
    Ok(latest.map(|(_, p)| p))
}
