use std::path::PathBuf;

/// Where the commit hook stopped. Every variant maps to exit code 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    /// Plugin directory does not exist
    NotAPluginDir,
    /// No `.cpa-workflow-artifacts` directory
    NoArtifacts,
    /// No `wrap-up-report-*.md` yet
    NoReport,
    /// Report found but nothing to commit
    NoChanges { report: PathBuf },
    Committed { report: PathBuf, message: String },
}
