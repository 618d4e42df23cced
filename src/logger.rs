//! # Session Logger
//!
//! Shared workflow for hooks that turn a transcript into a per-session JSON
//! file and then refresh a summary across every session of the same kind:
//!
//! 1. create `{workspace}/.cpa-workflow-artifacts/{category}/`
//! 2. write `{session_id}.json` = session metadata + the logger's payload
//! 3. rebuild the category's aggregation file from all session files
//!
//! Step 2 decides the exit status. Step 3 is best-effort: its error is logged
//! as a warning and the session file stays as written.

use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use walkdir::WalkDir;

use crate::error::{AggregationError, HookInputError};
use crate::models::{HookInformation, HookInput, SessionRecord, StoredSession};
use crate::timestamp::now_rfc3339;
use crate::utils::format_path;

/// Exit status a hook would have terminated with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookExit {
    Success,
    Failure,
}

impl From<HookExit> for ExitCode {
    fn from(exit: HookExit) -> Self {
        match exit {
            HookExit::Success => ExitCode::SUCCESS,
            HookExit::Failure => ExitCode::FAILURE,
        }
    }
}

pub trait SessionLogger {
    /// Category payload merged into the session record
    type Payload: Serialize;

    /// Short name used in logs and as the session directory name.
    fn category(&self) -> &'static str;

    /// Directory holding this logger's `{session_id}.json` files.
    fn session_directory(&self, info: &HookInformation) -> PathBuf;

    fn extraction(&self, info: &HookInformation) -> Result<Self::Payload>;

    /// Rebuild the summary from every session file in `session_directory`.
    /// Returns the path of the file written.
    fn aggregation(&self, session_directory: &Path) -> Result<PathBuf, AggregationError>;
}

/// Parse the hook's stdin payload (`session_id`, `reason`, `transcript_path`, `cwd`).
pub fn hook_information<R: Read>(
    mut reader: R,
    workspace_dir: PathBuf,
) -> Result<HookInformation, HookInputError> {
    let mut buf = Vec::new();
    reader.read_to_end(&mut buf)?;
    let input: HookInput = serde_json::from_slice(&buf)?;
    Ok(HookInformation::from_input(input, workspace_dir))
}

pub fn run_logger<L: SessionLogger + ?Sized>(logger: &L, info: &HookInformation) -> HookExit {
    let session_directory = match write_session(logger, info) {
        Ok(dir) => dir,
        Err(e) => {
            tracing::error!("{}: Error writing session data: {e:#}", logger.category());
            return HookExit::Failure;
        }
    };
    match logger.aggregation(&session_directory) {
        Ok(path) => tracing::info!(
            "Aggregated data saved to: {}",
            format_path(&path.to_string_lossy())
        ),
        Err(e) => tracing::warn!("{}: Failed to aggregate data: {e}", logger.category()),
    }
    HookExit::Success
}

fn write_session<L: SessionLogger + ?Sized>(logger: &L, info: &HookInformation) -> Result<PathBuf> {
    let session_directory = logger.session_directory(info);
    fs::create_dir_all(&session_directory)
        .with_context(|| format!("create {}", session_directory.display()))?;

    let output_file = session_directory.join(format!("{}.json", info.session_id));
    let record = SessionRecord {
        session_id: info.session_id.clone(),
        timestamp: now_rfc3339(),
        exit_reason: info.exit_reason.clone(),
        working_directory: info.working_directory.to_string_lossy().into_owned(),
        transcript_path: info.transcript_path.to_string_lossy().into_owned(),
        payload: logger.extraction(info)?,
    };
    let json = serde_json::to_string_pretty(&record).context("serialize session record")?;
    fs::write(&output_file, json).with_context(|| format!("write {}", output_file.display()))?;
    tracing::info!(
        "Session data saved to: {}",
        format_path(&output_file.to_string_lossy())
    );
    Ok(session_directory)
}

/// `*.json` files directly inside `dir`, sorted by file name.
pub(crate) fn session_files(dir: &Path) -> Result<Vec<PathBuf>, AggregationError> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|source| AggregationError::Scan {
            dir: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if entry.file_type().is_file() && path.extension().is_some_and(|e| e == "json") {
            files.push(path.to_path_buf());
        }
    }
    files.sort();
    Ok(files)
}

pub(crate) fn read_session<P: DeserializeOwned>(path: &Path) -> Result<StoredSession<P>> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("parse {}", path.display()))
}

/// Every readable session in `dir`; broken files are skipped with a warning.
pub(crate) fn load_sessions<P: DeserializeOwned>(
    dir: &Path,
) -> Result<Vec<StoredSession<P>>, AggregationError> {
    let mut sessions = Vec::new();
    for path in session_files(dir)? {
        match read_session(&path) {
            Ok(s) => sessions.push(s),
            Err(e) => tracing::warn!("Skipping session file: {e:#}"),
        }
    }
    Ok(sessions)
}

pub(crate) fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), AggregationError> {
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json).map_err(|source| AggregationError::Write {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::cell::Cell;

    #[derive(Serialize, Deserialize, Debug, Default)]
    struct TestPayload {
        extracted_key: String,
    }

    struct TestLogger {
        aggregated: Cell<usize>,
        fail_aggregation: bool,
    }

    impl TestLogger {
        fn new(fail_aggregation: bool) -> Self {
            Self {
                aggregated: Cell::new(0),
                fail_aggregation,
            }
        }
    }

    impl SessionLogger for TestLogger {
        type Payload = TestPayload;

        fn category(&self) -> &'static str {
            "test-logs"
        }

        fn session_directory(&self, info: &HookInformation) -> PathBuf {
            info.workspace_dir.join(".cpa-workflow-artifacts").join(self.category())
        }

        fn extraction(&self, _info: &HookInformation) -> Result<TestPayload> {
            Ok(TestPayload {
                extracted_key: "extracted_value".to_string(),
            })
        }

        fn aggregation(&self, session_directory: &Path) -> Result<PathBuf, AggregationError> {
            self.aggregated.set(self.aggregated.get() + 1);
            if self.fail_aggregation {
                return Err(AggregationError::Write {
                    path: session_directory.to_path_buf(),
                    source: std::io::Error::other("disk full"),
                });
            }
            Ok(session_directory.join("agg.json"))
        }
    }

    fn info(workspace: &Path) -> HookInformation {
        HookInformation {
            session_id: "abc123".to_string(),
            exit_reason: "completed".to_string(),
            transcript_path: PathBuf::from("/tmp/transcript.jsonl"),
            workspace_dir: workspace.to_path_buf(),
            working_directory: PathBuf::from("/home/user/project"),
        }
    }

    #[test]
    fn test_hook_information_round_trips_fields() {
        let input = br#"{"session_id":"abc123","reason":"completed","transcript_path":"/tmp/transcript.json","cwd":"/home/user/project"}"#;
        let got = hook_information(&input[..], PathBuf::from("/workspace")).unwrap();
        assert_eq!(
            got,
            HookInformation {
                session_id: "abc123".to_string(),
                exit_reason: "completed".to_string(),
                transcript_path: PathBuf::from("/tmp/transcript.json"),
                workspace_dir: PathBuf::from("/workspace"),
                working_directory: PathBuf::from("/home/user/project"),
            }
        );
    }

    #[test]
    fn test_hook_information_rejects_invalid_json() {
        let err = hook_information(&b"invalid json"[..], PathBuf::from("/w")).unwrap_err();
        assert!(matches!(err, HookInputError::Json(_)));
        assert!(err.to_string().starts_with("Error parsing hook input"));
    }

    #[test]
    fn test_hook_information_requires_all_keys() {
        let input = br#"{"session_id":"abc123","reason":"completed"}"#;
        assert!(hook_information(&input[..], PathBuf::from("/w")).is_err());
    }

    #[test]
    fn test_run_writes_record_and_aggregates() {
        let tmp = tempfile::tempdir().unwrap();
        let logger = TestLogger::new(false);

        assert_eq!(run_logger(&logger, &info(tmp.path())), HookExit::Success);
        assert_eq!(logger.aggregated.get(), 1);

        let path = tmp
            .path()
            .join(".cpa-workflow-artifacts/test-logs/abc123.json");
        let written: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["session_id"], "abc123");
        assert_eq!(written["exit_reason"], "completed");
        assert_eq!(written["working_directory"], "/home/user/project");
        assert_eq!(written["transcript_path"], "/tmp/transcript.jsonl");
        assert_eq!(written["extracted_key"], "extracted_value");
        assert!(crate::timestamp::parse(written["timestamp"].as_str().unwrap()).is_ok());
    }

    #[test]
    fn test_rerun_overwrites_in_place() {
        let tmp = tempfile::tempdir().unwrap();
        let logger = TestLogger::new(false);
        let dir = tmp.path().join(".cpa-workflow-artifacts/test-logs");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("abc123.json"), r#"{"stale": true}"#).unwrap();

        run_logger(&logger, &info(tmp.path()));

        let written: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(dir.join("abc123.json")).unwrap()).unwrap();
        assert!(written.get("stale").is_none());
        assert_eq!(session_files(&dir).unwrap().len(), 1);
    }

    #[test]
    fn test_aggregation_failure_keeps_success() {
        let tmp = tempfile::tempdir().unwrap();
        let logger = TestLogger::new(true);
        assert_eq!(run_logger(&logger, &info(tmp.path())), HookExit::Success);
        assert!(
            tmp.path()
                .join(".cpa-workflow-artifacts/test-logs/abc123.json")
                .is_file()
        );
    }

    #[test]
    fn test_write_failure_is_reported() {
        let tmp = tempfile::tempdir().unwrap();
        // a file where the artifacts directory should be
        fs::write(tmp.path().join(".cpa-workflow-artifacts"), "").unwrap();
        let logger = TestLogger::new(false);
        assert_eq!(run_logger(&logger, &info(tmp.path())), HookExit::Failure);
        assert_eq!(logger.aggregated.get(), 0);
    }

    #[test]
    fn test_session_files_only_lists_json() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("b.json"), "{}").unwrap();
        fs::write(tmp.path().join("a.json"), "{}").unwrap();
        fs::write(tmp.path().join("notes.md"), "").unwrap();
        fs::create_dir(tmp.path().join("nested.json")).unwrap();

        let files = session_files(tmp.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.json", "b.json"]);
    }
}
