use serde::Deserialize;
use std::path::PathBuf;

/// Raw SessionEnd payload as Claude Code writes it to the hook's stdin.
#[derive(Deserialize, Debug, Clone)]
pub struct HookInput {
    pub session_id: String,
    pub reason: String,
    pub transcript_path: String,
    pub cwd: String,
}

/// Session context handed to every hook. Built once per invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookInformation {
    pub session_id: String,
    /// Why the session ended (e.g. `clear`, `logout`, `prompt_input_exit`)
    pub exit_reason: String,
    pub transcript_path: PathBuf,
    /// Plugin or workspace root; artifacts live under it
    pub workspace_dir: PathBuf,
    /// Directory Claude Code was started in
    pub working_directory: PathBuf,
}

impl HookInformation {
    pub fn from_input(input: HookInput, workspace_dir: PathBuf) -> Self {
        Self {
            session_id: input.session_id,
            exit_reason: input.reason,
            transcript_path: PathBuf::from(input.transcript_path),
            workspace_dir,
            working_directory: PathBuf::from(input.cwd),
        }
    }
}
