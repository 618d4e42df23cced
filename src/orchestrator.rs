//! # Session End Orchestrator
//!
//! Runs every session-end hook in a fixed order:
//! costs → user inputs → git commit.
//!
//! A hook's own exit status is ignored. An error or panic in one hook is
//! logged as a warning and the next hook still runs; the orchestrator itself
//! always succeeds.

use std::panic::{self, AssertUnwindSafe};

use anyhow::Result;

use crate::config::Settings;
use crate::costs::CostsLogger;
use crate::git::{GitCommitPlugin, GitRunner};
use crate::logger::{HookExit, run_logger};
use crate::models::HookInformation;
use crate::pricing::PricingTable;
use crate::user_inputs::UserInputsLogger;

/// A unit of work the orchestrator can run.
pub trait SessionHook {
    fn name(&self) -> &str;

    /// The exit status the hook would have terminated with on its own.
    fn execute(&self, info: &HookInformation) -> Result<HookExit>;
}

impl SessionHook for CostsLogger {
    fn name(&self) -> &str {
        "CostsLogger"
    }

    fn execute(&self, info: &HookInformation) -> Result<HookExit> {
        Ok(run_logger(self, info))
    }
}

impl SessionHook for UserInputsLogger {
    fn name(&self) -> &str {
        "UserInputsLogger"
    }

    fn execute(&self, info: &HookInformation) -> Result<HookExit> {
        Ok(run_logger(self, info))
    }
}

impl<G: GitRunner> SessionHook for GitCommitPlugin<G> {
    fn name(&self) -> &str {
        "GitCommitPlugin"
    }

    fn execute(&self, info: &HookInformation) -> Result<HookExit> {
        Ok(self.run(info))
    }
}

pub struct SessionEndOrchestrator {
    hooks: Vec<Box<dyn SessionHook>>,
}

impl SessionEndOrchestrator {
    pub fn new(hooks: Vec<Box<dyn SessionHook>>) -> Self {
        Self { hooks }
    }

    /// Costs, user inputs, git commit; pricing loaded from `settings`.
    pub fn standard(settings: &Settings) -> Self {
        let pricing = PricingTable::load_or_empty(&settings.pricing_file);
        Self::new(vec![
            Box::new(CostsLogger::new(pricing)),
            Box::new(UserInputsLogger),
            Box::new(GitCommitPlugin::new()),
        ])
    }

    pub fn hook_names(&self) -> Vec<&str> {
        self.hooks.iter().map(|h| h.name()).collect()
    }

    pub fn run(&self, info: &HookInformation) -> HookExit {
        for hook in &self.hooks {
            let name = hook.name();
            tracing::debug!("running {name}");
            match panic::catch_unwind(AssertUnwindSafe(|| hook.execute(info))) {
                Ok(Ok(HookExit::Success)) => {}
                Ok(Ok(HookExit::Failure)) => tracing::warn!("{name} exited with failure"),
                Ok(Err(e)) => tracing::warn!("{name} failed: {e:#}"),
                Err(payload) => tracing::warn!("{name} panicked: {}", panic_message(&*payload)),
            }
        }
        HookExit::Success
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "unknown panic"
    }
}
