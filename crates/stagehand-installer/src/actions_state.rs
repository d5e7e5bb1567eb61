//! Shared executor context.
//!
//! Holds the read-only inputs of a run plus the warnings collected so far.

use std::sync::mpsc::Sender;

use stagehand_core::{Config, InstallationState, Outcome, ProcessDecision};

use crate::events::ProgressEvent;
use crate::paths::InstallPaths;
use crate::platform::Platform;

pub struct ActionContext<'a> {
    pub config: &'a Config,
    pub paths: &'a InstallPaths,
    pub platform: &'a dyn Platform,
    pub state: &'a InstallationState,
    pub log_tx: Sender<ProgressEvent>,
    /// Asked once when the application is found running; receives its pid.
    pub decide: &'a mut dyn FnMut(u32) -> ProcessDecision,
    pub warnings: Vec<String>,
}

/// What a step wants to happen next when it did not fail.
#[derive(Debug, Eq, PartialEq)]
pub enum StepFlow {
    Continue,
    Stop(Outcome),
}

impl ActionContext<'_> {
    pub fn app_name(&self) -> &str {
        &self.config.app.name
    }

    /// Record a non-fatal failure and keep going.
    pub fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!("{message}");
        let _ = self
            .log_tx
            .send(ProgressEvent::LogLine(format!("Warning: {message}")));
        self.warnings.push(message);
    }
}
