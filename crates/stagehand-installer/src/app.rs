//! UI state for the installer TUI.

use std::path::PathBuf;
use std::sync::mpsc;

use stagehand_core::util::log_snippet;
use stagehand_core::{ActionReport, Config, InstallationState, Mode, Outcome, ProcessDecision};

use crate::actions::{build_plan, execute, steps_from_plan, summarize_outcome, ActionContext};
use crate::checks::Checks;
use crate::detect::detect_installation;
use crate::events::ProgressEvent;
use crate::model::{ActionStep, StepStatus};
use crate::paths::{format_with_home, home_dir, resolve_under_home, InstallPaths};
use crate::platform::Platform;
use crate::wizard::{OptionToggle, Screen, Wizard};

const MAX_LOG_LINES: usize = 200;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ProgressState {
    // No run yet.
    Idle,
    Running,
    Completed,
    Failed,
    // The user cancelled at the running-instance prompt.
    Stopped,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Modal {
    CancelConfirm,
    ProcessPrompt { pid: u32 },
    Error(String),
}

/// A focusable input on the current screen.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Field {
    Directory,
    Toggle(OptionToggle),
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SessionEnd {
    Finished { launch: bool },
    Cancelled,
    QuitAfterFailure,
}

impl SessionEnd {
    pub fn exit_code(self) -> u8 {
        match self {
            SessionEnd::Finished { .. } => 0,
            SessionEnd::QuitAfterFailure => 1,
            SessionEnd::Cancelled => 2,
        }
    }
}

pub struct App {
    pub wizard: Wizard,
    pub config: Config,
    pub paths: InstallPaths,
    pub platform: Box<dyn Platform>,
    pub checks: Checks,
    pub license: String,
    pub license_scroll: u16,
    // Raw text of the directory field; may not parse to the current target yet.
    pub dir_input: String,
    pub focus: usize,
    pub steps: Vec<ActionStep>,
    pub logs: Vec<String>,
    pub progress_state: ProgressState,
    pub last_report: Option<ActionReport>,
    pub last_error: Option<String>,
    pub modal: Option<Modal>,
    // Set once any run ends in failure; decides the exit status on cancel.
    pub failed_run: bool,
}

impl App {
    pub fn new(config: Config, paths: InstallPaths, platform: Box<dyn Platform>) -> Self {
        let detection = detect_installation(&paths.default_install_dir, &config.app);
        let state =
            InstallationState::from_config(&config, &paths.default_install_dir, Mode::Install);
        let wizard = Wizard::new(state, detection);
        let checks = Checks::run(&config, &paths);
        let license = config.license_text(&paths.resource_dir);
        let dir_input = format_with_home(&wizard.state().target_directory);

        tracing::info!(
            mode = wizard.mode().label(),
            installed = wizard.detection().present,
            target = %wizard.state().target_directory.display(),
            "wizard session started"
        );

        Self {
            wizard,
            config,
            paths,
            platform,
            checks,
            license,
            license_scroll: 0,
            dir_input,
            focus: 0,
            steps: Vec::new(),
            logs: Vec::new(),
            progress_state: ProgressState::Idle,
            last_report: None,
            last_error: None,
            modal: None,
            failed_run: false,
        }
    }

    pub fn fields(&self) -> Vec<Field> {
        match self.wizard.screen() {
            Screen::UninstallOptions => vec![
                Field::Toggle(OptionToggle::RemoveShortcuts),
                Field::Toggle(OptionToggle::RemoveUserSettings),
            ],
            Screen::Options => {
                let mut fields = Vec::new();
                if self.wizard.can_edit_directory() {
                    fields.push(Field::Directory);
                }
                fields.extend([
                    Field::Toggle(OptionToggle::DesktopShortcut),
                    Field::Toggle(OptionToggle::StartMenuShortcut),
                    Field::Toggle(OptionToggle::AutoStart),
                ]);
                fields
            }
            Screen::Complete if self.wizard.mode().installs() => {
                vec![Field::Toggle(OptionToggle::LaunchOnFinish)]
            }
            _ => Vec::new(),
        }
    }

    pub fn focused_field(&self) -> Option<Field> {
        self.fields().get(self.focus).copied()
    }

    pub fn move_focus(&mut self, down: bool) {
        let count = self.fields().len();
        if count == 0 {
            return;
        }
        self.focus = if down {
            (self.focus + 1) % count
        } else {
            (self.focus + count - 1) % count
        };
    }

    pub fn toggle_focused(&mut self) {
        if let Some(Field::Toggle(option)) = self.focused_field() {
            self.wizard.toggle(option);
        }
    }

    pub fn push_dir_char(&mut self, ch: char) {
        if self.focused_field() == Some(Field::Directory) {
            self.dir_input.push(ch);
            self.apply_dir_input();
        }
    }

    pub fn pop_dir_char(&mut self) {
        if self.focused_field() == Some(Field::Directory) {
            self.dir_input.pop();
            self.apply_dir_input();
        }
    }

    fn apply_dir_input(&mut self) {
        let input = self.dir_input.trim();
        let directory = if input.is_empty() {
            PathBuf::new()
        } else {
            match home_dir() {
                Ok(home) => resolve_under_home(input, &home),
                Err(_) => PathBuf::from(input),
            }
        };
        self.wizard.set_target_directory(directory);
    }

    fn sync_dir_input(&mut self) {
        self.dir_input = format_with_home(&self.wizard.state().target_directory);
    }

    /// Flip between uninstall and reinstall on the welcome screen.
    pub fn cycle_mode(&mut self) {
        if !self.wizard.detection().present {
            return;
        }
        let requested = match self.wizard.mode() {
            Mode::Uninstall => Mode::Reinstall,
            Mode::Install | Mode::Reinstall => Mode::Uninstall,
        };
        if self.wizard.request_mode(requested) {
            tracing::debug!(mode = requested.label(), "mode selected");
        }
    }

    pub fn refresh(&mut self) {
        let detection = detect_installation(&self.paths.default_install_dir, &self.config.app);
        if self.wizard.refresh_detection(detection) {
            self.checks = Checks::run(&self.config, &self.paths);
            self.sync_dir_input();
        }
    }

    pub fn advance(&mut self) -> bool {
        let moved = self.wizard.advance();
        if moved {
            self.focus = 0;
        }
        moved
    }

    pub fn retreat(&mut self) -> bool {
        let moved = self.wizard.retreat();
        if moved {
            self.focus = 0;
            self.license_scroll = 0;
            self.progress_state = ProgressState::Idle;
        }
        moved
    }

    /// How the session ends if the user cancels now.
    pub fn cancel_end(&self) -> SessionEnd {
        if self.failed_run {
            SessionEnd::QuitAfterFailure
        } else {
            SessionEnd::Cancelled
        }
    }

    /// Reset the progress pane for a fresh run.
    pub fn prepare_run(&mut self) {
        let plan = build_plan(self.wizard.state());
        self.steps = steps_from_plan(&plan);
        self.logs.clear();
        self.last_error = None;
        self.last_report = None;
        self.progress_state = ProgressState::Running;
    }

    /// Run the executor to completion. `decide` is asked when the
    /// application is found running.
    pub fn execute_run(
        &self,
        decide: &mut dyn FnMut(u32) -> ProcessDecision,
    ) -> (ActionReport, Vec<ProgressEvent>) {
        let (log_tx, log_rx) = mpsc::channel();
        let report = {
            let mut ctx = ActionContext {
                config: &self.config,
                paths: &self.paths,
                platform: self.platform.as_ref(),
                state: self.wizard.state(),
                log_tx,
                decide,
                warnings: Vec::new(),
            };
            execute(&mut ctx)
        };
        (report, log_rx.try_iter().collect())
    }

    /// Apply a finished run to the progress pane and the wizard.
    pub fn complete_run(&mut self, report: ActionReport, events: Vec<ProgressEvent>) -> Outcome {
        for event in events {
            self.apply_progress(event);
        }
        self.finish_run(report)
    }

    fn finish_run(&mut self, report: ActionReport) -> Outcome {
        let outcome = report.outcome.clone();
        match &outcome {
            Outcome::Success => self.progress_state = ProgressState::Completed,
            Outcome::Failed(reason) => {
                self.progress_state = ProgressState::Failed;
                self.last_error = Some(reason.clone());
                self.modal = Some(Modal::Error(reason.clone()));
                self.failed_run = true;
            }
            Outcome::Cancelled | Outcome::ReturnToPrevious => {
                self.progress_state = ProgressState::Stopped;
            }
        }
        if !report.warnings.is_empty() {
            self.append_log(format!("{} warning(s) recorded.", report.warnings.len()));
        }
        self.append_log(summarize_outcome(self.wizard.mode(), &outcome));

        let before = self.wizard.current_step();
        self.wizard.apply_outcome(&outcome);
        if self.wizard.current_step() != before {
            self.focus = 0;
        }
        if outcome == Outcome::ReturnToPrevious {
            self.progress_state = ProgressState::Idle;
        }
        self.last_report = Some(report);
        outcome
    }

    pub fn apply_progress(&mut self, event: ProgressEvent) {
        match event {
            ProgressEvent::StepStarted(index) => self.set_step_status(index, StepStatus::Running),
            ProgressEvent::StepCompleted(index) => self.set_step_status(index, StepStatus::Done),
            ProgressEvent::StepWarned(index, _) => self.set_step_status(index, StepStatus::Warned),
            ProgressEvent::StepFailed(index, err) => {
                self.set_step_status(index, StepStatus::Failed);
                self.append_log(format!("Error: {}", err));
            }
            ProgressEvent::StepStopped(index) => self.set_step_status(index, StepStatus::Stopped),
            ProgressEvent::LogLine(line) => self.append_log(line),
            ProgressEvent::Finished => {
                if self.progress_state == ProgressState::Running {
                    self.progress_state = ProgressState::Completed;
                }
            }
        }
    }

    fn set_step_status(&mut self, index: usize, status: StepStatus) {
        if let Some(step) = self.steps.get_mut(index) {
            step.status = status;
        }
    }

    fn append_log(&mut self, line: String) {
        self.logs.push(log_snippet(&line));
        if self.logs.len() > MAX_LOG_LINES {
            let excess = self.logs.len() - MAX_LOG_LINES;
            self.logs.drain(0..excess);
        }
    }

    /// The installed executable when the user asked to launch it on finish.
    pub fn launch_target(&self) -> Option<(PathBuf, PathBuf)> {
        let state = self.wizard.state();
        if !state.mode.installs() || !state.launch_on_finish {
            return None;
        }
        let exe = state.target_directory.join(&self.config.app.executable);
        Some((exe, state.target_directory.clone()))
    }
}
