//! Linear wizard flow: which screen is showing, which buttons apply, and
//! which parts of the installation state may still change.

use std::path::PathBuf;

use stagehand_core::{DetectedInstallation, InstallationState, Mode, Outcome};

pub const TOTAL_STEPS: usize = 5;

const WELCOME_STEP: usize = 0;
const OPTIONS_STEP: usize = 2;
const CONFIRM_STEP: usize = TOTAL_STEPS - 2;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Screen {
    Welcome,
    License,
    UninstallOptions,
    Options,
    UninstallSummary,
    Confirm,
    Complete,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PrimaryAction {
    Next,
    Execute(Mode),
    Finish,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ButtonConfig {
    pub back_enabled: bool,
    pub primary_label: &'static str,
    pub primary_action: PrimaryAction,
    pub primary_enabled: bool,
}

/// Checkboxes the user can flip, each valid on one screen only.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum OptionToggle {
    DesktopShortcut,
    StartMenuShortcut,
    AutoStart,
    RemoveShortcuts,
    RemoveUserSettings,
    LaunchOnFinish,
}

impl OptionToggle {
    fn screen(self) -> Screen {
        match self {
            OptionToggle::DesktopShortcut
            | OptionToggle::StartMenuShortcut
            | OptionToggle::AutoStart => Screen::Options,
            OptionToggle::RemoveShortcuts | OptionToggle::RemoveUserSettings => {
                Screen::UninstallOptions
            }
            OptionToggle::LaunchOnFinish => Screen::Complete,
        }
    }
}

/// Mode a session runs in given the startup probe and the user's request.
pub fn resolve_mode(installed: bool, requested: Mode) -> Mode {
    if !installed {
        return Mode::Install;
    }
    match requested {
        Mode::Reinstall => Mode::Reinstall,
        Mode::Install | Mode::Uninstall => Mode::Uninstall,
    }
}

pub fn screen_for(step: usize, mode: Mode) -> Screen {
    match (step, mode) {
        (0, _) => Screen::Welcome,
        (1, Mode::Uninstall) => Screen::UninstallOptions,
        (1, _) => Screen::License,
        (2, Mode::Uninstall) => Screen::UninstallSummary,
        (2, _) => Screen::Options,
        (3, _) => Screen::Confirm,
        _ => Screen::Complete,
    }
}

pub fn button_config(step: usize, mode: Mode, total_steps: usize, gate_open: bool) -> ButtonConfig {
    let (primary_label, primary_action) = if step + 1 == total_steps {
        ("Finish", PrimaryAction::Finish)
    } else if step + 2 == total_steps {
        (mode.label(), PrimaryAction::Execute(mode))
    } else {
        ("Next", PrimaryAction::Next)
    };
    ButtonConfig {
        back_enabled: step > 0,
        primary_label,
        primary_action,
        primary_enabled: gate_open,
    }
}

pub struct Wizard {
    step: usize,
    state: InstallationState,
    detection: DetectedInstallation,
    accept_license: bool,
    mode_frozen: bool,
    directory_frozen: bool,
}

impl Wizard {
    pub fn new(mut state: InstallationState, detection: DetectedInstallation) -> Self {
        state.mode = resolve_mode(detection.present, state.mode);
        if detection.present {
            state.target_directory = detection.directory.clone();
        }
        Self {
            step: WELCOME_STEP,
            state,
            detection,
            accept_license: false,
            mode_frozen: false,
            directory_frozen: false,
        }
    }

    pub fn current_step(&self) -> usize {
        self.step
    }

    pub fn mode(&self) -> Mode {
        self.state.mode
    }

    pub fn state(&self) -> &InstallationState {
        &self.state
    }

    pub fn detection(&self) -> &DetectedInstallation {
        &self.detection
    }

    pub fn accept_license(&self) -> bool {
        self.accept_license
    }

    pub fn screen(&self) -> Screen {
        screen_for(self.step, self.state.mode)
    }

    pub fn buttons(&self) -> ButtonConfig {
        button_config(self.step, self.state.mode, TOTAL_STEPS, self.gate_open())
    }

    /// True once the confirm step is reached; the executor reads the state from here on.
    pub fn is_read_only(&self) -> bool {
        self.step >= CONFIRM_STEP
    }

    pub fn advance(&mut self) -> bool {
        if self.step + 1 >= TOTAL_STEPS || !self.gate_open() {
            return false;
        }
        if self.step == WELCOME_STEP {
            self.mode_frozen = true;
        }
        if self.step == OPTIONS_STEP {
            self.directory_frozen = true;
        }
        self.step += 1;
        true
    }

    pub fn retreat(&mut self) -> bool {
        if self.step == WELCOME_STEP {
            return false;
        }
        self.step -= 1;
        true
    }

    /// Question the caller should ask before ending the session.
    pub fn cancel_prompt(&self) -> String {
        format!(
            "Are you sure you want to cancel the {}?",
            self.state.mode.noun()
        )
    }

    /// Switch between uninstall and reinstall while still on the welcome step.
    /// Returns whether the session now runs in the requested mode.
    pub fn request_mode(&mut self, requested: Mode) -> bool {
        if self.step != WELCOME_STEP || self.mode_frozen {
            return false;
        }
        self.state.mode = resolve_mode(self.detection.present, requested);
        self.state.mode == requested
    }

    /// Replace the startup probe. Only honored before the mode is frozen.
    pub fn refresh_detection(&mut self, detection: DetectedInstallation) -> bool {
        if self.step != WELCOME_STEP || self.mode_frozen {
            return false;
        }
        let requested = self.state.mode;
        if detection.present {
            self.state.target_directory = detection.directory.clone();
        }
        self.detection = detection;
        self.state.mode = resolve_mode(self.detection.present, requested);
        true
    }

    pub fn set_accept_license(&mut self, accepted: bool) -> bool {
        if self.screen() != Screen::License {
            return false;
        }
        self.accept_license = accepted;
        true
    }

    /// Only a fresh install may choose its directory; the other modes act on
    /// the detected installation.
    pub fn set_target_directory(&mut self, directory: PathBuf) -> bool {
        if self.directory_frozen
            || self.state.mode != Mode::Install
            || self.screen() != Screen::Options
        {
            return false;
        }
        self.state.target_directory = directory;
        true
    }

    pub fn can_edit_directory(&self) -> bool {
        !self.directory_frozen && self.state.mode == Mode::Install && self.screen() == Screen::Options
    }

    pub fn toggle(&mut self, option: OptionToggle) -> bool {
        if self.screen() != option.screen() {
            return false;
        }
        if option == OptionToggle::LaunchOnFinish && !self.state.mode.installs() {
            return false;
        }
        let flag = match option {
            OptionToggle::DesktopShortcut => &mut self.state.create_desktop_shortcut,
            OptionToggle::StartMenuShortcut => &mut self.state.create_start_menu_shortcut,
            OptionToggle::AutoStart => &mut self.state.auto_start_on_login,
            OptionToggle::RemoveShortcuts => &mut self.state.remove_shortcuts,
            OptionToggle::RemoveUserSettings => &mut self.state.remove_user_settings,
            OptionToggle::LaunchOnFinish => &mut self.state.launch_on_finish,
        };
        *flag = !*flag;
        true
    }

    /// Move according to an executor result; failures keep the confirm step.
    pub fn apply_outcome(&mut self, outcome: &Outcome) {
        if self.step != CONFIRM_STEP {
            return;
        }
        match outcome {
            Outcome::Success => {
                self.advance();
            }
            Outcome::ReturnToPrevious => {
                self.retreat();
            }
            Outcome::Failed(_) | Outcome::Cancelled => {}
        }
    }

    fn gate_open(&self) -> bool {
        match self.screen() {
            Screen::License => self.accept_license,
            _ => true,
        }
    }
}
