//! Installation data model shared by the wizard and the action executor.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::Config;

/// High-level action a wizard session performs.
#[derive(Debug, Copy, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Install,
    Uninstall,
    Reinstall,
}

impl Mode {
    pub fn label(self) -> &'static str {
        match self {
            Mode::Install => "Install",
            Mode::Uninstall => "Uninstall",
            Mode::Reinstall => "Reinstall",
        }
    }

    /// Noun used in prompts ("cancel the installation?").
    pub fn noun(self) -> &'static str {
        match self {
            Mode::Uninstall => "uninstallation",
            Mode::Install | Mode::Reinstall => "installation",
        }
    }

    /// Whether the session copies files into the target directory.
    pub fn installs(self) -> bool {
        matches!(self, Mode::Install | Mode::Reinstall)
    }

    /// Whether the session removes an existing installation first.
    pub fn removes(self) -> bool {
        matches!(self, Mode::Uninstall | Mode::Reinstall)
    }
}

/// Result of probing the default install location at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectedInstallation {
    pub present: bool,
    pub directory: PathBuf,
}

impl DetectedInstallation {
    pub fn absent(directory: impl Into<PathBuf>) -> Self {
        Self {
            present: false,
            directory: directory.into(),
        }
    }
}

/// Choices the user makes over the course of a wizard session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallationState {
    pub target_directory: PathBuf,
    pub create_desktop_shortcut: bool,
    pub create_start_menu_shortcut: bool,
    pub auto_start_on_login: bool,
    pub remove_shortcuts: bool,
    pub remove_user_settings: bool,
    pub launch_on_finish: bool,
    pub mode: Mode,
}

impl InstallationState {
    /// Seed a state from configured defaults.
    pub fn from_config(config: &Config, target_directory: &Path, mode: Mode) -> Self {
        let options = &config.options;
        Self {
            target_directory: target_directory.to_path_buf(),
            create_desktop_shortcut: options.desktop_shortcut,
            create_start_menu_shortcut: options.start_menu_shortcut,
            auto_start_on_login: options.auto_start,
            remove_shortcuts: options.remove_shortcuts,
            remove_user_settings: options.remove_user_settings,
            launch_on_finish: options.launch_on_finish,
            mode,
        }
    }
}

/// Caller's answer when the application is running before an uninstall.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ProcessDecision {
    TerminateAndContinue,
    CancelEntirely,
    ReturnToPrevious,
}

/// Aggregate result of one executor run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success,
    /// The first fatal failure encountered.
    Failed(String),
    /// The user declined to stop the running application.
    Cancelled,
    /// The user asked to go back a step instead of stopping the application.
    ReturnToPrevious,
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionReport {
    pub outcome: Outcome,
    /// Non-fatal failures, in the order they happened.
    pub warnings: Vec<String>,
}

impl ActionReport {
    pub fn success() -> Self {
        Self {
            outcome: Outcome::Success,
            warnings: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_flags_match_plan_halves() {
        assert!(Mode::Install.installs() && !Mode::Install.removes());
        assert!(!Mode::Uninstall.installs() && Mode::Uninstall.removes());
        assert!(Mode::Reinstall.installs() && Mode::Reinstall.removes());
        assert_eq!(Mode::Reinstall.noun(), "installation");
    }

    #[test]
    fn state_seeds_from_option_defaults() {
        let config = Config::default();
        let state = InstallationState::from_config(&config, Path::new("/opt/tool"), Mode::Install);
        assert_eq!(state.target_directory, PathBuf::from("/opt/tool"));
        assert!(state.create_desktop_shortcut);
        assert!(state.create_start_menu_shortcut);
        assert!(!state.auto_start_on_login);
        assert!(state.remove_shortcuts);
        assert!(!state.remove_user_settings);
        assert!(state.launch_on_finish);
    }
}
