//! Formatting helpers for summaries shown before and after a run.

use stagehand_core::{InstallationState, Mode, Outcome};

use crate::paths::format_with_home;

pub fn yes_no(value: bool) -> &'static str {
    if value {
        "Yes"
    } else {
        "No"
    }
}

/// Label/value pairs describing what a run will do.
pub fn summarize_state(state: &InstallationState) -> Vec<(&'static str, String)> {
    let mut rows = vec![(
        "Installation directory",
        format_with_home(&state.target_directory),
    )];
    match state.mode {
        Mode::Uninstall => {
            rows.push(("Remove shortcuts", yes_no(state.remove_shortcuts).to_string()));
            rows.push((
                "Remove settings",
                yes_no(state.remove_user_settings).to_string(),
            ));
        }
        Mode::Install | Mode::Reinstall => {
            rows.push((
                "Desktop shortcut",
                yes_no(state.create_desktop_shortcut).to_string(),
            ));
            rows.push((
                "Menu shortcuts",
                yes_no(state.create_start_menu_shortcut).to_string(),
            ));
            rows.push((
                "Start on login",
                yes_no(state.auto_start_on_login).to_string(),
            ));
        }
    }
    rows
}

pub fn summarize_outcome(mode: Mode, outcome: &Outcome) -> String {
    match outcome {
        Outcome::Success => format!("{} completed", mode.label()),
        Outcome::Failed(reason) => format!("{} failed: {}", mode.label(), reason),
        Outcome::Cancelled => format!("{} cancelled", mode.label()),
        Outcome::ReturnToPrevious => format!("{} postponed", mode.label()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn state(mode: Mode) -> InstallationState {
        InstallationState {
            target_directory: PathBuf::from("/opt/Tool"),
            create_desktop_shortcut: true,
            create_start_menu_shortcut: false,
            auto_start_on_login: false,
            remove_shortcuts: true,
            remove_user_settings: false,
            launch_on_finish: true,
            mode,
        }
    }

    #[test]
    fn install_summary_lists_install_options() {
        let rows = summarize_state(&state(Mode::Install));
        assert_eq!(rows[0], ("Installation directory", "/opt/Tool".to_string()));
        assert_eq!(rows[1], ("Desktop shortcut", "Yes".to_string()));
        assert_eq!(rows[2], ("Menu shortcuts", "No".to_string()));
        assert_eq!(rows.len(), 4);
    }

    #[test]
    fn uninstall_summary_lists_removal_options() {
        let rows = summarize_state(&state(Mode::Uninstall));
        assert_eq!(rows[1], ("Remove shortcuts", "Yes".to_string()));
        assert_eq!(rows[2], ("Remove settings", "No".to_string()));
        assert_eq!(rows.len(), 3);
    }

    #[test]
    fn outcome_summaries() {
        assert_eq!(
            summarize_outcome(Mode::Install, &Outcome::Failed("disk full".to_string())),
            "Install failed: disk full"
        );
        assert_eq!(
            summarize_outcome(Mode::Uninstall, &Outcome::Success),
            "Uninstall completed"
        );
    }
}
