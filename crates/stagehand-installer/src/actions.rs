//! Installer action orchestration and shared exports.

#[path = "actions_format.rs"]
mod actions_format;
#[path = "actions_install.rs"]
mod actions_install;
#[path = "actions_plan.rs"]
mod actions_plan;
#[path = "actions_process.rs"]
mod actions_process;
#[path = "actions_shortcuts.rs"]
mod actions_shortcuts;
#[path = "actions_state.rs"]
mod actions_state;
#[cfg(test)]
#[path = "actions_testing.rs"]
pub(crate) mod testing;

pub use actions_format::{summarize_outcome, summarize_state};
pub use actions_plan::{build_plan, execute, steps_from_plan};
pub use actions_state::ActionContext;

pub(super) use actions_install::{copy_files, remove_empty_dir, remove_files, validate_target};
pub(super) use actions_process::{log_line, stop_running_app};
pub(super) use actions_shortcuts::{
    create_desktop_shortcut, create_start_menu_shortcuts, register_autostart, remove_settings,
    remove_shortcuts,
};
pub(super) use actions_state::StepFlow;
