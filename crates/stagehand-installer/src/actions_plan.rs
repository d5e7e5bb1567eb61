//! Planning and dispatch for executor steps.
//!
//! Keeps the sequencing and the fatal/non-fatal policy in one place so
//! install, uninstall, and reinstall runs stay predictable.

use anyhow::Result;
use stagehand_core::{ActionReport, InstallationState, Mode, Outcome};

use crate::events::ProgressEvent;
use crate::model::{ActionStep, StepStatus};

use super::{
    copy_files, create_desktop_shortcut, create_start_menu_shortcuts, log_line, register_autostart,
    remove_empty_dir, remove_files, remove_settings, remove_shortcuts, stop_running_app,
    validate_target, ActionContext, StepFlow,
};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StepKind {
    StopRunningApp,
    RemoveFiles,
    RemoveShortcuts,
    RemoveSettings,
    RemoveEmptyDir,
    ValidateTarget,
    CopyFiles,
    DesktopShortcut,
    StartMenuShortcuts,
    AutoStart,
}

impl StepKind {
    /// Fatal steps abort the run; the rest only record warnings.
    pub fn is_fatal(self) -> bool {
        matches!(
            self,
            StepKind::StopRunningApp
                | StepKind::RemoveFiles
                | StepKind::ValidateTarget
                | StepKind::CopyFiles
        )
    }
}

pub fn build_plan(state: &InstallationState) -> Vec<StepKind> {
    let mut steps = Vec::new();
    if state.mode.removes() {
        steps.extend([StepKind::StopRunningApp, StepKind::RemoveFiles]);
        // Reinstall recreates shortcuts itself and never offers these choices.
        if state.mode == Mode::Uninstall {
            if state.remove_shortcuts {
                steps.push(StepKind::RemoveShortcuts);
            }
            if state.remove_user_settings {
                steps.push(StepKind::RemoveSettings);
            }
        }
        steps.push(StepKind::RemoveEmptyDir);
    }
    if state.mode.installs() {
        steps.extend([StepKind::ValidateTarget, StepKind::CopyFiles]);
        if state.create_desktop_shortcut {
            steps.push(StepKind::DesktopShortcut);
        }
        if state.create_start_menu_shortcut {
            steps.push(StepKind::StartMenuShortcuts);
        }
        if state.auto_start_on_login {
            steps.push(StepKind::AutoStart);
        }
    }
    steps
}

pub fn steps_from_plan(plan: &[StepKind]) -> Vec<ActionStep> {
    plan.iter()
        .map(|kind| ActionStep {
            name: step_label(*kind),
            status: StepStatus::Pending,
        })
        .collect()
}

/// Plan and run the session's mode to completion or first fatal failure.
pub fn execute(ctx: &mut ActionContext) -> ActionReport {
    let plan = build_plan(ctx.state);
    run_plan(&plan, ctx)
}

pub fn run_plan(plan: &[StepKind], ctx: &mut ActionContext) -> ActionReport {
    tracing::info!(
        mode = ctx.state.mode.label(),
        target = %ctx.state.target_directory.display(),
        steps = plan.len(),
        "starting run"
    );

    for (index, step) in plan.iter().enumerate() {
        let _ = ctx.log_tx.send(ProgressEvent::StepStarted(index));
        let warnings_before = ctx.warnings.len();

        match run_step(*step, ctx) {
            Ok(StepFlow::Continue) => {
                if ctx.warnings.len() > warnings_before {
                    let latest = ctx.warnings[ctx.warnings.len() - 1].clone();
                    let _ = ctx.log_tx.send(ProgressEvent::StepWarned(index, latest));
                } else {
                    let _ = ctx.log_tx.send(ProgressEvent::StepCompleted(index));
                }
            }
            Ok(StepFlow::Stop(outcome)) => {
                tracing::info!(step = step_label(*step), ?outcome, "run stopped by user");
                let _ = ctx.log_tx.send(ProgressEvent::StepStopped(index));
                return finish(ctx, outcome);
            }
            Err(err) if step.is_fatal() => {
                let reason = err.to_string();
                tracing::error!(step = step_label(*step), "{err:#}");
                let _ = ctx
                    .log_tx
                    .send(ProgressEvent::StepFailed(index, reason.clone()));
                return finish(ctx, Outcome::Failed(reason));
            }
            Err(err) => {
                ctx.warn(format!("{}: {:#}", step_label(*step), err));
                let latest = ctx.warnings[ctx.warnings.len() - 1].clone();
                let _ = ctx.log_tx.send(ProgressEvent::StepWarned(index, latest));
            }
        }
    }

    log_line(ctx, format!("{} finished.", ctx.state.mode.label()));
    finish(ctx, Outcome::Success)
}

fn finish(ctx: &mut ActionContext, outcome: Outcome) -> ActionReport {
    let _ = ctx.log_tx.send(ProgressEvent::Finished);
    ActionReport {
        outcome,
        warnings: std::mem::take(&mut ctx.warnings),
    }
}

pub fn run_step(step: StepKind, ctx: &mut ActionContext) -> Result<StepFlow> {
    match step {
        StepKind::StopRunningApp => stop_running_app(ctx),
        StepKind::RemoveFiles => remove_files(ctx).map(|_| StepFlow::Continue),
        StepKind::RemoveShortcuts => remove_shortcuts(ctx).map(|_| StepFlow::Continue),
        StepKind::RemoveSettings => remove_settings(ctx).map(|_| StepFlow::Continue),
        StepKind::RemoveEmptyDir => remove_empty_dir(ctx).map(|_| StepFlow::Continue),
        StepKind::ValidateTarget => validate_target(ctx).map(|_| StepFlow::Continue),
        StepKind::CopyFiles => copy_files(ctx).map(|_| StepFlow::Continue),
        StepKind::DesktopShortcut => create_desktop_shortcut(ctx).map(|_| StepFlow::Continue),
        StepKind::StartMenuShortcuts => {
            create_start_menu_shortcuts(ctx).map(|_| StepFlow::Continue)
        }
        StepKind::AutoStart => register_autostart(ctx).map(|_| StepFlow::Continue),
    }
}

pub fn step_label(kind: StepKind) -> &'static str {
    match kind {
        StepKind::StopRunningApp => "Close running application",
        StepKind::RemoveFiles => "Remove application files",
        StepKind::RemoveShortcuts => "Remove shortcuts",
        StepKind::RemoveSettings => "Remove user settings",
        StepKind::RemoveEmptyDir => "Remove install directory",
        StepKind::ValidateTarget => "Check install directory",
        StepKind::CopyFiles => "Copy application files",
        StepKind::DesktopShortcut => "Create desktop shortcut",
        StepKind::StartMenuShortcuts => "Create menu shortcuts",
        StepKind::AutoStart => "Register autostart",
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::fs;
    use std::path::{Path, PathBuf};

    use stagehand_core::ProcessDecision;

    use super::*;
    use crate::actions::testing::{Call, FakePlatform, Fixture};

    fn file_set(dir: &Path) -> BTreeSet<String> {
        fs::read_dir(dir)
            .expect("read target")
            .map(|entry| {
                entry
                    .expect("dir entry")
                    .file_name()
                    .to_string_lossy()
                    .to_string()
            })
            .collect()
    }

    #[test]
    fn install_plan_orders_optional_steps() {
        let fixture = Fixture::new();
        let mut state = fixture.state(Mode::Install);
        assert_eq!(
            build_plan(&state),
            vec![StepKind::ValidateTarget, StepKind::CopyFiles]
        );
        state.create_desktop_shortcut = true;
        state.create_start_menu_shortcut = true;
        state.auto_start_on_login = true;
        assert_eq!(
            build_plan(&state),
            vec![
                StepKind::ValidateTarget,
                StepKind::CopyFiles,
                StepKind::DesktopShortcut,
                StepKind::StartMenuShortcuts,
                StepKind::AutoStart,
            ]
        );
    }

    #[test]
    fn uninstall_and_reinstall_plans() {
        let fixture = Fixture::new();
        let mut state = fixture.state(Mode::Uninstall);
        state.remove_shortcuts = true;
        state.remove_user_settings = true;
        assert_eq!(
            build_plan(&state),
            vec![
                StepKind::StopRunningApp,
                StepKind::RemoveFiles,
                StepKind::RemoveShortcuts,
                StepKind::RemoveSettings,
                StepKind::RemoveEmptyDir,
            ]
        );

        state.mode = Mode::Reinstall;
        assert_eq!(
            build_plan(&state),
            vec![
                StepKind::StopRunningApp,
                StepKind::RemoveFiles,
                StepKind::RemoveEmptyDir,
                StepKind::ValidateTarget,
                StepKind::CopyFiles,
            ]
        );
    }

    #[test]
    fn install_with_all_options_off_copies_exactly_required_files() {
        let fixture = Fixture::new();
        fixture.add_sources(&["App.bin", "lib.so"]);
        let state = fixture.state(Mode::Install);
        let platform = FakePlatform::default();

        let (report, _) = fixture.run(&state, &platform, ProcessDecision::CancelEntirely);

        assert_eq!(report.outcome, Outcome::Success);
        assert!(report.warnings.is_empty());
        assert_eq!(
            file_set(&state.target_directory),
            BTreeSet::from(["App.bin".to_string(), "lib.so".to_string()])
        );
        assert!(platform.calls().is_empty());
    }

    #[test]
    fn missing_source_fails_before_any_copy() {
        let fixture = Fixture::new();
        fixture.add_sources(&["App.bin"]);
        let mut state = fixture.state(Mode::Install);
        state.create_desktop_shortcut = true;
        state.create_start_menu_shortcut = true;
        state.auto_start_on_login = true;
        let platform = FakePlatform::default();

        let (report, events) = fixture.run(&state, &platform, ProcessDecision::CancelEntirely);

        assert_eq!(
            report.outcome,
            Outcome::Failed("source file not found: lib.so".to_string())
        );
        assert!(file_set(&state.target_directory).is_empty());
        assert!(platform.calls().is_empty());
        assert!(events.contains(&ProgressEvent::StepFailed(
            1,
            "source file not found: lib.so".to_string()
        )));
    }

    #[test]
    fn empty_target_fails_before_any_copy() {
        let fixture = Fixture::new();
        fixture.add_sources(&["App.bin", "lib.so"]);
        let mut state = fixture.state(Mode::Install);
        state.target_directory = PathBuf::new();
        state.create_desktop_shortcut = true;
        let platform = FakePlatform::default();

        let (report, events) = fixture.run(&state, &platform, ProcessDecision::CancelEntirely);

        assert_eq!(
            report.outcome,
            Outcome::Failed("installation directory is empty".to_string())
        );
        assert!(events.contains(&ProgressEvent::StepFailed(
            0,
            "installation directory is empty".to_string()
        )));
        assert!(!events.contains(&ProgressEvent::StepStarted(1)));
        assert!(platform.calls().is_empty());
        assert!(!fixture.paths.default_install_dir.exists());
    }

    #[test]
    fn relative_target_is_rejected() {
        let fixture = Fixture::new();
        fixture.add_sources(&["App.bin", "lib.so"]);
        let mut state = fixture.state(Mode::Install);
        state.target_directory = PathBuf::from("apps/tool");
        let platform = FakePlatform::default();

        let (report, _) = fixture.run(&state, &platform, ProcessDecision::CancelEntirely);

        assert_eq!(
            report.outcome,
            Outcome::Failed("installation directory must be an absolute path: apps/tool".to_string())
        );
        assert!(platform.calls().is_empty());
    }

    #[test]
    fn unwritable_target_is_fatal_before_copy() {
        let fixture = Fixture::new();
        fixture.add_sources(&["App.bin", "lib.so"]);
        let blocker = fixture.root().join("blocker");
        fs::write(&blocker, b"file").expect("write blocker");
        let mut state = fixture.state(Mode::Install);
        state.target_directory = blocker.join("Tool");
        let platform = FakePlatform::default();

        let (report, _) = fixture.run(&state, &platform, ProcessDecision::CancelEntirely);

        match report.outcome {
            Outcome::Failed(reason) => assert!(reason.starts_with("cannot write to")),
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[test]
    fn shortcut_failures_are_warnings() {
        let fixture = Fixture::new();
        fixture.add_sources(&["App.bin", "lib.so"]);
        let mut state = fixture.state(Mode::Install);
        state.create_desktop_shortcut = true;
        state.create_start_menu_shortcut = true;
        state.auto_start_on_login = true;
        let platform = FakePlatform {
            fail_shortcuts: true,
            ..FakePlatform::default()
        };

        let (report, events) = fixture.run(&state, &platform, ProcessDecision::CancelEntirely);

        assert_eq!(report.outcome, Outcome::Success);
        assert_eq!(report.warnings.len(), 2);
        assert!(report.warnings[0].starts_with("Create desktop shortcut"));
        assert!(report.warnings[1].starts_with("Create menu shortcuts"));
        assert!(platform.calls().contains(&Call::RegisterAutostart));
        assert!(events
            .iter()
            .any(|event| matches!(event, ProgressEvent::StepWarned(2, _))));
        assert!(events.contains(&ProgressEvent::StepCompleted(4)));
    }

    #[test]
    fn install_creates_requested_integration() {
        let fixture = Fixture::new();
        fixture.add_sources(&["App.bin", "lib.so"]);
        let mut state = fixture.state(Mode::Install);
        state.create_desktop_shortcut = true;
        state.create_start_menu_shortcut = true;
        state.auto_start_on_login = true;
        let platform = FakePlatform::default();

        let (report, _) = fixture.run(&state, &platform, ProcessDecision::CancelEntirely);

        assert_eq!(report.outcome, Outcome::Success);
        assert_eq!(
            platform.calls(),
            vec![
                Call::CreateDesktop("tool.desktop".to_string()),
                Call::CreateMenu(vec![
                    "tool.desktop".to_string(),
                    "uninstall-tool.desktop".to_string()
                ]),
                Call::RegisterAutostart,
            ]
        );
        let shortcuts = platform.shortcuts();
        assert_eq!(
            shortcuts[0].exec,
            state.target_directory.join("App.bin")
        );
        assert_eq!(shortcuts[2].exec, fixture.paths.installer_exe);
    }

    #[test]
    fn uninstall_removes_files_and_empty_directory() {
        let fixture = Fixture::new();
        let mut state = fixture.state(Mode::Uninstall);
        fixture.populate_target(&state.target_directory, &["App.bin", "lib.so"]);
        state.remove_shortcuts = true;
        state.remove_user_settings = true;
        let platform = FakePlatform::default();

        let (report, _) = fixture.run(&state, &platform, ProcessDecision::CancelEntirely);

        assert_eq!(report.outcome, Outcome::Success);
        assert!(!state.target_directory.exists());
        assert_eq!(
            platform.calls(),
            vec![
                Call::FindProcess,
                Call::RemoveDesktop,
                Call::RemoveMenu,
                Call::UnregisterAutostart,
            ]
        );
    }

    #[test]
    fn uninstall_keeps_directory_with_foreign_files() {
        let fixture = Fixture::new();
        let state = fixture.state(Mode::Uninstall);
        fixture.populate_target(&state.target_directory, &["App.bin", "notes.txt"]);
        let platform = FakePlatform::default();

        let (report, _) = fixture.run(&state, &platform, ProcessDecision::CancelEntirely);

        assert_eq!(report.outcome, Outcome::Success);
        assert_eq!(
            file_set(&state.target_directory),
            BTreeSet::from(["notes.txt".to_string()])
        );
    }

    #[test]
    fn cancel_while_running_leaves_files_untouched() {
        let fixture = Fixture::new();
        let state = fixture.state(Mode::Uninstall);
        fixture.populate_target(&state.target_directory, &["App.bin", "lib.so"]);
        let platform = FakePlatform::running(4242);

        let (report, events) = fixture.run(&state, &platform, ProcessDecision::CancelEntirely);

        assert_eq!(report.outcome, Outcome::Cancelled);
        assert_eq!(
            file_set(&state.target_directory),
            BTreeSet::from(["App.bin".to_string(), "lib.so".to_string()])
        );
        assert_eq!(platform.calls(), vec![Call::FindProcess]);
        assert!(events.contains(&ProgressEvent::StepStopped(0)));
    }

    #[test]
    fn return_to_previous_is_reported() {
        let fixture = Fixture::new();
        let state = fixture.state(Mode::Reinstall);
        fixture.populate_target(&state.target_directory, &["App.bin"]);
        let platform = FakePlatform::running(7);

        let (report, _) = fixture.run(&state, &platform, ProcessDecision::ReturnToPrevious);

        assert_eq!(report.outcome, Outcome::ReturnToPrevious);
        assert!(state.target_directory.join("App.bin").exists());
    }

    #[test]
    fn reinstall_matches_fresh_install_file_set() {
        let fresh = Fixture::new();
        fresh.add_sources(&["App.bin", "lib.so"]);
        let fresh_state = fresh.state(Mode::Install);
        let (report, _) = fresh.run(
            &fresh_state,
            &FakePlatform::default(),
            ProcessDecision::CancelEntirely,
        );
        assert_eq!(report.outcome, Outcome::Success);

        let existing = Fixture::new();
        existing.add_sources(&["App.bin", "lib.so"]);
        let state = existing.state(Mode::Reinstall);
        existing.populate_target(&state.target_directory, &["App.bin", "lib.so"]);
        fs::write(state.target_directory.join("App.bin"), b"stale").expect("write stale");
        let (report, _) = existing.run(
            &state,
            &FakePlatform::default(),
            ProcessDecision::CancelEntirely,
        );

        assert_eq!(report.outcome, Outcome::Success);
        assert_eq!(
            file_set(&state.target_directory),
            file_set(&fresh_state.target_directory)
        );
        assert_eq!(
            fs::read(state.target_directory.join("App.bin")).expect("read installed"),
            b"source:App.bin"
        );
    }

    #[test]
    fn reinstall_stops_before_install_half_on_uninstall_failure() {
        let fixture = Fixture::new();
        fixture.add_sources(&["App.bin", "lib.so"]);
        let state = fixture.state(Mode::Reinstall);
        fixture.populate_target(&state.target_directory, &["lib.so"]);
        // A directory where a file is expected cannot be removed with remove_file.
        fs::create_dir(state.target_directory.join("App.bin")).expect("create blocker");
        let platform = FakePlatform::default();

        let (report, events) = fixture.run(&state, &platform, ProcessDecision::CancelEntirely);

        match report.outcome {
            Outcome::Failed(reason) => assert!(reason.contains("App.bin"), "{reason}"),
            other => panic!("unexpected outcome {other:?}"),
        }
        assert!(!events
            .iter()
            .any(|event| matches!(event, ProgressEvent::StepStarted(index) if *index >= 3)));
    }
}
