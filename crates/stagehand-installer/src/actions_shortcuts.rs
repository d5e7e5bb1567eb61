//! Shortcut, autostart and settings integration.
//!
//! Every failure here is recoverable: callers turn errors into warnings.

use std::fs;

use anyhow::{Context, Result};

use crate::paths::format_with_home;
use crate::platform::Shortcut;

use super::{log_line, ActionContext};

fn app_shortcut(ctx: &ActionContext) -> Shortcut {
    let app = &ctx.config.app;
    let target = &ctx.state.target_directory;
    Shortcut {
        name: app.name.clone(),
        comment: app.description.clone(),
        exec: target.join(&app.executable),
        args: Vec::new(),
        working_dir: Some(target.clone()),
        icon: app.icon.as_ref().map(|icon| target.join(icon)),
        terminal: false,
    }
}

fn uninstall_shortcut(ctx: &ActionContext) -> Shortcut {
    let installer = &ctx.paths.installer_exe;
    Shortcut {
        name: format!("Uninstall {}", ctx.app_name()),
        comment: format!("Uninstall {}", ctx.app_name()),
        exec: installer.clone(),
        args: Vec::new(),
        working_dir: installer.parent().map(|dir| dir.to_path_buf()),
        icon: None,
        // The installer is a terminal application.
        terminal: true,
    }
}

fn entry_name(ctx: &ActionContext) -> String {
    format!("{}.desktop", ctx.config.app.slug())
}

pub fn create_desktop_shortcut(ctx: &mut ActionContext) -> Result<()> {
    let path = ctx
        .platform
        .create_desktop_shortcut(&entry_name(ctx), &app_shortcut(ctx))?;
    log_line(ctx, format!("Created desktop shortcut {}", format_with_home(&path)));
    Ok(())
}

pub fn create_start_menu_shortcuts(ctx: &mut ActionContext) -> Result<()> {
    let entries = vec![
        (entry_name(ctx), app_shortcut(ctx)),
        (
            format!("uninstall-{}", entry_name(ctx)),
            uninstall_shortcut(ctx),
        ),
    ];
    let group = ctx.platform.create_menu_entries(&entries)?;
    log_line(ctx, format!("Created menu shortcuts in {}", format_with_home(&group)));
    Ok(())
}

pub fn register_autostart(ctx: &mut ActionContext) -> Result<()> {
    let path = ctx
        .platform
        .register_autostart(&entry_name(ctx), &app_shortcut(ctx))?;
    log_line(ctx, format!("Registered autostart entry {}", format_with_home(&path)));
    Ok(())
}

pub fn remove_shortcuts(ctx: &mut ActionContext) -> Result<()> {
    match ctx.platform.remove_desktop_shortcut(&entry_name(ctx)) {
        Ok(true) => log_line(ctx, "Removed desktop shortcut"),
        Ok(false) => log_line(ctx, "No desktop shortcut found"),
        Err(err) => ctx.warn(format!("could not remove desktop shortcut: {:#}", err)),
    }
    match ctx.platform.remove_menu_group() {
        Ok(true) => log_line(ctx, "Removed menu shortcuts"),
        Ok(false) => log_line(ctx, "No menu shortcuts found"),
        Err(err) => ctx.warn(format!("could not remove menu shortcuts: {:#}", err)),
    }
    Ok(())
}

pub fn remove_settings(ctx: &mut ActionContext) -> Result<()> {
    match ctx.platform.unregister_autostart(&entry_name(ctx)) {
        Ok(true) => log_line(ctx, "Removed autostart entry"),
        Ok(false) => log_line(ctx, "No autostart entry found"),
        Err(err) => ctx.warn(format!("could not remove autostart entry: {:#}", err)),
    }

    let settings_dir = ctx
        .config
        .resolve_settings_dir()
        .context("resolve settings directory")?;
    let Some(dir) = settings_dir else {
        return Ok(());
    };
    if !dir.exists() {
        log_line(ctx, format!("No settings at {}", format_with_home(&dir)));
        return Ok(());
    }
    match fs::remove_dir_all(&dir) {
        Ok(()) => log_line(ctx, format!("Removed settings {}", format_with_home(&dir))),
        Err(err) => ctx.warn(format!(
            "could not remove settings {}: {}",
            format_with_home(&dir),
            err
        )),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use stagehand_core::{Mode, Outcome, ProcessDecision};

    use crate::actions::testing::{Call, FakePlatform, Fixture};

    #[test]
    fn removal_failures_become_warnings_and_continue() {
        let fixture = Fixture::new();
        let mut state = fixture.state(Mode::Uninstall);
        state.remove_shortcuts = true;
        state.remove_user_settings = true;
        let platform = FakePlatform {
            fail_shortcuts: true,
            ..FakePlatform::default()
        };

        let (report, _) = fixture.run(&state, &platform, ProcessDecision::CancelEntirely);

        assert_eq!(report.outcome, Outcome::Success);
        assert_eq!(
            report.warnings,
            vec![
                "could not remove desktop shortcut: shortcut store unavailable".to_string(),
                "could not remove menu shortcuts: shortcut store unavailable".to_string(),
            ]
        );
        assert!(platform.calls().contains(&Call::UnregisterAutostart));
    }

    #[test]
    fn remove_settings_deletes_configured_directory() {
        let mut fixture = Fixture::new();
        let settings = fixture.root().join("settings").join("tool");
        std::fs::create_dir_all(&settings).expect("create settings");
        std::fs::write(settings.join("prefs.toml"), "x=1").expect("write prefs");
        fixture.config.app.settings_dir = Some(settings.display().to_string());
        let mut state = fixture.state(Mode::Uninstall);
        state.remove_user_settings = true;

        let (report, _) = fixture.run(
            &state,
            &FakePlatform::default(),
            ProcessDecision::CancelEntirely,
        );

        assert_eq!(report.outcome, Outcome::Success);
        assert!(!settings.exists());
    }

    #[test]
    fn unsafe_settings_dir_is_a_warning_and_nothing_is_deleted() {
        let mut fixture = Fixture::new();
        let bystander = fixture.root().join("keep.txt");
        std::fs::write(&bystander, "keep").expect("write bystander");
        fixture.config.app.settings_dir = Some("..".to_string());
        let mut state = fixture.state(Mode::Uninstall);
        state.remove_user_settings = true;
        let platform = FakePlatform::default();

        let (report, _) = fixture.run(&state, &platform, ProcessDecision::CancelEntirely);

        assert_eq!(report.outcome, Outcome::Success);
        assert_eq!(report.warnings.len(), 1);
        let warning = &report.warnings[0];
        assert!(warning.starts_with("Remove user settings: resolve settings directory: "));
        assert!(warning.contains("invalid config: app.settings_dir '..'"), "{warning}");
        assert!(platform.calls().contains(&Call::UnregisterAutostart));
        assert!(bystander.exists());
    }

    #[test]
    fn app_shortcut_points_into_target() {
        let mut fixture = Fixture::new();
        fixture.config.app.icon = Some("icon.png".to_string());
        fixture.add_sources(&["App.bin", "lib.so", "icon.png"]);
        let mut state = fixture.state(Mode::Install);
        state.auto_start_on_login = true;
        let platform = FakePlatform::default();

        let (report, _) = fixture.run(&state, &platform, ProcessDecision::CancelEntirely);

        assert_eq!(report.outcome, Outcome::Success);
        let shortcut = &platform.shortcuts()[0];
        assert_eq!(shortcut.exec, state.target_directory.join("App.bin"));
        assert_eq!(
            shortcut.icon.as_deref(),
            Some(state.target_directory.join("icon.png").as_path())
        );
        assert!(!shortcut.terminal);
    }
}
