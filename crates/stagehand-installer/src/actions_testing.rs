//! Test doubles for executor tests: a recording platform and a temp-dir fixture.

use std::cell::{Cell, RefCell};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc;

use anyhow::{anyhow, Result};
use stagehand_core::{ActionReport, Config, InstallationState, Mode, ProcessDecision};
use tempfile::TempDir;

use crate::events::ProgressEvent;
use crate::paths::InstallPaths;
use crate::platform::{Platform, Shortcut};

use super::{execute, ActionContext};

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Call {
    CreateDesktop(String),
    RemoveDesktop,
    CreateMenu(Vec<String>),
    RemoveMenu,
    RegisterAutostart,
    UnregisterAutostart,
    FindProcess,
    Terminate(u32),
    Kill(u32),
    Launch,
}

#[derive(Default)]
pub struct FakePlatform {
    pub fail_shortcuts: bool,
    pub ignores_terminate: bool,
    pub survives_kill: bool,
    pub running_pid: Cell<Option<u32>>,
    pub calls: RefCell<Vec<Call>>,
    pub recorded: RefCell<Vec<Shortcut>>,
}

impl FakePlatform {
    pub fn running(pid: u32) -> Self {
        Self {
            running_pid: Cell::new(Some(pid)),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub fn shortcuts(&self) -> Vec<Shortcut> {
        self.recorded.borrow().clone()
    }

    fn record(&self, call: Call) {
        self.calls.borrow_mut().push(call);
    }

    fn shortcut_result(&self) -> Result<()> {
        if self.fail_shortcuts {
            Err(anyhow!("shortcut store unavailable"))
        } else {
            Ok(())
        }
    }
}

impl Platform for FakePlatform {
    fn create_desktop_shortcut(&self, file_name: &str, shortcut: &Shortcut) -> Result<PathBuf> {
        self.record(Call::CreateDesktop(file_name.to_string()));
        self.shortcut_result()?;
        self.recorded.borrow_mut().push(shortcut.clone());
        Ok(PathBuf::from("/desktop").join(file_name))
    }

    fn remove_desktop_shortcut(&self, _file_name: &str) -> Result<bool> {
        self.record(Call::RemoveDesktop);
        self.shortcut_result().map(|_| true)
    }

    fn create_menu_entries(&self, entries: &[(String, Shortcut)]) -> Result<PathBuf> {
        self.record(Call::CreateMenu(
            entries.iter().map(|(name, _)| name.clone()).collect(),
        ));
        self.shortcut_result()?;
        self.recorded
            .borrow_mut()
            .extend(entries.iter().map(|(_, shortcut)| shortcut.clone()));
        Ok(PathBuf::from("/menu"))
    }

    fn remove_menu_group(&self) -> Result<bool> {
        self.record(Call::RemoveMenu);
        self.shortcut_result().map(|_| true)
    }

    fn register_autostart(&self, file_name: &str, shortcut: &Shortcut) -> Result<PathBuf> {
        self.record(Call::RegisterAutostart);
        self.recorded.borrow_mut().push(shortcut.clone());
        Ok(PathBuf::from("/autostart").join(file_name))
    }

    fn unregister_autostart(&self, _file_name: &str) -> Result<bool> {
        self.record(Call::UnregisterAutostart);
        Ok(true)
    }

    fn find_process(&self, _image_name: &str) -> Result<Option<u32>> {
        self.record(Call::FindProcess);
        Ok(self.running_pid.get())
    }

    fn request_terminate(&self, pid: u32) -> Result<()> {
        self.record(Call::Terminate(pid));
        if !self.ignores_terminate {
            self.running_pid.set(None);
        }
        Ok(())
    }

    fn force_kill(&self, pid: u32) -> Result<()> {
        self.record(Call::Kill(pid));
        if !self.survives_kill {
            self.running_pid.set(None);
        }
        Ok(())
    }

    fn process_alive(&self, pid: u32) -> bool {
        self.running_pid.get() == Some(pid)
    }

    fn launch(&self, _executable: &Path, _working_dir: &Path) -> Result<()> {
        self.record(Call::Launch);
        Ok(())
    }
}

/// Temp directory holding a resource dir and a target under `Apps/Tool`.
pub struct Fixture {
    dir: TempDir,
    pub config: Config,
    pub paths: InstallPaths,
}

impl Fixture {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let root = dir.path();
        let resource_dir = root.join("resource");
        fs::create_dir_all(&resource_dir).expect("create resource dir");

        let mut config = Config::default();
        config.app.name = "Tool".to_string();
        config.app.executable = "App.bin".to_string();
        config.app.companion_library = "lib.so".to_string();
        config.app.icon = None;
        config.process.terminate_timeout_ms = 20;
        config.process.poll_interval_ms = 1;
        config.process.kill_settle_ms = 1;

        let paths = InstallPaths {
            resource_dir,
            default_install_dir: root.join("Apps").join("Tool"),
            desktop_dir: root.join("Desktop"),
            menu_dir: root.join("applications").join("Tool"),
            autostart_dir: root.join("autostart"),
            log_path: root.join("installer.log"),
            installer_exe: root.join("bin").join("stagehand-installer"),
        };

        Self { dir, config, paths }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn state(&self, mode: Mode) -> InstallationState {
        InstallationState {
            target_directory: self.paths.default_install_dir.clone(),
            create_desktop_shortcut: false,
            create_start_menu_shortcut: false,
            auto_start_on_login: false,
            remove_shortcuts: false,
            remove_user_settings: false,
            launch_on_finish: false,
            mode,
        }
    }

    pub fn add_sources(&self, names: &[&str]) {
        for name in names {
            fs::write(
                self.paths.resource_dir.join(name),
                format!("source:{name}"),
            )
            .expect("write source");
        }
    }

    pub fn populate_target(&self, target: &Path, names: &[&str]) {
        fs::create_dir_all(target).expect("create target");
        for name in names {
            fs::write(target.join(name), format!("installed:{name}")).expect("write installed");
        }
    }

    pub fn run(
        &self,
        state: &InstallationState,
        platform: &dyn Platform,
        decision: ProcessDecision,
    ) -> (ActionReport, Vec<ProgressEvent>) {
        let (log_tx, log_rx) = mpsc::channel();
        let mut decide = move |_pid: u32| decision;
        let mut ctx = ActionContext {
            config: &self.config,
            paths: &self.paths,
            platform,
            state,
            log_tx,
            decide: &mut decide,
            warnings: Vec::new(),
        };
        let report = execute(&mut ctx);
        drop(ctx);
        (report, log_rx.try_iter().collect())
    }
}
