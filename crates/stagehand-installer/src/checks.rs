//! Environment checks shown on the welcome screen and by `--check`.

use std::env;

use stagehand_core::{program_in_path, Config, Mode};

use crate::paths::{format_with_home, InstallPaths};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CheckState {
    Ok,
    Warn,
    Fail,
}

pub struct CheckItem {
    pub label: &'static str,
    pub state: CheckState,
    pub detail: String,
}

pub struct Checks {
    pub home: CheckItem,
    pub resources: CheckItem,
    pub pgrep: CheckItem,
    pub desktop: CheckItem,
}

impl Checks {
    pub fn run(config: &Config, paths: &InstallPaths) -> Self {
        let home = match env::var("HOME") {
            Ok(value) if !value.is_empty() => CheckItem::ok("Home", &value),
            _ => CheckItem::fail("Home", "HOME is not set"),
        };

        let missing = config
            .app
            .required_files()
            .into_iter()
            .filter(|name| !paths.resource_dir.join(name).is_file())
            .collect::<Vec<_>>();
        let resources = if missing.is_empty() {
            CheckItem::ok("Resources", &format_with_home(&paths.resource_dir))
        } else {
            CheckItem::fail("Resources", &format!("missing {}", missing.join(", ")))
        };

        let pgrep = if program_in_path("pgrep") {
            CheckItem::ok("pgrep", "available")
        } else {
            CheckItem::warn("pgrep", "not found; running instances cannot be detected")
        };

        let desktop = if paths.desktop_dir.is_dir() {
            CheckItem::ok("Desktop", &format_with_home(&paths.desktop_dir))
        } else {
            CheckItem::warn(
                "Desktop",
                &format!(
                    "{} not found; desktop shortcut unavailable",
                    format_with_home(&paths.desktop_dir)
                ),
            )
        };

        Self {
            home,
            resources,
            pgrep,
            desktop,
        }
    }

    pub fn items(&self) -> [&CheckItem; 4] {
        [&self.home, &self.resources, &self.pgrep, &self.desktop]
    }

    pub fn ready_for(&self, mode: Mode) -> Result<(), String> {
        if self.home.state == CheckState::Fail {
            return Err("HOME must be set".to_string());
        }
        if mode.installs() && self.resources.state == CheckState::Fail {
            return Err(format!("installer resources incomplete: {}", self.resources.detail));
        }
        Ok(())
    }
}

impl CheckItem {
    fn ok(label: &'static str, detail: &str) -> Self {
        Self {
            label,
            state: CheckState::Ok,
            detail: detail.to_string(),
        }
    }

    fn warn(label: &'static str, detail: &str) -> Self {
        Self {
            label,
            state: CheckState::Warn,
            detail: detail.to_string(),
        }
    }

    fn fail(label: &'static str, detail: &str) -> Self {
        Self {
            label,
            state: CheckState::Fail,
            detail: detail.to_string(),
        }
    }

    pub fn tag(&self) -> &'static str {
        match self.state {
            CheckState::Ok => "[ok]",
            CheckState::Warn => "[warn]",
            CheckState::Fail => "[fail]",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::testing::Fixture;

    #[test]
    fn missing_resources_block_install_but_not_uninstall() {
        let fixture = Fixture::new();
        fixture.add_sources(&["App.bin"]);
        let checks = Checks::run(&fixture.config, &fixture.paths);

        assert_eq!(checks.resources.state, CheckState::Fail);
        assert_eq!(checks.resources.detail, "missing lib.so");
        if checks.home.state == CheckState::Ok {
            assert!(checks.ready_for(Mode::Install).is_err());
            assert!(checks.ready_for(Mode::Reinstall).is_err());
            assert!(checks.ready_for(Mode::Uninstall).is_ok());
        }
    }

    #[test]
    fn complete_resources_pass() {
        let fixture = Fixture::new();
        fixture.add_sources(&["App.bin", "lib.so"]);
        let checks = Checks::run(&fixture.config, &fixture.paths);

        assert_eq!(checks.resources.state, CheckState::Ok);
        assert_eq!(checks.desktop.state, CheckState::Warn);
        assert_eq!(checks.items()[1].tag(), "[ok]");
    }
}
