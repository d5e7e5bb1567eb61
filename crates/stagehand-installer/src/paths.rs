//! Filesystem layout helpers for installer sources and XDG destinations.

use std::env;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use stagehand_core::Config;

#[derive(Clone, Debug)]
pub struct InstallPaths {
    /// Directory the application files are copied from.
    pub resource_dir: PathBuf,
    /// Default target, also the location probed for an existing install.
    pub default_install_dir: PathBuf,
    pub desktop_dir: PathBuf,
    /// Start-menu group directory for this application.
    pub menu_dir: PathBuf,
    pub autostart_dir: PathBuf,
    pub log_path: PathBuf,
    /// The running installer, used by the uninstall shortcut.
    pub installer_exe: PathBuf,
}

/// Command-line overrides that take precedence over config values.
#[derive(Default)]
pub struct PathOverrides {
    pub resource_dir: Option<PathBuf>,
    pub install_dir: Option<PathBuf>,
}

impl InstallPaths {
    pub fn discover(config: &Config, overrides: &PathOverrides) -> Result<Self> {
        let home = home_dir()?;
        let data_home = xdg_dir("XDG_DATA_HOME", &home, &[".local", "share"]);
        let config_home = xdg_dir("XDG_CONFIG_HOME", &home, &[".config"]);
        let state_home = xdg_dir("XDG_STATE_HOME", &home, &[".local", "state"]);

        let installer_exe = env::current_exe().unwrap_or_else(|_| PathBuf::from("stagehand-installer"));
        let resource_dir = match (&overrides.resource_dir, &config.paths.resource_dir) {
            (Some(dir), _) => dir.clone(),
            (None, Some(dir)) => expand_home(dir, &home),
            (None, None) => default_resource_dir(&installer_exe)?,
        };

        let default_install_dir = match (&overrides.install_dir, &config.paths.install_dir) {
            (Some(dir), _) if dir.is_relative() => env::current_dir()?.join(dir),
            (Some(dir), _) => dir.clone(),
            (None, Some(dir)) => resolve_under_home(dir, &home),
            (None, None) => data_home.join(&config.app.name),
        };

        Ok(Self {
            resource_dir,
            default_install_dir,
            desktop_dir: desktop_dir(&home),
            menu_dir: data_home.join("applications").join(&config.app.name),
            autostart_dir: config_home.join("autostart"),
            log_path: state_home.join("stagehand").join("installer.log"),
            installer_exe,
        })
    }
}

pub fn home_dir() -> Result<PathBuf> {
    let home = env::var("HOME").map_err(|_| anyhow!("HOME is not set"))?;
    Ok(PathBuf::from(home))
}

pub fn format_with_home(path: &Path) -> String {
    if let Ok(home) = home_dir() {
        if let Ok(stripped) = path.strip_prefix(&home) {
            let mut rendered = PathBuf::from("~");
            rendered.push(stripped);
            return rendered.display().to_string();
        }
    }
    path.display().to_string()
}

/// Expands a leading `~/` so config values can be written portably.
pub fn expand_home(value: &str, home: &Path) -> PathBuf {
    match value.strip_prefix("~/") {
        Some(rest) => home.join(rest),
        None if value == "~" => home.to_path_buf(),
        None => PathBuf::from(value),
    }
}

/// Like `expand_home`, but relative values also land under home.
pub fn resolve_under_home(value: &str, home: &Path) -> PathBuf {
    let path = expand_home(value, home);
    if path.is_relative() {
        home.join(path)
    } else {
        path
    }
}

fn xdg_dir(var: &str, home: &Path, fallback: &[&str]) -> PathBuf {
    match env::var_os(var) {
        Some(value) if !value.is_empty() => PathBuf::from(value),
        _ => fallback.iter().fold(home.to_path_buf(), |dir, part| dir.join(part)),
    }
}

fn desktop_dir(home: &Path) -> PathBuf {
    match env::var("XDG_DESKTOP_DIR") {
        Ok(value) if !value.is_empty() => expand_home(&value.replace("$HOME", "~"), home),
        _ => home.join("Desktop"),
    }
}

fn default_resource_dir(installer_exe: &Path) -> Result<PathBuf> {
    if let Some(dir) = installer_exe.parent() {
        let bundled = dir.join("resource");
        if bundled.is_dir() {
            return Ok(bundled);
        }
    }
    Ok(env::current_dir()?.join("resource"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expand_home_handles_tilde_forms() {
        let home = Path::new("/home/u");
        assert_eq!(expand_home("~/Apps/Tool", home), PathBuf::from("/home/u/Apps/Tool"));
        assert_eq!(expand_home("~", home), PathBuf::from("/home/u"));
        assert_eq!(expand_home("/opt/tool", home), PathBuf::from("/opt/tool"));
    }

    #[test]
    fn relative_directories_resolve_under_home() {
        let home = Path::new("/home/u");
        assert_eq!(
            resolve_under_home("apps/tool", home),
            PathBuf::from("/home/u/apps/tool")
        );
        assert_eq!(
            resolve_under_home("~/Apps", home),
            PathBuf::from("/home/u/Apps")
        );
        assert_eq!(resolve_under_home("/opt/tool", home), PathBuf::from("/opt/tool"));
    }

    #[test]
    fn xdg_dir_falls_back_under_home() {
        let home = Path::new("/home/u");
        let dir = xdg_dir("STAGEHAND_TEST_UNSET_XDG_VAR", home, &[".local", "share"]);
        assert_eq!(dir, PathBuf::from("/home/u/.local/share"));
    }
}
