//! Configuration types and defaults for the Stagehand installer.
//!
//! Keeps schema definitions in one place for easier auditing.

use serde::{Deserialize, Serialize};

/// Top-level configuration loaded from config.toml.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,
    pub app: AppConfig,
    pub paths: PathsConfig,
    pub options: OptionsConfig,
    pub process: ProcessConfig,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub log_level: Option<String>,
}

/// Describes the application being installed.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    /// Display name, also used for the install and menu group directories.
    pub name: String,
    /// Primary executable shipped in the resource directory.
    pub executable: String,
    /// Companion library shipped next to the executable.
    pub companion_library: String,
    /// Optional icon copied with the application.
    pub icon: Option<String>,
    /// One-line description written into shortcuts.
    pub description: String,
    /// Image name used to find a running instance. Defaults to `executable`.
    pub process_name: Option<String>,
    /// Per-user settings directory removed with "remove user settings".
    /// Relative paths resolve against the XDG config directory.
    pub settings_dir: Option<String>,
    /// License shown on the license step. Relative to the resource directory.
    pub license_file: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: "VirtuKey".to_string(),
            executable: "virtukey".to_string(),
            companion_library: "libvirtualdesktop.so".to_string(),
            icon: Some("icon.png".to_string()),
            description: "VirtuKey - Virtual Desktop Manager".to_string(),
            process_name: None,
            settings_dir: None,
            license_file: None,
        }
    }
}

impl AppConfig {
    /// Files that must exist in the resource directory, in copy order.
    pub fn required_files(&self) -> Vec<&str> {
        let mut files = vec![self.executable.as_str(), self.companion_library.as_str()];
        if let Some(icon) = self.icon.as_deref() {
            files.push(icon);
        }
        files
    }

    pub fn process_name(&self) -> &str {
        self.process_name.as_deref().unwrap_or(&self.executable)
    }

    /// Lowercase, dash-separated name used for entry file names.
    pub fn slug(&self) -> String {
        let mut slug = String::with_capacity(self.name.len());
        for ch in self.name.chars() {
            if ch.is_ascii_alphanumeric() {
                slug.push(ch.to_ascii_lowercase());
            } else if !slug.ends_with('-') && !slug.is_empty() {
                slug.push('-');
            }
        }
        let trimmed = slug.trim_end_matches('-');
        if trimmed.is_empty() {
            "app".to_string()
        } else {
            trimmed.to_string()
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Default install location. Falls back to `$XDG_DATA_HOME/<name>`.
    pub install_dir: Option<String>,
    /// Where the application files are read from.
    pub resource_dir: Option<String>,
}

/// Initial values for the wizard checkboxes.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OptionsConfig {
    pub desktop_shortcut: bool,
    pub start_menu_shortcut: bool,
    pub auto_start: bool,
    pub remove_shortcuts: bool,
    pub remove_user_settings: bool,
    pub launch_on_finish: bool,
}

impl Default for OptionsConfig {
    fn default() -> Self {
        Self {
            desktop_shortcut: true,
            start_menu_shortcut: true,
            auto_start: false,
            remove_shortcuts: true,
            remove_user_settings: false,
            launch_on_finish: true,
        }
    }
}

/// Timings for stopping a running instance before uninstall.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProcessConfig {
    pub terminate_timeout_ms: u64,
    pub poll_interval_ms: u64,
    pub kill_settle_ms: u64,
}

impl Default for ProcessConfig {
    fn default() -> Self {
        Self {
            terminate_timeout_ms: 5000,
            poll_interval_ms: 100,
            kill_settle_ms: 500,
        }
    }
}
