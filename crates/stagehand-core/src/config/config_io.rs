//! Configuration loading and path resolution.
//!
//! Focuses on I/O and filesystem-related helpers for config management.

use std::env;
use std::fs;
use std::path::{Component, Path, PathBuf};

use thiserror::Error;

use crate::DEFAULT_LICENSE;

use super::Config;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    ReadFailed(String),
    #[error("failed to parse config: {0}")]
    ParseFailed(String),
    #[error("invalid config: {0}")]
    Invalid(String),
    #[error("missing $HOME, unable to resolve config directory")]
    MissingHome,
}

impl Config {
    /// Load configuration from a specific path.
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents =
            fs::read_to_string(path).map_err(|err| ConfigError::ReadFailed(err.to_string()))?;
        Self::from_toml(&contents)
    }

    /// Parse and validate configuration text.
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let config: Config =
            toml::from_str(contents).map_err(|err| ConfigError::ParseFailed(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from the default XDG config location, if present.
    pub fn load_default() -> Result<Self, ConfigError> {
        let path = Self::default_config_path()?;
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        Self::load_from_path(&path)
    }

    /// Return the default config directory based on XDG or $HOME.
    pub fn default_config_dir() -> Result<PathBuf, ConfigError> {
        Ok(xdg_config_home()?.join("stagehand"))
    }

    /// Return the default config file path.
    pub fn default_config_path() -> Result<PathBuf, ConfigError> {
        Ok(Self::default_config_dir()?.join("config.toml"))
    }

    /// Resolve the application's settings directory, if one is configured.
    pub fn resolve_settings_dir(&self) -> Result<Option<PathBuf>, ConfigError> {
        let Some(value) = self.app.settings_dir.as_deref() else {
            return Ok(None);
        };
        if let Some(problem) = settings_dir_problem(value) {
            return Err(ConfigError::Invalid(problem));
        }
        let base = xdg_config_home()?;
        let resolved = resolve_path(&base, value);
        // The directory is removed recursively; it must sit strictly below home.
        if let Ok(home) = env::var("HOME") {
            if !home.is_empty() && Path::new(&home).starts_with(&resolved) {
                return Err(ConfigError::Invalid(format!(
                    "app.settings_dir '{value}' must not contain the home directory"
                )));
            }
        }
        Ok(Some(resolved))
    }

    /// Read the license text, falling back to the embedded default.
    pub fn license_text(&self, resource_dir: &Path) -> String {
        let Some(file) = self.app.license_file.as_deref() else {
            return DEFAULT_LICENSE.to_string();
        };
        let path = resolve_path(resource_dir, file);
        match fs::read_to_string(&path) {
            Ok(text) if !text.trim().is_empty() => text,
            Ok(_) => DEFAULT_LICENSE.to_string(),
            Err(err) => {
                tracing::warn!(path = %path.display(), "license file unreadable: {err}");
                DEFAULT_LICENSE.to_string()
            }
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let name = self.app.name.as_str();
        if name.trim().is_empty() {
            return Err(ConfigError::Invalid("app.name must not be empty".to_string()));
        }
        // The name becomes a directory under the data and menu roots.
        if !is_single_name(name) {
            return Err(ConfigError::Invalid(format!(
                "app.name '{name}' must not contain path separators or dot segments"
            )));
        }
        if let Some(value) = self.app.settings_dir.as_deref() {
            if let Some(problem) = settings_dir_problem(value) {
                return Err(ConfigError::Invalid(problem));
            }
        }
        for file in self.app.required_files() {
            if file.trim().is_empty() {
                return Err(ConfigError::Invalid(
                    "app file names must not be empty".to_string(),
                ));
            }
            // Files are joined onto the install directory; nested paths would escape it.
            if !is_single_name(file) {
                return Err(ConfigError::Invalid(format!(
                    "app file '{file}' must be a plain file name"
                )));
            }
        }
        if self.process.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "process.poll_interval_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

fn xdg_config_home() -> Result<PathBuf, ConfigError> {
    if let Ok(xdg) = env::var("XDG_CONFIG_HOME") {
        if !xdg.is_empty() {
            return Ok(PathBuf::from(xdg));
        }
    }
    let home = env::var("HOME").map_err(|_| ConfigError::MissingHome)?;
    Ok(PathBuf::from(home).join(".config"))
}

fn is_single_name(value: &str) -> bool {
    let mut components = Path::new(value).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

/// Settings are deleted with `remove_dir_all`, so only plain descendants are
/// accepted: at least one segment below the config root, or two below `/`.
fn settings_dir_problem(value: &str) -> Option<String> {
    let path = Path::new(value);
    let mut normal = 0;
    for component in path.components() {
        match component {
            Component::Normal(_) => normal += 1,
            Component::RootDir => {}
            _ => {
                return Some(format!(
                    "app.settings_dir '{value}' must not contain dot segments"
                ))
            }
        }
    }
    let required = if path.is_absolute() { 2 } else { 1 };
    if normal < required {
        return Some(format!(
            "app.settings_dir '{value}' must name a directory of its own"
        ));
    }
    None
}

fn resolve_path(base: &Path, value: &str) -> PathBuf {
    let path = PathBuf::from(value);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config = Config::from_toml("").expect("defaults parse");
        assert_eq!(config.app.name, "VirtuKey");
        assert_eq!(
            config.app.required_files(),
            vec!["virtukey", "libvirtualdesktop.so", "icon.png"]
        );
        assert!(config.options.desktop_shortcut);
        assert!(!config.options.auto_start);
        assert_eq!(config.process.terminate_timeout_ms, 5000);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = Config::from_toml(
            r#"
[app]
name = "Tool"
executable = "App.bin"
companion_library = "lib.so"

[options]
auto_start = true
"#,
        )
        .expect("config parses");
        assert_eq!(config.app.executable, "App.bin");
        assert_eq!(config.app.process_name(), "App.bin");
        assert_eq!(config.app.icon.as_deref(), Some("icon.png"));
        assert!(config.options.auto_start);
        assert!(config.options.start_menu_shortcut);
    }

    #[test]
    fn nested_file_names_are_rejected() {
        let err = Config::from_toml(
            r#"
[app]
executable = "../evil"
"#,
        )
        .expect_err("nested path rejected");
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn dot_and_rooted_names_are_rejected() {
        for name in ["..", ".", "/", "a/b", "../Tool"] {
            let err = Config::from_toml(&format!("[app]\nname = \"{name}\"\n"))
                .expect_err("path-like name rejected");
            assert!(matches!(err, ConfigError::Invalid(_)), "{name}");
        }
        for file in ["..", "."] {
            let err = Config::from_toml(&format!("[app]\ncompanion_library = \"{file}\"\n"))
                .expect_err("dot file name rejected");
            assert!(matches!(err, ConfigError::Invalid(_)), "{file}");
        }
        let config = Config::from_toml("[app]\nname = \"My Tool\"\n").expect("plain name");
        assert_eq!(config.app.name, "My Tool");
    }

    #[test]
    fn settings_dir_must_name_a_subdirectory() {
        for value in ["", ".", "..", "/", "/home", "tool/../..", "./"] {
            let err = Config::from_toml(&format!("[app]\nsettings_dir = \"{value}\"\n"))
                .expect_err("broad settings dir rejected");
            assert!(matches!(err, ConfigError::Invalid(_)), "{value:?}");
        }
        let config =
            Config::from_toml("[app]\nsettings_dir = \"tool\"\n").expect("relative settings");
        if let Ok(Some(dir)) = config.resolve_settings_dir() {
            assert!(dir.ends_with("tool"));
        }
    }

    #[test]
    fn settings_dir_equal_to_home_fails_to_resolve() {
        let Ok(home) = env::var("HOME") else {
            return;
        };
        if settings_dir_problem(&home).is_some() {
            // A shallow home such as `/root` is already rejected structurally.
            return;
        }
        let mut config = Config::default();
        config.app.settings_dir = Some(home);
        let err = config.resolve_settings_dir().expect_err("home rejected");
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn malformed_toml_reports_parse_error() {
        let err = Config::from_toml("[app\nname=").expect_err("parse error");
        assert!(matches!(err, ConfigError::ParseFailed(_)));
    }

    #[test]
    fn license_text_reads_file_or_falls_back() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut config = Config::default();
        assert_eq!(config.license_text(dir.path()), DEFAULT_LICENSE);

        fs::write(dir.path().join("LICENSE.txt"), "custom terms").expect("write license");
        config.app.license_file = Some("LICENSE.txt".to_string());
        assert_eq!(config.license_text(dir.path()), "custom terms");

        config.app.license_file = Some("missing.txt".to_string());
        assert_eq!(config.license_text(dir.path()), DEFAULT_LICENSE);
    }

    #[test]
    fn slug_collapses_punctuation() {
        let mut config = Config::default();
        config.app.name = "My  Cool App!".to_string();
        assert_eq!(config.app.slug(), "my-cool-app");
        config.app.name = "***".to_string();
        assert_eq!(config.app.slug(), "app");
    }
}
