//! Existing installation detection.
//!
//! The result is a snapshot: it is taken at startup and again only when the
//! user refreshes the welcome screen.

use std::path::Path;

use stagehand_core::{AppConfig, DetectedInstallation};

pub fn detect_installation(directory: &Path, app: &AppConfig) -> DetectedInstallation {
    let executable = directory.join(&app.executable);
    let library = directory.join(&app.companion_library);
    let present = directory.is_dir() && (executable.exists() || library.exists());
    tracing::debug!(
        directory = %directory.display(),
        present,
        "probed for existing installation"
    );
    DetectedInstallation {
        present,
        directory: directory.to_path_buf(),
    }
}
