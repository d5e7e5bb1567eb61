//! Small helpers shared by the installer components.

use std::env;
use std::path::Path;

const DEFAULT_LOG_LIMIT: usize = 160;
const DIAGNOSTIC_LOG_LIMIT: usize = 512;

/// Check whether a program exists in $PATH.
pub fn program_in_path(program: &str) -> bool {
    if program.contains(std::path::MAIN_SEPARATOR) {
        return Path::new(program).is_file();
    }
    env::var_os("PATH")
        .map(|paths| env::split_paths(&paths).any(|dir| dir.join(program).is_file()))
        .unwrap_or(false)
}

/// Returns true when `STAGEHAND_DIAGNOSTIC` asks for untruncated log lines.
pub fn diagnostic_mode() -> bool {
    diagnostic_mode_from(env::var("STAGEHAND_DIAGNOSTIC").ok().as_deref())
}

fn diagnostic_mode_from(value: Option<&str>) -> bool {
    matches!(
        value
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase()
            .as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Sanitizes a log string by stripping newlines and capping length.
pub fn sanitize_log_value(value: &str, max_len: usize) -> String {
    if max_len == 0 {
        return String::new();
    }
    let mut cleaned = String::with_capacity(max_len.min(value.len()));
    let mut truncated = false;
    for (count, ch) in value.chars().enumerate() {
        if count >= max_len {
            truncated = true;
            break;
        }
        cleaned.push(if ch == '\n' || ch == '\r' { ' ' } else { ch });
    }
    let trimmed = cleaned.trim();
    if truncated {
        format!("{trimmed}...")
    } else {
        trimmed.to_string()
    }
}

/// Produces a log line for display, honoring diagnostic mode limits.
pub fn log_snippet(value: &str) -> String {
    let limit = if diagnostic_mode() {
        DIAGNOSTIC_LOG_LIMIT
    } else {
        DEFAULT_LOG_LIMIT
    };
    sanitize_log_value(value, limit)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_log_value_strips_newlines_and_caps() {
        assert_eq!(sanitize_log_value("ab\ncd\rEF", 5), "ab cd...");
        assert_eq!(sanitize_log_value("ok", 5), "ok");
        assert_eq!(sanitize_log_value("anything", 0), "");
    }

    #[test]
    fn diagnostic_mode_parses_expected_values() {
        assert!(diagnostic_mode_from(Some("1")));
        assert!(diagnostic_mode_from(Some("YES")));
        assert!(diagnostic_mode_from(Some(" on ")));
        assert!(!diagnostic_mode_from(Some("0")));
        assert!(!diagnostic_mode_from(None));
    }

    #[test]
    fn program_in_path_accepts_explicit_paths() {
        let dir = tempfile::tempdir().expect("tempdir");
        let program = dir.path().join("tool");
        std::fs::write(&program, "").expect("write program");
        assert!(program_in_path(program.to_str().expect("utf8 path")));
        assert!(!program_in_path(
            dir.path().join("absent").to_str().expect("utf8 path")
        ));
    }
}
