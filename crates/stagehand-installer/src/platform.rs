//! Desktop integration and process control behind a narrow trait.
//!
//! The executor only talks to `Platform`; `XdgPlatform` implements it with
//! freedesktop entries, `pgrep` and POSIX signals.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use anyhow::{anyhow, Context, Result};

/// A launcher entry pointing at an executable.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Shortcut {
    pub name: String,
    pub comment: String,
    pub exec: PathBuf,
    pub args: Vec<String>,
    pub working_dir: Option<PathBuf>,
    pub icon: Option<PathBuf>,
    pub terminal: bool,
}

pub trait Platform {
    /// Write a launcher on the user's desktop; returns the created path.
    fn create_desktop_shortcut(&self, file_name: &str, shortcut: &Shortcut) -> Result<PathBuf>;
    /// Returns false when there was nothing to remove.
    fn remove_desktop_shortcut(&self, file_name: &str) -> Result<bool>;
    /// Create the program group and write each `(file_name, shortcut)` into it.
    fn create_menu_entries(&self, entries: &[(String, Shortcut)]) -> Result<PathBuf>;
    fn remove_menu_group(&self) -> Result<bool>;
    fn register_autostart(&self, file_name: &str, shortcut: &Shortcut) -> Result<PathBuf>;
    fn unregister_autostart(&self, file_name: &str) -> Result<bool>;
    /// Look up a running process by image name.
    fn find_process(&self, image_name: &str) -> Result<Option<u32>>;
    fn request_terminate(&self, pid: u32) -> Result<()>;
    fn force_kill(&self, pid: u32) -> Result<()>;
    fn process_alive(&self, pid: u32) -> bool;
    /// Start the installed application detached from the installer.
    fn launch(&self, executable: &Path, working_dir: &Path) -> Result<()>;
}

pub struct XdgPlatform {
    pub desktop_dir: PathBuf,
    pub menu_dir: PathBuf,
    pub autostart_dir: PathBuf,
}

impl XdgPlatform {
    pub fn new(desktop_dir: PathBuf, menu_dir: PathBuf, autostart_dir: PathBuf) -> Self {
        Self {
            desktop_dir,
            menu_dir,
            autostart_dir,
        }
    }
}

impl Platform for XdgPlatform {
    fn create_desktop_shortcut(&self, file_name: &str, shortcut: &Shortcut) -> Result<PathBuf> {
        if !self.desktop_dir.is_dir() {
            return Err(anyhow!(
                "desktop directory {} does not exist",
                self.desktop_dir.display()
            ));
        }
        let path = self.desktop_dir.join(file_name);
        write_entry(&path, &render_desktop_entry(shortcut, &[]))?;
        // Desktop launchers are only trusted by file managers when executable.
        set_executable(&path)?;
        Ok(path)
    }

    fn remove_desktop_shortcut(&self, file_name: &str) -> Result<bool> {
        remove_if_present(&self.desktop_dir.join(file_name))
    }

    fn create_menu_entries(&self, entries: &[(String, Shortcut)]) -> Result<PathBuf> {
        fs::create_dir_all(&self.menu_dir).with_context(|| {
            format!("failed to create menu group {}", self.menu_dir.display())
        })?;
        for (file_name, shortcut) in entries {
            write_entry(
                &self.menu_dir.join(file_name),
                &render_desktop_entry(shortcut, &[]),
            )?;
        }
        Ok(self.menu_dir.clone())
    }

    fn remove_menu_group(&self) -> Result<bool> {
        if !self.menu_dir.exists() {
            return Ok(false);
        }
        fs::remove_dir_all(&self.menu_dir).with_context(|| {
            format!("failed to remove menu group {}", self.menu_dir.display())
        })?;
        Ok(true)
    }

    fn register_autostart(&self, file_name: &str, shortcut: &Shortcut) -> Result<PathBuf> {
        fs::create_dir_all(&self.autostart_dir).with_context(|| {
            format!(
                "failed to create autostart directory {}",
                self.autostart_dir.display()
            )
        })?;
        let path = self.autostart_dir.join(file_name);
        write_entry(
            &path,
            &render_desktop_entry(shortcut, &[("X-GNOME-Autostart-enabled", "true")]),
        )?;
        Ok(path)
    }

    fn unregister_autostart(&self, file_name: &str) -> Result<bool> {
        remove_if_present(&self.autostart_dir.join(file_name))
    }

    fn find_process(&self, image_name: &str) -> Result<Option<u32>> {
        // pgrep -x matches against the kernel comm name, which is capped at 15 bytes.
        let comm: String = image_name.chars().take(15).collect();
        let output = Command::new("pgrep")
            .arg("-x")
            .arg(&comm)
            .stdin(Stdio::null())
            .output()
            .context("failed to run pgrep")?;
        match output.status.code() {
            Some(0) => {}
            Some(1) => return Ok(None),
            _ => {
                return Err(anyhow!(
                    "pgrep failed: {}",
                    String::from_utf8_lossy(&output.stderr).trim()
                ))
            }
        }
        let own_pid = std::process::id();
        Ok(String::from_utf8_lossy(&output.stdout)
            .lines()
            .filter_map(|line| line.trim().parse::<u32>().ok())
            .find(|pid| *pid != own_pid))
    }

    fn request_terminate(&self, pid: u32) -> Result<()> {
        send_signal(pid, Signal::Terminate)
    }

    fn force_kill(&self, pid: u32) -> Result<()> {
        send_signal(pid, Signal::Kill)
    }

    fn process_alive(&self, pid: u32) -> bool {
        pid_alive(pid)
    }

    fn launch(&self, executable: &Path, working_dir: &Path) -> Result<()> {
        Command::new(executable)
            .current_dir(working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .with_context(|| format!("failed to launch {}", executable.display()))?;
        Ok(())
    }
}

/// Render a freedesktop `.desktop` entry.
pub fn render_desktop_entry(shortcut: &Shortcut, extra: &[(&str, &str)]) -> String {
    let mut exec = quote_exec_arg(&shortcut.exec.display().to_string());
    for arg in &shortcut.args {
        exec.push(' ');
        exec.push_str(&quote_exec_arg(arg));
    }

    let mut lines = vec![
        "[Desktop Entry]".to_string(),
        "Type=Application".to_string(),
        "Version=1.0".to_string(),
        format!("Name={}", escape_value(&shortcut.name)),
        format!("Comment={}", escape_value(&shortcut.comment)),
        format!("Exec={}", exec),
    ];
    if let Some(dir) = shortcut.working_dir.as_ref() {
        lines.push(format!("Path={}", escape_value(&dir.display().to_string())));
    }
    if let Some(icon) = shortcut.icon.as_ref() {
        lines.push(format!("Icon={}", escape_value(&icon.display().to_string())));
    }
    lines.push(format!("Terminal={}", shortcut.terminal));
    for (key, value) in extra {
        lines.push(format!("{}={}", key, value));
    }
    lines.push(String::new());
    lines.join("\n")
}

fn quote_exec_arg(arg: &str) -> String {
    const RESERVED: &[char] = &[
        ' ', '\t', '\n', '"', '\'', '\\', '>', '<', '~', '|', '&', ';', '$', '*', '?', '#', '(',
        ')', '`',
    ];
    let arg = arg.replace('%', "%%");
    if !arg.is_empty() && !arg.contains(RESERVED) {
        return arg;
    }
    let mut quoted = String::with_capacity(arg.len() + 2);
    quoted.push('"');
    for ch in arg.chars() {
        if matches!(ch, '"' | '`' | '$' | '\\') {
            quoted.push('\\');
        }
        quoted.push(ch);
    }
    quoted.push('"');
    // Values are unescaped once more by the key-file parser.
    quoted.replace('\\', "\\\\")
}

fn escape_value(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('\n', "\\n")
        .replace('\t', "\\t")
}

fn write_entry(path: &Path, contents: &str) -> Result<()> {
    fs::write(path, contents).with_context(|| format!("failed to write {}", path.display()))
}

fn remove_if_present(path: &Path) -> Result<bool> {
    if !path.exists() {
        return Ok(false);
    }
    fs::remove_file(path).with_context(|| format!("failed to remove {}", path.display()))?;
    Ok(true)
}

#[cfg(unix)]
fn set_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o755))
        .with_context(|| format!("failed to mark {} executable", path.display()))
}

#[cfg(not(unix))]
fn set_executable(_path: &Path) -> Result<()> {
    Ok(())
}

enum Signal {
    Terminate,
    Kill,
}

#[cfg(unix)]
fn send_signal(pid: u32, signal: Signal) -> Result<()> {
    let pid = i32::try_from(pid).map_err(|_| anyhow!("pid {pid} exceeds i32 range"))?;
    let signal = match signal {
        Signal::Terminate => libc::SIGTERM,
        Signal::Kill => libc::SIGKILL,
    };
    // SAFETY: kill has no memory-safety preconditions.
    let rc = unsafe { libc::kill(pid, signal) };
    if rc == 0 {
        return Ok(());
    }
    let err = std::io::Error::last_os_error();
    if err.raw_os_error() == Some(libc::ESRCH) {
        // Already gone.
        return Ok(());
    }
    Err(anyhow!("failed to signal pid {pid}: {err}"))
}

#[cfg(not(unix))]
fn send_signal(pid: u32, _signal: Signal) -> Result<()> {
    Err(anyhow!("signals are not supported on this platform (pid {pid})"))
}

#[cfg(unix)]
fn pid_alive(pid: u32) -> bool {
    let Ok(raw) = i32::try_from(pid) else {
        return false;
    };
    // SAFETY: signal 0 only performs the existence and permission check.
    let rc = unsafe { libc::kill(raw, 0) };
    let exists = rc == 0
        || std::io::Error::last_os_error().raw_os_error() == Some(libc::EPERM);
    exists && !is_zombie(pid)
}

#[cfg(not(unix))]
fn pid_alive(_pid: u32) -> bool {
    false
}

fn is_zombie(pid: u32) -> bool {
    let Ok(stat) = fs::read_to_string(format!("/proc/{pid}/stat")) else {
        return false;
    };
    // The comm field is parenthesised and may itself contain spaces.
    stat.rsplit_once(')')
        .and_then(|(_, rest)| rest.split_whitespace().next())
        .map(|state| state == "Z")
        .unwrap_or(false)
}
