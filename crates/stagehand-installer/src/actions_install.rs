//! Install and uninstall the application files.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use anyhow::{anyhow, Result};

use crate::paths::format_with_home;

use super::{log_line, ActionContext};

const WRITE_PROBE: &str = ".stagehand-write-test";

pub fn validate_target(ctx: &mut ActionContext) -> Result<()> {
    let state = ctx.state;
    let target = &state.target_directory;
    if target.as_os_str().is_empty() {
        return Err(anyhow!("installation directory is empty"));
    }
    if !target.is_absolute() {
        return Err(anyhow!(
            "installation directory must be an absolute path: {}",
            target.display()
        ));
    }
    let display = format_with_home(target);

    fs::create_dir_all(target).map_err(|err| anyhow!("cannot write to {}: {}", display, err))?;
    let probe = target.join(WRITE_PROBE);
    fs::write(&probe, b"probe").map_err(|err| anyhow!("cannot write to {}: {}", display, err))?;
    if let Err(err) = fs::remove_file(&probe) {
        tracing::debug!("failed to remove write probe: {err}");
    }

    log_line(ctx, format!("Install directory ready: {}", display));
    Ok(())
}

pub fn copy_files(ctx: &mut ActionContext) -> Result<()> {
    let (config, paths, state) = (ctx.config, ctx.paths, ctx.state);
    let files = config.app.required_files();
    let source_dir = &paths.resource_dir;

    // Check every source up front so a missing file leaves the target untouched.
    if let Some(missing) = files.iter().find(|name| !source_dir.join(name).is_file()) {
        return Err(anyhow!("source file not found: {}", missing));
    }

    let target = &state.target_directory;
    for name in files {
        copy_file(ctx, &source_dir.join(name), &target.join(name), name)?;
    }
    Ok(())
}

fn copy_file(ctx: &mut ActionContext, source: &Path, destination: &Path, name: &str) -> Result<()> {
    fs::copy(source, destination).map_err(|err| {
        if err.kind() == ErrorKind::PermissionDenied {
            anyhow!("permission denied when copying {}", name)
        } else {
            anyhow!("failed to copy {}: {}", name, err)
        }
    })?;
    log_line(
        ctx,
        format!("Installed {} -> {}", name, format_with_home(destination)),
    );
    Ok(())
}

pub fn remove_files(ctx: &mut ActionContext) -> Result<()> {
    let target = ctx.state.target_directory.clone();
    let app_name = ctx.app_name().to_string();
    let files = ctx
        .config
        .app
        .required_files()
        .into_iter()
        .map(str::to_string)
        .collect::<Vec<_>>();

    for name in files {
        let path = target.join(&name);
        if fs::symlink_metadata(&path).is_err() {
            log_line(ctx, format!("{} not found, skipping", format_with_home(&path)));
            continue;
        }
        fs::remove_file(&path).map_err(|err| {
            if err.kind() == ErrorKind::PermissionDenied {
                anyhow!(
                    "permission denied when removing {}; close {} and try again",
                    name,
                    app_name
                )
            } else {
                anyhow!("failed to remove {}: {}", name, err)
            }
        })?;
        log_line(ctx, format!("Removed {}", format_with_home(&path)));
    }
    Ok(())
}

pub fn remove_empty_dir(ctx: &mut ActionContext) -> Result<()> {
    let target = ctx.state.target_directory.clone();
    let display = format_with_home(&target);
    let mut entries = match fs::read_dir(&target) {
        Ok(entries) => entries,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(()),
        Err(err) => return Err(anyhow!("failed to read {}: {}", display, err)),
    };
    if entries.next().is_some() {
        log_line(ctx, format!("Kept {} (not empty)", display));
        return Ok(());
    }
    fs::remove_dir(&target).map_err(|err| anyhow!("failed to remove {}: {}", display, err))?;
    log_line(ctx, format!("Removed directory {}", display));
    Ok(())
}
