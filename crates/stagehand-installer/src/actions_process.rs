//! Stop a running instance before its files are removed, and log streaming.

use std::thread;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Result};
use stagehand_core::{Outcome, ProcessDecision};

use crate::events::ProgressEvent;

use super::{ActionContext, StepFlow};

pub fn log_line(ctx: &mut ActionContext, line: impl Into<String>) {
    let line = line.into();
    tracing::info!("{line}");
    let _ = ctx.log_tx.send(ProgressEvent::LogLine(line));
}

pub fn stop_running_app(ctx: &mut ActionContext) -> Result<StepFlow> {
    let config = ctx.config;
    let image = config.app.process_name();
    let name = config.app.name.as_str();

    let pid = match ctx.platform.find_process(image) {
        Ok(Some(pid)) => pid,
        Ok(None) => {
            log_line(ctx, format!("{} is not running.", name));
            return Ok(StepFlow::Continue);
        }
        Err(err) => {
            ctx.warn(format!(
                "could not check whether {} is running: {:#}",
                name, err
            ));
            return Ok(StepFlow::Continue);
        }
    };

    log_line(ctx, format!("{} is running (pid {}).", name, pid));
    match (ctx.decide)(pid) {
        ProcessDecision::TerminateAndContinue => {}
        ProcessDecision::CancelEntirely => {
            log_line(ctx, format!("Cancelled; {} was left running.", name));
            return Ok(StepFlow::Stop(Outcome::Cancelled));
        }
        ProcessDecision::ReturnToPrevious => {
            return Ok(StepFlow::Stop(Outcome::ReturnToPrevious));
        }
    }

    terminate(ctx, pid)?;

    // The image may have been restarted or have other instances.
    match ctx.platform.find_process(image) {
        Ok(None) => {
            log_line(ctx, format!("{} closed.", name));
            Ok(StepFlow::Continue)
        }
        Ok(Some(_)) => Err(anyhow!(
            "could not close {}; close it manually and try again",
            name
        )),
        Err(err) => Err(anyhow!("could not verify that {} closed: {:#}", name, err)),
    }
}

fn terminate(ctx: &mut ActionContext, pid: u32) -> Result<()> {
    let config = ctx.config;
    let process = &config.process;
    let timeout = Duration::from_millis(process.terminate_timeout_ms);
    let poll = Duration::from_millis(process.poll_interval_ms);
    let settle = Duration::from_millis(process.kill_settle_ms);

    match ctx.platform.request_terminate(pid) {
        Ok(()) => {
            if wait_for_exit(ctx, pid, timeout, poll) {
                log_line(ctx, format!("Process {} stopped.", pid));
                return Ok(());
            }
            log_line(
                ctx,
                format!(
                    "Process {} still running after {}ms, forcing.",
                    pid, process.terminate_timeout_ms
                ),
            );
        }
        Err(err) => {
            log_line(ctx, format!("Terminate request failed: {:#}", err));
        }
    }

    ctx.platform.force_kill(pid)?;
    thread::sleep(settle);
    if ctx.platform.process_alive(pid) {
        return Err(anyhow!(
            "could not close {}; close it manually and try again",
            ctx.app_name()
        ));
    }
    log_line(ctx, format!("Process {} killed.", pid));
    Ok(())
}

fn wait_for_exit(ctx: &ActionContext, pid: u32, timeout: Duration, poll: Duration) -> bool {
    let start = Instant::now();
    loop {
        if !ctx.platform.process_alive(pid) {
            return true;
        }
        if start.elapsed() >= timeout {
            return false;
        }
        thread::sleep(poll);
    }
}

#[cfg(test)]
mod tests {
    use stagehand_core::{Mode, Outcome, ProcessDecision};

    use crate::actions::testing::{Call, FakePlatform, Fixture};

    #[test]
    fn graceful_terminate_then_uninstall() {
        let fixture = Fixture::new();
        let state = fixture.state(Mode::Uninstall);
        fixture.populate_target(&state.target_directory, &["App.bin", "lib.so"]);
        let platform = FakePlatform::running(31);

        let (report, _) = fixture.run(&state, &platform, ProcessDecision::TerminateAndContinue);

        assert_eq!(report.outcome, Outcome::Success);
        assert_eq!(
            platform.calls(),
            vec![Call::FindProcess, Call::Terminate(31), Call::FindProcess]
        );
        assert!(!state.target_directory.exists());
    }

    #[test]
    fn stubborn_process_is_force_killed() {
        let fixture = Fixture::new();
        let state = fixture.state(Mode::Uninstall);
        fixture.populate_target(&state.target_directory, &["App.bin"]);
        let platform = FakePlatform {
            ignores_terminate: true,
            ..FakePlatform::running(8)
        };

        let (report, _) = fixture.run(&state, &platform, ProcessDecision::TerminateAndContinue);

        assert_eq!(report.outcome, Outcome::Success);
        assert_eq!(
            platform.calls(),
            vec![
                Call::FindProcess,
                Call::Terminate(8),
                Call::Kill(8),
                Call::FindProcess
            ]
        );
    }

    #[test]
    fn unkillable_process_aborts_uninstall() {
        let fixture = Fixture::new();
        let state = fixture.state(Mode::Reinstall);
        fixture.add_sources(&["App.bin", "lib.so"]);
        fixture.populate_target(&state.target_directory, &["App.bin", "lib.so"]);
        let platform = FakePlatform {
            ignores_terminate: true,
            survives_kill: true,
            ..FakePlatform::running(9)
        };

        let (report, _) = fixture.run(&state, &platform, ProcessDecision::TerminateAndContinue);

        assert_eq!(
            report.outcome,
            Outcome::Failed("could not close Tool; close it manually and try again".to_string())
        );
        assert_eq!(
            std::fs::read(state.target_directory.join("App.bin")).expect("file kept"),
            b"installed:App.bin"
        );
    }
}
