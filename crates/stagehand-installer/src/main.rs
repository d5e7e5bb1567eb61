//! Stagehand installer entrypoint with a ratatui-driven wizard.

mod actions;
mod app;
mod checks;
mod detect;
mod events;
mod model;
mod paths;
mod platform;
#[path = "runtime_config.rs"]
mod runtime_config;
mod terminal;
mod ui;
mod wizard;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::mpsc;
use std::thread;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use stagehand_core::ProcessDecision;

use crate::app::{App, Modal, SessionEnd};
use crate::checks::Checks;
use crate::events::UiMessage;
use crate::paths::{format_with_home, InstallPaths, PathOverrides};
use crate::platform::XdgPlatform;
use crate::runtime_config::{init_tracing, load_config};
use crate::terminal::TerminalGuard;
use crate::wizard::{PrimaryAction, Screen};

const LICENSE_PAGE: u16 = 10;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Path to config.toml
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory holding the files to install
    #[arg(long)]
    resources: Option<PathBuf>,

    /// Default installation directory, also probed for an existing install
    #[arg(long)]
    install_dir: Option<PathBuf>,

    /// Print environment checks and detection, then exit
    #[arg(long)]
    check: bool,
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            eprintln!("stagehand-installer: {err:#}");
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<u8> {
    let args = Args::parse();
    let config = load_config(&args)?;
    let overrides = PathOverrides {
        resource_dir: args.resources.clone(),
        install_dir: args.install_dir.clone(),
    };
    let paths = InstallPaths::discover(&config, &overrides).context("resolve installer paths")?;
    if let Err(err) = init_tracing(&config, &paths.log_path) {
        eprintln!("warning: logging disabled: {err:#}");
    }

    if args.check {
        print_check(&config, &paths);
        return Ok(0);
    }

    let platform = XdgPlatform::new(
        paths.desktop_dir.clone(),
        paths.menu_dir.clone(),
        paths.autostart_dir.clone(),
    );
    let mut app = App::new(config, paths, Box::new(platform));

    let mut terminal_guard = TerminalGuard::new().context("initialize terminal")?;
    let end = run_app(&mut terminal_guard, &mut app);
    terminal_guard.restore()?;
    let end = end?;

    tracing::info!(?end, "session ended");
    if let SessionEnd::Finished { launch: true } = end {
        launch_installed(&app);
    }
    Ok(end.exit_code())
}

fn print_check(config: &stagehand_core::Config, paths: &InstallPaths) {
    let checks = Checks::run(config, paths);
    println!("{} installer", config.app.name);
    for item in checks.items() {
        println!("{:<7} {:<10} {}", item.tag(), item.label, item.detail);
    }
    let detection = detect::detect_installation(&paths.default_install_dir, &config.app);
    let status = if detection.present {
        "installed"
    } else {
        "not installed"
    };
    println!(
        "{}: {} ({})",
        config.app.name,
        status,
        format_with_home(&detection.directory)
    );
    println!("log: {}", format_with_home(&paths.log_path));
}

fn launch_installed(app: &App) {
    let Some((exe, working_dir)) = app.launch_target() else {
        return;
    };
    if let Err(err) = app.platform.launch(&exe, &working_dir) {
        tracing::warn!("launch failed: {err:#}");
        eprintln!("Could not start {}: {err:#}", app.config.app.name);
    }
}

fn run_app(terminal_guard: &mut TerminalGuard, app: &mut App) -> Result<SessionEnd> {
    let (ui_tx, ui_rx) = mpsc::channel::<UiMessage>();
    spawn_input_thread(ui_tx);

    terminal_guard
        .terminal_mut()
        .draw(|frame| ui::draw(frame, app))?;

    loop {
        match ui_rx.recv() {
            Ok(UiMessage::Input(input)) => {
                if let Some(end) = handle_event(app, terminal_guard, &ui_rx, input)? {
                    return Ok(end);
                }
            }
            Err(_) => return Ok(app.cancel_end()),
        }

        terminal_guard
            .terminal_mut()
            .draw(|frame| ui::draw(frame, app))?;
    }
}

fn handle_event(
    app: &mut App,
    terminal_guard: &mut TerminalGuard,
    ui_rx: &mpsc::Receiver<UiMessage>,
    event: Event,
) -> Result<Option<SessionEnd>> {
    let Event::Key(key) = event else {
        return Ok(None);
    };
    if key.kind != KeyEventKind::Press {
        return Ok(None);
    }
    if let Some(modal) = app.modal.clone() {
        return Ok(handle_modal_key(app, &modal, key));
    }
    if is_ctrl_c(key) {
        app.modal = Some(Modal::CancelConfirm);
        return Ok(None);
    }

    match key.code {
        KeyCode::Esc => {
            if !app.retreat() {
                app.modal = Some(Modal::CancelConfirm);
            }
        }
        KeyCode::Enter => return handle_primary(app, terminal_guard, ui_rx),
        KeyCode::Up | KeyCode::Down => {
            let down = key.code == KeyCode::Down;
            match app.wizard.screen() {
                Screen::Welcome => app.cycle_mode(),
                Screen::License => scroll_license(app, down, 1),
                _ => app.move_focus(down),
            }
        }
        KeyCode::Tab => app.move_focus(true),
        KeyCode::BackTab => app.move_focus(false),
        KeyCode::PageUp => scroll_license(app, false, LICENSE_PAGE),
        KeyCode::PageDown => scroll_license(app, true, LICENSE_PAGE),
        KeyCode::Backspace => app.pop_dir_char(),
        KeyCode::Char(' ') => match app.wizard.screen() {
            Screen::License => {
                let accepted = !app.wizard.accept_license();
                app.wizard.set_accept_license(accepted);
            }
            _ if app.focused_field() == Some(app::Field::Directory) => app.push_dir_char(' '),
            _ => app.toggle_focused(),
        },
        KeyCode::Char('r') | KeyCode::Char('R') if app.wizard.screen() == Screen::Welcome => {
            app.refresh();
        }
        KeyCode::Char(ch) => app.push_dir_char(ch),
        _ => {}
    }
    Ok(None)
}

fn handle_modal_key(app: &mut App, modal: &Modal, key: KeyEvent) -> Option<SessionEnd> {
    match modal {
        Modal::CancelConfirm => match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') => return Some(app.cancel_end()),
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => app.modal = None,
            _ => {}
        },
        // Only shown during a run, never stored.
        Modal::ProcessPrompt { .. } => app.modal = None,
        Modal::Error(_) => {
            if matches!(key.code, KeyCode::Enter | KeyCode::Esc) {
                app.modal = None;
            }
        }
    }
    None
}

fn handle_primary(
    app: &mut App,
    terminal_guard: &mut TerminalGuard,
    ui_rx: &mpsc::Receiver<UiMessage>,
) -> Result<Option<SessionEnd>> {
    let buttons = app.wizard.buttons();
    if !buttons.primary_enabled {
        return Ok(None);
    }
    match buttons.primary_action {
        PrimaryAction::Next => {
            app.advance();
            Ok(None)
        }
        PrimaryAction::Execute(mode) => {
            if let Err(reason) = app.checks.ready_for(mode) {
                app.modal = Some(Modal::Error(reason));
                return Ok(None);
            }
            start_run(app, terminal_guard, ui_rx)?;
            Ok(None)
        }
        PrimaryAction::Finish => Ok(Some(SessionEnd::Finished {
            launch: app.launch_target().is_some(),
        })),
    }
}

fn start_run(
    app: &mut App,
    terminal_guard: &mut TerminalGuard,
    ui_rx: &mpsc::Receiver<UiMessage>,
) -> Result<()> {
    app.prepare_run();
    terminal_guard
        .terminal_mut()
        .draw(|frame| ui::draw(frame, app))?;

    let (report, events) = {
        let view: &App = app;
        let mut decide = |pid: u32| ask_process_decision(terminal_guard, ui_rx, view, pid);
        view.execute_run(&mut decide)
    };

    // A cancelled prompt leaves the wizard on the confirm step.
    app.complete_run(report, events);
    Ok(())
}

/// Block on input until the user answers the running-instance prompt.
fn ask_process_decision(
    terminal_guard: &mut TerminalGuard,
    ui_rx: &mpsc::Receiver<UiMessage>,
    app: &App,
    pid: u32,
) -> ProcessDecision {
    let modal = Modal::ProcessPrompt { pid };
    loop {
        if let Err(err) = terminal_guard
            .terminal_mut()
            .draw(|frame| ui::draw_with_modal(frame, app, Some(&modal)))
        {
            tracing::error!("failed to draw process prompt: {err}");
            return ProcessDecision::CancelEntirely;
        }
        match ui_rx.recv() {
            Ok(UiMessage::Input(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                if let Some(decision) = process_decision_for(key) {
                    return decision;
                }
            }
            Ok(_) => {}
            Err(_) => return ProcessDecision::CancelEntirely,
        }
    }
}

fn process_decision_for(key: KeyEvent) -> Option<ProcessDecision> {
    if is_ctrl_c(key) {
        return Some(ProcessDecision::CancelEntirely);
    }
    match key.code {
        KeyCode::Char('t') | KeyCode::Char('T') => Some(ProcessDecision::TerminateAndContinue),
        KeyCode::Char('c') | KeyCode::Char('C') => Some(ProcessDecision::CancelEntirely),
        KeyCode::Char('b') | KeyCode::Char('B') | KeyCode::Esc => {
            Some(ProcessDecision::ReturnToPrevious)
        }
        _ => None,
    }
}

fn is_ctrl_c(key: KeyEvent) -> bool {
    key.modifiers.contains(KeyModifiers::CONTROL) && matches!(key.code, KeyCode::Char('c'))
}

fn scroll_license(app: &mut App, down: bool, lines: u16) {
    if app.wizard.screen() != Screen::License {
        return;
    }
    app.license_scroll = if down {
        app.license_scroll.saturating_add(lines)
    } else {
        app.license_scroll.saturating_sub(lines)
    };
}

fn spawn_input_thread(ui_tx: mpsc::Sender<UiMessage>) {
    // Forward blocking terminal events to the UI thread; exit on channel close.
    thread::spawn(move || {
        while let Ok(event) = event::read() {
            if ui_tx.send(UiMessage::Input(event)).is_err() {
                break;
            }
        }
    });
}
