//! Ratatui drawing helpers for the wizard screens.

use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap};
use ratatui::Frame;

use stagehand_core::{Mode, Outcome};

use crate::actions::summarize_state;
use crate::app::{App, Field, Modal, ProgressState};
use crate::checks::{CheckItem, CheckState};
use crate::model::{ActionStep, StepStatus};
use crate::paths::format_with_home;
use crate::wizard::{OptionToggle, Screen, TOTAL_STEPS};

pub fn draw(frame: &mut Frame<'_>, app: &App) {
    draw_with_modal(frame, app, app.modal.as_ref());
}

/// Draw with a modal that is not part of the app state, such as the prompt
/// shown while the executor waits for a decision.
pub fn draw_with_modal(frame: &mut Frame<'_>, app: &App, modal: Option<&Modal>) {
    frame.render_widget(Clear, frame.area());
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(10),
            Constraint::Length(3),
        ])
        .split(frame.area());

    draw_header(frame, app, layout[0]);
    match app.wizard.screen() {
        Screen::Welcome => draw_welcome(frame, app, layout[1]),
        Screen::License => draw_license(frame, app, layout[1]),
        Screen::UninstallOptions | Screen::Options => draw_options(frame, app, layout[1]),
        Screen::UninstallSummary => draw_summary(frame, app, layout[1], "Summary"),
        Screen::Confirm => draw_confirm(frame, app, layout[1]),
        Screen::Complete => draw_complete(frame, app, layout[1]),
    }
    draw_footer(frame, app, layout[2]);

    if let Some(modal) = modal {
        draw_modal(frame, app, modal);
    }
}

fn draw_header(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let current = app.wizard.current_step();
    let mut spans = vec![
        Span::styled(
            format!("{} Setup", app.config.app.name),
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("   "),
    ];
    for step in 0..TOTAL_STEPS {
        let (dot, style) = if step == current {
            ("●", Style::default().fg(Color::Cyan))
        } else if step < current {
            ("●", Style::default().fg(Color::Gray))
        } else {
            ("○", Style::default().fg(Color::DarkGray))
        };
        spans.push(Span::styled(dot, style));
        spans.push(Span::raw(" "));
    }
    spans.push(Span::raw(format!("  {}", screen_title(app.wizard.screen()))));

    let title = Paragraph::new(Line::from(spans))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(title, area);
}

fn screen_title(screen: Screen) -> &'static str {
    match screen {
        Screen::Welcome => "Welcome",
        Screen::License => "License agreement",
        Screen::UninstallOptions => "Uninstall options",
        Screen::Options => "Options",
        Screen::UninstallSummary => "Summary",
        Screen::Confirm => "Ready",
        Screen::Complete => "Complete",
    }
}

fn draw_welcome(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(area);

    let name = app.config.app.name.as_str();
    let detection = app.wizard.detection();
    let mut lines = vec![
        Line::from(Span::styled(
            format!("Welcome to the {} setup wizard.", name),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
    ];
    if detection.present {
        lines.push(Line::from(format!(
            "{} is installed in {}.",
            name,
            format_with_home(&detection.directory)
        )));
        lines.push(Line::from(""));
        lines.push(Line::from("Choose what to do:"));
        for mode in [Mode::Uninstall, Mode::Reinstall] {
            let selected = app.wizard.mode() == mode;
            let marker = if selected { "(•)" } else { "( )" };
            let style = if selected {
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            lines.push(Line::from(Span::styled(
                format!("  {} {}", marker, mode.label()),
                style,
            )));
        }
    } else {
        lines.push(Line::from(format!(
            "This will install {} on your computer.",
            name
        )));
        if !app.config.app.description.is_empty() {
            lines.push(Line::from(""));
            lines.push(Line::from(app.config.app.description.clone()));
        }
    }

    let block = Block::default().title(name.to_string()).borders(Borders::ALL);
    frame.render_widget(
        Paragraph::new(Text::from(lines))
            .block(block)
            .wrap(Wrap { trim: true }),
        body[0],
    );

    let checks = app
        .checks
        .items()
        .into_iter()
        .flat_map(render_check)
        .collect::<Vec<_>>();
    let checks_block = Block::default().title("Environment").borders(Borders::ALL);
    frame.render_widget(
        Paragraph::new(Text::from(checks))
            .block(checks_block)
            .wrap(Wrap { trim: true }),
        body[1],
    );
}

fn draw_license(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(5), Constraint::Length(3)])
        .split(area);

    let license = Paragraph::new(app.license.as_str())
        .block(Block::default().title("License").borders(Borders::ALL))
        .wrap(Wrap { trim: false })
        .scroll((app.license_scroll, 0));
    frame.render_widget(license, layout[0]);

    let accept = Paragraph::new(Line::from(vec![
        Span::styled(
            checkbox(app.wizard.accept_license()),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::raw(" I accept the terms of the license agreement"),
    ]))
    .block(Block::default().borders(Borders::ALL));
    frame.render_widget(accept, layout[1]);
}

fn draw_options(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let state = app.wizard.state();
    let focused = app.focused_field();
    let mut lines = Vec::new();

    if app.wizard.screen() == Screen::Options {
        lines.push(Line::from(Span::styled(
            "Installation directory",
            Style::default().add_modifier(Modifier::BOLD),
        )));
        if app.wizard.can_edit_directory() {
            let is_focused = focused == Some(Field::Directory);
            let mut value = app.dir_input.clone();
            if is_focused {
                value.push('_');
            }
            lines.push(Line::from(Span::styled(
                format!("  {}", value),
                field_style(is_focused),
            )));
        } else {
            lines.push(Line::from(Span::styled(
                format!("  {} (locked)", format_with_home(&state.target_directory)),
                Style::default().fg(Color::Gray),
            )));
        }
        lines.push(Line::from(""));
    } else {
        lines.push(Line::from(format!(
            "Uninstalling from {}",
            format_with_home(&state.target_directory)
        )));
        lines.push(Line::from(""));
    }

    for field in app.fields() {
        let Field::Toggle(option) = field else {
            continue;
        };
        lines.push(Line::from(Span::styled(
            format!("{} {}", checkbox(toggle_value(app, option)), toggle_label(option)),
            field_style(focused == Some(field)),
        )));
    }

    let block = Block::default()
        .title(screen_title(app.wizard.screen()))
        .borders(Borders::ALL);
    frame.render_widget(
        Paragraph::new(Text::from(lines))
            .block(block)
            .wrap(Wrap { trim: false }),
        area,
    );
}

fn draw_summary(frame: &mut Frame<'_>, app: &App, area: Rect, title: &str) {
    let mut lines = vec![Line::from(Span::styled(
        format!("Ready to {}", app.wizard.mode().label().to_lowercase()),
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
    ))];
    lines.push(Line::from(""));
    for (label, value) in summarize_state(app.wizard.state()) {
        lines.push(Line::from(vec![
            Span::styled(
                format!("{}: ", label),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::raw(value),
        ]));
    }
    if app.wizard.mode().removes() {
        lines.push(Line::from(vec![
            Span::styled("Files: ", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(app.config.app.required_files().join(", ")),
        ]));
    }
    if let Err(reason) = app.checks.ready_for(app.wizard.mode()) {
        lines.push(Line::from(""));
        lines.push(Line::from(vec![
            Span::styled(
                "Blocked: ",
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            ),
            Span::raw(reason),
        ]));
    }

    let block = Block::default().title(title.to_string()).borders(Borders::ALL);
    frame.render_widget(
        Paragraph::new(Text::from(lines))
            .block(block)
            .wrap(Wrap { trim: true }),
        area,
    );
}

fn draw_confirm(frame: &mut Frame<'_>, app: &App, area: Rect) {
    if app.progress_state == ProgressState::Idle {
        draw_summary(frame, app, area, "Confirm");
        return;
    }
    draw_progress(frame, app, area);
}

fn draw_complete(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(6), Constraint::Min(6)])
        .split(area);

    let mode = app.wizard.mode();
    let warnings = app
        .last_report
        .as_ref()
        .map(|report| report.warnings.len())
        .unwrap_or(0);
    let mut lines = vec![Line::from(Span::styled(
        format!("{} finished successfully.", mode.label()),
        Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
    ))];
    if warnings > 0 {
        lines.push(Line::from(Span::styled(
            format!("{} warning(s); see the log below.", warnings),
            Style::default().fg(Color::Yellow),
        )));
    }
    let focused = app.focused_field();
    for field in app.fields() {
        if let Field::Toggle(option) = field {
            lines.push(Line::from(Span::styled(
                format!("{} {}", checkbox(toggle_value(app, option)), toggle_label(option)),
                field_style(focused == Some(field)),
            )));
        }
    }

    frame.render_widget(
        Paragraph::new(Text::from(lines))
            .block(Block::default().title("Complete").borders(Borders::ALL))
            .wrap(Wrap { trim: true }),
        layout[0],
    );
    draw_steps_and_logs(frame, app, layout[1]);
}

fn draw_progress(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let (status_label, status_color) = match app.progress_state {
        ProgressState::Running => ("In progress", Color::Yellow),
        ProgressState::Completed => ("Completed", Color::Green),
        ProgressState::Failed => ("Failed", Color::Red),
        ProgressState::Stopped => ("Stopped", Color::Yellow),
        ProgressState::Idle => ("Pending", Color::Gray),
    };

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(5), Constraint::Min(6)])
        .split(area);

    let mut status_lines = vec![Line::from(Span::styled(
        format!("{} - {}", app.wizard.mode().label(), status_label),
        Style::default()
            .fg(status_color)
            .add_modifier(Modifier::BOLD),
    ))];
    if let (ProgressState::Failed, Some(err)) = (app.progress_state, &app.last_error) {
        status_lines.push(Line::from(vec![
            Span::styled("Error: ", Style::default().fg(Color::Red)),
            Span::raw(truncate_to_width(err, 72)),
        ]));
        status_lines.push(Line::from("Press Enter to retry or Esc to go back."));
    }
    if let Some(report) = &app.last_report {
        if matches!(report.outcome, Outcome::Cancelled) {
            status_lines.push(Line::from("Nothing was changed."));
        }
    }

    let status = Paragraph::new(Text::from(status_lines))
        .alignment(Alignment::Center)
        .block(Block::default().title("Progress").borders(Borders::ALL))
        .wrap(Wrap { trim: true });
    frame.render_widget(status, layout[0]);
    draw_steps_and_logs(frame, app, layout[1]);
}

fn draw_steps_and_logs(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(area);

    let steps = render_steps(&app.steps, body[0].width);
    let steps_block = Block::default().title("Steps").borders(Borders::ALL);
    frame.render_widget(steps.block(steps_block), body[0]);

    let logs = render_logs(&app.logs, body[1].width);
    // Keep the newest lines visible.
    let visible = body[1].height.saturating_sub(2) as usize;
    let scroll = logs.lines.len().saturating_sub(visible) as u16;
    let logs_block = Block::default().title("Log").borders(Borders::ALL);
    frame.render_widget(
        Paragraph::new(logs).block(logs_block).scroll((scroll, 0)),
        body[1],
    );
}

fn draw_footer(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let buttons = app.wizard.buttons();
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let back_style = if buttons.back_enabled {
        bold
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let primary_style = if buttons.primary_enabled {
        Style::default()
            .fg(Color::Black)
            .bg(Color::Cyan)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::DarkGray)
    };

    let mut spans = vec![
        Span::styled("Esc", back_style),
        Span::styled(" [ Back ]  ", back_style),
        Span::styled("Enter", bold),
        Span::styled(format!(" [ {} ] ", buttons.primary_label), primary_style),
        Span::raw("  "),
    ];
    for (key, hint) in key_hints(app) {
        spans.push(Span::styled(key, bold));
        spans.push(Span::raw(format!(" = {}  ", hint)));
    }
    spans.push(Span::styled("Ctrl+C", bold));
    spans.push(Span::raw(" = cancel"));

    let footer = Paragraph::new(Line::from(spans))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::TOP));
    frame.render_widget(footer, area);
}

fn key_hints(app: &App) -> Vec<(&'static str, &'static str)> {
    match app.wizard.screen() {
        Screen::Welcome if app.wizard.detection().present => {
            vec![("Up/Down", "choose"), ("R", "refresh")]
        }
        Screen::Welcome => vec![("R", "refresh")],
        Screen::License => vec![("Space", "accept"), ("Up/Down", "scroll")],
        Screen::UninstallOptions | Screen::Options | Screen::Complete
            if !app.fields().is_empty() =>
        {
            vec![("Up/Down", "move"), ("Space", "toggle")]
        }
        _ => Vec::new(),
    }
}

fn draw_modal(frame: &mut Frame<'_>, app: &App, modal: &Modal) {
    let name = app.config.app.name.as_str();
    let (title, color, lines) = match modal {
        Modal::CancelConfirm => (
            "Cancel",
            Color::Yellow,
            vec![
                Line::from(app.wizard.cancel_prompt()),
                Line::from(""),
                Line::from("Y = yes   N = no"),
            ],
        ),
        Modal::ProcessPrompt { pid } => (
            "Application running",
            Color::Yellow,
            vec![
                Line::from(format!("{} is running (pid {}).", name, pid)),
                Line::from(format!(
                    "It must be closed before the {} can continue.",
                    app.wizard.mode().noun()
                )),
                Line::from(""),
                Line::from("T = close it and continue"),
                Line::from("C = cancel this run"),
                Line::from("B = go back"),
            ],
        ),
        Modal::Error(message) => (
            "Error",
            Color::Red,
            vec![
                Line::from(message.clone()),
                Line::from(""),
                Line::from("Enter = dismiss"),
            ],
        ),
    };

    let area = centered_rect(60, 9, frame.area());
    frame.render_widget(Clear, area);
    let block = Block::default()
        .title(Span::styled(
            title,
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ))
        .borders(Borders::ALL);
    frame.render_widget(
        Paragraph::new(Text::from(lines))
            .block(block)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true }),
        area,
    );
}

fn centered_rect(width_percent: u16, height: u16, area: Rect) -> Rect {
    let width = area.width * width_percent / 100;
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

fn checkbox(checked: bool) -> &'static str {
    if checked {
        "[x]"
    } else {
        "[ ]"
    }
}

fn field_style(focused: bool) -> Style {
    if focused {
        Style::default()
            .fg(Color::Black)
            .bg(Color::Cyan)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    }
}

fn toggle_label(option: OptionToggle) -> &'static str {
    match option {
        OptionToggle::DesktopShortcut => "Create a desktop shortcut",
        OptionToggle::StartMenuShortcut => "Create application menu shortcuts",
        OptionToggle::AutoStart => "Start automatically on login",
        OptionToggle::RemoveShortcuts => "Remove shortcuts",
        OptionToggle::RemoveUserSettings => "Remove user settings",
        OptionToggle::LaunchOnFinish => "Launch now",
    }
}

fn toggle_value(app: &App, option: OptionToggle) -> bool {
    let state = app.wizard.state();
    match option {
        OptionToggle::DesktopShortcut => state.create_desktop_shortcut,
        OptionToggle::StartMenuShortcut => state.create_start_menu_shortcut,
        OptionToggle::AutoStart => state.auto_start_on_login,
        OptionToggle::RemoveShortcuts => state.remove_shortcuts,
        OptionToggle::RemoveUserSettings => state.remove_user_settings,
        OptionToggle::LaunchOnFinish => state.launch_on_finish,
    }
}

fn render_check(item: &CheckItem) -> Vec<Line<'static>> {
    let style = match item.state {
        CheckState::Ok => Style::default().fg(Color::Green),
        CheckState::Warn => Style::default().fg(Color::Yellow),
        CheckState::Fail => Style::default().fg(Color::Red),
    };
    vec![Line::from(vec![
        Span::styled(item.tag(), style.add_modifier(Modifier::BOLD)),
        Span::raw(" "),
        Span::styled(item.label, Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(" - "),
        Span::raw(item.detail.clone()),
    ])]
}

fn render_steps(steps: &[ActionStep], width: u16) -> List<'static> {
    let inner_width = width.saturating_sub(2) as usize;
    let items = steps
        .iter()
        .map(|step| {
            let (symbol, style) = match step.status {
                StepStatus::Pending => ("[ ]", Style::default().fg(Color::Gray)),
                StepStatus::Running => ("[..]", Style::default().fg(Color::Yellow)),
                StepStatus::Done => ("[ok]", Style::default().fg(Color::Green)),
                StepStatus::Warned => ("[!]", Style::default().fg(Color::Yellow)),
                StepStatus::Failed => ("[!!]", Style::default().fg(Color::Red)),
                StepStatus::Stopped => ("[--]", Style::default().fg(Color::Gray)),
            };
            let available = inner_width.saturating_sub(symbol.len() + 1);
            let label = truncate_to_width(step.name, available);
            ListItem::new(Line::from(vec![
                Span::styled(symbol, style.add_modifier(Modifier::BOLD)),
                Span::raw(" "),
                Span::raw(label),
            ]))
        })
        .collect::<Vec<_>>();

    List::new(items)
}

fn render_logs(logs: &[String], width: u16) -> Text<'static> {
    let inner_width = width.saturating_sub(2) as usize;
    let mut lines = Vec::new();
    for line in logs {
        for wrapped in wrap_line(line, inner_width) {
            let style = if wrapped.starts_with("Warning:") || wrapped.starts_with("Error:") {
                Style::default().fg(Color::Yellow)
            } else {
                Style::default()
            };
            lines.push(Line::from(Span::styled(
                truncate_to_width(&wrapped, inner_width),
                style,
            )));
        }
    }
    Text::from(lines)
}

fn wrap_line(line: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return vec![String::new()];
    }

    let mut lines = Vec::new();
    let mut current = String::new();
    let sanitized = line.replace('\t', " ");

    for word in sanitized.split_whitespace() {
        let word_width = word.chars().count();
        if word_width > width {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            lines.extend(break_long_word(word, width));
            continue;
        }

        let next_len = if current.is_empty() {
            word_width
        } else {
            current.chars().count() + 1 + word_width
        };

        if next_len > width {
            lines.push(std::mem::replace(&mut current, word.to_string()));
        } else {
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(word);
        }
    }

    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

// Splits on chars, not display columns; wide glyphs may overrun.
fn break_long_word(word: &str, width: usize) -> Vec<String> {
    let chars = word.chars().collect::<Vec<_>>();
    chars
        .chunks(width.max(1))
        .map(|chunk| chunk.iter().collect())
        .collect()
}

fn truncate_to_width(text: &str, width: usize) -> String {
    if width == 0 {
        return String::new();
    }
    if text.chars().count() <= width {
        return text.to_string();
    }
    if width <= 3 {
        return text.chars().take(width).collect();
    }
    let mut out = text.chars().take(width - 3).collect::<String>();
    out.push_str("...");
    out
}
