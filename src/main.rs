//! MemoryMate TUI - Actor-based client for the MemoryMate service
//!
//! Architecture:
//! - UI Layer (Ratatui) - synchronous terminal rendering
//! - App Layer - central state machine processing events
//! - Network Layer (Tokio) - HTTP requests, pollers and the frame socket

use std::io;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{prelude::*, widgets::*};
use tokio::sync::mpsc;

use memorymate_tui::app::{AppActor, AppState};
use memorymate_tui::auth::Session;
use memorymate_tui::config::{config_dir, Config};
use memorymate_tui::constants::{APP_NAME, LOG_FILE_NAME};
use memorymate_tui::messages::ui_events::{
    key_to_ui_event, AppTab, ApprovalField, InputMode, KeyContext, LoginField,
};
use memorymate_tui::messages::{NetworkCommand, NetworkResponse, RenderState, UiEvent};
use memorymate_tui::network::NetworkActor;
use memorymate_tui::storage::FileStore;
use memorymate_tui::ui::{
    centered_rect, format_time, live_status_color, person_lines, render_input, render_tabs,
    set_input_cursor,
};

/// Terminal cleanup guard
struct TerminalGuard;

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging to file; the terminal belongs to the UI
    let log_dir = config_dir();
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("create {}", log_dir.display()))?;
    let file_appender = tracing_appender::rolling::never(&log_dir, LOG_FILE_NAME);
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_ansi(false)
        .init();

    let config = Config::load()?;
    tracing::info!(
        base_url = %config.base_url,
        live_mode = config.live.mode.as_str(),
        "Starting {}",
        APP_NAME
    );

    let store = Arc::new(FileStore::new(config.session_path()));
    let session = Session::load(store);
    let state = AppState::new(session, config.live.mode);

    // Terminal setup
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let _terminal_guard = TerminalGuard;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Create channels
    let (ui_tx, ui_rx) = mpsc::unbounded_channel::<UiEvent>();
    let (net_cmd_tx, net_cmd_rx) = mpsc::unbounded_channel::<NetworkCommand>();
    let (net_resp_tx, net_resp_rx) = mpsc::unbounded_channel::<NetworkResponse>();
    let (render_tx, mut render_rx) = mpsc::unbounded_channel::<RenderState>();

    // Spawn network actor
    let network_actor = NetworkActor::new(config, net_resp_tx);
    tokio::spawn(network_actor.run(net_cmd_rx));

    // Spawn app actor
    let app_actor = AppActor::new(state, net_cmd_tx, render_tx);
    tokio::spawn(app_actor.run(ui_rx, net_resp_rx));

    // Run UI loop (synchronous with async polling)
    run_ui_loop(&mut terminal, ui_tx, &mut render_rx).await?;

    tracing::info!("Exiting");
    Ok(())
}

/// Run the synchronous UI rendering loop
async fn run_ui_loop(
    terminal: &mut Terminal<impl Backend>,
    ui_tx: mpsc::UnboundedSender<UiEvent>,
    render_rx: &mut mpsc::UnboundedReceiver<RenderState>,
) -> anyhow::Result<()> {
    let mut current_state = RenderState::default();

    loop {
        // Draw with current state
        terminal.draw(|f| draw_ui(f, &current_state))?;

        // Poll for events with timeout
        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                let ctx = KeyContext {
                    active_tab: current_state.active_tab,
                    input_mode: current_state.input_mode,
                    show_help: current_state.show_help,
                    show_login: current_state.show_login,
                    approval_form_open: current_state.approval_form_open,
                };
                if let Some(event) = key_to_ui_event(key, ctx) {
                    let quit = event == UiEvent::Quit;
                    let _ = ui_tx.send(event);
                    if quit {
                        break;
                    }
                }
            }
        }

        // Check for state updates (non-blocking)
        while let Ok(state) = render_rx.try_recv() {
            current_state = state;
        }
    }

    // Give the actors a moment to stop the pollers and close the socket
    tokio::time::sleep(Duration::from_millis(100)).await;
    Ok(())
}

// ============================================================================
// UI Drawing Functions
// ============================================================================

fn draw_ui(f: &mut Frame, state: &RenderState) {
    let area = f.area();

    // Main layout with tab bar
    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Tab bar
            Constraint::Min(0),    // Content
            Constraint::Length(1), // Status bar
        ])
        .split(area);

    if state.show_login {
        draw_login_screen(f, state, main_chunks[1]);
    } else {
        draw_tab_bar(f, state, main_chunks[0]);

        match state.active_tab {
            AppTab::Home => draw_home_tab(f, state, main_chunks[1]),
            AppTab::Dashboard => draw_dashboard_tab(f, state, main_chunks[1]),
            AppTab::Approval => draw_approval_tab(f, state, main_chunks[1]),
            AppTab::Live => draw_live_tab(f, state, main_chunks[1]),
            AppTab::Profile => draw_profile_tab(f, state, main_chunks[1]),
        }
    }

    draw_status_bar(f, state, main_chunks[2]);

    if state.show_help {
        draw_help_popup(f, area);
    }
}

fn draw_tab_bar(f: &mut Frame, state: &RenderState, area: Rect) {
    let titles: Vec<String> = AppTab::ALL
        .iter()
        .enumerate()
        .map(|(i, tab)| {
            let marker = if *tab == AppTab::Approval && state.pending_image.is_some() {
                " [*]"
            } else {
                ""
            };
            format!(" {}:{}{} ", i + 1, tab.title(), marker)
        })
        .collect();

    f.render_widget(render_tabs(&titles, state.active_tab.index()), area);
}

fn draw_login_screen(f: &mut Frame, state: &RenderState, area: Rect) {
    let form_area = centered_rect(60, 70, area);
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2), // Title
            Constraint::Length(3), // Email
            Constraint::Length(3), // Password
            Constraint::Min(1),    // Errors
        ])
        .split(form_area);

    let title = Paragraph::new(Line::from(vec![
        Span::styled(APP_NAME, Style::default().fg(Color::Cyan).bold()),
        Span::raw(" - sign in"),
    ]))
    .alignment(Alignment::Center);
    f.render_widget(title, chunks[0]);

    let editing = state.input_mode == InputMode::Editing;
    let email_focused = state.login_field == LoginField::Email;
    f.render_widget(
        render_input(&state.login_email, " Email ", email_focused, editing),
        chunks[1],
    );
    f.render_widget(
        render_input(&state.login_password, " Password ", !email_focused, editing),
        chunks[2],
    );

    let mut lines: Vec<Line> = state
        .login_errors
        .iter()
        .map(|e| Line::from(Span::styled(e.clone(), Style::default().fg(Color::Red))))
        .collect();
    if state.login_loading {
        lines.push(Line::from(Span::styled(
            "Signing in...",
            Style::default().fg(Color::Yellow),
        )));
    }
    f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), chunks[3]);

    if editing {
        let field_area = if email_focused { chunks[1] } else { chunks[2] };
        set_input_cursor(f, field_area, state.cursor_position);
    }
}

fn draw_home_tab(f: &mut Frame, state: &RenderState, area: Rect) {
    let name = state.user_name.clone().unwrap_or_else(|| "there".to_string());
    let pending = if state.pending_image.is_some() {
        Span::styled("an image is waiting for review", Style::default().fg(Color::Yellow))
    } else {
        Span::styled("nothing waiting", Style::default().fg(Color::DarkGray))
    };

    let lines = vec![
        Line::from(Span::styled(
            format!("Welcome to {}, {}", APP_NAME, name),
            Style::default().fg(Color::Cyan).bold(),
        )),
        Line::from(""),
        Line::from(vec![Span::raw("Approval: "), pending]),
        Line::from(format!("Live feed mode: {}", state.live_mode)),
        Line::from(""),
        Line::from(Span::styled(
            "2 people dashboard | 3 approve new faces | 4 live feed | 5 profile",
            Style::default().fg(Color::DarkGray),
        )),
    ];

    let block = Block::default().borders(Borders::ALL).title(" Home ");
    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn draw_dashboard_tab(f: &mut Frame, state: &RenderState, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
        .split(area);

    let title = if state.people_loading {
        " People [...] ".to_string()
    } else {
        format!(" People ({}) {}ms ", state.people.len(), state.people_time_ms)
    };

    if let Some(error) = &state.people_error {
        let message = Paragraph::new(vec![
            Line::from(Span::styled(error.clone(), Style::default().fg(Color::Red))),
            Line::from(Span::styled(
                "Press 'r' to retry",
                Style::default().fg(Color::DarkGray),
            )),
        ])
        .block(Block::default().borders(Borders::ALL).title(title))
        .wrap(Wrap { trim: false });
        f.render_widget(message, area);
        return;
    }

    let items: Vec<ListItem> = state
        .people
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let style = if i == state.selected_person {
                Style::default().fg(Color::Yellow).bold()
            } else {
                Style::default()
            };
            let relation = if p.has_relation() {
                format!(" ({})", p.relation)
            } else {
                String::new()
            };
            ListItem::new(format!("{}{}", p.name, relation)).style(style)
        })
        .collect();

    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(title),
    );
    f.render_widget(list, chunks[0]);

    let detail = match state.people.get(state.selected_person) {
        Some(person) => person_lines(person),
        None if state.people_loading => vec![Line::from("Loading...")],
        None => vec![Line::from(Span::styled(
            "No people yet. Press 'r' to refresh.",
            Style::default().fg(Color::DarkGray),
        ))],
    };
    let detail = Paragraph::new(detail)
        .block(Block::default().borders(Borders::ALL).title(" Details "))
        .wrap(Wrap { trim: false });
    f.render_widget(detail, chunks[1]);
}

fn draw_approval_tab(f: &mut Frame, state: &RenderState, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(5), // Pending image
            Constraint::Min(0),    // Form
        ])
        .split(area);

    let lines = match &state.pending_image {
        Some(image) => vec![
            Line::from(Span::styled(
                image.locator.clone(),
                Style::default().fg(Color::Green),
            )),
            Line::from(Span::styled(
                format!("fetched at {}", format_time(&image.fetched_at)),
                Style::default().fg(Color::DarkGray),
            )),
            Line::from(if state.approval_busy {
                Span::styled("Sending decision...", Style::default().fg(Color::Yellow))
            } else {
                Span::raw("a:approve | d:deny")
            }),
        ],
        None => vec![Line::from(Span::styled(
            "Waiting for a new face...",
            Style::default().fg(Color::DarkGray),
        ))],
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Magenta))
        .title(" Pending image ");
    f.render_widget(Paragraph::new(lines).block(block), chunks[0]);

    if !state.approval_form_open {
        return;
    }

    let form = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(0),
        ])
        .split(chunks[1]);

    let editing = state.input_mode == InputMode::Editing;
    let fields = [
        (ApprovalField::Name, " Name ", &state.approval_name),
        (ApprovalField::Description, " Description ", &state.approval_description),
        (ApprovalField::Relation, " Relation (optional) ", &state.approval_relation),
    ];
    for (i, (field, title, value)) in fields.iter().enumerate() {
        let focused = state.approval_field == *field;
        f.render_widget(render_input(value, title, focused, editing), form[i]);
        if focused && editing {
            set_input_cursor(f, form[i], state.cursor_position);
        }
    }
}

fn draw_live_tab(f: &mut Frame, state: &RenderState, area: Rect) {
    let color = live_status_color(&state.live_status);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color))
        .title(format!(" Live ({}) ", state.live_mode));

    let mut lines = vec![
        Line::from(vec![
            Span::raw("Status: "),
            Span::styled(state.live_status.label(), Style::default().fg(color).bold()),
        ]),
        Line::from(format!("Frames received: {}", state.frames_received)),
        Line::from(""),
    ];
    match &state.live_frame {
        Some(frame) => {
            lines.push(Line::from(Span::styled(
                frame.locator.clone(),
                Style::default().fg(Color::Green),
            )));
            lines.push(Line::from(Span::styled(
                format!("at {}", format_time(&frame.fetched_at)),
                Style::default().fg(Color::DarkGray),
            )));
        }
        None => lines.push(Line::from(Span::styled(
            "No frame yet",
            Style::default().fg(Color::DarkGray),
        ))),
    }

    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn draw_profile_tab(f: &mut Frame, state: &RenderState, area: Rect) {
    let mut lines = vec![
        Line::from(Span::styled(
            state.user_name.clone().unwrap_or_else(|| "Signed in".to_string()),
            Style::default().fg(Color::Cyan).bold(),
        )),
        Line::from(""),
    ];
    if let Some(json) = &state.user_json {
        lines.extend(json.lines().map(|l| Line::from(l.to_string())));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Profile (l to log out) ");
    let profile = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false });
    f.render_widget(profile, area);
}

fn draw_status_bar(f: &mut Frame, state: &RenderState, area: Rect) {
    if let Some(notice) = &state.notice {
        let bar = Paragraph::new(format!(" {} ", notice)).style(Style::default().fg(Color::Yellow));
        f.render_widget(bar, area);
        return;
    }

    let status = if state.input_mode == InputMode::Editing {
        " ESC:stop editing | arrows:move | Tab:next field "
    } else if state.show_login {
        " e:edit | Tab:next field | s:sign in | ?:help | q:quit "
    } else {
        match state.active_tab {
            AppTab::Dashboard => " r:refresh | ↑/↓:select | 1-5:tabs | ?:help | q:quit ",
            AppTab::Approval if state.approval_form_open => {
                " e:edit | Tab:next field | s:submit | Esc:cancel "
            }
            AppTab::Approval => " a:approve | d:deny | 1-5:tabs | ?:help | q:quit ",
            AppTab::Live => " space:pause/resume | r:reconnect | 1-5:tabs | ?:help | q:quit ",
            AppTab::Profile => " l:log out | 1-5:tabs | ?:help | q:quit ",
            AppTab::Home => " 1-5:tabs | ?:help | q:quit ",
        }
    };

    let bar = Paragraph::new(status).style(Style::default().fg(Color::DarkGray));
    f.render_widget(bar, area);
}

fn draw_help_popup(f: &mut Frame, area: Rect) {
    let popup_area = centered_rect(60, 70, area);

    let help_text = r#"
 MEMORYMATE - Keyboard Shortcuts

 NAVIGATION
   1-5 / Tab          Switch tabs
   e / Enter          Edit focused field
   Esc                Stop editing

 DASHBOARD
   r                  Refresh people
   ↑ / ↓              Select person

 APPROVAL
   a                  Approve (opens the form)
   d                  Deny
   s                  Submit the form

 LIVE
   space / p          Pause or resume
   r                  Reconnect after a drop

 PROFILE
   l                  Log out

 GENERAL
   ?                  Toggle this help
   q / Ctrl+C         Quit

 Press any key to close...
"#;

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Help ")
        .style(Style::default().bg(Color::Black));

    let help = Paragraph::new(help_text)
        .block(block)
        .wrap(Wrap { trim: false });

    f.render_widget(Clear, popup_area);
    f.render_widget(help, popup_area);
}
