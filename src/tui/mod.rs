mod help;
mod state;

use crate::cli::{build_config, Cli};
use crate::model::{AppEvent, Severity};
use crate::orchestrator::{self, PageSource, UiCommand};
use crate::submit::http::HttpTransport;
use crate::submit::predict::PredictionPanel;
use crate::submit::SubmitControl;
use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use help::draw_help;
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row as TableRow, Table, Tabs, Wrap},
    Terminal,
};
use state::{Editing, KeyAction, Tab, UiState};
use std::sync::Arc;
use std::{io, time::Duration, time::Instant};
use tokio::sync::mpsc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

pub async fn run(args: Cli) -> Result<()> {
    let cfg = build_config(&args);
    let transport = Arc::new(HttpTransport::new(&cfg)?);

    let (event_tx, event_rx) = mpsc::unbounded_channel::<AppEvent>();
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<UiCommand>();

    if let Some(src) = args.results.as_deref() {
        let _ = cmd_tx.send(UiCommand::Load(PageSource::from_arg(src)));
    }

    // TUI runs in a dedicated thread to keep all blocking I/O out of the Tokio runtime.
    let ui_args = args.clone();
    let ui_handle = std::thread::spawn(move || run_threaded(ui_args, event_rx, cmd_tx));

    let res = orchestrator::run_controller(transport, cfg.locale, event_tx, cmd_rx).await;

    let join_res = tokio::task::spawn_blocking(move || ui_handle.join()).await;
    if let Ok(joined) = join_res {
        match joined {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(e),
            Err(_) => return Err(anyhow::anyhow!("TUI thread panicked")),
        }
    }

    res
}

/// Run the TUI loop on a dedicated thread.
fn run_threaded(
    args: Cli,
    mut event_rx: UnboundedReceiver<AppEvent>,
    cmd_tx: UnboundedSender<UiCommand>,
) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).ok();

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;
    terminal.clear().ok();

    let mut state = UiState::new(args.locale, &args.upload_field);
    if let Some(path) = args.upload.as_ref() {
        state.upload.select_file(path);
        state.tab = Tab::Upload;
    }
    for (name, value) in &args.fields {
        state.manual.set(name, value.clone());
    }
    if args.results.is_some() {
        state.info = "Loading results…".into();
    }

    let tick_rate = Duration::from_millis(100);
    let mut last_tick = Instant::now();

    let res = loop {
        while let Ok(ev) = event_rx.try_recv() {
            state.apply_event(ev);
        }

        if last_tick.elapsed() >= tick_rate {
            terminal.draw(|f| draw(f.area(), f, &state)).ok();
            last_tick = Instant::now();
        }

        if event::poll(Duration::from_millis(10)).unwrap_or(false) {
            if let Ok(Event::Key(k)) = event::read() {
                if k.kind != KeyEventKind::Press {
                    continue;
                }
                match state.handle_key(k.modifiers, k.code) {
                    KeyAction::None => {}
                    KeyAction::Send(cmd) => {
                        if cmd_tx.send(cmd).is_err() {
                            break Err(anyhow::anyhow!("controller stopped"));
                        }
                    }
                    KeyAction::Quit => {
                        let _ = cmd_tx.send(UiCommand::Quit);
                        break Ok(());
                    }
                }
                // Redraw right away so the busy label shows before the reply.
                terminal.draw(|f| draw(f.area(), f, &state)).ok();
                last_tick = Instant::now();
            }
        }
    };

    disable_raw_mode().ok();
    let mut stdout = io::stdout();
    execute!(stdout, LeaveAlternateScreen).ok();
    res
}

fn severity_color(s: Severity) -> Color {
    let (r, g, b) = s.rgb();
    Color::Rgb(r, g, b)
}

fn button_style(control: &SubmitControl) -> Style {
    if control.is_enabled() {
        Style::default().fg(Color::Black).bg(Color::Green)
    } else {
        Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::DIM)
    }
}

fn draw(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(area);

    let tabs = Tabs::new(vec![
        Line::from("Results"),
        Line::from("Upload"),
        Line::from("Predict"),
    ])
    .select(state.tab.index())
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title("stress-predict-cli"),
    )
    .highlight_style(Style::default().fg(Color::Yellow));
    f.render_widget(tabs, chunks[0]);

    match state.tab {
        Tab::Results => draw_results(chunks[1], f, state),
        Tab::Upload => draw_upload(chunks[1], f, state),
        Tab::Predict => draw_predict(chunks[1], f, state),
    }

    let status = Paragraph::new(Line::from(vec![
        Span::styled(" ? ", Style::default().fg(Color::Magenta)),
        Span::raw("help  "),
        Span::styled(state.info.as_str(), Style::default().fg(Color::Gray)),
    ]));
    f.render_widget(status, chunks[2]);

    if state.show_help {
        draw_help(centered(area, 60, 28), f);
    }
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let w = width.min(area.width);
    let h = height.min(area.height);
    Rect {
        x: area.x + (area.width - w) / 2,
        y: area.y + (area.height - h) / 2,
        width: w,
        height: h,
    }
}

fn draw_results(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let title = state
        .results_source
        .as_ref()
        .map(|s| format!("Results: {}", s.describe()))
        .unwrap_or_else(|| "Results".into());
    let block = Block::default().borders(Borders::ALL).title(title);

    let Some(table) = state.table.as_ref() else {
        let p = Paragraph::new("No results table loaded. Start with --results or upload a CSV.")
            .block(block)
            .wrap(Wrap { trim: true });
        f.render_widget(p, area);
        return;
    };
    let view = table.view();

    let parts = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(block.inner(area));
    f.render_widget(block, area);

    let header = TableRow::new(view.columns.iter().enumerate().map(|(i, c)| {
        let text = match view.sort_glyph {
            Some(g) if view.sortable_column == Some(i) => format!("{c} {g}"),
            _ => c.clone(),
        };
        let mut style = Style::default().add_modifier(Modifier::BOLD);
        if view.sortable_column == Some(i) {
            style = style.fg(Color::Cyan);
        }
        if state.header_selected == i {
            style = style.add_modifier(Modifier::UNDERLINED);
        }
        Cell::from(text).style(style)
    }));

    let rows = view.rows.iter().map(|r| {
        let mut cells = vec![Cell::from(r.ordinal.to_string())];
        for (i, c) in r.cells.iter().enumerate() {
            let cell = Cell::from(c.clone());
            // Ordinal occupies column 0, captured cells start at 1.
            if view.sortable_column == Some(i + 1) {
                let color = severity_color(Severity::from_prediction(r.stress_level));
                cells.push(cell.style(Style::default().fg(color)));
            } else {
                cells.push(cell);
            }
        }
        TableRow::new(cells)
    });

    let widths: Vec<Constraint> = (0..view.columns.len().max(1))
        .map(|i| {
            if i == 0 {
                Constraint::Length(6)
            } else {
                Constraint::Fill(1)
            }
        })
        .collect();
    f.render_widget(Table::new(rows, widths).header(header), parts[0]);

    let chrome = &view.chrome;
    if chrome.visible {
        let dim = Style::default().fg(Color::DarkGray);
        let mut spans = vec![
            Span::raw(chrome.info.clone()),
            Span::raw("   "),
            Span::styled("‹ ", if chrome.prev_disabled { dim } else { Style::default() }),
        ];
        for b in &chrome.buttons {
            let style = if b.active {
                Style::default().fg(Color::Black).bg(Color::Yellow)
            } else {
                Style::default()
            };
            spans.push(Span::styled(format!(" {} ", b.number), style));
        }
        spans.push(Span::styled(
            " ›",
            if chrome.next_disabled { dim } else { Style::default() },
        ));
        f.render_widget(Paragraph::new(Line::from(spans)), parts[1]);
    }
}

fn draw_upload(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let mut lines = Vec::new();
    match state.upload.file.as_ref() {
        Some(file) => {
            let view = file.view(state.locale);
            let style = if view.placeholder_visible {
                Style::default().fg(Color::DarkGray)
            } else {
                Style::default().fg(Color::White)
            };
            let mut spans = vec![Span::raw("File: "), Span::styled(view.text, style)];
            if view.clear_visible {
                spans.push(Span::styled("  [x] clear", Style::default().fg(Color::Magenta)));
            }
            lines.push(Line::from(spans));
        }
        None => lines.push(Line::from("File control unavailable")),
    }

    if state.editing == Some(Editing::Path) {
        lines.push(Line::from(vec![
            Span::styled("Path: ", Style::default().fg(Color::Yellow)),
            Span::raw(format!("{}_", state.input)),
        ]));
    } else {
        lines.push(Line::from(Span::styled(
            "o: choose file",
            Style::default().fg(Color::DarkGray),
        )));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        format!(" {} ", state.upload.submit.label()),
        button_style(&state.upload.submit),
    )));

    if let Some(banner) = state.upload.banner.as_ref() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            banner.message.clone(),
            Style::default().fg(Color::White).bg(Color::Red),
        )));
    }

    let p = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("Upload CSV"))
        .wrap(Wrap { trim: false });
    f.render_widget(p, area);
}

fn draw_predict(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let editing_field = match state.editing {
        Some(Editing::Field(i)) => Some(i),
        _ => None,
    };
    let fields: Vec<Line> = state
        .manual
        .fields
        .iter()
        .enumerate()
        .map(|(i, (name, value))| {
            let value = if editing_field == Some(i) {
                format!("{}_", state.input)
            } else {
                value.clone()
            };
            let style = if i == state.field_selected {
                Style::default().fg(Color::Yellow)
            } else {
                Style::default()
            };
            Line::from(vec![
                Span::styled(format!("{name:<30}"), style),
                Span::raw(value),
            ])
        })
        .collect();
    // Keep the selected field on screen.
    let visible = cols[0].height.saturating_sub(2) as usize;
    let scroll = state.field_selected.saturating_sub(visible.saturating_sub(1));
    let p = Paragraph::new(fields)
        .block(Block::default().borders(Borders::ALL).title("Fields"))
        .scroll((scroll as u16, 0));
    f.render_widget(p, cols[0]);

    let mut lines = vec![
        Line::from(Span::styled(
            format!(" {} ", state.manual.submit.label()),
            button_style(&state.manual.submit),
        )),
        Line::from(""),
    ];
    match state.manual.panel.as_ref() {
        Some(PredictionPanel::Result {
            prediction,
            severity,
            label,
            description,
            ..
        }) => {
            let color = severity_color(*severity);
            lines.push(Line::from(Span::styled(
                label.clone(),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            )));
            lines.push(Line::from(format!("Prediction: {prediction}")));
            lines.push(Line::from(""));
            lines.push(Line::from(description.clone()));
        }
        Some(PredictionPanel::Error { message }) => {
            lines.push(Line::from(Span::styled(
                message.clone(),
                Style::default().fg(Color::Red),
            )));
        }
        None => {}
    }
    let p = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("Prediction"))
        .wrap(Wrap { trim: true });
    f.render_widget(p, cols[1]);
}
