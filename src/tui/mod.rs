//! Terminal interface for the analysis workflow.
//!
//! Renders whichever of the three views the state machine says is active:
//! Input (staged batch), Loading (request in flight), Results (outcome
//! table). All state mutation happens on this thread; the orchestrator only
//! talks back through events.

mod export;

use crate::batch::BatchCollector;
use crate::cli::{build_config, load_candidates, Cli};
use crate::model::AnalysisEvent;
use crate::orchestrator::{self, UiCommand};
use crate::request;
use crate::store::ResultStore;
use crate::view::{ViewState, ViewStateMachine};
use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame, Terminal,
};
use std::path::PathBuf;
use std::{io, time::Duration, time::Instant};
use tokio::sync::mpsc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

const SPINNER_FRAMES: [&str; 4] = ["|", "/", "-", "\\"];

struct UiState {
    machine: ViewStateMachine,
    store: ResultStore,
    collector: BatchCollector,
    staged_paths: Vec<PathBuf>,
    rejections: Vec<String>,
    info: String,
    loading_since: Option<Instant>,
    last_exported_path: Option<String>,
    export_path: Option<PathBuf>,
    endpoint: String,
}

impl UiState {
    fn new(args: &Cli) -> Self {
        Self {
            machine: ViewStateMachine::new(),
            store: ResultStore::new(),
            collector: BatchCollector::new(),
            staged_paths: args.files.clone(),
            rejections: Vec::new(),
            info: String::new(),
            loading_since: None,
            last_exported_path: None,
            export_path: args.export_csv.clone(),
            endpoint: args.endpoint.clone(),
        }
    }

    /// Re-stage the CLI paths as a fresh picker selection. Runs on every
    /// entry to Input so a fresh, empty batch is rebuilt from scratch.
    fn restage(&mut self) {
        match load_candidates(&self.staged_paths) {
            Ok(candidates) => {
                self.rejections = self
                    .collector
                    .replace_all(candidates)
                    .iter()
                    .map(ToString::to_string)
                    .collect();
            }
            Err(e) => {
                self.collector.replace_all(Vec::new());
                self.rejections.clear();
                self.info = format!("Staging failed: {e:#}");
            }
        }
    }
}

pub async fn run(args: Cli) -> Result<()> {
    // Unbounded channels avoid backpressure between the UI thread and the
    // controller task.
    let (event_tx, event_rx) = mpsc::unbounded_channel::<AnalysisEvent>();
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<UiCommand>();

    let cfg = build_config(&args);

    // The TUI runs in a dedicated thread to keep blocking terminal I/O out
    // of the Tokio runtime.
    let ui_args = args.clone();
    let ui_handle = std::thread::spawn(move || run_threaded(ui_args, event_rx, cmd_tx));

    let res = orchestrator::run_controller(&cfg, event_tx, cmd_rx).await;

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

/// Run the UI loop on a dedicated thread.
fn run_threaded(
    args: Cli,
    mut event_rx: UnboundedReceiver<AnalysisEvent>,
    cmd_tx: UnboundedSender<UiCommand>,
) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).ok();

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;
    terminal.clear().ok();

    let mut state = UiState::new(&args);
    state.restage();

    let tick_rate = Duration::from_millis(100);
    let mut last_tick = Instant::now();

    let res = loop {
        // Drain events without blocking to keep the loop responsive.
        while let Ok(ev) = event_rx.try_recv() {
            apply_event(&mut state, ev);
        }

        if last_tick.elapsed() >= tick_rate {
            terminal.draw(|f| draw(f.area(), f, &state)).ok();
            last_tick = Instant::now();
        }

        // Poll input with a short timeout to avoid blocking the render loop.
        if event::poll(Duration::from_millis(10)).unwrap_or(false) {
            if let Ok(Event::Key(k)) = event::read() {
                if k.kind != KeyEventKind::Press {
                    continue;
                }
                match (k.modifiers, k.code) {
                    (_, KeyCode::Char('q')) | (KeyModifiers::CONTROL, KeyCode::Char('c')) => {
                        let _ = cmd_tx.send(UiCommand::Quit);
                        break Ok(());
                    }
                    (_, KeyCode::Enter) => {
                        if state.machine.state() == ViewState::Input {
                            submit_batch(&mut state, &cmd_tx);
                        }
                    }
                    (_, KeyCode::Esc) | (_, KeyCode::Char('b')) => match state.machine.state() {
                        ViewState::Loading => {
                            // Cancels interest: the eventual response will
                            // carry a stale id and be dropped.
                            if state.machine.return_to_input() {
                                state.loading_since = None;
                                state.info = "Cancelled; response will be discarded".into();
                                state.restage();
                            }
                        }
                        ViewState::Results => {
                            if state.machine.return_to_input() {
                                state.info.clear();
                                state.restage();
                            }
                        }
                        ViewState::Input => {}
                    },
                    (_, KeyCode::Char('e')) => {
                        if state.machine.state() == ViewState::Results {
                            export_current(&mut state);
                        }
                    }
                    (_, KeyCode::Char('y')) => {
                        if state.machine.state() == ViewState::Results {
                            copy_exported_path(&mut state);
                        }
                    }
                    _ => {}
                }
            }
        }
    };

    disable_raw_mode().ok();
    execute!(terminal.backend_mut(), LeaveAlternateScreen).ok();
    terminal.show_cursor().ok();

    res
}

/// Input -> Loading. The batch is handed off whole and never reused.
fn submit_batch(state: &mut UiState, cmd_tx: &UnboundedSender<UiCommand>) {
    if state.collector.is_empty() {
        state.info = "Stage at least one acceptable PDF first".into();
        return;
    }
    let Some(request_id) = state.machine.begin_analysis() else {
        return;
    };
    let payload = request::build(&state.collector.take_batch());
    state.loading_since = Some(Instant::now());
    state.info.clear();
    let _ = cmd_tx.send(UiCommand::Submit {
        request_id,
        payload,
    });
}

fn apply_event(state: &mut UiState, ev: AnalysisEvent) {
    match ev {
        AnalysisEvent::Started { .. } => {}
        AnalysisEvent::Completed { request_id, result } => {
            if state.machine.complete_analysis(request_id) {
                state.store.replace(*result);
                state.loading_since = None;
                state.info = "Analysis complete".into();
            }
            // Stale responses are dropped on the floor by design.
        }
        AnalysisEvent::Failed { request_id, error } => {
            if state
                .machine
                .fail_analysis(request_id, format!("Analysis failed: {error}"))
            {
                state.loading_since = None;
                state.restage();
            }
        }
    }
}

fn export_current(state: &mut UiState) {
    let Some(result) = state.store.current() else {
        state.info = "No completed analysis to export".into();
        return;
    };
    match export::export_result_csv(result, state.export_path.as_deref()) {
        Ok(path) => {
            let path_str = path.to_string_lossy().to_string();
            state.info = format!("Exported CSV: {} (press 'y' to copy path)", path.display());
            state.last_exported_path = Some(path_str);
        }
        Err(e) => {
            state.info = format!("CSV export failed: {e:#}");
        }
    }
}

fn copy_exported_path(state: &mut UiState) {
    if let Some(path) = state.last_exported_path.clone() {
        match export::copy_to_clipboard(&path) {
            Ok(()) => state.info = format!("Copied to clipboard: {path}"),
            Err(e) => state.info = format!("Clipboard copy failed: {e:#}"),
        }
    } else {
        state.info = "Nothing exported yet (press 'e' first)".into();
    }
}

fn draw(area: Rect, f: &mut Frame, state: &UiState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(5),
            Constraint::Length(3),
        ])
        .split(area);

    draw_header(chunks[0], f, state);
    match state.machine.state() {
        ViewState::Input => draw_input(chunks[1], f, state),
        ViewState::Loading => draw_loading(chunks[1], f, state),
        ViewState::Results => draw_results(chunks[1], f, state),
    }
    draw_footer(chunks[2], f, state);
}

fn draw_header(area: Rect, f: &mut Frame, state: &UiState) {
    let view = match state.machine.state() {
        ViewState::Input => "Input",
        ViewState::Loading => "Loading",
        ViewState::Results => "Results",
    };
    let p = Paragraph::new(Line::from(vec![
        Span::styled(
            "Signature detection",
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw("  ·  "),
        Span::styled(&state.endpoint, Style::default().fg(Color::Gray)),
    ]))
    .block(Block::default().borders(Borders::ALL).title(view));
    f.render_widget(p, area);
}

fn draw_input(area: Rect, f: &mut Frame, state: &UiState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(4), Constraint::Length(6)])
        .split(area);

    let rows: Vec<Row> = state
        .collector
        .documents()
        .iter()
        .map(|d| {
            Row::new(vec![
                Cell::from(d.name().to_string()),
                Cell::from(format_size(d.size())),
                Cell::from(d.declared_type().to_string()),
            ])
        })
        .collect();
    let table = Table::new(
        rows,
        [
            Constraint::Percentage(50),
            Constraint::Percentage(20),
            Constraint::Percentage(30),
        ],
    )
    .header(
        Row::new(vec!["Document", "Size", "Type"])
            .style(Style::default().add_modifier(Modifier::BOLD)),
    )
    .block(Block::default().borders(Borders::ALL).title(format!(
        "Staged batch ({} document(s))",
        state.collector.count()
    )));
    f.render_widget(table, chunks[0]);

    let mut lines: Vec<Line> = Vec::new();
    if let Some(notice) = state.machine.failure_notice() {
        lines.push(Line::from(Span::styled(
            notice.to_string(),
            Style::default().fg(Color::Red),
        )));
    }
    for rejection in &state.rejections {
        lines.push(Line::from(Span::styled(
            format!("Rejected: {rejection}"),
            Style::default().fg(Color::Red),
        )));
    }
    if !state.info.is_empty() {
        lines.push(Line::from(state.info.clone()));
    }
    let p = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Messages"));
    f.render_widget(p, chunks[1]);
}

fn draw_loading(area: Rect, f: &mut Frame, state: &UiState) {
    let elapsed = state
        .loading_since
        .map(|t| t.elapsed())
        .unwrap_or_default();
    let frame = SPINNER_FRAMES[(elapsed.as_millis() / 120) as usize % SPINNER_FRAMES.len()];
    let mut lines = vec![
        Line::from(""),
        Line::from(format!(
            "{frame} Analyzing… {:.1}s elapsed",
            elapsed.as_secs_f64()
        )),
        Line::from(""),
        Line::from(Span::styled(
            "The batch has been handed to the service; waiting for results.",
            Style::default().fg(Color::Gray),
        )),
    ];
    if !state.info.is_empty() {
        lines.push(Line::from(""));
        lines.push(Line::from(state.info.clone()));
    }
    let p = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Loading"));
    f.render_widget(p, area);
}

fn draw_results(area: Rect, f: &mut Frame, state: &UiState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(4), Constraint::Length(5)])
        .split(area);

    let Some(result) = state.store.current() else {
        let p = Paragraph::new("No results available")
            .block(Block::default().borders(Borders::ALL).title("Results"));
        f.render_widget(p, chunks[0]);
        return;
    };

    let rows: Vec<Row> = result
        .outcomes
        .iter()
        .map(|o| {
            let status_style = match o.status {
                crate::model::OutcomeStatus::Success => Style::default().fg(Color::Green),
                crate::model::OutcomeStatus::Failure => Style::default().fg(Color::Red),
                crate::model::OutcomeStatus::Unsupported => Style::default().fg(Color::Yellow),
            };
            Row::new(vec![
                Cell::from(o.document.clone()),
                Cell::from(Span::styled(o.status.as_str(), status_style)),
                Cell::from(o.num_pages.to_string()),
                Cell::from(o.flagged_pages_label()),
            ])
        })
        .collect();
    let table = Table::new(
        rows,
        [
            Constraint::Percentage(40),
            Constraint::Percentage(15),
            Constraint::Percentage(10),
            Constraint::Percentage(35),
        ],
    )
    .header(
        Row::new(vec!["Document", "Status", "Pages", "Signature pages"])
            .style(Style::default().add_modifier(Modifier::BOLD)),
    )
    .block(Block::default().borders(Borders::ALL).title(format!(
        "Results ({} document(s), {})",
        result.outcomes.len(),
        result.timestamp_utc
    )));
    f.render_widget(table, chunks[0]);

    let mut lines = vec![Line::from(format!(
        "Classification: {:.2} s   Transfer: {:.2} s   Total: {:.2} s",
        result.classification_secs,
        result.transfer_secs(),
        result.total_secs
    ))];
    if !state.info.is_empty() {
        lines.push(Line::from(state.info.clone()));
    }
    let p = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Timing"));
    f.render_widget(p, chunks[1]);
}

fn draw_footer(area: Rect, f: &mut Frame, state: &UiState) {
    let keys = match state.machine.state() {
        ViewState::Input => "Enter analyze · q quit",
        ViewState::Loading => "Esc cancel · q quit",
        ViewState::Results => "e export CSV · y copy path · b back · q quit",
    };
    let p = Paragraph::new(Line::from(Span::styled(
        keys,
        Style::default().fg(Color::Magenta),
    )))
    .block(Block::default().borders(Borders::ALL).title("Keys"));
    f.render_widget(p, area);
}

fn format_size(bytes: u64) -> String {
    if bytes >= 1_000_000 {
        format!("{:.1} MB", bytes as f64 / 1e6)
    } else if bytes >= 1_000 {
        format!("{:.1} KB", bytes as f64 / 1e3)
    } else {
        format!("{bytes} B")
    }
}
