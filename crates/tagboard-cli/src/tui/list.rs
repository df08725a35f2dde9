//! TUI list view for tagboard.
//!
//! Layout: filter input on top, the current page of tags, and a status bar.
//! Key bindings: `/` edit filter, Enter apply, `←`/`→` or `[`/`]` page,
//! `b`/`f` history, `n` new tag, `r` retry, `q`/Esc quit.

use super::create_dialog::{CreateDialog, DialogAction};
use super::dispatch::{Dispatcher, Job, Outcome};
use crate::cmd::Context;
use anyhow::{Context as _, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
};
use std::time::{Duration, Instant};
use tagboard_core::{ErrorCode, ListSnapshot, QueryCache, TagListView};
use tracing::{info, warn};

const IDLE_POLL: Duration = Duration::from_millis(50);
const STATUS_TTL: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InputMode {
    Normal,
    Filter,
    Create,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Continue,
    Quit,
}

pub struct BrowseApp {
    cache: QueryCache,
    view: TagListView,
    snapshot: ListSnapshot,
    input_mode: InputMode,
    dialog: Option<CreateDialog>,
    min_title_len: usize,
    table_state: TableState,
    status_msg: Option<(String, Instant)>,
    /// Jobs produced by the last state change, waiting to be submitted.
    outbox: Vec<Job>,
}

impl BrowseApp {
    pub fn new(ctx: &Context, query: &str, now: Instant) -> Self {
        let mut cache = QueryCache::new(ctx.config.cache_options());
        let mut view = TagListView::new(&mut cache, query, ctx.config.view_options());
        let snapshot = view.snapshot(&mut cache, now);
        let mut app = Self {
            cache,
            view,
            snapshot,
            input_mode: InputMode::Normal,
            dialog: None,
            min_title_len: ctx.config.form.min_title_len,
            table_state: TableState::default(),
            status_msg: None,
            outbox: Vec::new(),
        };
        app.collect_requests();
        app
    }

    /// Recompute the snapshot and queue any fetch it triggered.
    fn refresh(&mut self, now: Instant) {
        self.snapshot = self.view.snapshot(&mut self.cache, now);
        self.collect_requests();
        let rows = self.snapshot.rows.len();
        match self.table_state.selected() {
            _ if rows == 0 => self.table_state.select(None),
            Some(i) if i >= rows => self.table_state.select(Some(rows - 1)),
            None => self.table_state.select(Some(0)),
            Some(_) => {}
        }
    }

    fn collect_requests(&mut self) {
        self.outbox
            .extend(self.cache.take_requests().into_iter().map(Job::Fetch));
    }

    /// Jobs to hand to the dispatcher.
    pub fn take_jobs(&mut self) -> Vec<Job> {
        std::mem::take(&mut self.outbox)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.view.deadline()
    }

    pub fn tick(&mut self, now: Instant) {
        if self.view.tick(now) {
            self.refresh(now);
        }
    }

    pub fn apply_outcome(&mut self, outcome: Outcome, now: Instant) {
        match outcome {
            Outcome::Fetched { id, result } => {
                self.cache.complete(id, result, now);
            }
            Outcome::Created(result) => {
                let settled = match self.dialog.as_mut() {
                    Some(dialog) => dialog.finish(result, &mut self.cache),
                    None => {
                        // No dialog left to settle; apply the cache effect directly.
                        if result.is_ok() {
                            self.cache.invalidate_all();
                        }
                        result.map_err(Into::into)
                    }
                };
                if let Ok(tag) = settled {
                    info!(id = %tag.id, "tag created from browse view");
                    self.set_status(format!("Created \"{}\" ({})", tag.title, tag.slug.unwrap_or_default()));
                    self.dialog = None;
                    self.input_mode = InputMode::Normal;
                }
            }
        }
        self.refresh(now);
    }

    fn set_status(&mut self, msg: String) {
        self.status_msg = Some((msg, Instant::now()));
    }

    pub fn handle_key(&mut self, key: KeyEvent, now: Instant) -> Action {
        let action = match self.input_mode {
            InputMode::Create => {
                self.handle_dialog_key(key);
                Action::Continue
            }
            InputMode::Filter => {
                self.handle_filter_key(key, now);
                Action::Continue
            }
            InputMode::Normal => self.handle_normal_key(key),
        };
        self.refresh(now);
        action
    }

    fn handle_dialog_key(&mut self, key: KeyEvent) {
        let Some(dialog) = self.dialog.as_mut() else {
            self.input_mode = InputMode::Normal;
            return;
        };
        match dialog.handle_key(key) {
            Some(DialogAction::Submit(request)) => self.outbox.push(Job::Create(request)),
            Some(DialogAction::Cancel) => {
                self.dialog = None;
                self.input_mode = InputMode::Normal;
            }
            None => {}
        }
    }

    fn handle_filter_key(&mut self, key: KeyEvent, now: Instant) {
        match key.code {
            KeyCode::Enter => {
                self.view.apply_filter();
                self.input_mode = InputMode::Normal;
            }
            KeyCode::Esc => self.input_mode = InputMode::Normal,
            KeyCode::Backspace => self.view.pop_filter_char(now),
            KeyCode::Char(c) => self.view.push_filter_char(c, now),
            _ => {}
        }
    }

    fn handle_normal_key(&mut self, key: KeyEvent) -> Action {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return Action::Quit,
            KeyCode::Char('/') => self.input_mode = InputMode::Filter,
            KeyCode::Enter => {
                self.view.apply_filter();
            }
            KeyCode::Right | KeyCode::Char(']') => {
                self.view.next_page();
            }
            KeyCode::Left | KeyCode::Char('[') => {
                self.view.prev_page();
            }
            KeyCode::Char('b') => {
                self.view.back();
            }
            KeyCode::Char('f') => {
                self.view.forward();
            }
            KeyCode::Char('r') => {
                if self.view.retry(&mut self.cache) {
                    self.set_status("Retrying…".to_string());
                }
            }
            KeyCode::Char('n') => {
                self.dialog = Some(CreateDialog::new(self.min_title_len));
                self.input_mode = InputMode::Create;
            }
            KeyCode::Down | KeyCode::Char('j') => self.select_next(),
            KeyCode::Up | KeyCode::Char('k') => self.select_prev(),
            _ => {}
        }
        Action::Continue
    }

    fn select_next(&mut self) {
        let len = self.snapshot.rows.len();
        if len == 0 {
            return;
        }
        let i = self
            .table_state
            .selected()
            .map_or(0, |i| if i + 1 >= len { 0 } else { i + 1 });
        self.table_state.select(Some(i));
    }

    fn select_prev(&mut self) {
        let len = self.snapshot.rows.len();
        if len == 0 {
            return;
        }
        let i = self
            .table_state
            .selected()
            .map_or(0, |i| if i == 0 { len - 1 } else { i - 1 });
        self.table_state.select(Some(i));
    }

    /// Close the screen and release its cache observer.
    pub fn shutdown(self) {
        let Self {
            mut cache, view, ..
        } = self;
        view.close(&mut cache);
    }

    // -----------------------------------------------------------------------
    // Rendering
    // -----------------------------------------------------------------------

    pub fn render(&mut self, frame: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(3),
                Constraint::Length(1),
            ])
            .split(area);

        self.render_filter(frame, chunks[0]);
        self.render_body(frame, chunks[1]);
        frame.render_widget(Paragraph::new(self.status_line()), chunks[2]);

        if let Some(dialog) = &self.dialog {
            dialog.render(frame, area);
        }
    }

    fn render_filter(&self, frame: &mut Frame, area: Rect) {
        let snap = &self.snapshot;
        let editing = self.input_mode == InputMode::Filter;
        let mut title = " Filter ".to_string();
        if snap.raw_filter != snap.debounced_filter {
            title.push_str("(typing…) ");
        } else if snap.debounced_filter != snap.applied.filter {
            title.push_str("(Enter to apply) ");
        }
        let text = if editing {
            format!("{}_", snap.raw_filter)
        } else {
            snap.raw_filter.clone()
        };
        let border = if editing { Color::Yellow } else { Color::DarkGray };
        let para = Paragraph::new(text).block(
            Block::default()
                .borders(Borders::ALL)
                .title(title)
                .border_style(Style::default().fg(border)),
        );
        frame.render_widget(para, area);
    }

    fn render_body(&mut self, frame: &mut Frame, area: Rect) {
        let snap = &self.snapshot;
        let mut title = match snap.pagination {
            Some(p) if !p.is_empty() => {
                format!(" Tags  page {}/{}  {} total ", snap.applied.page, p.total_pages, p.total_items)
            }
            _ => " Tags ".to_string(),
        };
        if snap.is_loading || snap.is_fetching {
            title.push_str("(loading…) ");
        }
        let block = Block::default().borders(Borders::ALL).title(title);

        if let Some(err) = &snap.error {
            let lines = vec![
                Line::from(Span::styled(
                    format!("[{}] {err}", err.code()),
                    Style::default().fg(Color::Red),
                )),
                Line::from(Span::styled(
                    err.hint().unwrap_or_default(),
                    Style::default().fg(Color::DarkGray),
                )),
                Line::from("Press r to retry."),
            ];
            frame.render_widget(Paragraph::new(lines).block(block), area);
            return;
        }

        if snap.is_empty {
            let msg = if snap.applied.filter.is_empty() {
                "No tags yet. Press n to create one.".to_string()
            } else {
                format!("No tags match \"{}\".", snap.applied.filter)
            };
            frame.render_widget(
                Paragraph::new(msg)
                    .style(Style::default().fg(Color::DarkGray))
                    .block(block),
                area,
            );
            return;
        }

        if snap.rows.is_empty() && snap.is_loading {
            frame.render_widget(Paragraph::new("Loading…").block(block), area);
            return;
        }

        let row_style = if snap.is_placeholder {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default()
        };
        let rows: Vec<Row> = snap
            .rows
            .iter()
            .map(|tag| {
                Row::new([
                    Cell::from(tag.title.clone()),
                    Cell::from(tag.slug.clone().unwrap_or_default()),
                    Cell::from(tag.video_count.to_string()),
                ])
                .style(row_style)
            })
            .collect();
        let table = Table::new(
            rows,
            [
                Constraint::Percentage(45),
                Constraint::Percentage(40),
                Constraint::Length(8),
            ],
        )
        .header(
            Row::new(["Title", "Slug", "Videos"])
                .style(Style::default().add_modifier(Modifier::BOLD)),
        )
        .block(block)
        .row_highlight_style(Style::default().bg(Color::DarkGray))
        .highlight_symbol("► ");
        frame.render_stateful_widget(table, area, &mut self.table_state);
    }

    fn status_line(&self) -> Line<'static> {
        if let Some((ref msg, at)) = self.status_msg
            && at.elapsed() < STATUS_TTL
        {
            return Line::from(Span::styled(msg.clone(), Style::default().fg(Color::Cyan)));
        }

        let key_style = Style::default().fg(Color::Cyan);
        let dim_style = Style::default().fg(Color::DarkGray);
        let pairs: &[(&str, &str)] = match self.input_mode {
            InputMode::Filter => &[("ENTER", " apply  "), ("ESC", " done")],
            InputMode::Create if self.dialog.as_ref().is_some_and(CreateDialog::is_busy) => {
                &[("…", " saving")]
            }
            InputMode::Create => &[("ENTER", " save  "), ("ESC", " cancel")],
            InputMode::Normal => &[
                ("/", " filter  "),
                ("←→", " page  "),
                ("b/f", " back/forward  "),
                ("n", " new  "),
                ("r", " retry  "),
                ("q", " quit"),
            ],
        };
        let spans: Vec<Span<'static>> = pairs
            .iter()
            .flat_map(|(key, label)| {
                [
                    Span::styled((*key).to_string(), key_style),
                    Span::styled((*label).to_string(), dim_style),
                ]
            })
            .collect();
        Line::from(spans)
    }
}

/// Restores the terminal however the loop exits.
struct TerminalGuard;

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(std::io::stdout(), LeaveAlternateScreen);
    }
}

pub fn run_browse_tui(ctx: &Context, query: &str) -> Result<()> {
    let dispatcher = Dispatcher::spawn(ctx.source.clone()).context("failed to start worker")?;
    let mut app = BrowseApp::new(ctx, query, Instant::now());

    enable_raw_mode().context("failed to enable raw mode")?;
    let _guard = TerminalGuard;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;
    terminal.clear()?;
    info!(query, "browse view opened");

    loop {
        for job in app.take_jobs() {
            if !dispatcher.submit(job) {
                warn!(code = %ErrorCode::InternalUnexpected, "fetch worker stopped");
                anyhow::bail!("{}", ErrorCode::InternalUnexpected.message());
            }
        }
        for outcome in dispatcher.drain() {
            app.apply_outcome(outcome, Instant::now());
        }

        terminal.draw(|frame| {
            let area = frame.area();
            app.render(frame, area);
        })?;

        let now = Instant::now();
        let timeout = app
            .deadline()
            .map_or(IDLE_POLL, |at| at.saturating_duration_since(now).min(IDLE_POLL));
        if event::poll(timeout)?
            && let Event::Key(key) = event::read()?
            && key.kind != KeyEventKind::Release
            && app.handle_key(key, Instant::now()) == Action::Quit
        {
            break;
        }
        app.tick(Instant::now());
    }

    app.shutdown();
    info!("browse view closed");
    Ok(())
}
