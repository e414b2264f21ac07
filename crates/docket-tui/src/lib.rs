// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod history;

pub use history::History;

use anyhow::{Context, Result, anyhow};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use docket_app::{
    DateRange, FetchTicket, FilterPatch, LocationId, Position, Record, RecordId, RecordStatus,
    RecordTicket, ReviewCommand, ReviewController, ReviewEvent, format_iso_date,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState};
use std::collections::BTreeMap;
use std::io;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;

const DATE_SHIFT_DAYS: i64 = 7;
const STATUS_CLEAR_AFTER: Duration = Duration::from_secs(4);
const ACTIVE_MARK: &str = "›";

/// Where review records come from.
///
/// The `spawn_*` methods deliver their result on `tx` as an
/// [`InternalEvent`]; the defaults run the fetch inline, which is what tests
/// and the demo want. Network-backed runtimes override them to run on a
/// worker thread.
pub trait ReviewRuntime {
    fn fetch_records(&mut self, range: DateRange) -> Result<Vec<Record>>;
    fn fetch_record(&mut self, id: RecordId) -> Result<Option<Record>>;
    fn spawn_fetch_records(&mut self, ticket: FetchTicket, tx: Sender<InternalEvent>) -> Result<()> {
        let result = self
            .fetch_records(ticket.range)
            .map_err(|error| format!("{error:#}"));
        tx.send(InternalEvent::RecordsLoaded { ticket, result })
            .map_err(|_| anyhow!("review event channel closed"))?;
        Ok(())
    }
    fn spawn_fetch_record(&mut self, ticket: RecordTicket, tx: Sender<InternalEvent>) -> Result<()> {
        let result = self
            .fetch_record(ticket.id)
            .map_err(|error| format!("{error:#}"));
        tx.send(InternalEvent::RecordLoaded { ticket, result })
            .map_err(|_| anyhow!("review event channel closed"))?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InternalEvent {
    ClearStatus {
        token: u64,
    },
    RecordsLoaded {
        ticket: FetchTicket,
        result: Result<Vec<Record>, String>,
    },
    RecordLoaded {
        ticket: RecordTicket,
        result: Result<Option<Record>, String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
enum InputMode {
    #[default]
    Normal,
    Search(String),
    Address(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct ViewData {
    history: History,
    input: InputMode,
    status_line: Option<String>,
    status_token: u64,
    help_visible: bool,
}

pub fn run_review<R: ReviewRuntime>(
    controller: &mut ReviewController<Record>,
    runtime: &mut R,
    initial_url: &str,
) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen).context("enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    let mut view_data = ViewData::default();
    let (internal_tx, internal_rx) = mpsc::channel();
    open_location(controller, runtime, &mut view_data, &internal_tx, initial_url);

    let mut result = Ok(());
    loop {
        process_internal_events(
            controller,
            runtime,
            &mut view_data,
            &internal_tx,
            &internal_rx,
        );

        if let Err(error) = terminal.draw(|frame| render(frame, controller, &view_data)) {
            result = Err(error).context("draw frame");
            break;
        }

        let has_event = match event::poll(Duration::from_millis(120)).context("poll event") {
            Ok(has_event) => has_event,
            Err(error) => {
                result = Err(error);
                break;
            }
        };
        if has_event {
            match event::read().context("read event") {
                Ok(Event::Key(key)) => {
                    if handle_key_event(controller, runtime, &mut view_data, &internal_tx, key) {
                        break;
                    }
                }
                Ok(_) => {}
                Err(error) => {
                    result = Err(error);
                    break;
                }
            }
        }
    }

    disable_raw_mode().context("disable raw mode")?;
    execute!(io::stdout(), terminal::LeaveAlternateScreen).context("leave alternate screen")?;
    result
}

fn open_location<R: ReviewRuntime>(
    controller: &mut ReviewController<Record>,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    url: &str,
) {
    view_data.history.replace(url.trim());
    dispatch_and_apply(
        controller,
        runtime,
        view_data,
        internal_tx,
        ReviewCommand::Load {
            url: url.to_owned(),
        },
    );
}

fn process_internal_events<R: ReviewRuntime>(
    controller: &mut ReviewController<Record>,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    rx: &Receiver<InternalEvent>,
) {
    while let Ok(event) = rx.try_recv() {
        let command = match event {
            InternalEvent::ClearStatus { token } if token == view_data.status_token => {
                view_data.status_line = None;
                continue;
            }
            InternalEvent::ClearStatus { .. } => continue,
            InternalEvent::RecordsLoaded { ticket, result } => {
                ReviewCommand::RecordsLoaded { ticket, result }
            }
            InternalEvent::RecordLoaded { ticket, result } => {
                ReviewCommand::RecordLoaded { ticket, result }
            }
        };
        dispatch_and_apply(controller, runtime, view_data, tx, command);
    }
}

fn dispatch_and_apply<R: ReviewRuntime>(
    controller: &mut ReviewController<Record>,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    command: ReviewCommand<Record>,
) {
    let events = controller.dispatch(command);
    apply_events(runtime, view_data, internal_tx, events);
}

fn apply_events<R: ReviewRuntime>(
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    events: Vec<ReviewEvent>,
) {
    for event in events {
        match event {
            ReviewEvent::FetchRequested(ticket) => {
                if let Err(error) = runtime.spawn_fetch_records(ticket, internal_tx.clone()) {
                    emit_status(view_data, internal_tx, format!("load failed: {error:#}"));
                }
            }
            ReviewEvent::RecordRefreshRequested(ticket) => {
                if let Err(error) = runtime.spawn_fetch_record(ticket, internal_tx.clone()) {
                    emit_status(view_data, internal_tx, format!("refresh failed: {error:#}"));
                }
            }
            ReviewEvent::UrlWritten { url, mode } => view_data.history.record(url, mode),
            ReviewEvent::FiltersRevealed { identity } => emit_status(
                view_data,
                internal_tx,
                format!("filters cleared to show record {identity}"),
            ),
            ReviewEvent::Notification(message) => emit_status(view_data, internal_tx, message),
            ReviewEvent::PassLimitReached => emit_status(
                view_data,
                internal_tx,
                "review state did not settle; press R to reload",
            ),
            ReviewEvent::FiltersChanged(_)
            | ReviewEvent::CursorMoved { .. }
            | ReviewEvent::ActiveRecordRefreshed(_)
            | ReviewEvent::StaleFetchDiscarded { .. }
            | ReviewEvent::Settled { .. } => {}
        }
    }
}

fn schedule_status_clear(internal_tx: &Sender<InternalEvent>, token: u64) {
    let sender = internal_tx.clone();
    thread::spawn(move || {
        thread::sleep(STATUS_CLEAR_AFTER);
        let _ = sender.send(InternalEvent::ClearStatus { token });
    });
}

fn emit_status(
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    message: impl Into<String>,
) {
    view_data.status_line = Some(message.into());
    view_data.status_token = view_data.status_token.saturating_add(1);
    schedule_status_clear(internal_tx, view_data.status_token);
}

fn handle_key_event<R: ReviewRuntime>(
    controller: &mut ReviewController<Record>,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    if key.modifiers.contains(KeyModifiers::CONTROL)
        && matches!(key.code, KeyCode::Char('q') | KeyCode::Char('c'))
    {
        return true;
    }

    if view_data.input != InputMode::Normal {
        handle_input_key(controller, runtime, view_data, internal_tx, key);
        return false;
    }

    if view_data.help_visible {
        if key.code == KeyCode::Esc || key.code == KeyCode::Char('?') {
            view_data.help_visible = false;
        }
        return false;
    }

    let command = match (key.code, key.modifiers) {
        (KeyCode::Char('q'), KeyModifiers::NONE) => return true,
        (KeyCode::Char('j') | KeyCode::Char('n') | KeyCode::Down, _) => Some(ReviewCommand::Next),
        (KeyCode::Char('k') | KeyCode::Char('p') | KeyCode::Up, _) => {
            Some(ReviewCommand::Previous)
        }
        (KeyCode::Char('g') | KeyCode::Home, _) => controller.view().get(0).map(ReviewCommand::JumpTo),
        (KeyCode::Char('G') | KeyCode::End, _) => controller
            .view()
            .len()
            .checked_sub(1)
            .and_then(|last| controller.view().get(last))
            .map(ReviewCommand::JumpTo),
        (KeyCode::Char('/'), _) => {
            view_data.input = InputMode::Search(controller.filter().search.clone());
            None
        }
        (KeyCode::Char(':') | KeyCode::Char('o'), _) => {
            view_data.input = InputMode::Address(String::new());
            None
        }
        (KeyCode::Char('s'), _) => Some(ReviewCommand::SetFilter(
            FilterPatch::default().status(next_status(controller.filter().status)),
        )),
        (KeyCode::Char('l'), _) => {
            let known = known_locations(controller);
            if known.is_empty() {
                emit_status(view_data, internal_tx, "no locations in the loaded records");
                None
            } else {
                let next = next_location(&known, controller.filter().location_id);
                Some(ReviewCommand::SetFilter(FilterPatch::default().location(next)))
            }
        }
        (KeyCode::Char('['), _) => shift_dates(controller, view_data, internal_tx, -DATE_SHIFT_DAYS),
        (KeyCode::Char(']'), _) => shift_dates(controller, view_data, internal_tx, DATE_SHIFT_DAYS),
        (KeyCode::Char('c'), _) => Some(ReviewCommand::ClearDateFilters),
        (KeyCode::Char('x'), _) => Some(ReviewCommand::ResetFilters),
        (KeyCode::Char('r'), _) => Some(ReviewCommand::RefreshActive),
        (KeyCode::Char('R'), _) => Some(ReviewCommand::Invalidate),
        (KeyCode::Char('b'), _) | (KeyCode::Left, KeyModifiers::ALT) => {
            match view_data.history.back() {
                Some(url) => Some(ReviewCommand::NavigateUrl { url }),
                None => {
                    emit_status(view_data, internal_tx, "no earlier location");
                    None
                }
            }
        }
        (KeyCode::Char('f'), _) | (KeyCode::Right, KeyModifiers::ALT) => {
            match view_data.history.forward() {
                Some(url) => Some(ReviewCommand::NavigateUrl { url }),
                None => {
                    emit_status(view_data, internal_tx, "no later location");
                    None
                }
            }
        }
        (KeyCode::Char('?'), _) => {
            view_data.help_visible = true;
            None
        }
        _ => None,
    };

    if let Some(command) = command {
        dispatch_and_apply(controller, runtime, view_data, internal_tx, command);
    }
    false
}

fn handle_input_key<R: ReviewRuntime>(
    controller: &mut ReviewController<Record>,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    match key.code {
        KeyCode::Esc => view_data.input = InputMode::Normal,
        KeyCode::Enter => match std::mem::take(&mut view_data.input) {
            InputMode::Search(term) => dispatch_and_apply(
                controller,
                runtime,
                view_data,
                internal_tx,
                ReviewCommand::SetFilter(FilterPatch::default().search(term.trim())),
            ),
            InputMode::Address(url) => {
                let url = url.trim().to_owned();
                if url.is_empty() {
                    emit_status(view_data, internal_tx, "address is empty");
                    return;
                }
                view_data.history.push(url.clone());
                dispatch_and_apply(
                    controller,
                    runtime,
                    view_data,
                    internal_tx,
                    ReviewCommand::NavigateUrl { url },
                );
            }
            InputMode::Normal => {}
        },
        KeyCode::Backspace => {
            if let InputMode::Search(buffer) | InputMode::Address(buffer) = &mut view_data.input {
                buffer.pop();
            }
        }
        KeyCode::Char(ch) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            if let InputMode::Search(buffer) | InputMode::Address(buffer) = &mut view_data.input {
                buffer.push(ch);
            }
        }
        _ => {}
    }
}

fn shift_dates(
    controller: &ReviewController<Record>,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    days: i64,
) -> Option<ReviewCommand<Record>> {
    let range = controller.filter().date_range();
    if !range.is_bounded() {
        emit_status(view_data, internal_tx, "no date bounds to shift; x resets them");
        return None;
    }
    let shift = time::Duration::days(days);
    let shifted = DateRange::new(
        range.start.and_then(|date| date.checked_add(shift)),
        range.end.and_then(|date| date.checked_add(shift)),
    );
    Some(ReviewCommand::SetFilter(FilterPatch::default().dates(shifted)))
}

fn next_status(current: Option<RecordStatus>) -> Option<RecordStatus> {
    match current {
        None => RecordStatus::ALL.first().copied(),
        Some(status) => RecordStatus::ALL
            .iter()
            .position(|candidate| *candidate == status)
            .and_then(|index| RecordStatus::ALL.get(index + 1))
            .copied(),
    }
}

fn known_locations(controller: &ReviewController<Record>) -> BTreeMap<LocationId, String> {
    controller
        .cache()
        .records()
        .iter()
        .filter_map(|record| record.location.as_ref())
        .map(|location| (location.id, location.name.clone()))
        .collect()
}

fn next_location(
    known: &BTreeMap<LocationId, String>,
    current: Option<LocationId>,
) -> Option<LocationId> {
    match current {
        None => known.keys().next().copied(),
        Some(current) if known.contains_key(&current) => {
            known.range(current..).nth(1).map(|(id, _)| *id)
        }
        Some(_) => known.keys().next().copied(),
    }
}

fn render(frame: &mut ratatui::Frame<'_>, controller: &ReviewController<Record>, view_data: &ViewData) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(3),
        ])
        .split(frame.area());

    let address = Paragraph::new(address_text(controller, view_data))
        .block(Block::default().title("docket").borders(Borders::ALL));
    frame.render_widget(address, layout[0]);

    let filters = Paragraph::new(filter_text(controller))
        .block(Block::default().title("filters").borders(Borders::ALL));
    frame.render_widget(filters, layout[1]);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(layout[2]);
    render_list(frame, body[0], controller);

    let title = controller
        .position()
        .map_or_else(|| "record".to_owned(), |position| format!("record {}", position.label()));
    let detail = controller
        .with_current(detail_text)
        .unwrap_or_else(|| empty_text(controller));
    let detail = Paragraph::new(detail).block(Block::default().title(title).borders(Borders::ALL));
    frame.render_widget(detail, body[1]);

    let status = Paragraph::new(status_text(view_data))
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(status, layout[3]);

    if view_data.help_visible {
        let area = centered_rect(70, 60, frame.area());
        frame.render_widget(Clear, area);
        let help = Paragraph::new(help_overlay_text())
            .block(Block::default().title("help").borders(Borders::ALL));
        frame.render_widget(help, area);
    }
}

fn render_list(frame: &mut ratatui::Frame<'_>, area: Rect, controller: &ReviewController<Record>) {
    let active = controller.cursor();
    let rows = controller.window_records();
    let selected = rows.iter().position(|(index, _)| Some(*index) == active);

    let table_rows = rows.iter().map(|(index, record)| {
        let is_active = Some(*index) == active;
        let style = if is_active {
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        Row::new(
            list_cells(record, is_active)
                .into_iter()
                .map(Cell::from)
                .collect::<Vec<_>>(),
        )
        .style(style)
    });
    let header = Row::new(["", "id", "date", "status", "contact"]).style(
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    );
    let widths = [
        Constraint::Length(1),
        Constraint::Length(6),
        Constraint::Length(10),
        Constraint::Length(9),
        Constraint::Min(8),
    ];
    let table = Table::new(table_rows, widths)
        .header(header)
        .column_spacing(1)
        .block(
            Block::default()
                .title(list_title(controller))
                .borders(Borders::ALL),
        );

    let mut state = TableState::default();
    state.select(selected);
    frame.render_stateful_widget(table, area, &mut state);
}

fn list_cells(record: &Record, is_active: bool) -> [String; 5] {
    [
        if is_active { ACTIVE_MARK } else { "" }.to_owned(),
        record.id.to_string(),
        record
            .scheduled_on
            .map(format_iso_date)
            .unwrap_or_else(|| "-".to_owned()),
        record.status.as_str().to_owned(),
        record.contact_name.clone(),
    ]
}

fn list_title(controller: &ReviewController<Record>) -> String {
    let total = controller.view().len();
    match controller.render_window() {
        Some(window) if window.windowed => {
            format!("records ({} of {total} shown)", window.len())
        }
        _ => format!("records ({total})"),
    }
}

fn address_text(controller: &ReviewController<Record>, view_data: &ViewData) -> String {
    if let InputMode::Address(buffer) = &view_data.input {
        return format!("go to: {buffer}_");
    }
    let back = if view_data.history.can_go_back() { "<" } else { " " };
    let forward = if view_data.history.can_go_forward() {
        ">"
    } else {
        " "
    };
    let loading = if controller.fetch_in_flight().is_some() || controller.lookup_in_flight().is_some()
    {
        "  (loading)"
    } else {
        ""
    };
    format!("{back}{forward} {}{loading}", controller.location())
}

fn filter_text(controller: &ReviewController<Record>) -> String {
    let filter = controller.filter();
    let status = filter.status.map_or("any", RecordStatus::label);
    let location = match filter.location_id {
        None => "any".to_owned(),
        Some(id) => known_locations(controller)
            .remove(&id)
            .unwrap_or_else(|| format!("#{id}")),
    };
    let search = if filter.search.is_empty() {
        "-"
    } else {
        filter.search.as_str()
    };
    let dates = match (filter.start_date, filter.end_date) {
        (None, None) => "any".to_owned(),
        (start, end) => format!(
            "{} .. {}",
            start.map_or_else(|| "open".to_owned(), format_iso_date),
            end.map_or_else(|| "open".to_owned(), format_iso_date),
        ),
    };
    format!(
        "status: {status} | location: {location} | search: {search} | dates: {dates} | active: {}",
        controller.active_filter_count()
    )
}

fn detail_text(record: &Record, position: Position) -> String {
    let mut lines = vec![
        format!("record {} ({})", record.id, position.label()),
        format!("status: {}", record.status.label()),
        format!(
            "scheduled: {}",
            record
                .scheduled_on
                .map_or_else(|| "unscheduled".to_owned(), format_iso_date)
        ),
        String::new(),
        format!(
            "contact: {} <{}> {}",
            record.contact_name, record.contact_email, record.contact_phone
        ),
    ];
    let requester = &record.requester;
    if !requester.display_name().is_empty() {
        lines.push(format!(
            "requester: {} ({}) {}",
            requester.display_name(),
            requester.company,
            requester.email
        ));
    }
    match &record.location {
        Some(location) => lines.push(format!(
            "location: {}, {}, {}",
            location.name, location.address, location.city
        )),
        None => lines.push("location: none".to_owned()),
    }
    if !record.notes.is_empty() {
        lines.push(String::new());
        lines.push(record.notes.clone());
    }
    lines.join("\n")
}

fn empty_text(controller: &ReviewController<Record>) -> String {
    if !controller.cache().is_loaded() {
        return "loading records".to_owned();
    }
    if let Some(id) = controller.pending_identity() {
        return format!("looking up record {id}");
    }
    "no records match the current filters (c clears dates, x resets all)".to_owned()
}

fn status_text(view_data: &ViewData) -> String {
    if view_data.help_visible {
        return String::new();
    }
    match &view_data.input {
        InputMode::Search(buffer) => {
            return format!("search: {buffer}_ | enter apply | esc cancel");
        }
        InputMode::Address(_) => return "enter go | esc cancel".to_owned(),
        InputMode::Normal => {}
    }
    let default = "j/k move | g/G ends | / search | s status | l location | [/] week | c dates | x reset | b/f history | : go | r/R reload | ? help | q quit";
    match &view_data.status_line {
        Some(status) => format!("{status} | {default}"),
        None => default.to_owned(),
    }
}

fn help_overlay_text() -> &'static str {
    "move: j/k or n/p next/previous | g/G first/last (never wraps)\n\
filters: / search | s cycle status | l cycle location | [/] shift dates a week\n\
filters: c clear dates | x reset all\n\
address: : or o type a path or URL | b/f back/forward\n\
data: r refresh record | R reload list\n\
global: ? help | q or ctrl+q quit"
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
