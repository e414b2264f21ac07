// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::collections::VecDeque;

use time::Date;

use crate::cursor::{self, CursorRequest, Resolution};
use crate::guard::{ReentrancyGuard, TransitionFlag, TransitionFlags};
use crate::navigation::{self, DEFAULT_WINDOW_THRESHOLD, Position, RenderWindow};
use crate::view::{FilteredView, derive_view, matches_filter};
use crate::{
    DateRange, DefaultWindow, FilterPatch, FilterState, LocationCodec, RecordCache, RecordId,
    Reviewable,
};

/// Hard stop for follow-up passes inside one settle. Well-formed settles
/// use at most three.
pub const PASS_LIMIT: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Deriving,
    Resolving,
    Rendering,
    SyncingUrl,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryMode {
    Push,
    Replace,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchReason {
    Navigation,
    FilterChange,
    Invalidated,
}

/// Identifies one list fetch. Results are applied only while `generation`
/// is still the newest issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    pub generation: u64,
    pub range: DateRange,
    pub reason: FetchReason,
}

/// Identifies one single-record fetch against a cache generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordTicket {
    pub id: RecordId,
    pub generation: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReviewCommand<R> {
    /// Page load or deep link.
    Load { url: String },
    /// Address bar edit or browser back/forward.
    NavigateUrl { url: String },
    SetFilter(FilterPatch),
    ClearDateFilters,
    ResetFilters,
    Next,
    Previous,
    JumpTo(RecordId),
    /// Something outside the review screen changed records.
    Invalidate,
    RefreshActive,
    RecordsLoaded {
        ticket: FetchTicket,
        result: Result<Vec<R>, String>,
    },
    RecordLoaded {
        ticket: RecordTicket,
        result: Result<Option<R>, String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewEvent {
    FiltersChanged(FilterState),
    /// Filters were reset so that a requested record stays visible.
    FiltersRevealed { identity: RecordId },
    CursorMoved {
        index: Option<usize>,
        identity: Option<RecordId>,
    },
    ActiveRecordRefreshed(RecordId),
    UrlWritten { url: String, mode: HistoryMode },
    FetchRequested(FetchTicket),
    RecordRefreshRequested(RecordTicket),
    StaleFetchDiscarded { generation: u64 },
    Notification(String),
    PassLimitReached,
    /// Always the last event of a dispatch.
    Settled { passes: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReviewConfig {
    pub today: Date,
    pub window: DefaultWindow,
    pub window_threshold: usize,
}

impl ReviewConfig {
    pub fn new(today: Date) -> Self {
        Self {
            today,
            window: DefaultWindow::default(),
            window_threshold: DEFAULT_WINDOW_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PendingSelection {
    id: RecordId,
    lookup_requested: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
    /// Keep the active record if it survived; otherwise go to the top.
    Keep,
    Identity { id: RecordId, allow_reveal: bool },
    Step(isize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Plan {
    target: Target,
    history: HistoryMode,
}

impl Plan {
    const fn new(target: Target, history: HistoryMode) -> Self {
        Self { target, history }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Pass<R> {
    Command(ReviewCommand<R>),
    Reveal { id: RecordId, history: HistoryMode },
    UrlObserved { url: String },
}

/// Keeps filter, cursor and address bar consistent across every trigger.
///
/// All mutation goes through [`ReviewController::dispatch`], which runs the
/// triggered pass plus any follow-ups it queues, then signals settle-complete
/// and returns what happened as [`ReviewEvent`]s. Network work is left to the
/// caller: `FetchRequested` and `RecordRefreshRequested` events carry tickets
/// that come back in `RecordsLoaded` / `RecordLoaded`.
#[derive(Debug)]
pub struct ReviewController<R> {
    cache: RecordCache<R>,
    codec: LocationCodec,
    filter: FilterState,
    view: FilteredView,
    view_dirty: bool,
    cursor: Option<usize>,
    active: Option<RecordId>,
    location: String,
    guard: ReentrancyGuard,
    phase: Phase,
    queue: VecDeque<Pass<R>>,
    pending: Option<PendingSelection>,
    fetch_generation: u64,
    in_flight: Option<FetchTicket>,
    lookup: Option<RecordTicket>,
    window_threshold: usize,
}

impl<R: Reviewable> ReviewController<R> {
    pub fn new(cache: RecordCache<R>, config: ReviewConfig) -> Self {
        let defaults = FilterState::with_window(config.today, config.window);
        Self {
            cache,
            filter: defaults.clone(),
            codec: LocationCodec::new(defaults),
            view: FilteredView::default(),
            view_dirty: true,
            cursor: None,
            active: None,
            location: String::new(),
            guard: ReentrancyGuard::default(),
            phase: Phase::Idle,
            queue: VecDeque::new(),
            pending: None,
            fetch_generation: 0,
            in_flight: None,
            lookup: None,
            window_threshold: config.window_threshold.max(1),
        }
    }

    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    pub fn defaults(&self) -> &FilterState {
        self.codec.defaults()
    }

    pub fn codec(&self) -> &LocationCodec {
        &self.codec
    }

    pub fn view(&self) -> &FilteredView {
        &self.view
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn active_id(&self) -> Option<RecordId> {
        self.active
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn flags(&self) -> TransitionFlags {
        self.guard.flags()
    }

    pub fn cache(&self) -> &RecordCache<R> {
        &self.cache
    }

    pub fn fetch_in_flight(&self) -> Option<FetchTicket> {
        self.in_flight
    }

    pub fn lookup_in_flight(&self) -> Option<RecordTicket> {
        self.lookup
    }

    pub fn pending_identity(&self) -> Option<RecordId> {
        self.pending.map(|pending| pending.id)
    }

    /// True while the address bar is intentionally left alone: nothing has
    /// loaded yet, or a requested record is still being looked up.
    pub fn is_awaiting(&self) -> bool {
        !self.cache.is_loaded() || self.pending.is_some()
    }

    pub fn active_filter_count(&self) -> usize {
        self.filter.active_count(self.codec.defaults())
    }

    pub fn current_record(&self) -> Option<&R> {
        self.active.and_then(|id| self.cache.get(id))
    }

    pub fn position(&self) -> Option<Position> {
        self.cursor.map(|index| Position {
            index,
            total: self.view.len(),
        })
    }

    /// Render hook: hands over the single record under the cursor.
    pub fn with_current<T>(&self, render: impl FnOnce(&R, Position) -> T) -> Option<T> {
        let record = self.current_record()?;
        let position = self.position()?;
        Some(render(record, position))
    }

    pub fn render_window(&self) -> Option<RenderWindow> {
        navigation::render_window(self.view.len(), self.cursor, self.window_threshold)
    }

    /// Records inside the render window, tagged with their view position.
    pub fn window_records(&self) -> Vec<(usize, &R)> {
        let Some(window) = self.render_window() else {
            return Vec::new();
        };
        window
            .positions
            .filter_map(|index| {
                let id = self.view.get(index)?;
                self.cache.get(id).map(|record| (index, record))
            })
            .collect()
    }

    pub fn load(&mut self, url: &str) -> Vec<ReviewEvent> {
        self.dispatch(ReviewCommand::Load {
            url: url.to_owned(),
        })
    }

    pub fn navigate(&mut self, url: &str) -> Vec<ReviewEvent> {
        self.dispatch(ReviewCommand::NavigateUrl {
            url: url.to_owned(),
        })
    }

    pub fn set_filter(&mut self, patch: FilterPatch) -> Vec<ReviewEvent> {
        self.dispatch(ReviewCommand::SetFilter(patch))
    }

    pub fn clear_date_filters(&mut self) -> Vec<ReviewEvent> {
        self.dispatch(ReviewCommand::ClearDateFilters)
    }

    pub fn next(&mut self) -> Vec<ReviewEvent> {
        self.dispatch(ReviewCommand::Next)
    }

    pub fn previous(&mut self) -> Vec<ReviewEvent> {
        self.dispatch(ReviewCommand::Previous)
    }

    pub fn jump_to(&mut self, id: RecordId) -> Vec<ReviewEvent> {
        self.dispatch(ReviewCommand::JumpTo(id))
    }

    pub fn invalidate(&mut self) -> Vec<ReviewEvent> {
        self.dispatch(ReviewCommand::Invalidate)
    }

    pub fn dispatch(&mut self, command: ReviewCommand<R>) -> Vec<ReviewEvent> {
        let mut events = Vec::new();
        self.queue.push_back(Pass::Command(command));

        let mut passes = 0;
        while let Some(pass) = self.queue.pop_front() {
            if passes == PASS_LIMIT {
                self.queue.clear();
                events.push(ReviewEvent::PassLimitReached);
                break;
            }
            passes += 1;
            self.run_pass(pass, &mut events);
            self.phase = Phase::Idle;
        }

        self.guard.settle();
        self.phase = Phase::Idle;
        events.push(ReviewEvent::Settled { passes });
        events
    }

    fn run_pass(&mut self, pass: Pass<R>, events: &mut Vec<ReviewEvent>) {
        match pass {
            Pass::Command(command) => self.run_command(command, events),
            Pass::Reveal { id, history } => self.reveal(id, history, events),
            Pass::UrlObserved { url } => {
                if self.guard.is_set(TransitionFlag::NavigatingUrl) || url == self.location {
                    return;
                }
                self.navigate_to(url, events);
            }
        }
    }

    fn run_command(&mut self, command: ReviewCommand<R>, events: &mut Vec<ReviewEvent>) {
        match command {
            ReviewCommand::Load { url } => {
                self.with_guard(TransitionFlag::InitialLoad, |ctl| ctl.navigate_to(url, events));
            }
            ReviewCommand::NavigateUrl { url } => {
                if url.trim() == self.location {
                    return;
                }
                self.navigate_to(url, events);
            }
            ReviewCommand::SetFilter(patch) => {
                self.change_filter(events, |filter, _| filter.apply(patch));
            }
            ReviewCommand::ClearDateFilters => {
                self.change_filter(events, |filter, _| filter.clear_dates());
            }
            ReviewCommand::ResetFilters => {
                self.change_filter(events, |filter, defaults| filter.reset(defaults));
            }
            ReviewCommand::Next => self.step(1, events),
            ReviewCommand::Previous => self.step(-1, events),
            ReviewCommand::JumpTo(id) => {
                self.pending = Some(PendingSelection {
                    id,
                    lookup_requested: false,
                });
                let plan = Plan::new(
                    Target::Identity {
                        id,
                        allow_reveal: true,
                    },
                    HistoryMode::Push,
                );
                self.run_pipeline(plan, events);
            }
            ReviewCommand::Invalidate => {
                self.cache.invalidate();
                self.lookup = None;
                if let Some(pending) = &mut self.pending {
                    pending.lookup_requested = false;
                }
                self.request_fetch(FetchReason::Invalidated, events);
            }
            ReviewCommand::RefreshActive => {
                if let Some(id) = self.active {
                    self.request_lookup(id, events);
                }
            }
            ReviewCommand::RecordsLoaded { ticket, result } => {
                self.records_loaded(ticket, result, events);
            }
            ReviewCommand::RecordLoaded { ticket, result } => {
                self.record_loaded(ticket, result, events);
            }
        }
    }

    fn navigate_to(&mut self, url: String, events: &mut Vec<ReviewEvent>) {
        self.guard.enter(TransitionFlag::NavigatingUrl);
        let url = url.trim().to_owned();
        let decoded = self.codec.decode(&url);
        self.location = url;

        if decoded.filter != self.filter {
            self.filter = decoded.filter;
            self.view_dirty = true;
            events.push(ReviewEvent::FiltersChanged(self.filter.clone()));
        }
        self.pending = decoded.identity.map(|id| PendingSelection {
            id,
            lookup_requested: false,
        });
        self.ensure_coverage(FetchReason::Navigation, events);

        let target = match decoded.identity {
            Some(id) => Target::Identity {
                id,
                allow_reveal: true,
            },
            None => Target::Keep,
        };
        self.run_pipeline(Plan::new(target, HistoryMode::Replace), events);
    }

    fn change_filter(
        &mut self,
        events: &mut Vec<ReviewEvent>,
        edit: impl FnOnce(&mut FilterState, &FilterState) -> bool,
    ) {
        self.guard.enter(TransitionFlag::ApplyingFilter);
        self.pending = None;
        let defaults = self.codec.defaults().clone();
        if !edit(&mut self.filter, &defaults) {
            return;
        }
        self.view_dirty = true;
        events.push(ReviewEvent::FiltersChanged(self.filter.clone()));
        self.ensure_coverage(FetchReason::FilterChange, events);
        self.run_pipeline(Plan::new(Target::Keep, HistoryMode::Replace), events);
    }

    /// Holds `flag` until the end of the current settle while `stage` runs.
    fn with_guard<T>(&mut self, flag: TransitionFlag, stage: impl FnOnce(&mut Self) -> T) -> T {
        self.guard.enter(flag);
        stage(self)
    }

    fn step(&mut self, delta: isize, events: &mut Vec<ReviewEvent>) {
        self.with_guard(TransitionFlag::ManualCursorMove, |ctl| {
            ctl.pending = None;
            if ctl.view.is_empty() && !ctl.view_dirty {
                return;
            }
            ctl.run_pipeline(Plan::new(Target::Step(delta), HistoryMode::Push), events);
        });
    }

    /// Filter a reveal of `id` switches to: the defaults, with the date
    /// bounds dropped when the default window still hides the record.
    fn reveal_filter(&self, id: RecordId) -> FilterState {
        let mut cleared = self.codec.defaults().clone();
        if let Some(record) = self.cache.get(id)
            && !matches_filter(record, &cleared, None)
        {
            cleared.clear_dates();
        }
        cleared
    }

    fn reveal(&mut self, id: RecordId, history: HistoryMode, events: &mut Vec<ReviewEvent>) {
        let cleared = self.reveal_filter(id);
        if cleared != self.filter {
            self.filter = cleared;
            self.view_dirty = true;
            events.push(ReviewEvent::FiltersChanged(self.filter.clone()));
        }
        events.push(ReviewEvent::FiltersRevealed { identity: id });
        self.ensure_coverage(FetchReason::Navigation, events);
        let plan = Plan::new(
            Target::Identity {
                id,
                allow_reveal: false,
            },
            history,
        );
        self.run_pipeline(plan, events);
    }

    fn records_loaded(
        &mut self,
        ticket: FetchTicket,
        result: Result<Vec<R>, String>,
        events: &mut Vec<ReviewEvent>,
    ) {
        if self.in_flight != Some(ticket) || ticket.generation != self.fetch_generation {
            events.push(ReviewEvent::StaleFetchDiscarded {
                generation: ticket.generation,
            });
            return;
        }
        self.in_flight = None;
        if !ticket.range.covers(&self.filter.date_range()) {
            events.push(ReviewEvent::StaleFetchDiscarded {
                generation: ticket.generation,
            });
            self.ensure_coverage(ticket.reason, events);
            return;
        }

        match result {
            Ok(records) => {
                self.cache.replace_all(records, ticket.range);
                self.view_dirty = true;
                let allow_reveal =
                    self.pending.is_some() || ticket.reason != FetchReason::FilterChange;
                let target = self.identity_target(allow_reveal);
                self.run_pipeline(Plan::new(target, HistoryMode::Replace), events);
            }
            Err(error) => {
                events.push(ReviewEvent::Notification(format!(
                    "load failed: {error}; showing last loaded records"
                )));
                if self.cache.is_loaded() && self.pending.take().is_some() {
                    let target = self.identity_target(false);
                    self.run_pipeline(Plan::new(target, HistoryMode::Replace), events);
                }
            }
        }
    }

    fn record_loaded(
        &mut self,
        ticket: RecordTicket,
        result: Result<Option<R>, String>,
        events: &mut Vec<ReviewEvent>,
    ) {
        if self.lookup != Some(ticket) || ticket.generation != self.cache.generation() {
            events.push(ReviewEvent::StaleFetchDiscarded {
                generation: ticket.generation,
            });
            return;
        }
        self.lookup = None;

        let was_active = self.active == Some(ticket.id);
        match result {
            Ok(Some(record)) => {
                self.cache.upsert(record);
                self.view_dirty = true;
                let target = self.identity_target(true);
                self.run_pipeline(Plan::new(target, HistoryMode::Replace), events);
                if was_active && self.active == Some(ticket.id) {
                    events.push(ReviewEvent::ActiveRecordRefreshed(ticket.id));
                }
            }
            Ok(None) => {
                if self.cache.remove(ticket.id).is_some() {
                    self.view_dirty = true;
                }
                if self.pending_identity() == Some(ticket.id) {
                    self.pending = None;
                }
                let target = self.identity_target(true);
                self.run_pipeline(Plan::new(target, HistoryMode::Replace), events);
            }
            Err(error) => {
                events.push(ReviewEvent::Notification(format!(
                    "refresh of record {} failed: {error}",
                    ticket.id
                )));
                if self.pending_identity() == Some(ticket.id) {
                    self.pending = None;
                    let target = self.identity_target(false);
                    self.run_pipeline(Plan::new(target, HistoryMode::Replace), events);
                }
            }
        }
    }

    fn identity_target(&self, allow_reveal: bool) -> Target {
        match self.pending_identity().or(self.active) {
            Some(id) => Target::Identity { id, allow_reveal },
            None => Target::Keep,
        }
    }

    fn ensure_coverage(&mut self, reason: FetchReason, events: &mut Vec<ReviewEvent>) {
        let needed = self.filter.date_range();
        let covered = match self.in_flight {
            Some(ticket) => ticket.range.covers(&needed),
            None => {
                !self.cache.is_stale()
                    && self
                        .cache
                        .loaded_range()
                        .is_some_and(|range| range.covers(&needed))
            }
        };
        if !covered {
            self.request_fetch(reason, events);
        }
    }

    fn request_fetch(&mut self, reason: FetchReason, events: &mut Vec<ReviewEvent>) {
        self.fetch_generation = self.fetch_generation.wrapping_add(1);
        let ticket = FetchTicket {
            generation: self.fetch_generation,
            range: self.filter.date_range(),
            reason,
        };
        self.in_flight = Some(ticket);
        events.push(ReviewEvent::FetchRequested(ticket));
    }

    fn request_lookup(&mut self, id: RecordId, events: &mut Vec<ReviewEvent>) {
        let ticket = RecordTicket {
            id,
            generation: self.cache.generation(),
        };
        self.lookup = Some(ticket);
        events.push(ReviewEvent::RecordRefreshRequested(ticket));
    }

    fn run_pipeline(&mut self, plan: Plan, events: &mut Vec<ReviewEvent>) {
        self.phase = Phase::Deriving;
        if self.view_dirty {
            self.view = derive_view(self.cache.records(), &self.filter);
            self.view_dirty = false;
        }

        self.phase = Phase::Resolving;
        let resolution = self.resolve(plan.target, events);
        let cursor = match resolution {
            Resolution::Reveal(id) => {
                self.queue.push_back(Pass::Reveal {
                    id,
                    history: plan.history,
                });
                return;
            }
            // Nothing is shown while the requested record is still on its way.
            _ if self.pending.is_some() => None,
            other => other.index(),
        };

        self.phase = Phase::Rendering;
        let active = cursor.and_then(|index| self.view.get(index));
        if (cursor, active) != (self.cursor, self.active) {
            events.push(ReviewEvent::CursorMoved {
                index: cursor,
                identity: active,
            });
        }
        self.cursor = cursor;
        self.active = active;

        self.phase = Phase::SyncingUrl;
        self.sync_url(plan.history, events);
    }

    fn resolve(&mut self, target: Target, events: &mut Vec<ReviewEvent>) -> Resolution {
        match target {
            Target::Step(delta) => match cursor::step(self.cursor, delta, self.view.len()) {
                Some(index) => Resolution::At(index),
                None => Resolution::Empty,
            },
            Target::Keep => cursor::resolve(
                &self.view,
                CursorRequest {
                    requested: self.active,
                    ..CursorRequest::none()
                },
            ),
            Target::Identity { id, allow_reveal } => {
                let known = self.cache.contains(id);
                let request = CursorRequest {
                    requested: Some(id),
                    known_unfiltered: known,
                    revealable: known && self.reveal_filter(id) != self.filter,
                    allow_reveal: allow_reveal
                        && !self.guard.is_set(TransitionFlag::ApplyingFilter),
                };
                let resolution = cursor::resolve(&self.view, request);
                self.settle_pending(id, known, resolution, events);
                resolution
            }
        }
    }

    fn settle_pending(
        &mut self,
        id: RecordId,
        known: bool,
        resolution: Resolution,
        events: &mut Vec<ReviewEvent>,
    ) {
        let Some(pending) = self.pending else {
            return;
        };
        if pending.id != id {
            return;
        }
        if known {
            if !matches!(resolution, Resolution::Reveal(_)) {
                self.pending = None;
            }
            return;
        }
        if self.in_flight.is_some() || !self.cache.is_loaded() {
            return;
        }
        if pending.lookup_requested {
            if self.lookup.is_none_or(|ticket| ticket.id != id) {
                self.pending = None;
            }
            return;
        }
        self.pending = Some(PendingSelection {
            id,
            lookup_requested: true,
        });
        self.request_lookup(id, events);
    }

    fn sync_url(&mut self, history: HistoryMode, events: &mut Vec<ReviewEvent>) {
        if self.is_awaiting() {
            return;
        }
        let encoded = self.codec.encode(&self.filter, self.active);
        if encoded == self.location {
            return;
        }
        let mode = if self.guard.is_set(TransitionFlag::NavigatingUrl) {
            HistoryMode::Replace
        } else {
            history
        };
        self.guard.enter(TransitionFlag::NavigatingUrl);
        self.location = encoded.clone();
        events.push(ReviewEvent::UrlWritten {
            url: encoded.clone(),
            mode,
        });
        // Routers report programmatic writes back as location changes.
        self.queue.push_back(Pass::UrlObserved { url: encoded });
    }
}
