// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};
use time::{Date, Duration};

use crate::{LocationId, RecordStatus};

pub const DEFAULT_DAYS_BEFORE: u16 = 1;
pub const DEFAULT_DAYS_AFTER: u16 = 7;

/// Inclusive date bounds; a missing bound is open on that side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct DateRange {
    pub start: Option<Date>,
    pub end: Option<Date>,
}

impl DateRange {
    pub const UNBOUNDED: Self = Self {
        start: None,
        end: None,
    };

    pub const fn new(start: Option<Date>, end: Option<Date>) -> Self {
        Self { start, end }
    }

    pub const fn is_bounded(&self) -> bool {
        self.start.is_some() || self.end.is_some()
    }

    pub fn contains(&self, date: Date) -> bool {
        self.start.is_none_or(|start| date >= start) && self.end.is_none_or(|end| date <= end)
    }

    /// True when every date inside `other` is also inside `self`.
    pub fn covers(&self, other: &DateRange) -> bool {
        let start_ok = match (self.start, other.start) {
            (None, _) => true,
            (Some(_), None) => false,
            (Some(outer), Some(inner)) => outer <= inner,
        };
        let end_ok = match (self.end, other.end) {
            (None, _) => true,
            (Some(_), None) => false,
            (Some(outer), Some(inner)) => inner <= outer,
        };
        start_ok && end_ok
    }
}

/// Rolling default window, `today - days_before ..= today + days_after`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DefaultWindow {
    pub days_before: u16,
    pub days_after: u16,
}

impl Default for DefaultWindow {
    fn default() -> Self {
        Self {
            days_before: DEFAULT_DAYS_BEFORE,
            days_after: DEFAULT_DAYS_AFTER,
        }
    }
}

impl DefaultWindow {
    pub fn range_for(self, today: Date) -> DateRange {
        let start = today
            .checked_sub(Duration::days(i64::from(self.days_before)))
            .unwrap_or(today);
        let end = today
            .checked_add(Duration::days(i64::from(self.days_after)))
            .unwrap_or(today);
        DateRange::new(Some(start), Some(end))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct FilterState {
    pub status: Option<RecordStatus>,
    pub location_id: Option<LocationId>,
    pub search: String,
    pub start_date: Option<Date>,
    pub end_date: Option<Date>,
}

impl FilterState {
    pub fn with_window(today: Date, window: DefaultWindow) -> Self {
        let range = window.range_for(today);
        Self {
            start_date: range.start,
            end_date: range.end,
            ..Self::default()
        }
    }

    pub const fn date_range(&self) -> DateRange {
        DateRange::new(self.start_date, self.end_date)
    }

    /// Merges `patch` and reports whether anything changed.
    pub fn apply(&mut self, patch: FilterPatch) -> bool {
        let before = self.clone();
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(location_id) = patch.location_id {
            self.location_id = location_id;
        }
        if let Some(search) = patch.search {
            self.search = search;
        }
        if let Some(start_date) = patch.start_date {
            self.start_date = start_date;
        }
        if let Some(end_date) = patch.end_date {
            self.end_date = end_date;
        }
        *self != before
    }

    pub fn clear_dates(&mut self) -> bool {
        let changed = self.start_date.is_some() || self.end_date.is_some();
        self.start_date = None;
        self.end_date = None;
        changed
    }

    pub fn reset(&mut self, defaults: &FilterState) -> bool {
        let changed = *self != *defaults;
        *self = defaults.clone();
        changed
    }

    /// Number of fields that differ from `defaults`.
    pub fn active_count(&self, defaults: &FilterState) -> usize {
        [
            self.status != defaults.status,
            self.location_id != defaults.location_id,
            self.search != defaults.search,
            self.start_date != defaults.start_date,
            self.end_date != defaults.end_date,
        ]
        .into_iter()
        .filter(|differs| *differs)
        .count()
    }

    pub fn has_active(&self, defaults: &FilterState) -> bool {
        self.active_count(defaults) > 0
    }
}

/// A partial filter update. `None` leaves a field alone; `Some(None)` clears
/// an optional field.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterPatch {
    pub status: Option<Option<RecordStatus>>,
    pub location_id: Option<Option<LocationId>>,
    pub search: Option<String>,
    pub start_date: Option<Option<Date>>,
    pub end_date: Option<Option<Date>>,
}

impl FilterPatch {
    pub fn status(mut self, status: Option<RecordStatus>) -> Self {
        self.status = Some(status);
        self
    }

    pub fn location(mut self, location_id: Option<LocationId>) -> Self {
        self.location_id = Some(location_id);
        self
    }

    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    pub fn dates(mut self, range: DateRange) -> Self {
        self.start_date = Some(range.start);
        self.end_date = Some(range.end);
        self
    }

    pub fn start_date(mut self, date: Option<Date>) -> Self {
        self.start_date = Some(date);
        self
    }

    pub fn end_date(mut self, date: Option<Date>) -> Self {
        self.end_date = Some(date);
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::{DateRange, DefaultWindow, FilterPatch, FilterState};
    use crate::{LocationId, RecordStatus};
    use time::{Date, Month};

    fn day(d: u8) -> Date {
        Date::from_calendar_date(2026, Month::March, d).expect("valid date")
    }

    #[test]
    fn default_window_spans_yesterday_to_next_week() {
        let filter = FilterState::with_window(day(10), DefaultWindow::default());
        assert_eq!(filter.start_date, Some(day(9)));
        assert_eq!(filter.end_date, Some(day(17)));
        assert!(filter.search.is_empty());
        assert!(filter.status.is_none());
    }

    #[test]
    fn apply_merges_only_present_fields() {
        let mut filter = FilterState::with_window(day(10), DefaultWindow::default());
        let changed = filter.apply(
            FilterPatch::default()
                .status(Some(RecordStatus::Approved))
                .search("acme"),
        );
        assert!(changed);
        assert_eq!(filter.status, Some(RecordStatus::Approved));
        assert_eq!(filter.search, "acme");
        assert_eq!(filter.start_date, Some(day(9)));

        let unchanged = filter.apply(FilterPatch::default().status(Some(RecordStatus::Approved)));
        assert!(!unchanged);

        filter.apply(FilterPatch::default().status(None).location(Some(LocationId::new(4))));
        assert_eq!(filter.status, None);
        assert_eq!(filter.location_id, Some(LocationId::new(4)));
    }

    #[test]
    fn reset_restores_defaults_once() {
        let defaults = FilterState::with_window(day(10), DefaultWindow::default());
        let mut filter = defaults.clone();
        filter.apply(FilterPatch::default().search("acme").start_date(None));
        assert!(filter.reset(&defaults));
        assert_eq!(filter, defaults);
        assert!(!filter.reset(&defaults));
    }

    #[test]
    fn clear_dates_nulls_both_bounds() {
        let mut filter = FilterState::with_window(day(10), DefaultWindow::default());
        assert!(filter.clear_dates());
        assert_eq!(filter.date_range(), DateRange::UNBOUNDED);
        assert!(!filter.clear_dates());
    }

    #[test]
    fn active_count_compares_against_defaults() {
        let defaults = FilterState::with_window(day(10), DefaultWindow::default());
        let mut filter = defaults.clone();
        assert!(!filter.has_active(&defaults));
        filter.clear_dates();
        assert_eq!(filter.active_count(&defaults), 2);
        filter.search = "x".to_owned();
        assert_eq!(filter.active_count(&defaults), 3);
    }

    #[test]
    fn range_contains_is_inclusive_and_open_ended() {
        let both = DateRange::new(Some(day(5)), Some(day(8)));
        assert!(both.contains(day(5)));
        assert!(both.contains(day(8)));
        assert!(!both.contains(day(9)));

        let start_only = DateRange::new(Some(day(5)), None);
        assert!(start_only.contains(day(28)));
        assert!(!start_only.contains(day(4)));

        let end_only = DateRange::new(None, Some(day(5)));
        assert!(end_only.contains(day(1)));
        assert!(!end_only.contains(day(6)));
    }

    #[test]
    fn covers_handles_open_bounds() {
        let wide = DateRange::new(Some(day(1)), Some(day(20)));
        assert!(wide.covers(&DateRange::new(Some(day(2)), Some(day(19)))));
        assert!(!wide.covers(&DateRange::new(Some(day(2)), None)));
        assert!(!wide.covers(&DateRange::new(Some(day(2)), Some(day(21)))));
        assert!(DateRange::UNBOUNDED.covers(&wide));
        assert!(!wide.covers(&DateRange::UNBOUNDED));
    }
}
