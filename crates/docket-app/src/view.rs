// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::{FilterState, RecordId, Reviewable};

/// Ordered identities of the records that pass the current filter.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilteredView {
    ids: Vec<RecordId>,
}

impl FilteredView {
    pub fn from_ids(ids: Vec<RecordId>) -> Self {
        Self { ids }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<RecordId> {
        self.ids.get(index).copied()
    }

    pub fn position(&self, id: RecordId) -> Option<usize> {
        self.ids.iter().position(|candidate| *candidate == id)
    }

    pub fn ids(&self) -> &[RecordId] {
        &self.ids
    }
}

/// Filters `records` in source order. Pure: equal inputs give equal views.
pub fn derive_view<R: Reviewable>(records: &[R], filter: &FilterState) -> FilteredView {
    let term = normalized_term(&filter.search);
    let ids = records
        .iter()
        .filter(|record| matches_filter(*record, filter, term.as_deref()))
        .map(Reviewable::record_id)
        .collect();
    FilteredView { ids }
}

pub fn matches_filter<R: Reviewable>(record: &R, filter: &FilterState, term: Option<&str>) -> bool {
    matches_status(record, filter)
        && matches_location(record, filter)
        && matches_dates(record, filter)
        && term.is_none_or(|term| matches_search(record, term))
}

fn matches_status<R: Reviewable>(record: &R, filter: &FilterState) -> bool {
    filter.status.is_none_or(|status| record.status() == status)
}

fn matches_location<R: Reviewable>(record: &R, filter: &FilterState) -> bool {
    filter
        .location_id
        .is_none_or(|location_id| record.location_id() == Some(location_id))
}

fn matches_dates<R: Reviewable>(record: &R, filter: &FilterState) -> bool {
    let range = filter.date_range();
    if !range.is_bounded() {
        return true;
    }
    record
        .review_date()
        .is_some_and(|date| range.contains(date))
}

/// `term` must already be lower-cased and trimmed.
pub fn matches_search<R: Reviewable>(record: &R, term: &str) -> bool {
    record
        .search_fields()
        .into_iter()
        .any(|field| field.to_lowercase().contains(term))
}

/// Lower-cased, trimmed search term, or `None` when it matches everything.
pub fn normalized_term(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::{FilteredView, derive_view, normalized_term};
    use crate::{
        FilterState, Location, LocationId, Person, Record, RecordId, RecordStatus,
    };
    use time::{Date, Month};

    fn day(d: u8) -> Date {
        Date::from_calendar_date(2026, Month::April, d).expect("valid date")
    }

    fn ids(view: &FilteredView) -> Vec<i64> {
        view.ids().iter().map(|id| id.get()).collect()
    }

    fn record(id: i64, status: RecordStatus, on: Option<Date>) -> Record {
        Record {
            scheduled_on: on,
            ..Record::bare(RecordId::new(id), status)
        }
    }

    fn ada_in_lyon() -> Record {
        Record {
            requester: Person {
                first_name: "Ada".to_owned(),
                ..Person::default()
            },
            location: Some(Location {
                id: LocationId::new(1),
                name: String::new(),
                address: String::new(),
                city: "Lyon".to_owned(),
            }),
            ..Record::bare(RecordId::new(5), RecordStatus::Pending)
        }
    }

    #[test]
    fn empty_filter_keeps_source_order() {
        let records = vec![
            record(3, RecordStatus::Pending, None),
            record(1, RecordStatus::Approved, None),
            record(2, RecordStatus::Rejected, None),
        ];
        let view = derive_view(&records, &FilterState::default());
        assert_eq!(ids(&view), vec![3, 1, 2]);
    }

    #[test]
    fn status_filter_is_exact() {
        let records = vec![
            record(1, RecordStatus::Pending, None),
            record(2, RecordStatus::Approved, None),
        ];
        let filter = FilterState {
            status: Some(RecordStatus::Approved),
            ..FilterState::default()
        };
        assert_eq!(ids(&derive_view(&records, &filter)), vec![2]);
    }

    #[test]
    fn location_filter_matches_nested_identity() {
        let mut with_location = ada_in_lyon();
        with_location.id = RecordId::new(8);
        let records = vec![record(7, RecordStatus::Pending, None), with_location];
        let filter = FilterState {
            location_id: Some(LocationId::new(1)),
            ..FilterState::default()
        };
        assert_eq!(ids(&derive_view(&records, &filter)), vec![8]);

        let other = FilterState {
            location_id: Some(LocationId::new(2)),
            ..FilterState::default()
        };
        assert!(derive_view(&records, &other).is_empty());
    }

    #[test]
    fn date_range_is_inclusive_and_open_ended() {
        let records = vec![
            record(1, RecordStatus::Pending, Some(day(1))),
            record(2, RecordStatus::Pending, Some(day(5))),
            record(3, RecordStatus::Pending, Some(day(9))),
            record(4, RecordStatus::Pending, None),
        ];

        let both = FilterState {
            start_date: Some(day(5)),
            end_date: Some(day(9)),
            ..FilterState::default()
        };
        assert_eq!(ids(&derive_view(&records, &both)), vec![2, 3]);

        let start_only = FilterState {
            start_date: Some(day(5)),
            ..FilterState::default()
        };
        assert_eq!(ids(&derive_view(&records, &start_only)), vec![2, 3]);

        let end_only = FilterState {
            end_date: Some(day(5)),
            ..FilterState::default()
        };
        assert_eq!(ids(&derive_view(&records, &end_only)), vec![1, 2]);

        assert_eq!(
            ids(&derive_view(&records, &FilterState::default())),
            vec![1, 2, 3, 4]
        );
    }

    #[test]
    fn search_matches_nested_fields_case_insensitively() {
        let records = vec![ada_in_lyon()];
        let lyon = FilterState {
            search: "lyon".to_owned(),
            ..FilterState::default()
        };
        assert_eq!(ids(&derive_view(&records, &lyon)), vec![5]);

        let ada = FilterState {
            search: "  ADA ".to_owned(),
            ..FilterState::default()
        };
        assert_eq!(ids(&derive_view(&records, &ada)), vec![5]);

        let miss = FilterState {
            search: "zzz".to_owned(),
            ..FilterState::default()
        };
        assert!(derive_view(&records, &miss).is_empty());
    }

    #[test]
    fn search_ignores_fields_outside_the_list() {
        let mut record = record(1, RecordStatus::Pending, None);
        record.notes = "secret phrase".to_owned();
        let filter = FilterState {
            search: "secret".to_owned(),
            ..FilterState::default()
        };
        assert!(derive_view(&[record], &filter).is_empty());
    }

    #[test]
    fn derive_is_idempotent() {
        let records = vec![
            ada_in_lyon(),
            record(1, RecordStatus::Approved, Some(day(2))),
        ];
        let filter = FilterState {
            search: "a".to_owned(),
            ..FilterState::default()
        };
        assert_eq!(derive_view(&records, &filter), derive_view(&records, &filter));
    }

    #[test]
    fn blank_terms_match_everything() {
        assert_eq!(normalized_term("   "), None);
        assert_eq!(normalized_term(" Mixed "), Some("mixed".to_owned()));
    }
}
