// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Mapping between review state and the address bar.
//!
//! Paths look like `/records/review[/<id>]`; filters travel in the query as
//! `status`, `locationId`, `search`, `startDate` and `endDate`. Fields at
//! their default value are left out. An optional field that was cleared away
//! from a non-empty default is written with an empty value (`startDate=`),
//! which decodes back to `None`.

use url::Url;
use url::form_urlencoded;

use crate::{FilterState, LocationId, RecordId, RecordStatus, format_iso_date, parse_iso_date};

pub const REVIEW_PATH: &str = "/records/review";

const PARAM_STATUS: &str = "status";
const PARAM_LOCATION: &str = "locationId";
const PARAM_SEARCH: &str = "search";
const PARAM_START: &str = "startDate";
const PARAM_END: &str = "endDate";

const RESOLVE_BASE: &str = "http://docket.invalid/";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewLocation {
    pub filter: FilterState,
    pub identity: Option<RecordId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationCodec {
    defaults: FilterState,
}

impl LocationCodec {
    pub fn new(defaults: FilterState) -> Self {
        Self { defaults }
    }

    pub fn defaults(&self) -> &FilterState {
        &self.defaults
    }

    pub fn encode(&self, filter: &FilterState, identity: Option<RecordId>) -> String {
        let mut out = REVIEW_PATH.to_owned();
        if let Some(id) = identity {
            out.push('/');
            out.push_str(&id.to_string());
        }

        let mut query = form_urlencoded::Serializer::new(String::new());
        let mut has_query = false;
        let defaults = &self.defaults;

        if filter.status != defaults.status {
            query.append_pair(PARAM_STATUS, filter.status.map_or("", RecordStatus::as_str));
            has_query = true;
        }
        if filter.location_id != defaults.location_id {
            let value = filter
                .location_id
                .map(|id| id.to_string())
                .unwrap_or_default();
            query.append_pair(PARAM_LOCATION, &value);
            has_query = true;
        }
        if filter.search != defaults.search {
            query.append_pair(PARAM_SEARCH, &filter.search);
            has_query = true;
        }
        if filter.start_date != defaults.start_date {
            let value = filter.start_date.map(format_iso_date).unwrap_or_default();
            query.append_pair(PARAM_START, &value);
            has_query = true;
        }
        if filter.end_date != defaults.end_date {
            let value = filter.end_date.map(format_iso_date).unwrap_or_default();
            query.append_pair(PARAM_END, &value);
            has_query = true;
        }

        if has_query {
            out.push('?');
            out.push_str(&query.finish());
        }
        out
    }

    /// Never fails: anything unreadable falls back to its default, or to
    /// `None` for a present-but-malformed optional field.
    pub fn decode(&self, input: &str) -> ReviewLocation {
        let mut filter = self.defaults.clone();
        let Some(url) = parse_lenient(input) else {
            return ReviewLocation {
                filter,
                identity: None,
            };
        };

        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                PARAM_STATUS => filter.status = RecordStatus::parse(&value),
                PARAM_LOCATION => filter.location_id = LocationId::parse(&value),
                PARAM_SEARCH => filter.search = value.into_owned(),
                PARAM_START => filter.start_date = parse_iso_date(&value),
                PARAM_END => filter.end_date = parse_iso_date(&value),
                _ => {}
            }
        }

        ReviewLocation {
            filter,
            identity: identity_from_path(url.path()),
        }
    }
}

fn parse_lenient(input: &str) -> Option<Url> {
    let trimmed = input.trim();
    if let Ok(url) = Url::parse(trimmed) {
        return Some(url);
    }
    Url::parse(RESOLVE_BASE).ok()?.join(trimmed).ok()
}

fn identity_from_path(path: &str) -> Option<RecordId> {
    let rest = path.trim_end_matches('/').strip_prefix(REVIEW_PATH)?;
    let segment = rest.strip_prefix('/')?;
    if segment.contains('/') {
        return None;
    }
    RecordId::parse(segment)
}
