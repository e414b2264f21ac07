// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use docket_app::{
    DateRange, Location, LocationId, Person, Record, RecordId, RecordStatus, Reviewable,
};
use std::path::PathBuf;
use time::{Date, Duration, Month};

const FIRST_NAMES: [&str; 16] = [
    "Avery", "Jordan", "Taylor", "Riley", "Morgan", "Casey", "Alex", "Quinn", "Parker", "Drew",
    "Kai", "Elliot", "Robin", "Cameron", "Hayden", "Rowan",
];
const LAST_NAMES: [&str; 18] = [
    "Walker", "Martin", "Hill", "Evans", "Lopez", "Gray", "Ward", "Young", "Diaz", "Reed",
    "Campbell", "Turner", "Flores", "Bennett", "Price", "Morris", "Foster", "Brooks",
];
const COMPANIES: [&str; 8] = [
    "Summit Events",
    "Harbor Logistics",
    "Greenleaf Catering",
    "Apex Media",
    "Heritage Foundation",
    "Bright Studio",
    "Central Robotics",
    "Eagle Partners",
];
const EMAIL_DOMAINS: [&str; 4] = ["example.com", "example.org", "mail.test", "corp.test"];
const STREET_NAMES: [&str; 10] = [
    "Cedar", "Maple", "Oak", "Pine", "Willow", "Elm", "Birch", "Juniper", "Sunset", "Ridge",
];
const SITES: [(&str, &str); 6] = [
    ("North Hall", "Austin"),
    ("Riverside Annex", "Seattle"),
    ("Lakeview Center", "Madison"),
    ("Old Mill", "Pittsburgh"),
    ("Canyon Lodge", "Tucson"),
    ("Harbor Pavilion", "Portland"),
];
const NOTE_WORDS: [&str; 16] = [
    "confirm",
    "catering",
    "parking",
    "setup",
    "projector",
    "seating",
    "access",
    "badge",
    "invoice",
    "deposit",
    "signage",
    "security",
    "follow",
    "up",
    "early",
    "late",
];

#[derive(Debug, Clone)]
struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    fn new(seed: u64) -> Self {
        let mut state = seed ^ 0x9E37_79B9_7F4A_7C15;
        if state == 0 {
            state = 0xA409_3822_299F_31D0;
        }
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);

        let mut x = self.state;
        x ^= x >> 13;
        x ^= x << 7;
        x ^= x >> 17;
        x
    }

    fn int_n(&mut self, n: usize) -> usize {
        if n <= 1 {
            return 0;
        }
        (self.next_u64() % (n as u64)) as usize
    }
}

/// Seeded generator for review records. Same seed, same records.
#[derive(Debug, Clone)]
pub struct RecordFaker {
    rng: DeterministicRng,
    seed: u64,
}

impl RecordFaker {
    pub fn new(seed: u64) -> Self {
        let normalized = if seed == 0 { 1 } else { seed };
        Self {
            rng: DeterministicRng::new(normalized),
            seed: normalized,
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn int_n(&mut self, n: usize) -> usize {
        self.rng.int_n(n)
    }

    pub fn person(&mut self) -> Person {
        let first_name = self.pick(&FIRST_NAMES).to_owned();
        let last_name = self.pick(&LAST_NAMES).to_owned();
        let email = format!(
            "{}.{}@{}",
            first_name.to_lowercase(),
            last_name.to_lowercase(),
            self.pick(&EMAIL_DOMAINS)
        );
        Person {
            phone: self.phone(),
            company: self.pick(&COMPANIES).to_owned(),
            first_name,
            last_name,
            email,
        }
    }

    pub fn location(&mut self) -> Location {
        let all = locations();
        let index = self.rng.int_n(all.len());
        all.into_iter()
            .nth(index)
            .unwrap_or_else(|| site_location(0))
    }

    /// A record scheduled within a few weeks of `around`; roughly one in ten
    /// has no date at all.
    pub fn record(&mut self, id: i64, around: Date) -> Record {
        let status = RecordStatus::ALL[self.rng.int_n(RecordStatus::ALL.len())];
        let scheduled_on = if self.rng.int_n(10) == 0 {
            None
        } else {
            let offset = self.int_range(-14, 21);
            around.checked_add(Duration::days(offset))
        };
        let contact = self.person();
        let location = if self.rng.int_n(8) == 0 {
            None
        } else {
            Some(self.location())
        };

        Record {
            id: RecordId::new(id),
            status,
            scheduled_on,
            contact_name: contact.display_name(),
            contact_email: contact.email,
            contact_phone: contact.phone,
            requester: self.person(),
            location,
            notes: self.sentence(3, 8),
        }
    }

    /// `count` records with ids `1..=count`.
    pub fn records(&mut self, count: usize, around: Date) -> Vec<Record> {
        (1..=count as i64)
            .map(|id| self.record(id, around))
            .collect()
    }

    fn pick<'a>(&mut self, items: &'a [&'a str]) -> &'a str {
        items[self.rng.int_n(items.len())]
    }

    fn int_range(&mut self, min: i64, max: i64) -> i64 {
        if max <= min {
            return min;
        }
        let span = max - min + 1;
        min + (self.rng.next_u64() % (span as u64)) as i64
    }

    fn phone(&mut self) -> String {
        format!(
            "555-{:03}-{:04}",
            self.int_range(100, 999),
            self.int_range(0, 9999)
        )
    }

    fn sentence(&mut self, min_words: usize, max_words: usize) -> String {
        let count = self.int_range(min_words as i64, max_words as i64) as usize;
        let mut parts = Vec::with_capacity(count);
        for _ in 0..count {
            parts.push(self.pick(&NOTE_WORDS).to_owned());
        }
        let mut sentence = parts.join(" ");
        if let Some(first) = sentence.get_mut(0..1) {
            first.make_ascii_uppercase();
        }
        sentence.push('.');
        sentence
    }
}

/// The fixed set of sites records are booked at.
pub fn locations() -> Vec<Location> {
    (0..SITES.len()).map(site_location).collect()
}

fn site_location(index: usize) -> Location {
    let (name, city) = SITES[index % SITES.len()];
    Location {
        id: LocationId::new(index as i64 + 1),
        name: name.to_owned(),
        address: format!(
            "{} {} St",
            100 + index * 37,
            STREET_NAMES[index % STREET_NAMES.len()]
        ),
        city: city.to_owned(),
    }
}

/// Record store standing in for the backend in tests and demo mode.
///
/// Range queries follow the server: a record without a date is only
/// returned for an unbounded range.
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    records: Vec<Record>,
}

impl InMemorySource {
    pub fn new(records: Vec<Record>) -> Self {
        Self { records }
    }

    pub fn seeded(seed: u64, count: usize, around: Date) -> Self {
        Self::new(RecordFaker::new(seed).records(count, around))
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn fetch_records(&self, range: DateRange) -> Vec<Record> {
        self.records
            .iter()
            .filter(|record| match record.review_date() {
                Some(date) => range.contains(date),
                None => !range.is_bounded(),
            })
            .cloned()
            .collect()
    }

    pub fn fetch_record(&self, id: RecordId) -> Option<Record> {
        self.records.iter().find(|record| record.id == id).cloned()
    }

    /// Inserts or replaces by identity.
    pub fn upsert(&mut self, record: Record) {
        match self.records.iter_mut().find(|existing| existing.id == record.id) {
            Some(existing) => *existing = record,
            None => self.records.push(record),
        }
    }

    pub fn delete(&mut self, id: RecordId) -> bool {
        let before = self.records.len();
        self.records.retain(|record| record.id != id);
        self.records.len() != before
    }
}

pub fn temp_config_path() -> Result<(tempfile::TempDir, PathBuf)> {
    let dir = tempfile::tempdir().context("create temp dir")?;
    let path = dir.path().join("config.toml");
    Ok((dir, path))
}

/// The "today" every fixture is built around.
pub fn fixture_today() -> Date {
    Date::from_calendar_date(2026, Month::May, 20).expect("valid calendar date")
}
