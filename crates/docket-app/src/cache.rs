// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::collections::HashMap;

use crate::{DateRange, RecordId, Reviewable};

/// Identity-keyed record store shared by the review screen.
///
/// Keeps source order. `invalidate` marks the contents stale and bumps the
/// generation, but the records stay readable until a reload replaces them.
#[derive(Debug, Clone)]
pub struct RecordCache<R> {
    records: Vec<R>,
    index: HashMap<RecordId, usize>,
    generation: u64,
    loaded_range: Option<DateRange>,
    stale: bool,
}

impl<R> Default for RecordCache<R> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            index: HashMap::new(),
            generation: 0,
            loaded_range: None,
            stale: false,
        }
    }
}

impl<R: Reviewable> RecordCache<R> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<R>, range: DateRange) -> Self {
        let mut cache = Self::new();
        cache.replace_all(records, range);
        cache
    }

    pub fn records(&self) -> &[R] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: RecordId) -> Option<&R> {
        self.index.get(&id).and_then(|slot| self.records.get(*slot))
    }

    pub fn contains(&self, id: RecordId) -> bool {
        self.index.contains_key(&id)
    }

    /// True once any list load has landed.
    pub fn is_loaded(&self) -> bool {
        self.loaded_range.is_some()
    }

    pub fn loaded_range(&self) -> Option<DateRange> {
        self.loaded_range
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_stale(&self) -> bool {
        self.stale
    }

    /// Replaces the contents with a fresh load. Duplicate identities keep the
    /// first position and the last payload.
    pub fn replace_all(&mut self, records: Vec<R>, range: DateRange) {
        self.records.clear();
        self.index.clear();
        for record in records {
            self.upsert(record);
        }
        self.loaded_range = Some(range);
        self.stale = false;
    }

    /// Inserts or replaces one record; returns true when it was new.
    pub fn upsert(&mut self, record: R) -> bool {
        let id = record.record_id();
        match self.index.get(&id) {
            Some(slot) => {
                self.records[*slot] = record;
                false
            }
            None => {
                self.index.insert(id, self.records.len());
                self.records.push(record);
                true
            }
        }
    }

    pub fn remove(&mut self, id: RecordId) -> Option<R> {
        let slot = self.index.remove(&id)?;
        let removed = self.records.remove(slot);
        for position in self.index.values_mut() {
            if *position > slot {
                *position -= 1;
            }
        }
        Some(removed)
    }

    /// Marks the contents stale and returns the new generation.
    pub fn invalidate(&mut self) -> u64 {
        self.generation = self.generation.wrapping_add(1);
        self.stale = true;
        self.generation
    }
}

#[cfg(test)]
mod tests {
    use super::RecordCache;
    use crate::{DateRange, Record, RecordId, RecordStatus};

    fn record(id: i64, status: RecordStatus) -> Record {
        Record::bare(RecordId::new(id), status)
    }

    fn ids(cache: &RecordCache<Record>) -> Vec<i64> {
        cache.records().iter().map(|record| record.id.get()).collect()
    }

    #[test]
    fn replace_all_dedupes_and_keeps_order() {
        let cache = RecordCache::with_records(
            vec![
                record(3, RecordStatus::Pending),
                record(1, RecordStatus::Pending),
                record(3, RecordStatus::Approved),
            ],
            DateRange::UNBOUNDED,
        );
        assert_eq!(ids(&cache), vec![3, 1]);
        assert_eq!(
            cache.get(RecordId::new(3)).map(|record| record.status),
            Some(RecordStatus::Approved)
        );
        assert!(cache.is_loaded());
    }

    #[test]
    fn remove_reindexes_following_records() {
        let mut cache = RecordCache::with_records(
            vec![
                record(1, RecordStatus::Pending),
                record(2, RecordStatus::Pending),
                record(3, RecordStatus::Pending),
            ],
            DateRange::UNBOUNDED,
        );
        assert!(cache.remove(RecordId::new(1)).is_some());
        assert!(cache.remove(RecordId::new(1)).is_none());
        assert_eq!(cache.get(RecordId::new(3)).map(|r| r.id.get()), Some(3));
        assert_eq!(ids(&cache), vec![2, 3]);
    }

    #[test]
    fn invalidate_keeps_records_but_marks_stale() {
        let mut cache =
            RecordCache::with_records(vec![record(1, RecordStatus::Pending)], DateRange::UNBOUNDED);
        let generation = cache.invalidate();
        assert_eq!(generation, 1);
        assert!(cache.is_stale());
        assert_eq!(cache.len(), 1);

        cache.replace_all(vec![], DateRange::UNBOUNDED);
        assert!(!cache.is_stale());
        assert_eq!(cache.generation(), 1);
    }

    #[test]
    fn upsert_reports_new_entries() {
        let mut cache = RecordCache::new();
        assert!(!cache.is_loaded());
        assert!(cache.upsert(record(5, RecordStatus::Pending)));
        assert!(!cache.upsert(record(5, RecordStatus::Completed)));
        assert_eq!(cache.len(), 1);
    }
}
