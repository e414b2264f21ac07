// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use docket_app::HistoryMode;

/// Browser-style session history of review locations.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct History {
    entries: Vec<String>,
    index: usize,
}

impl History {
    pub fn current(&self) -> Option<&str> {
        self.entries.get(self.index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn can_go_back(&self) -> bool {
        self.index > 0
    }

    pub fn can_go_forward(&self) -> bool {
        self.index + 1 < self.entries.len()
    }

    /// Drops any forward entries and appends `url`.
    pub fn push(&mut self, url: impl Into<String>) {
        let url = url.into();
        if self.current() == Some(url.as_str()) {
            return;
        }
        if !self.entries.is_empty() {
            self.entries.truncate(self.index + 1);
        }
        self.entries.push(url);
        self.index = self.entries.len() - 1;
    }

    pub fn replace(&mut self, url: impl Into<String>) {
        let url = url.into();
        match self.entries.get_mut(self.index) {
            Some(entry) => *entry = url,
            None => {
                self.entries.push(url);
                self.index = self.entries.len() - 1;
            }
        }
    }

    pub fn record(&mut self, url: impl Into<String>, mode: HistoryMode) {
        match mode {
            HistoryMode::Push => self.push(url),
            HistoryMode::Replace => self.replace(url),
        }
    }

    pub fn back(&mut self) -> Option<String> {
        if !self.can_go_back() {
            return None;
        }
        self.index -= 1;
        self.current().map(str::to_owned)
    }

    pub fn forward(&mut self) -> Option<String> {
        if !self.can_go_forward() {
            return None;
        }
        self.index += 1;
        self.current().map(str::to_owned)
    }
}
