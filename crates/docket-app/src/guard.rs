// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransitionFlag {
    NavigatingUrl,
    ApplyingFilter,
    ManualCursorMove,
    InitialLoad,
}

impl TransitionFlag {
    pub const ALL: [Self; 4] = [
        Self::NavigatingUrl,
        Self::ApplyingFilter,
        Self::ManualCursorMove,
        Self::InitialLoad,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TransitionFlags {
    pub navigating_url: bool,
    pub applying_filter: bool,
    pub manual_cursor_move: bool,
    pub initial_load: bool,
}

impl TransitionFlags {
    pub const fn get(&self, flag: TransitionFlag) -> bool {
        match flag {
            TransitionFlag::NavigatingUrl => self.navigating_url,
            TransitionFlag::ApplyingFilter => self.applying_filter,
            TransitionFlag::ManualCursorMove => self.manual_cursor_move,
            TransitionFlag::InitialLoad => self.initial_load,
        }
    }

    fn set(&mut self, flag: TransitionFlag, value: bool) {
        match flag {
            TransitionFlag::NavigatingUrl => self.navigating_url = value,
            TransitionFlag::ApplyingFilter => self.applying_filter = value,
            TransitionFlag::ManualCursorMove => self.manual_cursor_move = value,
            TransitionFlag::InitialLoad => self.initial_load = value,
        }
    }

    pub fn any(&self) -> bool {
        TransitionFlag::ALL.into_iter().any(|flag| self.get(flag))
    }
}

/// Holds transition flags for the length of one settle.
///
/// `enter` raises a flag immediately; release happens only when `settle`
/// is called after the last queued pass has run, so follow-up passes
/// triggered by the first one still see it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReentrancyGuard {
    flags: TransitionFlags,
    scheduled: Vec<TransitionFlag>,
}

impl ReentrancyGuard {
    pub fn flags(&self) -> TransitionFlags {
        self.flags
    }

    pub fn is_set(&self, flag: TransitionFlag) -> bool {
        self.flags.get(flag)
    }

    pub fn enter(&mut self, flag: TransitionFlag) {
        self.flags.set(flag, true);
        if !self.scheduled.contains(&flag) {
            self.scheduled.push(flag);
        }
    }

    /// Settle-complete signal: releases every flag raised since the last call.
    pub fn settle(&mut self) -> Vec<TransitionFlag> {
        let released = std::mem::take(&mut self.scheduled);
        for flag in &released {
            self.flags.set(*flag, false);
        }
        released
    }
}
