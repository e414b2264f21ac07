// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::ops::Range;

pub const DEFAULT_WINDOW_THRESHOLD: usize = 200;

/// Where the active record sits in the filtered view, 0-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub index: usize,
    pub total: usize,
}

impl Position {
    pub fn label(self) -> String {
        format!("{} / {}", self.index + 1, self.total)
    }
}

/// Positions of the view that should be instantiated for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderWindow {
    pub positions: Range<usize>,
    pub active: usize,
    pub windowed: bool,
}

impl RenderWindow {
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

/// Small views render whole; large ones only render the cursor and its
/// immediate neighbours so each step costs the same regardless of size.
pub fn render_window(len: usize, cursor: Option<usize>, threshold: usize) -> Option<RenderWindow> {
    let active = cursor.filter(|index| *index < len)?;
    if len <= threshold {
        return Some(RenderWindow {
            positions: 0..len,
            active,
            windowed: false,
        });
    }
    let start = active.saturating_sub(1);
    let end = (active + 2).min(len);
    Some(RenderWindow {
        positions: start..end,
        active,
        windowed: true,
    })
}
