// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::{FilteredView, RecordId};

/// Inputs for resolving which record the cursor should land on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CursorRequest {
    /// Identity the caller wants shown (URL path, jump target, or the record
    /// that was active before the view changed).
    pub requested: Option<RecordId>,
    /// The requested identity exists in the unfiltered record set.
    pub known_unfiltered: bool,
    /// Clearing filters for a reveal would change the current filter.
    pub revealable: bool,
    /// Whether clearing filters to reveal the requested record is permitted.
    pub allow_reveal: bool,
}

impl CursorRequest {
    pub const fn none() -> Self {
        Self {
            requested: None,
            known_unfiltered: false,
            revealable: false,
            allow_reveal: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    At(usize),
    Empty,
    /// The requested record is hidden by active filters; clear them and
    /// resolve again.
    Reveal(RecordId),
}

impl Resolution {
    pub const fn index(self) -> Option<usize> {
        match self {
            Self::At(index) => Some(index),
            Self::Empty | Self::Reveal(_) => None,
        }
    }
}

pub fn resolve(view: &FilteredView, request: CursorRequest) -> Resolution {
    if let Some(id) = request.requested {
        if let Some(index) = view.position(id) {
            return Resolution::At(index);
        }
        if request.known_unfiltered && request.revealable && request.allow_reveal {
            return Resolution::Reveal(id);
        }
    }
    first_or_empty(view)
}

pub fn first_or_empty(view: &FilteredView) -> Resolution {
    if view.is_empty() {
        Resolution::Empty
    } else {
        Resolution::At(0)
    }
}

/// Moves `cursor` by `delta`, clamped to the view. Never wraps. With no
/// cursor yet, any step lands on the first record.
pub fn step(cursor: Option<usize>, delta: isize, len: usize) -> Option<usize> {
    if len == 0 {
        return None;
    }
    let last = len - 1;
    let Some(current) = cursor.map(|index| index.min(last)) else {
        return Some(0);
    };
    let moved = current.saturating_add_signed(delta);
    Some(moved.min(last))
}

#[cfg(test)]
mod tests {
    use super::{CursorRequest, Resolution, resolve, step};
    use crate::{FilteredView, RecordId};

    fn view(ids: &[i64]) -> FilteredView {
        FilteredView::from_ids(ids.iter().copied().map(RecordId::new).collect())
    }

    fn request(id: i64) -> CursorRequest {
        CursorRequest {
            requested: Some(RecordId::new(id)),
            known_unfiltered: false,
            revealable: false,
            allow_reveal: true,
        }
    }

    #[test]
    fn present_identity_wins() {
        assert_eq!(resolve(&view(&[4, 9, 2]), request(2)), Resolution::At(2));
    }

    #[test]
    fn hidden_identity_requests_reveal_only_when_revealable_and_allowed() {
        let current = view(&[2]);
        let hidden = CursorRequest {
            known_unfiltered: true,
            revealable: true,
            ..request(1)
        };
        assert_eq!(resolve(&current, hidden), Resolution::Reveal(RecordId::new(1)));

        let disallowed = CursorRequest {
            allow_reveal: false,
            ..hidden
        };
        assert_eq!(resolve(&current, disallowed), Resolution::At(0));

        let already_cleared = CursorRequest {
            revealable: false,
            ..hidden
        };
        assert_eq!(resolve(&current, already_cleared), Resolution::At(0));
    }

    #[test]
    fn unknown_identity_falls_back_to_first_or_empty() {
        assert_eq!(resolve(&view(&[3, 4]), request(99)), Resolution::At(0));
        assert_eq!(resolve(&view(&[]), request(99)), Resolution::Empty);
        assert_eq!(resolve(&view(&[]), CursorRequest::none()), Resolution::Empty);
        assert_eq!(resolve(&view(&[8]), CursorRequest::none()), Resolution::At(0));
    }

    #[test]
    fn step_clamps_without_wrapping() {
        assert_eq!(step(Some(0), -1, 3), Some(0));
        assert_eq!(step(Some(2), 1, 3), Some(2));
        assert_eq!(step(Some(1), 1, 3), Some(2));
        assert_eq!(step(Some(1), -1, 3), Some(0));
        assert_eq!(step(None, 1, 0), None);
        assert_eq!(step(None, 1, 3), Some(0));
        assert_eq!(step(None, -1, 3), Some(0));
        assert_eq!(step(Some(7), -1, 3), Some(1));
    }
}
