// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod cache;
pub mod controller;
pub mod cursor;
pub mod filter;
pub mod guard;
pub mod ids;
pub mod location;
pub mod model;
pub mod navigation;
pub mod view;

pub use cache::*;
pub use controller::*;
pub use cursor::{CursorRequest, Resolution};
pub use filter::*;
pub use guard::*;
pub use ids::*;
pub use location::*;
pub use model::*;
pub use navigation::*;
pub use view::{FilteredView, derive_view, matches_filter, matches_search, normalized_term};
