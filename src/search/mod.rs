//! Point to administrative-unit lookup with an expanding search window.

mod adaptive;

pub use adaptive::{AdaptiveSearch, SearchOutcome, SEARCH_MAP_LEVEL, SEARCH_MARGINS_M};
