//! Dispatch from a logical API identifier to a concrete upstream request.

mod table;

pub use table::{
    Route, RoutingTable, DEFAULT_MAP_LEVEL, DEFAULT_MARGIN_M, GIS_FILTER_PARAMS, LOCAL_SEARCH_PARAMS,
    MAX_MARGIN_M,
};
