//! Geogate - a geospatial data-aggregation proxy
//!
//! Accepts point, radius, administrative-code and free-text queries, converts
//! coordinates between reference systems and forwards the request to one of
//! several Korean open-data providers, returning normalized JSON.

pub mod config;
pub mod credentials;
pub mod error;
pub mod gateway;
pub mod models;
pub mod normalize;
pub mod projection;
pub mod routing;
pub mod search;
pub mod upstream;

pub use error::ProxyError;
pub use models::{GeoPoint, PlanarPoint, ProxyResult};
