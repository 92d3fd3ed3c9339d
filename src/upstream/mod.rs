//! Outbound HTTP to upstream providers.

mod fetcher;

pub use fetcher::{Fetched, HttpFetcher};
