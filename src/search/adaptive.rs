use std::time::Instant;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::ProxyError;
use crate::models::{BoundingBox, GeoPoint};
use crate::projection::wgs84_to_planar;
use crate::routing::RoutingTable;
use crate::upstream::HttpFetcher;

/// Half-widths tried in order; the first non-empty answer wins.
pub const SEARCH_MARGINS_M: [i64; 3] = [1000, 2000, 3000];
pub const SEARCH_MAP_LEVEL: u32 = 14;

/// Result of a completed search. An empty `records` is a valid outcome.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub records: Vec<Value>,
    /// Margin that produced `records`, if any did
    pub margin: Option<i64>,
    pub attempts: usize,
    /// Measured across the whole sequence
    pub elapsed_ms: u128,
}

pub struct AdaptiveSearch<'a> {
    routing: &'a RoutingTable,
    fetcher: &'a HttpFetcher,
}

impl<'a> AdaptiveSearch<'a> {
    pub fn new(routing: &'a RoutingTable, fetcher: &'a HttpFetcher) -> Self {
        Self { routing, fetcher }
    }

    /// Resolve `point`, widening the window after each empty or failed attempt.
    ///
    /// Attempts are sequential. A failed attempt never aborts the search; only a
    /// misconfigured lookup endpoint does.
    pub async fn resolve(&self, point: GeoPoint) -> Result<SearchOutcome, ProxyError> {
        let started = Instant::now();
        let center = wgs84_to_planar(point.lat, point.lng);

        debug!(
            "Adaptive search at ({}, {}) -> planar ({}, {})",
            point.lat, point.lng, center.x, center.y
        );

        for (attempt, margin) in SEARCH_MARGINS_M.iter().copied().enumerate() {
            let bbox = BoundingBox::around(center, margin, SEARCH_MAP_LEVEL);
            let descriptor = self.routing.admin_lookup(&bbox)?;

            let records = match self.fetcher.fetch(&descriptor).await {
                Ok(fetched) => match fetched.body {
                    Value::Array(items) => items,
                    other => {
                        debug!(
                            "Margin {}m returned a non-array body ({}), widening",
                            margin,
                            json_kind(&other)
                        );
                        Vec::new()
                    }
                },
                Err(e) => {
                    warn!("Margin {}m lookup failed, widening: {}", margin, e);
                    Vec::new()
                }
            };

            if !records.is_empty() {
                info!(
                    "Adaptive search found {} records at margin {}m",
                    records.len(),
                    margin
                );
                return Ok(SearchOutcome {
                    records,
                    margin: Some(margin),
                    attempts: attempt + 1,
                    elapsed_ms: started.elapsed().as_millis(),
                });
            }
        }

        info!(
            "Adaptive search found nothing within {}m",
            SEARCH_MARGINS_M[SEARCH_MARGINS_M.len() - 1]
        );

        Ok(SearchOutcome {
            records: Vec::new(),
            margin: None,
            attempts: SEARCH_MARGINS_M.len(),
            elapsed_ms: started.elapsed().as_millis(),
        })
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
