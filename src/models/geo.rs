//! Point and box types shared by the projector and the routing table.

use serde::{Deserialize, Serialize};

/// Geographic point (WGS84)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    /// Build a point, rejecting values outside the WGS84 range.
    pub fn new(lat: f64, lng: f64) -> Option<Self> {
        if !lat.is_finite() || !lng.is_finite() {
            return None;
        }
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
            return None;
        }
        Some(Self { lat, lng })
    }
}

/// Planar point in meters on the central-belt transverse-Mercator grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanarPoint {
    pub x: i64,
    pub y: i64,
}

/// Square search window around a projected point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_x: i64,
    pub max_x: i64,
    pub min_y: i64,
    pub max_y: i64,
    pub map_level: u32,
}

impl BoundingBox {
    /// Box of half-width `margin` meters centered on `center`. Edges saturate
    /// instead of wrapping; callers bound `margin` before building a query.
    pub fn around(center: PlanarPoint, margin: i64, map_level: u32) -> Self {
        Self {
            min_x: center.x.saturating_sub(margin),
            max_x: center.x.saturating_add(margin),
            min_y: center.y.saturating_sub(margin),
            max_y: center.y.saturating_add(margin),
            map_level,
        }
    }

    pub fn width(&self) -> i64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> i64 {
        self.max_y - self.min_y
    }

    /// Query pairs understood by the administrative-boundary upstream.
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        vec![
            ("minXAxis".to_string(), self.min_x.to_string()),
            ("maxXAxis".to_string(), self.max_x.to_string()),
            ("minYAxis".to_string(), self.min_y.to_string()),
            ("maxYAxis".to_string(), self.max_y.to_string()),
            ("mapLevel".to_string(), self.map_level.to_string()),
        ]
    }
}
