//! Integer-encoded longitude/latitude used by the local-search provider.

use crate::models::GeoPoint;

const SCALE: f64 = 1e7;

/// Decode `mapx`/`mapy` (degrees × 1e7 as decimal strings).
///
/// Returns `None` when either value is not an integer; callers attach no
/// coordinate in that case.
pub fn tm128_to_wgs84(mapx: &str, mapy: &str) -> Option<GeoPoint> {
    let x: i64 = mapx.trim().parse().ok()?;
    let y: i64 = mapy.trim().parse().ok()?;

    Some(GeoPoint {
        lat: y as f64 / SCALE,
        lng: x as f64 / SCALE,
    })
}
