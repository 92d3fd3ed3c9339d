//! Transverse-Mercator projection on the GRS80 ellipsoid, central belt
//! (origin 38°N 127°E, false easting 200 000 m, false northing 500 000 m).

use crate::models::{GeoPoint, PlanarPoint};

const SEMI_MAJOR: f64 = 6_378_137.0;
const FLATTENING: f64 = 1.0 / 298.257_222_101;
const SCALE: f64 = 1.0;
const ORIGIN_LAT: f64 = 38.0;
const ORIGIN_LNG: f64 = 127.0;
const FALSE_EASTING: f64 = 200_000.0;
const FALSE_NORTHING: f64 = 500_000.0;

/// First eccentricity squared
fn e2() -> f64 {
    2.0 * FLATTENING - FLATTENING * FLATTENING
}

/// Second eccentricity squared
fn ep2() -> f64 {
    let e2 = e2();
    e2 / (1.0 - e2)
}

/// Meridional arc length from the equator to `phi` (radians), series to e^6.
fn meridian_arc(phi: f64) -> f64 {
    let e2 = e2();
    let e4 = e2 * e2;
    let e6 = e4 * e2;

    SEMI_MAJOR
        * ((1.0 - e2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0) * phi
            - (3.0 * e2 / 8.0 + 3.0 * e4 / 32.0 + 45.0 * e6 / 1024.0) * (2.0 * phi).sin()
            + (15.0 * e4 / 256.0 + 45.0 * e6 / 1024.0) * (4.0 * phi).sin()
            - (35.0 * e6 / 3072.0) * (6.0 * phi).sin())
}

/// Project a WGS84 coordinate onto the planar grid, rounded to whole meters.
pub fn wgs84_to_planar(lat: f64, lng: f64) -> PlanarPoint {
    let e2 = e2();
    let ep2 = ep2();

    let phi = lat.to_radians();
    let lambda = lng.to_radians();
    let lambda0 = ORIGIN_LNG.to_radians();

    let sin_phi = phi.sin();
    let cos_phi = phi.cos();
    let tan_phi = phi.tan();

    let n = SEMI_MAJOR / (1.0 - e2 * sin_phi * sin_phi).sqrt();
    let t = tan_phi * tan_phi;
    let c = ep2 * cos_phi * cos_phi;
    let a = (lambda - lambda0) * cos_phi;

    let m = meridian_arc(phi);
    let m0 = meridian_arc(ORIGIN_LAT.to_radians());

    let x = FALSE_EASTING
        + SCALE
            * n
            * (a + (1.0 - t + c) * a.powi(3) / 6.0
                + (5.0 - 18.0 * t + t * t + 72.0 * c - 58.0 * ep2) * a.powi(5) / 120.0);

    let y = FALSE_NORTHING
        + SCALE
            * (m - m0
                + n * tan_phi
                    * (a * a / 2.0
                        + (5.0 - t + 9.0 * c + 4.0 * c * c) * a.powi(4) / 24.0
                        + (61.0 - 58.0 * t + t * t + 600.0 * c - 330.0 * ep2) * a.powi(6)
                            / 720.0));

    PlanarPoint {
        x: x.round() as i64,
        y: y.round() as i64,
    }
}

/// Inverse of [`wgs84_to_planar`] via the footpoint latitude series.
pub fn planar_to_wgs84(x: i64, y: i64) -> GeoPoint {
    let e2 = e2();
    let ep2 = ep2();
    let e4 = e2 * e2;
    let e6 = e4 * e2;

    let m = meridian_arc(ORIGIN_LAT.to_radians()) + (y as f64 - FALSE_NORTHING) / SCALE;
    let mu = m / (SEMI_MAJOR * (1.0 - e2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0));

    let sqrt_one_minus = (1.0 - e2).sqrt();
    let e1 = (1.0 - sqrt_one_minus) / (1.0 + sqrt_one_minus);

    let phi1 = mu
        + (3.0 * e1 / 2.0 - 27.0 * e1.powi(3) / 32.0) * (2.0 * mu).sin()
        + (21.0 * e1 * e1 / 16.0 - 55.0 * e1.powi(4) / 32.0) * (4.0 * mu).sin()
        + (151.0 * e1.powi(3) / 96.0) * (6.0 * mu).sin()
        + (1097.0 * e1.powi(4) / 512.0) * (8.0 * mu).sin();

    let sin_phi1 = phi1.sin();
    let cos_phi1 = phi1.cos();
    let tan_phi1 = phi1.tan();

    let c1 = ep2 * cos_phi1 * cos_phi1;
    let t1 = tan_phi1 * tan_phi1;
    let denom = 1.0 - e2 * sin_phi1 * sin_phi1;
    let n1 = SEMI_MAJOR / denom.sqrt();
    let r1 = SEMI_MAJOR * (1.0 - e2) / denom.powf(1.5);
    let d = (x as f64 - FALSE_EASTING) / (n1 * SCALE);

    let phi = phi1
        - (n1 * tan_phi1 / r1)
            * (d * d / 2.0
                - (5.0 + 3.0 * t1 + 10.0 * c1 - 4.0 * c1 * c1 - 9.0 * ep2) * d.powi(4) / 24.0
                + (61.0 + 90.0 * t1 + 298.0 * c1 + 45.0 * t1 * t1 - 252.0 * ep2 - 3.0 * c1 * c1)
                    * d.powi(6)
                    / 720.0);

    let lambda = ORIGIN_LNG.to_radians()
        + (d - (1.0 + 2.0 * t1 + c1) * d.powi(3) / 6.0
            + (5.0 - 2.0 * c1 + 28.0 * t1 - 3.0 * c1 * c1 + 8.0 * ep2 + 24.0 * t1 * t1)
                * d.powi(5)
                / 120.0)
            / cos_phi1;

    GeoPoint {
        lat: phi.to_degrees(),
        lng: lambda.to_degrees(),
    }
}
