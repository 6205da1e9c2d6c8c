//! geo.rs — spherical-Earth great-circle helpers
//!
//! Pure math, no error conditions. Everything the engine knows about
//! geodesy lives here: the destination-point formula used to plant
//! checkpoint regions, and the haversine distance used for travel logging.

use trailwatch_types::LatLon;

/// Mean Earth radius, meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Output coordinates are rounded to 9 decimal digits (~0.1 mm of
/// longitude at the equator) so that region-identifier comparisons stay
/// stable across recomputation instead of oscillating on floating-point
/// jitter.
const ROUND_FACTOR: f64 = 1e9;

fn round_deg(deg: f64) -> f64 {
    (deg * ROUND_FACTOR).round() / ROUND_FACTOR
}

/// Normalize a bearing into `[0, 360)`. Negative inputs wrap (−90 → 270).
pub fn normalize_bearing(deg: f64) -> f64 {
    deg.rem_euclid(360.0)
}

/// Great-circle destination point: the coordinate reached by travelling
/// `distance_m` meters from `origin` along `bearing_deg`.
///
/// Inputs and outputs are degrees; the computation runs in radians:
///
/// ```text
/// δ  = d / R
/// φ2 = asin( sin φ1 · cos δ + cos φ1 · sin δ · cos θ )
/// λ2 = λ1 + atan2( sin θ · sin δ · cos φ1, cos δ − sin φ1 · sin φ2 )
/// ```
pub fn destination_point(origin: LatLon, bearing_deg: f64, distance_m: f64) -> LatLon {
    let delta = distance_m / EARTH_RADIUS_M;
    let theta = normalize_bearing(bearing_deg).to_radians();
    let phi1 = origin.lat.to_radians();
    let lambda1 = origin.lon.to_radians();

    let phi2 = (phi1.sin() * delta.cos() + phi1.cos() * delta.sin() * theta.cos()).asin();
    let lambda2 = lambda1
        + (theta.sin() * delta.sin() * phi1.cos()).atan2(delta.cos() - phi1.sin() * phi2.sin());

    LatLon {
        lat: round_deg(phi2.to_degrees()),
        lon: round_deg(lambda2.to_degrees()),
    }
}

/// Haversine distance between two coordinates, meters.
pub fn distance_m(a: LatLon, b: LatLon) -> f64 {
    let phi1 = a.lat.to_radians();
    let phi2 = b.lat.to_radians();
    let dphi = (b.lat - a.lat).to_radians();
    let dlambda = (b.lon - a.lon).to_radians();

    let h = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * h.sqrt().asin()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearing_normalization() {
        assert_eq!(normalize_bearing(0.0), 0.0);
        assert_eq!(normalize_bearing(360.0), 0.0);
        assert_eq!(normalize_bearing(450.0), 90.0);
        assert_eq!(normalize_bearing(-90.0), 270.0);
        assert_eq!(normalize_bearing(-1.0), 359.0);
    }

    /// Travelling d at θ then d at θ+180 must return to the origin.
    #[test]
    fn destination_round_trip() {
        let origin = LatLon::new(45.0, 9.0);
        for bearing in (0..360).step_by(15) {
            for distance in [10.0, 150.0, 5_000.0] {
                let out = destination_point(origin, bearing as f64, distance);
                let back = destination_point(out, bearing as f64 + 180.0, distance);
                assert!(
                    (back.lat - origin.lat).abs() < 1e-6,
                    "lat drift at bearing {bearing}: {}",
                    back.lat
                );
                assert!(
                    (back.lon - origin.lon).abs() < 1e-6,
                    "lon drift at bearing {bearing}: {}",
                    back.lon
                );
            }
        }
    }

    /// Reference values for 150 m from (45, 9): δ = 150/6371000 rad.
    #[test]
    fn destination_reference_points() {
        let origin = LatLon::new(45.0, 9.0);

        let forward = destination_point(origin, 0.0, 150.0);
        assert!((forward.lat - 45.001348982).abs() < 1e-8);
        assert!((forward.lon - 9.0).abs() < 1e-8);

        let right = destination_point(origin, 90.0, 150.0);
        assert!((right.lat - 44.999999984).abs() < 1e-8);
        assert!((right.lon - 9.001907749).abs() < 1e-8);

        let left = destination_point(origin, -90.0, 150.0);
        assert!((left.lat - 44.999999984).abs() < 1e-8);
        assert!((left.lon - 8.998092251).abs() < 1e-8);
    }

    #[test]
    fn destination_output_is_rounded() {
        let out = destination_point(LatLon::new(45.0, 9.0), 37.0, 150.0);
        // 9 decimal digits: re-rounding is a no-op
        assert_eq!(out.lat, (out.lat * 1e9).round() / 1e9);
        assert_eq!(out.lon, (out.lon * 1e9).round() / 1e9);
    }

    #[test]
    fn haversine_matches_planted_distance() {
        let origin = LatLon::new(45.0, 9.0);
        for bearing in [0.0, 90.0, 180.0, 270.0, 37.0] {
            let out = destination_point(origin, bearing, 150.0);
            let d = distance_m(origin, out);
            assert!((d - 150.0).abs() < 0.01, "bearing {bearing}: {d} m");
        }
        assert_eq!(distance_m(origin, origin), 0.0);
    }
}
