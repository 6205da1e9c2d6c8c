//! walker.rs — synthetic pedestrian
//!
//! Advances a ground-truth position along a wandering course and produces
//! the noisy location fixes a real GNSS receiver would report. The true
//! position (noise-free) is what the provider checks region containment
//! against; only the reported fixes carry noise.

use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use serde::Deserialize;
use trailwatch_engine::geo;
use trailwatch_types::{LatLon, LocationFix};

#[derive(Debug, Clone, Deserialize)]
pub struct WalkConfig {
    pub start_lat: f64,
    pub start_lon: f64,
    pub course_deg: f64,
    pub speed_mps: f64,
    /// Per-tick Gaussian course wander, degrees (sigma).
    pub course_drift_deg: f64,
    /// Per-fix Gaussian position noise, meters (sigma).
    pub gps_noise_m: f64,
}

pub struct WalkerSim {
    /// Ground-truth position — what the world knows, not what GPS reports.
    pub position: LatLon,
    pub course_deg: f64,
    pub speed_mps: f64,
    pub t_elapsed: f64,
    course_drift: Normal<f64>,
    gps_noise: Normal<f64>,
    rng: StdRng,
}

impl WalkerSim {
    pub fn new(cfg: &WalkConfig, seed: Option<u64>) -> Self {
        Self {
            position: LatLon::new(cfg.start_lat, cfg.start_lon),
            course_deg: geo::normalize_bearing(cfg.course_deg),
            speed_mps: cfg.speed_mps,
            t_elapsed: 0.0,
            course_drift: Normal::new(0.0, cfg.course_drift_deg.max(1e-9))
                .expect("sigma is non-negative"),
            gps_noise: Normal::new(0.0, cfg.gps_noise_m.max(1e-9))
                .expect("sigma is non-negative"),
            rng: seed.map(StdRng::seed_from_u64).unwrap_or_else(StdRng::from_entropy),
        }
    }

    /// Advance the true position by `dt` seconds.
    pub fn tick(&mut self, dt: f64) {
        self.t_elapsed += dt;
        self.course_deg = geo::normalize_bearing(
            self.course_deg + self.course_drift.sample(&mut self.rng) * dt,
        );
        self.position =
            geo::destination_point(self.position, self.course_deg, self.speed_mps * dt);
    }

    /// What the receiver reports right now: true position plus noise.
    /// `with_course = false` mimics a receiver that lost its heading
    /// (negative course sentinel).
    pub fn report_fix(&mut self, with_course: bool) -> LocationFix {
        let noise_m = self.gps_noise.sample(&mut self.rng).abs();
        let noise_bearing = self.rng.gen_range(0.0..360.0);
        LocationFix {
            position: geo::destination_point(self.position, noise_bearing, noise_m),
            course_deg: if with_course { self.course_deg } else { -1.0 },
            speed_mps: self.speed_mps,
            timestamp_ms: Utc::now().timestamp_millis(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> WalkConfig {
        WalkConfig {
            start_lat: 45.0,
            start_lon: 9.0,
            course_deg: 0.0,
            speed_mps: 1.4,
            course_drift_deg: 0.0,
            gps_noise_m: 0.0,
        }
    }

    #[test]
    fn walker_covers_expected_ground() {
        let mut w = WalkerSim::new(&cfg(), Some(42));
        let start = w.position;
        for _ in 0..100 {
            w.tick(1.0);
        }
        // 100 s at 1.4 m/s due north, no drift
        let d = geo::distance_m(start, w.position);
        assert!((d - 140.0).abs() < 0.5, "covered {d} m");
        assert!(w.position.lat > start.lat);
        assert!((w.position.lon - start.lon).abs() < 1e-6);
    }

    #[test]
    fn noiseless_fix_reports_true_position() {
        let mut w = WalkerSim::new(&cfg(), Some(1));
        w.tick(1.0);
        let fix = w.report_fix(true);
        assert!(geo::distance_m(fix.position, w.position) < 0.01);
        assert_eq!(fix.course_deg, w.course_deg);
    }

    #[test]
    fn courseless_fix_uses_sentinel() {
        let mut w = WalkerSim::new(&cfg(), Some(1));
        let fix = w.report_fix(false);
        assert_eq!(fix.course_deg, -1.0);
    }
}
