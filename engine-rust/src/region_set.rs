//! region_set.rs — checkpoint ring planning
//!
//! Turns the latest location fix into the next generation of monitored
//! regions: one checkpoint ahead of the agent and one to each side, all at
//! the same distance and radius. The planner is pure — registration,
//! replacement and the background-only policy live in the transition
//! handler.

use trailwatch_types::{GeofenceRegion, LocationFix, RegionSet, RegionSlot};

use crate::config::EngineConfig;
use crate::geo;

/// Plans the forward/right/left checkpoint ring around a fix.
#[derive(Debug, Clone)]
pub struct RingPlanner {
    distance_m: f64,
    radius_m: f64,
}

impl RingPlanner {
    pub fn new(cfg: &EngineConfig) -> Self {
        Self {
            distance_m: cfg.checkpoint_distance_m,
            radius_m: cfg.checkpoint_radius_m,
        }
    }

    /// Compute the ring for `fix`, tagged with the registration `epoch` it
    /// will be installed under. Always exactly 3 regions with distinct
    /// identifiers; the fix's course is normalized modulo 360 first, so a
    /// provider "unknown heading" sentinel of −1 plans as 359°.
    pub fn plan(&self, fix: &LocationFix, epoch: u64) -> RegionSet {
        let course = geo::normalize_bearing(fix.course_deg);
        let regions = RegionSlot::ALL
            .iter()
            .map(|slot| GeofenceRegion {
                id: slot.id().to_string(),
                center: geo::destination_point(
                    fix.position,
                    course + slot.bearing_offset_deg(),
                    self.distance_m,
                ),
                radius_m: self.radius_m,
                notify_on_entry: true,
                notify_on_exit: true,
            })
            .collect();
        RegionSet { epoch, regions }
    }
}
