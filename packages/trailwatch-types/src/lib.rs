//! # trailwatch-types
//!
//! Shared data model for the Trailwatch checkpoint-tracking engine.
//!
//! These types are used by:
//! - `engine-rust`: the geofence computation and region-lifecycle engine
//! - `packages/fix-simulator`: the synthetic walker that stands in for the
//!   platform location stack in development
//!
//! ## Conventions
//!
//! - Coordinates are WGS-84 degrees (`lat` north-positive, `lon`
//!   east-positive).
//! - Course is degrees clockwise from true north in `[0, 360)`. Receivers
//!   that cannot determine a heading report a negative course; consumers
//!   normalize modulo 360 before use.
//! - Timestamps are wall-clock epoch milliseconds (`i64`).

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ── Geographic Types ──────────────────────────────────────────────────────────

/// A WGS-84 coordinate pair, degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

impl LatLon {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

// ── Location Fix ──────────────────────────────────────────────────────────────

/// One position report from the location provider. Immutable snapshot:
/// consumed, optionally retained as the last known fix, then discarded.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationFix {
    pub position: LatLon,
    /// Direction of travel, degrees clockwise from true north.
    /// Negative when the receiver could not determine a heading.
    pub course_deg: f64,
    /// Ground speed in m/s (informational).
    pub speed_mps: f64,
    /// Wall-clock epoch milliseconds.
    pub timestamp_ms: i64,
}

impl LocationFix {
    /// Whether the receiver supplied a usable heading.
    pub fn has_course(&self) -> bool {
        self.course_deg >= 0.0
    }
}

// ── Checkpoint Ring Slots ─────────────────────────────────────────────────────

/// Position of a checkpoint region relative to the agent's course.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RegionSlot {
    /// Along the course, directly ahead.
    Forward,
    /// Course + 90°.
    Right,
    /// Course − 90°.
    Left,
}

impl RegionSlot {
    pub const ALL: [RegionSlot; 3] = [RegionSlot::Forward, RegionSlot::Right, RegionSlot::Left];

    /// Stable region identifier, unique within a ring.
    pub fn id(&self) -> &'static str {
        match self {
            RegionSlot::Forward => "forward",
            RegionSlot::Right => "right",
            RegionSlot::Left => "left",
        }
    }

    /// Bearing offset from the agent's course, degrees.
    pub fn bearing_offset_deg(&self) -> f64 {
        match self {
            RegionSlot::Forward => 0.0,
            RegionSlot::Right => 90.0,
            RegionSlot::Left => -90.0,
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|s| s.id() == id)
    }
}

// ── Geofence Regions ──────────────────────────────────────────────────────────

/// A circular area whose entry/exit the platform monitors and reports via
/// events, at lower power cost than continuous polling.
///
/// Invariants: `radius_m > 0`; `id` unique within the active set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeofenceRegion {
    pub id: String,
    pub center: LatLon,
    pub radius_m: f64,
    pub notify_on_entry: bool,
    pub notify_on_exit: bool,
}

/// One generation of monitored checkpoint regions (at most 3: forward,
/// right, left). A ring is always replaced atomically — the engine never
/// monitors a partial mix of an old and a new generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionSet {
    /// Registration epoch. Monotonically increasing across generations;
    /// region events are matched by identifier + epoch so that events tied
    /// to an already-replaced ring are discarded.
    pub epoch: u64,
    pub regions: Vec<GeofenceRegion>,
}

impl RegionSet {
    pub fn contains_id(&self, id: &str) -> bool {
        self.regions.iter().any(|r| r.id == id)
    }

    pub fn region(&self, id: &str) -> Option<&GeofenceRegion> {
        self.regions.iter().find(|r| r.id == id)
    }
}

// ── Region Transition Events ──────────────────────────────────────────────────

/// Direction of a reported region boundary crossing. The engine treats both
/// the same way — the agent passed a checkpoint — but the distinction is kept
/// for notifications and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CrossingKind {
    Enter,
    Exit,
}

impl CrossingKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CrossingKind::Enter => "entered",
            CrossingKind::Exit => "exited",
        }
    }
}

// ── Engine State ──────────────────────────────────────────────────────────────

/// Lifecycle phase of the tracking engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrackingPhase {
    /// Not tracking. Explicit start required.
    #[default]
    Idle,
    /// Continuous position updates flowing from the provider.
    ContinuousTracking,
    /// Continuous updates suspended; a checkpoint ring is registered and the
    /// platform wakes us on entry/exit.
    RegionMonitoring,
}

/// Queryable view of engine state. Owned exclusively by the engine facade;
/// external components read snapshots, never mutate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct EngineSnapshot {
    pub phase: TrackingPhase,
    pub last_fix: Option<LocationFix>,
    /// Currently registered checkpoint regions (empty outside
    /// `RegionMonitoring`).
    pub active_regions: Vec<GeofenceRegion>,
    /// Current registration epoch.
    pub epoch: u64,
    /// Region events dropped because they referred to a replaced ring.
    pub stale_events: u64,
    /// Set when the provider kept delivering empty fix lists past the retry
    /// cap; cleared by the next usable fix.
    pub stalled: bool,
    /// Most recent provider failure, if the engine went idle because of one.
    pub last_error: Option<String>,
}

// ── Errors ────────────────────────────────────────────────────────────────────

/// Failure taxonomy surfaced by the engine. Nothing here is fatal to the
/// host process.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TrackerError {
    /// Provider reports no location permission. The engine stays idle and
    /// does not retry on its own.
    #[error("location authorization denied")]
    AuthorizationDenied,
    /// Signal loss or hardware error. The engine returns to idle after
    /// best-effort region cleanup; the caller must explicitly restart.
    #[error("location provider failure: {0}")]
    ProviderFailure(String),
    /// Geofencing unsupported on this platform. Non-fatal: the engine
    /// degrades to continuous-only tracking.
    #[error("region monitoring unavailable")]
    RegionUnavailable,
    /// `start()` was called while the engine was already tracking.
    #[error("engine already running")]
    AlreadyRunning,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_ids_are_distinct() {
        let ids: Vec<&str> = RegionSlot::ALL.iter().map(|s| s.id()).collect();
        assert_eq!(ids, vec!["forward", "right", "left"]);
        for slot in RegionSlot::ALL {
            assert_eq!(RegionSlot::from_id(slot.id()), Some(slot));
        }
        assert_eq!(RegionSlot::from_id("backward"), None);
    }

    #[test]
    fn phase_serde_round_trip() {
        for phase in [
            TrackingPhase::Idle,
            TrackingPhase::ContinuousTracking,
            TrackingPhase::RegionMonitoring,
        ] {
            let json = serde_json::to_string(&phase).unwrap();
            let back: TrackingPhase = serde_json::from_str(&json).unwrap();
            assert_eq!(phase, back);
        }
    }

    #[test]
    fn fix_course_validity() {
        let mut fix = LocationFix {
            position: LatLon::new(45.0, 9.0),
            course_deg: 123.0,
            speed_mps: 1.4,
            timestamp_ms: 1_700_000_000_000,
        };
        assert!(fix.has_course());
        fix.course_deg = -1.0;
        assert!(!fix.has_course());
    }

    #[test]
    fn region_set_lookup_by_id() {
        let set = RegionSet {
            epoch: 3,
            regions: vec![GeofenceRegion {
                id: "forward".into(),
                center: LatLon::new(45.0, 9.0),
                radius_m: 100.0,
                notify_on_entry: true,
                notify_on_exit: true,
            }],
        };
        assert!(set.contains_id("forward"));
        assert!(!set.contains_id("right"));
        assert_eq!(set.region("forward").unwrap().radius_m, 100.0);
    }
}
