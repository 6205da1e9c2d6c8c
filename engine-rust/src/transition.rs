//! transition.rs — region-lifecycle state machine
//!
//! The reactive core of the engine. Synchronous by design: every input
//! (start, stop, fix, region event, provider error) returns the list of
//! [`Directive`]s the async shell must perform against the collaborators.
//! The shell serializes all inputs through one queue, so this struct is
//! never touched concurrently and holds no locks.
//!
//! Phases: `Idle` → `ContinuousTracking` → `RegionMonitoring` and back.
//! While backgrounded, every usable fix replaces the checkpoint ring
//! atomically and suspends continuous updates; any region entry/exit tears
//! the whole ring down and resumes them — an unbounded cycle that only an
//! explicit stop, a provider failure, or a background deadline ends.

use tracing::{debug, info, warn};
use trailwatch_types::{
    CrossingKind, EngineSnapshot, GeofenceRegion, LocationFix, RegionSet, TrackingPhase,
};

use crate::config::EngineConfig;
use crate::geo;
use crate::region_set::RingPlanner;

// ── Directives ────────────────────────────────────────────────────────────────

/// Work the state machine asks the shell to perform. Fire-and-forget: the
/// machine never awaits completion, and ordering within one returned list
/// is the atomic-replacement guarantee (old ring fully unregistered before
/// the new one is registered).
#[derive(Debug, Clone, PartialEq)]
pub enum Directive {
    StartContinuousUpdates,
    StopContinuousUpdates,
    UnregisterRegions(Vec<GeofenceRegion>),
    RegisterRegions(RegionSet),
    ScheduleNotification { message: String },
    CancelNotifications,
}

/// Provider environment sampled at the moment a fix arrives.
#[derive(Debug, Clone, Copy)]
pub struct FixContext {
    pub backgrounded: bool,
    pub monitoring_available: bool,
}

// ── State machine ─────────────────────────────────────────────────────────────

pub struct TransitionHandler {
    cfg: EngineConfig,
    planner: RingPlanner,
    phase: TrackingPhase,
    /// Registration epoch; bumped on every ring install, teardown, stop and
    /// error so that completions tied to a previous generation are inert.
    epoch: u64,
    active: Option<RegionSet>,
    last_fix: Option<LocationFix>,
    empty_fix_retries: u32,
    stale_events: u64,
    stalled: bool,
    last_error: Option<String>,
}

impl TransitionHandler {
    pub fn new(cfg: EngineConfig) -> Self {
        let planner = RingPlanner::new(&cfg);
        Self {
            cfg,
            planner,
            phase: TrackingPhase::Idle,
            epoch: 0,
            active: None,
            last_fix: None,
            empty_fix_retries: 0,
            stale_events: 0,
            stalled: false,
            last_error: None,
        }
    }

    pub fn phase(&self) -> TrackingPhase {
        self.phase
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            phase: self.phase,
            last_fix: self.last_fix,
            active_regions: self
                .active
                .as_ref()
                .map(|s| s.regions.clone())
                .unwrap_or_default(),
            epoch: self.epoch,
            stale_events: self.stale_events,
            stalled: self.stalled,
            last_error: self.last_error.clone(),
        }
    }

    /// Explicit start. Only meaningful from `Idle`.
    pub fn start(&mut self) -> Vec<Directive> {
        if self.phase != TrackingPhase::Idle {
            debug!("start requested while already tracking — ignoring");
            return Vec::new();
        }
        info!("tracking started — continuous updates");
        self.phase = TrackingPhase::ContinuousTracking;
        self.last_error = None;
        self.stalled = false;
        self.empty_fix_retries = 0;
        vec![Directive::StartContinuousUpdates]
    }

    /// Explicit stop. Idempotent from any phase: always leaves `Idle` with
    /// no active ring and no pending notifications.
    pub fn stop(&mut self) -> Vec<Directive> {
        let was = self.phase;
        let directives = self.teardown();
        if was != TrackingPhase::Idle {
            info!("tracking stopped");
        }
        directives
    }

    /// A usable fix arrived.
    pub fn on_fix(&mut self, fix: LocationFix, ctx: FixContext) -> Vec<Directive> {
        if self.phase == TrackingPhase::Idle {
            debug!("fix while idle — dropped");
            return Vec::new();
        }

        if let Some(prev) = self.last_fix {
            debug!(
                "moved {:.1} m since previous fix",
                geo::distance_m(prev.position, fix.position)
            );
        }
        self.last_fix = Some(fix);
        self.empty_fix_retries = 0;
        self.stalled = false;

        if ctx.backgrounded && ctx.monitoring_available {
            return self.install_ring(&fix);
        }

        if ctx.backgrounded {
            // Geofencing unsupported: degraded but functional — keep
            // continuous updates flowing.
            debug!("region monitoring unavailable — staying in continuous mode");
        }

        if self.phase == TrackingPhase::RegionMonitoring {
            // A ring is still registered but fixes are flowing again
            // (foregrounded, or monitoring availability flipped): tear it
            // down and stay on continuous updates.
            let mut directives = Vec::new();
            if let Some(old) = self.active.take() {
                directives.push(Directive::UnregisterRegions(old.regions));
            }
            directives.push(Directive::StartContinuousUpdates);
            self.epoch += 1;
            self.phase = TrackingPhase::ContinuousTracking;
            info!("checkpoint ring cleared — continuous updates resumed");
            return directives;
        }

        Vec::new()
    }

    fn install_ring(&mut self, fix: &LocationFix) -> Vec<Directive> {
        self.epoch += 1;
        let ring = self.planner.plan(fix, self.epoch);

        let mut directives = Vec::new();
        if let Some(old) = self.active.take() {
            directives.push(Directive::UnregisterRegions(old.regions));
        }
        directives.push(Directive::RegisterRegions(ring.clone()));
        directives.push(Directive::StopContinuousUpdates);

        info!(
            "checkpoint ring {} planted around ({:.6}, {:.6}), course {:.0}°",
            self.epoch,
            fix.position.lat,
            fix.position.lon,
            geo::normalize_bearing(fix.course_deg),
        );
        self.active = Some(ring);
        self.phase = TrackingPhase::RegionMonitoring;
        directives
    }

    /// The provider invoked its callback with no usable fix. Request one
    /// more update cycle, capped to avoid a tight restart loop.
    pub fn on_empty_fix(&mut self) -> Vec<Directive> {
        if self.phase == TrackingPhase::Idle {
            return Vec::new();
        }
        if self.empty_fix_retries < self.cfg.empty_fix_retry_cap {
            self.empty_fix_retries += 1;
            info!(
                "empty fix list — restarting updates (attempt {}/{})",
                self.empty_fix_retries, self.cfg.empty_fix_retry_cap
            );
            return vec![
                Directive::StopContinuousUpdates,
                Directive::StartContinuousUpdates,
            ];
        }
        if !self.stalled {
            warn!("provider keeps delivering empty fix lists — stalled");
            self.stalled = true;
        }
        Vec::new()
    }

    /// The platform reported a region boundary crossing. Enter and exit are
    /// treated identically: the agent passed a checkpoint, so notify, tear
    /// the whole ring down, and resume continuous updates. Events for a
    /// ring that has already been replaced are dropped and counted.
    pub fn on_region_event(&mut self, id: &str, kind: CrossingKind) -> Vec<Directive> {
        let center = match self.active.as_ref().and_then(|set| set.region(id)) {
            Some(region) if self.phase == TrackingPhase::RegionMonitoring => region.center,
            _ => {
                self.stale_events += 1;
                debug!("stale region event '{id}' ({}) — dropped", kind.as_str());
                return Vec::new();
            }
        };

        let ring = match self.active.take() {
            Some(set) => set,
            None => return Vec::new(),
        };
        let message = format!(
            "Checkpoint '{}' {} at lat {:.6}, lon {:.6}",
            id,
            kind.as_str(),
            center.lat,
            center.lon,
        );
        info!("{message} — ring {} cleared, resuming updates", ring.epoch);

        self.epoch += 1;
        self.phase = TrackingPhase::ContinuousTracking;
        vec![
            Directive::ScheduleNotification { message },
            Directive::UnregisterRegions(ring.regions),
            Directive::StartContinuousUpdates,
        ]
    }

    /// Provider failure (signal loss, hardware error). Best-effort cleanup,
    /// then idle; the caller must explicitly restart.
    pub fn on_error(&mut self, reason: &str) -> Vec<Directive> {
        warn!("location provider failure: {reason} — going idle");
        let directives = self.teardown();
        self.last_error = Some(reason.to_string());
        directives
    }

    fn teardown(&mut self) -> Vec<Directive> {
        let mut directives = Vec::new();
        if let Some(old) = self.active.take() {
            directives.push(Directive::UnregisterRegions(old.regions));
        }
        directives.push(Directive::StopContinuousUpdates);
        directives.push(Directive::CancelNotifications);
        self.epoch += 1;
        self.phase = TrackingPhase::Idle;
        self.empty_fix_retries = 0;
        self.stalled = false;
        directives
    }
}
