//! provider.rs — collaborator interfaces
//!
//! The engine talks to the platform through these two seams. Both are
//! fire-and-forget: calls never block and never return errors — failures
//! surface asynchronously through the engine's event sink. Implementations
//! are supplied at construction; the engine owns no global singleton and
//! requires no base class.

use trailwatch_types::GeofenceRegion;

/// Platform location stack as seen by the engine.
pub trait LocationProvider: Send + Sync {
    /// Begin streaming position fixes into the event sink.
    fn start_continuous_updates(&self);
    /// Stop streaming fixes. Monitored regions, if any, stay registered.
    fn stop_continuous_updates(&self);
    /// Register one circular region for entry/exit monitoring.
    fn start_monitoring(&self, region: &GeofenceRegion);
    /// Unregister one region.
    fn stop_monitoring(&self, region: &GeofenceRegion);

    /// Whether the host application is currently backgrounded. Sampled per
    /// fix: checkpoint rings are only planted while backgrounded.
    fn is_backgrounded(&self) -> bool;
    /// Whether circular-region monitoring is supported on this platform.
    fn is_monitoring_available(&self) -> bool;
    /// Whether location permission has been granted.
    fn is_authorized(&self) -> bool;
}

/// Local notification delivery.
pub trait NotificationScheduler: Send + Sync {
    /// Schedule a notification `delay_secs` from now. When `repeats` is
    /// set the platform re-fires it on that interval until cancelled.
    fn schedule(&self, message: &str, delay_secs: f64, repeats: bool);
    /// Drop all pending and delivered notification requests.
    fn cancel_all(&self);
}
