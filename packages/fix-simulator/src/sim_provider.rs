//! sim_provider.rs — simulated platform location stack
//!
//! `SimProvider` stands in for the OS location services: it keeps the
//! monitored-region table, honors start/stop of continuous updates, and —
//! driven by the main loop — checks the walker's true position against
//! every registered region to synthesize entry/exit events into the
//! engine's sink. `LogNotifier` stands in for the notification center.
//!
//! Errors are logged, never panicked on; the sim must survive anything the
//! engine throws at it.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use tracing::{debug, info};
use trailwatch_engine::{geo, EventSink, LocationProvider, NotificationScheduler};
use trailwatch_types::{GeofenceRegion, LatLon};
use uuid::Uuid;

// ── Provider ──────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct SimProvider {
    sink: Mutex<Option<EventSink>>,
    monitored: Mutex<HashMap<String, GeofenceRegion>>,
    /// Last observed containment per region id; transitions fire events.
    inside: Mutex<HashMap<String, bool>>,
    updates_active: AtomicBool,
    backgrounded: AtomicBool,
    monitoring_available: AtomicBool,
    authorized: AtomicBool,
}

impl SimProvider {
    pub fn new(monitoring_available: bool) -> Self {
        let p = Self::default();
        p.monitoring_available
            .store(monitoring_available, Ordering::SeqCst);
        p.authorized.store(true, Ordering::SeqCst);
        p
    }

    /// Wire the engine's callback channel in after construction.
    pub fn attach_sink(&self, sink: EventSink) {
        *self.sink.lock().expect("sink lock") = Some(sink);
    }

    pub fn set_backgrounded(&self, value: bool) {
        if self.backgrounded.swap(value, Ordering::SeqCst) != value {
            info!("app {}", if value { "backgrounded" } else { "foregrounded" });
        }
    }

    pub fn updates_active(&self) -> bool {
        self.updates_active.load(Ordering::SeqCst)
    }

    pub fn monitored_count(&self) -> usize {
        self.monitored.lock().expect("region lock").len()
    }

    /// Check the walker's true position against every monitored region and
    /// report boundary crossings. The first observation of a region only
    /// records its state — the platform reports crossings, not standings.
    pub fn poll_regions(&self, true_pos: LatLon) {
        let sink = self.sink.lock().expect("sink lock");
        let Some(sink) = sink.as_ref() else { return };

        let monitored = self.monitored.lock().expect("region lock").clone();
        let mut inside = self.inside.lock().expect("containment lock");

        for (id, region) in &monitored {
            let now_inside = geo::distance_m(true_pos, region.center) <= region.radius_m;
            match inside.insert(id.clone(), now_inside) {
                None => {}
                Some(was_inside) if was_inside != now_inside => {
                    if now_inside {
                        if region.notify_on_entry {
                            info!("⭘ crossing into '{id}'");
                            sink.region_entered(id);
                        }
                    } else if region.notify_on_exit {
                        info!("⭘ crossing out of '{id}'");
                        sink.region_exited(id);
                    }
                }
                Some(_) => {}
            }
        }
    }

    pub fn fail(&self, reason: &str) {
        let sink = self.sink.lock().expect("sink lock");
        if let Some(sink) = sink.as_ref() {
            sink.provider_error(reason);
        }
    }
}

impl LocationProvider for SimProvider {
    fn start_continuous_updates(&self) {
        if !self.updates_active.swap(true, Ordering::SeqCst) {
            debug!("continuous updates on");
        }
    }

    fn stop_continuous_updates(&self) {
        if self.updates_active.swap(false, Ordering::SeqCst) {
            debug!("continuous updates off");
        }
    }

    fn start_monitoring(&self, region: &GeofenceRegion) {
        debug!(
            "monitoring '{}' at ({:.6}, {:.6}) r={:.0}m",
            region.id, region.center.lat, region.center.lon, region.radius_m
        );
        self.monitored
            .lock()
            .expect("region lock")
            .insert(region.id.clone(), region.clone());
    }

    fn stop_monitoring(&self, region: &GeofenceRegion) {
        self.monitored.lock().expect("region lock").remove(&region.id);
        self.inside.lock().expect("containment lock").remove(&region.id);
    }

    fn is_backgrounded(&self) -> bool {
        self.backgrounded.load(Ordering::SeqCst)
    }

    fn is_monitoring_available(&self) -> bool {
        self.monitoring_available.load(Ordering::SeqCst)
    }

    fn is_authorized(&self) -> bool {
        self.authorized.load(Ordering::SeqCst)
    }
}

// ── Notifier ──────────────────────────────────────────────────────────────────

/// Logs notification requests the way the platform center would queue them.
#[derive(Default)]
pub struct LogNotifier {
    pending: AtomicUsize,
}

impl LogNotifier {
    pub fn new() -> Self {
        Self::default()
    }
}

impl NotificationScheduler for LogNotifier {
    fn schedule(&self, message: &str, delay_secs: f64, repeats: bool) {
        let request_id = Uuid::new_v4();
        self.pending.fetch_add(1, Ordering::SeqCst);
        info!(
            "🔔 [{request_id}] firing in {delay_secs:.0}s{}: {message}",
            if repeats { " (repeating)" } else { "" }
        );
    }

    fn cancel_all(&self) {
        let n = self.pending.swap(0, Ordering::SeqCst);
        if n > 0 {
            info!("cleared {n} pending notification request(s)");
        }
    }
}
