//! engine.rs — tracker engine facade
//!
//! Composes the planner, dispatcher and transition state machine behind a
//! small public surface: `start` / `stop` / `last_known_fix` /
//! `subscribe` / `cancel` / `snapshot`.
//!
//! ## Concurrency
//! The provider delivers callbacks on whatever thread it likes; the engine
//! serializes every state mutation through one mpsc queue consumed by a
//! single spawned task. Collaborator calls made while applying directives
//! are fire-and-forget — nothing in the core blocks or awaits them.
//! Queries read an `Arc<RwLock<EngineSnapshot>>` the loop refreshes after
//! every event.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, RwLock};
use tracing::{debug, warn};
use trailwatch_types::{
    CrossingKind, EngineSnapshot, LocationFix, TrackerError, TrackingPhase,
};

use crate::config::EngineConfig;
use crate::dispatcher::{FixDispatcher, FixSubscription, SubscriberHandle};
use crate::provider::{LocationProvider, NotificationScheduler};
use crate::transition::{Directive, FixContext, TransitionHandler};

// ── Events ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub(crate) enum EngineEvent {
    Start,
    Stop,
    Fix(LocationFix),
    EmptyFix,
    RegionCrossed { id: String, kind: CrossingKind },
    ProviderError(String),
    DeadlineExpired,
}

/// Cloneable handle the provider (and the background-task scheduler) uses
/// to deliver callbacks into the engine. Sends never block; delivery after
/// the engine is dropped is silently ignored.
#[derive(Clone)]
pub struct EventSink {
    tx: mpsc::UnboundedSender<EngineEvent>,
}

impl EventSink {
    pub fn fix(&self, fix: LocationFix) {
        let _ = self.tx.send(EngineEvent::Fix(fix));
    }

    /// Provider callback fired with no usable fix in it.
    pub fn empty_fix(&self) {
        let _ = self.tx.send(EngineEvent::EmptyFix);
    }

    pub fn region_entered(&self, id: &str) {
        let _ = self.tx.send(EngineEvent::RegionCrossed {
            id: id.to_string(),
            kind: CrossingKind::Enter,
        });
    }

    pub fn region_exited(&self, id: &str) {
        let _ = self.tx.send(EngineEvent::RegionCrossed {
            id: id.to_string(),
            kind: CrossingKind::Exit,
        });
    }

    pub fn provider_error(&self, reason: &str) {
        let _ = self.tx.send(EngineEvent::ProviderError(reason.to_string()));
    }

    /// Background-task deadline reached: the engine must stop promptly.
    pub fn deadline_expired(&self) {
        let _ = self.tx.send(EngineEvent::DeadlineExpired);
    }
}

// ── Facade ────────────────────────────────────────────────────────────────────

pub struct TrackerEngine {
    provider: Arc<dyn LocationProvider>,
    dispatcher: Arc<FixDispatcher>,
    snapshot: Arc<RwLock<EngineSnapshot>>,
    events_tx: mpsc::UnboundedSender<EngineEvent>,
    /// Set when the running engine was started by the first subscriber
    /// rather than an explicit `start()`; only then does the last
    /// unsubscribe stop it again.
    auto_started: AtomicBool,
}

impl TrackerEngine {
    /// Build the engine around its collaborators and spawn the event loop.
    pub fn new(
        provider: Arc<dyn LocationProvider>,
        notifier: Arc<dyn NotificationScheduler>,
        cfg: EngineConfig,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let dispatcher = Arc::new(FixDispatcher::new());
        let snapshot = Arc::new(RwLock::new(EngineSnapshot::default()));

        tokio::spawn(event_loop(
            events_rx,
            provider.clone(),
            notifier,
            dispatcher.clone(),
            snapshot.clone(),
            cfg,
        ));

        Self {
            provider,
            dispatcher,
            snapshot,
            events_tx,
            auto_started: AtomicBool::new(false),
        }
    }

    /// The sink to hand to the location provider for its callbacks.
    pub fn event_sink(&self) -> EventSink {
        EventSink {
            tx: self.events_tx.clone(),
        }
    }

    /// Begin tracking. `AuthorizationDenied` when the provider lacks
    /// permission (no automatic retry); `AlreadyRunning` when tracking was
    /// already started.
    pub async fn start(&self) -> Result<(), TrackerError> {
        if !self.provider.is_authorized() {
            warn!("start refused: location authorization denied");
            return Err(TrackerError::AuthorizationDenied);
        }
        if self.snapshot.read().await.phase != TrackingPhase::Idle {
            return Err(TrackerError::AlreadyRunning);
        }
        self.auto_started.store(false, Ordering::SeqCst);
        let _ = self.events_tx.send(EngineEvent::Start);
        Ok(())
    }

    /// Stop tracking. Idempotent from any state; pre-empts any pending
    /// resume scheduled by the transition handler.
    pub async fn stop(&self) {
        self.auto_started.store(false, Ordering::SeqCst);
        let _ = self.events_tx.send(EngineEvent::Stop);
    }

    pub async fn last_known_fix(&self) -> Option<LocationFix> {
        self.snapshot.read().await.last_fix
    }

    pub async fn snapshot(&self) -> EngineSnapshot {
        self.snapshot.read().await.clone()
    }

    /// Subscribe to the fix stream. The first subscriber starts tracking if
    /// the engine is idle (and the provider authorized).
    pub async fn subscribe(&self) -> FixSubscription {
        let sub = self.dispatcher.subscribe();
        if self.dispatcher.subscriber_count() == 1
            && self.snapshot.read().await.phase == TrackingPhase::Idle
        {
            if self.provider.is_authorized() {
                debug!("first subscriber — starting tracking");
                self.auto_started.store(true, Ordering::SeqCst);
                let _ = self.events_tx.send(EngineEvent::Start);
            } else {
                warn!("first subscriber but authorization denied — not starting");
            }
        }
        sub
    }

    /// Cancel a subscription (idempotent). When the last subscriber leaves
    /// an auto-started engine, tracking stops again; an explicitly started
    /// engine keeps running.
    pub async fn cancel(&self, handle: SubscriberHandle) {
        self.dispatcher.cancel(handle);
        if self.dispatcher.subscriber_count() == 0
            && self.auto_started.swap(false, Ordering::SeqCst)
        {
            debug!("last subscriber left — stopping auto-started tracking");
            let _ = self.events_tx.send(EngineEvent::Stop);
        }
    }
}

// ── Event loop ────────────────────────────────────────────────────────────────

async fn event_loop(
    mut events_rx: mpsc::UnboundedReceiver<EngineEvent>,
    provider: Arc<dyn LocationProvider>,
    notifier: Arc<dyn NotificationScheduler>,
    dispatcher: Arc<FixDispatcher>,
    snapshot: Arc<RwLock<EngineSnapshot>>,
    cfg: EngineConfig,
) {
    let notify_delay_secs = cfg.notify_delay_secs;
    let mut handler = TransitionHandler::new(cfg);

    while let Some(event) = events_rx.recv().await {
        let directives = match event {
            EngineEvent::Start => handler.start(),
            EngineEvent::Stop => handler.stop(),
            EngineEvent::Fix(fix) => {
                // Observers see every fix, whatever the region logic does.
                dispatcher.publish(&fix);
                let ctx = FixContext {
                    backgrounded: provider.is_backgrounded(),
                    monitoring_available: provider.is_monitoring_available(),
                };
                handler.on_fix(fix, ctx)
            }
            EngineEvent::EmptyFix => handler.on_empty_fix(),
            EngineEvent::RegionCrossed { id, kind } => handler.on_region_event(&id, kind),
            EngineEvent::ProviderError(reason) => handler.on_error(&reason),
            EngineEvent::DeadlineExpired => {
                warn!("background deadline reached — stopping");
                handler.stop()
            }
        };

        apply_directives(&directives, &*provider, &*notifier, notify_delay_secs);
        *snapshot.write().await = handler.snapshot();
    }
}

fn apply_directives(
    directives: &[Directive],
    provider: &dyn LocationProvider,
    notifier: &dyn NotificationScheduler,
    notify_delay_secs: f64,
) {
    for directive in directives {
        match directive {
            Directive::StartContinuousUpdates => provider.start_continuous_updates(),
            Directive::StopContinuousUpdates => provider.stop_continuous_updates(),
            Directive::UnregisterRegions(regions) => {
                for region in regions {
                    provider.stop_monitoring(region);
                }
            }
            Directive::RegisterRegions(set) => {
                for region in &set.regions {
                    provider.start_monitoring(region);
                }
            }
            Directive::ScheduleNotification { message } => {
                notifier.schedule(message, notify_delay_secs, false);
            }
            Directive::CancelNotifications => notifier.cancel_all(),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
