//! # trailwatch-engine
//!
//! Power-conserving movement tracker built on platform geofencing.
//!
//! ## Architecture
//! Instead of polling the location provider continuously, the engine plants
//! a ring of three checkpoint regions (forward / right / left of the
//! agent's course) and suspends continuous updates; the platform wakes it
//! on any region entry or exit, at which point the ring is torn down,
//! updates resume, and the next fix plants the next ring:
//!
//! ```text
//! provider fix ──► FixDispatcher ──► subscribers
//!        │
//!        ▼ (backgrounded)
//! RingPlanner ──► RegisterRegions ──► platform monitors, updates off
//!        ▲                                   │ enter/exit
//!        └── next fix ◄── updates on ◄── TransitionHandler
//! ```
//!
//! All state mutations are serialized through a single event queue owned by
//! [`engine::TrackerEngine`]; collaborators are reached through the traits
//! in [`provider`] and are handed in at construction.

pub mod config;
pub mod dispatcher;
pub mod engine;
pub mod geo;
pub mod provider;
pub mod region_set;
pub mod transition;

pub use config::EngineConfig;
pub use dispatcher::{FixDispatcher, FixSubscription, SubscriberHandle};
pub use engine::{EventSink, TrackerEngine};
pub use provider::{LocationProvider, NotificationScheduler};
pub use region_set::RingPlanner;
pub use transition::{Directive, FixContext, TransitionHandler};

pub use trailwatch_types as types;
