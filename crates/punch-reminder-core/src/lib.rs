//! # Punch Reminder Core Library
//!
//! This library provides the core logic for Punch Reminder, a background
//! presence monitor. It periodically estimates the distance from a fixed
//! office location and, once the configured hour of day is reached, keeps
//! reminding the user until the check-in app has been used.
//!
//! ## Architecture
//!
//! - **Monitor Loop**: fixed-delay check cadence on a Tokio runtime
//! - **Location Resolver**: concurrent provider requests, first fix wins,
//!   timeout falls back to the newest cached fix
//! - **Geofence**: great-circle distance and activation hour
//! - **Alert State Machine**: Waiting / Monitoring / Alerted, cleared only by
//!   check-in acknowledgment
//! - **Alert Escalator**: re-presents the alert until acknowledged
//!
//! Platform concerns (location hardware, notifications, usage statistics,
//! app launching, config storage) are traits in [`platform`] and
//! [`location`].
//!
//! ## Key Components
//!
//! - [`MonitorLoop`]: start / stop / reload of the check cadence
//! - [`MonitorService`]: session control over a [`ConfigSource`]
//! - [`Config`]: TOML configuration snapshot
//! - [`StatusEvent`]: per-cycle outcome delivered to one subscriber

pub mod alert;
pub mod error;
pub mod escalator;
pub mod events;
pub mod geofence;
pub mod location;
pub mod monitor;
pub mod platform;
pub mod service;
pub mod storage;
pub mod timer;

pub use alert::{AlertEffect, AlertState, AlertStateMachine, Transition};
pub use error::{ConfigError, CoreError, LocationError, PlatformError};
pub use escalator::AlertEscalator;
pub use events::{MonitorStatus, StatusEvent, StatusPublisher, Subscription};
pub use geofence::{evaluate, haversine_distance_m, GeofenceReading};
pub use location::{FixSlot, FixSource, LocationFix, LocationProvider, LocationResolver, STANDARD_PROVIDERS};
pub use monitor::{status_text, Collaborators, MonitorLoop};
pub use platform::{AppLauncher, Clock, ConfigSource, FixedClock, Notifier, SystemClock, UsageSignal};
pub use service::{CheckinStatus, MonitorService};
pub use storage::{Config, FileConfigSource};
pub use timer::{spawn_fixed_delay, CancelGate, TaskHandle};
