//! Monitor loop.
//!
//! Drives one check per `check_interval_seconds` (fixed delay, measured from
//! the end of the previous cycle) until stopped. A cycle:
//!
//! ```text
//! office unset? ── yes ──► skip
//!      │ no
//! resolve fix ── none ──► skip
//!      │
//! query check-in usage (fail-open)
//!      │
//! [cadence gate] evaluate geofence → apply state machine → effects
//!                → foreground status → publish StatusEvent
//! ```
//!
//! The alert state lives in a session that survives config reloads and is
//! discarded on stop.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};

use crate::alert::{AlertEffect, AlertState, AlertStateMachine};
use crate::error::ConfigError;
use crate::escalator::AlertEscalator;
use crate::events::{MonitorStatus, StatusEvent, StatusPublisher, Subscription};
use crate::geofence::{self, GeofenceReading};
use crate::location::{LocationFix, LocationProvider, LocationResolver};
use crate::platform::{checkin_used_recently, AppLauncher, Clock, Notifier, UsageSignal};
use crate::storage::Config;
use crate::timer::{spawn_fixed_delay, CancelGate, TaskHandle};

/// Platform collaborators the monitor drives.
#[derive(Clone)]
pub struct Collaborators {
    pub location: Arc<dyn LocationProvider>,
    pub usage: Arc<dyn UsageSignal>,
    pub notifier: Arc<dyn Notifier>,
    pub launcher: Arc<dyn AppLauncher>,
    pub clock: Arc<dyn Clock>,
}

/// Text shown in the persistent foreground status line.
pub fn status_text(status: MonitorStatus, distance_meters: f64, active_from_hour: u32) -> String {
    let meters = distance_meters.round() as i64;
    match status {
        MonitorStatus::Waiting => {
            format!("Waiting (active after {active_from_hour}:00) | {meters} m from office")
        }
        MonitorStatus::Alert => format!("Check in now! | {meters} m from office"),
        MonitorStatus::Monitoring => format!("Monitoring | {meters} m from office"),
    }
}

/// State owned by one monitoring session.
struct Session {
    machine: Mutex<AlertStateMachine>,
    escalator: AlertEscalator,
}

impl Session {
    fn new(deps: &Collaborators) -> Self {
        Self {
            machine: Mutex::new(AlertStateMachine::new()),
            escalator: AlertEscalator::new(deps.notifier.clone(), deps.launcher.clone()),
        }
    }

    fn state(&self) -> AlertState {
        self.machine.lock().unwrap_or_else(|e| e.into_inner()).state()
    }
}

/// One cadence's view of the session: fixed config plus shared state.
struct Cycle {
    config: Config,
    session: Arc<Session>,
    deps: Collaborators,
    resolver: LocationResolver,
    publisher: Arc<StatusPublisher>,
}

impl Cycle {
    async fn run(&self, gate: &CancelGate) {
        if !self.config.office_is_set() {
            tracing::debug!("no office coordinates configured, skipping check");
            return;
        }

        let Some(fix) = self.resolver.resolve().await else {
            tracing::debug!("no location fix available, skipping check");
            return;
        };

        let now = self.deps.clock.now();
        let since = self
            .config
            .checkin_window()
            .and_then(|window| now.checked_sub_signed(window));
        let checkin = match since {
            Some(since) => {
                checkin_used_recently(self.deps.usage.as_ref(), &self.config.checkin_app_id, since)
            }
            None => {
                tracing::warn!(
                    window_minutes = self.config.checkin_window_minutes,
                    "check-in window reaches before the representable range, ignoring check-in"
                );
                false
            }
        };
        let hour = self.deps.clock.local_hour();

        if gate.run(|| self.commit(gate, &fix, hour, checkin, now)).is_none() {
            tracing::debug!("monitor stopped mid-cycle, discarding fix");
        }
    }

    fn commit(&self, gate: &CancelGate, fix: &LocationFix, hour: u32, checkin: bool, now: DateTime<Utc>) {
        let reading: GeofenceReading = geofence::evaluate(fix, &self.config, hour);
        let transition = self
            .session
            .machine
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .apply(&reading, checkin);

        match transition.effect {
            Some(AlertEffect::Raise) => {
                tracing::info!(
                    distance_m = reading.distance_meters,
                    threshold_m = self.config.threshold_meters,
                    "left the office after hours, raising alert"
                );
                self.session.escalator.start(&self.config);
            }
            Some(AlertEffect::Clear) => {
                tracing::info!(app_id = %self.config.checkin_app_id, "check-in detected, clearing alert");
                self.session.escalator.stop();
                self.deps.notifier.clear_alert();
            }
            None => {}
        }

        // An effect callback may have stopped or reloaded the monitor.
        if !gate.is_open() {
            tracing::debug!("monitor replaced during check, dropping its status");
            return;
        }
        self.deps.notifier.update_foreground_status(&status_text(
            transition.status,
            reading.distance_meters,
            self.config.active_from_hour,
        ));
        if !gate.is_open() {
            return;
        }

        let event = StatusEvent {
            distance_meters: reading.distance_meters,
            latitude: fix.latitude,
            longitude: fix.longitude,
            triggered: transition.triggered,
            status: transition.status,
            observed_at: now,
        };
        tracing::debug!(
            distance_m = event.distance_meters,
            status = %event.status,
            triggered = event.triggered,
            source = ?fix.source,
            "check complete"
        );
        self.publisher.publish(event);
    }
}

struct Running {
    config: Config,
    session: Arc<Session>,
    cadence: TaskHandle,
}

/// Top-level scheduler for a monitoring session.
pub struct MonitorLoop {
    deps: Collaborators,
    publisher: Arc<StatusPublisher>,
    running: Mutex<Option<Running>>,
}

impl MonitorLoop {
    pub fn new(deps: Collaborators) -> Self {
        Self {
            deps,
            publisher: Arc::new(StatusPublisher::new()),
            running: Mutex::new(None),
        }
    }

    /// Register the status subscriber, replacing any previous one.
    pub fn subscribe(&self) -> Subscription {
        self.publisher.subscribe()
    }

    pub fn unsubscribe(&self, id: u64) -> bool {
        self.publisher.unsubscribe(id)
    }

    /// Start checking with `config`, first check immediately.
    ///
    /// On a running loop the old cadence is cancelled and replaced; the alert
    /// state and any running escalation carry over.
    ///
    /// # Errors
    ///
    /// Returns the validation error for an invalid config; a running loop is
    /// left untouched in that case.
    ///
    /// # Panics
    ///
    /// Panics when called outside a Tokio runtime.
    pub fn start(&self, config: Config) -> Result<(), ConfigError> {
        config.validate()?;

        let mut running = self.running.lock().unwrap_or_else(|e| e.into_inner());
        let previous = running.take();
        let session = match &previous {
            Some(previous) => {
                tracing::info!(
                    interval_secs = config.check_interval_seconds,
                    "configuration replaced, restarting checks"
                );
                previous.session.clone()
            }
            None => {
                tracing::info!(
                    interval_secs = config.check_interval_seconds,
                    office_set = config.office_is_set(),
                    "monitor session started"
                );
                Arc::new(Session::new(&self.deps))
            }
        };

        let cycle = Arc::new(Cycle {
            config: config.clone(),
            session: session.clone(),
            deps: self.deps.clone(),
            resolver: LocationResolver::new(self.deps.location.clone(), config.location_timeout()),
            publisher: self.publisher.clone(),
        });
        let cadence = spawn_fixed_delay(std::time::Duration::ZERO, config.check_interval(), move |gate| {
            let cycle = cycle.clone();
            async move { cycle.run(&gate).await }
        });

        *running = Some(Running {
            config,
            session,
            cadence,
        });
        drop(running);

        // Cancel outside the lock: the old cadence may be mid-commit and its
        // callbacks may call back into this loop.
        if let Some(previous) = previous {
            previous.cadence.cancel();
        }
        Ok(())
    }

    /// Replace the configuration and restart the cadence.
    ///
    /// # Errors
    ///
    /// See [`MonitorLoop::start`].
    pub fn reload_config(&self, config: Config) -> Result<(), ConfigError> {
        self.start(config)
    }

    /// Stop the session. After return no further check commits, status
    /// events or alert presentations occur. Returns whether it was running.
    pub fn stop(&self) -> bool {
        let Some(previous) = self.running.lock().unwrap_or_else(|e| e.into_inner()).take() else {
            return false;
        };
        previous.cadence.cancel();
        previous.session.escalator.stop();
        self.deps.notifier.clear_alert();
        tracing::info!(final_state = ?previous.session.state(), "monitor session stopped");
        true
    }

    pub fn is_running(&self) -> bool {
        self.running.lock().unwrap_or_else(|e| e.into_inner()).is_some()
    }

    /// Alert state of the running session.
    pub fn alert_state(&self) -> Option<AlertState> {
        self.running
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .map(|r| r.session.state())
    }

    /// Whether the running session is currently escalating an alert.
    pub fn is_escalating(&self) -> bool {
        self.running
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .is_some_and(|r| r.session.escalator.is_active())
    }

    pub fn collaborators(&self) -> &Collaborators {
        &self.deps
    }

    pub fn config(&self) -> Option<Config> {
        self.running
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .map(|r| r.config.clone())
    }
}

impl Drop for MonitorLoop {
    fn drop(&mut self) {
        self.stop();
    }
}
