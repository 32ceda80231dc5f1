//! Session control surface: binds a [`ConfigSource`] to a [`MonitorLoop`].

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{ConfigError, CoreError};
use crate::events::Subscription;
use crate::monitor::{Collaborators, MonitorLoop};
use crate::platform::ConfigSource;

/// Whether the check-in app was used since local midnight.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckinStatus {
    pub app_id: String,
    pub since: DateTime<Utc>,
    pub checked_in: bool,
}

pub struct MonitorService {
    source: Arc<dyn ConfigSource>,
    monitor: MonitorLoop,
}

impl MonitorService {
    pub fn new(source: Arc<dyn ConfigSource>, deps: Collaborators) -> Self {
        Self {
            source,
            monitor: MonitorLoop::new(deps),
        }
    }

    /// Load the configuration and start monitoring.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be loaded or is invalid;
    /// nothing is scheduled in that case.
    pub fn start_session(&self) -> Result<(), ConfigError> {
        let config = self.source.load_config()?;
        self.monitor.start(config)
    }

    pub fn stop_session(&self) -> bool {
        self.monitor.stop()
    }

    /// Re-read the configuration and restart checks with it.
    ///
    /// # Errors
    ///
    /// Returns an error if the new configuration cannot be loaded or is
    /// invalid; the current session keeps running with its old config.
    pub fn reload_config(&self) -> Result<(), ConfigError> {
        match self.source.load_config() {
            Ok(config) => self.monitor.reload_config(config),
            Err(e) => {
                tracing::warn!(error = %e, "config reload failed, keeping current config");
                Err(e)
            }
        }
    }

    /// Ask the usage signal whether the check-in app was used today.
    ///
    /// Uses the running session's app id, or the configured one when idle.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be loaded or the usage query
    /// fails. Unlike a monitor cycle this does not fail open.
    pub fn checked_in_today(&self) -> Result<CheckinStatus, CoreError> {
        let app_id = match self.monitor.config() {
            Some(config) => config.checkin_app_id,
            None => self.source.load_config()?.checkin_app_id,
        };
        let deps = self.monitor.collaborators();
        let since = deps.clock.local_day_start();
        let checked_in = deps.usage.was_app_used_since(&app_id, since)?;
        tracing::debug!(%app_id, %since, checked_in, "checked-in query");
        Ok(CheckinStatus {
            app_id,
            since,
            checked_in,
        })
    }

    pub fn is_running(&self) -> bool {
        self.monitor.is_running()
    }

    pub fn subscribe(&self) -> Subscription {
        self.monitor.subscribe()
    }

    pub fn monitor(&self) -> &MonitorLoop {
        &self.monitor
    }
}
