//! Repeating alert presentation while an alert is unacknowledged.
//!
//! A single notification is easy to dismiss or miss, so once raised the
//! alert is presented again every `escalation_interval_seconds` until
//! [`AlertEscalator::stop`] is called.

use std::sync::{Arc, Mutex};

use crate::platform::{AppLauncher, Notifier};
use crate::storage::Config;
use crate::timer::{spawn_fixed_delay, TaskHandle};

pub struct AlertEscalator {
    notifier: Arc<dyn Notifier>,
    launcher: Arc<dyn AppLauncher>,
    schedule: Mutex<Option<TaskHandle>>,
}

impl AlertEscalator {
    pub fn new(notifier: Arc<dyn Notifier>, launcher: Arc<dyn AppLauncher>) -> Self {
        Self {
            notifier,
            launcher,
            schedule: Mutex::new(None),
        }
    }

    /// Present the alert now and keep re-presenting it.
    ///
    /// Restarting replaces the previous schedule.
    ///
    /// # Panics
    ///
    /// Panics when called outside a Tokio runtime.
    pub fn start(&self, config: &Config) {
        let notifier = self.notifier.clone();
        let period = config.escalation_interval();
        let handle = spawn_fixed_delay(period, period, move |gate| {
            let notifier = notifier.clone();
            async move {
                gate.run(|| {
                    tracing::debug!("re-presenting unacknowledged alert");
                    notifier.raise_alert();
                });
            }
        });
        let gate = handle.gate();
        let previous = self
            .schedule
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .replace(handle);
        if let Some(previous) = previous {
            previous.cancel();
        }

        // Collaborators may stop the escalator from inside these calls.
        gate.run(|| {
            self.notifier.raise_alert();
            if config.auto_launch_checkin_app && !self.launcher.launch(&config.checkin_app_id) {
                tracing::warn!(app_id = %config.checkin_app_id, "failed to launch check-in app");
            }
        });
    }

    /// Cancel the repeat. Returns whether a schedule was running.
    pub fn stop(&self) -> bool {
        let previous = self.schedule.lock().unwrap_or_else(|e| e.into_inner()).take();
        match previous {
            Some(handle) => {
                handle.cancel();
                true
            }
            None => false,
        }
    }

    pub fn is_active(&self) -> bool {
        self.schedule
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .is_some_and(|handle| !handle.is_cancelled())
    }
}
