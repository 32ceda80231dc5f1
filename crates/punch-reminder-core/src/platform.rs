//! Collaborators the monitor drives or consumes.
//!
//! These are the seams between the monitoring core and the host platform.
//! Implementations are expected to be cheap and non-blocking; they are called
//! from inside a monitor cycle. Calling `MonitorLoop::reload_config` or
//! `MonitorLoop::stop` from a callback is allowed.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use chrono::{DateTime, Local, Timelike, Utc};

use crate::error::{ConfigError, PlatformError};
use crate::storage::Config;

/// Supplies the configuration snapshot for a session.
pub trait ConfigSource: Send + Sync {
    fn load_config(&self) -> Result<Config, ConfigError>;
}

/// Answers whether the check-in app has been used recently.
pub trait UsageSignal: Send + Sync {
    fn was_app_used_since(&self, app_id: &str, since: DateTime<Utc>) -> Result<bool, PlatformError>;
}

/// Persistent status line and alert presentation.
///
/// All methods are idempotent: raising twice refreshes the same alert.
pub trait Notifier: Send + Sync {
    fn update_foreground_status(&self, text: &str);
    fn raise_alert(&self);
    fn clear_alert(&self);
}

/// Best-effort foregrounding of an application.
pub trait AppLauncher: Send + Sync {
    /// Returns `false` when the app could not be launched.
    fn launch(&self, app_id: &str) -> bool;
}

/// Source of wall-clock time and the local hour of day.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
    fn local_hour(&self) -> u32;
    /// The most recent local midnight.
    fn local_day_start(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn local_hour(&self) -> u32 {
        Local::now().hour()
    }

    fn local_day_start(&self) -> DateTime<Utc> {
        let now = Local::now();
        now.date_naive()
            .and_hms_opt(0, 0, 0)
            .and_then(|midnight| midnight.and_local_timezone(Local).earliest())
            .map(|midnight| midnight.with_timezone(&Utc))
            .unwrap_or_else(|| {
                // No local midnight today (DST gap at 00:00).
                now.with_timezone(&Utc)
                    - chrono::Duration::seconds(i64::from(now.num_seconds_from_midnight()))
            })
    }
}

/// Clock pinned to an instant and hour; both can be moved by tests or
/// simulations.
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
    hour: AtomicU32,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>, hour: u32) -> Self {
        Self {
            now: Mutex::new(now),
            hour: AtomicU32::new(hour),
        }
    }

    pub fn set_hour(&self, hour: u32) {
        self.hour.store(hour, Ordering::SeqCst);
    }

    pub fn set_now(&self, now: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(|e| e.into_inner()) = now;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn local_hour(&self) -> u32 {
        self.hour.load(Ordering::SeqCst)
    }

    /// `now` with the local hour applied to its minutes and seconds.
    fn local_day_start(&self) -> DateTime<Utc> {
        let now = self.now();
        let into_day = chrono::Duration::hours(i64::from(self.local_hour()))
            + chrono::Duration::seconds(i64::from(now.minute() * 60 + now.second()))
            + chrono::Duration::nanoseconds(i64::from(now.nanosecond()));
        now.checked_sub_signed(into_day).unwrap_or(now)
    }
}

/// Query the usage signal, treating failures as "not used".
pub(crate) fn checkin_used_recently(
    usage: &dyn UsageSignal,
    app_id: &str,
    since: DateTime<Utc>,
) -> bool {
    match usage.was_app_used_since(app_id, since) {
        Ok(used) => used,
        Err(e) => {
            tracing::warn!(app_id, error = %e, "usage query failed, treating as not used");
            false
        }
    }
}
