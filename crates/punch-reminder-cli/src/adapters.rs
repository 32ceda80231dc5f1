//! Desktop stand-ins for the platform collaborators used by `run` and
//! `checked-in`.
//!
//! - position: a JSON file (`{"latitude": .., "longitude": ..}`) rewritten by
//!   whatever tracks the device
//! - check-in: touching a marker file counts as opening the check-in app
//! - notifications: log lines on stderr

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use punch_reminder_core::{
    AppLauncher, Collaborators, CoreError, LocationError, LocationFix, LocationProvider, Notifier,
    PlatformError, SystemClock, UsageSignal,
};
use serde::Deserialize;
use tokio::sync::oneshot;

const FILE_PROVIDER: &str = "file";

/// Collaborators backed by the side files and the system clock.
pub fn desktop(fix_file: PathBuf, marker: PathBuf) -> Collaborators {
    Collaborators {
        location: Arc::new(FileLocationProvider::new(fix_file)),
        usage: Arc::new(MarkerUsageSignal::new(marker)),
        notifier: Arc::new(LogNotifier::default()),
        launcher: Arc::new(OpenLauncher),
        clock: Arc::new(SystemClock),
    }
}

#[derive(Deserialize)]
struct PositionFile {
    latitude: f64,
    longitude: f64,
    #[serde(default)]
    captured_at: Option<DateTime<Utc>>,
}

/// Location provider backed by a position file.
///
/// The provider counts as enabled while the file exists. Every successful
/// read is kept as the last-known fix.
pub struct FileLocationProvider {
    path: PathBuf,
    last: Mutex<Option<LocationFix>>,
}

impl FileLocationProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            last: Mutex::new(None),
        }
    }

    fn read_fix(&self) -> Result<LocationFix, CoreError> {
        let content = std::fs::read_to_string(&self.path)?;
        let position: PositionFile = serde_json::from_str(&content)?;
        if !(-90.0..=90.0).contains(&position.latitude)
            || !(-180.0..=180.0).contains(&position.longitude)
        {
            return Err(LocationError::RequestFailed {
                provider: FILE_PROVIDER.into(),
                message: format!(
                    "coordinates out of range: {}, {}",
                    position.latitude, position.longitude
                ),
            }
            .into());
        }
        Ok(LocationFix::live(
            FILE_PROVIDER,
            position.latitude,
            position.longitude,
            position.captured_at.unwrap_or_else(Utc::now),
        ))
    }
}

impl LocationProvider for FileLocationProvider {
    fn available_providers(&self) -> Vec<String> {
        if self.path.exists() {
            vec![FILE_PROVIDER.to_string()]
        } else {
            Vec::new()
        }
    }

    fn all_providers(&self) -> Vec<String> {
        vec![FILE_PROVIDER.to_string()]
    }

    fn request_fix(&self, provider: &str) -> Result<oneshot::Receiver<LocationFix>, LocationError> {
        if provider != FILE_PROVIDER {
            return Err(LocationError::ProviderUnavailable(provider.to_string()));
        }
        let fix = self.read_fix().map_err(|e| LocationError::RequestFailed {
            provider: provider.to_string(),
            message: e.to_string(),
        })?;
        *self.last.lock().unwrap_or_else(|e| e.into_inner()) = Some(fix.clone());

        let (tx, rx) = oneshot::channel();
        let _ = tx.send(fix);
        Ok(rx)
    }

    fn last_known(&self, provider: &str) -> Option<LocationFix> {
        if provider != FILE_PROVIDER {
            return None;
        }
        self.last.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

/// Check-in detection from a marker file's modification time.
pub struct MarkerUsageSignal {
    path: PathBuf,
}

impl MarkerUsageSignal {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[cfg(test)]
    fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl UsageSignal for MarkerUsageSignal {
    fn was_app_used_since(&self, app_id: &str, since: DateTime<Utc>) -> Result<bool, PlatformError> {
        let query_failed = |e: std::io::Error| PlatformError::UsageQuery {
            app_id: app_id.to_string(),
            message: format!("{}: {e}", self.path.display()),
        };
        let modified = match std::fs::metadata(&self.path) {
            Ok(meta) => meta.modified().map_err(query_failed)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(query_failed(e)),
        };
        Ok(DateTime::<Utc>::from(modified) >= since)
    }
}

/// Presents status and alerts as log lines.
#[derive(Default)]
pub struct LogNotifier {
    alerting: AtomicBool,
    last_status: Mutex<String>,
}

impl LogNotifier {
    #[cfg(test)]
    fn is_alerting(&self) -> bool {
        self.alerting.load(Ordering::SeqCst)
    }
}

impl Notifier for LogNotifier {
    fn update_foreground_status(&self, text: &str) {
        let mut last = self.last_status.lock().unwrap_or_else(|e| e.into_inner());
        if *last != text {
            tracing::info!(status = text, "status changed");
            *last = text.to_string();
        }
    }

    fn raise_alert(&self) {
        self.alerting.store(true, Ordering::SeqCst);
        tracing::warn!("left the office without checking in");
        eprintln!("\x07>>> Check in now! <<<");
    }

    fn clear_alert(&self) {
        if self.alerting.swap(false, Ordering::SeqCst) {
            tracing::info!("alert cleared");
        }
    }
}

/// Opens the check-in app with the desktop's default handler.
#[derive(Debug, Default, Clone, Copy)]
pub struct OpenLauncher;

impl AppLauncher for OpenLauncher {
    fn launch(&self, app_id: &str) -> bool {
        match open::that_detached(app_id) {
            Ok(()) => true,
            Err(e) => {
                let err = PlatformError::Launch {
                    app_id: app_id.to_string(),
                    message: e.to_string(),
                };
                tracing::warn!(error = %err, "launch failed");
                false
            }
        }
    }
}
