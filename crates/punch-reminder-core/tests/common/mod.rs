//! In-memory collaborators shared by the integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use punch_reminder_core::{
    AppLauncher, Collaborators, Config, FixedClock, LocationError, LocationFix, LocationProvider,
    Notifier, PlatformError, UsageSignal,
};
use tokio::sync::oneshot;

pub const OFFICE_LAT: f64 = 37.0;
pub const OFFICE_LNG: f64 = -122.0;
const EARTH_RADIUS_M: f64 = 6_371_008.8;

pub fn test_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).unwrap()
}

/// Coordinates `meters` due north of the office.
pub fn north_of_office(meters: f64) -> (f64, f64) {
    (OFFICE_LAT + (meters / EARTH_RADIUS_M).to_degrees(), OFFICE_LNG)
}

pub fn office_config() -> Config {
    Config {
        office_lat: OFFICE_LAT,
        office_lng: OFFICE_LNG,
        threshold_meters: 50.0,
        active_from_hour: 19,
        check_interval_seconds: 30,
        ..Config::default()
    }
}

// ============================================================================
// Mock location provider
// ============================================================================

pub struct FakeLocation {
    providers: Mutex<Vec<String>>,
    position: Mutex<(f64, f64)>,
    delay: Mutex<Duration>,
    cached: Mutex<Option<LocationFix>>,
    pub requests: AtomicUsize,
}

impl FakeLocation {
    /// One provider ("gps") answering instantly at `meters` from the office.
    pub fn at_distance(meters: f64) -> Arc<Self> {
        Arc::new(Self {
            providers: Mutex::new(vec!["gps".into()]),
            position: Mutex::new(north_of_office(meters)),
            delay: Mutex::new(Duration::ZERO),
            cached: Mutex::new(None),
            requests: AtomicUsize::new(0),
        })
    }

    pub fn move_to_distance(&self, meters: f64) {
        *self.position.lock().unwrap() = north_of_office(meters);
    }

    pub fn set_providers(&self, providers: &[&str]) {
        *self.providers.lock().unwrap() = providers.iter().map(|p| p.to_string()).collect();
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = delay;
    }

    pub fn set_cached_distance(&self, meters: Option<f64>) {
        *self.cached.lock().unwrap() = meters.map(|m| {
            let (lat, lng) = north_of_office(m);
            LocationFix::live("passive", lat, lng, test_now())
        });
    }

    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

impl LocationProvider for FakeLocation {
    fn available_providers(&self) -> Vec<String> {
        self.providers.lock().unwrap().clone()
    }

    fn all_providers(&self) -> Vec<String> {
        vec!["passive".into()]
    }

    fn request_fix(&self, provider: &str) -> Result<oneshot::Receiver<LocationFix>, LocationError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        let (lat, lng) = *self.position.lock().unwrap();
        let fix = LocationFix::live(provider, lat, lng, test_now());
        let delay = *self.delay.lock().unwrap();
        let (tx, rx) = oneshot::channel();
        if delay.is_zero() {
            let _ = tx.send(fix);
        } else {
            tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                let _ = tx.send(fix);
            });
        }
        Ok(rx)
    }

    fn last_known(&self, _provider: &str) -> Option<LocationFix> {
        self.cached.lock().unwrap().clone()
    }
}

// ============================================================================
// Mock usage signal
// ============================================================================

#[derive(Default)]
pub struct FakeUsage {
    pub used: AtomicBool,
    pub failing: AtomicBool,
    pub queries: AtomicUsize,
    pub last_since: Mutex<Option<DateTime<Utc>>>,
}

impl FakeUsage {
    pub fn set_used(&self, used: bool) {
        self.used.store(used, Ordering::SeqCst);
    }
}

impl UsageSignal for FakeUsage {
    fn was_app_used_since(&self, app_id: &str, since: DateTime<Utc>) -> Result<bool, PlatformError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        *self.last_since.lock().unwrap() = Some(since);
        if self.failing.load(Ordering::SeqCst) {
            return Err(PlatformError::UsageQuery {
                app_id: app_id.to_string(),
                message: "usage access revoked".into(),
            });
        }
        Ok(self.used.load(Ordering::SeqCst))
    }
}

// ============================================================================
// Mock notifier and launcher
// ============================================================================

#[derive(Default)]
pub struct RecordingNotifier {
    pub raised: AtomicUsize,
    pub cleared: AtomicUsize,
    pub statuses: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn raised(&self) -> usize {
        self.raised.load(Ordering::SeqCst)
    }

    pub fn cleared(&self) -> usize {
        self.cleared.load(Ordering::SeqCst)
    }

    pub fn last_status(&self) -> Option<String> {
        self.statuses.lock().unwrap().last().cloned()
    }
}

impl Notifier for RecordingNotifier {
    fn update_foreground_status(&self, text: &str) {
        self.statuses.lock().unwrap().push(text.to_string());
    }

    fn raise_alert(&self) {
        self.raised.fetch_add(1, Ordering::SeqCst);
    }

    fn clear_alert(&self) {
        self.cleared.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Default)]
pub struct RecordingLauncher {
    pub launched: Mutex<Vec<String>>,
}

impl AppLauncher for RecordingLauncher {
    fn launch(&self, app_id: &str) -> bool {
        self.launched.lock().unwrap().push(app_id.to_string());
        true
    }
}

// ============================================================================
// Harness
// ============================================================================

pub struct Harness {
    pub location: Arc<FakeLocation>,
    pub usage: Arc<FakeUsage>,
    pub notifier: Arc<RecordingNotifier>,
    pub launcher: Arc<RecordingLauncher>,
    pub clock: Arc<FixedClock>,
}

impl Harness {
    /// User `meters` from the office at local hour `hour`.
    pub fn new(meters: f64, hour: u32) -> Self {
        Self {
            location: FakeLocation::at_distance(meters),
            usage: Arc::new(FakeUsage::default()),
            notifier: Arc::new(RecordingNotifier::default()),
            launcher: Arc::new(RecordingLauncher::default()),
            clock: Arc::new(FixedClock::new(test_now(), hour)),
        }
    }

    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            location: self.location.clone(),
            usage: self.usage.clone(),
            notifier: self.notifier.clone(),
            launcher: self.launcher.clone(),
            clock: self.clock.clone(),
        }
    }
}
