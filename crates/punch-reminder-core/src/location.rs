//! Location acquisition with provider fan-out, timeout and cached fallback.
//!
//! ## Resolution
//!
//! ```text
//! no provider enabled ─────────────────────────────► newest last-known fix
//! providers enabled ─┬─ request_fix(p1) ─┐
//!                    ├─ request_fix(p2) ─┼─► FixSlot (first completion wins)
//!                    └─ timeout ─────────┘      └─ timeout completes with
//!                                                  the newest last-known fix
//! ```
//!
//! Responses that arrive after the slot has been claimed are dropped.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;
use tokio::task::JoinSet;

use crate::error::LocationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FixSource {
    Live,
    LastKnown,
}

/// One position sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationFix {
    pub latitude: f64,
    pub longitude: f64,
    pub captured_at: DateTime<Utc>,
    pub source: FixSource,
    /// Name of the provider that produced the fix.
    #[serde(default)]
    pub provider: String,
}

impl LocationFix {
    pub fn live(provider: impl Into<String>, latitude: f64, longitude: f64, captured_at: DateTime<Utc>) -> Self {
        Self {
            latitude,
            longitude,
            captured_at,
            source: FixSource::Live,
            provider: provider.into(),
        }
    }
}

/// Provider names a platform location service conventionally exposes.
pub const STANDARD_PROVIDERS: [&str; 3] = ["gps", "network", "passive"];

/// Platform location service.
pub trait LocationProvider: Send + Sync {
    /// Providers that are currently enabled, in preference order.
    fn available_providers(&self) -> Vec<String>;

    /// Every provider that may hold a cached fix, enabled or not.
    ///
    /// Defaults to [`STANDARD_PROVIDERS`] plus any other enabled provider, so
    /// cached fixes stay reachable while every provider is switched off.
    fn all_providers(&self) -> Vec<String> {
        let mut providers: Vec<String> = STANDARD_PROVIDERS.iter().map(|p| p.to_string()).collect();
        for name in self.available_providers() {
            if !providers.contains(&name) {
                providers.push(name);
            }
        }
        providers
    }

    /// Issue a single live-fix request. The receiver yields at most one fix;
    /// a dropped sender means the provider gave up.
    fn request_fix(&self, provider: &str) -> Result<oneshot::Receiver<LocationFix>, LocationError>;

    /// Cached fix held by the platform for `provider`.
    fn last_known(&self, provider: &str) -> Option<LocationFix>;
}

/// Single-assignment result slot for one resolution.
///
/// Any number of producers may race to [`complete`](FixSlot::complete) it;
/// exactly one succeeds and the rest are no-ops.
#[derive(Debug)]
pub struct FixSlot {
    claimed: AtomicBool,
    tx: Mutex<Option<oneshot::Sender<Option<LocationFix>>>>,
}

impl FixSlot {
    pub fn new() -> (Arc<Self>, oneshot::Receiver<Option<LocationFix>>) {
        let (tx, rx) = oneshot::channel();
        let slot = Arc::new(Self {
            claimed: AtomicBool::new(false),
            tx: Mutex::new(Some(tx)),
        });
        (slot, rx)
    }

    /// Deliver `fix` if nobody has yet. Returns `true` for the winner.
    pub fn complete(&self, fix: Option<LocationFix>) -> bool {
        if self.claimed.swap(true, Ordering::AcqRel) {
            return false;
        }
        let tx = self.tx.lock().unwrap_or_else(|e| e.into_inner()).take();
        if let Some(tx) = tx {
            // Receiver gone means the cycle was abandoned; nothing to do.
            let _ = tx.send(fix);
        }
        true
    }

    pub fn is_claimed(&self) -> bool {
        self.claimed.load(Ordering::Acquire)
    }
}

/// Newest cached fix across every provider, tagged as `LastKnown`.
pub fn best_last_known(provider: &dyn LocationProvider) -> Option<LocationFix> {
    provider
        .all_providers()
        .iter()
        .filter_map(|name| provider.last_known(name))
        .max_by_key(|fix| fix.captured_at)
        .map(|fix| LocationFix {
            source: FixSource::LastKnown,
            ..fix
        })
}

/// Acquires at most one fix per call.
#[derive(Clone)]
pub struct LocationResolver {
    provider: Arc<dyn LocationProvider>,
    timeout: Duration,
}

impl LocationResolver {
    pub fn new(provider: Arc<dyn LocationProvider>, timeout: Duration) -> Self {
        Self { provider, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Resolve one fix, preferring a live reading.
    ///
    /// Returns `None` when no live fix arrives in time and no cached fix
    /// exists. Outstanding requests are abandoned on return.
    pub async fn resolve(&self) -> Option<LocationFix> {
        let providers = self.provider.available_providers();
        if providers.is_empty() {
            tracing::warn!("no location provider available, using last known fix");
            return best_last_known(self.provider.as_ref());
        }

        let (slot, rx) = FixSlot::new();
        let mut pending = JoinSet::new();

        for name in providers {
            match self.provider.request_fix(&name) {
                Ok(response) => {
                    let slot = slot.clone();
                    pending.spawn(async move {
                        let Ok(fix) = response.await else {
                            tracing::debug!(provider = %name, "provider gave up without a fix");
                            return;
                        };
                        let fix = LocationFix {
                            source: FixSource::Live,
                            provider: name.clone(),
                            ..fix
                        };
                        if slot.complete(Some(fix)) {
                            tracing::debug!(provider = %name, "live fix won");
                        } else {
                            tracing::debug!(provider = %name, "discarding late fix");
                        }
                    });
                }
                Err(e) => {
                    tracing::warn!(provider = %name, error = %e, "location request failed");
                }
            }
        }

        let provider = self.provider.clone();
        let timeout = self.timeout;
        let timeout_slot = slot.clone();
        pending.spawn(async move {
            tokio::time::sleep(timeout).await;
            if timeout_slot.is_claimed() {
                return;
            }
            tracing::warn!(timeout_secs = timeout.as_secs(), "location timeout, using last known fix");
            timeout_slot.complete(best_last_known(provider.as_ref()));
        });

        let resolved = rx.await.unwrap_or(None);
        pending.abort_all();
        resolved
    }
}
