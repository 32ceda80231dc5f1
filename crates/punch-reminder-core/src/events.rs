use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Status label reported with every completed cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MonitorStatus {
    /// Before the activation hour.
    Waiting,
    Monitoring,
    /// Alert raised and not yet acknowledged.
    Alert,
}

impl MonitorStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            MonitorStatus::Waiting => "waiting",
            MonitorStatus::Monitoring => "monitoring",
            MonitorStatus::Alert => "alert",
        }
    }
}

impl std::fmt::Display for MonitorStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one completed monitor cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusEvent {
    pub distance_meters: f64,
    pub latitude: f64,
    pub longitude: f64,
    pub triggered: bool,
    pub status: MonitorStatus,
    pub observed_at: DateTime<Utc>,
}

/// A live subscription to [`StatusPublisher`].
#[derive(Debug)]
pub struct Subscription {
    pub id: u64,
    pub events: mpsc::UnboundedReceiver<StatusEvent>,
}

/// Delivers status events to at most one subscriber.
///
/// Subscribing replaces the previous subscriber. With no subscriber, events
/// are dropped.
#[derive(Debug, Default)]
pub struct StatusPublisher {
    next_id: AtomicU64,
    subscriber: Mutex<Option<(u64, mpsc::UnboundedSender<StatusEvent>)>>,
}

impl StatusPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let (tx, rx) = mpsc::unbounded_channel();
        let replaced = self
            .subscriber
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .replace((id, tx));
        if let Some((old, _)) = replaced {
            tracing::debug!(old, new = id, "status subscriber replaced");
        }
        Subscription { id, events: rx }
    }

    /// Remove subscriber `id` if it is still the active one.
    pub fn unsubscribe(&self, id: u64) -> bool {
        let mut guard = self.subscriber.lock().unwrap_or_else(|e| e.into_inner());
        match guard.as_ref() {
            Some((current, _)) if *current == id => {
                *guard = None;
                true
            }
            _ => false,
        }
    }

    /// Deliver `event`; returns whether a subscriber received it.
    pub fn publish(&self, event: StatusEvent) -> bool {
        let mut guard = self.subscriber.lock().unwrap_or_else(|e| e.into_inner());
        let Some((id, tx)) = guard.as_ref() else {
            return false;
        };
        if tx.send(event).is_err() {
            tracing::debug!(id, "status subscriber dropped its receiver");
            *guard = None;
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(status: MonitorStatus) -> StatusEvent {
        StatusEvent {
            distance_meters: 80.0,
            latitude: 37.0,
            longitude: -122.0,
            triggered: status == MonitorStatus::Alert,
            status,
            observed_at: Utc::now(),
        }
    }

    #[test]
    fn status_serializes_lowercase() {
        let json = serde_json::to_value(event(MonitorStatus::Alert)).unwrap();
        assert_eq!(json["status"], "alert");
        assert_eq!(json["triggered"], true);
        assert_eq!(MonitorStatus::Waiting.to_string(), "waiting");
    }

    #[test]
    fn publish_without_subscriber_drops() {
        let publisher = StatusPublisher::new();
        assert!(!publisher.publish(event(MonitorStatus::Waiting)));
    }

    #[test]
    fn subscriber_receives_events() {
        let publisher = StatusPublisher::new();
        let mut sub = publisher.subscribe();
        assert!(publisher.publish(event(MonitorStatus::Monitoring)));
        assert_eq!(sub.events.try_recv().unwrap().status, MonitorStatus::Monitoring);
    }

    #[test]
    fn new_subscriber_replaces_old() {
        let publisher = StatusPublisher::new();
        let mut first = publisher.subscribe();
        let mut second = publisher.subscribe();
        publisher.publish(event(MonitorStatus::Alert));
        assert!(first.events.try_recv().is_err());
        assert!(second.events.try_recv().is_ok());
        // Stale id cannot remove the current subscriber.
        assert!(!publisher.unsubscribe(first.id));
        assert!(publisher.unsubscribe(second.id));
        assert!(!publisher.publish(event(MonitorStatus::Alert)));
    }

    #[test]
    fn dropped_receiver_is_forgotten() {
        let publisher = StatusPublisher::new();
        let sub = publisher.subscribe();
        drop(sub);
        assert!(!publisher.publish(event(MonitorStatus::Waiting)));
        assert!(publisher.subscriber.lock().unwrap().is_none());
    }
}
