//! Alert state machine.
//!
//! ## State Transitions
//!
//! ```text
//! Waiting ────(active && leaving)───► Alerted ──(check-in used)──► Monitoring
//!                                       ▲                              │
//!                                       └─────(active && leaving)──────┘
//! ```
//!
//! Alerted is only left through acknowledgment, never by walking back into
//! the geofence.
//!
//! The machine is pure: it returns the effect to perform and leaves timers
//! and notifications to the caller.

use serde::{Deserialize, Serialize};

use crate::events::MonitorStatus;
use crate::geofence::GeofenceReading;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertState {
    #[default]
    Waiting,
    Monitoring,
    Alerted,
}

/// Side effect requested by a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertEffect {
    Raise,
    Clear,
}

/// Result of applying one cycle's observations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: AlertState,
    pub to: AlertState,
    pub effect: Option<AlertEffect>,
    pub status: MonitorStatus,
    pub triggered: bool,
}

#[derive(Debug, Clone, Default)]
pub struct AlertStateMachine {
    state: AlertState,
}

impl AlertStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> AlertState {
        self.state
    }

    /// Advance one cycle.
    pub fn apply(&mut self, reading: &GeofenceReading, checkin_used_recently: bool) -> Transition {
        let from = self.state;
        let effect = if from != AlertState::Alerted && reading.is_active_time && reading.is_leaving {
            self.state = AlertState::Alerted;
            Some(AlertEffect::Raise)
        } else if from == AlertState::Alerted && checkin_used_recently {
            self.state = AlertState::Monitoring;
            Some(AlertEffect::Clear)
        } else {
            None
        };

        let status = if !reading.is_active_time {
            MonitorStatus::Waiting
        } else if self.state == AlertState::Alerted {
            MonitorStatus::Alert
        } else {
            MonitorStatus::Monitoring
        };

        Transition {
            from,
            to: self.state,
            effect,
            status,
            triggered: self.state == AlertState::Alerted && reading.is_active_time,
        }
    }
}
