//! Distance from the office and the per-cycle geofence reading.

use serde::{Deserialize, Serialize};

use crate::location::LocationFix;
use crate::storage::Config;

/// Mean earth radius in meters (IUGG).
const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// Great-circle distance in meters between two points given in degrees.
pub fn haversine_distance_m(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lng2 - lng1).to_radians();

    let a = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().min(1.0).asin();
    EARTH_RADIUS_M * c
}

/// Result of evaluating one fix against the configured geofence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeofenceReading {
    pub distance_meters: f64,
    pub is_active_time: bool,
    pub is_leaving: bool,
}

/// Evaluate `fix` against the office geofence at local hour `now_hour`.
///
/// Callers must check [`Config::office_is_set`] first; an unset office would
/// measure against (0, 0).
pub fn evaluate(fix: &LocationFix, config: &Config, now_hour: u32) -> GeofenceReading {
    let distance_meters = haversine_distance_m(
        config.office_lat,
        config.office_lng,
        fix.latitude,
        fix.longitude,
    );
    GeofenceReading {
        distance_meters,
        is_active_time: now_hour >= config.active_from_hour,
        is_leaving: distance_meters > config.threshold_meters,
    }
}
