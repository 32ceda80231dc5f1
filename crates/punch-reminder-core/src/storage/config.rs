//! TOML-based monitor configuration.
//!
//! Holds the office location, geofence radius, activation hour and the
//! cadence of checks and reminders. A `Config` is an immutable snapshot:
//! the monitor reads it once per session and replaces it wholesale on reload.
//!
//! Configuration is stored at `~/.config/punch-reminder/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;
use crate::platform::ConfigSource;

/// Longest acknowledgment window: one day.
const MAX_CHECKIN_WINDOW_MINUTES: u64 = 24 * 60;

/// Monitor configuration.
///
/// Serialized to/from TOML. Every field has a default so partial files load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Office latitude in degrees. `0.0` together with `office_lng == 0.0`
    /// means "not configured".
    #[serde(default)]
    pub office_lat: f64,
    #[serde(default)]
    pub office_lng: f64,
    /// Geofence radius in meters.
    #[serde(default = "default_threshold_meters")]
    pub threshold_meters: f64,
    /// Local hour of day (0-23) from which leaving the office raises an alert.
    #[serde(default = "default_active_from_hour")]
    pub active_from_hour: u32,
    #[serde(default = "default_check_interval_seconds")]
    pub check_interval_seconds: u64,
    #[serde(default)]
    pub auto_launch_checkin_app: bool,
    /// Application whose use acknowledges an alert.
    #[serde(default = "default_checkin_app_id")]
    pub checkin_app_id: String,
    /// How far back a check-in app launch still counts as acknowledgment.
    #[serde(default = "default_checkin_window_minutes")]
    pub checkin_window_minutes: u64,
    #[serde(default = "default_escalation_interval_seconds")]
    pub escalation_interval_seconds: u64,
    #[serde(default = "default_location_timeout_seconds")]
    pub location_timeout_seconds: u64,
}

fn default_threshold_meters() -> f64 {
    50.0
}
fn default_active_from_hour() -> u32 {
    19
}
fn default_check_interval_seconds() -> u64 {
    30
}
fn default_checkin_app_id() -> String {
    "com.facishare.fs".into()
}
fn default_checkin_window_minutes() -> u64 {
    2
}
fn default_escalation_interval_seconds() -> u64 {
    60
}
fn default_location_timeout_seconds() -> u64 {
    10
}

impl Default for Config {
    fn default() -> Self {
        Self {
            office_lat: 0.0,
            office_lng: 0.0,
            threshold_meters: default_threshold_meters(),
            active_from_hour: default_active_from_hour(),
            check_interval_seconds: default_check_interval_seconds(),
            auto_launch_checkin_app: false,
            checkin_app_id: default_checkin_app_id(),
            checkin_window_minutes: default_checkin_window_minutes(),
            escalation_interval_seconds: default_escalation_interval_seconds(),
            location_timeout_seconds: default_location_timeout_seconds(),
        }
    }
}

impl Config {
    /// Office point is considered unset when both coordinates are exactly zero.
    pub fn office_is_set(&self) -> bool {
        !(self.office_lat == 0.0 && self.office_lng == 0.0)
    }

    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_seconds)
    }

    pub fn escalation_interval(&self) -> Duration {
        Duration::from_secs(self.escalation_interval_seconds)
    }

    pub fn location_timeout(&self) -> Duration {
        Duration::from_secs(self.location_timeout_seconds)
    }

    /// `None` when the window is too large to represent.
    pub fn checkin_window(&self) -> Option<chrono::Duration> {
        i64::try_from(self.checkin_window_minutes)
            .ok()
            .and_then(chrono::Duration::try_minutes)
    }

    /// Reject values the monitor cannot run with.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` naming the first offending key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.office_lat.is_finite() || self.office_lat.abs() > 90.0 {
            return Err(ConfigError::invalid("office_lat", "must be within [-90, 90]"));
        }
        if !self.office_lng.is_finite() || self.office_lng.abs() > 180.0 {
            return Err(ConfigError::invalid("office_lng", "must be within [-180, 180]"));
        }
        if !self.threshold_meters.is_finite() || self.threshold_meters < 0.0 {
            return Err(ConfigError::invalid(
                "threshold_meters",
                "must be a finite value >= 0",
            ));
        }
        if self.active_from_hour > 23 {
            return Err(ConfigError::invalid("active_from_hour", "must be within 0-23"));
        }
        if self.check_interval_seconds == 0 {
            return Err(ConfigError::invalid("check_interval_seconds", "must be >= 1"));
        }
        if self.escalation_interval_seconds == 0 {
            return Err(ConfigError::invalid(
                "escalation_interval_seconds",
                "must be >= 1",
            ));
        }
        if self.location_timeout_seconds == 0 {
            return Err(ConfigError::invalid("location_timeout_seconds", "must be >= 1"));
        }
        if !(1..=MAX_CHECKIN_WINDOW_MINUTES).contains(&self.checkin_window_minutes) {
            return Err(ConfigError::invalid(
                "checkin_window_minutes",
                format!("must be within 1-{MAX_CHECKIN_WINDOW_MINUTES}"),
            ));
        }
        if self.checkin_app_id.trim().is_empty() {
            return Err(ConfigError::invalid("checkin_app_id", "must not be empty"));
        }
        Ok(())
    }

    fn set_json_value_by_key(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let obj = root
            .as_object_mut()
            .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
        let existing = obj
            .get(key)
            .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;

        let new_value = match existing {
            serde_json::Value::Bool(_) => {
                let parsed = value
                    .parse::<bool>()
                    .map_err(|e| ConfigError::invalid(key, e.to_string()))?;
                serde_json::Value::Bool(parsed)
            }
            serde_json::Value::Number(n) if n.is_f64() => {
                let parsed = value
                    .parse::<f64>()
                    .map_err(|_| ConfigError::invalid(key, format!("cannot parse '{value}' as number")))?;
                serde_json::Number::from_f64(parsed)
                    .map(serde_json::Value::Number)
                    .ok_or_else(|| ConfigError::invalid(key, format!("'{value}' is not finite")))?
            }
            serde_json::Value::Number(_) => {
                let parsed = value.parse::<u64>().map_err(|_| {
                    ConfigError::invalid(key, format!("cannot parse '{value}' as integer"))
                })?;
                serde_json::Value::Number(parsed.into())
            }
            _ => serde_json::Value::String(value.into()),
        };

        obj.insert(key.to_string(), new_value);
        Ok(())
    }

    /// Load from `path`, writing the defaults there when it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, the values fail
    /// validation, or the default config cannot be written.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let cfg = match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str::<Config>(&content)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                cfg
            }
            Err(e) => {
                return Err(ConfigError::LoadFailed {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })
            }
        };
        cfg.validate()?;
        Ok(cfg)
    }

    /// Persist to `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| save_failed(e.to_string()))?;
        }
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))
    }

    /// Get a config value as string by key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        match json.get(key)? {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key. The result must still pass validation.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the updated config is invalid. `self` is unchanged on error.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json =
            serde_json::to_value(&*self).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        Self::set_json_value_by_key(&mut json, key, value)?;
        let updated: Config =
            serde_json::from_value(json).map_err(|e| ConfigError::invalid(key, e.to_string()))?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }
}

/// Config file under `home` for the given `PUNCH_REMINDER_ENV` value.
fn config_path_in(home: &Path, env: Option<&str>) -> PathBuf {
    let app_dir = match env {
        Some("dev") => "punch-reminder-dev",
        _ => "punch-reminder",
    };
    home.join(".config").join(app_dir).join("config.toml")
}

/// Reads the monitor configuration from a TOML file.
#[derive(Debug, Clone)]
pub struct FileConfigSource {
    path: PathBuf,
}

impl FileConfigSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Source at `~/.config/punch-reminder/config.toml`, or under
    /// `punch-reminder-dev` when `PUNCH_REMINDER_ENV=dev`.
    ///
    /// The directory is created on first load.
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    pub fn default_location() -> Result<Self, ConfigError> {
        let home = dirs::home_dir().ok_or_else(|| ConfigError::LoadFailed {
            path: PathBuf::from("~/.config/punch-reminder"),
            message: "home directory not found".into(),
        })?;
        let env = std::env::var("PUNCH_REMINDER_ENV").ok();
        Ok(Self::new(config_path_in(&home, env.as_deref())))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigSource for FileConfigSource {
    fn load_config(&self) -> Result<Config, ConfigError> {
        Config::load_from(&self.path)
    }
}
