//! Session control over a file-backed configuration.

mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use common::{office_config, Harness};
use punch_reminder_core::{
    Config, ConfigError, CoreError, FileConfigSource, MonitorService, MonitorStatus, PlatformError,
};

fn service_with_file(harness: &Harness, dir: &tempfile::TempDir) -> (MonitorService, std::path::PathBuf) {
    let path = dir.path().join("config.toml");
    let source = Arc::new(FileConfigSource::new(&path));
    (MonitorService::new(source, harness.collaborators()), path)
}

#[tokio::test(start_paused = true)]
async fn start_session_reads_file_and_checks_immediately() {
    let harness = Harness::new(80.0, 20);
    let dir = tempfile::tempdir().unwrap();
    let (service, path) = service_with_file(&harness, &dir);
    office_config().save_to(&path).unwrap();

    let mut sub = service.subscribe();
    service.start_session().unwrap();
    assert!(service.is_running());

    let event = sub.events.recv().await.unwrap();
    assert_eq!(event.status, MonitorStatus::Alert);
    assert_eq!(service.monitor().config(), Some(office_config()));

    assert!(service.stop_session());
    assert!(!service.is_running());
}

#[tokio::test(start_paused = true)]
async fn missing_file_starts_with_defaults_and_never_checks() {
    let harness = Harness::new(80.0, 20);
    let dir = tempfile::tempdir().unwrap();
    let (service, path) = service_with_file(&harness, &dir);

    service.start_session().unwrap();
    assert!(path.exists());
    assert_eq!(service.monitor().config(), Some(Config::default()));

    tokio::time::sleep(Duration::from_secs(120)).await;
    assert_eq!(harness.location.request_count(), 0);
    service.stop_session();
}

#[tokio::test(start_paused = true)]
async fn reload_picks_up_edited_file() {
    let harness = Harness::new(80.0, 20);
    let dir = tempfile::tempdir().unwrap();
    let (service, path) = service_with_file(&harness, &dir);
    office_config().save_to(&path).unwrap();

    let mut sub = service.subscribe();
    service.start_session().unwrap();
    assert_eq!(sub.events.recv().await.unwrap().status, MonitorStatus::Alert);

    let mut edited = office_config();
    edited.set("check_interval_seconds", "300").unwrap();
    edited.save_to(&path).unwrap();
    service.reload_config().unwrap();

    assert_eq!(
        service.monitor().config().map(|c| c.check_interval_seconds),
        Some(300)
    );
    // Immediate re-check, then nothing until the new interval elapses.
    sub.events.recv().await.unwrap();
    tokio::time::sleep(Duration::from_secs(200)).await;
    assert!(sub.events.try_recv().is_err());
    service.stop_session();
}

#[tokio::test(start_paused = true)]
async fn invalid_file_on_reload_keeps_running_config() {
    let harness = Harness::new(80.0, 20);
    let dir = tempfile::tempdir().unwrap();
    let (service, path) = service_with_file(&harness, &dir);
    office_config().save_to(&path).unwrap();
    service.start_session().unwrap();

    std::fs::write(&path, "active_from_hour = 42\n").unwrap();
    let err = service.reload_config().unwrap_err();
    assert!(matches!(err, ConfigError::InvalidValue { .. }));

    std::fs::write(&path, "threshold_meters = [").unwrap();
    let err = service.reload_config().unwrap_err();
    assert!(matches!(err, ConfigError::ParseFailed(_)));

    assert!(service.is_running());
    assert_eq!(service.monitor().config(), Some(office_config()));
    service.stop_session();
}

#[tokio::test(start_paused = true)]
async fn invalid_file_on_start_schedules_nothing() {
    let harness = Harness::new(80.0, 20);
    let dir = tempfile::tempdir().unwrap();
    let (service, path) = service_with_file(&harness, &dir);
    std::fs::write(&path, "check_interval_seconds = 0\n").unwrap();

    assert!(service.start_session().is_err());
    assert!(!service.is_running());
    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(harness.location.request_count(), 0);
}

// ============================================================================
// Checked-in-today query
// ============================================================================

#[tokio::test]
async fn checked_in_today_queries_since_local_midnight() {
    let harness = Harness::new(80.0, 20);
    let dir = tempfile::tempdir().unwrap();
    let (service, path) = service_with_file(&harness, &dir);
    let mut config = office_config();
    config.checkin_app_id = "com.example.punch".into();
    config.save_to(&path).unwrap();

    let status = service.checked_in_today().unwrap();
    assert!(!status.checked_in);
    assert_eq!(status.app_id, "com.example.punch");
    // 12:00 UTC at local hour 20: local midnight was 16:00 UTC the day before.
    let midnight = Utc.with_ymd_and_hms(2026, 10, 15, 16, 0, 0).unwrap();
    assert_eq!(status.since, midnight);
    assert_eq!(*harness.usage.last_since.lock().unwrap(), Some(midnight));

    harness.usage.set_used(true);
    assert!(service.checked_in_today().unwrap().checked_in);
    assert!(!service.is_running());
}

#[tokio::test(start_paused = true)]
async fn checked_in_today_uses_running_app_id() {
    let harness = Harness::new(80.0, 20);
    let dir = tempfile::tempdir().unwrap();
    let (service, path) = service_with_file(&harness, &dir);
    office_config().save_to(&path).unwrap();
    service.start_session().unwrap();

    // Edited on disk but not reloaded.
    let mut edited = office_config();
    edited.checkin_app_id = "com.example.other".into();
    edited.save_to(&path).unwrap();

    let status = service.checked_in_today().unwrap();
    assert_eq!(status.app_id, office_config().checkin_app_id);
    service.stop_session();
}

#[tokio::test]
async fn checked_in_today_reports_usage_failure() {
    let harness = Harness::new(80.0, 20);
    let dir = tempfile::tempdir().unwrap();
    let (service, _path) = service_with_file(&harness, &dir);
    harness.usage.failing.store(true, Ordering::SeqCst);

    let err = service.checked_in_today().unwrap_err();
    assert!(matches!(err, CoreError::Platform(PlatformError::UsageQuery { .. })));
}
