use loadmeter_cli::config::{load_sla_file, PerfConfig, MAX_USERS};
use loadmeter_common::{LoadMeterError, SlaThresholds};
use std::io::Write;

#[test]
fn test_defaults_validate() {
    let c = PerfConfig::default();
    assert_eq!(c.users, 10);
    assert_eq!(c.spike_users, 50);
    assert_eq!(c.stress_users, 100);
    assert_eq!(c.sla, SlaThresholds::default());
    assert!(c.validate().is_ok());
}

#[test]
fn test_zero_users_rejected() {
    let c = PerfConfig { users: 0, ..PerfConfig::default() };
    assert_eq!(
        c.validate().unwrap_err(),
        LoadMeterError::InvalidConfig("users must be at least 1".to_string())
    );
}

#[test]
fn test_success_rate_out_of_range_rejected() {
    let mut c = PerfConfig::default();
    c.sla.min_success_rate_percent = 120.0;
    assert!(matches!(c.validate(), Err(LoadMeterError::InvalidConfig(_))));
}

#[test]
fn test_load_sla_file() {
    let mut f = tempfile::NamedTempFile::new().unwrap();
    write!(f, r#"{{"max_p95_ms": 800, "min_success_rate_percent": 97.5}}"#).unwrap();

    let sla = load_sla_file(f.path()).unwrap();
    assert_eq!(sla.max_p95_ms, 800.0);
    assert_eq!(sla.max_p99_ms, 5000.0);
    assert_eq!(sla.min_success_rate_percent, 97.5);
}

#[test]
fn test_load_sla_file_errors() {
    let dir = tempfile::tempdir().unwrap();
    assert!(load_sla_file(&dir.path().join("missing.json")).is_err());

    let mut f = tempfile::NamedTempFile::new().unwrap();
    write!(f, "not json").unwrap();
    assert!(matches!(load_sla_file(f.path()), Err(LoadMeterError::InvalidConfig(_))));
}

#[test]
fn test_user_counts_bounded() {
    let c = PerfConfig { stress_users: MAX_USERS + 1, ..PerfConfig::default() };
    assert!(matches!(c.validate(), Err(LoadMeterError::InvalidConfig(_))));

    let c = PerfConfig { users: usize::MAX, ..PerfConfig::default() };
    assert!(matches!(c.validate(), Err(LoadMeterError::InvalidConfig(_))));

    let c = PerfConfig { users: MAX_USERS, spike_users: MAX_USERS, stress_users: MAX_USERS, ..PerfConfig::default() };
    assert!(c.validate().is_ok());
}

#[test]
fn test_requests_per_session_validated() {
    let c = PerfConfig { requests_per_session: Some(0), ..PerfConfig::default() };
    assert!(matches!(c.validate(), Err(LoadMeterError::InvalidConfig(_))));

    let c = PerfConfig { requests_per_session: Some(3), ..PerfConfig::default() };
    assert!(c.validate().is_ok());
}
