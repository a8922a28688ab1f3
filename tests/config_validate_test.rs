use modeswitch::config::{Config, ScheduleItem, verify_schedule};
use modeswitch::device::ModeReport;
use modeswitch::error::SwitcherError;
use modeswitch::mode::Mode;
use modeswitch::normalizer::NormalizedMode;
use modeswitch::reconciler::Reconciler;
use std::io::Write;

const SAMPLE: &str = r#"
timezone: Europe/Amsterdam
schedule:
  - time: "00:00"
    mode: emergency_backup
  - time: "15:00"
    mode: time_of_use
normalizer:
  mode_codes:
    31337: self_consumption
  mode_names:
    Storm Guard: emergency_backup
device:
  base_url: https://gateway.example.com/api
  username: owner@example.com
  password: secret
  gateway_id: "10060005A02X"
web:
  port: 9090
"#;

fn write_config(contents: &str) -> tempfile::NamedTempFile {
    let mut tmp = tempfile::NamedTempFile::new().unwrap();
    write!(tmp, "{}", contents).unwrap();
    tmp
}

#[test]
fn loads_yaml_with_partial_sections() {
    let tmp = write_config(SAMPLE);
    let cfg = Config::from_file(tmp.path()).unwrap();

    assert!(cfg.validate().is_ok());
    assert_eq!(cfg.tz().unwrap(), chrono_tz::Europe::Amsterdam);
    assert_eq!(cfg.schedule.len(), 2);
    assert_eq!(cfg.device.gateway_id, "10060005A02X");
    assert_eq!(cfg.device.timeout_secs, 10);
    assert_eq!(cfg.web.port, 9090);
    assert_eq!(cfg.web.host, "127.0.0.1");

    let normalizer = cfg.normalizer();
    assert_eq!(
        normalizer.normalize_report(&ModeReport::Code(31337)),
        NormalizedMode::Known(Mode::SelfConsumption)
    );
    assert_eq!(
        normalizer.normalize_report(&"STORM GUARD".into()),
        NormalizedMode::Known(Mode::EmergencyBackup)
    );
}

#[test]
fn save_and_load_yaml_roundtrip() {
    let tmp_dir = tempfile::tempdir().unwrap();
    let path = tmp_dir.path().join("modeswitch.yaml");

    let mut cfg = Config::default();
    cfg.timezone = "America/New_York".to_string();
    cfg.schedule.push(ScheduleItem::new("18:30", "self_consumption"));
    cfg.device.password = "not-on-disk".to_string();

    cfg.save_to_file(&path).unwrap();
    let loaded = Config::from_file(&path).unwrap();

    assert_eq!(loaded.timezone, "America/New_York");
    assert_eq!(loaded.schedule, cfg.schedule);
    assert!(loaded.device.password.is_empty());
}

#[test]
fn from_file_with_invalid_yaml_fails() {
    let tmp = write_config("schedule: [this is: not valid");
    let err = Config::from_file(tmp.path()).unwrap_err();
    assert!(err.is_config());
    assert!(err.to_string().contains("Invalid YAML"));
}

#[test]
fn missing_file_is_a_config_error() {
    let tmp_dir = tempfile::tempdir().unwrap();
    let err = Config::from_file(tmp_dir.path().join("absent.yaml")).unwrap_err();
    assert!(matches!(err, SwitcherError::Config { .. }));
    assert!(err.to_string().contains("absent.yaml"));
}

#[test]
fn validation_rejects_non_canonical_modes() {
    let mut cfg = Config::default();
    cfg.schedule = vec![
        ScheduleItem::new("00:00", "backup"),
        ScheduleItem::new("01:00", "Time_Of_Use"),
        ScheduleItem::new("02:00", "self_consumption"),
    ];

    let err = cfg.validate().unwrap_err();
    assert!(err.is_config());
    assert_eq!(cfg.invalid_schedule_modes(), vec!["backup", "Time_Of_Use"]);
    assert!(Reconciler::from_config(&cfg).is_err());
}

#[test]
fn validation_rejects_malformed_times_and_timezones() {
    let mut cfg = Config::default();
    cfg.schedule = vec![ScheduleItem::new("3:00", "time_of_use")];
    assert!(cfg.validate().is_err());

    cfg = Config::default();
    cfg.timezone = "PST8PDT-ish".to_string();
    assert!(matches!(
        cfg.validate().unwrap_err(),
        SwitcherError::Validation { ref field, .. } if field == "timezone"
    ));

    cfg = Config::default();
    cfg.logging.level = "LOUD".to_string();
    assert!(cfg.validate().is_err());

    cfg = Config::default();
    cfg.device.timeout_secs = 0;
    assert!(cfg.validate().is_err());
}

#[test]
fn verify_schedule_reports_every_row() {
    let mut cfg = Config::default();
    cfg.schedule = vec![
        ScheduleItem::new("00:05", "emergency_backup"),
        ScheduleItem::new("04:00", "turbo"),
        ScheduleItem::new("25:00", "time_of_use"),
        ScheduleItem::new("00:05", "self_consumption"),
    ];

    let report = verify_schedule(&cfg);
    assert!(!report.is_valid());
    let flags: Vec<(bool, bool)> = report
        .checks
        .iter()
        .map(|c| (c.time_valid, c.mode_valid))
        .collect();
    assert_eq!(
        flags,
        vec![(true, true), (true, false), (false, true), (true, true)]
    );
    assert_eq!(report.duplicate_times, vec!["00:05".to_string()]);
}

#[test]
fn duplicate_times_load_unless_strict() {
    let mut cfg = Config::default();
    cfg.schedule = vec![
        ScheduleItem::new("06:00", "self_consumption"),
        ScheduleItem::new("06:00", "emergency_backup"),
    ];

    let reconciler = Reconciler::from_config(&cfg).unwrap();
    assert_eq!(
        reconciler.schedule().lookup("06:00".parse().unwrap()),
        Some(Mode::SelfConsumption)
    );

    cfg.schedule_strict = true;
    assert!(cfg.validate().is_err());
}

#[test]
fn mode_name_aliases_cannot_shadow_canonical_names() {
    let tmp = write_config(
        r#"
schedule:
  - time: "00:00"
    mode: emergency_backup
normalizer:
  mode_names:
    time_of_use: emergency_backup
"#,
    );
    let cfg = Config::from_file(tmp.path()).unwrap();

    let err = cfg.validate().unwrap_err();
    assert!(matches!(
        err,
        SwitcherError::Validation { ref field, .. } if field == "normalizer.mode_names"
    ));

    // Even unvalidated, a device really in time_of_use still gets switched
    let normalizer = cfg.normalizer();
    assert_eq!(
        normalizer.normalize_report(&ModeReport::from(Mode::TimeOfUse)),
        NormalizedMode::Known(Mode::TimeOfUse)
    );
}

#[test]
fn alias_matching_its_own_canonical_mode_is_accepted() {
    let mut cfg = Config::default();
    cfg.normalizer
        .mode_names
        .insert("Time Of Use".to_string(), Mode::TimeOfUse);
    assert!(cfg.validate().is_ok());
}
