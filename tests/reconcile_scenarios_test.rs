mod common;

use common::{FakeConnector, FakeDevice, la_time, two_entry_schedule};
use modeswitch::device::ModeReport;
use modeswitch::mode::Mode;
use modeswitch::normalizer::ModeNormalizer;
use modeswitch::reconciler::{FailureReason, ReconciliationOutcome, Reconciler, reconcile};

fn reconciler() -> Reconciler {
    Reconciler::new(two_entry_schedule(), ModeNormalizer::default())
}

#[tokio::test]
async fn midnight_switches_from_time_of_use_to_backup() {
    let connector = FakeConnector::reporting(Mode::TimeOfUse);
    let outcome = reconciler().run(&la_time(0, 0), &connector).await;

    assert_eq!(
        outcome,
        ReconciliationOutcome::Switched {
            to: Mode::EmergencyBackup
        }
    );
    assert_eq!(connector.calls.writes(), vec![Mode::EmergencyBackup]);
}

#[tokio::test]
async fn midnight_already_in_backup_does_not_write() {
    let connector = FakeConnector::reporting(Mode::EmergencyBackup);
    let outcome = reconciler().run(&la_time(0, 0), &connector).await;

    assert_eq!(
        outcome,
        ReconciliationOutcome::AlreadyInMode {
            mode: Mode::EmergencyBackup
        }
    );
    assert_eq!(connector.calls.reads(), 1);
    assert!(connector.calls.writes().is_empty());
}

#[tokio::test]
async fn noon_has_no_match_and_touches_nothing() {
    let connector = FakeConnector::reporting(Mode::TimeOfUse);
    let outcome = reconciler().run(&la_time(12, 0), &connector).await;

    assert_eq!(outcome, ReconciliationOutcome::NoScheduleMatch);
    assert_eq!(connector.calls.device_calls(), 0);
    assert!(outcome.is_success());
}

#[tokio::test]
async fn unrecognized_code_switches_anyway() {
    let connector = FakeConnector::reporting(ModeReport::Code(31337));
    let outcome = reconciler().run(&la_time(15, 0), &connector).await;

    assert_eq!(outcome, ReconciliationOutcome::Switched { to: Mode::TimeOfUse });
    assert_eq!(connector.calls.writes(), vec![Mode::TimeOfUse]);
}

#[tokio::test]
async fn bad_credentials_fail_before_any_device_call() {
    let connector = FakeConnector::bad_credentials();
    let outcome = reconciler().run(&la_time(0, 0), &connector).await;

    assert!(matches!(
        outcome,
        ReconciliationOutcome::Failed(FailureReason::Authentication { .. })
    ));
    assert!(!outcome.is_success());
    assert_eq!(connector.calls.connects(), 1);
    assert_eq!(connector.calls.device_calls(), 0);
}

#[tokio::test]
async fn rejected_write_is_a_switch_failure() {
    let device = FakeDevice::reporting(Mode::SelfConsumption).rejecting_writes();
    let outcome = reconcile(
        &la_time(15, 0),
        &two_entry_schedule(),
        &ModeNormalizer::default(),
        &device,
    )
    .await;

    match outcome {
        ReconciliationOutcome::Failed(FailureReason::Switch { target, cause }) => {
            assert_eq!(target, Mode::TimeOfUse);
            assert!(cause.contains("503"));
        }
        other => panic!("unexpected outcome {other:?}"),
    }
    assert_eq!(device.calls.writes(), vec![Mode::TimeOfUse]);
}

#[tokio::test]
async fn unreadable_mode_is_treated_as_unknown() {
    let device = FakeDevice::unreadable();
    let outcome = reconcile(
        &la_time(0, 0),
        &two_entry_schedule(),
        &ModeNormalizer::default(),
        &device,
    )
    .await;

    assert_eq!(
        outcome,
        ReconciliationOutcome::Switched {
            to: Mode::EmergencyBackup
        }
    );
}

#[tokio::test]
async fn seconds_do_not_affect_the_match() {
    use chrono::Timelike;
    let now = la_time(15, 0).with_second(59).unwrap();
    let device = FakeDevice::reporting("time_of_use");
    let outcome = reconcile(&now, &two_entry_schedule(), &ModeNormalizer::default(), &device).await;
    assert_eq!(
        outcome,
        ReconciliationOutcome::AlreadyInMode {
            mode: Mode::TimeOfUse
        }
    );
}

#[tokio::test]
async fn every_minute_of_the_day_behaves() {
    let schedule = two_entry_schedule();
    let normalizer = ModeNormalizer::default();

    for minute_of_day in 0..24 * 60 {
        let now = la_time(minute_of_day / 60, minute_of_day % 60);
        let scheduled = match (minute_of_day / 60, minute_of_day % 60) {
            (0, 0) => Some(Mode::EmergencyBackup),
            (15, 0) => Some(Mode::TimeOfUse),
            _ => None,
        };

        for reported in Mode::ALL {
            let device = FakeDevice::reporting(reported);
            let outcome = reconcile(&now, &schedule, &normalizer, &device).await;

            match scheduled {
                None => {
                    assert_eq!(outcome, ReconciliationOutcome::NoScheduleMatch);
                    assert_eq!(device.calls.device_calls(), 0);
                }
                Some(target) if target == reported => {
                    assert_eq!(outcome, ReconciliationOutcome::AlreadyInMode { mode: target });
                    assert!(device.calls.writes().is_empty());
                }
                Some(target) => {
                    assert_eq!(outcome, ReconciliationOutcome::Switched { to: target });
                    assert_eq!(device.calls.writes(), vec![target]);
                }
            }
        }
    }
}

#[tokio::test]
async fn invocations_share_no_state() {
    let reconciler = reconciler();
    let first = FakeConnector::reporting(Mode::TimeOfUse);
    let second = FakeConnector::reporting(Mode::TimeOfUse);

    reconciler.run(&la_time(0, 0), &first).await;
    let outcome = reconciler.run(&la_time(0, 0), &second).await;

    assert_eq!(
        outcome,
        ReconciliationOutcome::Switched {
            to: Mode::EmergencyBackup
        }
    );
    assert_eq!(second.calls.writes().len(), 1);
}

#[tokio::test]
async fn shadowing_alias_does_not_suppress_a_switch() {
    use modeswitch::config::{Config, ScheduleItem};

    let mut config = Config::default();
    config.schedule = vec![ScheduleItem::new("00:00", "emergency_backup")];
    config
        .normalizer
        .mode_names
        .insert("time_of_use".to_string(), Mode::EmergencyBackup);

    let connector = FakeConnector::reporting(Mode::TimeOfUse);
    let outcome = Reconciler::from_config(&config)
        .unwrap()
        .run(&la_time(0, 0), &connector)
        .await;

    assert_eq!(
        outcome,
        ReconciliationOutcome::Switched {
            to: Mode::EmergencyBackup
        }
    );
    assert_eq!(connector.calls.writes(), vec![Mode::EmergencyBackup]);
}
