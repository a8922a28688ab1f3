//! Schedule reconciliation
//!
//! One invocation walks a small state machine:
//!
//! ```text
//! Start ─┬─> AuthFailed
//!        └─> ScheduleChecked ─┬─> NoMatch
//!                             └─> ModeChecked ─┬─> AlreadySatisfied
//!                                              └─> SwitchRequested ─┬─> Switched
//!                                                                   └─> SwitchFailed
//! ```
//!
//! Nothing is carried over between invocations and nothing is retried; the
//! next scheduled invocation is the retry.

use crate::config::Config;
use crate::device::{DeviceClient, DeviceConnector};
use crate::error::Result;
use crate::logging::{LogContext, StructuredLogger, get_logger, get_logger_with_context};
use crate::mode::Mode;
use crate::normalizer::{ModeNormalizer, NormalizedMode};
use crate::schedule::Schedule;
use chrono::DateTime;
use chrono_tz::Tz;
use serde::Serialize;
use std::fmt;

/// Why an invocation failed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailureReason {
    /// The device session could not be established
    Authentication { cause: String },

    /// The mode write was rejected or never arrived
    Switch { target: Mode, cause: String },
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::Authentication { cause } => write!(f, "authentication failed: {}", cause),
            FailureReason::Switch { target, cause } => {
                write!(f, "could not switch to {}: {}", target, cause)
            }
        }
    }
}

/// Result of one reconciliation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ReconciliationOutcome {
    Switched { to: Mode },
    AlreadyInMode { mode: Mode },
    NoScheduleMatch,
    Failed(FailureReason),
}

impl ReconciliationOutcome {
    /// Success/failure status for the invoking transport
    pub fn is_success(&self) -> bool {
        !matches!(self, ReconciliationOutcome::Failed(_))
    }

    /// Short human-readable message
    pub fn summary(&self) -> String {
        match self {
            ReconciliationOutcome::Switched { to } => format!("Switched to {}", to),
            ReconciliationOutcome::AlreadyInMode { mode } => format!("Already in {}", mode),
            ReconciliationOutcome::NoScheduleMatch => "No action taken".to_string(),
            ReconciliationOutcome::Failed(reason) => format!("Failed: {}", reason),
        }
    }
}

impl fmt::Display for ReconciliationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.summary())
    }
}

/// Reconcile the device against `schedule` at `now` using an
/// already-connected client.
pub async fn reconcile(
    now: &DateTime<Tz>,
    schedule: &Schedule,
    normalizer: &ModeNormalizer,
    client: &dyn DeviceClient,
) -> ReconciliationOutcome {
    let logger = get_logger("reconciler");
    reconcile_with_logger(now, schedule, normalizer, client, &logger).await
}

async fn reconcile_with_logger(
    now: &DateTime<Tz>,
    schedule: &Schedule,
    normalizer: &ModeNormalizer,
    client: &dyn DeviceClient,
    logger: &StructuredLogger,
) -> ReconciliationOutcome {
    let at = crate::clock::time_of_day(now);
    logger.info(&format!("Current time: {} ({})", at, now.timezone().name()));

    let Some(target) = schedule.lookup(at) else {
        logger.info("No schedule match for current time");
        return ReconciliationOutcome::NoScheduleMatch;
    };
    logger.info(&format!("Schedule match at {}: target mode {}", at, target));

    let current = normalizer.normalize(client.get_mode().await);
    logger.info(&format!("Current mode is {}", current));

    if current == NormalizedMode::Known(target) {
        logger.info(&format!("Already in {} mode, no action needed", target));
        return ReconciliationOutcome::AlreadyInMode { mode: target };
    }
    if current == NormalizedMode::Unknown {
        logger.warn(&format!(
            "Current mode could not be determined, switching to {} anyway",
            target
        ));
    }

    match client.set_mode(target).await {
        Ok(()) => {
            logger.info(&format!("Successfully switched to {}", target));
            ReconciliationOutcome::Switched { to: target }
        }
        Err(e) => {
            logger.error(&format!("Failed to switch mode: {}", e));
            ReconciliationOutcome::Failed(FailureReason::Switch {
                target,
                cause: e.to_string(),
            })
        }
    }
}

/// Validated schedule and normalizer, shared by every invocation
#[derive(Debug, Clone)]
pub struct Reconciler {
    schedule: Schedule,
    normalizer: ModeNormalizer,
}

impl Reconciler {
    pub fn new(schedule: Schedule, normalizer: ModeNormalizer) -> Self {
        Self {
            schedule,
            normalizer,
        }
    }

    /// Build from configuration; fails when the schedule is invalid
    pub fn from_config(config: &Config) -> Result<Self> {
        let schedule = config.schedule()?;
        let logger = get_logger("reconciler");
        if schedule.is_empty() {
            logger.warn("Schedule is empty; every invocation will take no action");
        } else {
            logger.info(&format!("Loaded schedule with {} entries", schedule.len()));
        }
        for time in schedule.duplicate_times() {
            logger.warn(&format!(
                "Schedule lists {} more than once; only the first entry is used",
                time
            ));
        }
        Ok(Self::new(schedule, config.normalizer()))
    }

    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    /// Reconcile with an already-connected client
    pub async fn reconcile(
        &self,
        now: &DateTime<Tz>,
        client: &dyn DeviceClient,
    ) -> ReconciliationOutcome {
        reconcile(now, &self.schedule, &self.normalizer, client).await
    }

    /// Full invocation: connect, then reconcile
    pub async fn run(
        &self,
        now: &DateTime<Tz>,
        connector: &dyn DeviceConnector,
    ) -> ReconciliationOutcome {
        let invocation_id = uuid::Uuid::new_v4().to_string();
        let logger = get_logger_with_context(
            LogContext::new("reconciler").with_invocation_id(invocation_id),
        );
        logger.info("Starting reconciliation");

        let client = match connector.connect().await {
            Ok(client) => client,
            Err(e) => {
                logger.error(&format!("Failed to authenticate with the gateway: {}", e));
                return ReconciliationOutcome::Failed(FailureReason::Authentication {
                    cause: e.to_string(),
                });
            }
        };

        let outcome =
            reconcile_with_logger(now, &self.schedule, &self.normalizer, client.as_ref(), &logger)
                .await;
        logger.info(&format!("Finished: {}", outcome));
        outcome
    }
}
