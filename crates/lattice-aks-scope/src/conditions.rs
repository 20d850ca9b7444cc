//! Kubernetes-style conditions recorded by scopes

use chrono::{DateTime, Utc};
use serde::Serialize;

use lattice_aks_common::{Error, Result};

/// Condition type reporting whether the bootstrap extension succeeded
pub const BOOTSTRAP_SUCCEEDED_CONDITION: &str = "BootstrapSucceeded";

/// Reason used while the bootstrap extension is still running
pub const BOOTSTRAP_IN_PROGRESS_REASON: &str = "BootstrapInProgress";

/// Reason used after the bootstrap extension failed
pub const BOOTSTRAP_FAILED_REASON: &str = "BootstrapFailed";

/// Status of a condition
#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
pub enum ConditionStatus {
    /// Condition holds
    True,
    /// Condition does not hold
    False,
    /// Not yet known
    Unknown,
}

/// Condition following Kubernetes API conventions
#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// Type of condition
    #[serde(rename = "type")]
    pub type_: String,
    /// True, False or Unknown
    pub status: ConditionStatus,
    /// Machine-readable reason
    pub reason: String,
    /// Human-readable message
    pub message: String,
    /// Last time the condition transitioned
    pub last_transition_time: DateTime<Utc>,
}

impl Condition {
    /// Create a new condition with the current timestamp
    pub fn new(
        type_: impl Into<String>,
        status: ConditionStatus,
        reason: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            type_: type_.into(),
            status,
            reason: reason.into(),
            message: message.into(),
            last_transition_time: Utc::now(),
        }
    }
}

/// Map a bootstrap extension's provisioning state to a condition.
///
/// The returned result is what the caller should surface for this extension:
/// `Ok` once the extension succeeded (or reports a state we do not track),
/// a retryable error while it is creating or updating, and a permanent error
/// once it failed.
pub fn bootstrap_condition(
    provisioning_state: &str,
    extension_name: &str,
) -> (Condition, Result<()>) {
    let resource = format!("extension {}", extension_name);
    match provisioning_state {
        "Succeeded" => (
            Condition::new(BOOTSTRAP_SUCCEEDED_CONDITION, ConditionStatus::True, "", ""),
            Ok(()),
        ),
        "Creating" | "Updating" => (
            Condition::new(
                BOOTSTRAP_SUCCEEDED_CONDITION,
                ConditionStatus::False,
                BOOTSTRAP_IN_PROGRESS_REASON,
                format!("{} is {}", resource, provisioning_state),
            ),
            Err(Error::pending(resource, provisioning_state)),
        ),
        "Failed" => (
            Condition::new(
                BOOTSTRAP_SUCCEEDED_CONDITION,
                ConditionStatus::False,
                BOOTSTRAP_FAILED_REASON,
                format!("{} failed", resource),
            ),
            Err(Error::provisioning_failed(resource, provisioning_state)),
        ),
        other => (
            Condition::new(
                BOOTSTRAP_SUCCEEDED_CONDITION,
                ConditionStatus::Unknown,
                "",
                format!("{} reports state {:?}", resource, other),
            ),
            Ok(()),
        ),
    }
}
