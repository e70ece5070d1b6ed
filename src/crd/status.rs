//! # ClusterSecret Status
//!
//! Status types for tracking distribution state and conditions.

use crate::constants::CONDITION_READY;
use serde::{Deserialize, Serialize};

/// Status of the ClusterSecret resource
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClusterSecretStatus {
    /// Conditions represent the latest available observations.
    /// A single `Ready` condition is maintained.
    #[serde(default)]
    pub conditions: Vec<Condition>,
    /// Number of keys in the synthesized secret data
    #[serde(default)]
    pub data_count: i32,
    /// Sorted names of the namespaces admitted by the selector
    #[serde(default)]
    pub matching_namespaces: Vec<String>,
    #[serde(default)]
    pub matching_namespaces_count: i32,
    /// Namespaces holding an up to date copy after the last cycle
    #[serde(default)]
    pub ready_secrets_count: i32,
    /// `"<ready>/<matching>"`, shown as a printer column
    #[serde(default = "default_ready_secrets_ratio")]
    pub ready_secrets_ratio: String,
}

impl Default for ClusterSecretStatus {
    fn default() -> Self {
        Self {
            conditions: Vec::new(),
            data_count: 0,
            matching_namespaces: Vec::new(),
            matching_namespaces_count: 0,
            ready_secrets_count: 0,
            ready_secrets_ratio: default_ready_secrets_ratio(),
        }
    }
}

/// Default value for the ready ratio
pub fn default_ready_secrets_ratio() -> String {
    "0/0".to_string()
}

/// Kubernetes-style condition
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    pub r#type: String,
    /// One of `True`, `False`, `Unknown`
    pub status: String,
    #[serde(default)]
    pub last_transition_time: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub observed_generation: Option<i64>,
}

/// Tri-state value of a condition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionStatus {
    True,
    False,
    Unknown,
}

impl ConditionStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ConditionStatus::True => "True",
            ConditionStatus::False => "False",
            ConditionStatus::Unknown => "Unknown",
        }
    }
}

impl Condition {
    /// Build a `Ready` condition; the transition time is filled in by
    /// [`ClusterSecretStatus::set_condition`].
    #[must_use]
    pub fn ready(
        status: ConditionStatus,
        reason: impl Into<String>,
        message: impl Into<String>,
        observed_generation: Option<i64>,
    ) -> Self {
        Self {
            r#type: CONDITION_READY.to_string(),
            status: status.as_str().to_string(),
            last_transition_time: None,
            reason: Some(reason.into()),
            message: Some(message.into()),
            observed_generation,
        }
    }
}

impl ClusterSecretStatus {
    #[must_use]
    pub fn condition(&self, r#type: &str) -> Option<&Condition> {
        self.conditions.iter().find(|c| c.r#type == r#type)
    }

    #[must_use]
    pub fn ready_condition(&self) -> Option<&Condition> {
        self.condition(CONDITION_READY)
    }

    /// Insert or update a condition by type.
    ///
    /// The transition time only moves when the condition status changes, so
    /// re-applying an identical condition leaves the status untouched.
    pub fn set_condition(&mut self, mut condition: Condition, now: &str) {
        match self
            .conditions
            .iter_mut()
            .find(|c| c.r#type == condition.r#type)
        {
            Some(existing) => {
                if existing.status != condition.status {
                    existing.status = condition.status;
                    existing.last_transition_time = Some(
                        condition
                            .last_transition_time
                            .unwrap_or_else(|| now.to_string()),
                    );
                }
                existing.reason = condition.reason;
                existing.message = condition.message;
                existing.observed_generation = condition.observed_generation;
            }
            None => {
                if condition.last_transition_time.is_none() {
                    condition.last_transition_time = Some(now.to_string());
                }
                self.conditions.push(condition);
            }
        }
    }
}
