use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::Report;

/// Default time a reviewer gets before the gate is bypassed
pub const DEFAULT_APPROVAL_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(300);

#[derive(Error, Debug)]
pub enum ApprovalError {
    #[error("Approval channel unavailable: {0}")]
    Unavailable(String),

    #[error("Approval was interrupted")]
    Interrupted,
}

/// A reviewer's verdict on a draft report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApprovalDecision {
    pub approved: bool,
    pub reason: Option<String>,
}

impl ApprovalDecision {
    pub fn approve() -> Self {
        Self {
            approved: true,
            reason: None,
        }
    }

    pub fn reject(reason: impl Into<String>) -> Self {
        Self {
            approved: false,
            reason: Some(reason.into()),
        }
    }
}

/// Recorded result of the approval step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ApprovalOutcome {
    Approved,
    Rejected { reason: String },
    /// The gate failed or timed out, so the results were released anyway
    BypassedDueToError { error: String },
}

impl ApprovalOutcome {
    pub fn releases_results(&self) -> bool {
        !matches!(self, ApprovalOutcome::Rejected { .. })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ApprovalOutcome::Approved => "approved",
            ApprovalOutcome::Rejected { .. } => "rejected",
            ApprovalOutcome::BypassedDueToError { .. } => "bypassed_due_to_error",
        }
    }
}

impl std::fmt::Display for ApprovalOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApprovalOutcome::Approved => write!(f, "approved"),
            ApprovalOutcome::Rejected { reason } => write!(f, "rejected: {}", reason),
            ApprovalOutcome::BypassedDueToError { error } => {
                write!(f, "bypassed due to error: {}", error)
            }
        }
    }
}

/// Human-in-the-loop review of a draft report before it is published
#[async_trait]
pub trait ApprovalGate: Send + Sync {
    fn name(&self) -> &str;

    async fn approve(&self, draft: &Report) -> Result<ApprovalDecision, ApprovalError>;
}

/// Approves every report without asking anyone
pub struct AutoApprove;

#[async_trait]
impl ApprovalGate for AutoApprove {
    fn name(&self) -> &str {
        "auto"
    }

    async fn approve(&self, _draft: &Report) -> Result<ApprovalDecision, ApprovalError> {
        Ok(ApprovalDecision::approve())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_rejection_withholds_results() {
        assert!(ApprovalOutcome::Approved.releases_results());
        assert!(ApprovalOutcome::BypassedDueToError {
            error: "timeout".to_string()
        }
        .releases_results());
        assert!(!ApprovalOutcome::Rejected {
            reason: "scores look off".to_string()
        }
        .releases_results());
    }

    #[test]
    fn test_outcome_serialization() {
        let json = serde_json::to_value(ApprovalOutcome::Rejected {
            reason: "incomplete".to_string(),
        })
        .unwrap();
        assert_eq!(json["status"], "rejected");
        assert_eq!(json["reason"], "incomplete");

        let json = serde_json::to_value(ApprovalOutcome::Approved).unwrap();
        assert_eq!(json["status"], "approved");
    }
}
