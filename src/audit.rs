// ============================================================================
// Audit - Pipeline Outcome Records
// ============================================================================
//
// Every terminal pipeline outcome produces a structured audit record:
// rejected and denied messages never disappear silently. Records carry the
// reason and a salted subject hash - never the raw credential.
//
// ============================================================================

use chrono::Utc;
use serde::Serialize;

use crate::relay::pipeline::PipelineOutcome;
use crate::utils::log_safe_id;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditOutcome {
    Dispatched,
    Rejected,
    Denied,
    DispatchFailed,
}

/// One audit record per message traversal.
#[derive(Debug, Clone, Serialize)]
pub struct AuditRecord {
    /// ISO8601 timestamp
    pub timestamp: String,
    pub message_id: String,
    pub outcome: AuditOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Salted hash of the authenticated subject, when one was established
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject_hash: Option<String>,
}

impl AuditRecord {
    pub fn from_outcome(message_id: &str, outcome: &PipelineOutcome, hash_salt: &str) -> Self {
        let (outcome_kind, reason, subject_hash) = match outcome {
            PipelineOutcome::Dispatched(principal) => (
                AuditOutcome::Dispatched,
                None,
                Some(log_safe_id(&principal.username, hash_salt)),
            ),
            PipelineOutcome::Rejected(reason) => {
                (AuditOutcome::Rejected, Some(reason.to_string()), None)
            }
            PipelineOutcome::Denied(reason) => {
                (AuditOutcome::Denied, Some(reason.to_string()), None)
            }
            PipelineOutcome::DispatchFailed(reason) => {
                (AuditOutcome::DispatchFailed, Some(reason.clone()), None)
            }
        };

        Self {
            timestamp: Utc::now().to_rfc3339(),
            message_id: message_id.to_string(),
            outcome: outcome_kind,
            reason,
            subject_hash,
        }
    }
}

/// Emit one audit record for a terminal pipeline outcome.
pub fn record_outcome(message_id: &str, outcome: &PipelineOutcome, hash_salt: &str) {
    let record = AuditRecord::from_outcome(message_id, outcome, hash_salt);
    match serde_json::to_string(&record) {
        Ok(json) => tracing::info!(target: "audit", record = %json, "pipeline outcome"),
        Err(e) => tracing::error!(target: "audit", error = %e, "failed to serialize audit record"),
    }
}
