//! Audit trail for state-changing operations.
//!
//! Events go to the `audit` tracing target so they can be routed separately,
//! e.g. `RUST_LOG=audit=info`.

use chrono::Utc;
use serde_json::Value;

/// Outcome recorded with an audit event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditStatus {
    Success,
    Failure,
}

impl AuditStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditStatus::Success => "success",
            AuditStatus::Failure => "failure",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct AuditLogger;

impl AuditLogger {
    pub fn new() -> Self {
        Self
    }

    /// Emit one structured audit event
    pub fn log_action(
        &self,
        action: &str,
        resource: &str,
        resource_id: Option<&str>,
        details: Option<&Value>,
        status: AuditStatus,
    ) {
        let details = details.cloned().unwrap_or_else(|| Value::Object(Default::default()));

        tracing::info!(
            target: "audit",
            action = action,
            resource = resource,
            resource_id = resource_id.unwrap_or(""),
            details = %details,
            status = status.as_str(),
            timestamp = %Utc::now().to_rfc3339(),
            "audit_event"
        );
    }
}
