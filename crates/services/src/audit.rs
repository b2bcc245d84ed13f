//! [`AuditRecorder`] that writes entries to the structured log.

use async_trait::async_trait;
use backstage_core::collaborators::{AuditEntry, AuditRecorder};

/// Emits every audit entry as an `audit` target log event.
#[derive(Debug, Clone, Default)]
pub struct TracingAuditRecorder;

#[async_trait]
impl AuditRecorder for TracingAuditRecorder {
    async fn record(&self, entry: AuditEntry) {
        tracing::info!(
            target: "audit",
            actor_user_id = ?entry.actor_user_id,
            action = entry.action,
            entity_type = entry.entity_type,
            entity_id = entry.entity_id,
            details = %entry.details,
            "Audit"
        );
    }
}
