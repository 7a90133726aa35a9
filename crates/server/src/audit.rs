use quoteflow_core::audit::{AuditEvent, AuditOutcome, AuditSink};
use tracing::{info, warn};

/// Forwards audit events to the structured log.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn emit(&self, event: AuditEvent) {
        let quote_id = event.quote_id.as_ref().map(|id| id.0.as_str()).unwrap_or("unknown");
        let metadata = serde_json::to_string(&event.metadata).unwrap_or_default();

        match event.outcome {
            AuditOutcome::Success => info!(
                event_name = %event.event_type,
                correlation_id = %event.correlation_id,
                quote_id = %quote_id,
                actor = %event.actor,
                audit_event_id = %event.event_id,
                metadata = %metadata,
                "audit"
            ),
            AuditOutcome::Rejected | AuditOutcome::Failed => warn!(
                event_name = %event.event_type,
                correlation_id = %event.correlation_id,
                quote_id = %quote_id,
                actor = %event.actor,
                audit_event_id = %event.event_id,
                outcome = ?event.outcome,
                metadata = %metadata,
                "audit"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use quoteflow_core::audit::{AuditCategory, AuditEvent, AuditOutcome, AuditSink};
    use quoteflow_core::domain::quote::QuoteId;

    use super::TracingAuditSink;

    #[test]
    fn emitting_without_subscriber_is_harmless() {
        let sink = TracingAuditSink;
        sink.emit(
            AuditEvent::new(
                Some(QuoteId("Q-1".to_owned())),
                "corr",
                "workflow.step_completed",
                AuditCategory::Workflow,
                "tester",
                AuditOutcome::Success,
            )
            .with_metadata("step_id", "pricing"),
        );
        sink.emit(AuditEvent::new(
            None,
            "corr",
            "workflow.step_rejected",
            AuditCategory::Workflow,
            "tester",
            AuditOutcome::Rejected,
        ));
    }
}
