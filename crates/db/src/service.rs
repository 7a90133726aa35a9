use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{NaiveDate, Utc};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::{error, info, warn};

use quoteflow_core::audit::{AuditContext, AuditEvent, AuditOutcome, AuditSink, NoopAuditSink};
use quoteflow_core::domain::persona::Persona;
use quoteflow_core::domain::quote::{Quote, QuoteId};
use quoteflow_core::domain::workflow::StepId;
use quoteflow_core::errors::ApplicationError;
use quoteflow_core::query::{QuoteQuery, QuoteStats};
use quoteflow_core::workflow::{StepDraft, WorkflowEngine};

use crate::repositories::{QuoteRepository, RepositoryError};

type Clock = Arc<dyn Fn() -> NaiveDate + Send + Sync>;

/// One async lock per quote id. Mutations of the same quote run one at a time, different
/// quotes proceed independently. Entries only live while a mutation holds or awaits them.
#[derive(Default)]
struct QuoteLocks {
    locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl QuoteLocks {
    fn map(&self) -> MutexGuard<'_, HashMap<String, Arc<AsyncMutex<()>>>> {
        match self.locks.lock() {
            Ok(locks) => locks,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    async fn acquire(&self, id: &QuoteId) -> QuoteLockGuard<'_> {
        let lock = self.map().entry(id.0.clone()).or_default().clone();
        let held = lock.lock_owned().await;
        QuoteLockGuard { locks: self, key: id.0.clone(), _held: held }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.map().len()
    }
}

struct QuoteLockGuard<'a> {
    locks: &'a QuoteLocks,
    key: String,
    _held: OwnedMutexGuard<()>,
}

impl Drop for QuoteLockGuard<'_> {
    fn drop(&mut self) {
        let mut locks = self.locks.map();
        // Two owners left means the map and this guard: no other caller is queued.
        if locks.get(&self.key).is_some_and(|lock| Arc::strong_count(lock) <= 2) {
            locks.remove(&self.key);
        }
    }
}

/// Read, apply and persist workflow operations against the quote store.
pub struct WorkflowService {
    repository: Arc<dyn QuoteRepository>,
    engine: WorkflowEngine,
    audit_sink: Arc<dyn AuditSink>,
    locks: QuoteLocks,
    today: Clock,
}

impl WorkflowService {
    pub fn new(repository: Arc<dyn QuoteRepository>) -> Self {
        Self {
            repository,
            engine: WorkflowEngine::default(),
            audit_sink: Arc::new(NoopAuditSink),
            locks: QuoteLocks::default(),
            today: Arc::new(|| Utc::now().date_naive()),
        }
    }

    pub fn with_engine(mut self, engine: WorkflowEngine) -> Self {
        self.engine = engine;
        self
    }

    pub fn with_audit_sink(mut self, audit_sink: Arc<dyn AuditSink>) -> Self {
        self.audit_sink = audit_sink;
        self
    }

    pub fn with_clock(mut self, today: impl Fn() -> NaiveDate + Send + Sync + 'static) -> Self {
        self.today = Arc::new(today);
        self
    }

    pub fn repository(&self) -> &Arc<dyn QuoteRepository> {
        &self.repository
    }

    pub fn personas(&self) -> &[Persona] {
        self.engine.catalog().list()
    }

    pub async fn get_quote(&self, id: &QuoteId) -> Result<Quote, ApplicationError> {
        self.repository
            .find_by_id(id)
            .await
            .map_err(|e| persistence_failure("quote.lookup", id, e))?
            .ok_or_else(|| ApplicationError::QuoteNotFound { quote_id: id.clone() })
    }

    pub async fn list_quotes(&self, query: &QuoteQuery) -> Result<Vec<Quote>, ApplicationError> {
        let quotes = self.repository.list().await.map_err(list_failure)?;
        Ok(query.apply(quotes))
    }

    pub async fn stats(&self) -> Result<QuoteStats, ApplicationError> {
        let quotes = self.repository.list().await.map_err(list_failure)?;
        Ok(QuoteStats::from_quotes(&quotes))
    }

    pub async fn advance_step(
        &self,
        quote_id: &QuoteId,
        step_id: &StepId,
        audit: &AuditContext,
    ) -> Result<Quote, ApplicationError> {
        let _guard = self.locks.acquire(quote_id).await;

        let mut quote = self.get_quote(quote_id).await?;
        let today = (self.today)();
        let outcome = self
            .engine
            .advance_step_with_audit(&mut quote, step_id, today, self.audit_sink.as_ref(), audit)
            .map_err(|e| {
                warn!(
                    event_name = "workflow.advance.rejected",
                    correlation_id = %audit.correlation_id,
                    quote_id = %quote_id,
                    step_id = %step_id,
                    error = %e,
                    "workflow advance rejected"
                );
                ApplicationError::from(e)
            })?;

        if let Err(error) = self.store_workflow(&mut quote, "workflow.advance").await {
            self.emit_failed(outcome.audit_event(audit, AuditOutcome::Failed), &error);
            return Err(error);
        }
        self.audit_sink.emit(outcome.audit_event(audit, AuditOutcome::Success));

        info!(
            event_name = "workflow.advance.applied",
            correlation_id = %audit.correlation_id,
            quote_id = %quote_id,
            step_id = %outcome.completed,
            next_step = outcome.activated.as_ref().map(StepId::as_str).unwrap_or("none"),
            approved = outcome.approved,
            "workflow step completed"
        );
        Ok(quote)
    }

    pub async fn replace_workflow(
        &self,
        quote_id: &QuoteId,
        drafts: &[StepDraft],
        audit: &AuditContext,
    ) -> Result<Quote, ApplicationError> {
        let _guard = self.locks.acquire(quote_id).await;

        let mut quote = self.get_quote(quote_id).await?;
        let today = (self.today)();
        let outcome = self
            .engine
            .replace_workflow_with_audit(&mut quote, drafts, today, self.audit_sink.as_ref(), audit)
            .map_err(|e| {
                warn!(
                    event_name = "workflow.replace.rejected",
                    correlation_id = %audit.correlation_id,
                    quote_id = %quote_id,
                    error = %e,
                    "workflow replacement rejected"
                );
                ApplicationError::from(e)
            })?;

        if let Err(error) = self.store_workflow(&mut quote, "workflow.replace").await {
            self.emit_failed(outcome.audit_event(audit, AuditOutcome::Failed), &error);
            return Err(error);
        }
        self.audit_sink.emit(outcome.audit_event(audit, AuditOutcome::Success));

        info!(
            event_name = "workflow.replace.applied",
            correlation_id = %audit.correlation_id,
            quote_id = %quote_id,
            step_count = outcome.step_ids.len(),
            current_step = outcome.current_step.as_ref().map(StepId::as_str).unwrap_or("none"),
            approved = outcome.approved,
            "workflow replaced"
        );
        Ok(quote)
    }

    /// Checks the invariants and writes the workflow. On success `quote` carries the new
    /// stored revision.
    async fn store_workflow(&self, quote: &mut Quote, operation: &str) -> Result<(), ApplicationError> {
        quote.check_workflow()?;
        self.repository
            .update_workflow(quote)
            .await
            .map_err(|e| persistence_failure(operation, &quote.id, e))?;
        quote.revision += 1;
        Ok(())
    }

    fn emit_failed(&self, event: AuditEvent, error: &ApplicationError) {
        self.audit_sink.emit(event.with_metadata("error", error.to_string()));
    }
}

fn persistence_failure(operation: &str, quote_id: &QuoteId, error: RepositoryError) -> ApplicationError {
    match error {
        RepositoryError::MissingQuote(id) => ApplicationError::QuoteNotFound { quote_id: id },
        RepositoryError::StaleRevision { quote_id: id, expected } => {
            warn!(
                event_name = "persistence.stale_write",
                operation,
                quote_id = %id,
                expected_revision = expected,
                "quote changed by another writer; write refused"
            );
            ApplicationError::ConcurrentModification { quote_id: id }
        }
        other => {
            error!(
                event_name = "persistence.failure",
                operation,
                quote_id = %quote_id,
                error = %other,
                "quote store operation failed"
            );
            ApplicationError::Persistence(other.to_string())
        }
    }
}

fn list_failure(error: RepositoryError) -> ApplicationError {
    error!(
        event_name = "persistence.failure",
        operation = "quote.list",
        error = %error,
        "quote store operation failed"
    );
    ApplicationError::Persistence(error.to_string())
}
