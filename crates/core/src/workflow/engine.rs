use std::collections::HashSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::audit::{AuditCategory, AuditContext, AuditEvent, AuditOutcome, AuditSink};
use crate::domain::persona::{PersonaCatalog, UNASSIGNED};
use crate::domain::quote::{Quote, QuoteStatus};
use crate::domain::workflow::{StepId, StepStatus, WorkflowStep};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum WorkflowError {
    #[error("Workflow step not found")]
    StepNotFound { step_id: StepId },
    #[error("Workflow step `{step_id}` is already completed")]
    StepAlreadyCompleted { step_id: StepId },
    #[error("Workflow step `{step_id}` is not the current step")]
    StepNotActive { step_id: StepId },
    #[error("Workflow must have at least one step")]
    EmptyWorkflow,
    #[error("Unknown workflow persona `{persona_id}`")]
    UnknownPersona { persona_id: StepId },
    #[error("`{step_id}` is already in the workflow")]
    DuplicateStep { step_id: StepId },
}

/// A step as submitted by a workflow editor. Anything beyond the persona id and assignee is
/// recomputed, so full `WorkflowStep` payloads deserialize into this as well.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepDraft {
    pub id: StepId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
}

impl StepDraft {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: StepId(id.into()), assignee: None }
    }

    pub fn with_assignee(mut self, assignee: impl Into<String>) -> Self {
        self.assignee = Some(assignee.into());
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepAdvanced {
    pub completed: StepId,
    pub completed_on: NaiveDate,
    pub activated: Option<StepId>,
    pub approved: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowReplaced {
    pub step_ids: Vec<StepId>,
    pub current_step: Option<StepId>,
    pub approved: bool,
}

/// Applies the two workflow mutations to a quote. Both operate on a copy and only write
/// back on success, so a rejected call leaves the quote untouched.
#[derive(Clone, Debug, Default)]
pub struct WorkflowEngine {
    catalog: PersonaCatalog,
}

impl WorkflowEngine {
    pub fn new(catalog: PersonaCatalog) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &PersonaCatalog {
        &self.catalog
    }

    pub fn advance_step(
        &self,
        quote: &mut Quote,
        step_id: &StepId,
        today: NaiveDate,
    ) -> Result<StepAdvanced, WorkflowError> {
        let index = quote
            .workflow
            .iter()
            .position(|step| &step.id == step_id)
            .ok_or_else(|| WorkflowError::StepNotFound { step_id: step_id.clone() })?;

        match quote.workflow[index].status {
            StepStatus::Completed => {
                return Err(WorkflowError::StepAlreadyCompleted { step_id: step_id.clone() })
            }
            StepStatus::Waiting => {
                return Err(WorkflowError::StepNotActive { step_id: step_id.clone() })
            }
            StepStatus::Pending => {}
        }

        let mut workflow = quote.workflow.clone();
        workflow[index].complete(today);

        let activated = match workflow.get_mut(index + 1) {
            Some(next) => {
                next.activate();
                Some(next.id.clone())
            }
            None => None,
        };

        let approved = activated.is_none();
        quote.workflow = workflow;
        quote.current_step = activated.clone();
        if approved {
            quote.status = QuoteStatus::Approved;
        }

        Ok(StepAdvanced { completed: step_id.clone(), completed_on: today, activated, approved })
    }

    pub fn replace_workflow(
        &self,
        quote: &mut Quote,
        drafts: &[StepDraft],
        today: NaiveDate,
    ) -> Result<WorkflowReplaced, WorkflowError> {
        if drafts.is_empty() {
            return Err(WorkflowError::EmptyWorkflow);
        }

        let mut seen = HashSet::with_capacity(drafts.len());
        let mut workflow = Vec::with_capacity(drafts.len());
        for draft in drafts {
            let persona = self
                .catalog
                .get(draft.id.as_str())
                .ok_or_else(|| WorkflowError::UnknownPersona { persona_id: draft.id.clone() })?;
            if !seen.insert(&draft.id) {
                return Err(WorkflowError::DuplicateStep { step_id: draft.id.clone() });
            }

            let assignee = self.resolve_assignee(&draft.id, draft.assignee.as_deref());
            workflow.push(WorkflowStep::waiting(draft.id.clone(), persona.name, assignee));
        }

        workflow[0].complete(today);
        let current_step = match workflow.get_mut(1) {
            Some(next) => {
                next.activate();
                Some(next.id.clone())
            }
            None => None,
        };

        let approved = current_step.is_none();
        let step_ids = workflow.iter().map(|step| step.id.clone()).collect();
        quote.workflow = workflow;
        quote.current_step = current_step.clone();
        quote.status = if approved { QuoteStatus::Approved } else { QuoteStatus::Pending };

        Ok(WorkflowReplaced { step_ids, current_step, approved })
    }

    /// Explicit non-empty assignees win; blanks and the literal "Unassigned" fall back to the
    /// persona default.
    pub fn resolve_assignee(&self, step_id: &StepId, requested: Option<&str>) -> String {
        match requested.map(str::trim) {
            Some(value) if !value.is_empty() && value != UNASSIGNED => value.to_owned(),
            _ => self.catalog.default_assignee(step_id.as_str()).to_owned(),
        }
    }

    /// Applies `advance_step` and records a rejection event when it is refused. The success
    /// event is left to the caller, which emits it once the change is stored.
    pub fn advance_step_with_audit<S>(
        &self,
        quote: &mut Quote,
        step_id: &StepId,
        today: NaiveDate,
        sink: &S,
        audit: &AuditContext,
    ) -> Result<StepAdvanced, WorkflowError>
    where
        S: AuditSink + ?Sized,
    {
        self.advance_step(quote, step_id, today).map_err(|error| {
            sink.emit(
                AuditEvent::from_context(
                    audit,
                    "workflow.step_rejected",
                    AuditCategory::Workflow,
                    AuditOutcome::Rejected,
                )
                .with_metadata("step_id", step_id.to_string())
                .with_metadata("error", error.to_string()),
            );
            error
        })
    }

    /// Replace counterpart of [`WorkflowEngine::advance_step_with_audit`].
    pub fn replace_workflow_with_audit<S>(
        &self,
        quote: &mut Quote,
        drafts: &[StepDraft],
        today: NaiveDate,
        sink: &S,
        audit: &AuditContext,
    ) -> Result<WorkflowReplaced, WorkflowError>
    where
        S: AuditSink + ?Sized,
    {
        self.replace_workflow(quote, drafts, today).map_err(|error| {
            sink.emit(
                AuditEvent::from_context(
                    audit,
                    "workflow.replace_rejected",
                    AuditCategory::Workflow,
                    AuditOutcome::Rejected,
                )
                .with_metadata("error", error.to_string()),
            );
            error
        })
    }
}

impl StepAdvanced {
    /// `workflow.step_completed` event for this transition with the given outcome.
    pub fn audit_event(&self, audit: &AuditContext, outcome: AuditOutcome) -> AuditEvent {
        let mut event = AuditEvent::from_context(
            audit,
            "workflow.step_completed",
            AuditCategory::Workflow,
            outcome,
        )
        .with_metadata("step_id", self.completed.to_string())
        .with_metadata("completed_on", self.completed_on.to_string());
        if let Some(next) = &self.activated {
            event = event.with_metadata("next_step", next.to_string());
        }
        if self.approved {
            event = event.with_metadata("quote_status", QuoteStatus::Approved.as_str());
        }
        event
    }
}

impl WorkflowReplaced {
    pub fn audit_event(&self, audit: &AuditContext, outcome: AuditOutcome) -> AuditEvent {
        let steps = self.step_ids.iter().map(StepId::as_str).collect::<Vec<_>>().join(",");
        AuditEvent::from_context(audit, "workflow.replaced", AuditCategory::Workflow, outcome)
            .with_metadata("steps", steps)
            .with_metadata(
                "current_step",
                self.current_step.as_ref().map(StepId::as_str).unwrap_or("none"),
            )
    }
}
