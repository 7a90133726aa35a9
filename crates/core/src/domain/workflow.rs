use std::collections::HashSet;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StepId(pub String);

impl StepId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StepId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Waiting,
    Pending,
    Completed,
}

impl StepStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Waiting => "waiting",
            Self::Pending => "pending",
            Self::Completed => "completed",
        }
    }
}

impl std::str::FromStr for StepStatus {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "waiting" => Ok(Self::Waiting),
            "pending" => Ok(Self::Pending),
            "completed" => Ok(Self::Completed),
            other => Err(DomainError::InvariantViolation(format!("unknown step status `{other}`"))),
        }
    }
}

/// One stage of a quote's approval sequence.
///
/// `completed_date` is only ever written through [`WorkflowStep::complete`], which keeps
/// it in lockstep with `status`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowStep {
    pub id: StepId,
    pub name: String,
    pub assignee: String,
    pub status: StepStatus,
    pub completed_date: Option<NaiveDate>,
}

impl WorkflowStep {
    pub fn waiting(id: StepId, name: impl Into<String>, assignee: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            assignee: assignee.into(),
            status: StepStatus::Waiting,
            completed_date: None,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == StepStatus::Completed
    }

    pub fn complete(&mut self, on: NaiveDate) {
        self.status = StepStatus::Completed;
        self.completed_date = Some(on);
    }

    pub fn activate(&mut self) {
        self.status = StepStatus::Pending;
        self.completed_date = None;
    }
}

/// Checks the progression invariants of a step sequence against its current-step pointer:
/// unique ids, completed steps form a prefix, at most one pending step directly after that
/// prefix (which must be `current_step`), everything after it waiting.
pub fn check_progression(
    steps: &[WorkflowStep],
    current_step: Option<&StepId>,
) -> Result<(), DomainError> {
    let mut seen = HashSet::with_capacity(steps.len());
    for step in steps {
        if !seen.insert(&step.id) {
            return Err(DomainError::InvariantViolation(format!(
                "duplicate workflow step `{}`",
                step.id
            )));
        }
        if step.is_completed() != step.completed_date.is_some() {
            return Err(DomainError::InvariantViolation(format!(
                "step `{}` has status {} but completed date {:?}",
                step.id,
                step.status.as_str(),
                step.completed_date
            )));
        }
    }

    let frontier = steps.iter().position(|step| !step.is_completed());
    let Some(frontier) = frontier else {
        return match current_step {
            None => Ok(()),
            Some(id) => Err(DomainError::InvariantViolation(format!(
                "workflow is complete but current step is `{id}`"
            ))),
        };
    };

    let active = &steps[frontier];
    if active.status != StepStatus::Pending {
        return Err(DomainError::InvariantViolation(format!(
            "first open step `{}` is {} instead of pending",
            active.id,
            active.status.as_str()
        )));
    }
    if current_step != Some(&active.id) {
        return Err(DomainError::InvariantViolation(format!(
            "current step {:?} does not match pending step `{}`",
            current_step.map(StepId::as_str),
            active.id
        )));
    }
    if let Some(step) = steps[frontier + 1..].iter().find(|step| step.status != StepStatus::Waiting)
    {
        return Err(DomainError::InvariantViolation(format!(
            "step `{}` after the current step is {}",
            step.id,
            step.status.as_str()
        )));
    }

    Ok(())
}
