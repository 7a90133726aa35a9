use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::workflow::{check_progression, StepId, WorkflowStep};
use crate::errors::DomainError;

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct QuoteId(pub String);

impl fmt::Display for QuoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuoteStatus {
    Pending,
    Approved,
    Rejected,
}

impl QuoteStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

impl std::str::FromStr for QuoteStatus {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            other => Err(DomainError::InvalidInput(format!(
                "unknown quote status `{other}` (expected pending|approved|rejected)"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QuoteProduct {
    pub name: String,
    pub quantity: u32,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub id: QuoteId,
    pub customer: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub discount: Decimal,
    pub created_by: String,
    pub created_date: NaiveDate,
    pub products: Vec<QuoteProduct>,
    pub workflow: Vec<WorkflowStep>,
    pub current_step: Option<StepId>,
    pub status: QuoteStatus,
    /// Store revision this copy was read at. Writes only land while it is still current.
    #[serde(skip)]
    pub revision: i64,
}

impl Quote {
    pub fn is_workflow_complete(&self) -> bool {
        !self.workflow.is_empty() && self.workflow.iter().all(WorkflowStep::is_completed)
    }

    pub fn check_workflow(&self) -> Result<(), DomainError> {
        check_progression(&self.workflow, self.current_step.as_ref())?;
        if self.is_workflow_complete() && self.status == QuoteStatus::Pending {
            return Err(DomainError::InvariantViolation(format!(
                "quote `{}` has a completed workflow but is still pending",
                self.id
            )));
        }
        Ok(())
    }
}
