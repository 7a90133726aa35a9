use thiserror::Error;

use crate::domain::quote::QuoteId;
use crate::workflow::WorkflowError;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error(transparent)]
    Workflow(#[from] WorkflowError),
    #[error("domain invariant violation: {0}")]
    InvariantViolation(String),
    #[error("{0}")]
    InvalidInput(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("quote `{quote_id}` not found")]
    QuoteNotFound { quote_id: QuoteId },
    #[error("quote `{quote_id}` was changed by another writer")]
    ConcurrentModification { quote_id: QuoteId },
    #[error("persistence failure: {0}")]
    Persistence(String),
    #[error("configuration failure: {0}")]
    Configuration(String),
}

impl From<WorkflowError> for ApplicationError {
    fn from(value: WorkflowError) -> Self {
        Self::Domain(DomainError::Workflow(value))
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("bad request: {message}")]
    BadRequest { message: String, correlation_id: String },
    #[error("not found: {message}")]
    NotFound { message: String, correlation_id: String },
    #[error("conflict: {message}")]
    Conflict { message: String, correlation_id: String },
    #[error("internal error: {message}")]
    Internal { message: String, correlation_id: String },
}

impl InterfaceError {
    /// Message safe to hand back to callers. Internal details stay in the logs.
    pub fn user_message(&self) -> &str {
        match self {
            Self::BadRequest { message, .. }
            | Self::NotFound { message, .. }
            | Self::Conflict { message, .. } => message,
            Self::Internal { .. } => "An unexpected internal error occurred.",
        }
    }

    pub fn correlation_id(&self) -> &str {
        match self {
            Self::BadRequest { correlation_id, .. }
            | Self::NotFound { correlation_id, .. }
            | Self::Conflict { correlation_id, .. }
            | Self::Internal { correlation_id, .. } => correlation_id,
        }
    }
}

impl ApplicationError {
    pub fn into_interface(self, correlation_id: impl Into<String>) -> InterfaceError {
        let correlation_id = correlation_id.into();
        let mut mapped = InterfaceError::from(self);
        match &mut mapped {
            InterfaceError::BadRequest { correlation_id: id, .. }
            | InterfaceError::NotFound { correlation_id: id, .. }
            | InterfaceError::Conflict { correlation_id: id, .. }
            | InterfaceError::Internal { correlation_id: id, .. } => *id = correlation_id,
        }
        mapped
    }
}

impl From<ApplicationError> for InterfaceError {
    fn from(value: ApplicationError) -> Self {
        let correlation_id = "unassigned".to_owned();
        match value {
            ApplicationError::QuoteNotFound { .. } => {
                Self::NotFound { message: "Quote not found".to_owned(), correlation_id }
            }
            ApplicationError::ConcurrentModification { .. } => Self::Conflict {
                message: "Quote was changed by another request; reload and retry".to_owned(),
                correlation_id,
            },
            ApplicationError::Domain(DomainError::InvalidInput(message)) => {
                Self::BadRequest { message, correlation_id }
            }
            ApplicationError::Domain(DomainError::Workflow(error)) => match error {
                WorkflowError::StepNotFound { .. } => {
                    Self::NotFound { message: error.to_string(), correlation_id }
                }
                WorkflowError::StepAlreadyCompleted { .. } | WorkflowError::StepNotActive { .. } => {
                    Self::Conflict { message: error.to_string(), correlation_id }
                }
                WorkflowError::EmptyWorkflow
                | WorkflowError::UnknownPersona { .. }
                | WorkflowError::DuplicateStep { .. } => {
                    Self::BadRequest { message: error.to_string(), correlation_id }
                }
            },
            ApplicationError::Domain(DomainError::InvariantViolation(message))
            | ApplicationError::Persistence(message)
            | ApplicationError::Configuration(message) => {
                Self::Internal { message, correlation_id }
            }
        }
    }
}
