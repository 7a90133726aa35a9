pub mod audit;
pub mod config;
pub mod domain;
pub mod errors;
pub mod query;
pub mod workflow;

pub use audit::{AuditCategory, AuditContext, AuditEvent, AuditOutcome, AuditSink};
pub use domain::persona::{Persona, PersonaCatalog};
pub use domain::quote::{Quote, QuoteId, QuoteProduct, QuoteStatus};
pub use domain::workflow::{StepId, StepStatus, WorkflowStep};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use query::{QuoteQuery, QuoteSort, QuoteStats};
pub use workflow::{StepDraft, WorkflowDraft, WorkflowEngine, WorkflowError};
