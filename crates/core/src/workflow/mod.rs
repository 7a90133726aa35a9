pub mod draft;
pub mod engine;

pub use draft::{AppendOutcome, WorkflowDraft};
pub use engine::{StepAdvanced, StepDraft, WorkflowEngine, WorkflowError, WorkflowReplaced};
