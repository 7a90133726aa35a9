use crate::domain::persona::PersonaCatalog;
use crate::domain::workflow::StepId;
use crate::workflow::engine::{StepDraft, WorkflowError};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AppendOutcome {
    Added { step_id: StepId, assignee: String },
    /// Advisory only: the persona is already part of the draft and nothing was added.
    AlreadyPresent { step_id: StepId, name: String },
}

/// In-progress step sequence assembled by an editor before it is submitted as a full
/// replacement.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WorkflowDraft {
    steps: Vec<StepDraft>,
}

impl WorkflowDraft {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(
        &mut self,
        catalog: &PersonaCatalog,
        persona_id: &str,
    ) -> Result<AppendOutcome, WorkflowError> {
        let persona = catalog
            .get(persona_id)
            .ok_or_else(|| WorkflowError::UnknownPersona { persona_id: StepId::from(persona_id) })?;
        let step_id = StepId::from(persona.id);

        if self.position(&step_id).is_some() {
            return Ok(AppendOutcome::AlreadyPresent { step_id, name: persona.name.to_owned() });
        }

        let assignee = persona.default_assignee.to_owned();
        self.steps.push(StepDraft { id: step_id.clone(), assignee: Some(assignee.clone()) });
        Ok(AppendOutcome::Added { step_id, assignee })
    }

    pub fn remove(&mut self, step_id: &StepId) -> bool {
        match self.position(step_id) {
            Some(index) => {
                self.steps.remove(index);
                true
            }
            None => false,
        }
    }

    /// Moves a step to `to`, clamped to the end of the sequence.
    pub fn move_step(&mut self, step_id: &StepId, to: usize) -> bool {
        let Some(from) = self.position(step_id) else {
            return false;
        };
        let step = self.steps.remove(from);
        let to = to.min(self.steps.len());
        self.steps.insert(to, step);
        true
    }

    pub fn set_assignee(&mut self, step_id: &StepId, assignee: impl Into<String>) -> bool {
        match self.steps.iter_mut().find(|step| &step.id == step_id) {
            Some(step) => {
                step.assignee = Some(assignee.into());
                true
            }
            None => false,
        }
    }

    pub fn steps(&self) -> &[StepDraft] {
        &self.steps
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    fn position(&self, step_id: &StepId) -> Option<usize> {
        self.steps.iter().position(|step| &step.id == step_id)
    }
}

#[cfg(test)]
mod tests {
    use crate::domain::persona::PersonaCatalog;
    use crate::domain::workflow::StepId;
    use crate::workflow::draft::{AppendOutcome, WorkflowDraft};
    use crate::workflow::engine::WorkflowError;

    fn ids(draft: &WorkflowDraft) -> Vec<&str> {
        draft.steps().iter().map(|step| step.id.as_str()).collect()
    }

    #[test]
    fn append_uses_persona_default_assignee() {
        let catalog = PersonaCatalog::standard();
        let mut draft = WorkflowDraft::new();

        let outcome = draft.append(&catalog, "contract-negotiation").expect("known persona");

        assert_eq!(
            outcome,
            AppendOutcome::Added {
                step_id: StepId::from("contract-negotiation"),
                assignee: "Chief Revenue Officer".to_owned(),
            }
        );
    }

    #[test]
    fn duplicate_append_is_advisory_and_adds_nothing() {
        let catalog = PersonaCatalog::standard();
        let mut draft = WorkflowDraft::new();
        draft.append(&catalog, "pricing").expect("first append");

        let outcome = draft.append(&catalog, "pricing").expect("duplicate is not an error");

        assert!(matches!(outcome, AppendOutcome::AlreadyPresent { ref name, .. } if name == "Pricing Review"));
        assert_eq!(ids(&draft), ["pricing"]);
    }

    #[test]
    fn unknown_persona_is_rejected() {
        let mut draft = WorkflowDraft::new();
        let error = draft.append(&PersonaCatalog::standard(), "ghost").expect_err("unknown");
        assert!(matches!(error, WorkflowError::UnknownPersona { .. }));
        assert!(draft.is_empty());
    }

    #[test]
    fn reorder_remove_and_reassign() {
        let catalog = PersonaCatalog::standard();
        let mut draft = WorkflowDraft::new();
        for id in ["configuration", "pricing", "quoting", "billing"] {
            draft.append(&catalog, id).expect("append");
        }

        assert!(draft.move_step(&StepId::from("billing"), 1));
        assert!(draft.remove(&StepId::from("quoting")));
        assert!(draft.set_assignee(&StepId::from("pricing"), "Priya Finance"));
        assert!(!draft.remove(&StepId::from("renewal")));
        assert!(draft.move_step(&StepId::from("configuration"), 99));

        assert_eq!(ids(&draft), ["billing", "pricing", "configuration"]);
        assert_eq!(draft.steps()[1].assignee.as_deref(), Some("Priya Finance"));
    }
}
