use serde_json::json;

use crate::commands::{
    application_failure, audit_context, execute, open_pool, workflow_service, CommandResult,
    Failure,
};
use quoteflow_core::domain::persona::PersonaCatalog;
use quoteflow_core::domain::quote::QuoteId;
use quoteflow_core::domain::workflow::StepId;
use quoteflow_core::workflow::{AppendOutcome, WorkflowDraft};

/// Builds a draft from persona ids in order, then replaces the quote's workflow with it.
///
/// `assignees` holds `persona=Name` overrides. Repeated personas are dropped with a
/// notice, matching the step editor.
pub fn run(quote_id: String, personas: Vec<String>, assignees: Vec<String>) -> CommandResult {
    execute("set-workflow", |config| async move {
        let (draft, notices) = build_draft(&personas, &assignees)?;
        let quote_id = QuoteId(quote_id);
        let audit = audit_context(&quote_id);

        let pool = open_pool(&config).await?;
        let replaced =
            workflow_service(&pool).replace_workflow(&quote_id, draft.steps(), &audit).await;
        pool.close().await;

        let quote = replaced.map_err(|error| application_failure(error, &audit.correlation_id))?;
        let mut message =
            format!("workflow of {quote_id} replaced with {} steps", quote.workflow.len());
        for notice in &notices {
            message.push_str("; ");
            message.push_str(notice);
        }
        Ok((message, Some(json!(quote))))
    })
}

fn build_draft(
    personas: &[String],
    assignees: &[String],
) -> Result<(WorkflowDraft, Vec<String>), Failure> {
    let catalog = PersonaCatalog::standard();
    let mut draft = WorkflowDraft::new();
    let mut notices = Vec::new();

    for persona in personas {
        match draft.append(&catalog, persona) {
            Ok(AppendOutcome::Added { .. }) => {}
            Ok(AppendOutcome::AlreadyPresent { name, .. }) => {
                notices.push(format!("{name} is already in the workflow"));
            }
            Err(error) => return Err(("validation", error.to_string(), 6)),
        }
    }

    for entry in assignees {
        let Some((persona, name)) = entry.split_once('=') else {
            return Err((
                "validation",
                format!("assignee override `{entry}` must look like persona=Name"),
                6,
            ));
        };
        if !draft.set_assignee(&StepId::from(persona.trim()), name.trim()) {
            return Err((
                "validation",
                format!("no `{}` step to assign in the workflow", persona.trim()),
                6,
            ));
        }
    }

    Ok((draft, notices))
}

#[cfg(test)]
mod tests {
    use super::build_draft;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn duplicates_are_dropped_with_notice() {
        let (draft, notices) =
            build_draft(&strings(&["pricing", "quoting", "pricing"]), &[]).expect("draft");

        assert_eq!(draft.steps().len(), 2);
        assert_eq!(notices, ["Pricing Review is already in the workflow"]);
    }

    #[test]
    fn assignee_overrides_apply_to_named_steps() {
        let (draft, _) = build_draft(
            &strings(&["pricing", "billing"]),
            &strings(&["billing = Dana Ortiz"]),
        )
        .expect("draft");

        assert_eq!(draft.steps()[1].assignee.as_deref(), Some("Dana Ortiz"));
    }

    #[test]
    fn unknown_persona_and_bad_overrides_fail() {
        assert!(build_draft(&strings(&["astrology"]), &[]).is_err());
        assert!(build_draft(&strings(&["pricing"]), &strings(&["billing=Dana"])).is_err());
        assert!(build_draft(&strings(&["pricing"]), &strings(&["pricing"])).is_err());
    }
}
