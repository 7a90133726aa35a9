use std::sync::Arc;

use chrono::NaiveDate;

use quoteflow_core::audit::AuditContext;
use quoteflow_core::domain::quote::{QuoteId, QuoteStatus};
use quoteflow_core::domain::workflow::{StepId, StepStatus};
use quoteflow_core::errors::ApplicationError;
use quoteflow_core::workflow::StepDraft;
use quoteflow_db::{
    connect_with_settings, migrations, seed_demo_quotes, QuoteRepository, SqlQuoteRepository,
    WorkflowService,
};

type TestResult<T = ()> = Result<T, String>;

async fn sql_service() -> TestResult<(WorkflowService, Arc<SqlQuoteRepository>)> {
    let pool = connect_with_settings("sqlite::memory:", 1, 30)
        .await
        .map_err(|e| format!("connect: {e}"))?;
    migrations::run_pending(&pool).await.map_err(|e| format!("migrate: {e}"))?;

    let repo = Arc::new(SqlQuoteRepository::new(pool));
    seed_demo_quotes(repo.as_ref()).await.map_err(|e| format!("seed: {e}"))?;

    let today = NaiveDate::from_ymd_opt(2025, 4, 1).ok_or("date")?;
    let service = WorkflowService::new(repo.clone()).with_clock(move || today);
    Ok((service, repo))
}

fn ctx(quote: &str) -> AuditContext {
    AuditContext::new(Some(QuoteId(quote.to_owned())), "it-1", "integration")
}

#[tokio::test]
async fn replace_then_walk_to_approval_against_sqlite() -> TestResult {
    let (service, repo) = sql_service().await?;
    let quote_id = QuoteId("Q-2025-003".to_owned());

    let replaced = service
        .replace_workflow(
            &quote_id,
            &[
                StepDraft::new("configuration"),
                StepDraft::new("pricing").with_assignee("Unassigned"),
                StepDraft::new("contract-execution").with_assignee("Procurement at Initech"),
            ],
            &ctx("Q-2025-003"),
        )
        .await
        .map_err(|e| format!("replace: {e}"))?;

    if replaced.current_step != Some(StepId::from("pricing")) {
        return Err(format!("unexpected current step {:?}", replaced.current_step));
    }
    if replaced.workflow[1].assignee != "Finance Team" {
        return Err("Unassigned should resolve to the persona default".to_owned());
    }

    for step in ["pricing", "contract-execution"] {
        service
            .advance_step(&quote_id, &StepId::from(step), &ctx("Q-2025-003"))
            .await
            .map_err(|e| format!("advance {step}: {e}"))?;
    }

    let stored = repo
        .find_by_id(&quote_id)
        .await
        .map_err(|e| format!("find: {e}"))?
        .ok_or("quote should still be stored")?;

    if stored.status != QuoteStatus::Approved || stored.current_step.is_some() {
        return Err(format!("quote should be approved, got {:?}", stored.status));
    }
    if !stored.workflow.iter().all(|step| step.status == StepStatus::Completed) {
        return Err("every step should be completed".to_owned());
    }
    if stored.workflow[2].assignee != "Procurement at Initech" {
        return Err("explicit assignee should be kept".to_owned());
    }
    Ok(())
}

#[tokio::test]
async fn completed_step_cannot_be_advanced_twice() -> TestResult {
    let (service, _repo) = sql_service().await?;
    let quote_id = QuoteId("Q-2025-001".to_owned());

    let result =
        service.advance_step(&quote_id, &StepId::from("pricing"), &ctx("Q-2025-001")).await;

    match result {
        Err(ApplicationError::Domain(_)) => Ok(()),
        other => Err(format!("expected a workflow rejection, got {other:?}")),
    }
}
