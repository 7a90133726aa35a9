use serde_json::json;

use crate::commands::{
    application_failure, audit_context, execute, open_pool, workflow_service, CommandResult,
};
use quoteflow_core::domain::quote::QuoteId;
use quoteflow_core::domain::workflow::StepId;

pub fn run(quote_id: String, step_id: String) -> CommandResult {
    execute("advance", |config| async move {
        let quote_id = QuoteId(quote_id);
        let step_id = StepId(step_id);
        let audit = audit_context(&quote_id);

        let pool = open_pool(&config).await?;
        let advanced = workflow_service(&pool).advance_step(&quote_id, &step_id, &audit).await;
        pool.close().await;

        let quote = advanced.map_err(|error| application_failure(error, &audit.correlation_id))?;
        let message = match &quote.current_step {
            Some(next) => format!("completed `{step_id}` on {quote_id}; `{next}` is now pending"),
            None => format!("completed `{step_id}` on {quote_id}; quote approved"),
        };
        Ok((message, Some(json!(quote))))
    })
}
