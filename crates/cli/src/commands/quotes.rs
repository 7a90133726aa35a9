use serde_json::json;

use crate::commands::{application_failure, execute, open_pool, workflow_service, CommandResult};
use quoteflow_core::domain::quote::QuoteStatus;
use quoteflow_core::query::{QuoteQuery, QuoteSort};

pub fn run(search: Option<String>, status: Option<String>, sort: Option<String>) -> CommandResult {
    execute("quotes", |config| async move {
        let status = status
            .as_deref()
            .map(str::parse::<QuoteStatus>)
            .transpose()
            .map_err(|error| ("validation", error.to_string(), 6))?;
        let sort = sort
            .as_deref()
            .map(str::parse::<QuoteSort>)
            .transpose()
            .map_err(|error| ("validation", error.to_string(), 6))?;
        let query = QuoteQuery { search, status, sort };

        let pool = open_pool(&config).await?;
        let service = workflow_service(&pool);
        let listed = service.list_quotes(&query).await;
        let stats = service.stats().await;
        pool.close().await;

        let quotes = listed.map_err(|error| application_failure(error, "cli"))?;
        let stats = stats.map_err(|error| application_failure(error, "cli"))?;
        let message = format!("{} of {} quotes matched", quotes.len(), stats.total_quotes);
        Ok((message, Some(json!({ "quotes": quotes, "stats": stats }))))
    })
}
