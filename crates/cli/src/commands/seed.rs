use serde_json::json;

use crate::commands::{execute, open_pool, CommandResult};
use quoteflow_db::{seed_demo_quotes, SqlQuoteRepository};

pub fn run() -> CommandResult {
    execute("seed", |config| async move {
        let pool = open_pool(&config).await?;
        let repository = SqlQuoteRepository::new(pool.clone());
        let seeded = seed_demo_quotes(&repository).await;
        pool.close().await;

        let seeded = seeded.map_err(|error| ("seed_execution", error.to_string(), 5))?;
        Ok((seed_message(seeded.inserted.len(), seeded.skipped.len()), Some(json!(seeded))))
    })
}

fn seed_message(inserted: usize, skipped: usize) -> String {
    match (inserted, skipped) {
        (0, 0) => "no demo quotes defined".to_string(),
        (0, skipped) => format!("demo quotes already present ({skipped} skipped)"),
        (inserted, 0) => format!("seeded {inserted} demo quotes"),
        (inserted, skipped) => {
            format!("seeded {inserted} demo quotes ({skipped} already present)")
        }
    }
}
