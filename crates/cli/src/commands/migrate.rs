use crate::commands::{execute, open_pool, CommandResult};

pub fn run() -> CommandResult {
    execute("migrate", |config| async move {
        let pool = open_pool(&config).await?;
        pool.close().await;
        Ok(("applied pending migrations".to_string(), None))
    })
}
