use std::sync::Arc;

use quoteflow_core::config::{AppConfig, ConfigError, LoadOptions};
use quoteflow_db::{
    connect, migrations, seed_demo_quotes, DbPool, RepositoryError,
    SqlQuoteRepository, WorkflowService,
};
use thiserror::Error;
use tracing::info;

use crate::audit::TracingAuditSink;

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub service: Arc<WorkflowService>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error("demo data seeding failed: {0}")]
    Seed(#[source] RepositoryError),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        quote_id = "unknown",
        "starting application bootstrap"
    );

    let db_pool = connect(&config.database).await.map_err(BootstrapError::DatabaseConnect)?;
    info!(
        event_name = "system.bootstrap.database_connected",
        correlation_id = "bootstrap",
        quote_id = "unknown",
        "database connection established"
    );

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(
        event_name = "system.bootstrap.migrations_applied",
        correlation_id = "bootstrap",
        quote_id = "unknown",
        "database migrations applied"
    );

    let repository = Arc::new(SqlQuoteRepository::new(db_pool.clone()));
    if config.workflow.seed_demo_data {
        let seeded = seed_demo_quotes(repository.as_ref()).await.map_err(BootstrapError::Seed)?;
        info!(
            event_name = "system.bootstrap.demo_data_seeded",
            correlation_id = "bootstrap",
            quote_id = "unknown",
            inserted = seeded.inserted.len(),
            skipped = seeded.skipped.len(),
            "demo quotes seeded"
        );
    }

    let service =
        Arc::new(WorkflowService::new(repository).with_audit_sink(Arc::new(TracingAuditSink)));

    Ok(Application { config, db_pool, service })
}

#[cfg(test)]
mod tests {
    use quoteflow_core::config::{ConfigOverrides, LoadOptions};
    use quoteflow_core::domain::quote::QuoteId;

    use crate::bootstrap::bootstrap;

    fn overrides(database_url: &str, seed_demo_data: bool) -> LoadOptions {
        LoadOptions {
            overrides: ConfigOverrides {
                database_url: Some(database_url.to_string()),
                seed_demo_data: Some(seed_demo_data),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        }
    }

    #[tokio::test]
    async fn bootstrap_fails_fast_on_invalid_database_url() {
        let result = bootstrap(overrides("postgres://localhost/quotes", true)).await;

        assert!(result.is_err());
        let message = result.err().map(|error| error.to_string()).unwrap_or_default();
        assert!(message.contains("database.url"));
    }

    #[tokio::test]
    async fn bootstrap_migrates_and_seeds_demo_quotes() {
        let app = bootstrap(overrides("sqlite::memory:", true))
            .await
            .expect("bootstrap should succeed with valid overrides");

        let (table_count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM sqlite_master \
             WHERE type = 'table' AND name IN ('quote', 'workflow_step')",
        )
        .fetch_one(&app.db_pool)
        .await
        .expect("expected tables after bootstrap");
        assert_eq!(table_count, 2);

        let quote = app.service.get_quote(&QuoteId("Q-2025-001".to_string())).await;
        assert!(quote.is_ok(), "demo quote should be seeded");

        app.db_pool.close().await;
    }

    #[tokio::test]
    async fn bootstrap_skips_seeding_when_disabled() {
        let app = bootstrap(overrides("sqlite::memory:", false)).await.expect("bootstrap");

        let stats = app.service.stats().await.expect("stats");
        assert_eq!(stats.total_quotes, 0);

        app.db_pool.close().await;
    }
}
