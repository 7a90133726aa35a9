pub mod advance;
pub mod config;
pub mod migrate;
pub mod quotes;
pub mod seed;
pub mod set_workflow;

use std::sync::Arc;

use quoteflow_core::audit::AuditContext;
use quoteflow_core::config::{AppConfig, LoadOptions};
use quoteflow_core::domain::quote::QuoteId;
use quoteflow_core::errors::{ApplicationError, InterfaceError};
use quoteflow_db::{connect, migrations, DbPool, SqlQuoteRepository, WorkflowService};
use serde::Serialize;
use serde_json::Value;
use tokio::runtime::Runtime;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
}

impl CommandResult {
    pub fn success(command: &str, message: impl Into<String>) -> Self {
        Self::success_with_data(command, message, None)
    }

    pub fn success_with_data(
        command: &str,
        message: impl Into<String>,
        data: Option<Value>,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
            data,
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
            data: None,
        };
        Self { exit_code, output: serialize_payload(payload) }
    }
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}

/// Error class, message and exit code of a failed command step.
pub(crate) type Failure = (&'static str, String, u8);

pub(crate) fn load_config() -> Result<AppConfig, Failure> {
    AppConfig::load(LoadOptions::default())
        .map_err(|error| ("config_validation", format!("configuration issue: {error}"), 2))
}

pub(crate) fn runtime() -> Result<Runtime, Failure> {
    tokio::runtime::Builder::new_current_thread().enable_all().build().map_err(|error| {
        ("runtime_init", format!("failed to initialize async runtime: {error}"), 3)
    })
}

pub(crate) async fn open_pool(config: &AppConfig) -> Result<DbPool, Failure> {
    let pool = connect(&config.database)
        .await
        .map_err(|error| ("db_connectivity", error.to_string(), 4))?;
    migrations::run_pending(&pool).await.map_err(|error| ("migration", error.to_string(), 5))?;
    Ok(pool)
}

pub(crate) fn workflow_service(pool: &DbPool) -> WorkflowService {
    WorkflowService::new(Arc::new(SqlQuoteRepository::new(pool.clone())))
}

pub(crate) fn audit_context(quote_id: &QuoteId) -> AuditContext {
    let actor = std::env::var("USER").unwrap_or_else(|_| "cli".to_string());
    AuditContext::new(Some(quote_id.clone()), format!("cli-{}", Uuid::new_v4()), actor)
}

pub(crate) fn application_failure(error: ApplicationError, correlation_id: &str) -> Failure {
    let detail = error.to_string();
    match error.into_interface(correlation_id) {
        InterfaceError::BadRequest { message, .. } => ("validation", message, 6),
        InterfaceError::NotFound { message, .. } => ("not_found", message, 7),
        InterfaceError::Conflict { message, .. } => ("conflict", message, 8),
        InterfaceError::Internal { .. } => ("persistence", detail, 9),
    }
}

/// Runs `work` on a fresh single-threaded runtime and folds every failure into the
/// command's JSON envelope.
pub(crate) fn execute<F, Fut>(command: &str, work: F) -> CommandResult
where
    F: FnOnce(AppConfig) -> Fut,
    Fut: std::future::Future<Output = Result<(String, Option<Value>), Failure>>,
{
    let outcome = load_config().and_then(|config| {
        let runtime = runtime()?;
        runtime.block_on(work(config))
    });

    match outcome {
        Ok((message, data)) => CommandResult::success_with_data(command, message, data),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure(command, error_class, message, exit_code)
        }
    }
}
