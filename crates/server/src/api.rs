use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info};
use uuid::Uuid;

use quoteflow_core::audit::AuditContext;
use quoteflow_core::domain::persona::Persona;
use quoteflow_core::domain::quote::{Quote, QuoteId, QuoteStatus};
use quoteflow_core::domain::workflow::StepId;
use quoteflow_core::errors::{ApplicationError, InterfaceError};
use quoteflow_core::query::{QuoteQuery, QuoteSort, QuoteStats};
use quoteflow_core::workflow::StepDraft;
use quoteflow_db::WorkflowService;

pub const CORRELATION_HEADER: &str = "x-correlation-id";
pub const ACTOR_HEADER: &str = "x-user-id";
const ANONYMOUS_ACTOR: &str = "anonymous";

#[derive(Clone)]
pub struct ApiState {
    service: Arc<WorkflowService>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: String,
}

type ApiRejection = (StatusCode, Json<ApiError>);

#[derive(Debug, Default, Deserialize)]
pub struct ReplaceWorkflowRequest {
    #[serde(default)]
    pub workflow: Option<Vec<StepDraft>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReplaceWorkflowResponse {
    pub success: bool,
    pub quote: Quote,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvanceRequest {
    pub quote_id: String,
    pub step_id: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuotesParams {
    pub search: Option<String>,
    pub status: Option<String>,
    pub sort: Option<String>,
}

pub fn router(service: Arc<WorkflowService>) -> Router {
    Router::new()
        .route("/api/workflow-personas", get(list_personas))
        .route("/api/quotes", get(list_quotes))
        .route("/api/quotes/stats", get(quote_stats))
        .route("/api/quotes/{id}", get(get_quote))
        .route("/api/quotes/{id}/workflow", put(replace_workflow))
        .route("/api/workflow/advance", post(advance_step))
        .with_state(ApiState { service })
}

struct RequestContext {
    correlation_id: String,
    actor: String,
}

impl RequestContext {
    fn from_headers(headers: &HeaderMap) -> Self {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|value| value.to_str().ok())
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(str::to_owned)
        };
        Self {
            correlation_id: header(CORRELATION_HEADER)
                .unwrap_or_else(|| Uuid::new_v4().to_string()),
            actor: header(ACTOR_HEADER).unwrap_or_else(|| ANONYMOUS_ACTOR.to_owned()),
        }
    }

    fn audit(&self, quote_id: &QuoteId) -> AuditContext {
        AuditContext::new(Some(quote_id.clone()), self.correlation_id.clone(), self.actor.clone())
    }
}

fn reject(error: ApplicationError, correlation_id: &str) -> ApiRejection {
    let mapped = error.clone().into_interface(correlation_id);
    let status = match &mapped {
        InterfaceError::BadRequest { .. } => StatusCode::BAD_REQUEST,
        InterfaceError::NotFound { .. } => StatusCode::NOT_FOUND,
        InterfaceError::Conflict { .. } => StatusCode::CONFLICT,
        InterfaceError::Internal { .. } => {
            error!(
                event_name = "api.request.failed",
                correlation_id = %correlation_id,
                error = %error,
                "request failed with internal error"
            );
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, Json(ApiError { error: mapped.user_message().to_owned() }))
}

fn bad_request(message: impl Into<String>) -> ApiRejection {
    (StatusCode::BAD_REQUEST, Json(ApiError { error: message.into() }))
}

pub async fn list_personas(State(state): State<ApiState>) -> Json<Vec<Persona>> {
    Json(state.service.personas().to_vec())
}

pub async fn list_quotes(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Query(params): Query<ListQuotesParams>,
) -> Result<Json<Vec<Quote>>, ApiRejection> {
    let context = RequestContext::from_headers(&headers);
    let status = match params.status.as_deref().map(str::trim) {
        None | Some("") | Some("all") => None,
        Some(value) => Some(value.parse::<QuoteStatus>().map_err(|e| bad_request(e.to_string()))?),
    };
    let sort = match params.sort.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(value) => Some(value.parse::<QuoteSort>().map_err(|e| bad_request(e.to_string()))?),
    };
    let query = QuoteQuery { search: params.search, status, sort };

    let quotes = state
        .service
        .list_quotes(&query)
        .await
        .map_err(|e| reject(e, &context.correlation_id))?;
    Ok(Json(quotes))
}

pub async fn quote_stats(
    State(state): State<ApiState>,
    headers: HeaderMap,
) -> Result<Json<QuoteStats>, ApiRejection> {
    let context = RequestContext::from_headers(&headers);
    let stats = state.service.stats().await.map_err(|e| reject(e, &context.correlation_id))?;
    Ok(Json(stats))
}

pub async fn get_quote(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Quote>, ApiRejection> {
    let context = RequestContext::from_headers(&headers);
    let quote = state
        .service
        .get_quote(&QuoteId(id))
        .await
        .map_err(|e| reject(e, &context.correlation_id))?;
    Ok(Json(quote))
}

pub async fn replace_workflow(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    body: Result<Json<ReplaceWorkflowRequest>, JsonRejection>,
) -> Result<Json<ReplaceWorkflowResponse>, ApiRejection> {
    let context = RequestContext::from_headers(&headers);
    let Json(request) = body.map_err(|e| bad_request(e.body_text()))?;
    let quote_id = QuoteId(id);
    let drafts = request.workflow.unwrap_or_default();

    info!(
        event_name = "api.workflow.replace_requested",
        correlation_id = %context.correlation_id,
        quote_id = %quote_id,
        actor = %context.actor,
        step_count = drafts.len(),
        "workflow replacement requested"
    );

    let quote = state
        .service
        .replace_workflow(&quote_id, &drafts, &context.audit(&quote_id))
        .await
        .map_err(|e| reject(e, &context.correlation_id))?;
    Ok(Json(ReplaceWorkflowResponse { success: true, quote }))
}

pub async fn advance_step(
    State(state): State<ApiState>,
    headers: HeaderMap,
    body: Result<Json<AdvanceRequest>, JsonRejection>,
) -> Result<Json<Quote>, ApiRejection> {
    let context = RequestContext::from_headers(&headers);
    let Json(request) = body.map_err(|e| bad_request(e.body_text()))?;
    let quote_id = QuoteId(request.quote_id);
    let step_id = StepId(request.step_id);

    info!(
        event_name = "api.workflow.advance_requested",
        correlation_id = %context.correlation_id,
        quote_id = %quote_id,
        step_id = %step_id,
        actor = %context.actor,
        "workflow advance requested"
    );

    let quote = state
        .service
        .advance_step(&quote_id, &step_id, &context.audit(&quote_id))
        .await
        .map_err(|e| reject(e, &context.correlation_id))?;
    Ok(Json(quote))
}
