//! HTTP surface for the dispatch pipeline.
//!
//! Public endpoints:
//! - `GET  /`                — service info
//! - `GET  /health`          — health report
//!
//! Protected endpoints (`x-api-key` header):
//! - `GET  /tools`           — list capability views
//! - `POST /invoke`          — direct `{tool, input}` invocation
//! - `POST /agent/ask`       — free-text `{message}` routed through the intent router
//! - `GET  /admin/audit`     — recent audit entries (admin role)
//! - `GET  /admin/tickets`   — stored tickets, newest first (admin role)

use axum::extract::{Extension, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{middleware, Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

use capstan_agent::{respond, IntentDecision};
use capstan_core::audit::{AuditEntry, DEFAULT_LISTING_LIMIT};
use capstan_core::capability::CapabilityView;
use capstan_core::dispatch::{CallerIdentity, InvocationRequest};
use capstan_core::domain::Ticket;
use capstan_core::errors::ApiError;
use capstan_core::permissions::Role;
use capstan_core::schema::ValidationIssue;

use crate::auth;
use crate::bootstrap::AppState;

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<ValidationIssue>>,
}

#[derive(Debug, Serialize)]
pub struct ServiceInfo {
    pub name: &'static str,
    pub version: &'static str,
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: HealthCheck,
    pub registry: HealthCheck,
    pub checked_at: String,
}

#[derive(Debug, Serialize)]
pub struct ToolsResponse {
    pub success: bool,
    pub tools: Vec<CapabilityView>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct InvokeMetadata {
    #[serde(rename = "executionTime")]
    pub execution_time: String,
    #[serde(rename = "requestId")]
    pub request_id: String,
}

#[derive(Debug, Serialize)]
pub struct InvokeResponse {
    pub success: bool,
    pub tool: String,
    pub result: Value,
    pub metadata: InvokeMetadata,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentResponse {
    pub success: bool,
    pub response: String,
    pub tool_used: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_input: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AuditResponse {
    pub success: bool,
    pub logs: Vec<AuditEntry>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct TicketsResponse {
    pub success: bool,
    pub tickets: Vec<Ticket>,
    pub count: usize,
}

#[derive(Debug, Deserialize, Default)]
pub struct AuditQuery {
    pub limit: Option<usize>,
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/tools", get(list_tools))
        .route("/invoke", post(invoke))
        .route("/agent/ask", post(agent_ask))
        .route("/admin/audit", get(audit_log))
        .route("/admin/tickets", get(list_tickets))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::require_api_key));

    Router::new()
        .route("/", get(service_info))
        .route("/health", get(health))
        .merge(protected)
        .with_state(state)
}

/// Build the failure envelope for an [`ApiError`].
///
/// Internal details are logged here in full; whether they also reach the
/// caller depends on `expose_internal`.
pub fn error_response(expose_internal: bool, error: ApiError) -> Response {
    if let ApiError::Internal(detail) = &error {
        tracing::error!(detail = %detail, "internal error");
    }
    let status = match error.status() {
        400 => StatusCode::BAD_REQUEST,
        401 => StatusCode::UNAUTHORIZED,
        403 => StatusCode::FORBIDDEN,
        404 => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let body = ErrorBody {
        error: error.code(),
        message: error.message(expose_internal),
        details: error.issues().map(|issues| issues.to_vec()),
    };
    (status, Json(body)).into_response()
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn service_info() -> Json<ServiceInfo> {
    Json(ServiceInfo {
        name: "capstan-server",
        version: env!("CARGO_PKG_VERSION"),
        status: "running",
    })
}

async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let registry = if state.registry.is_empty() {
        HealthCheck { status: "degraded", detail: "no capabilities registered".to_owned() }
    } else {
        HealthCheck {
            status: "ready",
            detail: format!("{} capabilities registered", state.registry.len()),
        }
    };
    let ready = registry.status == "ready";

    let payload = HealthResponse {
        status: if ready { "ready" } else { "degraded" },
        service: HealthCheck {
            status: "ready",
            detail: "capstan-server runtime initialized".to_owned(),
        },
        registry,
        checked_at: Utc::now().to_rfc3339(),
    };

    let status_code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(payload))
}

async fn list_tools(State(state): State<AppState>) -> Json<ToolsResponse> {
    let tools = state.registry.views();
    let count = tools.len();
    Json(ToolsResponse { success: true, tools, count })
}

async fn invoke(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerIdentity>,
    Json(body): Json<Value>,
) -> Response {
    let expose_internal = state.expose_internal_errors();

    let Some(tool) = body.get("tool").and_then(Value::as_str) else {
        return error_response(
            expose_internal,
            ApiError::BadRequest("Tool name is required".to_owned()),
        );
    };
    let input = body.get("input").cloned().unwrap_or_else(|| json!({}));

    let request = InvocationRequest { tool: tool.to_owned(), input, caller };
    let outcome = state.dispatcher.dispatch(request).await;

    match outcome.result {
        Ok(result) => Json(InvokeResponse {
            success: true,
            tool: tool.to_owned(),
            result,
            metadata: InvokeMetadata {
                execution_time: format!("{}ms", outcome.elapsed.as_millis()),
                request_id: outcome.request_id,
            },
        })
        .into_response(),
        Err(failure) => error_response(expose_internal, ApiError::from(failure)),
    }
}

async fn agent_ask(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerIdentity>,
    Json(body): Json<Value>,
) -> Response {
    let expose_internal = state.expose_internal_errors();

    let Some(message) = body.get("message").and_then(Value::as_str) else {
        return error_response(
            expose_internal,
            ApiError::BadRequest("Message is required".to_owned()),
        );
    };

    let decision = state.router.route(message);
    info!(
        should_dispatch = decision.should_dispatch(),
        tool = decision.tool().unwrap_or("none"),
        "intent decision"
    );

    match decision {
        IntentDecision::Converse { .. } => Json(AgentResponse {
            success: true,
            response: respond::no_tool_response(message),
            tool_used: false,
            tool_name: None,
            tool_input: None,
            tool_result: None,
            reasoning: None,
        })
        .into_response(),
        IntentDecision::Dispatch { tool, input, reasoning } => {
            let request = InvocationRequest {
                tool: tool.to_owned(),
                input: input.clone(),
                caller,
            };
            let outcome = state.dispatcher.dispatch(request).await;

            match outcome.result {
                Ok(result) => Json(AgentResponse {
                    success: true,
                    response: respond::phrase_result(tool, &result),
                    tool_used: true,
                    tool_name: Some(tool.to_owned()),
                    tool_input: Some(input),
                    tool_result: Some(result),
                    reasoning: Some(reasoning.to_owned()),
                })
                .into_response(),
                Err(failure) => error_response(expose_internal, ApiError::from(failure)),
            }
        }
    }
}

async fn audit_log(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerIdentity>,
    Query(query): Query<AuditQuery>,
) -> Response {
    let expose_internal = state.expose_internal_errors();
    if caller.role != Role::Admin {
        return error_response(
            expose_internal,
            ApiError::Forbidden(format!(
                "Role '{}' not authorized to view the audit log",
                caller.role
            )),
        );
    }

    let logs = state.audit.recent(query.limit.unwrap_or(DEFAULT_LISTING_LIMIT));
    let count = logs.len();
    Json(AuditResponse { success: true, logs, count }).into_response()
}

async fn list_tickets(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerIdentity>,
) -> Response {
    let expose_internal = state.expose_internal_errors();
    if caller.role != Role::Admin {
        return error_response(
            expose_internal,
            ApiError::Forbidden(format!(
                "Role '{}' not authorized to list tickets",
                caller.role
            )),
        );
    }

    let tickets = state.tickets.all();
    let count = tickets.len();
    Json(TicketsResponse { success: true, tickets, count }).into_response()
}
