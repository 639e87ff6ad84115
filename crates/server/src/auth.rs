//! API-key authentication.
//!
//! Every protected route requires an `x-api-key` header resolved against
//! the configured per-key table; the matching entry supplies the caller's
//! name and role. With authentication disabled, callers are "anonymous"
//! with the configured anonymous role. A correct key establishes identity
//! only; what the role may do is decided later by the permission gate.

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use tracing::debug;

use capstan_core::dispatch::CallerIdentity;
use capstan_core::errors::ApiError;

use crate::api::error_response;
use crate::bootstrap::AppState;

pub const API_KEY_HEADER: &str = "x-api-key";

/// Best-effort client address for the audit trail.
fn client_ip(request: &Request) -> Option<String> {
    request
        .headers()
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

/// Resolve the caller identity or reject with 401.
pub async fn require_api_key(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let auth = &state.config.auth;
    let expose_internal = state.expose_internal_errors();
    let ip = client_ip(&request);

    let identity = if auth.enabled {
        let presented = request
            .headers()
            .get(API_KEY_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty());

        let Some(presented) = presented else {
            return error_response(
                expose_internal,
                ApiError::Unauthorized("API key is required".to_owned()),
            );
        };

        let Some(entry) = auth.api_keys.iter().find(|entry| entry.key == presented) else {
            return error_response(
                expose_internal,
                ApiError::Unauthorized("Invalid API key".to_owned()),
            );
        };

        debug!(key_name = %entry.name, role = %entry.role, "api key resolved");
        CallerIdentity { name: entry.name.clone(), role: entry.role, client_ip: ip }
    } else {
        CallerIdentity { client_ip: ip, ..CallerIdentity::anonymous(auth.anonymous_role) }
    };

    request.extensions_mut().insert(identity);
    next.run(request).await
}
