use thiserror::Error;

use crate::dispatch::DispatchFailure;
use crate::schema::ValidationIssue;

/// Interface-level error taxonomy, shared by every transport surface.
///
/// Each variant maps to one wire code and one HTTP status. Messages are
/// surfaced verbatim except for `Internal` in production mode, where the
/// caller sees a generic string while the detail is logged server-side.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ApiError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("input validation failed")]
    Validation { issues: Vec<ValidationIssue> },
    #[error("execution failed: {0}")]
    Execution(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Stable wire code for the failure envelope.
    pub fn code(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "bad_request",
            Self::Unauthorized(_) => "unauthorized",
            Self::Forbidden(_) => "forbidden",
            Self::NotFound(_) => "not_found",
            Self::Validation { .. } => "validation_error",
            Self::Execution(_) => "execution_error",
            Self::Internal(_) => "internal_error",
        }
    }

    /// HTTP status the envelope is served with.
    pub fn status(&self) -> u16 {
        match self {
            Self::BadRequest(_) | Self::Validation { .. } => 400,
            Self::Unauthorized(_) => 401,
            Self::Forbidden(_) => 403,
            Self::NotFound(_) => 404,
            Self::Execution(_) | Self::Internal(_) => 500,
        }
    }

    /// Message for the caller. Internal details are redacted unless
    /// `expose_internal` is set (development mode).
    pub fn message(&self, expose_internal: bool) -> String {
        match self {
            Self::BadRequest(message)
            | Self::Unauthorized(message)
            | Self::Forbidden(message)
            | Self::NotFound(message)
            | Self::Execution(message) => message.clone(),
            Self::Validation { .. } => "Input validation failed".to_owned(),
            Self::Internal(message) => {
                if expose_internal {
                    message.clone()
                } else {
                    "An unexpected internal error occurred.".to_owned()
                }
            }
        }
    }

    /// The full violation list, present only for validation errors.
    pub fn issues(&self) -> Option<&[ValidationIssue]> {
        match self {
            Self::Validation { issues } => Some(issues),
            _ => None,
        }
    }
}

impl From<DispatchFailure> for ApiError {
    fn from(failure: DispatchFailure) -> Self {
        match failure {
            DispatchFailure::NotFound { tool } => {
                Self::NotFound(format!("Tool '{tool}' not found"))
            }
            DispatchFailure::Forbidden { tool, role } => Self::Forbidden(format!(
                "Role '{role}' not authorized to use tool '{tool}'"
            )),
            DispatchFailure::Validation { issues } => Self::Validation { issues },
            DispatchFailure::Execution { message } => Self::Execution(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ApiError;
    use crate::dispatch::DispatchFailure;
    use crate::permissions::Role;
    use crate::schema::ValidationIssue;

    #[test]
    fn codes_and_statuses_line_up() {
        let cases = [
            (ApiError::BadRequest("x".into()), "bad_request", 400),
            (ApiError::Unauthorized("x".into()), "unauthorized", 401),
            (ApiError::Forbidden("x".into()), "forbidden", 403),
            (ApiError::NotFound("x".into()), "not_found", 404),
            (ApiError::Validation { issues: vec![] }, "validation_error", 400),
            (ApiError::Execution("x".into()), "execution_error", 500),
            (ApiError::Internal("x".into()), "internal_error", 500),
        ];
        for (error, code, status) in cases {
            assert_eq!(error.code(), code);
            assert_eq!(error.status(), status);
        }
    }

    #[test]
    fn internal_detail_is_redacted_in_production() {
        let error = ApiError::Internal("lock poisoned at audit.rs:42".into());
        assert_eq!(error.message(false), "An unexpected internal error occurred.");
        assert_eq!(error.message(true), "lock poisoned at audit.rs:42");
    }

    #[test]
    fn dispatch_failures_map_to_caller_facing_messages() {
        let not_found = ApiError::from(DispatchFailure::NotFound { tool: "ghost".into() });
        assert_eq!(not_found.message(false), "Tool 'ghost' not found");

        let forbidden = ApiError::from(DispatchFailure::Forbidden {
            tool: "run_query".into(),
            role: Role::User,
        });
        assert_eq!(
            forbidden.message(false),
            "Role 'user' not authorized to use tool 'run_query'"
        );

        let validation = ApiError::from(DispatchFailure::Validation {
            issues: vec![ValidationIssue {
                path: "/q".into(),
                message: "missing required property `q`".into(),
            }],
        });
        assert_eq!(validation.issues().map(|issues| issues.len()), Some(1));
    }
}
