//! The dispatch pipeline: lookup, authorize, validate, execute, audit.
//!
//! The stage order is load-bearing. Authorization runs before validation so
//! a forbidden caller learns only "forbidden", never whether its input
//! would have validated; lookup runs first so nonexistent tools never cost
//! validation work. Every outcome, on every branch, is recorded with the
//! audit log before it is returned.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

use crate::audit::{AuditEntry, AuditLog};
use crate::capability::CapabilityRegistry;
use crate::permissions::{authorize, Role};
use crate::schema::ValidationIssue;

/// Who is invoking. The name is the resolved API-key name (or
/// "anonymous"); the client ip, when known, only feeds the audit trail.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallerIdentity {
    pub name: String,
    pub role: Role,
    pub client_ip: Option<String>,
}

impl CallerIdentity {
    pub fn anonymous(role: Role) -> Self {
        Self { name: "anonymous".to_owned(), role, client_ip: None }
    }

    pub fn named(name: impl Into<String>, role: Role) -> Self {
        Self { name: name.into(), role, client_ip: None }
    }
}

/// One invocation, constructed from the inbound request and consumed
/// entirely within one dispatch.
#[derive(Clone, Debug)]
pub struct InvocationRequest {
    pub tool: String,
    pub input: Value,
    pub caller: CallerIdentity,
}

/// Why a dispatch did not produce a result.
#[derive(Clone, Debug, PartialEq)]
pub enum DispatchFailure {
    NotFound { tool: String },
    Forbidden { tool: String, role: Role },
    Validation { issues: Vec<ValidationIssue> },
    Execution { message: String },
}

impl DispatchFailure {
    pub fn status(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::Forbidden { .. } => "forbidden",
            Self::Validation { .. } => "validation_error",
            Self::Execution { .. } => "execution_error",
        }
    }
}

/// What one dispatch produced. `elapsed` measures handler execution only;
/// failures before execution report zero.
#[derive(Clone, Debug)]
pub struct InvocationOutcome {
    pub request_id: String,
    pub result: Result<Value, DispatchFailure>,
    pub elapsed: Duration,
}

impl InvocationOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    pub fn status(&self) -> &'static str {
        match &self.result {
            Ok(_) => "success",
            Err(failure) => failure.status(),
        }
    }
}

/// Runs invocations through the four-stage pipeline against one registry,
/// surfacing every outcome to the audit log.
#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<CapabilityRegistry>,
    audit: AuditLog,
}

impl Dispatcher {
    pub fn new(registry: Arc<CapabilityRegistry>, audit: AuditLog) -> Self {
        Self { registry, audit }
    }

    pub fn registry(&self) -> &CapabilityRegistry {
        &self.registry
    }

    pub async fn dispatch(&self, request: InvocationRequest) -> InvocationOutcome {
        let outcome = self.run_pipeline(&request).await;

        self.audit.record(AuditEntry {
            id: outcome.request_id.clone(),
            timestamp: chrono::Utc::now(),
            tool: request.tool.clone(),
            input: request.input.clone(),
            success: outcome.is_success(),
            user: request.caller.name.clone(),
            role: request.caller.role,
            ip: request.caller.client_ip.clone(),
        });

        if outcome.is_success() {
            info!(
                tool = %request.tool,
                request_id = %outcome.request_id,
                elapsed_ms = outcome.elapsed.as_millis() as u64,
                "tool executed successfully"
            );
        } else {
            warn!(
                tool = %request.tool,
                request_id = %outcome.request_id,
                status = outcome.status(),
                "tool dispatch failed"
            );
        }

        outcome
    }

    async fn run_pipeline(&self, request: &InvocationRequest) -> InvocationOutcome {
        let request_id = Uuid::new_v4().to_string();
        let fail = |failure: DispatchFailure| InvocationOutcome {
            request_id: request_id.clone(),
            result: Err(failure),
            elapsed: Duration::ZERO,
        };

        let Some(descriptor) = self.registry.lookup(&request.tool) else {
            return fail(DispatchFailure::NotFound { tool: request.tool.clone() });
        };

        if !authorize(&descriptor.allowed_roles, request.caller.role) {
            return fail(DispatchFailure::Forbidden {
                tool: request.tool.clone(),
                role: request.caller.role,
            });
        }

        let report = descriptor.schema.validate(&request.input);
        if !report.is_valid() {
            return fail(DispatchFailure::Validation { issues: report.into_issues() });
        }

        let started = Instant::now();
        let executed = descriptor.handler.execute(request.input.clone()).await;
        let elapsed = started.elapsed();

        match executed {
            Ok(result) => InvocationOutcome { request_id, result: Ok(result), elapsed },
            Err(error) => InvocationOutcome {
                request_id,
                result: Err(DispatchFailure::Execution { message: error.to_string() }),
                elapsed,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use anyhow::{bail, Result};
    use async_trait::async_trait;
    use serde_json::{json, Value};

    use super::{CallerIdentity, DispatchFailure, Dispatcher, InvocationRequest};
    use crate::audit::AuditLog;
    use crate::capability::{
        CapabilityDescriptor, CapabilityHandler, CapabilityMetadata, CapabilityRegistry,
        CostClass,
    };
    use crate::permissions::Role;
    use crate::schema::{ObjectSchema, PropertySchema};

    struct EchoHandler;

    #[async_trait]
    impl CapabilityHandler for EchoHandler {
        async fn execute(&self, input: Value) -> Result<Value> {
            Ok(json!({"echo": input}))
        }
    }

    struct FailingHandler;

    #[async_trait]
    impl CapabilityHandler for FailingHandler {
        async fn execute(&self, _input: Value) -> Result<Value> {
            bail!("backend unavailable")
        }
    }

    fn registry() -> Arc<CapabilityRegistry> {
        let mut registry = CapabilityRegistry::new();
        registry.register(CapabilityDescriptor {
            name: "echo",
            description: "echo validated input",
            schema: ObjectSchema::new()
                .property("q", PropertySchema::string().min_length(1))
                .required(&["q"])
                .deny_unknown(),
            allowed_roles: vec![Role::Admin, Role::User],
            metadata: CapabilityMetadata {
                cost: CostClass::Low,
                estimated_latency: "1ms",
                requires_confirmation: false,
            },
            handler: Arc::new(EchoHandler),
        });
        registry.register(CapabilityDescriptor {
            name: "flaky",
            description: "always fails",
            schema: ObjectSchema::new(),
            allowed_roles: vec![Role::Admin],
            metadata: CapabilityMetadata {
                cost: CostClass::High,
                estimated_latency: "1ms",
                requires_confirmation: true,
            },
            handler: Arc::new(FailingHandler),
        });
        Arc::new(registry)
    }

    fn dispatcher() -> (Dispatcher, AuditLog) {
        let audit = AuditLog::default();
        (Dispatcher::new(registry(), audit.clone()), audit)
    }

    fn request(tool: &str, input: Value, role: Role) -> InvocationRequest {
        InvocationRequest {
            tool: tool.to_owned(),
            input,
            caller: CallerIdentity::anonymous(role),
        }
    }

    #[tokio::test]
    async fn unknown_tool_is_not_found_for_every_role() {
        let (dispatcher, _audit) = dispatcher();
        for role in [Role::Admin, Role::User, Role::Guest] {
            let outcome =
                dispatcher.dispatch(request("no_such_tool", json!({}), role)).await;
            assert_eq!(outcome.status(), "not_found");
        }
    }

    #[tokio::test]
    async fn forbidden_is_decided_before_validation() {
        let (dispatcher, _audit) = dispatcher();
        // Invalid input on a tool the caller may not use: the caller must
        // see forbidden, not the validation issues.
        let outcome =
            dispatcher.dispatch(request("flaky", json!({"bogus": true}), Role::User)).await;
        assert_eq!(outcome.status(), "forbidden");
    }

    #[tokio::test]
    async fn validation_failures_never_reach_the_handler() {
        let (dispatcher, _audit) = dispatcher();
        let outcome = dispatcher
            .dispatch(request("echo", json!({"q": "", "extra": 1}), Role::User))
            .await;

        match outcome.result {
            Err(DispatchFailure::Validation { issues }) => {
                assert_eq!(issues.len(), 2);
                assert_eq!(issues[0].path, "/q");
                assert_eq!(issues[1].path, "/extra");
            }
            other => panic!("expected validation failure, got {other:?}"),
        }
        assert!(outcome.elapsed.is_zero());
    }

    #[tokio::test]
    async fn success_carries_the_handler_payload() {
        let (dispatcher, _audit) = dispatcher();
        let outcome =
            dispatcher.dispatch(request("echo", json!({"q": "laptop"}), Role::User)).await;

        assert!(outcome.is_success());
        let result = outcome.result.expect("success payload");
        assert_eq!(result["echo"]["q"], "laptop");
    }

    #[tokio::test]
    async fn handler_faults_become_execution_errors() {
        let (dispatcher, _audit) = dispatcher();
        let outcome = dispatcher.dispatch(request("flaky", json!({}), Role::Admin)).await;

        match outcome.result {
            Err(DispatchFailure::Execution { message }) => {
                assert_eq!(message, "backend unavailable");
            }
            other => panic!("expected execution failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn every_branch_is_audited() {
        let (dispatcher, audit) = dispatcher();
        dispatcher.dispatch(request("missing", json!({}), Role::User)).await;
        dispatcher.dispatch(request("flaky", json!({}), Role::User)).await;
        dispatcher.dispatch(request("echo", json!({"q": 1}), Role::User)).await;
        dispatcher.dispatch(request("echo", json!({"q": "ok"}), Role::User)).await;

        let entries = audit.recent(10);
        assert_eq!(entries.len(), 4);
        let successes: Vec<bool> = entries.iter().map(|entry| entry.success).collect();
        assert_eq!(successes, vec![false, false, false, true]);
    }

    #[tokio::test]
    async fn identical_dispatches_yield_independent_audit_entries() {
        let (dispatcher, audit) = dispatcher();
        let input = json!({"q": "laptop"});
        dispatcher.dispatch(request("echo", input.clone(), Role::User)).await;
        dispatcher.dispatch(request("echo", input.clone(), Role::User)).await;

        let entries = audit.recent(10);
        assert_eq!(entries.len(), 2);
        assert_ne!(entries[0].id, entries[1].id);
        assert_eq!(entries[0].tool, entries[1].tool);
        assert_eq!(entries[0].input, entries[1].input);
        assert_eq!(entries[0].success, entries[1].success);
    }
}
