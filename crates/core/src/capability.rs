//! Capability descriptors and the registry that holds them.
//!
//! The registry is an explicit instance built once at startup and shared by
//! `Arc`; nothing mutates it afterwards, so readers take no lock. Listings
//! expose a public-safe view (schema and metadata) and never the handler.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::permissions::Role;
use crate::schema::ObjectSchema;

/// Executable side of a capability.
///
/// The dispatcher only calls `execute` with input that already passed the
/// descriptor's schema, so implementations deserialize their own typed
/// input struct and may treat a mismatch as an internal fault.
#[async_trait]
pub trait CapabilityHandler: Send + Sync {
    async fn execute(&self, input: Value) -> Result<Value>;
}

/// Rough cost classification surfaced in listings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CostClass {
    Low,
    Medium,
    High,
}

/// Static metadata describing a capability's runtime profile.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CapabilityMetadata {
    pub cost: CostClass,
    pub estimated_latency: &'static str,
    pub requires_confirmation: bool,
}

/// One registered capability: contract, authorization set, metadata, and
/// the handler that runs validated input.
#[derive(Clone)]
pub struct CapabilityDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    pub schema: ObjectSchema,
    pub allowed_roles: Vec<Role>,
    pub metadata: CapabilityMetadata,
    pub handler: Arc<dyn CapabilityHandler>,
}

/// Public-safe listing entry: everything a caller may see, never the
/// handler reference.
#[derive(Clone, Debug, Serialize)]
pub struct CapabilityView {
    pub name: &'static str,
    pub description: &'static str,
    pub schema: Value,
    pub metadata: ViewMetadata,
}

#[derive(Clone, Debug, Serialize)]
pub struct ViewMetadata {
    pub cost: CostClass,
    #[serde(rename = "estimatedLatency")]
    pub estimated_latency: &'static str,
    #[serde(rename = "requiresConfirmation")]
    pub requires_confirmation: bool,
    #[serde(rename = "requiredPermissions")]
    pub required_permissions: Vec<Role>,
}

impl CapabilityDescriptor {
    pub fn view(&self) -> CapabilityView {
        CapabilityView {
            name: self.name,
            description: self.description,
            schema: self.schema.to_value(),
            metadata: ViewMetadata {
                cost: self.metadata.cost,
                estimated_latency: self.metadata.estimated_latency,
                requires_confirmation: self.metadata.requires_confirmation,
                required_permissions: self.allowed_roles.clone(),
            },
        }
    }
}

/// Registry of every capability, in registration order.
#[derive(Clone, Default)]
pub struct CapabilityRegistry {
    entries: Vec<CapabilityDescriptor>,
}

impl CapabilityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a capability at startup.
    ///
    /// # Panics
    ///
    /// Panics on a duplicate name, an empty allowed-role set, or a schema
    /// requiring undeclared properties. These are programming errors in the
    /// static tool set, not runtime faults.
    pub fn register(&mut self, descriptor: CapabilityDescriptor) {
        assert!(
            self.lookup(descriptor.name).is_none(),
            "capability `{}` registered twice",
            descriptor.name
        );
        assert!(
            !descriptor.allowed_roles.is_empty(),
            "capability `{}` must allow at least one role",
            descriptor.name
        );
        assert!(
            descriptor.schema.required_is_declared(),
            "capability `{}` requires properties its schema does not declare",
            descriptor.name
        );
        self.entries.push(descriptor);
    }

    pub fn lookup(&self, name: &str) -> Option<&CapabilityDescriptor> {
        self.entries.iter().find(|descriptor| descriptor.name == name)
    }

    /// Listing views in registration order.
    pub fn views(&self) -> Vec<CapabilityView> {
        self.entries.iter().map(CapabilityDescriptor::view).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
