//! Core dispatch pipeline for Capstan.
//!
//! This crate owns everything between an inbound invocation and its
//! structured outcome: the capability registry and per-tool contracts, the
//! schema validator, the role-based permission gate, the
//! lookup→authorize→validate→execute dispatcher, and the bounded audit
//! trail. Transport (HTTP) and the decision engines layered on top (intent
//! routing, retrieval scoring) live in sibling crates.

pub mod audit;
pub mod capability;
pub mod config;
pub mod contracts;
pub mod dispatch;
pub mod domain;
pub mod errors;
pub mod permissions;
pub mod schema;

pub use audit::{AuditEntry, AuditLog};
pub use capability::{
    CapabilityDescriptor, CapabilityHandler, CapabilityMetadata, CapabilityRegistry,
    CapabilityView, CostClass,
};
pub use dispatch::{
    CallerIdentity, DispatchFailure, Dispatcher, InvocationOutcome, InvocationRequest,
};
pub use errors::ApiError;
pub use permissions::{authorize, Role};
pub use schema::{ObjectSchema, PropertySchema, ValidationIssue, ValidationReport};
