//! Wire contracts for the built-in tools: names, typed inputs and outputs,
//! input schemas, and descriptor constructors.
//!
//! The tool set is closed. Each tool gets its own strongly typed
//! input/output pair; the dispatcher validates raw JSON against the schema
//! here, and the handler deserializes the typed input. Serde defaults
//! mirror the `default` values advertised in the schemas.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::capability::{
    CapabilityDescriptor, CapabilityHandler, CapabilityMetadata, CostClass,
};
use crate::domain::{Product, ProductCategory, ScoredChunk, Ticket, TicketPriority};
use crate::permissions::Role;
use crate::schema::{ObjectSchema, PropertySchema};

pub const SEARCH_DB: &str = "search_db";
pub const CREATE_TICKET: &str = "create_ticket";
pub const RUN_QUERY: &str = "run_query";
pub const RAG_QUERY: &str = "rag_query";

// ---------------------------------------------------------------------------
// search_db
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Deserialize)]
pub struct SearchDbInput {
    pub q: String,
    #[serde(default)]
    pub category: Option<ProductCategory>,
    #[serde(default = "default_search_limit")]
    pub limit: u64,
}

fn default_search_limit() -> u64 {
    10
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SearchDbOutput {
    pub hits: Vec<Product>,
    pub total: usize,
    pub query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<ProductCategory>,
}

pub fn search_db_schema() -> ObjectSchema {
    ObjectSchema::new()
        .property("q", PropertySchema::string().description("Search query").min_length(1))
        .property(
            "category",
            PropertySchema::string()
                .description("Filter by category")
                .one_of(&["Electronics", "Furniture", "Stationery"]),
        )
        .property(
            "limit",
            PropertySchema::integer()
                .description("Maximum number of results")
                .minimum(1.0)
                .maximum(100.0)
                .default_value(json!(10)),
        )
        .required(&["q"])
        .deny_unknown()
}

pub fn search_db_descriptor(handler: Arc<dyn CapabilityHandler>) -> CapabilityDescriptor {
    CapabilityDescriptor {
        name: SEARCH_DB,
        description: "Search product database by keywords and filters",
        schema: search_db_schema(),
        allowed_roles: vec![Role::Admin, Role::User],
        metadata: CapabilityMetadata {
            cost: CostClass::Low,
            estimated_latency: "100ms",
            requires_confirmation: false,
        },
        handler,
    }
}

// ---------------------------------------------------------------------------
// create_ticket
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Deserialize)]
pub struct CreateTicketInput {
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub priority: TicketPriority,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CreateTicketOutput {
    pub ticket: Ticket,
}

pub fn create_ticket_schema() -> ObjectSchema {
    ObjectSchema::new()
        .property(
            "title",
            PropertySchema::string()
                .description("Ticket title")
                .min_length(5)
                .max_length(200),
        )
        .property(
            "body",
            PropertySchema::string().description("Ticket description").min_length(10),
        )
        .property(
            "priority",
            PropertySchema::string()
                .description("Ticket priority level")
                .one_of(&["low", "medium", "high", "urgent"])
                .default_value(json!("medium")),
        )
        .required(&["title", "body"])
        .deny_unknown()
}

pub fn create_ticket_descriptor(handler: Arc<dyn CapabilityHandler>) -> CapabilityDescriptor {
    CapabilityDescriptor {
        name: CREATE_TICKET,
        description: "Create a support ticket in the ticketing system",
        schema: create_ticket_schema(),
        allowed_roles: vec![Role::Admin, Role::User],
        metadata: CapabilityMetadata {
            cost: CostClass::Medium,
            estimated_latency: "150ms",
            requires_confirmation: false,
        },
        handler,
    }
}

// ---------------------------------------------------------------------------
// run_query
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Deserialize)]
pub struct RunQueryInput {
    pub query: String,
    #[serde(default = "default_database")]
    pub database: String,
}

fn default_database() -> String {
    "default".to_owned()
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunQueryOutput {
    pub database: String,
    pub query: String,
    pub rows: Vec<Value>,
    #[serde(rename = "rowCount")]
    pub row_count: usize,
    #[serde(rename = "executionTime")]
    pub execution_time: String,
}

pub fn run_query_schema() -> ObjectSchema {
    ObjectSchema::new()
        .property(
            "query",
            PropertySchema::string().description("SQL query to execute").min_length(5),
        )
        .property(
            "database",
            PropertySchema::string()
                .description("Target database")
                .default_value(json!("default")),
        )
        .required(&["query"])
        .deny_unknown()
}

pub fn run_query_descriptor(handler: Arc<dyn CapabilityHandler>) -> CapabilityDescriptor {
    CapabilityDescriptor {
        name: RUN_QUERY,
        description: "Execute a database query (admin only, read-only)",
        schema: run_query_schema(),
        allowed_roles: vec![Role::Admin],
        metadata: CapabilityMetadata {
            cost: CostClass::High,
            estimated_latency: "200ms",
            requires_confirmation: true,
        },
        handler,
    }
}

// ---------------------------------------------------------------------------
// rag_query
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Deserialize)]
pub struct RagQueryInput {
    pub query: String,
    #[serde(rename = "topK", default = "default_top_k")]
    pub top_k: usize,
}

fn default_top_k() -> usize {
    3
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RagQueryOutput {
    pub query: String,
    #[serde(rename = "topK")]
    pub top_k: usize,
    pub results: Vec<ScoredChunk>,
    pub context: String,
}

pub fn rag_query_schema() -> ObjectSchema {
    ObjectSchema::new()
        .property(
            "query",
            PropertySchema::string()
                .description("User query to retrieve relevant context")
                .min_length(3),
        )
        .property(
            "topK",
            PropertySchema::integer()
                .description("Number of chunks to retrieve")
                .minimum(1.0)
                .maximum(10.0)
                .default_value(json!(3)),
        )
        .required(&["query"])
        .deny_unknown()
}

pub fn rag_query_descriptor(handler: Arc<dyn CapabilityHandler>) -> CapabilityDescriptor {
    CapabilityDescriptor {
        name: RAG_QUERY,
        description: "Retrieve relevant context chunks using embeddings (basic RAG)",
        schema: rag_query_schema(),
        allowed_roles: vec![Role::Admin, Role::User],
        metadata: CapabilityMetadata {
            cost: CostClass::Medium,
            estimated_latency: "200ms",
            requires_confirmation: false,
        },
        handler,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{
        create_ticket_schema, rag_query_schema, run_query_schema, search_db_schema,
        CreateTicketInput, RagQueryInput, RunQueryInput, SearchDbInput,
    };
    use crate::domain::TicketPriority;

    #[test]
    fn search_input_defaults_match_the_schema() {
        let input: SearchDbInput =
            serde_json::from_value(json!({"q": "laptop"})).expect("deserialize");
        assert_eq!(input.limit, 10);
        assert!(input.category.is_none());
        assert!(search_db_schema().validate(&json!({"q": "laptop"})).is_valid());
    }

    #[test]
    fn search_schema_rejects_out_of_range_limits() {
        let report = search_db_schema().validate(&json!({"q": "laptop", "limit": 101}));
        assert!(!report.is_valid());
    }

    #[test]
    fn ticket_priority_defaults_to_medium() {
        let input: CreateTicketInput = serde_json::from_value(json!({
            "title": "Login issue",
            "body": "Cannot log in since Tuesday"
        }))
        .expect("deserialize");
        assert_eq!(input.priority, TicketPriority::Medium);

        let report = create_ticket_schema().validate(&json!({
            "title": "bad",
            "body": "short"
        }));
        assert_eq!(report.issues().len(), 2);
    }

    #[test]
    fn run_query_database_defaults() {
        let input: RunQueryInput =
            serde_json::from_value(json!({"query": "SELECT 1 FROM t"})).expect("deserialize");
        assert_eq!(input.database, "default");
        assert!(run_query_schema().validate(&json!({"query": "SELECT 1"})).is_valid());
    }

    #[test]
    fn rag_top_k_uses_the_wire_name() {
        let input: RagQueryInput =
            serde_json::from_value(json!({"query": "return policy", "topK": 5}))
                .expect("deserialize");
        assert_eq!(input.top_k, 5);

        let defaulted: RagQueryInput =
            serde_json::from_value(json!({"query": "return policy"})).expect("deserialize");
        assert_eq!(defaulted.top_k, 3);

        assert!(!rag_query_schema()
            .validate(&json!({"query": "return policy", "topK": 11}))
            .is_valid());
    }
}
