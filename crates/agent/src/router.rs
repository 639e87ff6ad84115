//! Keyword intent routing: free text in, capability invocation (or none)
//! out.
//!
//! The router is an ordered rule table; the first rule whose keyword set
//! matches the lowercased message wins, so precedence is the table order
//! and there are no scores or ties to break. Routing is a total,
//! deterministic function of the message text: no model call, no
//! randomness.

use serde_json::{json, Value};

use capstan_core::contracts;

/// What the router decided for one message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IntentDecision {
    /// Dispatch `tool` with the synthesized input.
    Dispatch { tool: &'static str, input: Value, reasoning: &'static str },
    /// No tool applies; answer conversationally.
    Converse { reasoning: &'static str },
}

impl IntentDecision {
    pub fn should_dispatch(&self) -> bool {
        matches!(self, Self::Dispatch { .. })
    }

    pub fn tool(&self) -> Option<&'static str> {
        match self {
            Self::Dispatch { tool, .. } => Some(tool),
            Self::Converse { .. } => None,
        }
    }

    pub fn reasoning(&self) -> &'static str {
        match self {
            Self::Dispatch { reasoning, .. } | Self::Converse { reasoning } => reasoning,
        }
    }
}

/// One routing rule: a keyword trigger, the target tool, and the function
/// that synthesizes the tool input from the raw message.
struct RoutingRule {
    name: &'static str,
    keywords: &'static [&'static str],
    tool: &'static str,
    reasoning: &'static str,
    synthesize: fn(&str) -> Value,
}

impl RoutingRule {
    fn matches(&self, lowercased: &str) -> bool {
        self.keywords.iter().any(|keyword| lowercased.contains(keyword))
    }
}

const KNOWLEDGE_KEYWORDS: &[&str] = &[
    "battery", "policy", "return", "warranty", "manual", "doc", "spec", "details",
    "information", "context",
];

const PRODUCT_KEYWORDS: &[&str] = &["search", "find", "product", "laptop", "mouse", "chair"];

const SUPPORT_KEYWORDS: &[&str] = &["ticket", "issue", "problem"];

const DATA_KEYWORDS: &[&str] = &["query", "database"];

/// Filler stripped from a product-search message before it becomes the
/// search query.
const SEARCH_STOP_WORDS: &[&str] = &[
    "search", "find", "for", "product", "products", "item", "items", "give", "me", "show",
    "list", "of", "all", "please", "the", "a", "an", "i", "want", "need", "looking",
];

/// Query used when stop-word stripping leaves nothing.
const DEFAULT_SEARCH_TOKEN: &str = "laptop";

/// Synthesized ticket titles are bounded to this many characters.
const MAX_TITLE_CHARS: usize = 100;

const CANNED_QUERY: &str = "SELECT * FROM products LIMIT 5";

fn synthesize_rag(message: &str) -> Value {
    json!({ "query": message, "topK": 3 })
}

fn synthesize_search(message: &str) -> Value {
    let lowercased = message.to_lowercase();
    let tokens: Vec<&str> = lowercased
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|token| !token.is_empty() && !SEARCH_STOP_WORDS.iter().any(|stop| stop == token))
        .collect();
    let q = if tokens.is_empty() {
        DEFAULT_SEARCH_TOKEN.to_owned()
    } else {
        tokens.join(" ")
    };
    json!({ "q": q, "limit": 5 })
}

fn synthesize_ticket(message: &str) -> Value {
    let title: String = message.chars().take(MAX_TITLE_CHARS).collect();
    json!({ "title": title, "body": message, "priority": "medium" })
}

fn synthesize_query(_message: &str) -> Value {
    json!({ "query": CANNED_QUERY })
}

/// The default rule table, in precedence order: knowledge lookups beat
/// product searches beat ticket creation beats data queries.
fn default_rules() -> Vec<RoutingRule> {
    vec![
        RoutingRule {
            name: "knowledge",
            keywords: KNOWLEDGE_KEYWORDS,
            tool: contracts::RAG_QUERY,
            reasoning: "user asks for knowledge or context; retrieving documentation",
            synthesize: synthesize_rag,
        },
        RoutingRule {
            name: "product-search",
            keywords: PRODUCT_KEYWORDS,
            tool: contracts::SEARCH_DB,
            reasoning: "user wants to search products",
            synthesize: synthesize_search,
        },
        RoutingRule {
            name: "support",
            keywords: SUPPORT_KEYWORDS,
            tool: contracts::CREATE_TICKET,
            reasoning: "user wants to create a support ticket",
            synthesize: synthesize_ticket,
        },
        RoutingRule {
            name: "data-query",
            keywords: DATA_KEYWORDS,
            tool: contracts::RUN_QUERY,
            reasoning: "user wants to query the database",
            synthesize: synthesize_query,
        },
    ]
}

pub struct IntentRouter {
    rules: Vec<RoutingRule>,
}

impl Default for IntentRouter {
    fn default() -> Self {
        Self { rules: default_rules() }
    }
}

impl IntentRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|rule| rule.name).collect()
    }

    pub fn route(&self, message: &str) -> IntentDecision {
        let lowercased = message.to_lowercase();
        for rule in &self.rules {
            if rule.matches(&lowercased) {
                return IntentDecision::Dispatch {
                    tool: rule.tool,
                    input: (rule.synthesize)(message),
                    reasoning: rule.reasoning,
                };
            }
        }
        IntentDecision::Converse {
            reasoning: "no routing keywords matched; general conversation",
        }
    }
}
