//! Deterministic agent layer: intent routing and response phrasing.
//!
//! The router maps free text to a capability invocation (or none) through
//! an ordered keyword-rule table; the responder turns tool outcomes back
//! into one-sentence summaries. Both are total, deterministic functions,
//! so the whole layer is table-testable. Anything model-driven (an LLM
//! rewriting the final sentence) sits outside this crate.

pub mod respond;
pub mod router;

pub use router::{IntentDecision, IntentRouter};
