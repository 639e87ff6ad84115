//! Deterministic phrasing of tool outcomes.
//!
//! Turns a tool's typed output back into the one-sentence summary shown to
//! the user. An LLM rewrite of these sentences is an external concern; the
//! strings here are the canonical fallback and what the tests pin down.

use serde_json::Value;

use capstan_core::contracts::{
    self, CreateTicketOutput, RagQueryOutput, RunQueryOutput, SearchDbOutput,
};

/// Reply for a message no rule matched.
pub fn no_tool_response(message: &str) -> String {
    format!(
        "I understand you said: \"{message}\". How can I help you? You can ask me to \
         search products, create tickets, or query the database."
    )
}

/// Summarize a successful tool result. Falls back to a neutral sentence if
/// the payload does not deserialize as the tool's output contract.
pub fn phrase_result(tool: &str, result: &Value) -> String {
    let phrased = match tool {
        contracts::SEARCH_DB => serde_json::from_value::<SearchDbOutput>(result.clone())
            .map(|output| phrase_search(&output))
            .ok(),
        contracts::CREATE_TICKET => serde_json::from_value::<CreateTicketOutput>(result.clone())
            .map(|output| phrase_ticket(&output))
            .ok(),
        contracts::RUN_QUERY => serde_json::from_value::<RunQueryOutput>(result.clone())
            .map(|output| phrase_query(&output))
            .ok(),
        contracts::RAG_QUERY => serde_json::from_value::<RagQueryOutput>(result.clone())
            .map(|output| phrase_rag(&output))
            .ok(),
        _ => None,
    };
    phrased.unwrap_or_else(|| format!("Tool '{tool}' completed."))
}

fn phrase_search(output: &SearchDbOutput) -> String {
    let listed = output
        .hits
        .iter()
        .map(|hit| format!("{} (${})", hit.name, hit.price))
        .collect::<Vec<_>>()
        .join(", ");
    format!("I found {} product(s): {listed}", output.hits.len())
}

fn phrase_ticket(output: &CreateTicketOutput) -> String {
    format!(
        "I've created ticket {} with title \"{}\". Our team will review it shortly.",
        output.ticket.id, output.ticket.title
    )
}

fn phrase_query(output: &RunQueryOutput) -> String {
    format!("Query executed successfully. Found {} rows.", output.row_count)
}

fn phrase_rag(output: &RagQueryOutput) -> String {
    if output.results.is_empty() {
        return "No relevant context found.".to_owned();
    }
    let lines = output
        .results
        .iter()
        .map(|chunk| format!("- {} (source: {})", chunk.content, chunk.source))
        .collect::<Vec<_>>()
        .join("\n");
    format!("Here is relevant context based on your question:\n{lines}")
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{no_tool_response, phrase_result};
    use capstan_core::contracts;

    #[test]
    fn search_results_are_listed_with_prices() {
        let result = json!({
            "hits": [
                {
                    "id": "prod-001",
                    "name": "Laptop Pro",
                    "category": "Electronics",
                    "price": "1299",
                    "createdAt": "2026-01-01T00:00:00Z"
                }
            ],
            "total": 1,
            "query": "laptop"
        });
        assert_eq!(
            phrase_result(contracts::SEARCH_DB, &result),
            "I found 1 product(s): Laptop Pro ($1299)"
        );
    }

    #[test]
    fn ticket_phrase_names_id_and_title() {
        let result = json!({
            "ticket": {
                "id": "t-123",
                "title": "Login issue",
                "body": "Cannot log in",
                "priority": "medium",
                "status": "open",
                "createdAt": "2026-01-01T00:00:00Z"
            }
        });
        assert_eq!(
            phrase_result(contracts::CREATE_TICKET, &result),
            "I've created ticket t-123 with title \"Login issue\". Our team will review it shortly."
        );
    }

    #[test]
    fn query_phrase_reports_the_row_count() {
        let result = json!({
            "database": "default",
            "query": "SELECT 1",
            "rows": [],
            "rowCount": 3,
            "executionTime": "0.042s"
        });
        assert_eq!(
            phrase_result(contracts::RUN_QUERY, &result),
            "Query executed successfully. Found 3 rows."
        );
    }

    #[test]
    fn rag_phrase_lists_chunks_with_sources() {
        let result = json!({
            "query": "return policy",
            "topK": 3,
            "results": [
                {
                    "id": "chunk-001",
                    "content": "Returns accepted within 30 days.",
                    "source": "policies/returns.md",
                    "score": 0.91
                }
            ],
            "context": "- (0.910) Returns accepted within 30 days."
        });
        assert_eq!(
            phrase_result(contracts::RAG_QUERY, &result),
            "Here is relevant context based on your question:\n\
             - Returns accepted within 30 days. (source: policies/returns.md)"
        );
    }

    #[test]
    fn empty_rag_results_say_so() {
        let result = json!({"query": "q", "topK": 3, "results": [], "context": ""});
        assert_eq!(phrase_result(contracts::RAG_QUERY, &result), "No relevant context found.");
    }

    #[test]
    fn unknown_payloads_fall_back_to_a_neutral_sentence() {
        assert_eq!(
            phrase_result(contracts::SEARCH_DB, &json!({"unexpected": true})),
            "Tool 'search_db' completed."
        );
        assert_eq!(phrase_result("mystery", &json!({})), "Tool 'mystery' completed.");
    }

    #[test]
    fn no_tool_response_echoes_the_message() {
        let response = no_tool_response("hello how are you");
        assert!(response.contains("\"hello how are you\""));
        assert!(response.contains("search products"));
    }
}
