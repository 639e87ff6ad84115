//! Mock read-only query tool (admin only).
//!
//! There is no real database behind this tool; it simulates latency and
//! returns a canned result set. The guard against destructive keywords is
//! the behavior that matters: it must reject the keyword in any casing and
//! any surrounding context.

use std::time::Duration;

use anyhow::{bail, Result};
use async_trait::async_trait;
use serde_json::{json, Value};

use capstan_core::capability::CapabilityHandler;
use capstan_core::contracts::{RunQueryInput, RunQueryOutput};

const DANGEROUS_KEYWORDS: &[&str] = &["drop", "delete", "truncate", "alter"];

const SIMULATED_LATENCY: Duration = Duration::from_millis(200);

#[derive(Default)]
pub struct RunQueryHandler;

#[async_trait]
impl CapabilityHandler for RunQueryHandler {
    async fn execute(&self, input: Value) -> Result<Value> {
        let input: RunQueryInput = serde_json::from_value(input)?;

        tokio::time::sleep(SIMULATED_LATENCY).await;

        let lowercased = input.query.to_lowercase();
        for keyword in DANGEROUS_KEYWORDS {
            if lowercased.contains(keyword) {
                bail!("Dangerous operation '{keyword}' not allowed via this tool");
            }
        }

        let output = RunQueryOutput {
            database: input.database,
            query: input.query,
            rows: vec![
                json!({"id": 1, "value": "Sample Row 1"}),
                json!({"id": 2, "value": "Sample Row 2"}),
                json!({"id": 3, "value": "Sample Row 3"}),
            ],
            row_count: 3,
            execution_time: "0.042s".to_owned(),
        };
        Ok(serde_json::to_value(output)?)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::RunQueryHandler;
    use capstan_core::capability::CapabilityHandler;
    use capstan_core::contracts::RunQueryOutput;

    #[tokio::test]
    async fn benign_queries_return_the_canned_rows() {
        let result = RunQueryHandler
            .execute(json!({"query": "SELECT * FROM products LIMIT 5"}))
            .await
            .expect("query succeeds");

        let output: RunQueryOutput = serde_json::from_value(result).expect("typed output");
        assert_eq!(output.row_count, 3);
        assert_eq!(output.database, "default");
    }

    #[tokio::test]
    async fn dangerous_keywords_are_rejected_in_any_casing_and_context() {
        let queries = [
            "DROP TABLE products",
            "select * from t; drop table t",
            "SeLeCt DrOp",
            "explain airDROP analysis",
        ];
        for query in queries {
            let error = RunQueryHandler
                .execute(json!({"query": query}))
                .await
                .expect_err("dangerous query must fail");
            assert!(
                error.to_string().contains("Dangerous operation 'drop'"),
                "query: {query}, error: {error}"
            );
        }
    }

    #[tokio::test]
    async fn the_first_matching_keyword_is_named() {
        let error = RunQueryHandler
            .execute(json!({"query": "ALTER TABLE products"}))
            .await
            .expect_err("dangerous query must fail");
        assert!(error.to_string().contains("'alter'"));
    }
}
