//! Product search tool.

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

use capstan_core::capability::CapabilityHandler;
use capstan_core::contracts::{SearchDbInput, SearchDbOutput};
use capstan_core::domain::ProductStore;

pub struct SearchDbHandler {
    products: ProductStore,
}

impl SearchDbHandler {
    pub fn new(products: ProductStore) -> Self {
        Self { products }
    }
}

#[async_trait]
impl CapabilityHandler for SearchDbHandler {
    async fn execute(&self, input: Value) -> Result<Value> {
        let input: SearchDbInput = serde_json::from_value(input)?;
        let hits = self.products.search(&input.q, input.category, input.limit as usize);
        let output = SearchDbOutput {
            total: hits.len(),
            query: input.q,
            category: input.category,
            hits,
        };
        Ok(serde_json::to_value(output)?)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::SearchDbHandler;
    use capstan_core::capability::CapabilityHandler;
    use capstan_core::contracts::SearchDbOutput;
    use capstan_core::domain::ProductStore;

    #[tokio::test]
    async fn finds_products_by_keyword() {
        let handler = SearchDbHandler::new(ProductStore::seeded());
        let result = handler
            .execute(json!({"q": "laptop", "limit": 5}))
            .await
            .expect("search succeeds");

        let output: SearchDbOutput = serde_json::from_value(result).expect("typed output");
        assert_eq!(output.total, 1);
        assert_eq!(output.hits[0].name, "Laptop Pro");
        assert_eq!(output.query, "laptop");
    }

    #[tokio::test]
    async fn category_filter_narrows_results() {
        let handler = SearchDbHandler::new(ProductStore::seeded());
        let result = handler
            .execute(json!({"q": "", "category": "Furniture"}))
            .await
            .expect("search succeeds");

        let output: SearchDbOutput = serde_json::from_value(result).expect("typed output");
        assert_eq!(output.total, 2);
        assert!(output.hits.iter().all(|hit| hit.category.name() == "Furniture"));
    }
}
