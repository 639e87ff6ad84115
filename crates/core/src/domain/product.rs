use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Product categories in the demo catalog. Serialized capitalized, matching
/// the schema enum the search tool advertises.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProductCategory {
    Electronics,
    Furniture,
    Stationery,
}

impl ProductCategory {
    pub fn name(self) -> &'static str {
        match self {
            Self::Electronics => "Electronics",
            Self::Furniture => "Furniture",
            Self::Stationery => "Stationery",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    pub category: ProductCategory,
    pub price: Decimal,
    pub created_at: DateTime<Utc>,
}

/// In-memory product catalog, read-only after seeding.
#[derive(Clone, Debug, Default)]
pub struct ProductStore {
    products: Vec<Product>,
}

impl ProductStore {
    pub fn new(products: Vec<Product>) -> Self {
        Self { products }
    }

    /// The demo catalog.
    pub fn seeded() -> Self {
        let catalog = [
            ("prod-001", "Laptop Pro", ProductCategory::Electronics, 1299),
            ("prod-002", "Wireless Mouse", ProductCategory::Electronics, 29),
            ("prod-003", "Office Chair", ProductCategory::Furniture, 299),
            ("prod-004", "Desk Lamp", ProductCategory::Furniture, 49),
            ("prod-005", "Notebook", ProductCategory::Stationery, 5),
        ];
        let now = Utc::now();
        Self::new(
            catalog
                .into_iter()
                .map(|(id, name, category, price)| Product {
                    id: id.to_owned(),
                    name: name.to_owned(),
                    category,
                    price: Decimal::from(price),
                    created_at: now,
                })
                .collect(),
        )
    }

    /// Case-insensitive substring search over name and category, with an
    /// optional exact category filter. `limit` is clamped to `[1, 100]`.
    pub fn search(
        &self,
        query: &str,
        category: Option<ProductCategory>,
        limit: usize,
    ) -> Vec<Product> {
        let take = limit.clamp(1, 100);
        let needle = query.trim().to_lowercase();

        self.products
            .iter()
            .filter(|product| category.map_or(true, |wanted| product.category == wanted))
            .filter(|product| {
                needle.is_empty()
                    || product.name.to_lowercase().contains(&needle)
                    || product.category.name().to_lowercase().contains(&needle)
            })
            .take(take)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}
