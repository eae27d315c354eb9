use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub name: String,
    pub price: String,
    pub url: String,
}

/// A category page scrape, as written by the JSON output.
#[derive(Debug, Serialize, Deserialize)]
pub struct CatalogSnapshot {
    pub category: String,
    pub source_url: String,
    pub scraped_at: DateTime<Utc>,
    pub products: Vec<Product>,
}

impl CatalogSnapshot {
    pub fn new(category: &str, source_url: &str, products: Vec<Product>) -> Self {
        Self {
            category: category.to_string(),
            source_url: source_url.to_string(),
            scraped_at: Utc::now(),
            products,
        }
    }
}
