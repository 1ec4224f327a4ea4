//! Product catalog entries (read-only collaborator)

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A (size, price) pair attached to a product.
///
/// Cart items must name an existing variant and claim its exact price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductVariant {
    pub size: String,
    pub price: f64,
}

/// A catalog product with its sellable variants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub images: Vec<String>,
    pub variants: Vec<ProductVariant>,
}

impl Product {
    /// Find the variant matching the requested size.
    pub fn variant(&self, size: &str) -> Option<&ProductVariant> {
        self.variants.iter().find(|v| v.size == size)
    }
}
