use crate::models::Provider;
use serde::{Deserialize, Serialize};

/// A purchasable digital good. `code` is the canonical upper-case identity
/// key. Price and provider are frozen into the transaction at order creation,
/// so later edits to the product never affect in-flight orders.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub code: String,
    pub name: String,
    pub category: String,
    pub price: i64,
    pub provider: Provider,
    pub active: bool,
}
