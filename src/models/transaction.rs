use crate::models::{Provider, TxStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Durable record of one purchase attempt. Product name, price-derived
/// amounts and provider are copies frozen at creation time. `raw` holds the
/// last gateway response (or error) verbatim for audit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub trx_id: String,
    pub user_id: i64,
    pub product_code: String,
    pub product_name: String,
    pub target: String,
    pub amount: i64,
    pub discount: i64,
    pub fee: i64,
    pub status: TxStatus,
    pub gateway: Provider,
    pub gateway_ref: String,
    pub raw: Value,
    pub created_at: DateTime<Utc>,
}

pub struct NewTransaction<'a> {
    pub trx_id: &'a str,
    pub user_id: i64,
    pub product_code: &'a str,
    pub product_name: &'a str,
    pub target: &'a str,
    pub amount: i64,
    pub discount: i64,
    pub fee: i64,
    pub gateway: Provider,
}

impl Transaction {
    /// Every creation starts `Pending`.
    pub fn create(new_tx: NewTransaction<'_>) -> Self {
        Self {
            trx_id: new_tx.trx_id.to_string(),
            user_id: new_tx.user_id,
            product_code: new_tx.product_code.to_string(),
            product_name: new_tx.product_name.to_string(),
            target: new_tx.target.to_string(),
            amount: new_tx.amount,
            discount: new_tx.discount,
            fee: new_tx.fee,
            status: TxStatus::Pending,
            gateway: new_tx.gateway,
            gateway_ref: String::new(),
            raw: Value::Null,
            created_at: Utc::now(),
        }
    }
}

/// Fresh, collision-resistant, human-shareable transaction id: 16 uppercase
/// hex characters of a v4 UUID.
pub fn generate_trx_id() -> String {
    Uuid::new_v4()
        .simple()
        .to_string()
        .to_uppercase()
        .chars()
        .take(16)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trx_id_shape() {
        let id = generate_trx_id();
        assert_eq!(id.len(), 16);
        assert!(id.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    }

    #[test]
    fn trx_ids_are_fresh() {
        assert_ne!(generate_trx_id(), generate_trx_id());
    }
}
