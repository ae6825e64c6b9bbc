use crate::session::Session;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A chat user, created lazily on first contact and never deleted.
///
/// `balance` is mutated only through the store's atomic credit/debit
/// primitives; `redeemed_vouchers` is append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub first_name: String,
    pub balance: i64,
    pub redeemed_vouchers: HashSet<String>,
    pub session: Session,
}

impl User {
    pub fn new(id: i64, username: &str, first_name: &str) -> Self {
        Self {
            id,
            username: username.to_string(),
            first_name: first_name.to_string(),
            balance: 0,
            redeemed_vouchers: HashSet::new(),
            session: Session::Idle,
        }
    }

    pub fn has_redeemed(&self, code: &str) -> bool {
        self.redeemed_vouchers.contains(code)
    }
}
