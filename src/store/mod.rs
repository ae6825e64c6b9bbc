//! Storage ports. The conversation core only relies on these contracts,
//! including the atomic conditional updates that balance debits and voucher
//! consumption require; whatever sits behind them is an implementation
//! detail. [`memory::MemoryStore`] is the shipped adapter.

pub mod memory;

pub use memory::MemoryStore;

use crate::error::Result;
use crate::models::{Product, Transaction, TxStatus, User, Voucher};
use crate::session::Session;
use async_trait::async_trait;
use serde_json::Value;

/// Outcome of a conditional balance debit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebitOutcome {
    Debited { balance: i64 },
    /// Nothing was charged; `balance` is the untouched current balance.
    Insufficient { balance: i64 },
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Lazily creates the user on first contact and refreshes display fields.
    async fn get_or_create_user(&self, id: i64, username: &str, first_name: &str) -> Result<User>;

    async fn find_user(&self, id: i64) -> Result<Option<User>>;

    /// Upserting increment, used by admin credits. Returns the new balance.
    async fn credit_balance(&self, id: i64, amount: i64) -> Result<i64>;

    /// Single atomic conditional decrement; never drives the balance
    /// negative, whatever the interleaving.
    async fn debit_balance(&self, id: i64, amount: i64) -> Result<DebitOutcome>;

    async fn set_session(&self, id: i64, session: Session) -> Result<()>;

    async fn mark_redeemed(&self, id: i64, code: &str) -> Result<()>;
}

#[async_trait]
pub trait ProductStore: Send + Sync {
    async fn upsert_product(&self, product: Product) -> Result<()>;

    /// Lookup by canonical upper-case code.
    async fn find_product(&self, code: &str) -> Result<Option<Product>>;

    /// Active products sorted by (category, price).
    async fn active_products(&self) -> Result<Vec<Product>>;

    async fn all_products(&self) -> Result<Vec<Product>>;
}

#[async_trait]
pub trait VoucherStore: Send + Sync {
    async fn upsert_voucher(&self, voucher: Voucher) -> Result<()>;

    async fn find_voucher(&self, code: &str) -> Result<Option<Voucher>>;

    /// Atomically increments `used_count` unless a positive `usage_limit` is
    /// already exhausted. Returns whether the use was recorded.
    async fn try_consume_voucher(&self, code: &str) -> Result<bool>;
}

#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// Rejects duplicate transaction ids.
    async fn insert_transaction(&self, tx: Transaction) -> Result<()>;

    async fn find_transaction(&self, trx_id: &str) -> Result<Option<Transaction>>;

    /// Advances the lifecycle status; a terminal status is never overwritten.
    async fn update_status(&self, trx_id: &str, status: TxStatus) -> Result<()>;

    /// Stores the gateway reference (when present) and the raw response blob.
    async fn record_gateway_result(
        &self,
        trx_id: &str,
        gateway_ref: Option<&str>,
        raw: Value,
    ) -> Result<()>;

    /// Atomic settlement guard: transitions only while the transaction is
    /// still `Pending`, so replayed callbacks are no-ops. Returns whether the
    /// transition happened.
    async fn settle_if_pending(&self, trx_id: &str, status: TxStatus, raw: Value) -> Result<bool>;

    /// Most recent first.
    async fn recent_for_user(&self, user_id: i64, limit: usize) -> Result<Vec<Transaction>>;

    /// Full scan, used by the report aggregation.
    async fn all_transactions(&self) -> Result<Vec<Transaction>>;
}

pub trait Store: UserStore + ProductStore + VoucherStore + TransactionStore {}

impl<T: UserStore + ProductStore + VoucherStore + TransactionStore> Store for T {}
