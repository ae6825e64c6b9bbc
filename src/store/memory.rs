use super::{DebitOutcome, ProductStore, TransactionStore, UserStore, VoucherStore};
use crate::error::{Error, Result};
use crate::models::{Product, Transaction, TxStatus, User, Voucher};
use crate::session::Session;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Default)]
struct Inner {
    users: HashMap<i64, User>,
    products: HashMap<String, Product>,
    vouchers: HashMap<String, Voucher>,
    transactions: HashMap<String, Transaction>,
}

/// Thread-safe in-memory adapter for all four storage ports.
///
/// Every mutation runs under the single write lock, which is what makes the
/// conditional debit and the voucher-consumption increment atomic.
#[derive(Default, Clone)]
pub struct MemoryStore {
    inner: Arc<RwLock<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn get_or_create_user(&self, id: i64, username: &str, first_name: &str) -> Result<User> {
        let mut inner = self.inner.write().await;
        let user = inner
            .users
            .entry(id)
            .or_insert_with(|| User::new(id, username, first_name));
        if user.username != username || user.first_name != first_name {
            user.username = username.to_string();
            user.first_name = first_name.to_string();
        }
        Ok(user.clone())
    }

    async fn find_user(&self, id: i64) -> Result<Option<User>> {
        let inner = self.inner.read().await;
        Ok(inner.users.get(&id).cloned())
    }

    async fn credit_balance(&self, id: i64, amount: i64) -> Result<i64> {
        let mut inner = self.inner.write().await;
        let user = inner.users.entry(id).or_insert_with(|| User::new(id, "", ""));
        user.balance += amount;
        Ok(user.balance)
    }

    async fn debit_balance(&self, id: i64, amount: i64) -> Result<DebitOutcome> {
        let mut inner = self.inner.write().await;
        let user = inner
            .users
            .get_mut(&id)
            .ok_or_else(|| Error::Store(format!("unknown user {id}")))?;
        if user.balance < amount {
            return Ok(DebitOutcome::Insufficient { balance: user.balance });
        }
        user.balance -= amount;
        Ok(DebitOutcome::Debited { balance: user.balance })
    }

    async fn set_session(&self, id: i64, session: Session) -> Result<()> {
        let mut inner = self.inner.write().await;
        let user = inner
            .users
            .get_mut(&id)
            .ok_or_else(|| Error::Store(format!("unknown user {id}")))?;
        user.session = session;
        Ok(())
    }

    async fn mark_redeemed(&self, id: i64, code: &str) -> Result<()> {
        let mut inner = self.inner.write().await;
        let user = inner
            .users
            .get_mut(&id)
            .ok_or_else(|| Error::Store(format!("unknown user {id}")))?;
        user.redeemed_vouchers.insert(code.to_string());
        Ok(())
    }
}

#[async_trait]
impl ProductStore for MemoryStore {
    async fn upsert_product(&self, product: Product) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner.products.insert(product.code.clone(), product);
        Ok(())
    }

    async fn find_product(&self, code: &str) -> Result<Option<Product>> {
        let inner = self.inner.read().await;
        Ok(inner.products.get(code).cloned())
    }

    async fn active_products(&self) -> Result<Vec<Product>> {
        let inner = self.inner.read().await;
        let mut items: Vec<Product> =
            inner.products.values().filter(|p| p.active).cloned().collect();
        items.sort_by(|a, b| a.category.cmp(&b.category).then(a.price.cmp(&b.price)));
        Ok(items)
    }

    async fn all_products(&self) -> Result<Vec<Product>> {
        let inner = self.inner.read().await;
        let mut items: Vec<Product> = inner.products.values().cloned().collect();
        items.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(items)
    }
}

#[async_trait]
impl VoucherStore for MemoryStore {
    async fn upsert_voucher(&self, voucher: Voucher) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner.vouchers.insert(voucher.code.clone(), voucher);
        Ok(())
    }

    async fn find_voucher(&self, code: &str) -> Result<Option<Voucher>> {
        let inner = self.inner.read().await;
        Ok(inner.vouchers.get(code).cloned())
    }

    async fn try_consume_voucher(&self, code: &str) -> Result<bool> {
        let mut inner = self.inner.write().await;
        let voucher = inner
            .vouchers
            .get_mut(code)
            .ok_or_else(|| Error::Store(format!("unknown voucher {code}")))?;
        if voucher.usage_limit > 0 && voucher.used_count >= voucher.usage_limit {
            return Ok(false);
        }
        voucher.used_count += 1;
        Ok(true)
    }
}

#[async_trait]
impl TransactionStore for MemoryStore {
    async fn insert_transaction(&self, tx: Transaction) -> Result<()> {
        let mut inner = self.inner.write().await;
        if inner.transactions.contains_key(&tx.trx_id) {
            return Err(Error::Store(format!("duplicate transaction {}", tx.trx_id)));
        }
        inner.transactions.insert(tx.trx_id.clone(), tx);
        Ok(())
    }

    async fn find_transaction(&self, trx_id: &str) -> Result<Option<Transaction>> {
        let inner = self.inner.read().await;
        Ok(inner.transactions.get(trx_id).cloned())
    }

    async fn update_status(&self, trx_id: &str, status: TxStatus) -> Result<()> {
        let mut inner = self.inner.write().await;
        let tx = inner
            .transactions
            .get_mut(trx_id)
            .ok_or_else(|| Error::Store(format!("unknown transaction {trx_id}")))?;
        if tx.status.is_terminal() {
            return Err(Error::Store(format!(
                "transaction {trx_id} is {} and cannot move to {status}",
                tx.status
            )));
        }
        tx.status = status;
        Ok(())
    }

    async fn record_gateway_result(
        &self,
        trx_id: &str,
        gateway_ref: Option<&str>,
        raw: Value,
    ) -> Result<()> {
        let mut inner = self.inner.write().await;
        let tx = inner
            .transactions
            .get_mut(trx_id)
            .ok_or_else(|| Error::Store(format!("unknown transaction {trx_id}")))?;
        if let Some(gateway_ref) = gateway_ref {
            tx.gateway_ref = gateway_ref.to_string();
        }
        tx.raw = raw;
        Ok(())
    }

    async fn settle_if_pending(&self, trx_id: &str, status: TxStatus, raw: Value) -> Result<bool> {
        let mut inner = self.inner.write().await;
        let tx = inner
            .transactions
            .get_mut(trx_id)
            .ok_or_else(|| Error::Store(format!("unknown transaction {trx_id}")))?;
        if tx.status != TxStatus::Pending {
            return Ok(false);
        }
        tx.status = status;
        tx.raw = raw;
        Ok(true)
    }

    async fn recent_for_user(&self, user_id: i64, limit: usize) -> Result<Vec<Transaction>> {
        let inner = self.inner.read().await;
        let mut items: Vec<Transaction> = inner
            .transactions
            .values()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.trx_id.cmp(&a.trx_id)));
        items.truncate(limit);
        Ok(items)
    }

    async fn all_transactions(&self) -> Result<Vec<Transaction>> {
        let inner = self.inner.read().await;
        Ok(inner.transactions.values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{generate_trx_id, NewTransaction, Provider, VoucherKind};

    fn tx(trx_id: &str, user_id: i64) -> Transaction {
        Transaction::create(NewTransaction {
            trx_id,
            user_id,
            product_code: "TEST10",
            product_name: "TEST Produk 10K",
            target: "0812xxxx",
            amount: 10_000,
            discount: 0,
            fee: 0,
            gateway: Provider::Saldo,
        })
    }

    #[tokio::test]
    async fn debit_is_conditional() {
        let store = MemoryStore::new();
        store.get_or_create_user(1, "u", "U").await.unwrap();
        store.credit_balance(1, 500).await.unwrap();

        assert_eq!(
            store.debit_balance(1, 600).await.unwrap(),
            DebitOutcome::Insufficient { balance: 500 }
        );
        assert_eq!(
            store.debit_balance(1, 500).await.unwrap(),
            DebitOutcome::Debited { balance: 0 }
        );
    }

    #[tokio::test]
    async fn concurrent_debits_never_go_negative() {
        let store = MemoryStore::new();
        store.get_or_create_user(1, "u", "U").await.unwrap();
        store.credit_balance(1, 1_000).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..20 {
            let store = store.clone();
            handles.push(tokio::spawn(async move { store.debit_balance(1, 300).await.unwrap() }));
        }

        let mut debited = 0;
        for h in handles {
            if matches!(h.await.unwrap(), DebitOutcome::Debited { .. }) {
                debited += 1;
            }
        }

        // 1000 / 300: exactly three debits can fit.
        assert_eq!(debited, 3);
        let user = store.find_user(1).await.unwrap().unwrap();
        assert_eq!(user.balance, 100);
    }

    #[tokio::test]
    async fn voucher_consumption_respects_limit() {
        let store = MemoryStore::new();
        store
            .upsert_voucher(Voucher {
                code: "LIMITED".into(),
                kind: VoucherKind::Flat,
                value: 100,
                min_amount: 0,
                max_discount: 0,
                usage_limit: 2,
                used_count: 0,
                active: true,
            })
            .await
            .unwrap();

        assert!(store.try_consume_voucher("LIMITED").await.unwrap());
        assert!(store.try_consume_voucher("LIMITED").await.unwrap());
        assert!(!store.try_consume_voucher("LIMITED").await.unwrap());

        let v = store.find_voucher("LIMITED").await.unwrap().unwrap();
        assert_eq!(v.used_count, 2);
    }

    #[tokio::test]
    async fn concurrent_voucher_consumption_never_over_redeems() {
        let store = MemoryStore::new();
        store
            .upsert_voucher(Voucher {
                code: "RACE".into(),
                kind: VoucherKind::Flat,
                value: 100,
                min_amount: 0,
                max_discount: 0,
                usage_limit: 5,
                used_count: 0,
                active: true,
            })
            .await
            .unwrap();

        let mut handles = Vec::new();
        for _ in 0..20 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.try_consume_voucher("RACE").await.unwrap()
            }));
        }
        let mut consumed = 0;
        for h in handles {
            if h.await.unwrap() {
                consumed += 1;
            }
        }
        assert_eq!(consumed, 5);
        let v = store.find_voucher("RACE").await.unwrap().unwrap();
        assert_eq!(v.used_count, 5);
    }

    #[tokio::test]
    async fn duplicate_transaction_id_is_rejected() {
        let store = MemoryStore::new();
        let id = generate_trx_id();
        store.insert_transaction(tx(&id, 1)).await.unwrap();
        assert!(store.insert_transaction(tx(&id, 1)).await.is_err());
    }

    #[tokio::test]
    async fn terminal_statuses_are_never_overwritten() {
        let store = MemoryStore::new();
        store.insert_transaction(tx("BBBB111122223333", 1)).await.unwrap();
        store.update_status("BBBB111122223333", TxStatus::Failed).await.unwrap();

        assert!(store.update_status("BBBB111122223333", TxStatus::Paid).await.is_err());
        let t = store.find_transaction("BBBB111122223333").await.unwrap().unwrap();
        assert_eq!(t.status, TxStatus::Failed);
    }

    #[tokio::test]
    async fn settlement_guard_is_idempotent() {
        let store = MemoryStore::new();
        store.insert_transaction(tx("AAAA111122223333", 1)).await.unwrap();

        let raw = serde_json::json!({"status": "paid"});
        assert!(store
            .settle_if_pending("AAAA111122223333", TxStatus::Success, raw.clone())
            .await
            .unwrap());
        assert!(!store
            .settle_if_pending("AAAA111122223333", TxStatus::Failed, raw)
            .await
            .unwrap());

        let t = store.find_transaction("AAAA111122223333").await.unwrap().unwrap();
        assert_eq!(t.status, TxStatus::Success);
    }
}
