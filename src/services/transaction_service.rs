use crate::error::{Error, Result};
use crate::models::{generate_trx_id, NewTransaction, Product, Provider, Transaction, TxStatus};
use crate::pricing::Quote;
use crate::store::DebitOutcome;
use crate::AppState;
use serde_json::{json, Value};
use tracing::{error, info, warn};

/// What the pipeline did with a freshly created transaction. The orchestrator
/// turns this into reply text; the status written to the store is the source
/// of truth.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Paid from the internal balance, nothing left to fulfill.
    BalancePaid { balance_left: i64 },
    /// Nothing was charged; the transaction is `Failed`.
    InsufficientBalance { needed: i64, balance: i64 },
    /// Balance-funded and fulfilled by the external gateway.
    Fulfilled,
    /// Charged, but fulfillment errored; parked for human reconciliation.
    FulfillmentReview,
    /// Invoice issued, awaiting out-of-band settlement.
    InvoiceCreated { gateway_ref: String },
    /// Invoice creation errored; the user still gets a receipt.
    InvoiceReview,
}

pub struct TransactionService;

impl TransactionService {
    /// Creates the transaction record (status `Pending`, amounts and gateway
    /// frozen from the priced order) and dispatches it to its provider.
    ///
    /// Voucher usage is committed exactly once, only after the voucher's
    /// economic effect is locked in: a successful balance debit or a created
    /// invoice. A rejected debit or a failed invoice creation leaves the
    /// voucher untouched.
    pub async fn create_and_dispatch(
        state: &AppState,
        user_id: i64,
        product: &Product,
        target: &str,
        quote: &Quote,
        fee: i64,
        final_amount: i64,
    ) -> Result<(Transaction, DispatchOutcome)> {
        let trx_id = generate_trx_id();
        let tx = Transaction::create(NewTransaction {
            trx_id: &trx_id,
            user_id,
            product_code: &product.code,
            product_name: &product.name,
            target,
            amount: final_amount,
            discount: quote.discount,
            fee,
            gateway: product.provider,
        });
        state.store.insert_transaction(tx).await?;
        info!(trx_id = %trx_id, gateway = %product.provider, amount = final_amount, "transaction created");

        let outcome = if product.provider.is_balance_funded() {
            Self::dispatch_balance_funded(state, user_id, product, target, quote, &trx_id, final_amount)
                .await?
        } else {
            Self::dispatch_invoice(state, user_id, product, target, quote, &trx_id, final_amount)
                .await?
        };

        let tx = state
            .store
            .find_transaction(&trx_id)
            .await?
            .ok_or_else(|| Error::Store(format!("transaction {trx_id} vanished")))?;
        Ok((tx, outcome))
    }

    /// Internal-balance path: one atomic conditional debit, then (for
    /// externally fulfilled goods) the gateway create-order call. A
    /// fulfillment failure is never rolled back; review is a reconciliation
    /// queue, not a refund.
    async fn dispatch_balance_funded(
        state: &AppState,
        user_id: i64,
        product: &Product,
        target: &str,
        quote: &Quote,
        trx_id: &str,
        final_amount: i64,
    ) -> Result<DispatchOutcome> {
        match state.store.debit_balance(user_id, final_amount).await? {
            DebitOutcome::Insufficient { balance } => {
                state.store.update_status(trx_id, TxStatus::Failed).await?;
                info!(trx_id = %trx_id, balance, needed = final_amount, "insufficient balance");
                return Ok(DispatchOutcome::InsufficientBalance { needed: final_amount, balance });
            }
            DebitOutcome::Debited { balance } => {
                state.store.update_status(trx_id, TxStatus::Paid).await?;
                Self::commit_voucher(state, user_id, quote).await?;

                if product.provider == Provider::Saldo {
                    return Ok(DispatchOutcome::BalancePaid { balance_left: balance });
                }
            }
        }

        state.store.update_status(trx_id, TxStatus::Processing).await?;

        let call = match state.gateways.fulfillment(product.provider) {
            Ok(gateway) => gateway.create_order(trx_id, &product.code, target).await,
            Err(e) => {
                error!(trx_id = %trx_id, gateway = %product.provider, "dispatch to disabled gateway");
                Err(e)
            }
        };

        match call {
            Ok(raw) => {
                state.store.record_gateway_result(trx_id, None, raw).await?;
                state.store.update_status(trx_id, TxStatus::Success).await?;
                info!(trx_id = %trx_id, "fulfillment succeeded");
                Ok(DispatchOutcome::Fulfilled)
            }
            Err(e) => {
                state
                    .store
                    .record_gateway_result(trx_id, None, json!({ "error": e.to_string() }))
                    .await?;
                state.store.update_status(trx_id, TxStatus::Review).await?;
                warn!(trx_id = %trx_id, error = %e, "fulfillment failed, parked for review");
                Ok(DispatchOutcome::FulfillmentReview)
            }
        }
    }

    /// Invoice path: the transaction id doubles as the idempotency key the
    /// gateway sees. A gateway failure only means the invoice is unconfirmed,
    /// so the user never sees an outright error.
    async fn dispatch_invoice(
        state: &AppState,
        user_id: i64,
        product: &Product,
        target: &str,
        quote: &Quote,
        trx_id: &str,
        final_amount: i64,
    ) -> Result<DispatchOutcome> {
        let description = format!("Order {} ({})", product.name, target);
        let callback_url =
            format!("{}/callback/{}", state.config.server_base_url, product.provider);

        let call = match state.gateways.invoice(product.provider) {
            Ok(gateway) => {
                gateway.create_invoice(trx_id, final_amount, &description, &callback_url).await
            }
            Err(e) => {
                error!(trx_id = %trx_id, gateway = %product.provider, "dispatch to disabled gateway");
                Err(e)
            }
        };

        match call {
            Ok(raw) => {
                let gateway_ref = crate::gateways::extract_invoice_ref(&raw).unwrap_or_default();
                state
                    .store
                    .record_gateway_result(trx_id, Some(&gateway_ref), raw)
                    .await?;
                Self::commit_voucher(state, user_id, quote).await?;
                info!(trx_id = %trx_id, gateway_ref = %gateway_ref, "invoice created");
                Ok(DispatchOutcome::InvoiceCreated { gateway_ref })
            }
            Err(e) => {
                state
                    .store
                    .record_gateway_result(trx_id, None, json!({ "error": e.to_string() }))
                    .await?;
                state.store.update_status(trx_id, TxStatus::Review).await?;
                warn!(trx_id = %trx_id, error = %e, "invoice creation failed, parked for review");
                Ok(DispatchOutcome::InvoiceReview)
            }
        }
    }

    async fn commit_voucher(state: &AppState, user_id: i64, quote: &Quote) -> Result<()> {
        let Some(code) = quote.voucher.as_deref() else {
            return Ok(());
        };
        if !state.store.try_consume_voucher(code).await? {
            // The discount is already frozen into the transaction; flag it
            // for reconciliation instead of failing the order.
            warn!(voucher = %code, "usage limit exhausted between pricing and commit");
        }
        state.store.mark_redeemed(user_id, code).await?;
        Ok(())
    }

    /// Settlement entry point for invoice callbacks: `Pending` transactions
    /// move to `Success` or `Failed`; anything else is an idempotent no-op.
    pub async fn settle(
        state: &AppState,
        trx_id: &str,
        settled: bool,
        raw: Value,
    ) -> Result<bool> {
        let status = if settled { TxStatus::Success } else { TxStatus::Failed };
        let transitioned = state.store.settle_if_pending(trx_id, status, raw).await?;
        if transitioned {
            info!(trx_id = %trx_id, status = %status, "settlement applied");
        } else {
            info!(trx_id = %trx_id, "ignoring duplicate settlement callback");
        }
        Ok(transitioned)
    }
}
