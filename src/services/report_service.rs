use crate::error::Result;
use crate::models::{Provider, TxStatus};
use crate::AppState;
use chrono::{Duration, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// Per-product sales aggregation over a trailing window.
#[derive(Debug, Clone, Serialize)]
pub struct ProductReportRow {
    pub product_code: String,
    pub product_name: String,
    pub total_trx: u64,
    pub success_trx: u64,
    /// Paid, Processing or Success.
    pub paid_trx: u64,
    pub pending_trx: u64,
    /// Failed or Canceled.
    pub failed_trx: u64,
    pub review_trx: u64,
    pub revenue_all: i64,
    pub revenue_success: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub store: &'static str,
    pub gateways: BTreeMap<String, &'static str>,
}

pub struct ReportService;

impl ReportService {
    pub async fn product_report(state: &AppState, days: i64) -> Result<Vec<ProductReportRow>> {
        let days = days.clamp(1, 365);
        let since = Utc::now() - Duration::days(days);

        let mut rows: BTreeMap<String, ProductReportRow> = BTreeMap::new();
        for tx in state.store.all_transactions().await? {
            if tx.created_at < since {
                continue;
            }
            let row = rows.entry(tx.product_code.clone()).or_insert_with(|| ProductReportRow {
                product_code: tx.product_code.clone(),
                product_name: tx.product_name.clone(),
                total_trx: 0,
                success_trx: 0,
                paid_trx: 0,
                pending_trx: 0,
                failed_trx: 0,
                review_trx: 0,
                revenue_all: 0,
                revenue_success: 0,
            });

            row.total_trx += 1;
            row.revenue_all += tx.amount;
            match tx.status {
                TxStatus::Success => {
                    row.success_trx += 1;
                    row.paid_trx += 1;
                    row.revenue_success += tx.amount;
                }
                TxStatus::Paid | TxStatus::Processing => row.paid_trx += 1,
                TxStatus::Pending => row.pending_trx += 1,
                TxStatus::Failed | TxStatus::Canceled => row.failed_trx += 1,
                TxStatus::Review => row.review_trx += 1,
            }
        }

        let mut rows: Vec<ProductReportRow> = rows.into_values().collect();
        rows.sort_by(|a, b| {
            b.success_trx.cmp(&a.success_trx).then(b.total_trx.cmp(&a.total_trx))
        });
        Ok(rows)
    }

    /// Store status plus per-gateway availability; a disabled gateway reports
    /// DOWN.
    pub async fn health(state: &AppState) -> HealthReport {
        let store = if state.store.all_products().await.is_ok() { "OK" } else { "DOWN" };

        let mut gateways = BTreeMap::new();
        for provider in [Provider::Orderkuota, Provider::Pakasir, Provider::Qiospay] {
            gateways.insert(
                provider.to_string(),
                if state.gateways.is_enabled(provider) { "OK" } else { "DOWN" },
            );
        }

        HealthReport { store, gateways }
    }
}
