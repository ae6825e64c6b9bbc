//! Payment-gateway dispatch layer. Two capability families: fulfillment
//! gateways settle goods directly (`create_order`/`check_order`), invoice
//! gateways issue a payment request settled out of band
//! (`create_invoice`/`get_invoice`). Wire formats are opaque; every call
//! returns the raw response blob for audit.

pub mod orderkuota;
pub mod pakasir;
pub mod qiospay;

pub use orderkuota::OrderkuotaClient;
pub use pakasir::PakasirClient;
pub use qiospay::QiospayClient;

use crate::config::AppConfig;
use crate::error::{Error, Result};
use crate::models::Provider;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

const GATEWAY_TIMEOUT: Duration = Duration::from_secs(15);

#[async_trait]
pub trait FulfillmentGateway: Send + Sync {
    async fn create_order(&self, trx_id: &str, product_code: &str, target: &str) -> Result<Value>;

    async fn check_order(&self, trx_id: &str) -> Result<Value>;
}

#[async_trait]
pub trait InvoiceGateway: Send + Sync {
    async fn create_invoice(
        &self,
        trx_id: &str,
        amount: i64,
        description: &str,
        callback_url: &str,
    ) -> Result<Value>;

    async fn get_invoice(&self, reference: &str) -> Result<Value>;
}

/// Gateway handles resolved once at startup. A `None` slot is a disabled
/// gateway; dispatching to it is a configuration error, never a fallback.
pub struct Gateways {
    pub orderkuota: Option<OrderkuotaClient>,
    pub pakasir: Option<PakasirClient>,
    pub qiospay: Option<QiospayClient>,
}

impl Gateways {
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(GATEWAY_TIMEOUT)
            .build()
            .map_err(|e| Error::Internal(format!("http client: {e}")))?;

        let orderkuota = config
            .orderkuota
            .as_ref()
            .map(|info| OrderkuotaClient::new(http.clone(), info))
            .transpose()?;
        let pakasir = config
            .pakasir
            .as_ref()
            .map(|info| PakasirClient::new(http.clone(), info))
            .transpose()?;
        let qiospay = config
            .qiospay
            .as_ref()
            .map(|info| QiospayClient::new(http.clone(), info))
            .transpose()?;

        Ok(Self { orderkuota, pakasir, qiospay })
    }

    pub fn disabled() -> Self {
        Self { orderkuota: None, pakasir: None, qiospay: None }
    }

    pub fn fulfillment(&self, provider: Provider) -> Result<&dyn FulfillmentGateway> {
        match provider {
            Provider::Orderkuota => self
                .orderkuota
                .as_ref()
                .map(|c| c as &dyn FulfillmentGateway)
                .ok_or(Error::GatewayDisabled(provider)),
            _ => Err(Error::Internal(format!("{provider} is not a fulfillment gateway"))),
        }
    }

    pub fn invoice(&self, provider: Provider) -> Result<&dyn InvoiceGateway> {
        match provider {
            Provider::Pakasir => self
                .pakasir
                .as_ref()
                .map(|c| c as &dyn InvoiceGateway)
                .ok_or(Error::GatewayDisabled(provider)),
            Provider::Qiospay => self
                .qiospay
                .as_ref()
                .map(|c| c as &dyn InvoiceGateway)
                .ok_or(Error::GatewayDisabled(provider)),
            _ => Err(Error::Internal(format!("{provider} is not an invoice gateway"))),
        }
    }

    pub fn is_enabled(&self, provider: Provider) -> bool {
        match provider {
            Provider::Saldo => true,
            Provider::Orderkuota => self.orderkuota.is_some(),
            Provider::Pakasir => self.pakasir.is_some(),
            Provider::Qiospay => self.qiospay.is_some(),
        }
    }
}

/// Gateways disagree on where the invoice reference lives; probe the usual
/// spellings.
pub fn extract_invoice_ref(raw: &Value) -> Option<String> {
    for key in ["id", "invoice_id", "ref"] {
        match &raw[key] {
            Value::String(s) if !s.is_empty() => return Some(s.clone()),
            Value::Number(n) => return Some(n.to_string()),
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn invoice_ref_probes_known_keys() {
        assert_eq!(extract_invoice_ref(&json!({"id": "INV-1"})).as_deref(), Some("INV-1"));
        assert_eq!(extract_invoice_ref(&json!({"invoice_id": 42})).as_deref(), Some("42"));
        assert_eq!(extract_invoice_ref(&json!({"ref": "abc"})).as_deref(), Some("abc"));
        assert_eq!(extract_invoice_ref(&json!({"other": "x"})), None);
    }

    #[test]
    fn disabled_gateway_is_a_dispatch_error() {
        let gateways = Gateways::disabled();
        assert!(matches!(
            gateways.fulfillment(Provider::Orderkuota),
            Err(Error::GatewayDisabled(Provider::Orderkuota))
        ));
        assert!(matches!(
            gateways.invoice(Provider::Pakasir),
            Err(Error::GatewayDisabled(Provider::Pakasir))
        ));
        // Saldo is never dispatched through a gateway family.
        assert!(matches!(gateways.invoice(Provider::Saldo), Err(Error::Internal(_))));
    }
}
