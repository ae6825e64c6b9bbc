use crate::config::QiospayInfo;
use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::{Client, Url};
use secrecy::{ExposeSecret, SecretString};
use serde_json::{json, Value};
use tracing::warn;

/// Invoice-style gateway authenticated per request by merchant code + key.
#[derive(Clone)]
pub struct QiospayClient {
    http: Client,
    base_url: Url,
    merchant_code: String,
    api_key: SecretString,
}

impl QiospayClient {
    pub fn new(http: Client, info: &QiospayInfo) -> Result<Self> {
        let base_url = Url::parse(&info.api_url)
            .map_err(|_| Error::Internal("Invalid Qiospay base URL".into()))?;
        Ok(Self {
            http,
            base_url,
            merchant_code: info.merchant_code.clone(),
            api_key: info.api_key.clone(),
        })
    }

    fn endpoint(&self, path: &str) -> Url {
        let mut url = self.base_url.clone();
        url.set_path(path);
        url
    }

    async fn post(&self, path: &str, body: Value) -> Result<Value> {
        let resp = self
            .http
            .post(self.endpoint(path))
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Gateway(format!("Qiospay request failed: {e}")))?;

        let status = resp.status();
        let body_text = resp.text().await.unwrap_or_default();

        if !status.is_success() {
            warn!(
                http_status = status.as_u16(),
                response = %body_text.chars().take(200).collect::<String>(),
                "Qiospay call failed"
            );
            return Err(Error::Gateway(format!("Qiospay returned {status}")));
        }

        serde_json::from_str(&body_text)
            .map_err(|_| Error::Gateway("Invalid Qiospay response".into()))
    }
}

#[async_trait]
impl super::InvoiceGateway for QiospayClient {
    async fn create_invoice(
        &self,
        trx_id: &str,
        amount: i64,
        description: &str,
        _callback_url: &str,
    ) -> Result<Value> {
        self.post(
            "/v1/payment/create",
            json!({
                "merchant_code": self.merchant_code,
                "api_key": self.api_key.expose_secret(),
                "ref_id": trx_id,
                "amount": amount,
                "description": description,
            }),
        )
        .await
    }

    async fn get_invoice(&self, reference: &str) -> Result<Value> {
        self.post(
            "/v1/payment/status",
            json!({
                "merchant_code": self.merchant_code,
                "api_key": self.api_key.expose_secret(),
                "ref_id": reference,
            }),
        )
        .await
    }
}
