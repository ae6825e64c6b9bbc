use crate::config::OrderkuotaInfo;
use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::{Client, Url};
use secrecy::{ExposeSecret, SecretString};
use serde_json::{json, Value};
use tracing::warn;

/// Fulfillment-style gateway: settles the product directly against the
/// provider once payment is already taken from the internal balance.
#[derive(Clone)]
pub struct OrderkuotaClient {
    http: Client,
    base_url: Url,
    username: String,
    auth_token: SecretString,
}

impl OrderkuotaClient {
    pub fn new(http: Client, info: &OrderkuotaInfo) -> Result<Self> {
        let base_url = Url::parse(&info.api_url)
            .map_err(|_| Error::Internal("Invalid Orderkuota base URL".into()))?;
        Ok(Self {
            http,
            base_url,
            username: info.username.clone(),
            auth_token: info.auth_token.clone(),
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
            .map_err(|e| Error::Gateway(format!("Orderkuota request failed: {e}")))?;

        let status = resp.status();
        let body_text = resp.text().await.unwrap_or_default();

        if !status.is_success() {
            warn!(
                http_status = status.as_u16(),
                response = %body_text.chars().take(200).collect::<String>(),
                "Orderkuota call failed"
            );
            return Err(Error::Gateway(format!("Orderkuota returned {status}")));
        }

        serde_json::from_str(&body_text)
            .map_err(|_| Error::Gateway("Invalid Orderkuota response".into()))
    }
}

#[async_trait]
impl super::FulfillmentGateway for OrderkuotaClient {
    async fn create_order(&self, trx_id: &str, product_code: &str, target: &str) -> Result<Value> {
        self.post(
            "/v1/order",
            json!({
                "username": self.username,
                "auth_token": self.auth_token.expose_secret(),
                "ref_id": trx_id,
                "product_code": product_code,
                "target": target,
            }),
        )
        .await
    }

    async fn check_order(&self, trx_id: &str) -> Result<Value> {
        self.post(
            "/v1/status",
            json!({
                "username": self.username,
                "auth_token": self.auth_token.expose_secret(),
                "ref_id": trx_id,
            }),
        )
        .await
    }
}
