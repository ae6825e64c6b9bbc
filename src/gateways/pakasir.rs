use crate::config::PakasirInfo;
use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::{Client, Url};
use secrecy::{ExposeSecret, SecretString};
use serde_json::{json, Value};
use tracing::warn;

/// Invoice-style gateway, scoped to a project slug; settlement is confirmed
/// out of band through the callback endpoint.
#[derive(Clone)]
pub struct PakasirClient {
    http: Client,
    base_url: Url,
    project_slug: String,
    api_key: SecretString,
}

impl PakasirClient {
    pub fn new(http: Client, info: &PakasirInfo) -> Result<Self> {
        let base_url = Url::parse(&info.api_url)
            .map_err(|_| Error::Internal("Invalid Pakasir base URL".into()))?;
        Ok(Self {
            http,
            base_url,
            project_slug: info.project_slug.clone(),
            api_key: info.api_key.clone(),
        })
    }

    fn endpoint(&self, path: &str) -> Url {
        let mut url = self.base_url.clone();
        url.set_path(&format!("api/projects/{}/{}", self.project_slug, path));
        url
    }

    async fn read_json(resp: reqwest::Response, what: &str) -> Result<Value> {
        let status = resp.status();
        let body_text = resp.text().await.unwrap_or_default();

        if !status.is_success() {
            warn!(
                http_status = status.as_u16(),
                response = %body_text.chars().take(200).collect::<String>(),
                "Pakasir {what} failed"
            );
            return Err(Error::Gateway(format!("Pakasir returned {status}")));
        }

        serde_json::from_str(&body_text)
            .map_err(|_| Error::Gateway("Invalid Pakasir response".into()))
    }
}

#[async_trait]
impl super::InvoiceGateway for PakasirClient {
    async fn create_invoice(
        &self,
        trx_id: &str,
        amount: i64,
        description: &str,
        callback_url: &str,
    ) -> Result<Value> {
        let resp = self
            .http
            .post(self.endpoint("invoices"))
            .bearer_auth(self.api_key.expose_secret())
            .json(&json!({
                "external_id": trx_id,
                "amount": amount,
                "description": description,
                "callback_url": callback_url,
            }))
            .send()
            .await
            .map_err(|e| Error::Gateway(format!("Pakasir request failed: {e}")))?;

        Self::read_json(resp, "create_invoice").await
    }

    async fn get_invoice(&self, reference: &str) -> Result<Value> {
        let resp = self
            .http
            .get(self.endpoint(&format!("invoices/{reference}")))
            .bearer_auth(self.api_key.expose_secret())
            .send()
            .await
            .map_err(|e| Error::Gateway(format!("Pakasir request failed: {e}")))?;

        Self::read_json(resp, "get_invoice").await
    }
}
