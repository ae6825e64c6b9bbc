use eyre::Report;
use secrecy::SecretString;
use std::env;

/// Process-wide configuration, read once at startup and immutable afterwards.
///
/// Each gateway is configured independently; absent credentials leave that
/// gateway's section `None`, which disables it for dispatch.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub admin_ids: Vec<i64>,
    pub channel: String,
    pub server_base_url: String,

    /// Percentage applied to the post-discount amount, rounded up.
    pub fee_percent: f64,

    pub orderkuota: Option<OrderkuotaInfo>,
    pub pakasir: Option<PakasirInfo>,
    pub qiospay: Option<QiospayInfo>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, Report> {
        Ok(Self {
            admin_ids: parse_admin_ids(&env::var("ADMIN_IDS").unwrap_or_default()),
            channel: env::var("CHANNEL_ID").unwrap_or_default(),
            server_base_url: env::var("SERVER_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:3000".into()),
            fee_percent: env::var("FEE_PERCENT")
                .unwrap_or_else(|_| "0.8".into())
                .parse()
                .map_err(|e| eyre::eyre!("Invalid FEE_PERCENT: {}", e))?,
            orderkuota: OrderkuotaInfo::from_env(),
            pakasir: PakasirInfo::from_env(),
            qiospay: QiospayInfo::from_env(),
        })
    }

    pub fn is_admin(&self, user_id: i64) -> bool {
        self.admin_ids.contains(&user_id)
    }
}

fn parse_admin_ids(raw: &str) -> Vec<i64> {
    raw.split(',')
        .filter_map(|part| part.trim().parse::<i64>().ok())
        .collect()
}

fn secret(name: &str) -> Option<SecretString> {
    let value = env::var(name).ok()?;
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    Some(SecretString::new(value.into()))
}

fn non_empty(name: &str) -> Option<String> {
    let value = env::var(name).ok()?;
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    Some(value.to_string())
}

/// Fulfillment-style gateway credentials.
#[derive(Debug, Clone)]
pub struct OrderkuotaInfo {
    pub api_url: String,
    pub username: String,
    pub auth_token: SecretString,
}

impl OrderkuotaInfo {
    pub fn from_env() -> Option<Self> {
        Some(Self {
            api_url: env::var("ORDERKUOTA_API_URL")
                .unwrap_or_else(|_| "https://api.orderkuota.com".into()),
            username: non_empty("ORDERKUOTA_AUTH_USERNAME")?,
            auth_token: secret("ORDERKUOTA_AUTH_TOKEN")?,
        })
    }
}

/// Invoice-style gateway credentials.
#[derive(Debug, Clone)]
pub struct PakasirInfo {
    pub api_url: String,
    pub project_slug: String,
    pub api_key: SecretString,
    pub webhook_secret: SecretString,
}

impl PakasirInfo {
    pub fn from_env() -> Option<Self> {
        let api_key = secret("PAKASIR_API_KEY")?;
        Some(Self {
            api_url: env::var("PAKASIR_API_URL").unwrap_or_else(|_| "https://pakasir.com".into()),
            project_slug: non_empty("PAKASIR_PROJECT_SLUG")?,
            webhook_secret: secret("PAKASIR_WEBHOOK_SECRET").unwrap_or_else(|| api_key.clone()),
            api_key,
        })
    }
}

/// Invoice-style gateway credentials.
#[derive(Debug, Clone)]
pub struct QiospayInfo {
    pub api_url: String,
    pub merchant_code: String,
    pub api_key: SecretString,
    pub webhook_secret: SecretString,
}

impl QiospayInfo {
    pub fn from_env() -> Option<Self> {
        let api_key = secret("QIOSPAY_API_KEY")?;
        Some(Self {
            api_url: env::var("QIOSPAY_API_URL")
                .unwrap_or_else(|_| "https://api.qiospay.com".into()),
            merchant_code: non_empty("QIOSPAY_MERCHANT_CODE")?,
            webhook_secret: secret("QIOSPAY_WEBHOOK_SECRET").unwrap_or_else(|| api_key.clone()),
            api_key,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_ids_parse_loosely() {
        assert_eq!(parse_admin_ids("1, 2,junk, 3"), vec![1, 2, 3]);
        assert!(parse_admin_ids("").is_empty());
    }
}
