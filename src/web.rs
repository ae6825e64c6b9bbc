//! Web monitor and settlement endpoint: health, product dump, sales report
//! and the invoice-gateway callback that confirms or rejects pending
//! transactions.

use crate::error::{Error, Result};
use crate::models::{Product, Provider};
use crate::services::report_service::{HealthReport, ReportService};
use crate::services::transaction_service::TransactionService;
use crate::AppState;
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{Duration, Utc};
use eyre::Report;
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/products", get(products))
        .route("/api/report/products", get(product_report))
        .route("/callback/{gateway}", post(gateway_callback))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(router: Router) -> std::result::Result<(), Report> {
    let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".into());

    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .map_err(|e| eyre::eyre!("Invalid bind address: {}", e))?;

    info!("Web monitor listening on http://{}", addr);

    axum::serve(tokio::net::TcpListener::bind(&addr).await?, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    Ok(())
}

async fn health(State(state): State<Arc<AppState>>) -> Json<HealthReport> {
    Json(ReportService::health(&state).await)
}

async fn products(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Product>>> {
    Ok(Json(state.store.all_products().await?))
}

#[derive(Deserialize)]
struct ReportQuery {
    days: Option<i64>,
}

async fn product_report(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ReportQuery>,
) -> Result<Json<Value>> {
    let days = query.days.unwrap_or(30).clamp(1, 365);
    let since = Utc::now() - Duration::days(days);
    let rows = ReportService::product_report(&state, days).await?;
    Ok(Json(json!({
        "range_days": days,
        "since": since,
        "rows": rows,
    })))
}

/// Settlement webhook. The signature header must carry the hex HMAC-SHA256 of
/// the raw body under the gateway's webhook secret; the payload itself is
/// opaque apart from the transaction id and a status string.
async fn gateway_callback(
    State(state): State<Arc<AppState>>,
    Path(gateway): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let Ok(provider) = Provider::from_str(&gateway) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    let secret = match provider {
        Provider::Pakasir => state.config.pakasir.as_ref().map(|i| i.webhook_secret.clone()),
        Provider::Qiospay => state.config.qiospay.as_ref().map(|i| i.webhook_secret.clone()),
        _ => None,
    };
    let Some(secret) = secret else {
        return StatusCode::NOT_FOUND.into_response();
    };

    let signature = headers
        .get("x-callback-signature")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if !verify_signature(secret.expose_secret(), &body, signature) {
        warn!(gateway = %provider, "rejected callback with bad signature");
        return StatusCode::UNAUTHORIZED.into_response();
    }

    let Ok(payload) = serde_json::from_slice::<Value>(&body) else {
        return (StatusCode::BAD_REQUEST, "invalid JSON body").into_response();
    };

    let Some(trx_id) = callback_trx_id(&payload) else {
        return (StatusCode::BAD_REQUEST, "missing transaction id").into_response();
    };

    let settled = match payload["status"].as_str().map(str::to_lowercase).as_deref() {
        Some("paid") | Some("success") | Some("completed") => true,
        Some("failed") | Some("expired") | Some("canceled") | Some("cancelled") => false,
        _ => return (StatusCode::BAD_REQUEST, "unknown status").into_response(),
    };

    match TransactionService::settle(&state, &trx_id, settled, payload).await {
        Ok(applied) => Json(json!({ "applied": applied })).into_response(),
        Err(Error::Store(_)) => StatusCode::NOT_FOUND.into_response(),
        Err(e) => e.into_response(),
    }
}

fn callback_trx_id(payload: &Value) -> Option<String> {
    for key in ["trx_id", "external_id", "ref_id"] {
        if let Some(id) = payload[key].as_str() {
            if !id.is_empty() {
                return Some(id.to_string());
            }
        }
    }
    None
}

/// Constant-time comparison against the expected hex HMAC-SHA256 digest.
pub fn verify_signature(secret: &str, payload: &[u8], signature_hex: &str) -> bool {
    use hmac::{Hmac, Mac};
    use sha2::Sha256;
    use subtle::ConstantTimeEq;

    type HmacSha256 = Hmac<Sha256>;

    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(payload);
    let expected = hex::encode(mac.finalize().into_bytes());

    expected.as_bytes().ct_eq(signature_hex.as_bytes()).unwrap_u8() == 1
}

/// Helper for tests and for gateways configured by hand: the signature the
/// endpoint expects for `payload`.
pub fn sign_payload(secret: &str, payload: &[u8]) -> String {
    use hmac::{Hmac, Mac};
    use sha2::Sha256;

    type HmacSha256 = Hmac<Sha256>;

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .expect("HMAC accepts keys of any length");
    mac.update(payload);
    hex::encode(mac.finalize().into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_roundtrip() {
        let sig = sign_payload("secret", b"{\"status\":\"paid\"}");
        assert!(verify_signature("secret", b"{\"status\":\"paid\"}", &sig));
        assert!(!verify_signature("other", b"{\"status\":\"paid\"}", &sig));
        assert!(!verify_signature("secret", b"{\"status\":\"failed\"}", &sig));
    }

    #[test]
    fn trx_id_probes_known_keys() {
        assert_eq!(
            callback_trx_id(&json!({"external_id": "ABCD"})).as_deref(),
            Some("ABCD")
        );
        assert_eq!(callback_trx_id(&json!({"other": 1})), None);
    }
}
