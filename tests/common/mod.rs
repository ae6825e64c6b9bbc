#![allow(dead_code)]

use std::sync::Arc;
use storebot::chat::{ChatEvent, Input, Reply};
use storebot::config::AppConfig;
use storebot::gateways::Gateways;
use storebot::models::{Product, Provider, Voucher, VoucherKind};
use storebot::services::order_service::OrderService;
use storebot::store::MemoryStore;
use storebot::AppState;

pub const ADMIN_ID: i64 = 99;

pub fn test_config() -> AppConfig {
    AppConfig {
        admin_ids: vec![ADMIN_ID],
        channel: "@testchannel".into(),
        server_base_url: "http://localhost:3000".into(),
        fee_percent: 0.8,
        orderkuota: None,
        pakasir: None,
        qiospay: None,
    }
}

/// State over a fresh in-memory store with every gateway disabled.
pub fn test_state() -> Arc<AppState> {
    AppState::with_gateways(Arc::new(MemoryStore::new()), test_config(), Gateways::disabled())
}

pub fn state_with_gateways(config: AppConfig, gateways: Gateways) -> Arc<AppState> {
    AppState::with_gateways(Arc::new(MemoryStore::new()), config, gateways)
}

pub async fn seed_product(state: &AppState, code: &str, price: i64, provider: Provider) {
    state
        .store
        .upsert_product(Product {
            code: code.to_string(),
            name: format!("{code} product"),
            category: "pulsa".into(),
            price,
            provider,
            active: true,
        })
        .await
        .unwrap();
}

pub async fn seed_voucher(
    state: &AppState,
    code: &str,
    kind: VoucherKind,
    value: i64,
    usage_limit: i64,
) {
    state
        .store
        .upsert_voucher(Voucher {
            code: code.to_string(),
            kind,
            value,
            min_amount: 0,
            max_discount: 0,
            usage_limit,
            used_count: 0,
            active: true,
        })
        .await
        .unwrap();
}

pub async fn seed_balance(state: &AppState, user_id: i64, amount: i64) {
    state.store.get_or_create_user(user_id, "seed", "Seed").await.unwrap();
    state.store.credit_balance(user_id, amount).await.unwrap();
}

pub fn text(user_id: i64, text: &str) -> ChatEvent {
    ChatEvent {
        user_id,
        username: format!("user{user_id}"),
        first_name: "Test".into(),
        input: Input::Text(text.to_string()),
    }
}

pub fn button(user_id: i64, payload: &str) -> ChatEvent {
    ChatEvent {
        user_id,
        username: format!("user{user_id}"),
        first_name: "Test".into(),
        input: Input::Button(payload.to_string()),
    }
}

pub async fn drive(state: &AppState, event: ChatEvent) -> Reply {
    OrderService::handle(state, &event).await.unwrap()
}

/// Runs the pick-product + send-target dialog for one user.
pub async fn place_order(state: &AppState, user_id: i64, code: &str, target: &str) -> Reply {
    drive(state, button(user_id, &format!("PICK_{code}"))).await;
    drive(state, text(user_id, target)).await
}
