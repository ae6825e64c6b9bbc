mod common;

use common::*;
use storebot::models::{Provider, TxStatus};

// Price 6.000 + 0.8% fee = 6.048 per order.
const PRICE: i64 = 6_000;
const FINAL: i64 = 6_048;

#[tokio::test]
async fn concurrent_orders_never_overdraw_a_balance() {
    let state = test_state();
    seed_product(&state, "GAME6", PRICE, Provider::Saldo).await;
    seed_balance(&state, 1, 10_000).await;

    // Two full dialogs race; the per-user lock serializes them, so exactly
    // one can afford the charge.
    let tasks: Vec<_> = (0..2)
        .map(|_| {
            let state = state.clone();
            tokio::spawn(async move {
                drive(&state, button(1, "PICK_GAME6")).await;
                drive(&state, text(1, "0812xxxx")).await
            })
        })
        .collect();
    for task in tasks {
        task.await.unwrap();
    }

    let txs = state.store.recent_for_user(1, 10).await.unwrap();
    let paid = txs.iter().filter(|t| t.status == TxStatus::Paid).count() as i64;

    let user = state.store.find_user(1).await.unwrap().unwrap();
    assert_eq!(user.balance, 10_000 - FINAL * paid);
    assert!(user.balance >= 0);
}

#[tokio::test]
async fn distinct_users_order_in_parallel() {
    let state = test_state();
    seed_product(&state, "GAME6", PRICE, Provider::Saldo).await;
    for user_id in 1..=8 {
        seed_balance(&state, user_id, FINAL).await;
    }

    let tasks: Vec<_> = (1..=8)
        .map(|user_id| {
            let state = state.clone();
            tokio::spawn(async move { place_order(&state, user_id, "GAME6", "0812xxxx").await })
        })
        .collect();
    for task in tasks {
        let reply = task.await.unwrap();
        assert!(reply.text.contains("Status: PAID"), "got: {}", reply.text);
    }

    for user_id in 1..=8 {
        let user = state.store.find_user(user_id).await.unwrap().unwrap();
        assert_eq!(user.balance, 0);
        assert_eq!(state.store.recent_for_user(user_id, 10).await.unwrap().len(), 1);
    }
}
