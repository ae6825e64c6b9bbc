use crate::chat::{self, back_menu, main_menu, money, ChatEvent, Input, Reply};
use crate::error::Result;
use crate::models::{Transaction, User};
use crate::pricing;
use crate::services::admin_service::AdminService;
use crate::services::transaction_service::{DispatchOutcome, TransactionService};
use crate::session::Session;
use crate::AppState;
use tracing::info;

/// Order orchestrator: consumes one chat event, drives the per-user dialog
/// forward and renders the reply. The whole turn runs under the user's lock,
/// so duplicate taps serialize instead of racing the session writes.
pub struct OrderService;

impl OrderService {
    pub async fn handle(state: &AppState, event: &ChatEvent) -> Result<Reply> {
        let _turn = state.locks.acquire(event.user_id).await;

        let user = state
            .store
            .get_or_create_user(event.user_id, &event.username, &event.first_name)
            .await?;

        match &event.input {
            Input::Text(text) => {
                let text = text.trim();
                if let Some(command) = text.strip_prefix('/') {
                    Self::handle_command(state, &user, command, text).await
                } else {
                    Self::handle_dialog_text(state, &user, text).await
                }
            }
            Input::Button(payload) => Self::handle_button(state, &user, payload).await,
        }
    }

    async fn handle_command(
        state: &AppState,
        user: &User,
        command: &str,
        full_text: &str,
    ) -> Result<Reply> {
        let name = command.split_whitespace().next().unwrap_or_default();
        match name {
            "start" => {
                state.store.set_session(user.id, Session::Idle).await?;
                let greeting = if user.first_name.is_empty() { "there" } else { &user.first_name };
                let text = format!(
                    "Hi {}.\nThis is the store bot. Pick a menu below.\n\nChannel: {}",
                    greeting, state.config.channel
                );
                Ok(Reply::with_keyboard(text, main_menu()))
            }
            "menu" => Ok(Reply::with_keyboard("Menu:", main_menu())),
            "saldo" => Ok(Reply::text(format!("Your balance: {}", money(user.balance)))),
            "produk" => Ok(Reply::text(Self::product_list_text(state).await?)),
            "trx" => Ok(Reply::text(Self::transaction_list_text(state, user.id).await?)),
            "addsaldo" | "addproduct" | "addvoucher" => {
                AdminService::handle(state, user.id, name, full_text).await
            }
            _ => Ok(Reply::none()),
        }
    }

    async fn handle_button(state: &AppState, user: &User, payload: &str) -> Result<Reply> {
        use chat::payload::*;

        if let Some(code) = payload.strip_prefix(PICK_PREFIX) {
            return Self::pick_product(state, user, code).await;
        }

        match payload {
            BACK_MENU => {
                state.store.set_session(user.id, Session::Idle).await?;
                Ok(Reply::with_keyboard("Menu:", main_menu()))
            }
            MENU_BALANCE => Ok(Reply::with_keyboard(
                format!("Your balance: {}", money(user.balance)),
                main_menu(),
            )),
            MENU_PRODUCTS => {
                Ok(Reply::with_keyboard(Self::product_list_text(state).await?, main_menu()))
            }
            MENU_TRX => Ok(Reply::with_keyboard(
                Self::transaction_list_text(state, user.id).await?,
                main_menu(),
            )),
            MENU_VOUCHER => {
                state.store.set_session(user.id, Session::AwaitingVoucher).await?;
                Ok(Reply::with_keyboard(
                    "Send your voucher code (example: DISKON10).\n\n\
                     Note: vouchers apply during an order with `VOUCHER:CODE` after the target.",
                    back_menu(),
                ))
            }
            MENU_ORDER => {
                // Opening the order menu abandons any dialog in progress.
                state.store.set_session(user.id, Session::Idle).await?;
                let products = state.store.active_products().await?;
                if products.is_empty() {
                    return Ok(Reply::with_keyboard("No active products yet.", main_menu()));
                }
                let mut rows: Vec<Vec<chat::Button>> = products
                    .iter()
                    .take(20)
                    .map(|p| {
                        vec![chat::Button::new(
                            format!("{} ({})", p.name, money(p.price)),
                            format!("{PICK_PREFIX}{}", p.code),
                        )]
                    })
                    .collect();
                rows.push(vec![chat::Button::new("⬅️ Back", BACK_MENU)]);
                Ok(Reply::with_keyboard("Pick a product:", chat::Keyboard { rows }))
            }
            MENU_ADMIN => {
                if !state.config.is_admin(user.id) {
                    return Ok(Reply::text("You are not an admin."));
                }
                Ok(Reply::with_keyboard(
                    "Admin menu:\n\
                     • /addsaldo <userId> <amount>\n\
                     • /addproduct CODE | Name | category | price | provider\n\
                     • /addvoucher CODE | PERCENT/FLAT | value | minAmount | maxDiscount | usageLimit\n",
                    main_menu(),
                ))
            }
            _ => Ok(Reply::none()),
        }
    }

    async fn pick_product(state: &AppState, user: &User, code: &str) -> Result<Reply> {
        let product = match state.store.find_product(code).await? {
            Some(p) if p.active => p,
            _ => return Ok(Reply::text("Product not found.")),
        };

        state
            .store
            .set_session(user.id, Session::AwaitingTarget { product_code: product.code.clone() })
            .await?;

        Ok(Reply::with_keyboard(
            format!(
                "Product picked: {}\nPrice: {}\n\nNow send the target (number / destination id).\n\n\
                 With a voucher, for example:\n0812xxxx VOUCHER:DISKON10",
                product.name,
                money(product.price)
            ),
            back_menu(),
        ))
    }

    async fn handle_dialog_text(state: &AppState, user: &User, text: &str) -> Result<Reply> {
        match &user.session {
            // A message while no dialog is in progress is a no-op.
            Session::Idle => Ok(Reply::none()),
            Session::AwaitingVoucher => Self::echo_voucher(state, user, text).await,
            Session::AwaitingTarget { product_code } => {
                Self::complete_order(state, user, product_code.clone(), text).await
            }
        }
    }

    /// Voucher dialog just validates and echoes the code; redemption happens
    /// during an order.
    async fn echo_voucher(state: &AppState, user: &User, text: &str) -> Result<Reply> {
        let code = text.to_uppercase();
        let voucher = state.store.find_voucher(&code).await?;

        state.store.set_session(user.id, Session::Idle).await?;

        match voucher {
            Some(v) if v.active => Ok(Reply::with_keyboard(
                format!("Voucher {code} detected. Use it at order time: VOUCHER:{code}"),
                main_menu(),
            )),
            _ => Ok(Reply::with_keyboard("Voucher is invalid or inactive.", main_menu())),
        }
    }

    async fn complete_order(
        state: &AppState,
        user: &User,
        product_code: String,
        text: &str,
    ) -> Result<Reply> {
        let product = match state.store.find_product(&product_code).await? {
            Some(p) if p.active => p,
            _ => {
                state.store.set_session(user.id, Session::Idle).await?;
                return Ok(Reply::with_keyboard("Product is no longer available.", main_menu()));
            }
        };

        let (target, voucher_code) = split_voucher_token(text);

        let amount = product.price;
        let voucher = match &voucher_code {
            Some(code) => state.store.find_voucher(code).await?,
            None => None,
        };
        let already_redeemed =
            voucher_code.as_deref().map(|c| user.has_redeemed(c)).unwrap_or(false);

        let quote = match pricing::evaluate_voucher(
            amount,
            voucher_code.as_deref().unwrap_or(""),
            voucher.as_ref(),
            already_redeemed,
        ) {
            Ok(quote) => quote,
            Err(reason) => {
                state.store.set_session(user.id, Session::Idle).await?;
                return Ok(Reply::with_keyboard(
                    format!("Voucher failed: {reason}"),
                    main_menu(),
                ));
            }
        };

        let fee = pricing::fee_for(amount, quote.discount, state.config.fee_percent);
        let final_amount = pricing::final_amount(amount, quote.discount, fee);

        // Dialog is done whatever the payment outcome.
        state.store.set_session(user.id, Session::Idle).await?;

        let (tx, outcome) = TransactionService::create_and_dispatch(
            state,
            user.id,
            &product,
            &target,
            &quote,
            fee,
            final_amount,
        )
        .await?;

        info!(trx_id = %tx.trx_id, user_id = user.id, "order dialog completed");

        Ok(Self::render_outcome(&tx, &product.name, amount, &outcome))
    }

    fn render_outcome(
        tx: &Transaction,
        product_name: &str,
        base_amount: i64,
        outcome: &DispatchOutcome,
    ) -> Reply {
        match outcome {
            DispatchOutcome::InsufficientBalance { needed, balance } => Reply::with_keyboard(
                format!(
                    "Insufficient balance.\nNeed {} but your balance is {}.",
                    money(*needed),
                    money(*balance)
                ),
                main_menu(),
            ),
            DispatchOutcome::BalancePaid { .. } => Reply::with_keyboard(
                format!("Paid from balance.\nTrx: {}\nStatus: PAID\nProvider: saldo", tx.trx_id),
                main_menu(),
            ),
            DispatchOutcome::Fulfilled => Reply::with_keyboard(
                format!("Order processed.\nTrx: {}\nStatus: SUCCESS", tx.trx_id),
                main_menu(),
            ),
            DispatchOutcome::FulfillmentReview => Reply::with_keyboard(
                format!("Automatic fulfillment failed. Parked for REVIEW.\nTrx: {}", tx.trx_id),
                main_menu(),
            ),
            DispatchOutcome::InvoiceCreated { gateway_ref } => {
                let mut text = Self::receipt(tx, product_name, base_amount);
                let shown = if gateway_ref.is_empty() { "-" } else { gateway_ref };
                text.push_str(&format!("\nInvoice created ({}). Ref: {}", tx.gateway, shown));
                Reply::with_keyboard(text, main_menu())
            }
            DispatchOutcome::InvoiceReview => {
                let mut text = Self::receipt(tx, product_name, base_amount);
                text.push_str("\n\nGateway error, transaction parked for REVIEW.");
                Reply::with_keyboard(text, main_menu())
            }
        }
    }

    fn receipt(tx: &Transaction, product_name: &str, base_amount: i64) -> String {
        format!(
            "🧾 Transaction created\n\n\
             Trx: {}\nProduct: {}\nTarget: {}\n\
             Price: {}\nDiscount: {}\nFee: {}\nTotal: {}\n\n\
             Status: PENDING\nGateway: {}\n",
            tx.trx_id,
            product_name,
            tx.target,
            money(base_amount),
            money(tx.discount),
            money(tx.fee),
            money(tx.amount),
            tx.gateway,
        )
    }

    async fn product_list_text(state: &AppState) -> Result<String> {
        let products = state.store.active_products().await?;
        if products.is_empty() {
            return Ok("No active products yet.".to_string());
        }
        let mut out = String::from("📦 Products\n\n");
        for p in products.iter().take(50) {
            out.push_str(&format!(
                "• {}\n  - Code: {}\n  - Price: {}\n  - Category: {}\n\n",
                p.name,
                p.code,
                money(p.price),
                p.category
            ));
        }
        out.push_str("To order: tap Order and pick a product.");
        Ok(out)
    }

    async fn transaction_list_text(state: &AppState, user_id: i64) -> Result<String> {
        let items = state.store.recent_for_user(user_id, 10).await?;
        if items.is_empty() {
            return Ok("No transactions yet.".to_string());
        }
        let mut out = String::from("🧾 Last 10 transactions\n\n");
        for t in &items {
            out.push_str(&format!(
                "• {} - {}\n  {} → {}\n  {}\n\n",
                t.trx_id,
                t.status,
                t.product_name,
                t.target,
                money(t.amount)
            ));
        }
        Ok(out)
    }
}

/// Pulls a `VOUCHER:CODE` token out of the order-input text; whatever remains
/// is the delivery target. Codes are 3 to 30 chars of `[A-Z0-9_-]`,
/// canonicalized upper-case.
pub fn split_voucher_token(text: &str) -> (String, Option<String>) {
    let mut code = None;
    let mut target_parts: Vec<&str> = Vec::new();

    for token in text.split_whitespace() {
        let upper = token.to_uppercase();
        match upper.strip_prefix("VOUCHER:") {
            Some(candidate)
                if code.is_none()
                    && (3..=30).contains(&candidate.len())
                    && candidate
                        .chars()
                        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') =>
            {
                code = Some(candidate.to_string());
            }
            _ => target_parts.push(token),
        }
    }

    (target_parts.join(" "), code)
}
