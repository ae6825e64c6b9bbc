use crate::chat::{money, Reply};
use crate::error::Result;
use crate::models::{Product, Provider, Voucher, VoucherKind};
use crate::AppState;
use std::str::FromStr;
use tracing::info;

/// Plain admin upserts: balance credits, product and voucher maintenance.
/// Every entry point re-checks the sender against the configured admin set.
pub struct AdminService;

impl AdminService {
    pub async fn handle(
        state: &AppState,
        sender_id: i64,
        command: &str,
        full_text: &str,
    ) -> Result<Reply> {
        if !state.config.is_admin(sender_id) {
            return Ok(Reply::text("You are not an admin."));
        }

        match command {
            "addsaldo" => Self::add_balance(state, full_text).await,
            "addproduct" => Self::add_product(state, full_text).await,
            "addvoucher" => Self::add_voucher(state, full_text).await,
            _ => Ok(Reply::none()),
        }
    }

    async fn add_balance(state: &AppState, text: &str) -> Result<Reply> {
        let parts: Vec<&str> = text.split_whitespace().collect();
        if parts.len() < 3 {
            return Ok(Reply::text("Format: /addsaldo <userId> <amount>"));
        }

        let (Ok(user_id), Ok(amount)) = (parts[1].parse::<i64>(), parts[2].parse::<i64>()) else {
            return Ok(Reply::text("Invalid input."));
        };
        if amount <= 0 {
            return Ok(Reply::text("Invalid input."));
        }

        let balance = state.store.credit_balance(user_id, amount).await?;
        info!(user_id, amount, balance, "admin balance credit");
        Ok(Reply::text(format!("OK. Balance of user {user_id} +{}", money(amount))))
    }

    async fn add_product(state: &AppState, text: &str) -> Result<Reply> {
        const USAGE: &str = "Format:\n/addproduct CODE | Name | category | price | provider(optional)";

        let raw = text.trim_start_matches("/addproduct").trim();
        let parts: Vec<&str> = raw.split('|').map(str::trim).collect();
        if parts.len() < 4 {
            return Ok(Reply::text(USAGE));
        }

        let code = parts[0].to_uppercase();
        let name = parts[1].to_string();
        let category =
            if parts[2].is_empty() { "pulsa".to_string() } else { parts[2].to_string() };
        let Ok(price) = parts[3].parse::<i64>() else {
            return Ok(Reply::text("Invalid input."));
        };
        if code.is_empty() || name.is_empty() || price <= 0 {
            return Ok(Reply::text("Invalid input."));
        }

        let provider = match parts.get(4).filter(|s| !s.is_empty()) {
            Some(raw) => match Provider::from_str(raw) {
                Ok(p) => p,
                Err(_) => return Ok(Reply::text("Unknown provider.")),
            },
            None => Provider::Orderkuota,
        };

        state
            .store
            .upsert_product(Product {
                code: code.clone(),
                name: name.clone(),
                category,
                price,
                provider,
                active: true,
            })
            .await?;

        info!(code = %code, provider = %provider, price, "product upserted");
        Ok(Reply::text(format!(
            "OK. Product saved:\n{name}\nCode: {code}\nPrice: {}\nProvider: {provider}",
            money(price)
        )))
    }

    async fn add_voucher(state: &AppState, text: &str) -> Result<Reply> {
        const USAGE: &str = "Format:\n/addvoucher CODE | PERCENT/FLAT | value | minAmount(optional) | maxDiscount(optional) | usageLimit(optional)";

        let raw = text.trim_start_matches("/addvoucher").trim();
        let parts: Vec<&str> = raw.split('|').map(str::trim).collect();
        if parts.len() < 3 {
            return Ok(Reply::text(USAGE));
        }

        let code = parts[0].to_uppercase();
        let Ok(kind) = VoucherKind::from_str(parts[1]) else {
            return Ok(Reply::text("Invalid voucher input."));
        };
        let Ok(value) = parts[2].parse::<i64>() else {
            return Ok(Reply::text("Invalid voucher input."));
        };
        if code.is_empty() || value <= 0 {
            return Ok(Reply::text("Invalid voucher input."));
        }

        let opt = |i: usize| parts.get(i).and_then(|s| s.parse::<i64>().ok()).unwrap_or(0);
        let (min_amount, max_discount, usage_limit) = (opt(3), opt(4), opt(5));

        // An upsert must not reset an existing voucher's usage counter.
        let used_count = state
            .store
            .find_voucher(&code)
            .await?
            .map(|v| v.used_count)
            .unwrap_or(0);

        state
            .store
            .upsert_voucher(Voucher {
                code: code.clone(),
                kind,
                value,
                min_amount,
                max_discount,
                usage_limit,
                used_count,
                active: true,
            })
            .await?;

        info!(code = %code, kind = %kind, value, "voucher upserted");
        Ok(Reply::text(format!("OK. Voucher saved:\nCode: {code}\nType: {kind}\nValue: {value}")))
    }
}
