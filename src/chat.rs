//! Transport boundary types. The chat layer (Telegram or anything else)
//! delivers [`ChatEvent`]s and renders [`Reply`]s; the keyboard shape is
//! opaque to everything below the orchestrator.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone)]
pub struct ChatEvent {
    pub user_id: i64,
    pub username: String,
    pub first_name: String,
    pub input: Input,
}

#[derive(Debug, Clone)]
pub enum Input {
    /// Free text or a slash command.
    Text(String),
    /// An inline-keyboard callback payload.
    Button(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Button {
    pub label: String,
    pub payload: String,
}

impl Button {
    pub fn new(label: impl Into<String>, payload: impl Into<String>) -> Self {
        Self { label: label.into(), payload: payload.into() }
    }
}

/// Rows of buttons, rendered by the transport however it likes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keyboard {
    pub rows: Vec<Vec<Button>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub keyboard: Option<Keyboard>,
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Self { text: text.into(), keyboard: None }
    }

    pub fn with_keyboard(text: impl Into<String>, keyboard: Keyboard) -> Self {
        Self { text: text.into(), keyboard: Some(keyboard) }
    }

    /// Text received while no dialog is in progress is ignored.
    pub fn none() -> Self {
        Self { text: String::new(), keyboard: None }
    }

    pub fn is_none(&self) -> bool {
        self.text.is_empty() && self.keyboard.is_none()
    }
}

pub mod payload {
    pub const MENU_ORDER: &str = "MENU_ORDER";
    pub const MENU_BALANCE: &str = "MENU_BALANCE";
    pub const MENU_PRODUCTS: &str = "MENU_PRODUCTS";
    pub const MENU_TRX: &str = "MENU_TRX";
    pub const MENU_VOUCHER: &str = "MENU_VOUCHER";
    pub const MENU_ADMIN: &str = "MENU_ADMIN";
    pub const BACK_MENU: &str = "BACK_MENU";
    pub const PICK_PREFIX: &str = "PICK_";
}

pub fn main_menu() -> Keyboard {
    Keyboard {
        rows: vec![
            vec![
                Button::new("🛒 Order", payload::MENU_ORDER),
                Button::new("💰 Balance", payload::MENU_BALANCE),
            ],
            vec![
                Button::new("🎟️ Voucher", payload::MENU_VOUCHER),
                Button::new("📦 Products", payload::MENU_PRODUCTS),
            ],
            vec![
                Button::new("🧾 Transactions", payload::MENU_TRX),
                Button::new("🧑‍💻 Admin", payload::MENU_ADMIN),
            ],
        ],
    }
}

pub fn back_menu() -> Keyboard {
    Keyboard { rows: vec![vec![Button::new("⬅️ Back", payload::BACK_MENU)]] }
}

/// Currency rendering: `Rp` with dot thousand separators.
pub fn money(n: i64) -> String {
    let negative = n < 0;
    let digits = n.unsigned_abs().to_string();
    let mut grouped = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }
    if negative {
        format!("Rp -{}", grouped)
    } else {
        format!("Rp {}", grouped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn money_groups_thousands() {
        assert_eq!(money(0), "Rp 0");
        assert_eq!(money(999), "Rp 999");
        assert_eq!(money(10_000), "Rp 10.000");
        assert_eq!(money(1_234_567), "Rp 1.234.567");
    }
}
