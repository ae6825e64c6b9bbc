use crate::models::VoucherKind;
use serde::{Deserialize, Serialize};

/// A discount rule keyed by canonical upper-case code.
///
/// `max_discount == 0` means the percentage discount is uncapped;
/// `usage_limit == 0` means unlimited global uses. `used_count` never exceeds
/// a positive `usage_limit` (enforced by the store's conditional increment).
/// Single use per user is tracked on the user's redemption set, not here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Voucher {
    pub code: String,
    pub kind: VoucherKind,
    pub value: i64,
    pub min_amount: i64,
    pub max_discount: i64,
    pub usage_limit: i64,
    pub used_count: i64,
    pub active: bool,
}
