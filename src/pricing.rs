//! Voucher and fee arithmetic. Pure functions over already-loaded records;
//! recording voucher usage is the transaction lifecycle's job and happens
//! only after a transaction is durably created.

use crate::chat::money;
use crate::models::{Voucher, VoucherKind};
use std::fmt;

/// Why a voucher was refused. `Display` is the user-facing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoucherRejection {
    Invalid,
    BelowMinimum { min_amount: i64 },
    LimitReached,
    AlreadyRedeemed,
}

impl fmt::Display for VoucherRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VoucherRejection::Invalid => write!(f, "Voucher is invalid or inactive."),
            VoucherRejection::BelowMinimum { min_amount } => {
                write!(f, "Minimum order for this voucher is {}.", money(*min_amount))
            }
            VoucherRejection::LimitReached => write!(f, "Voucher has reached its usage limit."),
            VoucherRejection::AlreadyRedeemed => write!(f, "You have already used this voucher."),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quote {
    pub discount: i64,
    /// Canonical code of the voucher that produced the discount, if any.
    pub voucher: Option<String>,
}

impl Quote {
    fn none() -> Self {
        Self { discount: 0, voucher: None }
    }
}

/// Validates `code` against the loaded voucher record and the user's
/// redemption history, then computes the discount.
///
/// The first failing check wins; an empty code is not an error, the voucher
/// is simply optional.
pub fn evaluate_voucher(
    amount: i64,
    code: &str,
    voucher: Option<&Voucher>,
    already_redeemed: bool,
) -> Result<Quote, VoucherRejection> {
    if code.is_empty() {
        return Ok(Quote::none());
    }

    let voucher = match voucher {
        Some(v) if v.active => v,
        _ => return Err(VoucherRejection::Invalid),
    };

    if amount < voucher.min_amount {
        return Err(VoucherRejection::BelowMinimum { min_amount: voucher.min_amount });
    }

    if voucher.usage_limit > 0 && voucher.used_count >= voucher.usage_limit {
        return Err(VoucherRejection::LimitReached);
    }

    if already_redeemed {
        return Err(VoucherRejection::AlreadyRedeemed);
    }

    Ok(Quote {
        discount: discount_for(voucher, amount),
        voucher: Some(voucher.code.clone()),
    })
}

/// Percent: floor, capped by `max_discount` when positive.
/// Flat: clamped to the order amount. Never negative, never above `amount`.
pub fn discount_for(voucher: &Voucher, amount: i64) -> i64 {
    let raw = match voucher.kind {
        VoucherKind::Percent => {
            // Saturating: admin-entered values can be arbitrarily large.
            let mut d = amount.saturating_mul(voucher.value) / 100;
            if voucher.max_discount > 0 {
                d = d.min(voucher.max_discount);
            }
            d
        }
        VoucherKind::Flat => voucher.value,
    };
    raw.clamp(0, amount)
}

/// The platform never absorbs fractional fee loss, so the fee rounds up.
pub fn fee_for(amount: i64, discount: i64, fee_percent: f64) -> i64 {
    (((amount - discount) as f64) * fee_percent / 100.0).ceil() as i64
}

pub fn final_amount(amount: i64, discount: i64, fee: i64) -> i64 {
    (amount - discount + fee).max(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn voucher(kind: VoucherKind, value: i64) -> Voucher {
        Voucher {
            code: "DISKON10".into(),
            kind,
            value,
            min_amount: 0,
            max_discount: 0,
            usage_limit: 0,
            used_count: 0,
            active: true,
        }
    }

    #[test]
    fn empty_code_is_not_an_error() {
        let q = evaluate_voucher(10_000, "", None, false).unwrap();
        assert_eq!(q, Quote { discount: 0, voucher: None });
    }

    #[test]
    fn unknown_or_inactive_is_rejected() {
        assert_eq!(
            evaluate_voucher(10_000, "NOPE", None, false),
            Err(VoucherRejection::Invalid)
        );
        let mut v = voucher(VoucherKind::Percent, 10);
        v.active = false;
        assert_eq!(
            evaluate_voucher(10_000, "DISKON10", Some(&v), false),
            Err(VoucherRejection::Invalid)
        );
    }

    #[test]
    fn percent_discount_floors() {
        let v = voucher(VoucherKind::Percent, 10);
        let q = evaluate_voucher(10_000, "DISKON10", Some(&v), false).unwrap();
        assert_eq!(q.discount, 1_000);
        assert_eq!(q.voucher.as_deref(), Some("DISKON10"));

        assert_eq!(discount_for(&voucher(VoucherKind::Percent, 33), 100), 33);
        assert_eq!(discount_for(&voucher(VoucherKind::Percent, 33), 10), 3);
    }

    #[test]
    fn percent_discount_respects_cap() {
        let mut v = voucher(VoucherKind::Percent, 50);
        v.max_discount = 700;
        assert_eq!(discount_for(&v, 10_000), 700);
        v.max_discount = 0;
        assert_eq!(discount_for(&v, 10_000), 5_000);
    }

    #[test]
    fn percent_never_exceeds_amount() {
        let v = voucher(VoucherKind::Percent, 150);
        assert_eq!(discount_for(&v, 10_000), 10_000);
    }

    #[test]
    fn extreme_percent_values_saturate_instead_of_overflowing() {
        let v = voucher(VoucherKind::Percent, i64::MAX);
        assert_eq!(discount_for(&v, i64::MAX / 2), i64::MAX / 2);
        assert_eq!(discount_for(&v, 0), 0);
    }

    #[test]
    fn flat_discount_clamps_to_amount() {
        let v = voucher(VoucherKind::Flat, 15_000);
        assert_eq!(discount_for(&v, 10_000), 10_000);
        let v = voucher(VoucherKind::Flat, 2_500);
        assert_eq!(discount_for(&v, 10_000), 2_500);
    }

    #[test]
    fn min_amount_rejects_before_limit_checks() {
        let mut v = voucher(VoucherKind::Percent, 10);
        v.min_amount = 50_000;
        v.usage_limit = 1;
        v.used_count = 1;
        assert_eq!(
            evaluate_voucher(10_000, "DISKON10", Some(&v), true),
            Err(VoucherRejection::BelowMinimum { min_amount: 50_000 })
        );
    }

    #[test]
    fn usage_limit_rejects_before_per_user_check() {
        let mut v = voucher(VoucherKind::Percent, 10);
        v.usage_limit = 2;
        v.used_count = 2;
        assert_eq!(
            evaluate_voucher(10_000, "DISKON10", Some(&v), true),
            Err(VoucherRejection::LimitReached)
        );
    }

    #[test]
    fn per_user_single_use() {
        let v = voucher(VoucherKind::Percent, 10);
        assert_eq!(
            evaluate_voucher(10_000, "DISKON10", Some(&v), true),
            Err(VoucherRejection::AlreadyRedeemed)
        );
    }

    #[test]
    fn fee_rounds_up() {
        assert_eq!(fee_for(10_000, 0, 0.8), 80);
        assert_eq!(fee_for(10_000, 1_000, 0.8), 72);
        assert_eq!(fee_for(101, 0, 0.8), 1);
        assert_eq!(fee_for(0, 0, 0.8), 0);
    }

    #[test]
    fn final_amount_is_never_negative() {
        assert_eq!(final_amount(10_000, 1_000, 72), 9_072);
        assert_eq!(final_amount(100, 100, 0), 0);
        assert_eq!(final_amount(0, 0, 0), 0);
    }
}
