use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Which backend settles or fulfills a product. `Saldo` is the internal
/// balance ledger; `Orderkuota` is fulfillment-style (balance-funded, then an
/// external create-order call); `Pakasir` and `Qiospay` are invoice-style.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Saldo,
    Orderkuota,
    Pakasir,
    Qiospay,
}

impl Provider {
    /// True when payment is taken from the user's internal balance.
    pub fn is_balance_funded(self) -> bool {
        matches!(self, Provider::Saldo | Provider::Orderkuota)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
#[serde(rename_all = "UPPERCASE")]
pub enum TxStatus {
    Pending,
    Paid,
    Processing,
    Success,
    Failed,
    Canceled,
    Review,
}

impl TxStatus {
    /// Terminal states are never advanced by the automatic pipeline.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TxStatus::Success | TxStatus::Failed | TxStatus::Canceled | TxStatus::Review
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
#[serde(rename_all = "UPPERCASE")]
pub enum VoucherKind {
    Percent,
    Flat,
}
