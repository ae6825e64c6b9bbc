pub mod enums;
pub mod product;
pub mod transaction;
pub mod user;
pub mod voucher;

pub use enums::{Provider, TxStatus, VoucherKind};
pub use product::Product;
pub use transaction::{generate_trx_id, NewTransaction, Transaction};
pub use user::User;
pub use voucher::Voucher;
