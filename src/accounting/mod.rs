pub mod admin;
pub mod authenticator;
pub mod ledger;

pub use admin::AdminGuard;
pub use authenticator::{AccountError, Authenticator, HashCost};
pub use ledger::{LedgerError, TokenLedger};
