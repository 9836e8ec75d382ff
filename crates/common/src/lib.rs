//! Shared types for the transfer saga system.

mod money;
mod status;
mod types;

pub use money::Money;
pub use status::TransactionStatus;
pub use types::{AccountId, TransactionId};
