//! Transaction record store.
//!
//! Holds one [`TransactionRecord`] per saga instance, keyed by
//! transaction ID. The store is a plain repository: it guarantees
//! last-write-wins on `update` and newest-first ordering on account
//! listings, and deliberately does not enforce the status state
//! machine — that responsibility belongs to the orchestrator.

pub mod error;
pub mod memory;
pub mod record;
pub mod store;

pub use common::TransactionId;
pub use error::{Result, StoreError};
pub use memory::InMemoryTransactionStore;
pub use record::{EntryDirection, TransactionRecord};
pub use store::{DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT, Mutator, Page, TransactionStore};
