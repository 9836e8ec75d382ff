use async_trait::async_trait;
use common::{AccountId, TransactionId};

use crate::{Result, TransactionRecord};

/// Default number of records returned by a listing when the caller
/// does not ask for a specific page size.
pub const DEFAULT_PAGE_LIMIT: usize = 20;

/// Upper bound on the page size; larger requests are clamped, not
/// rejected.
pub const MAX_PAGE_LIMIT: usize = 100;

/// A bounded page request for account listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: usize,
    pub offset: usize,
}

impl Page {
    /// Builds a page from raw caller input, clamping `limit` into
    /// `1..=MAX_PAGE_LIMIT`, clamping negative offsets to 0, and
    /// defaulting absent values. Out-of-range input is clamped, never
    /// rejected.
    pub fn clamped(limit: Option<i64>, offset: Option<i64>) -> Self {
        Self {
            limit: limit
                .unwrap_or(DEFAULT_PAGE_LIMIT as i64)
                .clamp(1, MAX_PAGE_LIMIT as i64) as usize,
            offset: offset.unwrap_or(0).max(0) as usize,
        }
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::clamped(None, None)
    }
}

/// An in-place record mutation applied under the store's write lock.
pub type Mutator = Box<dyn FnOnce(&mut TransactionRecord) + Send>;

/// Core trait for transaction record stores.
///
/// Implementations must be thread-safe (Send + Sync). The store
/// guarantees last-write-wins on `update` and does not enforce the
/// status state machine.
#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// Inserts a new record.
    ///
    /// Fails with `DuplicateTransaction` if a record with the same ID
    /// already exists.
    async fn create(&self, record: TransactionRecord) -> Result<()>;

    /// Retrieves a record by ID, or `None` if unknown.
    async fn get(&self, id: TransactionId) -> Result<Option<TransactionRecord>>;

    /// Applies a mutation to the record in place and returns the
    /// updated record.
    ///
    /// Fails with `NotFound` if the record does not exist.
    async fn update(&self, id: TransactionId, mutate: Mutator) -> Result<TransactionRecord>;

    /// Inserts the record unless another record already carries its
    /// idempotency key, in which case that record is returned instead.
    ///
    /// The key lookup and the insert happen under a single lock
    /// acquisition, so concurrent submissions carrying the same key
    /// settle on one record. Records without a key are always inserted.
    async fn create_idempotent(&self, record: TransactionRecord) -> Result<TransactionRecord>;

    /// Lists records touching the given account, newest first by
    /// creation time, bounded by `page`.
    async fn list_by_account(
        &self,
        account_id: &AccountId,
        page: Page,
    ) -> Result<Vec<TransactionRecord>>;
}
