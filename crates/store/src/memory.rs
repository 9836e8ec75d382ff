use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::{AccountId, TransactionId};
use tokio::sync::RwLock;

use crate::{
    Result, StoreError, TransactionRecord,
    store::{Mutator, Page, TransactionStore},
};

/// In-memory transaction store.
///
/// Backs the store contract with a shared map. Durability is a
/// collaborator concern; a persistent implementation can replace this
/// one without touching the orchestrator.
#[derive(Clone, Default)]
pub struct InMemoryTransactionStore {
    records: Arc<RwLock<HashMap<TransactionId, TransactionRecord>>>,
}

impl InMemoryTransactionStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of records stored.
    pub async fn record_count(&self) -> usize {
        self.records.read().await.len()
    }

    /// Clears all records.
    pub async fn clear(&self) {
        self.records.write().await.clear();
    }
}

#[async_trait]
impl TransactionStore for InMemoryTransactionStore {
    async fn create(&self, record: TransactionRecord) -> Result<()> {
        let mut records = self.records.write().await;
        if records.contains_key(&record.id) {
            return Err(StoreError::DuplicateTransaction(record.id));
        }
        records.insert(record.id, record);
        Ok(())
    }

    async fn get(&self, id: TransactionId) -> Result<Option<TransactionRecord>> {
        let records = self.records.read().await;
        Ok(records.get(&id).cloned())
    }

    async fn update(&self, id: TransactionId, mutate: Mutator) -> Result<TransactionRecord> {
        let mut records = self.records.write().await;
        let record = records.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        mutate(record);
        Ok(record.clone())
    }

    async fn create_idempotent(&self, record: TransactionRecord) -> Result<TransactionRecord> {
        let mut records = self.records.write().await;
        if let Some(ref key) = record.idempotency_key
            && let Some(existing) = records
                .values()
                .find(|r| r.idempotency_key.as_deref() == Some(key))
        {
            return Ok(existing.clone());
        }
        if records.contains_key(&record.id) {
            return Err(StoreError::DuplicateTransaction(record.id));
        }
        records.insert(record.id, record.clone());
        Ok(record)
    }

    async fn list_by_account(
        &self,
        account_id: &AccountId,
        page: Page,
    ) -> Result<Vec<TransactionRecord>> {
        let records = self.records.read().await;
        let mut matching: Vec<_> = records
            .values()
            .filter(|r| r.touches(account_id))
            .cloned()
            .collect();

        // Newest first; tie-break on ID for a stable order
        matching.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then(b.id.as_uuid().cmp(&a.id.as_uuid()))
        });

        Ok(matching
            .into_iter()
            .skip(page.offset)
            .take(page.limit)
            .collect())
    }

}
