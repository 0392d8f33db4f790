use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{Record, RecordStore, Repository, StoreError};

/// Process-local store. Cloning shares the same records.
pub struct InMemoryStore<T: Record> {
    name: &'static str,
    records: Arc<RwLock<BTreeMap<String, T>>>,
}

impl<T: Record> Clone for InMemoryStore<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            records: self.records.clone(),
        }
    }
}

impl<T: Record> InMemoryStore<T> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            records: Arc::new(RwLock::new(BTreeMap::new())),
        }
    }
}

impl<T: Record> RecordStore<T> for InMemoryStore<T> {
    fn session(&self) -> Box<dyn Repository<T>> {
        Box::new(InMemorySession {
            store: self.clone(),
            pending: Vec::new(),
        })
    }
}

enum Change<T> {
    Add(T),
    Remove(String),
}

struct InMemorySession<T: Record> {
    store: InMemoryStore<T>,
    pending: Vec<Change<T>>,
}

#[async_trait]
impl<T: Record> Repository<T> for InMemorySession<T> {
    async fn add(&mut self, record: T) -> Result<(), StoreError> {
        self.pending.push(Change::Add(record));
        Ok(())
    }

    async fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.pending.push(Change::Remove(key.to_string()));
        Ok(())
    }

    async fn find_by_id(&self, key: &str) -> Result<Option<T>, StoreError> {
        Ok(self.store.records.read().await.get(key).cloned())
    }

    async fn list(&self) -> Result<Vec<T>, StoreError> {
        Ok(self.store.records.read().await.values().cloned().collect())
    }

    async fn commit(&mut self) -> Result<usize, StoreError> {
        let changes = std::mem::take(&mut self.pending);
        if changes.is_empty() {
            return Ok(0);
        }

        let mut records = self.store.records.write().await;
        let mut next = records.clone();
        let mut applied = 0;

        for change in changes {
            match change {
                Change::Add(record) => {
                    let key = record.key().to_string();
                    if next.contains_key(&key) {
                        tracing::warn!(store = self.store.name, key = %key, "Commit rejected: duplicate key");
                        return Err(StoreError::Conflict(key));
                    }
                    next.insert(key, record);
                    applied += 1;
                }
                Change::Remove(key) => {
                    if next.remove(&key).is_some() {
                        applied += 1;
                    }
                }
            }
        }

        *records = next;

        tracing::debug!(store = self.store.name, applied = applied, "Committed staged changes");
        Ok(applied)
    }
}
