// ============================================================================
// Record Stores
// ============================================================================
//
// Each bounded context owns its own store. A store hands out sessions; a
// session stages `add`/`remove` calls and applies them atomically on
// `commit`. Reads always see committed state only.
//
// ============================================================================

mod memory;

use async_trait::async_trait;

pub use memory::InMemoryStore;

/// A persisted record with a unique string key
pub trait Record: Clone + Send + Sync + 'static {
    fn key(&self) -> &str;
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StoreError {
    #[error("record '{0}' already exists")]
    Conflict(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Unit of work over one store
#[async_trait]
pub trait Repository<T: Record>: Send + Sync {
    /// Stage a new record; duplicates are rejected on commit
    async fn add(&mut self, record: T) -> Result<(), StoreError>;

    /// Stage removal of a record; removing a missing key is a no-op on commit
    async fn remove(&mut self, key: &str) -> Result<(), StoreError>;

    async fn find_by_id(&self, key: &str) -> Result<Option<T>, StoreError>;

    async fn list(&self) -> Result<Vec<T>, StoreError>;

    /// Apply staged changes in order. Returns the number of changes applied.
    async fn commit(&mut self) -> Result<usize, StoreError>;
}

pub trait RecordStore<T: Record>: Send + Sync {
    fn session(&self) -> Box<dyn Repository<T>>;
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// Reads come back empty and every commit fails as unavailable
    pub(crate) struct UnavailableStore;

    struct UnavailableSession;

    impl<T: Record> RecordStore<T> for UnavailableStore {
        fn session(&self) -> Box<dyn Repository<T>> {
            Box::new(UnavailableSession)
        }
    }

    #[async_trait]
    impl<T: Record> Repository<T> for UnavailableSession {
        async fn add(&mut self, _record: T) -> Result<(), StoreError> {
            Ok(())
        }

        async fn remove(&mut self, _key: &str) -> Result<(), StoreError> {
            Ok(())
        }

        async fn find_by_id(&self, _key: &str) -> Result<Option<T>, StoreError> {
            Ok(None)
        }

        async fn list(&self) -> Result<Vec<T>, StoreError> {
            Ok(Vec::new())
        }

        async fn commit(&mut self) -> Result<usize, StoreError> {
            Err(StoreError::Unavailable("store offline".to_string()))
        }
    }
}
