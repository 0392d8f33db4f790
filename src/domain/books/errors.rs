use super::patch::PatchError;
use crate::store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum BookError {
    #[error("Book '{0}' already exists")]
    Conflict(String),

    #[error("Book '{0}' not found")]
    NotFound(String),

    #[error("Invalid book request: {0}")]
    Invalid(String),

    #[error("Patch rejected: {0}")]
    Patch(#[from] PatchError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
