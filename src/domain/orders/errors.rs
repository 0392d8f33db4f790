use crate::messaging::BusError;
use crate::store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    #[error("Order '{0}' already exists")]
    Conflict(String),

    #[error("Order '{0}' not found")]
    NotFound(String),

    #[error("Invalid order: {0}")]
    Invalid(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    /// A subscriber failed while the order-received event was dispatched
    #[error("Order was stored but fulfillment failed: {0}")]
    Dispatch(#[from] BusError),
}
