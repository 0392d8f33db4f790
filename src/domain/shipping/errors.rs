use crate::messaging::BusError;
use crate::store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum ShippingError {
    #[error("Shipping manifest '{0}' not found")]
    NotFound(String),

    #[error("Shipment could not be cancelled: {0}")]
    Rejected(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Dispatch(#[from] BusError),
}
