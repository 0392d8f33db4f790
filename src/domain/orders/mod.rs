// ============================================================================
// Orders Context
// ============================================================================
//
// Accepts purchase orders and announces them on the bus. Knows nothing of
// the contexts that react to them.
//
// ============================================================================

mod errors;
mod events;
mod model;
mod service;

pub use errors::OrderError;
pub use events::{OrderedBook, PurchaseOrderReceived};
pub use model::{BookOrder, PurchaseOrder};
pub use service::{OrderAccepted, OrderService};
