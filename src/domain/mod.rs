// ============================================================================
// Domain Layer - Bounded Contexts
// ============================================================================
//
// Each context owns its records, its store and its events:
// - books:    catalogue CRUD and patching
// - orders:   accepts purchase orders, publishes PurchaseOrderReceived
// - shipping: reacts to received orders, publishes OrderShipped
//
// Contexts talk to each other only through the message bus.
//
// ============================================================================

pub mod books;
pub mod orders;
pub mod shipping;
