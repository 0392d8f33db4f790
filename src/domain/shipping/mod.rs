// ============================================================================
// Shipping Context
// ============================================================================
//
// Reacts to received orders on the bus. Owns its own manifest store and
// never reads order records directly.
//
// ============================================================================

mod commands;
mod errors;
mod events;
mod handler;
mod model;
mod service;

pub use commands::CancelShipment;
pub use errors::ShippingError;
pub use events::OrderShipped;
pub use handler::{CancelShipmentHandler, ShippingHandler, ShippingRate};
pub use model::ShippingManifest;
pub use service::ShippingService;
