use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;

use super::commands::CancelShipment;
use super::events::OrderShipped;
use super::model::ShippingManifest;
use crate::messaging::{
    Command, CommandEnvelope, CommandHandler, Event, EventEnvelope, EventHandler, HandlerError,
};
use crate::store::RecordStore;

// ============================================================================
// Shipping Handlers
// ============================================================================
//
// PurchaseOrderReceived -> store a ShippingManifest -> emit OrderShipped
//
// The manifest is keyed by "SP" + the triggering event id, so redelivering
// the same event conflicts instead of shipping twice.
//
// ============================================================================

/// Shipping cost as a fraction of the order subtotal
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShippingRate {
    surcharge: Decimal,
}

impl ShippingRate {
    pub fn from_percent(percent: u32) -> Self {
        Self {
            surcharge: Decimal::from(percent) / Decimal::from(100),
        }
    }

    pub fn surcharge(&self) -> Decimal {
        self.surcharge
    }

    /// Shipping cost for `subtotal`; `None` on overflow
    pub fn quote(&self, subtotal: Decimal) -> Option<Decimal> {
        subtotal.checked_mul(self.surcharge)
    }
}

impl Default for ShippingRate {
    fn default() -> Self {
        Self::from_percent(20)
    }
}

pub struct ShippingHandler {
    store: Arc<dyn RecordStore<ShippingManifest>>,
    rate: ShippingRate,
}

impl ShippingHandler {
    pub const NAME: &'static str = "shipping.purchase_order_received";

    pub fn new(store: Arc<dyn RecordStore<ShippingManifest>>, rate: ShippingRate) -> Self {
        Self { store, rate }
    }
}

#[async_trait]
impl EventHandler for ShippingHandler {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn handle(&self, envelope: &EventEnvelope) -> Result<Vec<EventEnvelope>, HandlerError> {
        let Event::PurchaseOrderReceived(order) = &envelope.event else {
            return Err(HandlerError::Unexpected(envelope.kind().to_string()));
        };

        let priced = order.subtotal().and_then(|subtotal| {
            let shipping_cost = self.rate.quote(subtotal)?;
            Some((shipping_cost, subtotal.checked_add(shipping_cost)?))
        });
        let Some((shipping_cost, order_total)) = priced else {
            return Err(HandlerError::Failed(format!(
                "order '{}' total is out of range",
                order.purchase_order_reference
            )));
        };
        let item_ids: Vec<String> = order.books_ordered.iter().map(|line| line.book_id.clone()).collect();

        let manifest = ShippingManifest {
            shipping_reference: format!("SP{}", envelope.event_id),
            book_ids: item_ids.join(", "),
            shipping_cost,
        };

        let mut session = self.store.session();
        session.add(manifest.clone()).await?;
        session.commit().await?;

        tracing::info!(
            purchase_order = %order.purchase_order_reference,
            shipping_reference = %manifest.shipping_reference,
            shipping_cost = %shipping_cost,
            "📦 Shipping manifest stored"
        );

        Ok(vec![envelope.follow_up(OrderShipped {
            shipping_reference: manifest.shipping_reference,
            item_ids,
            shipping_cost,
            order_total,
        })])
    }
}

/// Removes a stored manifest. Emits nothing.
pub struct CancelShipmentHandler {
    store: Arc<dyn RecordStore<ShippingManifest>>,
}

impl CancelShipmentHandler {
    pub const NAME: &'static str = "shipping.cancel_shipment";

    pub fn new(store: Arc<dyn RecordStore<ShippingManifest>>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl CommandHandler for CancelShipmentHandler {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn handle(&self, envelope: &CommandEnvelope) -> Result<Vec<EventEnvelope>, HandlerError> {
        let Command::CancelShipment(CancelShipment { shipping_reference, reason }) = &envelope.command;

        let mut session = self.store.session();
        if session.find_by_id(shipping_reference).await?.is_none() {
            return Err(HandlerError::NotFound(format!("manifest '{}'", shipping_reference)));
        }

        session.remove(shipping_reference).await?;
        session.commit().await?;

        tracing::info!(
            shipping_reference = %shipping_reference,
            reason = reason.as_deref().unwrap_or("none"),
            "Shipment cancelled"
        );
        Ok(vec![])
    }
}
