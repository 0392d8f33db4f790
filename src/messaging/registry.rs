use std::sync::Arc;

use super::error::BusError;
use super::handler::{CommandHandler, EventHandler};
use super::message::{CommandKind, EventKind};

pub type SharedEventHandler = Arc<dyn EventHandler>;
pub type SharedCommandHandler = Arc<dyn CommandHandler>;

// ============================================================================
// Handler Registry
// ============================================================================
//
// Built once at the composition root and then moved into a bus. After that
// it is only read, so every registration happens-before every publish.
//
// ============================================================================

/// One slot per event kind
#[derive(Default)]
struct EventSlots {
    purchase_order_received: Vec<SharedEventHandler>,
    order_shipped: Vec<SharedEventHandler>,
}

impl EventSlots {
    fn slot(&self, kind: EventKind) -> &[SharedEventHandler] {
        match kind {
            EventKind::PurchaseOrderReceived => &self.purchase_order_received,
            EventKind::OrderShipped => &self.order_shipped,
        }
    }

    fn slot_mut(&mut self, kind: EventKind) -> &mut Vec<SharedEventHandler> {
        match kind {
            EventKind::PurchaseOrderReceived => &mut self.purchase_order_received,
            EventKind::OrderShipped => &mut self.order_shipped,
        }
    }
}

#[derive(Default)]
struct CommandSlots {
    cancel_shipment: Option<SharedCommandHandler>,
}

impl CommandSlots {
    fn slot(&self, kind: CommandKind) -> Option<&SharedCommandHandler> {
        match kind {
            CommandKind::CancelShipment => self.cancel_shipment.as_ref(),
        }
    }

    fn slot_mut(&mut self, kind: CommandKind) -> &mut Option<SharedCommandHandler> {
        match kind {
            CommandKind::CancelShipment => &mut self.cancel_shipment,
        }
    }
}

#[derive(Default)]
pub struct HandlerRegistry {
    events: EventSlots,
    catch_all: Vec<SharedEventHandler>,
    commands: CommandSlots,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a handler for one event kind. Handlers run in registration order.
    pub fn register_handler(&mut self, kind: EventKind, handler: SharedEventHandler) -> &mut Self {
        tracing::debug!(event_kind = %kind, handler = handler.name(), "Registered event handler");
        self.events.slot_mut(kind).push(handler);
        self
    }

    /// Register against the generic event base. Catch-all handlers only see
    /// events whose own kind has no handler.
    pub fn register_catch_all(&mut self, handler: SharedEventHandler) -> &mut Self {
        tracing::debug!(handler = handler.name(), "Registered catch-all handler");
        self.catch_all.push(handler);
        self
    }

    pub fn register_command_handler(
        &mut self,
        kind: CommandKind,
        handler: SharedCommandHandler,
    ) -> Result<&mut Self, BusError> {
        let slot = self.commands.slot_mut(kind);
        if let Some(existing) = slot {
            return Err(BusError::DuplicateCommandHandler {
                kind,
                existing: existing.name().to_string(),
            });
        }

        tracing::debug!(command_kind = %kind, handler = handler.name(), "Registered command handler");
        *slot = Some(handler);
        Ok(self)
    }

    /// Handlers for `kind`, falling back to the catch-all list
    pub fn handlers_for(&self, kind: EventKind) -> &[SharedEventHandler] {
        let exact = self.events.slot(kind);
        if exact.is_empty() {
            &self.catch_all
        } else {
            exact
        }
    }

    pub fn command_handler(&self, kind: CommandKind) -> Option<&SharedCommandHandler> {
        self.commands.slot(kind)
    }
}
