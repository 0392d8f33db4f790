use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::domain::orders::PurchaseOrderReceived;
use crate::domain::shipping::{CancelShipment, OrderShipped};

// ============================================================================
// Message Model
// ============================================================================
//
// Every message the bus can carry is listed here. Adding a variant forces
// every `match` on the kind tags (including the handler table) to be
// updated, so a new message cannot silently miss its registration slot.
//
// ============================================================================

/// Facts broadcast to zero or more subscribers
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "type", content = "data")]
pub enum Event {
    PurchaseOrderReceived(PurchaseOrderReceived),
    OrderShipped(OrderShipped),
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    PurchaseOrderReceived,
    OrderShipped,
}

/// Requests addressed to exactly one handler
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "type", content = "data")]
pub enum Command {
    CancelShipment(CancelShipment),
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CommandKind {
    CancelShipment,
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::PurchaseOrderReceived(_) => EventKind::PurchaseOrderReceived,
            Event::OrderShipped(_) => EventKind::OrderShipped,
        }
    }
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::PurchaseOrderReceived => "PurchaseOrderReceived",
            EventKind::OrderShipped => "OrderShipped",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Command {
    pub fn kind(&self) -> CommandKind {
        match self {
            Command::CancelShipment(_) => CommandKind::CancelShipment,
        }
    }
}

impl CommandKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandKind::CancelShipment => "CancelShipment",
        }
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<PurchaseOrderReceived> for Event {
    fn from(event: PurchaseOrderReceived) -> Self {
        Event::PurchaseOrderReceived(event)
    }
}

impl From<OrderShipped> for Event {
    fn from(event: OrderShipped) -> Self {
        Event::OrderShipped(event)
    }
}

impl From<CancelShipment> for Command {
    fn from(command: CancelShipment) -> Self {
        Command::CancelShipment(command)
    }
}

// ============================================================================
// Envelopes
// ============================================================================

/// An event plus its identity and workflow metadata
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct EventEnvelope {
    pub event_id: Uuid,
    /// Shared by every event of one workflow instance
    pub correlation_id: Uuid,
    /// The event that directly caused this one; `None` for workflow roots
    pub causation_id: Option<Uuid>,
    pub occurred_at: DateTime<Utc>,
    pub event: Event,
}

impl EventEnvelope {
    pub fn new(correlation_id: Uuid, event: impl Into<Event>) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            correlation_id,
            causation_id: None,
            occurred_at: Utc::now(),
            event: event.into(),
        }
    }

    /// Root event of a new workflow instance
    pub fn begin_workflow(event: impl Into<Event>) -> Self {
        Self::new(Uuid::new_v4(), event)
    }

    /// Event emitted in reaction to `self`; keeps the correlation id
    pub fn follow_up(&self, event: impl Into<Event>) -> Self {
        Self {
            causation_id: Some(self.event_id),
            ..Self::new(self.correlation_id, event)
        }
    }

    pub fn kind(&self) -> EventKind {
        self.event.kind()
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct CommandEnvelope {
    pub command_id: Uuid,
    pub correlation_id: Uuid,
    pub issued_at: DateTime<Utc>,
    pub command: Command,
}

impl CommandEnvelope {
    pub fn new(correlation_id: Uuid, command: impl Into<Command>) -> Self {
        Self {
            command_id: Uuid::new_v4(),
            correlation_id,
            issued_at: Utc::now(),
            command: command.into(),
        }
    }

    pub fn kind(&self) -> CommandKind {
        self.command.kind()
    }

    /// Event emitted while handling this command; keeps the correlation id
    pub fn follow_up(&self, event: impl Into<Event>) -> EventEnvelope {
        EventEnvelope {
            causation_id: Some(self.command_id),
            ..EventEnvelope::new(self.correlation_id, event)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::orders::OrderedBook;
    use rust_decimal_macros::dec;

    fn received() -> PurchaseOrderReceived {
        PurchaseOrderReceived {
            purchase_order_reference: "PO1".to_string(),
            books_ordered: vec![OrderedBook {
                book_id: "B1".to_string(),
                unit_price: dec!(10.00),
            }],
        }
    }

    #[test]
    fn test_follow_up_keeps_correlation_and_records_cause() {
        let root = EventEnvelope::begin_workflow(received());
        let next = root.follow_up(OrderShipped {
            shipping_reference: "SP1".to_string(),
            item_ids: vec!["B1".to_string()],
            shipping_cost: dec!(2.00),
            order_total: dec!(12.00),
        });

        assert_eq!(next.correlation_id, root.correlation_id);
        assert_eq!(next.causation_id, Some(root.event_id));
        assert_ne!(next.event_id, root.event_id);
        assert_eq!(next.kind(), EventKind::OrderShipped);
    }

    #[test]
    fn test_each_workflow_gets_its_own_correlation() {
        let a = EventEnvelope::begin_workflow(received());
        let b = EventEnvelope::begin_workflow(received());

        assert_ne!(a.correlation_id, b.correlation_id);
        assert!(a.causation_id.is_none());
    }

    #[test]
    fn test_event_serializes_with_type_tag() {
        let json = serde_json::to_value(Event::from(received())).unwrap();

        assert_eq!(json["type"], "PurchaseOrderReceived");
        assert_eq!(json["data"]["purchaseOrderReference"], "PO1");
    }

    #[test]
    fn test_kind_names_match_variants() {
        for kind in [EventKind::PurchaseOrderReceived, EventKind::OrderShipped] {
            assert_eq!(kind.to_string(), format!("{:?}", kind));
        }
    }
}
