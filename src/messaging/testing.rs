//! Handlers shared by the bus tests.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rust_decimal_macros::dec;
use uuid::Uuid;

use super::handler::{CommandHandler, EventHandler, HandlerError};
use super::message::{CommandEnvelope, EventEnvelope, EventKind};
use crate::domain::orders::{OrderedBook, PurchaseOrderReceived};
use crate::domain::shipping::OrderShipped;

/// Invocation log shared between handlers, as `"<handler>:<kind>"`
#[derive(Clone, Default)]
pub(crate) struct Log(Arc<Mutex<Vec<String>>>);

impl Log {
    pub(crate) fn record(&self, handler: &str, kind: impl std::fmt::Display) {
        self.0.lock().unwrap().push(format!("{}:{}", handler, kind));
    }

    pub(crate) fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

pub(crate) fn order_received() -> EventEnvelope {
    EventEnvelope::begin_workflow(PurchaseOrderReceived {
        purchase_order_reference: "PO1".to_string(),
        books_ordered: vec![
            OrderedBook {
                book_id: "B1".to_string(),
                unit_price: dec!(10.00),
            },
            OrderedBook {
                book_id: "B2".to_string(),
                unit_price: dec!(5.00),
            },
        ],
    })
}

pub(crate) fn order_shipped() -> OrderShipped {
    OrderShipped {
        shipping_reference: "SP1".to_string(),
        item_ids: vec!["B1".to_string(), "B2".to_string()],
        shipping_cost: dec!(3.00),
        order_total: dec!(18.00),
    }
}

/// Succeeds and emits nothing
pub(crate) struct Recording {
    pub name: &'static str,
    pub log: Log,
}

#[async_trait]
impl EventHandler for Recording {
    fn name(&self) -> &str {
        self.name
    }

    async fn handle(&self, envelope: &EventEnvelope) -> Result<Vec<EventEnvelope>, HandlerError> {
        self.log.record(self.name, envelope.kind());
        Ok(vec![])
    }
}

/// Answers an order-received event with an order-shipped follow-up
pub(crate) struct Shipper {
    pub log: Log,
    /// Emit the follow-up under a fresh correlation id
    pub break_correlation: bool,
}

#[async_trait]
impl EventHandler for Shipper {
    fn name(&self) -> &str {
        "shipper"
    }

    async fn handle(&self, envelope: &EventEnvelope) -> Result<Vec<EventEnvelope>, HandlerError> {
        self.log.record("shipper", envelope.kind());
        if envelope.kind() != EventKind::PurchaseOrderReceived {
            return Err(HandlerError::Unexpected(envelope.kind().to_string()));
        }

        let mut shipped = envelope.follow_up(order_shipped());
        if self.break_correlation {
            shipped.correlation_id = Uuid::new_v4();
        }
        Ok(vec![shipped])
    }
}

/// Fails `failures` times, then succeeds
pub(crate) struct Flaky {
    pub name: &'static str,
    pub log: Log,
    pub transient: bool,
    failures_left: AtomicU32,
}

impl Flaky {
    pub(crate) fn new(name: &'static str, log: Log, failures: u32, transient: bool) -> Self {
        Self {
            name,
            log,
            transient,
            failures_left: AtomicU32::new(failures),
        }
    }

    pub(crate) fn always(name: &'static str, log: Log, transient: bool) -> Self {
        Self::new(name, log, u32::MAX, transient)
    }
}

#[async_trait]
impl EventHandler for Flaky {
    fn name(&self) -> &str {
        self.name
    }

    async fn handle(&self, envelope: &EventEnvelope) -> Result<Vec<EventEnvelope>, HandlerError> {
        self.log.record(self.name, envelope.kind());

        let failing = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();

        match (failing, self.transient) {
            (false, _) => Ok(vec![]),
            (true, true) => Err(HandlerError::Transient("store unavailable".to_string())),
            (true, false) => Err(HandlerError::Failed("invalid manifest".to_string())),
        }
    }
}

/// Command handler that confirms with an order-shipped event
pub(crate) struct Canceller {
    pub log: Log,
}

#[async_trait]
impl CommandHandler for Canceller {
    fn name(&self) -> &str {
        "canceller"
    }

    async fn handle(&self, envelope: &CommandEnvelope) -> Result<Vec<EventEnvelope>, HandlerError> {
        self.log.record("canceller", envelope.kind());
        Ok(vec![envelope.follow_up(order_shipped())])
    }
}
