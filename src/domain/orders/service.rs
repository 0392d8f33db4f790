use std::sync::Arc;

use uuid::Uuid;

use super::errors::OrderError;
use super::events::PurchaseOrderReceived;
use super::model::PurchaseOrder;
use crate::messaging::{Delivery, EventEnvelope, MessageBus};
use crate::store::RecordStore;

// ============================================================================
// Order Service
// ============================================================================
//
// Producer side of the fulfillment workflow:
//   reject duplicates -> persist order -> publish PurchaseOrderReceived
//
// Each accepted order starts a new workflow with its own correlation id.
//
// ============================================================================

/// An order that was stored and handed to the bus
#[derive(Debug)]
pub struct OrderAccepted {
    pub order: PurchaseOrder,
    pub correlation_id: Uuid,
    pub delivery: Delivery,
}

pub struct OrderService {
    store: Arc<dyn RecordStore<PurchaseOrder>>,
    bus: Arc<dyn MessageBus>,
}

impl OrderService {
    pub fn new(store: Arc<dyn RecordStore<PurchaseOrder>>, bus: Arc<dyn MessageBus>) -> Self {
        Self { store, bus }
    }

    pub async fn create(&self, order: PurchaseOrder) -> Result<OrderAccepted, OrderError> {
        if order.id.trim().is_empty() {
            return Err(OrderError::Invalid("order id must not be empty".to_string()));
        }
        if order.subtotal().is_none() {
            return Err(OrderError::Invalid(format!("order '{}' total is out of range", order.id)));
        }

        let mut session = self.store.session();
        if session.find_by_id(&order.id).await?.is_some() {
            tracing::warn!(order_id = %order.id, "Order already exists");
            return Err(OrderError::Conflict(order.id));
        }

        session.add(order.clone()).await?;
        session.commit().await?;

        let envelope = EventEnvelope::begin_workflow(PurchaseOrderReceived::from(&order));
        let correlation_id = envelope.correlation_id;

        tracing::info!(
            order_id = %order.id,
            lines = order.books_ordered.len(),
            correlation_id = %correlation_id,
            "✅ Order stored, publishing PurchaseOrderReceived"
        );

        let delivery = self.bus.publish(envelope).await?;

        if let Delivery::Dispatched(report) = &delivery {
            for failed in report.failures() {
                tracing::warn!(
                    order_id = %order.id,
                    handler = %failed.handler,
                    "Order accepted but a subscriber failed"
                );
            }
        }

        Ok(OrderAccepted {
            order,
            correlation_id,
            delivery,
        })
    }

    pub async fn list(&self) -> Result<Vec<PurchaseOrder>, OrderError> {
        Ok(self.store.session().list().await?)
    }

    pub async fn get(&self, id: &str) -> Result<PurchaseOrder, OrderError> {
        self.store
            .session()
            .find_by_id(id)
            .await?
            .ok_or_else(|| OrderError::NotFound(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::orders::BookOrder;
    use crate::domain::shipping::{ShippingHandler, ShippingManifest, ShippingRate};
    use crate::messaging::testing::{Flaky, Log, Recording};
    use crate::messaging::{
        BusError, EventEnvelope, EventHandler, EventKind, FailurePolicy, HandlerError, HandlerRegistry,
        InProcessBus,
    };
    use crate::store::InMemoryStore;
    use async_trait::async_trait;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::sync::Mutex;

    /// Keeps every envelope it sees
    #[derive(Clone, Default)]
    struct Capture(Arc<Mutex<Vec<EventEnvelope>>>);

    #[async_trait]
    impl EventHandler for Capture {
        fn name(&self) -> &str {
            "capture"
        }

        async fn handle(&self, envelope: &EventEnvelope) -> Result<Vec<EventEnvelope>, HandlerError> {
            self.0.lock().unwrap().push(envelope.clone());
            Ok(vec![])
        }
    }

    fn po1() -> PurchaseOrder {
        PurchaseOrder::new(
            "PO1",
            vec![BookOrder::new("B1", dec!(10.00)), BookOrder::new("B2", dec!(5.00))],
        )
    }

    fn service(registry: HandlerRegistry, policy: FailurePolicy) -> (InMemoryStore<PurchaseOrder>, OrderService) {
        let store: InMemoryStore<PurchaseOrder> = InMemoryStore::new("orders");
        let bus = InProcessBus::new(registry, policy);
        (store.clone(), OrderService::new(Arc::new(store), Arc::new(bus)))
    }

    #[tokio::test]
    async fn test_create_persists_and_publishes() {
        let log = Log::default();
        let mut registry = HandlerRegistry::new();
        registry.register_handler(
            EventKind::PurchaseOrderReceived,
            Arc::new(Recording { name: "shipping", log: log.clone() }),
        );
        let (store, service) = service(registry, FailurePolicy::Isolate);

        let accepted = service.create(po1()).await.unwrap();

        assert_eq!(accepted.order.id, "PO1");
        assert!(matches!(accepted.delivery, Delivery::Dispatched(ref r) if r.invoked() == 1));
        assert!(store.session().find_by_id("PO1").await.unwrap().is_some());
        assert_eq!(log.entries(), vec!["shipping:PurchaseOrderReceived"]);
    }

    #[tokio::test]
    async fn test_duplicate_order_conflicts_without_dispatch() {
        let log = Log::default();
        let mut registry = HandlerRegistry::new();
        registry.register_handler(
            EventKind::PurchaseOrderReceived,
            Arc::new(Recording { name: "shipping", log: log.clone() }),
        );
        let (_, service) = service(registry, FailurePolicy::Isolate);

        service.create(po1()).await.unwrap();
        let err = service.create(po1()).await.unwrap_err();

        assert!(matches!(err, OrderError::Conflict(ref id) if id == "PO1"));
        assert_eq!(log.entries().len(), 1);
    }

    #[tokio::test]
    async fn test_shipped_event_keeps_order_correlation() {
        let capture = Capture::default();
        let manifests: InMemoryStore<ShippingManifest> = InMemoryStore::new("shipping");
        let mut registry = HandlerRegistry::new();
        registry
            .register_handler(
                EventKind::PurchaseOrderReceived,
                Arc::new(ShippingHandler::new(Arc::new(manifests), ShippingRate::default())),
            )
            .register_handler(EventKind::PurchaseOrderReceived, Arc::new(capture.clone()))
            .register_handler(EventKind::OrderShipped, Arc::new(capture.clone()));
        let (_, service) = service(registry, FailurePolicy::Isolate);

        let accepted = service.create(po1()).await.unwrap();

        let seen = capture.0.lock().unwrap().clone();
        let kinds: Vec<_> = seen.iter().map(|e| e.kind()).collect();
        assert_eq!(kinds, vec![EventKind::OrderShipped, EventKind::PurchaseOrderReceived]);
        assert!(seen.iter().all(|e| e.correlation_id == accepted.correlation_id));
        assert_eq!(seen[0].causation_id, Some(seen[1].event_id));
    }

    #[tokio::test]
    async fn test_propagate_surfaces_subscriber_failure() {
        let log = Log::default();
        let mut registry = HandlerRegistry::new();
        registry.register_handler(
            EventKind::PurchaseOrderReceived,
            Arc::new(Flaky::always("shipping", log.clone(), true)),
        );
        let (store, service) = service(registry, FailurePolicy::Propagate);

        let err = service.create(po1()).await.unwrap_err();

        assert!(matches!(err, OrderError::Dispatch(BusError::HandlerFailed { .. })));
        // Nothing compensates: the order stays stored
        assert!(store.session().find_by_id("PO1").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_isolate_accepts_order_despite_subscriber_failure() {
        let log = Log::default();
        let mut registry = HandlerRegistry::new();
        registry.register_handler(
            EventKind::PurchaseOrderReceived,
            Arc::new(Flaky::always("shipping", log.clone(), true)),
        );
        let (_, service) = service(registry, FailurePolicy::Isolate);

        let accepted = service.create(po1()).await.unwrap();

        assert!(matches!(accepted.delivery, Delivery::Dispatched(ref r) if r.has_failures()));
    }

    #[tokio::test]
    async fn test_overflowing_prices_are_rejected_before_storing() {
        let log = Log::default();
        let mut registry = HandlerRegistry::new();
        registry.register_handler(
            EventKind::PurchaseOrderReceived,
            Arc::new(Recording { name: "shipping", log: log.clone() }),
        );
        let (store, service) = service(registry, FailurePolicy::Isolate);
        let huge = PurchaseOrder::new(
            "PO1",
            vec![BookOrder::new("B1", Decimal::MAX), BookOrder::new("B2", Decimal::MAX)],
        );

        let err = service.create(huge).await.unwrap_err();

        assert!(matches!(err, OrderError::Invalid(_)));
        assert!(store.session().find_by_id("PO1").await.unwrap().is_none());
        assert!(log.entries().is_empty());
    }

    #[tokio::test]
    async fn test_get_unknown_order_is_not_found() {
        let (_, service) = service(HandlerRegistry::new(), FailurePolicy::Isolate);

        assert!(matches!(service.get("nope").await, Err(OrderError::NotFound(_))));
        assert!(matches!(
            service.create(PurchaseOrder::new(" ", vec![])).await,
            Err(OrderError::Invalid(_))
        ));
    }
}
