use std::sync::Arc;

use uuid::Uuid;

use super::commands::CancelShipment;
use super::errors::ShippingError;
use super::model::ShippingManifest;
use crate::messaging::{BusError, CommandEnvelope, Delivery, HandlerError, MessageBus};
use crate::store::RecordStore;

/// Read side of the shipping context plus shipment cancellation
pub struct ShippingService {
    store: Arc<dyn RecordStore<ShippingManifest>>,
    bus: Arc<dyn MessageBus>,
}

impl ShippingService {
    pub fn new(store: Arc<dyn RecordStore<ShippingManifest>>, bus: Arc<dyn MessageBus>) -> Self {
        Self { store, bus }
    }

    pub async fn list(&self) -> Result<Vec<ShippingManifest>, ShippingError> {
        Ok(self.store.session().list().await?)
    }

    pub async fn get(&self, reference: &str) -> Result<ShippingManifest, ShippingError> {
        self.store
            .session()
            .find_by_id(reference)
            .await?
            .ok_or_else(|| ShippingError::NotFound(reference.to_string()))
    }

    /// Ask the shipping context to cancel a manifest.
    ///
    /// Runs as a command on the bus, so on the queued transport the removal
    /// happens after this returns.
    pub async fn cancel(&self, reference: &str, reason: Option<String>) -> Result<Delivery, ShippingError> {
        self.get(reference).await?;

        let command = CommandEnvelope::new(
            Uuid::new_v4(),
            CancelShipment {
                shipping_reference: reference.to_string(),
                reason,
            },
        );
        // The manifest can vanish between the lookup above and the handler
        let delivery = match self.bus.send(command).await {
            Err(BusError::HandlerFailed {
                source: HandlerError::NotFound(_),
                ..
            }) => return Err(ShippingError::NotFound(reference.to_string())),
            other => other?,
        };

        if let Delivery::Dispatched(report) = &delivery {
            match report.failures().next().and_then(|o| o.error()) {
                Some(HandlerError::NotFound(_)) => return Err(ShippingError::NotFound(reference.to_string())),
                Some(failed) => return Err(ShippingError::Rejected(failed.to_string())),
                None => {}
            }
        }

        Ok(delivery)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::shipping::CancelShipmentHandler;
    use crate::messaging::{CommandKind, FailurePolicy, HandlerRegistry, InProcessBus};
    use crate::store::InMemoryStore;
    use rust_decimal_macros::dec;

    async fn seeded() -> (InMemoryStore<ShippingManifest>, ShippingService) {
        let store: InMemoryStore<ShippingManifest> = InMemoryStore::new("shipping");
        let mut session = store.session();
        session
            .add(ShippingManifest {
                shipping_reference: "SP1".to_string(),
                book_ids: "B1, B2".to_string(),
                shipping_cost: dec!(3.00),
            })
            .await
            .unwrap();
        session.commit().await.unwrap();

        let mut registry = HandlerRegistry::new();
        registry
            .register_command_handler(
                CommandKind::CancelShipment,
                Arc::new(CancelShipmentHandler::new(Arc::new(store.clone()))),
            )
            .unwrap();
        let bus = InProcessBus::new(registry, FailurePolicy::Isolate);

        (store.clone(), ShippingService::new(Arc::new(store), Arc::new(bus)))
    }

    #[tokio::test]
    async fn test_list_and_get() {
        let (_, service) = seeded().await;

        assert_eq!(service.list().await.unwrap().len(), 1);
        assert_eq!(service.get("SP1").await.unwrap().book_ids, "B1, B2");
        assert!(matches!(service.get("SP9").await, Err(ShippingError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_cancel_removes_manifest_through_the_bus() {
        let (store, service) = seeded().await;

        let delivery = service.cancel("SP1", None).await.unwrap();

        assert!(matches!(delivery, Delivery::Dispatched(ref report) if report.invoked() == 1));
        assert!(store.session().list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cancel_unknown_manifest_is_not_found() {
        let (_, service) = seeded().await;

        assert!(matches!(service.cancel("SP9", None).await, Err(ShippingError::NotFound(_))));
    }

    /// Cancel handler sees an empty store, as if another request removed the manifest first
    fn racing(policy: FailurePolicy) -> ShippingService {
        let listed: InMemoryStore<ShippingManifest> = InMemoryStore::new("shipping");
        let handled: InMemoryStore<ShippingManifest> = InMemoryStore::new("shipping");

        let mut registry = HandlerRegistry::new();
        registry
            .register_command_handler(
                CommandKind::CancelShipment,
                Arc::new(CancelShipmentHandler::new(Arc::new(handled))),
            )
            .unwrap();

        ShippingService::new(Arc::new(listed), Arc::new(InProcessBus::new(registry, policy)))
    }

    #[tokio::test]
    async fn test_manifest_removed_before_handler_runs_is_not_found() {
        for policy in [FailurePolicy::Isolate, FailurePolicy::Propagate] {
            let service = racing(policy);
            let mut session = service.store.session();
            session
                .add(ShippingManifest {
                    shipping_reference: "SP1".to_string(),
                    book_ids: "B1".to_string(),
                    shipping_cost: dec!(2.00),
                })
                .await
                .unwrap();
            session.commit().await.unwrap();

            let result = service.cancel("SP1", None).await;

            assert!(matches!(result, Err(ShippingError::NotFound(ref r)) if r == "SP1"), "{:?}", policy);
        }
    }
}
