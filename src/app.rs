use std::sync::Arc;

use kameo::actor::ActorRef;
use kameo::Actor;

use crate::actors::DeadLetterActor;
use crate::config::{Settings, Transport};
use crate::domain::books::{Book, BookService};
use crate::domain::orders::{OrderService, PurchaseOrder};
use crate::domain::shipping::{
    CancelShipmentHandler, ShippingHandler, ShippingManifest, ShippingRate, ShippingService,
};
use crate::messaging::{
    CommandKind, EventKind, HandlerRegistry, InProcessBus, MessageBus, QueueWorker, QueuedBus, QueuedBusConfig,
};
use crate::metrics::Metrics;
use crate::store::{InMemoryStore, RecordStore};

// ============================================================================
// Composition Root
// ============================================================================
//
// The only place that knows every context. Builds the stores, registers the
// handlers, then moves the registry into the configured bus. Nothing can be
// registered after that point.
//
// ============================================================================

pub struct Storefront {
    pub books: BookService,
    pub orders: OrderService,
    pub shipping: ShippingService,
    pub metrics: Arc<Metrics>,
    /// Present on the queued transport only
    pub dead_letters: Option<ActorRef<DeadLetterActor>>,
    pub transport: Transport,
}

impl Storefront {
    /// Wire the application. Must run inside a tokio runtime.
    ///
    /// The queued transport also returns its worker; it finishes once every
    /// `Storefront` holding the bus has been dropped.
    pub fn build(settings: &Settings) -> anyhow::Result<(Self, Option<QueueWorker>)> {
        let metrics = Arc::new(Metrics::new()?);

        let books: Arc<dyn RecordStore<Book>> = Arc::new(InMemoryStore::<Book>::new("books"));
        let orders: Arc<dyn RecordStore<PurchaseOrder>> = Arc::new(InMemoryStore::<PurchaseOrder>::new("orders"));
        let manifests: Arc<dyn RecordStore<ShippingManifest>> = Arc::new(InMemoryStore::<ShippingManifest>::new("shipping"));

        let mut registry = HandlerRegistry::new();
        registry
            .register_handler(
                EventKind::PurchaseOrderReceived,
                Arc::new(ShippingHandler::new(
                    manifests.clone(),
                    ShippingRate::from_percent(settings.shipping.surcharge_percent),
                )),
            )
            .register_command_handler(
                CommandKind::CancelShipment,
                Arc::new(CancelShipmentHandler::new(manifests.clone())),
            )?;

        let (bus, worker, dead_letters) = match settings.bus.transport {
            Transport::InProcess => {
                let bus = InProcessBus::new(registry, settings.bus.failure_policy).with_observer(metrics.clone());
                tracing::info!(policy = ?bus.policy(), "Using in-process bus");
                let bus: Arc<dyn MessageBus> = Arc::new(bus);
                (bus, None, None)
            }
            Transport::Queued => {
                let dead_letters = DeadLetterActor::spawn(DeadLetterActor::new(settings.dead_letters.capacity));
                let config = QueuedBusConfig {
                    capacity: settings.bus.queue_capacity,
                    retry: settings.bus.retry.policy(),
                };
                let (bus, worker) = QueuedBus::spawn(registry, config, metrics.clone(), Some(dead_letters.clone()));
                let bus: Arc<dyn MessageBus> = Arc::new(bus);
                (bus, Some(worker), Some(dead_letters))
            }
        };

        let storefront = Self {
            books: BookService::new(books),
            orders: OrderService::new(orders, bus.clone()),
            shipping: ShippingService::new(manifests, bus),
            metrics,
            dead_letters,
            transport: settings.bus.transport,
        };

        Ok((storefront, worker))
    }
}
