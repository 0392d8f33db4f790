// ============================================================================
// Messaging Module
// ============================================================================
//
// The storefront's message bus. Producers and consumers only see the
// `MessageBus` trait; two transports implement it:
//
// - InProcessBus: handlers run on the publisher's task, follow-ups depth-first
// - QueuedBus:    a bounded channel feeds one worker with retry and a DLQ
//
// ============================================================================

mod dispatch;
mod error;
mod handler;
mod in_process;
mod message;
mod queued;
mod registry;

#[cfg(test)]
pub(crate) mod testing;

use async_trait::async_trait;

pub use dispatch::{DispatchObserver, DispatchReport, FailurePolicy, HandlerOutcome, NoopObserver, Outcome};
pub use error::BusError;
pub use handler::{CommandHandler, EventHandler, HandlerError};
pub use in_process::InProcessBus;
pub use message::{Command, CommandEnvelope, CommandKind, Event, EventEnvelope, EventKind};
pub use queued::{QueueWorker, QueuedBus, QueuedBusConfig, WorkerStats};
pub use registry::{HandlerRegistry, SharedCommandHandler, SharedEventHandler};

/// What happened to a message once the bus accepted it
#[derive(Debug)]
pub enum Delivery {
    /// Handlers already ran; the report lists each of them
    Dispatched(DispatchReport),
    /// Handed to the queue; handlers run later on the worker
    Enqueued,
}

#[async_trait]
pub trait MessageBus: Send + Sync {
    /// Deliver an event to every handler of its kind.
    ///
    /// Publishing a kind nobody handles succeeds and does nothing.
    async fn publish(&self, envelope: EventEnvelope) -> Result<Delivery, BusError>;

    /// Deliver a command to its single handler
    async fn send(&self, envelope: CommandEnvelope) -> Result<Delivery, BusError>;
}
