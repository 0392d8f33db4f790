use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use kameo::actor::ActorRef;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use uuid::Uuid;

use super::dispatch::{DispatchObserver, HandlerOutcome, Outcome};
use super::error::BusError;
use super::handler::{invoke_command_handler, invoke_event_handler, HandlerError};
use super::message::{CommandEnvelope, EventEnvelope};
use super::registry::HandlerRegistry;
use super::{Delivery, MessageBus};
use crate::actors::{AddDeadLetter, DeadLetterActor};
use crate::utils::{retry_on_transient, RetryPolicy, RetryResult};

// ============================================================================
// Queued Bus
// ============================================================================
//
// `publish` only waits for room in a bounded channel. A single worker task
// owns the receiving end and runs the handlers:
//
// - every delivery is retried while it fails transiently
// - a delivery that still fails is dead-lettered; other handlers keep running
// - follow-up events are handled before the next message is pulled
//
// Dropping every `QueuedBus` clone closes the channel. The worker then drains
// what is already queued and stops.
//
// ============================================================================

#[derive(Debug, Clone)]
pub struct QueuedBusConfig {
    pub capacity: usize,
    pub retry: RetryPolicy,
}

impl Default for QueuedBusConfig {
    fn default() -> Self {
        Self {
            capacity: 256,
            retry: RetryPolicy::default(),
        }
    }
}

enum Queued {
    Event(EventEnvelope),
    Command(CommandEnvelope),
}

#[derive(Clone)]
pub struct QueuedBus {
    sender: mpsc::Sender<Queued>,
    registry: Arc<HandlerRegistry>,
}

/// What the worker did before it stopped
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkerStats {
    pub events: u64,
    pub commands: u64,
    pub deliveries: u64,
    pub retries: u64,
    pub dead_lettered: u64,
}

pub struct QueueWorker {
    handle: JoinHandle<WorkerStats>,
}

impl QueueWorker {
    /// Wait for the worker to drain the queue. Only returns once every
    /// `QueuedBus` handle has been dropped.
    pub async fn join(self) -> anyhow::Result<WorkerStats> {
        Ok(self.handle.await?)
    }
}

impl QueuedBus {
    pub fn spawn(
        registry: HandlerRegistry,
        config: QueuedBusConfig,
        observer: Arc<dyn DispatchObserver>,
        dead_letters: Option<ActorRef<DeadLetterActor>>,
    ) -> (Self, QueueWorker) {
        let (sender, receiver) = mpsc::channel(config.capacity.max(1));
        let registry = Arc::new(registry);

        let worker = Worker {
            registry: registry.clone(),
            retry: config.retry,
            observer,
            dead_letters,
            stats: WorkerStats::default(),
        };
        let handle = tokio::spawn(worker.run(receiver));

        tracing::info!(capacity = config.capacity, "🚀 Queued bus started");

        (Self { sender, registry }, QueueWorker { handle })
    }

    async fn enqueue(&self, message: Queued) -> Result<Delivery, BusError> {
        self.sender.send(message).await.map_err(|_| BusError::Closed)?;
        Ok(Delivery::Enqueued)
    }
}

#[async_trait]
impl MessageBus for QueuedBus {
    async fn publish(&self, envelope: EventEnvelope) -> Result<Delivery, BusError> {
        tracing::debug!(
            event_id = %envelope.event_id,
            correlation_id = %envelope.correlation_id,
            event_kind = %envelope.kind(),
            "Enqueuing event"
        );
        self.enqueue(Queued::Event(envelope)).await
    }

    async fn send(&self, envelope: CommandEnvelope) -> Result<Delivery, BusError> {
        let kind = envelope.kind();
        if self.registry.command_handler(kind).is_none() {
            return Err(BusError::NoCommandHandler(kind));
        }
        self.enqueue(Queued::Command(envelope)).await
    }
}

// ============================================================================
// Worker
// ============================================================================

struct Worker {
    registry: Arc<HandlerRegistry>,
    retry: RetryPolicy,
    observer: Arc<dyn DispatchObserver>,
    dead_letters: Option<ActorRef<DeadLetterActor>>,
    stats: WorkerStats,
}

/// The message a delivery was made for
#[derive(Clone, Copy)]
enum Subject<'a> {
    Event(&'a EventEnvelope),
    Command(&'a CommandEnvelope),
}

impl Subject<'_> {
    fn message_id(&self) -> Uuid {
        match self {
            Subject::Event(e) => e.event_id,
            Subject::Command(c) => c.command_id,
        }
    }

    fn correlation_id(&self) -> Uuid {
        match self {
            Subject::Event(e) => e.correlation_id,
            Subject::Command(c) => c.correlation_id,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Subject::Event(e) => e.kind().as_str(),
            Subject::Command(c) => c.kind().as_str(),
        }
    }

    fn payload(&self) -> serde_json::Value {
        let payload = match self {
            Subject::Event(e) => serde_json::to_value(&e.event),
            Subject::Command(c) => serde_json::to_value(&c.command),
        };
        payload.unwrap_or(serde_json::Value::Null)
    }
}

impl Worker {
    async fn run(mut self, mut receiver: mpsc::Receiver<Queued>) -> WorkerStats {
        while let Some(message) = receiver.recv().await {
            let mut pending = VecDeque::new();

            match message {
                Queued::Event(envelope) => pending.push_back(envelope),
                Queued::Command(envelope) => {
                    self.stats.commands += 1;
                    pending.extend(self.deliver_command(&envelope).await);
                }
            }

            while let Some(envelope) = pending.pop_front() {
                self.stats.events += 1;
                pending.extend(self.deliver_event(&envelope).await);
            }
        }

        tracing::info!(
            events = self.stats.events,
            commands = self.stats.commands,
            dead_lettered = self.stats.dead_lettered,
            "Queue drained, worker stopping"
        );
        self.stats
    }

    async fn deliver_event(&mut self, envelope: &EventEnvelope) -> Vec<EventEnvelope> {
        let registry = self.registry.clone();
        let handlers = registry.handlers_for(envelope.kind());
        self.observer.event_published(envelope, handlers.len());

        let mut emitted = Vec::new();
        for handler in handlers {
            let started = Instant::now();
            let result = retry_on_transient(&self.retry, move |_attempt| {
                invoke_event_handler(handler.as_ref(), envelope)
            })
            .await;

            emitted.extend(self.settle(Subject::Event(envelope), handler.name(), result, started).await);
        }
        emitted
    }

    async fn deliver_command(&mut self, envelope: &CommandEnvelope) -> Vec<EventEnvelope> {
        let registry = self.registry.clone();
        let Some(handler) = registry.command_handler(envelope.kind()) else {
            tracing::error!(command_kind = %envelope.kind(), "No handler for queued command");
            return Vec::new();
        };

        let started = Instant::now();
        let result = retry_on_transient(&self.retry, move |_attempt| {
            invoke_command_handler(handler.as_ref(), envelope)
        })
        .await;

        self.settle(Subject::Command(envelope), handler.name(), result, started).await
    }

    /// Record one delivery and dead-letter it if it failed for good
    async fn settle(
        &mut self,
        subject: Subject<'_>,
        handler: &str,
        result: RetryResult<Vec<EventEnvelope>, HandlerError>,
        started: Instant,
    ) -> Vec<EventEnvelope> {
        let attempts = result.attempts();
        self.stats.deliveries += 1;
        self.stats.retries += u64::from(attempts.saturating_sub(1));

        let (outcome, emitted) = match result {
            RetryResult::Success { value, .. } => (Outcome::Succeeded { emitted: value.len() }, value),
            RetryResult::Exhausted { error, .. } | RetryResult::Permanent { error, .. } => {
                (Outcome::Failed(error), Vec::new())
            }
        };

        let outcome = HandlerOutcome {
            handler: handler.to_string(),
            message_id: subject.message_id(),
            kind: subject.kind(),
            outcome,
            attempts,
            duration: started.elapsed(),
        };
        self.observer.handler_completed(&outcome);

        if let Some(error) = outcome.error() {
            self.dead_letter(subject, handler, error, attempts).await;
        }

        emitted
    }

    async fn dead_letter(&mut self, subject: Subject<'_>, handler: &str, error: &HandlerError, attempts: u32) {
        self.stats.dead_lettered += 1;
        self.observer.dead_lettered(subject.kind(), handler);

        let Some(dead_letters) = &self.dead_letters else {
            tracing::error!(
                message_id = %subject.message_id(),
                handler = %handler,
                error = %error,
                "❌ Delivery failed and no dead-letter queue is attached"
            );
            return;
        };

        let letter = AddDeadLetter {
            message_id: subject.message_id(),
            correlation_id: subject.correlation_id(),
            kind: subject.kind().to_string(),
            handler: handler.to_string(),
            payload: subject.payload(),
            error: error.to_string(),
            attempts,
        };

        if let Err(e) = dead_letters.tell(letter).send().await {
            tracing::error!(error = ?e, message_id = %subject.message_id(), "Failed to reach dead-letter actor");
        }
    }
}
