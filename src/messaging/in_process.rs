use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use tracing::Instrument;

use super::dispatch::{DispatchObserver, DispatchReport, FailurePolicy, HandlerOutcome, NoopObserver, Outcome};
use super::error::BusError;
use super::handler::{invoke_command_handler, invoke_event_handler, HandlerError};
use super::message::{CommandEnvelope, EventEnvelope};
use super::registry::HandlerRegistry;
use super::{Delivery, MessageBus};

// ============================================================================
// In-Process Bus
// ============================================================================
//
// Handlers run on the publisher's task, one after another in registration
// order. Events a handler emits are dispatched right after it returns and
// before the next handler of the triggering event runs, so one `publish`
// awaits the whole chain.
//
// ============================================================================

pub struct InProcessBus {
    registry: Arc<HandlerRegistry>,
    policy: FailurePolicy,
    observer: Arc<dyn DispatchObserver>,
}

impl InProcessBus {
    pub fn new(registry: HandlerRegistry, policy: FailurePolicy) -> Self {
        Self {
            registry: Arc::new(registry),
            policy,
            observer: Arc::new(NoopObserver),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn DispatchObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }

    fn dispatch(&self, envelope: EventEnvelope) -> BoxFuture<'_, Result<DispatchReport, BusError>> {
        let span = tracing::debug_span!(
            "dispatch",
            event_id = %envelope.event_id,
            correlation_id = %envelope.correlation_id,
            event_kind = %envelope.kind(),
        );

        async move {
            let handlers = self.registry.handlers_for(envelope.kind());
            self.observer.event_published(&envelope, handlers.len());

            let mut report = DispatchReport::default();
            if handlers.is_empty() {
                tracing::debug!("No handler registered, nothing to do");
                return Ok(report);
            }

            for handler in handlers {
                let started = Instant::now();
                let result = invoke_event_handler(handler.as_ref(), &envelope).await;

                let (outcome, emitted) = match result {
                    Ok(emitted) => (Outcome::Succeeded { emitted: emitted.len() }, emitted),
                    Err(error) => (Outcome::Failed(error), Vec::new()),
                };
                let outcome = HandlerOutcome {
                    handler: handler.name().to_string(),
                    message_id: envelope.event_id,
                    kind: envelope.kind().as_str(),
                    outcome,
                    attempts: 1,
                    duration: started.elapsed(),
                };
                self.observer.handler_completed(&outcome);

                if let Some(error) = outcome.error().cloned() {
                    self.on_failure(&outcome, error)?;
                }
                report.push(outcome);

                for follow_up in emitted {
                    report.extend(self.dispatch(follow_up).await?);
                }
            }

            Ok(report)
        }
        .instrument(span)
        .boxed()
    }

    /// Under `Propagate` turns a handler failure into the dispatch error
    fn on_failure(&self, outcome: &HandlerOutcome, error: HandlerError) -> Result<(), BusError> {
        match self.policy {
            FailurePolicy::Propagate => {
                tracing::error!(handler = %outcome.handler, error = %error, "❌ Handler failed, aborting dispatch");
                Err(BusError::HandlerFailed {
                    handler: outcome.handler.clone(),
                    kind: outcome.kind,
                    message_id: outcome.message_id,
                    source: error,
                })
            }
            FailurePolicy::Isolate => {
                tracing::warn!(handler = %outcome.handler, error = %error, "Handler failed, continuing with the rest");
                Ok(())
            }
        }
    }
}

#[async_trait]
impl MessageBus for InProcessBus {
    async fn publish(&self, envelope: EventEnvelope) -> Result<Delivery, BusError> {
        let report = self.dispatch(envelope).await?;
        Ok(Delivery::Dispatched(report))
    }

    async fn send(&self, envelope: CommandEnvelope) -> Result<Delivery, BusError> {
        let kind = envelope.kind();
        let handler = self
            .registry
            .command_handler(kind)
            .ok_or(BusError::NoCommandHandler(kind))?;

        let started = Instant::now();
        let result = invoke_command_handler(handler.as_ref(), &envelope).await;

        let (outcome, emitted) = match result {
            Ok(emitted) => (Outcome::Succeeded { emitted: emitted.len() }, emitted),
            Err(error) => (Outcome::Failed(error), Vec::new()),
        };
        let outcome = HandlerOutcome {
            handler: handler.name().to_string(),
            message_id: envelope.command_id,
            kind: kind.as_str(),
            outcome,
            attempts: 1,
            duration: started.elapsed(),
        };
        self.observer.handler_completed(&outcome);

        if let Some(error) = outcome.error().cloned() {
            self.on_failure(&outcome, error)?;
        }

        let mut report = DispatchReport::default();
        report.push(outcome);
        for follow_up in emitted {
            report.extend(self.dispatch(follow_up).await?);
        }

        Ok(Delivery::Dispatched(report))
    }
}
