use async_trait::async_trait;
use uuid::Uuid;

use super::message::{CommandEnvelope, EventEnvelope};
use crate::store::StoreError;
use crate::utils::IsTransient;

// ============================================================================
// Handler Contracts
// ============================================================================
//
// Handlers never publish directly. They return the events they emit and the
// bus dispatches them, so a handler holds no reference back to the bus.
//
// ============================================================================

#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Stable name used in logs, metrics and dead letters
    fn name(&self) -> &str;

    async fn handle(&self, envelope: &EventEnvelope) -> Result<Vec<EventEnvelope>, HandlerError>;
}

#[async_trait]
pub trait CommandHandler: Send + Sync {
    fn name(&self) -> &str;

    async fn handle(&self, envelope: &CommandEnvelope) -> Result<Vec<EventEnvelope>, HandlerError>;
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum HandlerError {
    /// Worth retrying: the same input may succeed later
    #[error("transient failure: {0}")]
    Transient(String),

    #[error("{0}")]
    Failed(String),

    /// The record the message targets does not exist
    #[error("not found: {0}")]
    NotFound(String),

    #[error("received a message it does not handle: {0}")]
    Unexpected(String),

    #[error("emitted event {event_id} with correlation {found}, expected {expected}")]
    BrokenCorrelation {
        event_id: Uuid,
        expected: Uuid,
        found: Uuid,
    },
}

impl IsTransient for HandlerError {
    fn is_transient(&self) -> bool {
        matches!(self, HandlerError::Transient(_))
    }
}

impl From<StoreError> for HandlerError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::Unavailable(_) => HandlerError::Transient(error.to_string()),
            StoreError::Conflict(_) => HandlerError::Failed(error.to_string()),
        }
    }
}

/// Every emitted event must stay in the workflow of the message that caused it
pub(crate) fn check_correlation(correlation_id: Uuid, emitted: &[EventEnvelope]) -> Result<(), HandlerError> {
    match emitted.iter().find(|e| e.correlation_id != correlation_id) {
        Some(stray) => Err(HandlerError::BrokenCorrelation {
            event_id: stray.event_id,
            expected: correlation_id,
            found: stray.correlation_id,
        }),
        None => Ok(()),
    }
}

/// Run an event handler and verify the correlation of what it emitted
pub(crate) async fn invoke_event_handler(
    handler: &dyn EventHandler,
    envelope: &EventEnvelope,
) -> Result<Vec<EventEnvelope>, HandlerError> {
    let emitted = handler.handle(envelope).await?;
    check_correlation(envelope.correlation_id, &emitted)?;
    Ok(emitted)
}

pub(crate) async fn invoke_command_handler(
    handler: &dyn CommandHandler,
    envelope: &CommandEnvelope,
) -> Result<Vec<EventEnvelope>, HandlerError> {
    let emitted = handler.handle(envelope).await?;
    check_correlation(envelope.correlation_id, &emitted)?;
    Ok(emitted)
}
