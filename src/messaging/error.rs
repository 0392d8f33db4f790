use uuid::Uuid;

use super::handler::HandlerError;
use super::message::CommandKind;

#[derive(Debug, thiserror::Error)]
pub enum BusError {
    /// Raised only under `FailurePolicy::Propagate`
    #[error("handler '{handler}' failed on {kind} {message_id}: {source}")]
    HandlerFailed {
        handler: String,
        kind: &'static str,
        message_id: Uuid,
        #[source]
        source: HandlerError,
    },

    #[error("no handler registered for command {0}")]
    NoCommandHandler(CommandKind),

    #[error("command {kind} already handled by '{existing}'")]
    DuplicateCommandHandler { kind: CommandKind, existing: String },

    #[error("message bus is closed")]
    Closed,
}
