use std::time::Duration;

use serde::Deserialize;
use uuid::Uuid;

use super::handler::HandlerError;
use super::message::EventEnvelope;

// ============================================================================
// Dispatch Outcomes
// ============================================================================

/// What a dispatch does when a handler fails
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Run every handler and record each failure in the report
    #[default]
    Isolate,
    /// Stop at the first failure and return it to the publisher
    Propagate,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Succeeded { emitted: usize },
    Failed(HandlerError),
}

/// Result of one handler invocation on one message
#[derive(Debug, Clone)]
pub struct HandlerOutcome {
    pub handler: String,
    pub message_id: Uuid,
    pub kind: &'static str,
    pub outcome: Outcome,
    pub attempts: u32,
    pub duration: Duration,
}

impl HandlerOutcome {
    pub fn succeeded(&self) -> bool {
        matches!(self.outcome, Outcome::Succeeded { .. })
    }

    pub fn error(&self) -> Option<&HandlerError> {
        match &self.outcome {
            Outcome::Failed(error) => Some(error),
            Outcome::Succeeded { .. } => None,
        }
    }
}

/// Every handler outcome of one dispatch, follow-ups included, in run order
#[derive(Debug, Clone, Default)]
pub struct DispatchReport {
    pub outcomes: Vec<HandlerOutcome>,
}

impl DispatchReport {
    /// True when no handler was resolved at all
    pub fn is_noop(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn invoked(&self) -> usize {
        self.outcomes.len()
    }

    pub fn failures(&self) -> impl Iterator<Item = &HandlerOutcome> {
        self.outcomes.iter().filter(|o| !o.succeeded())
    }

    pub fn has_failures(&self) -> bool {
        self.failures().next().is_some()
    }

    pub fn push(&mut self, outcome: HandlerOutcome) {
        self.outcomes.push(outcome);
    }

    pub fn extend(&mut self, other: DispatchReport) {
        self.outcomes.extend(other.outcomes);
    }
}

/// Hooks a bus calls while dispatching. All methods default to no-ops.
pub trait DispatchObserver: Send + Sync {
    fn event_published(&self, _envelope: &EventEnvelope, _handler_count: usize) {}

    fn handler_completed(&self, _outcome: &HandlerOutcome) {}

    fn dead_lettered(&self, _kind: &str, _handler: &str) {}
}

pub struct NoopObserver;

impl DispatchObserver for NoopObserver {}
