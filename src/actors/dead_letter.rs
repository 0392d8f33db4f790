use chrono::{DateTime, Utc};
use kameo::actor::ActorRef;
use kameo::error::Infallible;
use kameo::message::{Context, Message};
use kameo::reply::{Reply, ReplyError};
use kameo::Actor;
use serde::Serialize;
use std::collections::{BTreeMap, VecDeque};
use uuid::Uuid;

// ============================================================================
// Dead Letter Actor
// ============================================================================
//
// Holds deliveries the queued bus gave up on, in memory and in arrival
// order. Once `capacity` is reached the oldest entry is evicted; the
// eviction count is kept so nothing disappears silently from the stats.
//
// ============================================================================

pub const DEFAULT_CAPACITY: usize = 1024;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeadLetter {
    pub message_id: Uuid,
    pub correlation_id: Uuid,
    pub kind: String,
    pub handler: String,
    pub payload: serde_json::Value,
    pub error: String,
    pub attempts: u32,
    pub failed_at: DateTime<Utc>,
}

// ============================================================================
// Messages
// ============================================================================

#[derive(Debug, Clone)]
pub struct AddDeadLetter {
    pub message_id: Uuid,
    pub correlation_id: Uuid,
    pub kind: String,
    pub handler: String,
    pub payload: serde_json::Value,
    pub error: String,
    pub attempts: u32,
}

/// Most recent dead letters first, at most `limit` of them
#[derive(Debug)]
pub struct GetDeadLetters {
    pub limit: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeadLetterReport {
    pub total: u64,
    pub evicted: u64,
    pub by_kind: BTreeMap<String, u64>,
    pub entries: Vec<DeadLetter>,
}

impl Reply for DeadLetterReport {
    type Ok = Self;
    type Error = Infallible;
    type Value = Self;

    fn to_result(self) -> Result<Self, Infallible> {
        Ok(self)
    }

    fn into_any_err(self) -> Option<Box<dyn ReplyError>> {
        None
    }

    fn into_value(self) -> Self::Value {
        self
    }
}

// ============================================================================
// Actor
// ============================================================================

pub struct DeadLetterActor {
    capacity: usize,
    entries: VecDeque<DeadLetter>,
    total: u64,
    evicted: u64,
    by_kind: BTreeMap<String, u64>,
}

impl DeadLetterActor {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: VecDeque::new(),
            total: 0,
            evicted: 0,
            by_kind: BTreeMap::new(),
        }
    }
}

impl Default for DeadLetterActor {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl Actor for DeadLetterActor {
    type Args = Self;
    type Error = Infallible;

    async fn on_start(state: Self::Args, _actor_ref: ActorRef<Self>) -> Result<Self, Self::Error> {
        tracing::info!(capacity = state.capacity, "DeadLetterActor started");
        Ok(state)
    }
}

impl Message<AddDeadLetter> for DeadLetterActor {
    type Reply = ();

    async fn handle(&mut self, msg: AddDeadLetter, _ctx: &mut Context<Self, Self::Reply>) -> Self::Reply {
        tracing::error!(
            message_id = %msg.message_id,
            correlation_id = %msg.correlation_id,
            kind = %msg.kind,
            handler = %msg.handler,
            attempts = msg.attempts,
            error = %msg.error,
            "💀 Delivery dead-lettered"
        );

        if self.entries.len() >= self.capacity {
            self.entries.pop_front();
            self.evicted += 1;
        }

        self.total += 1;
        *self.by_kind.entry(msg.kind.clone()).or_insert(0) += 1;
        self.entries.push_back(DeadLetter {
            message_id: msg.message_id,
            correlation_id: msg.correlation_id,
            kind: msg.kind,
            handler: msg.handler,
            payload: msg.payload,
            error: msg.error,
            attempts: msg.attempts,
            failed_at: Utc::now(),
        });
    }
}

impl Message<GetDeadLetters> for DeadLetterActor {
    type Reply = DeadLetterReport;

    async fn handle(&mut self, msg: GetDeadLetters, _ctx: &mut Context<Self, Self::Reply>) -> Self::Reply {
        DeadLetterReport {
            total: self.total,
            evicted: self.evicted,
            by_kind: self.by_kind.clone(),
            entries: self.entries.iter().rev().take(msg.limit).cloned().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn letter(kind: &str, handler: &str) -> AddDeadLetter {
        AddDeadLetter {
            message_id: Uuid::new_v4(),
            correlation_id: Uuid::new_v4(),
            kind: kind.to_string(),
            handler: handler.to_string(),
            payload: serde_json::json!({ "purchaseOrderReference": "PO1" }),
            error: "store unavailable".to_string(),
            attempts: 3,
        }
    }

    #[tokio::test]
    async fn test_dead_letters_are_listed_newest_first() {
        let actor = DeadLetterActor::spawn(DeadLetterActor::new(10));

        actor.tell(letter("PurchaseOrderReceived", "first")).send().await.unwrap();
        actor.tell(letter("OrderShipped", "second")).send().await.unwrap();

        let report = actor.ask(GetDeadLetters { limit: 10 }).send().await.unwrap();

        assert_eq!(report.total, 2);
        assert_eq!(report.entries[0].handler, "second");
        assert_eq!(report.entries[1].handler, "first");
        assert_eq!(report.by_kind.get("OrderShipped"), Some(&1));
    }

    #[tokio::test]
    async fn test_oldest_entries_are_evicted_at_capacity() {
        let actor = DeadLetterActor::spawn(DeadLetterActor::new(2));

        for handler in ["a", "b", "c"] {
            actor.tell(letter("OrderShipped", handler)).send().await.unwrap();
        }

        let report = actor.ask(GetDeadLetters { limit: 10 }).send().await.unwrap();

        assert_eq!(report.total, 3);
        assert_eq!(report.evicted, 1);
        let handlers: Vec<_> = report.entries.iter().map(|e| e.handler.as_str()).collect();
        assert_eq!(handlers, vec!["c", "b"]);
    }

    #[tokio::test]
    async fn test_limit_caps_the_listing() {
        let actor = DeadLetterActor::spawn(DeadLetterActor::default());

        for handler in ["a", "b", "c"] {
            actor.tell(letter("OrderShipped", handler)).send().await.unwrap();
        }

        let report = actor.ask(GetDeadLetters { limit: 1 }).send().await.unwrap();

        assert_eq!(report.entries.len(), 1);
        assert_eq!(report.entries[0].handler, "c");
    }
}
