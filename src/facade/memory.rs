//! In-process collaborators for tests, demos and the CLI.

use super::ports::{HistoryStore, ProfileProvider, UserGate};
use crate::resilience::{Clock, TokioClock};
use crate::types::{Role, Turn};
use crate::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

#[derive(Default)]
struct HistoryState {
    next_seq: u64,
    conversations: HashMap<String, Vec<(u64, Turn)>>,
}

/// Sequence-numbered turns per conversation.
#[derive(Default)]
pub struct InMemoryHistoryStore {
    state: Mutex<HistoryState>,
}

impl InMemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a turn; returns its sequence number.
    pub fn push(&self, conversation_id: &str, turn: Turn) -> u64 {
        let mut state = lock(&self.state);
        state.next_seq += 1;
        let seq = state.next_seq;
        state
            .conversations
            .entry(conversation_id.to_string())
            .or_default()
            .push((seq, turn));
        seq
    }

    /// Marker after which history starts fresh.
    ///
    /// Sequence numbers are shared by every conversation, so the marker is
    /// the current global sequence number whatever `conversation_id` is.
    pub fn reset(&self, _conversation_id: &str) -> u64 {
        lock(&self.state).next_seq
    }

    pub fn len(&self, conversation_id: &str) -> usize {
        lock(&self.state)
            .conversations
            .get(conversation_id)
            .map(Vec::len)
            .unwrap_or(0)
    }

    pub fn is_empty(&self, conversation_id: &str) -> bool {
        self.len(conversation_id) == 0
    }
}

#[async_trait]
impl HistoryStore for InMemoryHistoryStore {
    async fn get_recent_turns(
        &self,
        conversation_id: &str,
        since_marker: Option<u64>,
    ) -> Result<Vec<Turn>> {
        let since = since_marker.unwrap_or(0);
        let state = lock(&self.state);
        Ok(state
            .conversations
            .get(conversation_id)
            .map(|turns| {
                turns
                    .iter()
                    .filter(|(seq, t)| *seq > since && t.role != Role::System)
                    .map(|(_, t)| t.clone())
                    .collect()
            })
            .unwrap_or_default())
    }
}

#[derive(Default)]
pub struct InMemoryProfiles {
    texts: Mutex<HashMap<String, String>>,
}

impl InMemoryProfiles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, user_id: &str, text: impl Into<String>) {
        lock(&self.texts).insert(user_id.to_string(), text.into());
    }

    pub fn clear(&self, user_id: &str) {
        lock(&self.texts).remove(user_id);
    }
}

#[async_trait]
impl ProfileProvider for InMemoryProfiles {
    async fn get_personalization_text(&self, user_id: &str) -> Result<Option<String>> {
        Ok(lock(&self.texts).get(user_id).cloned())
    }
}

/// Default per-user cooldown.
pub const DEFAULT_USER_COOLDOWN: Duration = Duration::from_secs(3);

/// Check-and-mark cooldown keyed by user id.
pub struct InMemoryUserGate {
    cooldown: Duration,
    clock: Arc<dyn Clock>,
    marked: Mutex<HashMap<String, Instant>>,
}

impl InMemoryUserGate {
    pub fn new(cooldown: Duration) -> Self {
        Self::with_clock(cooldown, Arc::new(TokioClock))
    }

    pub fn with_clock(cooldown: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            cooldown,
            clock,
            marked: Mutex::new(HashMap::new()),
        }
    }

    fn remaining(&self, user_id: &str) -> Duration {
        let now = self.clock.now();
        let mut marked = lock(&self.marked);
        match marked.get(user_id).map(|at| *at + self.cooldown) {
            Some(until) if until > now => until - now,
            Some(_) => {
                marked.remove(user_id);
                Duration::ZERO
            }
            None => Duration::ZERO,
        }
    }
}

impl Default for InMemoryUserGate {
    fn default() -> Self {
        Self::new(DEFAULT_USER_COOLDOWN)
    }
}

#[async_trait]
impl UserGate for InMemoryUserGate {
    async fn is_blocked(&self, user_id: &str) -> bool {
        !self.remaining(user_id).is_zero()
    }

    async fn time_until_unblocked(&self, user_id: &str) -> Duration {
        self.remaining(user_id)
    }

    async fn mark_request(&self, user_id: &str) {
        let now = self.clock.now();
        lock(&self.marked).insert(user_id.to_string(), now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resilience::ManualClock;

    #[tokio::test]
    async fn history_respects_reset_marker() {
        let store = InMemoryHistoryStore::new();
        store.push("c1", Turn::user("old"));
        store.push("c1", Turn::assistant("old reply"));
        let marker = store.reset("c1");
        store.push("c1", Turn::system("ignored"));
        store.push("c1", Turn::user("new"));
        store.push("c2", Turn::user("other conversation"));

        let all = store.get_recent_turns("c1", None).await.unwrap();
        assert_eq!(all.len(), 3);
        let fresh = store.get_recent_turns("c1", Some(marker)).await.unwrap();
        assert_eq!(fresh, vec![Turn::user("new")]);
        assert!(store.get_recent_turns("nobody", None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn reset_marker_is_scoped_by_sequence_not_conversation() {
        let store = InMemoryHistoryStore::new();
        store.push("a", Turn::user("a1"));
        let marker_b = store.reset("b");
        store.push("a", Turn::user("a2"));
        store.push("b", Turn::user("b1"));

        let a = store.get_recent_turns("a", Some(marker_b)).await.unwrap();
        assert_eq!(a, vec![Turn::user("a2")]);
        let b = store.get_recent_turns("b", Some(marker_b)).await.unwrap();
        assert_eq!(b, vec![Turn::user("b1")]);
    }

    #[tokio::test]
    async fn user_gate_cooldown() {
        let clock = Arc::new(ManualClock::new());
        let gate = InMemoryUserGate::with_clock(Duration::from_secs(3), clock.clone());
        assert!(!gate.is_blocked("u").await);

        gate.mark_request("u").await;
        assert!(gate.is_blocked("u").await);
        assert!(!gate.is_blocked("someone-else").await);

        clock.advance(Duration::from_secs(1));
        assert_eq!(gate.time_until_unblocked("u").await, Duration::from_secs(2));

        clock.advance(Duration::from_secs(2));
        assert!(!gate.is_blocked("u").await);
        assert_eq!(gate.time_until_unblocked("u").await, Duration::ZERO);
    }

    #[tokio::test]
    async fn profiles() {
        let profiles = InMemoryProfiles::new();
        profiles.set("u", "Loves anime");
        assert_eq!(
            profiles.get_personalization_text("u").await.unwrap().as_deref(),
            Some("Loves anime")
        );
        profiles.clear("u");
        assert_eq!(profiles.get_personalization_text("u").await.unwrap(), None);
    }
}
