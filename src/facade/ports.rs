//! Interfaces of the collaborators that live outside this crate.

use crate::types::Turn;
use crate::Result;
use async_trait::async_trait;
use std::time::Duration;

/// Message history of a conversation.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// User/assistant turns after `since_marker` (all turns when `None`),
    /// oldest first. The core does no further filtering or deduplication.
    async fn get_recent_turns(
        &self,
        conversation_id: &str,
        since_marker: Option<u64>,
    ) -> Result<Vec<Turn>>;
}

#[async_trait]
pub trait ProfileProvider: Send + Sync {
    /// Free-form personalization text, if the user has any.
    async fn get_personalization_text(&self, user_id: &str) -> Result<Option<String>>;
}

/// Per-user cooldown between requests.
#[async_trait]
pub trait UserGate: Send + Sync {
    async fn is_blocked(&self, user_id: &str) -> bool;

    /// Zero when the user is not blocked.
    async fn time_until_unblocked(&self, user_id: &str) -> Duration;

    /// Start the cooldown for `user_id`.
    async fn mark_request(&self, user_id: &str);
}
