//! Conversation facade layer (optional).
//!
//! The orchestrator only sees a [`ConversationRequest`](crate::types::ConversationRequest).
//! This facade shows how a chat backend feeds it: per-user cooldown, history
//! since the last reset and personalization text, each behind a narrow trait
//! so storage stays outside the crate.

pub mod memory;
pub mod ports;
pub mod prelude;
pub mod service;

pub use memory::{InMemoryHistoryStore, InMemoryProfiles, InMemoryUserGate};
pub use ports::{HistoryStore, ProfileProvider, UserGate};
pub use service::{ConversationService, InboundMessage, Reply};
