//! Minimal prelude for application code.
//!
//! Goal: reduce import noise without hiding important concepts.

pub use crate::client::{CallStats, Orchestrator, OrchestratorBuilder};
pub use crate::facade::ports::{HistoryStore, ProfileProvider, UserGate};
pub use crate::facade::service::{ConversationService, InboundMessage, Reply};
pub use crate::protocol::{BackendConfig, ConfigLoader, ProtocolVariant};
pub use crate::types::{ConversationRequest, GenerationResult, Role, Turn};
pub use crate::ErrorKind;
