use super::ports::{HistoryStore, ProfileProvider, UserGate};
use crate::client::{CallStats, Orchestrator};
use crate::types::{ConversationRequest, GenerationResult};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// One inbound user message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub user_id: String,
    pub conversation_id: String,
    pub text: String,
    /// History before this marker is ignored (last reset).
    pub since_marker: Option<u64>,
}

impl InboundMessage {
    /// Private chat: the conversation is keyed by the user.
    pub fn new(user_id: impl Into<String>, text: impl Into<String>) -> Self {
        let user_id = user_id.into();
        Self {
            conversation_id: user_id.clone(),
            user_id,
            text: text.into(),
            since_marker: None,
        }
    }

    pub fn in_conversation(mut self, conversation_id: impl Into<String>) -> Self {
        self.conversation_id = conversation_id.into();
        self
    }

    pub fn since(mut self, marker: u64) -> Self {
        self.since_marker = Some(marker);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Generated(GenerationResult),
    /// The user is still in cooldown; nothing was sent upstream.
    Throttled { retry_in: Duration },
}

impl Reply {
    pub fn text(&self) -> Option<&str> {
        match self {
            Reply::Generated(result) => result.text(),
            Reply::Throttled { .. } => None,
        }
    }
}

/// Reference caller wiring the external collaborators to the orchestrator.
pub struct ConversationService {
    orchestrator: Arc<Orchestrator>,
    history: Arc<dyn HistoryStore>,
    profiles: Arc<dyn ProfileProvider>,
    user_gate: Arc<dyn UserGate>,
    persona: String,
}

impl ConversationService {
    pub fn new(
        orchestrator: Arc<Orchestrator>,
        history: Arc<dyn HistoryStore>,
        profiles: Arc<dyn ProfileProvider>,
        user_gate: Arc<dyn UserGate>,
        persona: impl Into<String>,
    ) -> Self {
        Self {
            orchestrator,
            history,
            profiles,
            user_gate,
            persona: persona.into(),
        }
    }

    pub fn orchestrator(&self) -> &Arc<Orchestrator> {
        &self.orchestrator
    }

    pub async fn respond(&self, message: &InboundMessage) -> Reply {
        self.respond_with_stats(message).await.0
    }

    pub async fn respond_with_stats(&self, message: &InboundMessage) -> (Reply, Option<CallStats>) {
        let user_id = message.user_id.as_str();
        if self.user_gate.is_blocked(user_id).await {
            let retry_in = self.user_gate.time_until_unblocked(user_id).await;
            info!(
                user_id,
                retry_in_ms = retry_in.as_millis() as u64,
                "user throttled"
            );
            return (Reply::Throttled { retry_in }, None);
        }
        self.user_gate.mark_request(user_id).await;

        let history = match self
            .history
            .get_recent_turns(&message.conversation_id, message.since_marker)
            .await
        {
            Ok(turns) => turns,
            Err(e) => {
                warn!(
                    conversation_id = message.conversation_id.as_str(),
                    error = %e,
                    "history unavailable, continuing without it"
                );
                Vec::new()
            }
        };

        let profile = match self.profiles.get_personalization_text(user_id).await {
            Ok(text) => text,
            Err(e) => {
                warn!(user_id, error = %e, "profile unavailable, continuing without it");
                None
            }
        };

        let mut request =
            ConversationRequest::new(self.persona.clone(), message.text.clone()).with_history(history);
        if let Some(text) = profile {
            request = request.with_profile_context(text);
        }

        let (result, stats) = self.orchestrator.generate_with_stats(&request).await;
        (Reply::Generated(result), Some(stats))
    }
}
