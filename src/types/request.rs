use super::message::Turn;

const PREFERENCES_HEADER: &str = "User preferences to keep in mind: ";

/// Input of a single generation call.
///
/// Built once per inbound user message and consumed by the pipeline; there
/// are no setters, only consuming `with_*` builders used before submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationRequest {
    system_preamble: String,
    history: Vec<Turn>,
    new_user_turn: String,
    user_profile_context: Option<String>,
}

impl ConversationRequest {
    pub fn new(system_preamble: impl Into<String>, new_user_turn: impl Into<String>) -> Self {
        Self {
            system_preamble: system_preamble.into(),
            history: Vec::new(),
            new_user_turn: new_user_turn.into(),
            user_profile_context: None,
        }
    }

    /// Chronologically ordered user/assistant turns since the last reset.
    pub fn with_history(mut self, history: Vec<Turn>) -> Self {
        self.history = history;
        self
    }

    pub fn with_profile_context(mut self, context: impl Into<String>) -> Self {
        self.user_profile_context = Some(context.into());
        self
    }

    pub fn system_preamble(&self) -> &str {
        &self.system_preamble
    }

    pub fn history(&self) -> &[Turn] {
        &self.history
    }

    pub fn new_user_turn(&self) -> &str {
        &self.new_user_turn
    }

    pub fn user_profile_context(&self) -> Option<&str> {
        self.user_profile_context.as_deref()
    }

    /// The preamble actually sent: the system preamble followed by the
    /// personalization block when one is present and non-blank.
    pub fn effective_preamble(&self) -> String {
        match self
            .user_profile_context
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
        {
            Some(ctx) => format!("{}\n\n{}{}", self.system_preamble, PREFERENCES_HEADER, ctx),
            None => self.system_preamble.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn effective_preamble_without_profile() {
        let req = ConversationRequest::new("You are Alice.", "hi");
        assert_eq!(req.effective_preamble(), "You are Alice.");
    }

    #[test]
    fn effective_preamble_appends_trimmed_profile() {
        let req = ConversationRequest::new("You are Alice.", "hi")
            .with_profile_context("  Loves cats and video games \n");
        assert_eq!(
            req.effective_preamble(),
            "You are Alice.\n\nUser preferences to keep in mind: Loves cats and video games"
        );
    }

    #[test]
    fn blank_profile_is_ignored() {
        let req = ConversationRequest::new("P", "hi").with_profile_context("   ");
        assert_eq!(req.effective_preamble(), "P");
        assert_eq!(req.user_profile_context(), Some("   "));
    }
}
