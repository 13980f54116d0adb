use crate::types::Role;
use serde::{Deserialize, Serialize};

/// Role markers used by single-string prompts and stripped from responses.
///
/// Defaults to ChatML.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatTemplate {
    pub open: String,
    pub close: String,
    /// Additional end-of-sequence tokens some models leak into their output.
    pub extra_stop_tokens: Vec<String>,
}

impl Default for ChatTemplate {
    fn default() -> Self {
        Self {
            open: "<|im_start|>".to_string(),
            close: "<|im_end|>".to_string(),
            extra_stop_tokens: vec![
                "<|eot_id|>".to_string(),
                "<|endoftext|>".to_string(),
                "</s>".to_string(),
            ],
        }
    }
}

impl ChatTemplate {
    /// `{open}{role}\n{content}{close}`
    pub fn segment(&self, role: Role, content: &str) -> String {
        format!("{}{}\n{}{}", self.open, role.as_str(), content, self.close)
    }

    /// Open-ended marker cueing the model to answer as the assistant.
    pub fn assistant_prefix(&self) -> String {
        format!("{}{}\n", self.open, Role::Assistant.as_str())
    }

    /// Every literal token that must not survive in sanitized output.
    pub fn stop_tokens(&self) -> impl Iterator<Item = &str> {
        [self.open.as_str(), self.close.as_str()]
            .into_iter()
            .chain(self.extra_stop_tokens.iter().map(String::as_str))
            .filter(|t| !t.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chatml_segments() {
        let t = ChatTemplate::default();
        assert_eq!(
            t.segment(Role::User, "Hi"),
            "<|im_start|>user\nHi<|im_end|>"
        );
        assert_eq!(t.assistant_prefix(), "<|im_start|>assistant\n");
        assert_eq!(t.stop_tokens().count(), 5);
    }
}
