//! Configuration error types

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to load configuration from {path}: {reason}{}", .hint.as_ref().map(|h| format!("\n Hint: {}", h)).unwrap_or_default())]
    LoadError {
        path: String,
        reason: String,
        hint: Option<String>,
    },

    #[error("YAML syntax error: {0}")]
    YamlError(String),

    #[error("JSON syntax error: {0}")]
    JsonError(String),

    #[error("Invalid value for {key}: '{value}'{}", .hint.as_ref().map(|h| format!("\n Hint: {}", h)).unwrap_or_default())]
    InvalidValue {
        key: String,
        value: String,
        hint: Option<String>,
    },

    #[error("Missing required setting: {key}{}", .hint.as_ref().map(|h| format!("\n Hint: {}", h)).unwrap_or_default())]
    Missing { key: String, hint: Option<String> },
}

impl ConfigError {
    /// Attach an actionable hint to the error
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        let hint_val = Some(hint.into());
        match self {
            ConfigError::LoadError { ref mut hint, .. } => *hint = hint_val,
            ConfigError::InvalidValue { ref mut hint, .. } => *hint = hint_val,
            ConfigError::Missing { ref mut hint, .. } => *hint = hint_val,
            _ => (),
        }
        self
    }
}
