use crate::error_kind::ErrorKind;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Terminal failure of a generation call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationFailure {
    pub kind: ErrorKind,
    pub message: String,
}

impl GenerationFailure {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for GenerationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for GenerationFailure {}

/// Outcome of [`Orchestrator::generate`](crate::Orchestrator::generate).
///
/// Generation is atomic from the caller's point of view: there is no partial
/// or streaming variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum GenerationResult {
    Success { text: String },
    Failure { kind: ErrorKind, message: String },
}

impl GenerationResult {
    pub fn success(text: impl Into<String>) -> Self {
        GenerationResult::Success { text: text.into() }
    }

    pub fn failure(kind: ErrorKind, message: impl Into<String>) -> Self {
        GenerationResult::Failure {
            kind,
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, GenerationResult::Success { .. })
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            GenerationResult::Success { text } => Some(text),
            GenerationResult::Failure { .. } => None,
        }
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            GenerationResult::Success { .. } => None,
            GenerationResult::Failure { kind, .. } => Some(*kind),
        }
    }

    pub fn into_result(self) -> std::result::Result<String, GenerationFailure> {
        match self {
            GenerationResult::Success { text } => Ok(text),
            GenerationResult::Failure { kind, message } => {
                Err(GenerationFailure { kind, message })
            }
        }
    }
}

impl From<std::result::Result<String, GenerationFailure>> for GenerationResult {
    fn from(r: std::result::Result<String, GenerationFailure>) -> Self {
        match r {
            Ok(text) => GenerationResult::Success { text },
            Err(GenerationFailure { kind, message }) => GenerationResult::Failure { kind, message },
        }
    }
}

impl From<GenerationFailure> for GenerationResult {
    fn from(f: GenerationFailure) -> Self {
        GenerationResult::Failure {
            kind: f.kind,
            message: f.message,
        }
    }
}
