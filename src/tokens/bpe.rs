//! Subword tokenizer backed by `tiktoken-rs`, with estimator fallback.

use super::counter::{CharacterEstimator, TokenCounter};
use crate::{Error, ErrorContext, Result};
use serde::{Deserialize, Serialize};
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex};
use tiktoken_rs::CoreBPE;
use tracing::warn;

/// Which counting strategy to construct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenizerKind {
    #[default]
    Cl100k,
    O200k,
    Estimate,
}

impl TokenizerKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cl100k" | "cl100k_base" => Some(Self::Cl100k),
            "o200k" | "o200k_base" => Some(Self::O200k),
            "estimate" | "chars" => Some(Self::Estimate),
            _ => None,
        }
    }
}

pub struct BpeCounter {
    kind: TokenizerKind,
    bpe: Mutex<CoreBPE>,
    fallback: CharacterEstimator,
}

impl BpeCounter {
    pub fn load(kind: TokenizerKind) -> Result<Self> {
        let loaded = match kind {
            TokenizerKind::Cl100k => tiktoken_rs::cl100k_base(),
            TokenizerKind::O200k => tiktoken_rs::o200k_base(),
            TokenizerKind::Estimate => {
                return Err(Error::configuration_with_context(
                    "estimate is not a BPE vocabulary",
                    ErrorContext::new()
                        .with_field_path("tokenizer")
                        .with_source("bpe_counter"),
                ))
            }
        };
        let bpe = loaded.map_err(|e| {
            Error::configuration_with_context(
                format!("failed to load BPE ranks: {}", e),
                ErrorContext::new()
                    .with_field_path("tokenizer")
                    .with_source("bpe_counter"),
            )
        })?;
        Ok(Self {
            kind,
            bpe: Mutex::new(bpe),
            fallback: CharacterEstimator::new(),
        })
    }

    pub fn kind(&self) -> TokenizerKind {
        self.kind
    }

    fn encode_len(&self, text: &str) -> Option<usize> {
        let bpe = self.bpe.lock().ok()?;
        panic::catch_unwind(AssertUnwindSafe(|| {
            bpe.encode_with_special_tokens(text).len()
        }))
        .ok()
    }
}

impl TokenCounter for BpeCounter {
    fn count(&self, text: &str) -> usize {
        if text.is_empty() {
            return 0;
        }
        match self.encode_len(text) {
            Some(n) => n,
            None => {
                warn!(
                    tokenizer = ?self.kind,
                    chars = text.chars().count(),
                    "tokenizer failed, using character estimate"
                );
                self.fallback.count(text)
            }
        }
    }

    fn name(&self) -> &'static str {
        match self.kind {
            TokenizerKind::Cl100k => "cl100k_base",
            TokenizerKind::O200k => "o200k_base",
            TokenizerKind::Estimate => "estimate",
        }
    }
}

/// Pick the counting strategy once, at construction time.
///
/// A vocabulary that fails to load degrades to [`CharacterEstimator`].
pub fn select_counter(kind: TokenizerKind) -> Arc<dyn TokenCounter> {
    if kind == TokenizerKind::Estimate {
        return Arc::new(CharacterEstimator::new());
    }
    match BpeCounter::load(kind) {
        Ok(counter) => Arc::new(counter),
        Err(e) => {
            warn!(error = %e, "falling back to character estimate for token counting");
            Arc::new(CharacterEstimator::new())
        }
    }
}
