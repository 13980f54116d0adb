use super::budget::TokenBudget;
use crate::tokens::TokenCounter;
use crate::types::Turn;
use std::sync::Arc;
use tracing::{debug, warn};

/// History chosen for one call, plus the token accounting behind the choice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextSelection {
    /// Included turns, chronological. Always a suffix of the input history.
    pub turns: Vec<Turn>,
    pub system_tokens: usize,
    pub new_turn_tokens: usize,
    pub history_tokens: usize,
    pub available_for_history: i64,
    /// Number of oldest turns left out.
    pub dropped: usize,
}

impl ContextSelection {
    pub fn tokens_used(&self) -> usize {
        self.system_tokens + self.new_turn_tokens + self.history_tokens
    }

    pub fn is_truncated(&self) -> bool {
        self.dropped > 0
    }
}

/// Chooses the longest suffix of history that fits the token budget.
#[derive(Clone)]
pub struct ContextWindowManager {
    budget: TokenBudget,
    counter: Arc<dyn TokenCounter>,
}

impl ContextWindowManager {
    pub fn new(budget: TokenBudget, counter: Arc<dyn TokenCounter>) -> Self {
        Self { budget, counter }
    }

    pub fn budget(&self) -> TokenBudget {
        self.budget
    }

    pub fn counter(&self) -> &Arc<dyn TokenCounter> {
        &self.counter
    }

    /// Never fails: an exhausted budget yields an empty selection.
    pub fn select(&self, system_preamble: &str, history: &[Turn], new_user_turn: &str) -> ContextSelection {
        let system_tokens = self.counter.count(system_preamble);
        let new_turn_tokens = self.counter.count(new_user_turn);
        let available = self
            .budget
            .available_for_history(system_tokens, new_turn_tokens);

        debug!(
            capacity = self.budget.context_window_capacity,
            system_tokens,
            new_turn_tokens,
            reserved = self.budget.reserved(),
            available_for_history = available,
            "context budget computed"
        );

        if available <= 0 {
            if !history.is_empty() {
                warn!(
                    available_for_history = available,
                    history_len = history.len(),
                    "no tokens available for chat history"
                );
            }
            return ContextSelection {
                turns: Vec::new(),
                system_tokens,
                new_turn_tokens,
                history_tokens: 0,
                available_for_history: available,
                dropped: history.len(),
            };
        }

        let limit = available as usize;
        let mut used = 0usize;
        let mut start = history.len();
        for (idx, turn) in history.iter().enumerate().rev() {
            let tokens = self.counter.count(&turn.content);
            if used + tokens > limit {
                break;
            }
            used += tokens;
            start = idx;
        }

        let selection = ContextSelection {
            turns: history[start..].to_vec(),
            system_tokens,
            new_turn_tokens,
            history_tokens: used,
            available_for_history: available,
            dropped: start,
        };

        debug!(
            included = selection.turns.len(),
            total = history.len(),
            history_tokens = used,
            "history selected"
        );
        selection
    }
}
