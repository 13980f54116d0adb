use serde::{Deserialize, Serialize};

/// Token budget of one call, derived from configuration.
///
/// All fields are token counts. Not persisted; rebuilt on every call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenBudget {
    pub context_window_capacity: usize,
    pub reserved_for_response: usize,
    pub reserved_safety_margin: usize,
}

impl TokenBudget {
    pub fn new(
        context_window_capacity: usize,
        reserved_for_response: usize,
        reserved_safety_margin: usize,
    ) -> Self {
        Self {
            context_window_capacity,
            reserved_for_response,
            reserved_safety_margin,
        }
    }

    pub fn reserved(&self) -> usize {
        self.reserved_for_response
            .saturating_add(self.reserved_safety_margin)
    }

    /// Tokens left for history once preamble, new turn and reserves are paid.
    ///
    /// Signed: a negative value means the fixed parts already overflow.
    pub fn available_for_history(&self, system_tokens: usize, new_turn_tokens: usize) -> i64 {
        self.context_window_capacity as i64
            - system_tokens as i64
            - new_turn_tokens as i64
            - self.reserved() as i64
    }

    /// True when preamble and new turn alone do not fit, ignoring reserves.
    pub fn fixed_part_overflows(&self, system_tokens: usize, new_turn_tokens: usize) -> bool {
        system_tokens.saturating_add(new_turn_tokens) > self.context_window_capacity
    }
}
