//! 上下文窗口模块：在 token 预算内选择最近的对话历史。
//!
//! # Context Window Module
//!
//! Keeps `preamble + history + new turn + reserved response` within the
//! model's context window by dropping the oldest history first.
//!
//! Selection rules:
//! - history is walked newest to oldest and accumulated while it fits
//! - the walk stops at the first turn that would overflow; smaller older turns
//!   are never pulled in out of order
//! - a turn is never cut in the middle
//! - a non-positive budget yields no history rather than an error
//!
//! ```rust
//! use chat_orchestrator::context::{ContextWindowManager, TokenBudget};
//! use chat_orchestrator::tokens::CharacterEstimator;
//! use chat_orchestrator::types::Turn;
//! use std::sync::Arc;
//!
//! let manager = ContextWindowManager::new(
//!     TokenBudget::new(8000, 512, 100),
//!     Arc::new(CharacterEstimator::new()),
//! );
//! let history = vec![Turn::user("Hi!"), Turn::assistant("Hello there.")];
//! let selection = manager.select("You are Alice.", &history, "How are you?");
//! assert_eq!(selection.turns.len(), 2);
//! ```

mod budget;
mod window;

pub use budget::TokenBudget;
pub use window::{ContextSelection, ContextWindowManager};
