//! Token 计数模块：真实分词器优先，字符估算兜底。
//!
//! # Token Counting Module
//!
//! Context-window capacity is measured in tokens, so every budget decision
//! goes through a [`TokenCounter`].
//!
//! ## Key Components
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`TokenCounter`] | Strategy trait; `count` never fails |
//! | [`BpeCounter`] | Subword tokenizer (`cl100k_base` / `o200k_base`), falls back on internal failure |
//! | [`CharacterEstimator`] | Deterministic `ceil(chars / 4)` estimate |
//! | [`CachingCounter`] | LRU memo in front of any counter |
//! | [`select_counter`] | Picks the strategy once, at construction time |
//!
//! ## Example
//!
//! ```rust
//! use chat_orchestrator::tokens::{CharacterEstimator, TokenCounter};
//!
//! let counter = CharacterEstimator::new();
//! assert_eq!(counter.count(""), 0);
//! assert_eq!(counter.count("Hello, world"), 3);
//! ```

mod bpe;
mod counter;

pub use bpe::{select_counter, BpeCounter, TokenizerKind};
pub use counter::{CachingCounter, CharacterEstimator, TokenCounter};
