//! 类型模块：对话轮次、请求与生成结果。
//!
//! # Types Module
//!
//! Core data model shared by every stage of the pipeline.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Turn`] | One message tagged with a [`Role`] |
//! | [`ConversationRequest`] | Immutable input of one generation call |
//! | [`GenerationResult`] | Success text or a typed failure |
//! | [`GenerationFailure`] | Failure kind plus message, usable as `std::error::Error` |
//!
//! ## Example
//!
//! ```rust
//! use chat_orchestrator::types::{ConversationRequest, Turn};
//!
//! let request = ConversationRequest::new("You are a helpful assistant", "And tomorrow?")
//!     .with_history(vec![
//!         Turn::user("What's the weather?"),
//!         Turn::assistant("Sunny today."),
//!     ])
//!     .with_profile_context("Lives in Kyiv");
//! assert_eq!(request.history().len(), 2);
//! ```

pub mod message;
pub mod request;
pub mod result;

pub use message::{Role, Turn};
pub use request::ConversationRequest;
pub use result::{GenerationFailure, GenerationResult};
