//! 响应处理模块：从两种后端响应格式中提取文本并清洗协议残留。
//!
//! # Response Normalization Module
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`ResponseExtractor`] | Per-variant text extraction from a 2xx body |
//! | [`Sanitizer`] | Marker stripping, label stripping, placeholder and length cap |
//!
//! ```rust
//! use chat_orchestrator::response::Sanitizer;
//!
//! let sanitizer = Sanitizer::default();
//! assert_eq!(sanitizer.sanitize("<|im_start|>assistant\nHello!<|im_end|>"), "Hello!");
//! assert!(!sanitizer.sanitize("").is_empty());
//! ```

mod extractor;
mod sanitizer;

pub use extractor::{
    extractor_for, ChatCompletionsExtractor, ExtractError, ResponseExtractor,
    TextGenerationExtractor,
};
pub use sanitizer::Sanitizer;
