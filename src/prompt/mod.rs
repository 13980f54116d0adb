//! 提示词组装模块：把系统前言、历史与新消息渲染成后端协议格式。
//!
//! # Prompt Assembly Module
//!
//! | Variant | Assembler | Payload |
//! |---------|-----------|---------|
//! | `ChatCompletions` | [`StructuredAssembler`] | `messages: [{role, content}]` |
//! | `TextGeneration` | [`CompletionAssembler`] | one string of `{open}{role}\n{content}{close}` segments |
//!
//! Assembly never truncates; the context window manager has already chosen
//! which history fits.

mod assembler;
mod template;

pub use assembler::{
    assembler_for, AssembledPrompt, CompletionAssembler, PromptAssembler, StructuredAssembler,
    WirePayload,
};
pub use template::ChatTemplate;
