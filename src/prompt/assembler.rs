use super::template::ChatTemplate;
use crate::protocol::{ProtocolVariant, SamplingParameters};
use crate::tokens::TokenCounter;
use crate::types::Turn;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;

/// What goes on the wire for one attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum WirePayload {
    Turns(Vec<Turn>),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledPrompt {
    pub payload: WirePayload,
    /// Recounted on the final text; informational only.
    pub token_count: usize,
}

impl AssembledPrompt {
    pub fn variant(&self) -> ProtocolVariant {
        match self.payload {
            WirePayload::Turns(_) => ProtocolVariant::ChatCompletions,
            WirePayload::Text(_) => ProtocolVariant::TextGeneration,
        }
    }

    /// JSON body of the generation request.
    pub fn to_request_body(&self, sampling: &SamplingParameters, model: &str) -> Value {
        match &self.payload {
            WirePayload::Turns(turns) => json!({
                "model": model,
                "messages": turns,
                "temperature": sampling.temperature,
                "top_p": sampling.top_p,
                "top_k": sampling.top_k,
                "max_tokens": sampling.max_response_tokens,
                "repetition_penalty": sampling.repetition_penalty,
                "frequency_penalty": sampling.frequency_penalty,
                "presence_penalty": sampling.presence_penalty,
                "no_repeat_ngram_size": sampling.no_repeat_ngram_size,
                "do_sample": sampling.do_sample,
                "min_p": sampling.min_p,
                "stream": false,
            }),
            WirePayload::Text(text) => json!({
                "inputs": text,
                "parameters": {
                    "max_new_tokens": sampling.max_response_tokens,
                    "temperature": sampling.temperature,
                    "top_p": sampling.top_p,
                    "top_k": sampling.top_k,
                    "repetition_penalty": sampling.repetition_penalty,
                    "frequency_penalty": sampling.frequency_penalty,
                    "presence_penalty": sampling.presence_penalty,
                    "no_repeat_ngram_size": sampling.no_repeat_ngram_size,
                    "do_sample": sampling.do_sample,
                    "min_p": sampling.min_p,
                    "return_full_text": false,
                },
                "options": {
                    "wait_for_model": true,
                    "use_cache": false,
                },
            }),
        }
    }
}

/// Renders preamble, selected history and the new turn into a wire payload.
///
/// Implementations are pure; they never drop or shorten turns.
pub trait PromptAssembler: Send + Sync {
    fn variant(&self) -> ProtocolVariant;

    fn assemble(&self, system_preamble: &str, history: &[Turn], new_user_turn: &str)
        -> AssembledPrompt;
}

/// Ordered role/content turns: system, history, new user turn.
pub struct StructuredAssembler {
    counter: Arc<dyn TokenCounter>,
}

impl StructuredAssembler {
    pub fn new(counter: Arc<dyn TokenCounter>) -> Self {
        Self { counter }
    }
}

impl PromptAssembler for StructuredAssembler {
    fn variant(&self) -> ProtocolVariant {
        ProtocolVariant::ChatCompletions
    }

    fn assemble(
        &self,
        system_preamble: &str,
        history: &[Turn],
        new_user_turn: &str,
    ) -> AssembledPrompt {
        let mut turns = Vec::with_capacity(history.len() + 2);
        turns.push(Turn::system(system_preamble));
        turns.extend(history.iter().cloned());
        turns.push(Turn::user(new_user_turn));
        let token_count = self.counter.count_turns(&turns);
        AssembledPrompt {
            payload: WirePayload::Turns(turns),
            token_count,
        }
    }
}

/// Single prompt string of marker-delimited segments ending in an open
/// assistant segment.
pub struct CompletionAssembler {
    template: ChatTemplate,
    counter: Arc<dyn TokenCounter>,
}

impl CompletionAssembler {
    pub fn new(template: ChatTemplate, counter: Arc<dyn TokenCounter>) -> Self {
        Self { template, counter }
    }
}

impl PromptAssembler for CompletionAssembler {
    fn variant(&self) -> ProtocolVariant {
        ProtocolVariant::TextGeneration
    }

    fn assemble(
        &self,
        system_preamble: &str,
        history: &[Turn],
        new_user_turn: &str,
    ) -> AssembledPrompt {
        let mut segments = Vec::with_capacity(history.len() + 3);
        segments.push(self.template.segment(crate::types::Role::System, system_preamble));
        segments.extend(
            history
                .iter()
                .map(|t| self.template.segment(t.role, &t.content)),
        );
        segments.push(self.template.segment(crate::types::Role::User, new_user_turn));
        segments.push(self.template.assistant_prefix());
        let text = segments.join("\n");
        let token_count = self.counter.count(&text);
        AssembledPrompt {
            payload: WirePayload::Text(text),
            token_count,
        }
    }
}

/// Strategy for the configured variant, chosen once.
pub fn assembler_for(
    variant: ProtocolVariant,
    template: ChatTemplate,
    counter: Arc<dyn TokenCounter>,
) -> Arc<dyn PromptAssembler> {
    match variant {
        ProtocolVariant::ChatCompletions => Arc::new(StructuredAssembler::new(counter)),
        ProtocolVariant::TextGeneration => Arc::new(CompletionAssembler::new(template, counter)),
    }
}
