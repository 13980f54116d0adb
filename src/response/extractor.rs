use crate::error_kind::ErrorKind;
use crate::protocol::ProtocolVariant;
use serde_json::Value;
use std::sync::Arc;

/// Why no text could be pulled out of a 2xx body.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExtractError {
    #[error("response body is not valid JSON: {0}")]
    Malformed(String),

    #[error("unexpected response shape: {0}")]
    UnexpectedShape(String),
}

impl ExtractError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ExtractError::Malformed(_) => ErrorKind::EmptyGeneration,
            ExtractError::UnexpectedShape(_) => ErrorKind::UpstreamError,
        }
    }
}

/// Pulls the generated text out of a successful response body.
///
/// A present-but-null text field yields an empty string; the sanitizer turns
/// that into the placeholder.
pub trait ResponseExtractor: Send + Sync {
    fn extract(&self, body: &str) -> Result<String, ExtractError>;
}

fn parse(body: &str) -> Result<Value, ExtractError> {
    serde_json::from_str(body).map_err(|e| ExtractError::Malformed(e.to_string()))
}

fn shape_hint(value: &Value) -> String {
    let mut s = value.to_string();
    if s.chars().count() > 200 {
        s = s.chars().take(200).collect::<String>() + "...";
    }
    s
}

/// Text of a JSON field: strings as-is, null or absent as empty.
fn text_field(value: Option<&Value>) -> Option<String> {
    match value {
        None | Some(Value::Null) => Some(String::new()),
        Some(Value::String(s)) => Some(s.clone()),
        Some(_) => None,
    }
}

/// `choices[0].message.content`, falling back to `choices[0].text`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChatCompletionsExtractor;

impl ResponseExtractor for ChatCompletionsExtractor {
    fn extract(&self, body: &str) -> Result<String, ExtractError> {
        let json = parse(body)?;
        let Some(choice) = json
            .get("choices")
            .and_then(Value::as_array)
            .and_then(|c| c.first())
        else {
            return Err(ExtractError::UnexpectedShape(shape_hint(&json)));
        };

        if let Some(message) = choice.get("message") {
            if let Some(text) = text_field(message.get("content")) {
                if !text.is_empty() {
                    return Ok(text);
                }
            }
        }
        match choice.get("text") {
            Some(Value::String(s)) => Ok(s.clone()),
            Some(Value::Null) | None => Ok(String::new()),
            Some(other) => Err(ExtractError::UnexpectedShape(shape_hint(other))),
        }
    }
}

/// `[{"generated_text": ..}]` or `{"generated_text": ..}`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextGenerationExtractor;

impl ResponseExtractor for TextGenerationExtractor {
    fn extract(&self, body: &str) -> Result<String, ExtractError> {
        let json = parse(body)?;
        let item = match &json {
            Value::Array(items) => items.first(),
            Value::Object(_) => Some(&json),
            _ => None,
        };
        item.filter(|v| v.get("generated_text").is_some())
            .and_then(|v| text_field(v.get("generated_text")))
            .ok_or_else(|| ExtractError::UnexpectedShape(shape_hint(&json)))
    }
}

pub fn extractor_for(variant: ProtocolVariant) -> Arc<dyn ResponseExtractor> {
    match variant {
        ProtocolVariant::ChatCompletions => Arc::new(ChatCompletionsExtractor),
        ProtocolVariant::TextGeneration => Arc::new(TextGenerationExtractor),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_message_content() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"Hi!"}}]}"#;
        assert_eq!(ChatCompletionsExtractor.extract(body).unwrap(), "Hi!");
    }

    #[test]
    fn chat_text_fallback_and_null_content() {
        let body = r#"{"choices":[{"text":"legacy"}]}"#;
        assert_eq!(ChatCompletionsExtractor.extract(body).unwrap(), "legacy");
        let body = r#"{"choices":[{"message":{"content":null}}]}"#;
        assert_eq!(ChatCompletionsExtractor.extract(body).unwrap(), "");
    }

    #[test]
    fn chat_unknown_shape_is_upstream_error() {
        let err = ChatCompletionsExtractor
            .extract(r#"{"error":"overloaded"}"#)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UpstreamError);
        let err = ChatCompletionsExtractor.extract(r#"{"choices":[]}"#).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UpstreamError);
    }

    #[test]
    fn malformed_body_is_empty_generation() {
        let err = TextGenerationExtractor.extract("<html>502</html>").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::EmptyGeneration);
        let err = ChatCompletionsExtractor.extract("").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::EmptyGeneration);
    }

    #[test]
    fn text_generation_shapes() {
        let e = TextGenerationExtractor;
        assert_eq!(e.extract(r#"[{"generated_text":"a"}]"#).unwrap(), "a");
        assert_eq!(e.extract(r#"{"generated_text":"b"}"#).unwrap(), "b");
        assert_eq!(e.extract(r#"{"generated_text":""}"#).unwrap(), "");
        assert_eq!(e.extract(r#"{"generated_text":null}"#).unwrap(), "");
        assert_eq!(
            e.extract(r#"[]"#).unwrap_err().kind(),
            ErrorKind::UpstreamError
        );
        assert_eq!(
            e.extract(r#"{"text":"x"}"#).unwrap_err().kind(),
            ErrorKind::UpstreamError
        );
    }
}
