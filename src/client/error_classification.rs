//! Response classification

use crate::error_kind::ErrorKind;
use crate::response::{ResponseExtractor, Sanitizer};
use crate::transport::TransportResponse;
use crate::types::GenerationResult;

const BODY_SNIPPET_CHARS: usize = 300;

/// Turn a received response into the call's final result.
///
/// Received responses are never retried: 2xx goes through extraction and
/// sanitization, any other status maps onto the error taxonomy.
pub(crate) fn classify_response(
    resp: &TransportResponse,
    extractor: &dyn ResponseExtractor,
    sanitizer: &Sanitizer,
) -> GenerationResult {
    match ErrorKind::from_http_status(resp.status) {
        None => match extractor.extract(&resp.body) {
            Ok(raw) => GenerationResult::success(sanitizer.sanitize(&raw)),
            Err(e) => GenerationResult::failure(e.kind(), e.to_string()),
        },
        Some(kind) => GenerationResult::failure(kind, status_message(resp, kind)),
    }
}

fn status_message(resp: &TransportResponse, kind: ErrorKind) -> String {
    let mut message = match kind {
        ErrorKind::RateLimited => format!("HTTP {}: rate limit exceeded", resp.status),
        ErrorKind::ModelUnavailable => format!("HTTP {}: model is loading or unavailable", resp.status),
        ErrorKind::InvalidRequest => format!("HTTP {}: request rejected by endpoint", resp.status),
        _ => format!("HTTP {}: upstream error", resp.status),
    };
    if let Some(after) = resp.retry_after {
        message.push_str(&format!(" (retry after {}s)", after.as_secs()));
    }
    let snippet = body_snippet(&resp.body);
    if !snippet.is_empty() {
        message.push_str(": ");
        message.push_str(&snippet);
    }
    message
}

fn body_snippet(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.chars().count() <= BODY_SNIPPET_CHARS {
        trimmed.to_string()
    } else {
        trimmed.chars().take(BODY_SNIPPET_CHARS).collect::<String>() + "..."
    }
}
