//! 请求执行逻辑：准入闸门、单次发送与网络错误重试。
//!
//! Request execution: gate admission, dispatch and the network retry loop.

use crate::client::types::{CallState, CallStats};
use crate::error_kind::ErrorKind;
use crate::transport::{TransportError, TransportResponse};
use crate::types::GenerationFailure;
use serde_json::Value;
use tracing::{debug, warn};

use super::core::Orchestrator;

struct CallTracker<'a> {
    request_id: &'a str,
    state: CallState,
}

impl<'a> CallTracker<'a> {
    fn new(request_id: &'a str) -> Self {
        Self {
            request_id,
            state: CallState::Pending,
        }
    }

    fn transition(&mut self, next: CallState, attempt: u32) {
        debug!(
            request_id = self.request_id,
            from = self.state.as_str(),
            to = next.as_str(),
            attempt,
            "call state transition"
        );
        self.state = next;
    }
}

impl Orchestrator {
    /// Dispatch `body` until a response is received or the retry budget is
    /// spent. Only network-level failures are retried.
    pub(crate) async fn execute_with_retry(
        &self,
        body: &Value,
        request_id: &str,
        stats: &mut CallStats,
    ) -> Result<TransportResponse, GenerationFailure> {
        let mut tracker = CallTracker::new(request_id);
        let mut retries_done: u32 = 0;

        loop {
            let attempt = retries_done + 1;
            tracker.transition(CallState::Gated, attempt);
            let permit = self.gate.acquire().await.map_err(|e| {
                tracker.transition(CallState::Failed, attempt);
                GenerationFailure::new(ErrorKind::ModelUnavailable, e.to_string())
            })?;

            tracker.transition(CallState::InFlight, attempt);
            stats.attempts = attempt;
            let timeout = self.config.timeout();
            let sent = tokio::time::timeout(timeout, self.transport.send(body, request_id)).await;
            drop(permit);

            let err = match sent {
                Ok(Ok(resp)) => {
                    tracker.transition(CallState::Succeeded, attempt);
                    return Ok(resp);
                }
                Ok(Err(e)) => e,
                Err(_) => TransportError::Timeout(format!("no response within {:?}", timeout)),
            };

            if !err.is_network() {
                tracker.transition(CallState::Failed, attempt);
                return Err(GenerationFailure::new(
                    ErrorKind::InvalidRequest,
                    err.to_string(),
                ));
            }

            match self.retry.next_delay(retries_done) {
                Some(delay) => {
                    tracker.transition(CallState::Retrying, attempt);
                    warn!(
                        request_id,
                        attempt,
                        max_attempts = self.retry.max_attempts(),
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "network error, retrying"
                    );
                    self.clock.sleep(delay).await;
                    retries_done += 1;
                    stats.retry_count = retries_done;
                }
                None => {
                    tracker.transition(CallState::Failed, attempt);
                    return Err(GenerationFailure::new(
                        ErrorKind::ModelUnavailable,
                        format!("endpoint unreachable after {} attempt(s): {}", attempt, err),
                    ));
                }
            }
        }
    }
}
