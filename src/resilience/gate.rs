use super::clock::{Clock, TokioClock};
use crate::{Error, ErrorContext, Result};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, OwnedSemaphorePermit, Semaphore};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GateSnapshot {
    pub max_concurrent: usize,
    pub available: usize,
    pub in_use: usize,
    pub min_interval_ms: u64,
    /// Estimated pacing wait before the next dispatch (ms), if any.
    pub estimated_wait_ms: Option<u64>,
}

/// Process-wide admission control for outbound calls.
///
/// Bounded concurrency (semaphore) plus a minimum interval between
/// dispatches. The pacer lock is held while sleeping so concurrent callers
/// are spaced out one after another.
pub struct AdmissionGate {
    semaphore: Arc<Semaphore>,
    max_concurrent: usize,
    min_interval: Duration,
    last_dispatch: Mutex<Option<Instant>>,
    clock: Arc<dyn Clock>,
}

/// Held for the duration of one network attempt; dropping it frees the slot.
#[derive(Debug)]
pub struct GatePermit {
    _permit: OwnedSemaphorePermit,
    paced_for: Duration,
}

impl GatePermit {
    /// How long the pacer delayed this dispatch.
    pub fn paced_for(&self) -> Duration {
        self.paced_for
    }
}

/// Longest spacing the pacer accepts between two dispatches.
pub const MAX_DISPATCH_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

/// `1 / max_requests_per_second`, or `None` when pacing is disabled
/// (`<= 0`, non-finite) or the interval exceeds [`MAX_DISPATCH_INTERVAL`].
pub fn dispatch_interval(max_requests_per_second: f64) -> Option<Duration> {
    if !max_requests_per_second.is_finite() || max_requests_per_second <= 0.0 {
        return None;
    }
    Duration::try_from_secs_f64(1.0 / max_requests_per_second)
        .ok()
        .filter(|d| *d <= MAX_DISPATCH_INTERVAL)
}

impl AdmissionGate {
    /// `max_requests_per_second <= 0` disables pacing.
    pub fn new(max_concurrent: usize, max_requests_per_second: f64) -> Self {
        Self::with_clock(max_concurrent, max_requests_per_second, Arc::new(TokioClock))
    }

    pub fn with_clock(
        max_concurrent: usize,
        max_requests_per_second: f64,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let max_concurrent = max_concurrent.max(1);
        let min_interval = dispatch_interval(max_requests_per_second).unwrap_or_else(|| {
            if max_requests_per_second > 0.0 {
                MAX_DISPATCH_INTERVAL
            } else {
                Duration::ZERO
            }
        });
        Self {
            semaphore: Arc::new(Semaphore::new(max_concurrent)),
            max_concurrent,
            min_interval,
            last_dispatch: Mutex::new(None),
            clock,
        }
    }

    pub fn from_config(config: &crate::protocol::BackendConfig, clock: Arc<dyn Clock>) -> Self {
        Self::with_clock(
            config.max_concurrent_requests,
            config.max_requests_per_second,
            clock,
        )
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Wait for a slot, then for the pacer.
    pub async fn acquire(&self) -> Result<GatePermit> {
        let permit = self
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| {
                Error::runtime_with_context(
                    "admission gate is closed",
                    ErrorContext::new().with_source("admission_gate"),
                )
            })?;
        let paced_for = self.pace().await;
        if !paced_for.is_zero() {
            debug!(paced_ms = paced_for.as_millis() as u64, "dispatch paced");
        }
        Ok(GatePermit {
            _permit: permit,
            paced_for,
        })
    }

    async fn pace(&self) -> Duration {
        if self.min_interval.is_zero() {
            return Duration::ZERO;
        }
        let mut last = self.last_dispatch.lock().await;
        let mut waited = Duration::ZERO;
        if let Some(prev) = *last {
            let next_allowed = prev + self.min_interval;
            let now = self.clock.now();
            if next_allowed > now {
                waited = next_allowed - now;
                self.clock.sleep(waited).await;
            }
        }
        *last = Some(self.clock.now());
        waited
    }

    /// Reject every pending and future acquisition.
    pub fn close(&self) {
        self.semaphore.close();
    }

    pub async fn snapshot(&self) -> GateSnapshot {
        let available = self.semaphore.available_permits();
        let estimated_wait_ms = if self.min_interval.is_zero() {
            None
        } else {
            match self.last_dispatch.try_lock() {
                Ok(last) => (*last).and_then(|prev| {
                    let next_allowed = prev + self.min_interval;
                    let now = self.clock.now();
                    (next_allowed > now).then(|| (next_allowed - now).as_millis() as u64)
                }),
                // Someone is pacing right now.
                Err(_) => Some(self.min_interval.as_millis() as u64),
            }
        };
        GateSnapshot {
            max_concurrent: self.max_concurrent,
            available,
            in_use: self.max_concurrent.saturating_sub(available),
            min_interval_ms: self.min_interval.as_millis() as u64,
            estimated_wait_ms,
        }
    }
}
