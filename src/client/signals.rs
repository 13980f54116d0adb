use crate::resilience::GateSnapshot;
use serde::Serialize;

/// Facts-only view of the admission gate for application-level decisions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignalsSnapshot {
    pub max_concurrent: usize,
    pub available: usize,
    pub in_use: usize,
    pub min_interval_ms: u64,
    pub estimated_wait_ms: Option<u64>,
}

impl From<GateSnapshot> for SignalsSnapshot {
    fn from(s: GateSnapshot) -> Self {
        Self {
            max_concurrent: s.max_concurrent,
            available: s.available,
            in_use: s.in_use,
            min_interval_ms: s.min_interval_ms,
            estimated_wait_ms: s.estimated_wait_ms,
        }
    }
}

impl SignalsSnapshot {
    /// No free slot right now.
    pub fn is_saturated(&self) -> bool {
        self.available == 0
    }
}
