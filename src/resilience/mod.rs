//! 弹性模块：准入闸门（并发 + 节流）、指数退避重试与可注入时钟。
//!
//! # Resilience Primitives Module
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`gate`] | Semaphore-bounded concurrency plus a minimum-interval pacer |
//! | [`retry`] | Exponential backoff for network-level failures |
//! | [`clock`] | `Clock` trait with a real and a virtual implementation |
//!
//! One [`AdmissionGate`] exists per process; it is built once and shared by
//! `Arc` handle.
//!
//! ```rust
//! use chat_orchestrator::resilience::{AdmissionGate, RetryPolicy};
//! use std::time::Duration;
//!
//! let gate = AdmissionGate::new(5, 5.0);
//! assert_eq!(gate.min_interval(), Duration::from_millis(200));
//!
//! let policy = RetryPolicy::default();
//! assert_eq!(policy.next_delay(0), Some(Duration::from_secs(1)));
//! ```

pub mod clock;
pub mod gate;
pub mod retry;

pub use clock::{Clock, ManualClock, TokioClock};
pub use gate::{dispatch_interval, AdmissionGate, GatePermit, GateSnapshot, MAX_DISPATCH_INTERVAL};
pub use retry::RetryPolicy;
