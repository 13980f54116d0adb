//! Request orchestrator: context selection, prompt assembly, gated dispatch
//! with retry, and response normalization behind one `generate` call.
//!
//! Implementation details are split into submodules under `src/client/`.

pub mod builder;
pub mod core;
pub(crate) mod error_classification;
mod execution;
pub mod health;
pub mod signals;
pub mod types;

pub use builder::OrchestratorBuilder;
pub use core::Orchestrator;
pub use health::HealthReport;
pub use signals::SignalsSnapshot;
pub use types::{CallState, CallStats};
