//! # runtime
//!
//! Scheduling and observability plumbing for the purrtts synthesis core:
//!
//! - [`scheduler`]: the adaptive producer/consumer coupling between frame
//!   generation and codec decoding (bounded channel, one producer thread,
//!   one consumer, close propagates downstream)
//! - [`perf`]: per-frame timing window and the speed-ratio buffer tiers
//! - [`metrics`]: metric registration and recording helpers
//! - [`tracing_setup`]: subscriber initialization for binaries

pub mod metrics;
pub mod perf;
pub mod scheduler;
pub mod tracing_setup;

pub use metrics::TtsMetrics;
pub use perf::{AdaptivePacing, PacingParams, PacingTier, PacingTiers, PerfWindow};
pub use scheduler::{FrameSink, run_streaming};
