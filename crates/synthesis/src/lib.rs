//! # synthesis
//!
//! Neural synthesis engines for the purrtts core, driven through opaque
//! model sessions:
//!
//! - [`FeedForwardEngine`]: one call per token batch, full audio buffer out.
//! - [`FlowMatchingEngine`]: autoregressive three-stage generation (voice
//!   conditioning, text conditioning, per-frame loop) with fixed-step Euler
//!   integration of a learned velocity field.
//!
//! Both engines are single-utterance at a time; recurrent state lives for
//! exactly one generation call.

pub mod euler;
mod feed_forward;
mod flow_matching;

pub use feed_forward::{FeedForwardEngine, StyleTable, TrimPolicy};
pub use flow_matching::{FlowMatchingEngine, LoopOutcome};
