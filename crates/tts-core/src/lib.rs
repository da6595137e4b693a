//! # tts-core
//!
//! Core types, traits, and error definitions for the purrtts synthesis core.
//!
//! This crate provides the foundational abstractions used across all other
//! crates in the workspace, including:
//!
//! - Common data types (`AudioChunk`, `LatentFrame`, `CancelToken`)
//! - The opaque model-session abstraction (`ModelSession`, `TensorValue`)
//! - Trait definitions for pipeline collaborators
//! - Unified error handling via `TtsError`
//! - Generation configuration supplied by the host

pub mod config;
pub mod error;
pub mod session;
pub mod traits;
pub mod types;

pub use config::{DecodingMode, GenerationConfig};
pub use error::{TtsError, TtsResult};
pub use session::{DType, Dim, ModelSession, StateMap, TensorSpec, TensorValue};
pub use traits::{FallbackPhonemizer, TextNormalizer, TokenEncoder};
pub use types::{AudioChunk, CancelToken, LatentFrame};
