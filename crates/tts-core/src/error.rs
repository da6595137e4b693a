//! Unified error types for the synthesis core.

use std::path::PathBuf;

/// Main error type for synthesis operations.
///
/// Lexicon misses and tokenizer gaps are recovered where they occur (fallback
/// phonemizer, byte-fallback pieces) and intentionally have no variant here.
#[derive(Debug, thiserror::Error)]
pub enum TtsError {
    /// Phonemization failed beyond local recovery.
    #[error("phonemization failed: {0}")]
    Phonemize(String),

    /// Tokenization failed (malformed vocabulary, bad input).
    #[error("tokenization failed: {0}")]
    Tokenize(String),

    /// A model session call failed; the utterance is abandoned.
    #[error("model invocation failed: {0}")]
    ModelInvocation(String),

    /// A model produced outputs that do not match its declared specs.
    #[error("model output mismatch: {0}")]
    ModelOutput(String),

    /// Persisted voice state could not be parsed.
    #[error("voice state corrupt for {path}: {reason}")]
    VoiceState { path: PathBuf, reason: String },

    /// Unknown voice identifier.
    #[error("unknown voice: {0}")]
    UnknownVoice(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Invalid input provided by the caller.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Audio resampling or format conversion error.
    #[error("audio processing error: {0}")]
    Audio(String),

    /// Internal error (should not happen in normal operation).
    #[error("internal error: {0}")]
    Internal(String),
}

/// Convenience type alias for Results with TtsError.
pub type TtsResult<T> = Result<T, TtsError>;

impl TtsError {
    /// Create a phonemization error with message.
    pub fn phonemize(msg: impl Into<String>) -> Self {
        Self::Phonemize(msg.into())
    }

    /// Create a tokenization error with message.
    pub fn tokenize(msg: impl Into<String>) -> Self {
        Self::Tokenize(msg.into())
    }

    /// Create a model invocation error with message.
    pub fn model(msg: impl Into<String>) -> Self {
        Self::ModelInvocation(msg.into())
    }

    /// Create a model output mismatch error with message.
    pub fn output(msg: impl Into<String>) -> Self {
        Self::ModelOutput(msg.into())
    }

    /// Create a voice state error for a path.
    pub fn voice_state(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::VoiceState {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a config error with message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an invalid input error with message.
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create an internal error with message.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}
