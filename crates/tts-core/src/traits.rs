//! Trait definitions for pipeline collaborators.

use crate::error::TtsResult;

/// Text normalization.
///
/// Implementations convert raw input text into a form suitable for
/// phonemization: link markup stripped, numerals spelled out, symbols
/// cleaned up.
pub trait TextNormalizer: Send + Sync {
    /// Normalize the input text.
    fn normalize(&self, input: &str) -> TtsResult<String>;
}

/// Token encoding: text (or a phoneme string) to model input ids.
pub trait TokenEncoder: Send + Sync {
    /// Encode into token ids.
    fn encode(&self, text: &str) -> TtsResult<Vec<i64>>;

    /// Get the vocabulary size.
    fn vocab_size(&self) -> usize;
}

/// External general-purpose phonemizer used when the primary lexicon has no
/// entry.
///
/// Injected into the G2P resolver at construction; the implementation owns
/// its own synchronization. Returning `None` or an empty string means the
/// unit stays unresolved and is dropped from the utterance.
pub trait FallbackPhonemizer: Send + Sync {
    /// Convert literal text to an IPA phoneme string for the given language
    /// tag (e.g. `"en-us"`).
    fn text_to_phonemes(&self, text: &str, language: &str) -> Option<String>;
}

/// A fallback phonemizer that never resolves anything. Useful for tests and
/// for hosts that ship no secondary phonemizer.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFallback;

impl FallbackPhonemizer for NoFallback {
    fn text_to_phonemes(&self, _text: &str, _language: &str) -> Option<String> {
        None
    }
}
