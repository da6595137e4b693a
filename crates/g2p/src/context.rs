//! Rolling phonetic context.

/// State threaded through a token sequence so context-sensitive entries
/// resolve correctly ("the" before a vowel, "used" before "to").
///
/// Resolution walks the tokens from the end of the utterance backwards, so
/// each token sees what *follows* it; the context is mutated per token and
/// discarded after the utterance.
#[derive(Debug, Clone, Default)]
pub struct PhonemeContext {
    /// Whether the following sound starts with a vowel; `None` when nothing
    /// pronounceable follows (end of utterance, clause boundary).
    pub future_vowel: Option<bool>,
    /// Whether the following token is the preposition-like "to".
    pub future_to: bool,
}

impl PhonemeContext {
    /// Context at the very end of an utterance.
    pub fn end_of_utterance() -> Self {
        Self::default()
    }

    /// Reset at a clause boundary; what came after the boundary no longer
    /// conditions pronunciation.
    pub fn reset(&mut self) {
        self.future_vowel = None;
        self.future_to = false;
    }
}
