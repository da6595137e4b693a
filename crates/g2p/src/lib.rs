//! # g2p
//!
//! Grapheme-to-phoneme resolution for the purrtts synthesis core.
//!
//! The resolver turns normalized text into an IPA phoneme string:
//!
//! 1. Tokenize into linguistic units (words, punctuation, clitics,
//!    compound halves, case-transition fragments)
//! 2. Tag units with coarse part-of-speech heuristics
//! 3. Resolve each unit through the lexicon (dictionary, variant maps,
//!    morphological stemming), threading phonetic context so entries like
//!    "the" pick the right form
//! 4. Fall back to an injected external phonemizer on a miss; a unit both
//!    paths fail on contributes nothing and the utterance continues
//! 5. Concatenate with the original inter-token whitespace, map punctuation
//!    through a static table, and truncate to the downstream tensor bound

mod context;
mod lexicon;
mod tagger;
mod tokens;

use std::sync::Arc;

use tracing::{debug, instrument, trace};
use tts_core::{FallbackPhonemizer, TextNormalizer, TtsResult};

pub use context::PhonemeContext;
pub use lexicon::{Dialect, Lexicon, starts_with_vowel};
pub use tagger::PosTag;
pub use tokens::{LinguisticToken, RATING_GOLD, RATING_SILVER, tokenize};

/// Upper bound on the resolved phoneme string, in characters. Bounds the
/// tensor sizes of everything downstream.
pub const MAX_PHONEME_LEN: usize = 510;

/// Fixed phoneme-adjacent symbols for punctuation units. These bypass the
/// lexicon; straight double quotes alternate open/close.
fn punctuation_symbol(c: char, quote_open: &mut bool) -> Option<&'static str> {
    match c {
        '.' => Some("."),
        ',' => Some(","),
        '!' => Some("!"),
        '?' => Some("?"),
        ';' => Some(";"),
        ':' => Some(":"),
        '(' => Some("("),
        ')' => Some(")"),
        '\u{201C}' => Some("\u{201C}"),
        '\u{201D}' => Some("\u{201D}"),
        '"' => {
            let symbol = if *quote_open { "\u{201D}" } else { "\u{201C}" };
            *quote_open = !*quote_open;
            Some(symbol)
        }
        _ => None,
    }
}

/// Grapheme-to-phoneme resolver.
///
/// Owns the lexicon; the normalizer and the fallback phonemizer are injected
/// at construction.
pub struct G2pResolver {
    normalizer: Box<dyn TextNormalizer>,
    lexicon: Lexicon,
    fallback: Arc<dyn FallbackPhonemizer>,
    language: String,
    max_len: usize,
}

impl G2pResolver {
    /// Create a resolver over the built-in lexicon.
    pub fn new(
        normalizer: Box<dyn TextNormalizer>,
        fallback: Arc<dyn FallbackPhonemizer>,
    ) -> Self {
        Self::with_lexicon(normalizer, Lexicon::builtin(), fallback)
    }

    /// Create a resolver with a caller-supplied lexicon.
    pub fn with_lexicon(
        normalizer: Box<dyn TextNormalizer>,
        lexicon: Lexicon,
        fallback: Arc<dyn FallbackPhonemizer>,
    ) -> Self {
        Self {
            normalizer,
            lexicon,
            fallback,
            language: "en-us".to_string(),
            max_len: MAX_PHONEME_LEN,
        }
    }

    /// Set the language tag passed to the fallback phonemizer.
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Access the lexicon (for dictionary merging at load time).
    pub fn lexicon_mut(&mut self) -> &mut Lexicon {
        &mut self.lexicon
    }

    /// Convert text to an IPA phoneme string.
    #[instrument(skip(self, text), fields(text_len = text.len()))]
    pub fn phonemize(&self, text: &str) -> TtsResult<String> {
        let normalized = self.normalizer.normalize(text)?;
        let mut units = tokenize(&normalized);
        tagger::tag_tokens(&mut units);
        self.resolve(&mut units);

        let mut out = String::new();
        for token in &units {
            if let Some(phonemes) = &token.phonemes {
                out.push_str(phonemes);
            }
            // Preserve whitespace only after units that produced something;
            // a dropped unit leaves no hole.
            if token.phonemes.as_deref().is_some_and(|p| !p.is_empty()) {
                out.push_str(&token.trailing);
            }
        }
        let out = truncate_chars(out.trim_end(), self.max_len);

        debug!(phoneme_len = out.len(), "phonemized");
        Ok(out)
    }

    /// Resolve every unit in place, walking backwards so each token sees the
    /// phonetic context of what follows it.
    fn resolve(&self, units: &mut [LinguisticToken]) {
        let mut ctx = PhonemeContext::end_of_utterance();
        let mut quote_open = false;

        // Quote direction depends on left-to-right order; precompute it.
        let mut quote_symbols = vec![None; units.len()];
        for (idx, token) in units.iter().enumerate() {
            if token.is_punctuation() {
                let c = token.text.chars().next().unwrap_or(' ');
                quote_symbols[idx] = punctuation_symbol(c, &mut quote_open);
            }
        }

        for idx in (0..units.len()).rev() {
            let token = &mut units[idx];

            if token.is_punctuation() {
                token.phonemes = quote_symbols[idx].map(str::to_string);
                if matches!(token.text.as_str(), "." | "!" | "?" | ";" | ":" | ",") {
                    ctx.reset();
                }
                continue;
            }

            let (phonemes, rating) =
                self.lexicon
                    .lookup(&token.text, token.tag, token.stress, &ctx);
            token.rating = rating;
            token.phonemes = match phonemes {
                Some(p) => Some(p),
                None => {
                    trace!(unit = %token.text, "lexicon miss, trying fallback");
                    self.fallback
                        .text_to_phonemes(&token.text, &self.language)
                        .filter(|p| !p.is_empty())
                }
            };

            // This token is the context for whatever precedes it.
            match token.phonemes.as_deref() {
                Some(p) if !p.is_empty() => {
                    ctx.future_vowel = Some(starts_with_vowel(p));
                    ctx.future_to = token.text.eq_ignore_ascii_case("to");
                }
                _ => {}
            }
        }
    }
}

fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use text_normalizer::Normalizer;
    use tts_core::traits::NoFallback;

    fn resolver() -> G2pResolver {
        G2pResolver::new(Box::new(Normalizer::new()), Arc::new(NoFallback))
    }

    #[test]
    fn test_simple_sentence() {
        let g2p = resolver();
        let result = g2p.phonemize("the cat").unwrap();
        assert_eq!(result, "ðə kˈæt");
    }

    #[test]
    fn test_the_before_vowel() {
        let g2p = resolver();
        // "eight" starts with a vowel sound, so "the" becomes "ði".
        let result = g2p.phonemize("the eight").unwrap();
        assert_eq!(result, "ði ˈeɪt");
    }

    #[test]
    fn test_unknown_word_dropped() {
        let g2p = resolver();
        let result = g2p.phonemize("the zyxwv cat").unwrap();
        // The unresolved unit contributes nothing; the utterance continues.
        assert_eq!(result, "ðə kˈæt");
    }

    #[test]
    fn test_fallback_invoked() {
        struct Upper;
        impl tts_core::FallbackPhonemizer for Upper {
            fn text_to_phonemes(&self, text: &str, _language: &str) -> Option<String> {
                Some(format!("<{}>", text.to_lowercase()))
            }
        }
        let g2p = G2pResolver::new(Box::new(Normalizer::new()), Arc::new(Upper));
        let result = g2p.phonemize("zyxwv").unwrap();
        assert_eq!(result, "<zyxwv>");
    }

    #[test]
    fn test_punctuation_mapping() {
        let g2p = resolver();
        let result = g2p.phonemize("cat, dog!").unwrap();
        assert_eq!(result, "kˈæt, dˈɔːɡ!");
    }

    #[test]
    fn test_quote_direction() {
        let g2p = resolver();
        let result = g2p.phonemize("\"cat\"").unwrap();
        assert_eq!(result, "\u{201C}kˈæt\u{201D}");
    }

    #[test]
    fn test_heteronym_in_sentence() {
        let g2p = resolver();
        let noun = g2p.phonemize("the record").unwrap();
        let verb = g2p.phonemize("I want to record").unwrap();
        assert!(noun.contains("ɹˈɛkɚd"), "{noun}");
        assert!(verb.contains("ɹɪkˈɔːɹd"), "{verb}");
    }

    #[test]
    fn test_numbers_expanded() {
        let g2p = resolver();
        let result = g2p.phonemize("3 cats").unwrap();
        assert_eq!(result, "θɹˈiː kˈæts");
    }

    #[test]
    fn test_markdown_link_stripped() {
        let g2p = resolver();
        let result = g2p.phonemize("[the cat](https://cats.example)").unwrap();
        assert_eq!(result, "ðə kˈæt");
    }

    #[test]
    fn test_clause_boundary_resets_context() {
        let g2p = resolver();
        // "the" at the end of a clause sees no following vowel even though
        // the next sentence starts with one.
        let result = g2p.phonemize("the. eight").unwrap();
        assert_eq!(result, "ðə. ˈeɪt");
    }

    #[test]
    fn test_truncation() {
        let g2p = resolver();
        let long_text = "cat ".repeat(400);
        let result = g2p.phonemize(&long_text).unwrap();
        assert!(result.chars().count() <= MAX_PHONEME_LEN);
    }

    #[test]
    fn test_empty_input() {
        let g2p = resolver();
        assert_eq!(g2p.phonemize("").unwrap(), "");
    }
}
