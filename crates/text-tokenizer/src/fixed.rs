//! Fixed small-vocabulary phoneme tokenizer.
//!
//! Maps an IPA phoneme string to integer ids via a static table using
//! greedy longest-match scanning: at each position try 3-, then 2-, then
//! 1-character substrings. Unmatched characters advance the scan without
//! emitting anything.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use tts_core::{TokenEncoder, TtsResult};

/// Longest symbol length in characters.
const MAX_SYMBOL_LEN: usize = 3;

/// The vocabulary, in id order. Tie-bar affricates alias the plain digraph
/// ids so both espeak spellings land on the same token.
const SYMBOLS: &[&str] = &[
    "$", ";", ":", ",", ".", "!", "?", "\u{2014}", "\u{2026}", "\"", "(", ")", "\u{201C}",
    "\u{201D}", " ", "a", "b", "c", "d", "e", "f", "g", "h", "i", "j", "k", "l", "m", "n", "o",
    "p", "q", "r", "s", "t", "u", "v", "w", "x", "y", "z", "ɑ", "ɐ", "ɒ", "æ", "ə", "ɚ", "ɛ",
    "ɜ", "ɪ", "ʊ", "ʌ", "ɔ", "ᵻ", "ð", "ŋ", "ɡ", "ɹ", "ɾ", "ʃ", "θ", "ʒ", "ˈ", "ˌ", "ː",
    "aɪ", "aʊ", "eɪ", "oʊ", "ɔɪ", "tʃ", "dʒ",
];

/// Extra spellings mapped onto existing ids: (alias, canonical).
const ALIASES: &[(&str, &str)] = &[("t\u{361}ʃ", "tʃ"), ("d\u{361}ʒ", "dʒ")];

static TABLE: Lazy<HashMap<&'static str, i64>> = Lazy::new(|| {
    let mut table: HashMap<&'static str, i64> = SYMBOLS
        .iter()
        .enumerate()
        .map(|(id, &s)| (s, id as i64))
        .collect();
    for &(alias, canonical) in ALIASES {
        let id = table[canonical];
        table.insert(alias, id);
    }
    table
});

/// Tokenizer over the static phoneme vocabulary.
///
/// Deterministic and total: the vocabulary covers the full symbol set the
/// G2P resolver emits, so no fallback path is needed.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedTokenizer;

impl FixedTokenizer {
    /// Create the tokenizer.
    pub fn new() -> Self {
        Self
    }

    /// Id of the padding symbol.
    pub fn pad_id(&self) -> i64 {
        0
    }

    /// Tokenize a phoneme string.
    pub fn tokenize(&self, phonemes: &str) -> Vec<i64> {
        let chars: Vec<char> = phonemes.chars().collect();
        let mut ids = Vec::with_capacity(chars.len());
        let mut pos = 0;

        while pos < chars.len() {
            let mut matched = false;
            for len in (1..=MAX_SYMBOL_LEN.min(chars.len() - pos)).rev() {
                let candidate: String = chars[pos..pos + len].iter().collect();
                if let Some(&id) = TABLE.get(candidate.as_str()) {
                    ids.push(id);
                    pos += len;
                    matched = true;
                    break;
                }
            }
            if !matched {
                pos += 1;
            }
        }

        ids
    }
}

impl TokenEncoder for FixedTokenizer {
    fn encode(&self, text: &str) -> TtsResult<Vec<i64>> {
        Ok(self.tokenize(text))
    }

    fn vocab_size(&self) -> usize {
        SYMBOLS.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_symbols() {
        let tokenizer = FixedTokenizer::new();
        let ids = tokenizer.tokenize("kˈæt");
        assert_eq!(ids.len(), 4);
        // All ids distinct, none is the pad symbol.
        assert!(ids.iter().all(|&id| id != 0));
    }

    #[test]
    fn test_longest_match_wins() {
        let tokenizer = FixedTokenizer::new();
        // "aɪ" must come out as one diphthong id, not 'a' + 'ɪ'.
        let diphthong = tokenizer.tokenize("aɪ");
        assert_eq!(diphthong.len(), 1);
        let split = tokenizer.tokenize("a ɪ");
        assert_eq!(split.len(), 3);
        assert_ne!(diphthong[0], split[0]);
    }

    #[test]
    fn test_tie_bar_alias() {
        let tokenizer = FixedTokenizer::new();
        let plain = tokenizer.tokenize("tʃ");
        let tied = tokenizer.tokenize("t\u{361}ʃ");
        assert_eq!(plain, tied);
        assert_eq!(plain.len(), 1);
    }

    #[test]
    fn test_unknown_chars_skipped() {
        let tokenizer = FixedTokenizer::new();
        let with_junk = tokenizer.tokenize("k#æt");
        let without = tokenizer.tokenize("kæt");
        assert_eq!(with_junk, without);
    }

    #[test]
    fn test_empty() {
        let tokenizer = FixedTokenizer::new();
        assert!(tokenizer.tokenize("").is_empty());
    }

    #[test]
    fn test_deterministic() {
        let tokenizer = FixedTokenizer::new();
        let a = tokenizer.tokenize("həlˈoʊ wˈɜːld");
        let b = tokenizer.tokenize("həlˈoʊ wˈɜːld");
        assert_eq!(a, b);
    }
}
