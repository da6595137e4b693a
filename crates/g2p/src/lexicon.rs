//! Static pronunciation dictionary with morphological stemming.
//!
//! Resolution order: primary dictionary, secondary dictionary, then the
//! suffix-stripping rules (plural/possessive, past tense, gerund), each of
//! which requires a strictly shorter known stem. A miss returns `None` with
//! the rating sentinel so the resolver can move on to the fallback
//! phonemizer.

use std::collections::HashMap;
use std::io::BufRead;

use tts_core::{TtsError, TtsResult};

use crate::context::PhonemeContext;
use crate::tagger::PosTag;
use crate::tokens::{RATING_GOLD, RATING_SILVER};

/// Pronunciation dialect; conditions the flap realizations in the
/// past-tense and gerund stemming rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dialect {
    /// American English.
    #[default]
    Us,
    /// British English.
    Gb,
}

/// Context-conditioned pronunciation forms.
#[derive(Debug, Clone, Default)]
struct ContextForms {
    /// Used when the following sound is a vowel.
    vowel: Option<String>,
    /// Used when the following sound is a consonant.
    consonant: Option<String>,
    /// Used when the following sound is unknown.
    unknown: Option<String>,
    /// Used when the following token is "to".
    before_to: Option<String>,
}

/// One dictionary entry; a word may carry any combination of forms.
#[derive(Debug, Clone, Default)]
struct Entry {
    simple: Option<String>,
    by_tag: HashMap<String, String>,
    by_context: ContextForms,
}

impl Entry {
    fn select(&self, tag: PosTag, ctx: &PhonemeContext) -> Option<&str> {
        if ctx.future_to {
            if let Some(p) = &self.by_context.before_to {
                return Some(p);
            }
        }
        if !self.by_tag.is_empty() {
            if let Some(p) = self
                .by_tag
                .get(tag.key())
                .or_else(|| self.by_tag.get(tag.parent().key()))
                .or_else(|| self.by_tag.get("DEFAULT"))
            {
                return Some(p);
            }
        }
        let ctx_form = match ctx.future_vowel {
            Some(true) => self.by_context.vowel.as_deref(),
            Some(false) => self.by_context.consonant.as_deref(),
            None => self.by_context.unknown.as_deref(),
        };
        if let Some(p) = ctx_form.or(self.by_context.unknown.as_deref()) {
            return Some(p);
        }
        self.simple.as_deref()
    }
}

/// Static word-to-phonemes dictionary.
#[derive(Debug, Default)]
pub struct Lexicon {
    gold: HashMap<String, Entry>,
    silver: HashMap<String, Entry>,
    dialect: Dialect,
}

/// Phonemes whose final sound is voiceless (for suffix voicing).
const VOICELESS_FINALS: [char; 7] = ['p', 't', 'k', 'f', 'θ', 's', 'ʃ'];

/// Finals that force the /ɪz/ plural realization.
const SIBILANT_FINALS: [char; 4] = ['s', 'z', 'ʃ', 'ʒ'];

/// Vowel phoneme characters (monophthong starts cover the diphthongs too).
const VOWEL_CHARS: [char; 18] = [
    'æ', 'ɑ', 'ɒ', 'ɔ', 'ə', 'ɚ', 'ɛ', 'ɜ', 'ɪ', 'i', 'u', 'ʊ', 'ʌ', 'a', 'e', 'o', 'ᵻ', 'ɐ',
];

impl Lexicon {
    /// Load the built-in seed dictionaries.
    pub fn builtin() -> Self {
        let mut lexicon = Self::default();
        lexicon
            .load_gold(include_str!("../data/lexicon_gold.tsv").as_bytes())
            .expect("built-in gold lexicon is well-formed");
        lexicon
            .load_silver(include_str!("../data/lexicon_silver.tsv").as_bytes())
            .expect("built-in silver lexicon is well-formed");
        lexicon
    }

    /// Set the dialect used by the stemming rules.
    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    /// Merge entries from a primary-dictionary TSV stream.
    pub fn load_gold(&mut self, reader: impl BufRead) -> TtsResult<()> {
        Self::load_into(&mut self.gold, reader)
    }

    /// Merge entries from a secondary-dictionary TSV stream.
    pub fn load_silver(&mut self, reader: impl BufRead) -> TtsResult<()> {
        Self::load_into(&mut self.silver, reader)
    }

    fn load_into(map: &mut HashMap<String, Entry>, reader: impl BufRead) -> TtsResult<()> {
        for (line_no, line) in reader.lines().enumerate() {
            let line = line?;
            let line = line.trim_end();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let mut fields = line.split('\t');
            let (Some(word), Some(key), Some(phonemes)) =
                (fields.next(), fields.next(), fields.next())
            else {
                return Err(TtsError::config(format!(
                    "malformed lexicon line {}: {line:?}",
                    line_no + 1
                )));
            };

            let entry = map.entry(word.to_string()).or_default();
            match key {
                "-" => entry.simple = Some(phonemes.to_string()),
                "VOWEL" => entry.by_context.vowel = Some(phonemes.to_string()),
                "CONS" => entry.by_context.consonant = Some(phonemes.to_string()),
                "UNKNOWN" => entry.by_context.unknown = Some(phonemes.to_string()),
                "BEFORE_TO" => entry.by_context.before_to = Some(phonemes.to_string()),
                tag => {
                    entry.by_tag.insert(tag.to_string(), phonemes.to_string());
                }
            }
        }
        Ok(())
    }

    /// Number of entries across both dictionaries.
    pub fn len(&self) -> usize {
        self.gold.len() + self.silver.len()
    }

    /// Whether the lexicon holds no entries.
    pub fn is_empty(&self) -> bool {
        self.gold.is_empty() && self.silver.is_empty()
    }

    /// Resolve a word to phonemes.
    ///
    /// Returns `(phonemes, rating)`; a `None` result carries the rating
    /// sentinel (the gold value, meaning "unresolved" here) and the caller
    /// proceeds to the fallback phonemizer.
    pub fn lookup(
        &self,
        word: &str,
        tag: PosTag,
        stress: Option<i8>,
        ctx: &PhonemeContext,
    ) -> (Option<String>, u8) {
        let (resolved, rating) = self.lookup_inner(word, tag, ctx);
        match resolved {
            Some(phonemes) => (Some(apply_stress(&phonemes, stress)), rating),
            None => (None, RATING_GOLD),
        }
    }

    fn lookup_inner(&self, word: &str, tag: PosTag, ctx: &PhonemeContext) -> (Option<String>, u8) {
        let mut tag = tag;
        let mut candidates: Vec<String> = vec![word.to_string()];
        let lower = word.to_lowercase();
        if lower != word {
            candidates.push(lower.clone());
        }

        // Fully-uppercase words that are not entries themselves read as
        // proper-noun candidates after lowercasing.
        if word.len() > 1
            && word.chars().all(|c| !c.is_lowercase())
            && !self.gold.contains_key(word)
            && !self.silver.contains_key(word)
        {
            tag = PosTag::Nnp;
        }

        for candidate in &candidates {
            if let Some(found) = self.direct(candidate, tag, ctx) {
                return (Some(found.0), found.1);
            }
        }

        for candidate in &candidates {
            if let Some(found) = self.stemmed(candidate, tag, ctx) {
                return (Some(found.0), found.1);
            }
        }

        (None, RATING_GOLD)
    }

    fn direct(&self, word: &str, tag: PosTag, ctx: &PhonemeContext) -> Option<(String, u8)> {
        if let Some(entry) = self.gold.get(word) {
            if let Some(p) = entry.select(tag, ctx) {
                return Some((p.to_string(), RATING_GOLD));
            }
        }
        if let Some(entry) = self.silver.get(word) {
            if let Some(p) = entry.select(tag, ctx) {
                return Some((p.to_string(), RATING_SILVER));
            }
        }
        None
    }

    /// Suffix-stripping fallbacks, tried in order: plural/possessive, past
    /// tense, gerund. Each requires a strictly shorter known stem.
    fn stemmed(&self, word: &str, tag: PosTag, ctx: &PhonemeContext) -> Option<(String, u8)> {
        self.stem_s(word, tag, ctx)
            .or_else(|| self.stem_ed(word, tag, ctx))
            .or_else(|| self.stem_ing(word, tag, ctx))
    }

    fn stem_s(&self, word: &str, tag: PosTag, ctx: &PhonemeContext) -> Option<(String, u8)> {
        let stem = if let Some(s) = word.strip_suffix("'s") {
            s.to_string()
        } else if word.len() > 3 && word.ends_with("ies") {
            format!("{}y", &word[..word.len() - 3])
        } else if word.len() > 2 && word.ends_with("es") {
            word[..word.len() - 1].to_string()
        } else if word.len() > 1 && word.ends_with('s') && !word.ends_with("ss") {
            word[..word.len() - 1].to_string()
        } else {
            return None;
        };
        if stem.len() >= word.len() {
            return None;
        }

        let (phonemes, rating) = self.direct(&stem, tag, ctx)?;
        let last = last_sound(&phonemes)?;
        let suffixed = if SIBILANT_FINALS.contains(&last) {
            format!("{phonemes}ɪz")
        } else if VOICELESS_FINALS.contains(&last) {
            format!("{phonemes}s")
        } else {
            format!("{phonemes}z")
        };
        Some((suffixed, rating))
    }

    fn stem_ed(&self, word: &str, tag: PosTag, ctx: &PhonemeContext) -> Option<(String, u8)> {
        let base = word.strip_suffix("ed")?;
        if base.is_empty() {
            return None;
        }

        // "walked" -> walk, "loved" -> love, "stopped" -> stop.
        let mut stems = vec![base.to_string(), format!("{base}e")];
        if base.len() >= 2 {
            let bytes = base.as_bytes();
            if bytes[base.len() - 1] == bytes[base.len() - 2] {
                stems.push(base[..base.len() - 1].to_string());
            }
        }

        for stem in stems {
            if stem.len() >= word.len() {
                continue;
            }
            if let Some((phonemes, rating)) = self.direct(&stem, tag, ctx) {
                let last = last_sound(&phonemes)?;
                let suffixed = match last {
                    't' if self.dialect == Dialect::Us => {
                        format!("{}ɾɪd", &phonemes[..phonemes.len() - 't'.len_utf8()])
                    }
                    't' | 'd' => format!("{phonemes}ɪd"),
                    c if VOICELESS_FINALS.contains(&c) => format!("{phonemes}t"),
                    _ => format!("{phonemes}d"),
                };
                return Some((suffixed, rating));
            }
        }
        None
    }

    fn stem_ing(&self, word: &str, tag: PosTag, ctx: &PhonemeContext) -> Option<(String, u8)> {
        let base = word.strip_suffix("ing")?;
        if base.is_empty() {
            return None;
        }

        let mut stems = vec![base.to_string(), format!("{base}e")];
        if base.len() >= 2 {
            let bytes = base.as_bytes();
            if bytes[base.len() - 1] == bytes[base.len() - 2] {
                stems.push(base[..base.len() - 1].to_string());
            }
        }

        for stem in stems {
            if stem.len() >= word.len() {
                continue;
            }
            if let Some((phonemes, rating)) = self.direct(&stem, tag, ctx) {
                let suffixed = match last_sound(&phonemes) {
                    Some('t')
                        if self.dialect == Dialect::Us
                            && second_to_last_is_vowel(&phonemes) =>
                    {
                        format!("{}ɾɪŋ", &phonemes[..phonemes.len() - 't'.len_utf8()])
                    }
                    _ => format!("{phonemes}ɪŋ"),
                };
                return Some((suffixed, rating));
            }
        }
        None
    }
}

/// Whether a phoneme string begins with a vowel sound, skipping stress marks.
pub fn starts_with_vowel(phonemes: &str) -> bool {
    phonemes
        .chars()
        .find(|&c| !matches!(c, 'ˈ' | 'ˌ'))
        .is_some_and(|c| VOWEL_CHARS.contains(&c))
}

fn last_sound(phonemes: &str) -> Option<char> {
    phonemes
        .chars()
        .rev()
        .find(|&c| !matches!(c, 'ˈ' | 'ˌ' | 'ː'))
}

fn second_to_last_is_vowel(phonemes: &str) -> bool {
    let mut sounds = phonemes.chars().rev().filter(|&c| !matches!(c, 'ˈ' | 'ˌ'));
    sounds.next();
    sounds.next().is_some_and(|c| VOWEL_CHARS.contains(&c) || c == 'ː')
}

/// Apply a stress hint: +1 promotes an unstressed word to primary stress,
/// -1 demotes primary to secondary.
fn apply_stress(phonemes: &str, stress: Option<i8>) -> String {
    match stress {
        Some(hint) if hint > 0 && !phonemes.contains('ˈ') => {
            // Stress lands on the first vowel.
            match phonemes.char_indices().find(|(_, c)| VOWEL_CHARS.contains(c)) {
                Some((idx, _)) => {
                    let mut out = String::with_capacity(phonemes.len() + 2);
                    out.push_str(&phonemes[..idx]);
                    out.push('ˈ');
                    out.push_str(&phonemes[idx..]);
                    out
                }
                None => phonemes.to_string(),
            }
        }
        Some(hint) if hint < 0 => phonemes.replace('ˈ', "ˌ"),
        _ => phonemes.to_string(),
    }
}
