//! Sentence batching.
//!
//! Splits text into sentences/clauses and accumulates their token sequences
//! up to the per-call budget. A sentence's tokens are never split across
//! model calls; a single oversized sentence is dispatched as its own call.
//! The very first non-empty unit always goes out alone so first-audio
//! latency stays low, and an overlong first unit is sub-split on commas (or
//! a fixed character offset) for the same reason.

use tracing::{debug, instrument};
use tts_core::TtsResult;

/// Character length past which the first unit gets sub-split.
const FIRST_UNIT_SPLIT_CHARS: usize = 120;

/// Sentence batcher; holds only the per-call token budget.
#[derive(Debug, Clone, Copy)]
pub struct SentenceBatcher {
    max_tokens: usize,
}

impl SentenceBatcher {
    /// Create a batcher with the given per-call token budget.
    pub fn new(max_tokens: usize) -> Self {
        Self { max_tokens }
    }

    /// Split, tokenize, and group `text` into per-call token batches.
    ///
    /// `tokenize` maps one text unit to its token sequence; units that
    /// tokenize to nothing are skipped.
    #[instrument(skip_all, fields(text_len = text.len()))]
    pub fn batch<F>(&self, text: &str, mut tokenize: F) -> TtsResult<Vec<Vec<i64>>>
    where
        F: FnMut(&str) -> TtsResult<Vec<i64>>,
    {
        let units = split_units(text);

        let mut batches: Vec<Vec<i64>> = Vec::new();
        let mut current: Vec<i64> = Vec::new();
        let mut first_dispatched = false;

        for unit in units {
            let tokens = tokenize(&unit)?;
            if tokens.is_empty() {
                continue;
            }

            // The first unit is dispatched immediately, never merged.
            if !first_dispatched {
                batches.push(tokens);
                first_dispatched = true;
                continue;
            }

            if tokens.len() > self.max_tokens {
                // Oversized sentence: flush whatever is pending, then
                // dispatch it alone rather than splitting mid-unit.
                if !current.is_empty() {
                    batches.push(std::mem::take(&mut current));
                }
                batches.push(tokens);
                continue;
            }

            if current.len() + tokens.len() > self.max_tokens && !current.is_empty() {
                batches.push(std::mem::take(&mut current));
            }
            current.extend(tokens);
        }

        if !current.is_empty() {
            batches.push(current);
        }

        debug!(batches = batches.len(), "text batched");
        Ok(batches)
    }
}

/// Split text into sentence/clause units on sentence-ending punctuation and
/// line breaks; sub-split an overlong first unit.
fn split_units(text: &str) -> Vec<String> {
    let mut units: Vec<String> = Vec::new();
    for line in text.lines() {
        for sentence in line.split_inclusive(['.', '!', '?', ';']) {
            let sentence = sentence.trim();
            if !sentence.is_empty() {
                units.push(sentence.to_string());
            }
        }
    }

    if let Some(first) = units.first() {
        if first.chars().count() > FIRST_UNIT_SPLIT_CHARS {
            let replacements = sub_split_first(first);
            units.splice(0..1, replacements);
        }
    }

    units
}

/// Sub-split on commas when possible, otherwise at the fixed character
/// offset.
fn sub_split_first(unit: &str) -> Vec<String> {
    if unit.contains(',') {
        return unit
            .split_inclusive(',')
            .map(|part| part.trim().to_string())
            .filter(|part| !part.is_empty())
            .collect();
    }

    let chars: Vec<char> = unit.chars().collect();
    chars
        .chunks(FIRST_UNIT_SPLIT_CHARS)
        .map(|chunk| chunk.iter().collect::<String>().trim().to_string())
        .filter(|part| !part.is_empty())
        .collect()
}
