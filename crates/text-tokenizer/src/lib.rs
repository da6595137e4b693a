//! # text-tokenizer
//!
//! Tokenization for the purrtts synthesis core. Two strategies:
//!
//! - [`FixedTokenizer`]: a static small-vocabulary phoneme table with greedy
//!   longest-match scanning, for models that consume phoneme ids directly.
//! - [`UnigramTokenizer`]: a from-scratch Unigram (SentencePiece-style)
//!   subword tokenizer over a binary vocabulary stream, with Viterbi-optimal
//!   segmentation and byte-level fallback for unknown code points.
//!
//! # Example
//!
//! ```ignore
//! use text_tokenizer::FixedTokenizer;
//!
//! let tokenizer = FixedTokenizer::new();
//! let ids = tokenizer.tokenize("həlˈoʊ");
//! ```

mod fixed;
mod unigram;

pub use fixed::FixedTokenizer;
pub use unigram::{PieceKind, UnigramTokenizer, VocabularyEntry, WORD_BOUNDARY};
