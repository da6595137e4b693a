//! CLI command implementations.

pub mod batch;
pub mod phonemize;
pub mod tokenize;
pub mod voice;

use std::sync::Arc;

use g2p::G2pResolver;
use text_normalizer::Normalizer;
use tts_core::traits::NoFallback;

/// A resolver over the built-in lexicon, with no fallback phonemizer.
pub fn resolver() -> G2pResolver {
    G2pResolver::new(Box::new(Normalizer::new()), Arc::new(NoFallback))
}
