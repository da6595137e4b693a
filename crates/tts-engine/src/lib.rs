//! # tts-engine
//!
//! End-to-end orchestration for the purrtts synthesis core: the engine
//! surface the host layer drives (`generate`, `stop`, `clone_voice`, ...),
//! the sentence batcher, and the voice bank with its persisted blobs.
//!
//! Data flow per utterance: text -> batcher -> (G2P + fixed tokenizer |
//! prompt preparation + unigram tokenizer) -> (feed-forward engine |
//! flow-matching engine -> scheduler -> codec decode) -> postprocessing ->
//! caller callback.

mod batcher;
mod engine;
mod voice;

pub use batcher::SentenceBatcher;
pub use engine::{SynthesisEngine, SynthesisEngineBuilder};
pub use voice::{VoiceBank, VoiceFamily, VoiceState};
