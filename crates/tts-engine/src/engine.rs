//! The synthesis engine: the surface the host layer drives.
//!
//! Wires the text pipeline (G2P, tokenizers, batcher) to the neural engines
//! and the codec, per the active voice's family. One utterance generates at
//! a time per engine instance; serializing concurrent requests is the
//! host's job.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use tracing::{debug, info, instrument, warn};

use audio_codec::{StreamingCodec, postprocess, resample, wav};
use g2p::G2pResolver;
use runtime::{AdaptivePacing, TtsMetrics, run_streaming};
use synthesis::{FeedForwardEngine, FlowMatchingEngine, StyleTable, TrimPolicy};
use text_tokenizer::{FixedTokenizer, UnigramTokenizer};
use tts_core::types::SAMPLE_RATE;
use tts_core::{
    AudioChunk, CancelToken, DecodingMode, GenerationConfig, TokenEncoder, TtsError, TtsResult,
};

use crate::batcher::SentenceBatcher;
use crate::voice::{VoiceBank, VoiceFamily, VoiceState};

/// Builder for [`SynthesisEngine`].
pub struct SynthesisEngineBuilder {
    g2p: Option<G2pResolver>,
    feed_forward: Option<FeedForwardEngine>,
    flow: Option<FlowMatchingEngine>,
    codec: Option<StreamingCodec>,
    unigram: Option<UnigramTokenizer>,
    voices_dir: Option<PathBuf>,
    config: GenerationConfig,
}

impl SynthesisEngineBuilder {
    /// Set the G2P resolver (required for the feed-forward family).
    pub fn with_g2p(mut self, g2p: G2pResolver) -> Self {
        self.g2p = Some(g2p);
        self
    }

    /// Enable the feed-forward family.
    pub fn with_feed_forward(mut self, engine: FeedForwardEngine) -> Self {
        self.feed_forward = Some(engine);
        self
    }

    /// Enable the flow-matching family.
    pub fn with_flow_matching(
        mut self,
        engine: FlowMatchingEngine,
        codec: StreamingCodec,
        unigram: UnigramTokenizer,
    ) -> Self {
        self.flow = Some(engine);
        self.codec = Some(codec);
        self.unigram = Some(unigram);
        self
    }

    /// Directory of persisted cloned-voice blobs.
    pub fn with_voices_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.voices_dir = Some(dir.into());
        self
    }

    /// Generation parameters.
    pub fn with_config(mut self, config: GenerationConfig) -> Self {
        self.config = config;
        self
    }

    /// Finish initialization: validates the assembly and loads persisted
    /// voices. Fails if no synthesis family is configured.
    pub fn build(self) -> TtsResult<SynthesisEngine> {
        if self.feed_forward.is_none() && self.flow.is_none() {
            return Err(TtsError::config("no synthesis engine configured"));
        }
        let g2p = self
            .g2p
            .ok_or_else(|| TtsError::config("no G2P resolver configured"))?;

        let voices = VoiceBank::new();
        if let Some(dir) = &self.voices_dir {
            let loaded = voices.load_dir(dir)?;
            info!(loaded, dir = %dir.display(), "persisted voices loaded");
        }

        let metrics = TtsMetrics::new();
        metrics.set_loaded_voices(voices.len() as f64);

        Ok(SynthesisEngine {
            g2p,
            fixed: FixedTokenizer::new(),
            unigram: self.unigram,
            feed_forward: self.feed_forward,
            flow: self.flow,
            codec: self.codec,
            batcher: SentenceBatcher::new(self.config.max_tokens_per_call),
            config: self.config,
            voices,
            voices_dir: self.voices_dir,
            pacing: Arc::new(Mutex::new(AdaptivePacing::default())),
            cancel: CancelToken::new(),
            metrics,
        })
    }
}

/// On-device text-to-speech engine.
pub struct SynthesisEngine {
    g2p: G2pResolver,
    fixed: FixedTokenizer,
    unigram: Option<UnigramTokenizer>,
    feed_forward: Option<FeedForwardEngine>,
    flow: Option<FlowMatchingEngine>,
    codec: Option<StreamingCodec>,
    batcher: SentenceBatcher,
    config: GenerationConfig,
    voices: VoiceBank,
    voices_dir: Option<PathBuf>,
    pacing: Arc<Mutex<AdaptivePacing>>,
    cancel: CancelToken,
    metrics: TtsMetrics,
}

impl SynthesisEngine {
    /// Start building an engine.
    pub fn builder() -> SynthesisEngineBuilder {
        SynthesisEngineBuilder {
            g2p: None,
            feed_forward: None,
            flow: None,
            codec: None,
            unigram: None,
            voices_dir: None,
            config: GenerationConfig::default(),
        }
    }

    /// Output sample rate in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.codec
            .as_ref()
            .map(StreamingCodec::sample_rate)
            .unwrap_or(SAMPLE_RATE)
    }

    /// Ids of all registered voices.
    pub fn voices(&self) -> Vec<String> {
        self.voices.ids()
    }

    /// Register a bundled voice under a family.
    pub fn register_voice(&mut self, voice: VoiceState, family: VoiceFamily) -> TtsResult<()> {
        match family {
            VoiceFamily::FeedForward if self.feed_forward.is_none() => {
                return Err(TtsError::config("feed-forward engine not configured"));
            }
            VoiceFamily::FlowMatching if self.flow.is_none() => {
                return Err(TtsError::config("flow-matching engine not configured"));
            }
            _ => {}
        }
        self.voices.register(voice, family);
        self.metrics.set_loaded_voices(self.voices.len() as f64);
        Ok(())
    }

    /// Request cancellation of the in-flight utterance. Non-blocking; the
    /// generation loop observes the flag between frames and sentences.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    /// A handle the host can use to stop generation from another thread.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Synthesize `text` with the given voice, delivering audio chunks to
    /// `on_chunk` as they are ready.
    ///
    /// Cancellation is clean early termination, not an error; chunks already
    /// delivered stay delivered either way.
    #[instrument(skip(self, text, on_chunk), fields(text_len = text.len(), voice = voice_id))]
    pub fn generate(
        &mut self,
        text: &str,
        speed: f32,
        voice_id: &str,
        on_chunk: &mut dyn FnMut(AudioChunk),
    ) -> TtsResult<()> {
        if text.trim().is_empty() {
            return Err(TtsError::invalid_input("empty input text"));
        }
        let (voice, family) = self
            .voices
            .get(voice_id)
            .ok_or_else(|| TtsError::UnknownVoice(voice_id.to_string()))?;

        self.cancel.reset();
        self.metrics.utterance_started();
        let started = Instant::now();
        let speed = speed.clamp(0.25, 4.0);

        let result = match family {
            VoiceFamily::FeedForward => {
                self.generate_feed_forward(text, speed, &voice, started, on_chunk)
            }
            VoiceFamily::FlowMatching => self.generate_flow(text, &voice, started, on_chunk),
        };

        match &result {
            Ok(()) if self.cancel.is_cancelled() => self.metrics.utterance_cancelled(),
            Ok(()) => self.metrics.utterance_completed(),
            Err(_) => self.metrics.utterance_failed(),
        }
        result
    }

    /// Run a short synthesis through the full path so first-request latency
    /// excludes lazy initialization. Failure is logged, not fatal.
    pub fn warm_up(&mut self) {
        let Some(voice_id) = self.voices.ids().into_iter().next() else {
            debug!("no voices loaded, skipping warm-up");
            return;
        };
        info!(voice = %voice_id, "warming up");
        if let Err(err) = self.generate("Hello.", 1.0, &voice_id, &mut |_| {}) {
            warn!(%err, "warm-up synthesis failed");
        }
    }

    /// Free the model sessions.
    pub fn release(self) {
        info!("engine released");
    }

    /// Build a new voice from a reference recording via codec encode,
    /// persist it, and register it.
    #[instrument(skip(self), fields(name = display_name))]
    pub fn clone_voice(
        &mut self,
        reference_audio: &Path,
        display_name: &str,
    ) -> TtsResult<String> {
        let codec = self
            .codec
            .as_mut()
            .ok_or_else(|| TtsError::config("flow-matching engine not configured"))?;

        let (samples, rate) = wav::read_wav(reference_audio)?;
        let samples = resample::resample(&samples, rate, codec.sample_rate())?;
        let (embedding, frames) = codec.encode(&samples)?;

        let voice = VoiceState::new(slug(display_name), display_name, embedding, frames, false)?;
        let id = voice.id.clone();

        if let Some(dir) = &self.voices_dir {
            std::fs::create_dir_all(dir)?;
            voice.save(dir.join(format!("{id}.voice")))?;
        }

        info!(id = %id, frames, "voice cloned");
        self.voices.register(voice, VoiceFamily::FlowMatching);
        self.metrics.set_loaded_voices(self.voices.len() as f64);
        Ok(id)
    }

    /// Delete a user-cloned voice (bundled voices stay).
    pub fn delete_cloned_voice(&mut self, voice_id: &str) -> TtsResult<()> {
        let (voice, _) = self
            .voices
            .get(voice_id)
            .ok_or_else(|| TtsError::UnknownVoice(voice_id.to_string()))?;
        if voice.bundled {
            return Err(TtsError::invalid_input("bundled voices cannot be deleted"));
        }

        self.voices.remove(voice_id);
        if let Some(dir) = &self.voices_dir {
            let path = dir.join(format!("{voice_id}.voice"));
            if path.exists() {
                std::fs::remove_file(path)?;
            }
        }
        self.metrics.set_loaded_voices(self.voices.len() as f64);
        Ok(())
    }

    fn generate_feed_forward(
        &mut self,
        text: &str,
        speed: f32,
        voice: &VoiceState,
        started: Instant,
        on_chunk: &mut dyn FnMut(AudioChunk),
    ) -> TtsResult<()> {
        let engine = self
            .feed_forward
            .as_mut()
            .ok_or_else(|| TtsError::config("feed-forward engine not configured"))?;
        let style = StyleTable::new(
            voice.embedding.clone(),
            voice.frames,
            voice.embedding_dim(),
        )?;

        let g2p = &self.g2p;
        let fixed = &self.fixed;
        let batches = self.batcher.batch(text, |unit| {
            let phonemes = g2p.phonemize(unit)?;
            fixed.encode(&phonemes)
        })?;

        let metrics = self.metrics;
        let mut emitted = false;
        for tokens in batches {
            if self.cancel.is_cancelled() {
                debug!("cancelled between sentences");
                return Ok(());
            }

            let samples = engine.run(&tokens, style.row(tokens.len()), speed)?;
            let trimmed = match engine.trim_policy() {
                TrimPolicy::FixedOffsets { head, tail } => {
                    postprocess::trim_fixed(&samples, head, tail)
                }
                TrimPolicy::TrailingSilence { threshold, guard } => {
                    postprocess::trim_trailing_silence(&samples, threshold, guard)
                }
            };
            if trimmed.is_empty() {
                continue;
            }

            if !emitted {
                metrics.record_time_to_first_audio(started.elapsed().as_secs_f64() * 1000.0);
                emitted = true;
            }
            on_chunk(AudioChunk::new(trimmed.to_vec(), SAMPLE_RATE));
        }
        Ok(())
    }

    fn generate_flow(
        &mut self,
        text: &str,
        voice: &VoiceState,
        started: Instant,
        on_chunk: &mut dyn FnMut(AudioChunk),
    ) -> TtsResult<()> {
        let flow = self
            .flow
            .as_mut()
            .ok_or_else(|| TtsError::config("flow-matching engine not configured"))?;
        let codec = self
            .codec
            .as_mut()
            .ok_or_else(|| TtsError::internal("flow engine without codec"))?;
        let unigram = self
            .unigram
            .as_ref()
            .ok_or_else(|| TtsError::internal("flow engine without tokenizer"))?;

        let batches = self
            .batcher
            .batch(text, |unit| Ok(unigram.encode(&prepare_prompt(unit))))?;

        let sample_rate = codec.sample_rate();
        let metrics = self.metrics;
        let mut emitted = false;
        let mut emit = |samples: Vec<f32>, on_chunk: &mut dyn FnMut(AudioChunk)| {
            if samples.is_empty() {
                return;
            }
            if !emitted {
                metrics.record_time_to_first_audio(started.elapsed().as_secs_f64() * 1000.0);
                emitted = true;
            }
            on_chunk(AudioChunk::new(samples, sample_rate));
        };

        for tokens in batches {
            if self.cancel.is_cancelled() {
                debug!("cancelled between sentences");
                return Ok(());
            }

            // Fresh recurrent state per model-call sequence; dropped on
            // every exit path below.
            let mut decoder_state = codec.init_decoder_state();
            let config = &self.config;
            let cancel = self.cancel.clone();

            match self.config.decoding {
                DecodingMode::Streaming => {
                    run_streaming(
                        self.pacing.clone(),
                        &self.cancel,
                        |mut sink| {
                            flow.generate(
                                &tokens,
                                &voice.embedding,
                                voice.frames,
                                config,
                                &cancel,
                                |frame| sink.push(frame),
                            )
                            .map(|outcome| {
                                debug!(frames = outcome.frames(), "producer finished");
                            })
                        },
                        |frames, _is_final| {
                            let audio = codec.decode(frames, &mut decoder_state)?;
                            emit(audio, on_chunk);
                            Ok(())
                        },
                    )?;
                }
                DecodingMode::Batch => {
                    let mut latents = Vec::new();
                    flow.generate(
                        &tokens,
                        &voice.embedding,
                        voice.frames,
                        config,
                        &cancel,
                        |frame| {
                            latents.push(frame);
                            true
                        },
                    )?;
                    if self.cancel.is_cancelled() {
                        return Ok(());
                    }
                    for chunk in latents.chunks(self.config.decode_chunk_frames.max(1)) {
                        let audio = codec.decode(chunk, &mut decoder_state)?;
                        emit(audio, on_chunk);
                    }
                }
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for SynthesisEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SynthesisEngine")
            .field("voices", &self.voices.len())
            .field("has_feed_forward", &self.feed_forward.is_some())
            .field("has_flow", &self.flow.is_some())
            .finish()
    }
}

/// Prepare a text unit for the flow-matching conditioner: collapse line
/// breaks, capitalize the first character, end with punctuation, and pad
/// very short prompts with leading spaces so conditioning has context.
fn prepare_prompt(text: &str) -> String {
    let mut text = text
        .trim()
        .replace(['\n', '\r'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    if text.is_empty() {
        return text;
    }

    let word_count = text.split_whitespace().count();

    let first = text.chars().next().unwrap();
    if !first.is_uppercase() {
        let upper: String = first.to_uppercase().collect();
        text = format!("{upper}{}", &text[first.len_utf8()..]);
    }

    if text.chars().next_back().is_some_and(char::is_alphanumeric) {
        text.push('.');
    }

    if word_count < 5 {
        text = format!("{}{text}", " ".repeat(8));
    }

    text
}

fn slug(name: &str) -> String {
    let base: String = name
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '-' })
        .collect();
    let base = base.trim_matches('-').to_string();
    let stamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0);
    format!("{base}-{stamp:x}")
}
