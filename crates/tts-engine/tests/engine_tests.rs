//! End-to-end engine tests over synthetic model sessions.

use std::collections::HashMap;
use std::sync::Arc;

use audio_codec::{StreamingCodec, wav};
use g2p::G2pResolver;
use synthesis::{FeedForwardEngine, FlowMatchingEngine, TrimPolicy};
use text_normalizer::Normalizer;
use text_tokenizer::UnigramTokenizer;
use tts_core::traits::NoFallback;
use tts_core::types::{LATENT_DIM, SAMPLES_PER_FRAME};
use tts_core::{
    DType, DecodingMode, Dim, GenerationConfig, ModelSession, TensorSpec, TensorValue, TtsError,
    TtsResult,
};
use tts_engine::{SynthesisEngine, VoiceFamily, VoiceState};

const COND_DIM: usize = 8;
const STYLE_DIM: usize = 16;

fn g2p() -> G2pResolver {
    G2pResolver::new(Box::new(Normalizer::new()), Arc::new(NoFallback))
}

/// Feed-forward stub: 4800 samples at 24 kHz, the last 800 near-silent.
struct StubVocoder {
    inputs: Vec<TensorSpec>,
    outputs: Vec<TensorSpec>,
}

impl StubVocoder {
    fn new() -> Self {
        Self {
            inputs: vec![
                TensorSpec::new("input_ids", DType::I64, vec![Dim::Fixed(1), Dim::Dynamic]),
                TensorSpec::new(
                    "style",
                    DType::F32,
                    vec![Dim::Fixed(1), Dim::Fixed(STYLE_DIM)],
                ),
                TensorSpec::new("speed", DType::F32, vec![Dim::Fixed(1)]),
            ],
            outputs: vec![TensorSpec::new("waveform", DType::F32, vec![Dim::Dynamic])],
        }
    }
}

impl ModelSession for StubVocoder {
    fn run(&mut self, _inputs: &[(&str, TensorValue)]) -> TtsResult<HashMap<String, TensorValue>> {
        let mut samples = vec![0.3f32; 4000];
        samples.extend(std::iter::repeat(0.0001).take(800));
        let mut out = HashMap::new();
        out.insert(
            "waveform".to_string(),
            TensorValue::f32(vec![samples.len()], samples),
        );
        Ok(out)
    }

    fn inputs(&self) -> &[TensorSpec] {
        &self.inputs
    }

    fn outputs(&self) -> &[TensorSpec] {
        &self.outputs
    }
}

/// Backbone stub with a frame counter in recurrent state; EOS fires at a
/// fixed frame.
struct StubBackbone {
    inputs: Vec<TensorSpec>,
    outputs: Vec<TensorSpec>,
    eos_at: i64,
}

impl StubBackbone {
    fn new(eos_at: i64) -> Self {
        Self {
            inputs: vec![
                TensorSpec::new(
                    "latent",
                    DType::F32,
                    vec![Dim::Fixed(1), Dim::Dynamic, Dim::Fixed(LATENT_DIM)],
                ),
                TensorSpec::new(
                    "conditioning",
                    DType::F32,
                    vec![Dim::Fixed(1), Dim::Dynamic, Dim::Fixed(COND_DIM)],
                ),
                TensorSpec::new("past_step", DType::I64, vec![Dim::Fixed(1)]),
            ],
            outputs: vec![],
            eos_at,
        }
    }
}

impl ModelSession for StubBackbone {
    fn run(&mut self, inputs: &[(&str, TensorValue)]) -> TtsResult<HashMap<String, TensorValue>> {
        let mut latent_seq = 0;
        let mut step = 0i64;
        for (name, value) in inputs {
            match *name {
                "latent" => latent_seq = value.shape()[1],
                "past_step" => step = value.as_i64()?[0],
                _ => {}
            }
        }
        let next = if latent_seq > 0 { step + 1 } else { step };
        let eos = if latent_seq > 0 && step >= self.eos_at {
            0.0
        } else {
            -10.0
        };

        let mut out = HashMap::new();
        out.insert(
            "condition".to_string(),
            TensorValue::f32(vec![1, COND_DIM], vec![0.4; COND_DIM]),
        );
        out.insert("eos_logit".to_string(), TensorValue::f32(vec![1], vec![eos]));
        out.insert("present_step".to_string(), TensorValue::scalar_i64(next));
        Ok(out)
    }

    fn inputs(&self) -> &[TensorSpec] {
        &self.inputs
    }

    fn outputs(&self) -> &[TensorSpec] {
        &self.outputs
    }
}

struct StubFlow {
    inputs: Vec<TensorSpec>,
    outputs: Vec<TensorSpec>,
}

impl StubFlow {
    fn new() -> Self {
        Self {
            inputs: vec![],
            outputs: vec![],
        }
    }
}

impl ModelSession for StubFlow {
    fn run(&mut self, _inputs: &[(&str, TensorValue)]) -> TtsResult<HashMap<String, TensorValue>> {
        let mut out = HashMap::new();
        out.insert(
            "velocity".to_string(),
            TensorValue::f32(vec![1, LATENT_DIM], vec![0.5; LATENT_DIM]),
        );
        Ok(out)
    }

    fn inputs(&self) -> &[TensorSpec] {
        &self.inputs
    }

    fn outputs(&self) -> &[TensorSpec] {
        &self.outputs
    }
}

struct StubConditioner {
    inputs: Vec<TensorSpec>,
    outputs: Vec<TensorSpec>,
}

impl StubConditioner {
    fn new() -> Self {
        Self {
            inputs: vec![],
            outputs: vec![],
        }
    }
}

impl ModelSession for StubConditioner {
    fn run(&mut self, inputs: &[(&str, TensorValue)]) -> TtsResult<HashMap<String, TensorValue>> {
        let tokens = inputs
            .iter()
            .find(|(n, _)| *n == "token_ids")
            .ok_or_else(|| TtsError::invalid_input("missing token_ids"))?
            .1
            .as_i64()?;
        let mut out = HashMap::new();
        out.insert(
            "embeddings".to_string(),
            TensorValue::f32(
                vec![1, tokens.len(), COND_DIM],
                vec![0.1; tokens.len() * COND_DIM],
            ),
        );
        Ok(out)
    }

    fn inputs(&self) -> &[TensorSpec] {
        &self.inputs
    }

    fn outputs(&self) -> &[TensorSpec] {
        &self.outputs
    }
}

struct StubDecoder {
    inputs: Vec<TensorSpec>,
    outputs: Vec<TensorSpec>,
}

impl StubDecoder {
    fn new() -> Self {
        Self {
            inputs: vec![
                TensorSpec::new(
                    "latents",
                    DType::F32,
                    vec![Dim::Fixed(1), Dim::Dynamic, Dim::Fixed(LATENT_DIM)],
                ),
                TensorSpec::new("past_frames", DType::I64, vec![Dim::Fixed(1)]),
            ],
            outputs: vec![],
        }
    }
}

impl ModelSession for StubDecoder {
    fn run(&mut self, inputs: &[(&str, TensorValue)]) -> TtsResult<HashMap<String, TensorValue>> {
        let mut chunk = 0;
        let mut seen = 0i64;
        for (name, value) in inputs {
            match *name {
                "latents" => chunk = value.shape()[1],
                "past_frames" => seen = value.as_i64()?[0],
                _ => {}
            }
        }
        let samples = vec![0.2f32; chunk * SAMPLES_PER_FRAME];
        let mut out = HashMap::new();
        out.insert(
            "audio".to_string(),
            TensorValue::f32(vec![samples.len()], samples),
        );
        out.insert(
            "present_frames".to_string(),
            TensorValue::scalar_i64(seen + chunk as i64),
        );
        Ok(out)
    }

    fn inputs(&self) -> &[TensorSpec] {
        &self.inputs
    }

    fn outputs(&self) -> &[TensorSpec] {
        &self.outputs
    }
}

struct StubEncoder {
    inputs: Vec<TensorSpec>,
    outputs: Vec<TensorSpec>,
}

impl StubEncoder {
    fn new() -> Self {
        Self {
            inputs: vec![],
            outputs: vec![],
        }
    }
}

impl ModelSession for StubEncoder {
    fn run(&mut self, inputs: &[(&str, TensorValue)]) -> TtsResult<HashMap<String, TensorValue>> {
        let samples = inputs[0].1.as_f32()?.len();
        let frames = (samples / SAMPLES_PER_FRAME).max(1);
        let mut out = HashMap::new();
        out.insert(
            "embedding".to_string(),
            TensorValue::f32(
                vec![1, frames, COND_DIM],
                vec![0.7; frames * COND_DIM],
            ),
        );
        Ok(out)
    }

    fn inputs(&self) -> &[TensorSpec] {
        &self.inputs
    }

    fn outputs(&self) -> &[TensorSpec] {
        &self.outputs
    }
}

fn unigram_vocab() -> UnigramTokenizer {
    // Minimal vocabulary; everything else goes through byte fallback.
    fn varint(mut value: u64, out: &mut Vec<u8>) {
        loop {
            let byte = (value & 0x7f) as u8;
            value >>= 7;
            if value == 0 {
                out.push(byte);
                break;
            }
            out.push(byte | 0x80);
        }
    }
    let mut data = Vec::new();
    let pieces: Vec<(String, f32, u64)> = std::iter::once(("<unk>".to_string(), 0.0, 2))
        .chain((0u8..=255).map(|b| (format!("<0x{b:02X}>"), 0.0, 6)))
        .chain(
            ["\u{2581}", "Hello", "world", ".", "!", "?", ","]
                .iter()
                .map(|s| (s.to_string(), -2.0, 1)),
        )
        .collect();
    for (piece, score, kind) in pieces {
        let mut body = Vec::new();
        varint((1 << 3) | 2, &mut body);
        varint(piece.len() as u64, &mut body);
        body.extend_from_slice(piece.as_bytes());
        varint((2 << 3) | 5, &mut body);
        body.extend_from_slice(&score.to_le_bytes());
        varint(3 << 3, &mut body);
        varint(kind, &mut body);

        varint((1 << 3) | 2, &mut data);
        varint(body.len() as u64, &mut data);
        data.extend_from_slice(&body);
    }
    UnigramTokenizer::load(&data).unwrap()
}

fn feed_forward_engine() -> SynthesisEngine {
    let mut engine = SynthesisEngine::builder()
        .with_g2p(g2p())
        .with_feed_forward(FeedForwardEngine::new(
            Box::new(StubVocoder::new()),
            TrimPolicy::TrailingSilence {
                threshold: 0.01,
                guard: 120,
            },
        ))
        .build()
        .unwrap();
    let voice = VoiceState::new("aria", "Aria", vec![0.0; 10 * STYLE_DIM], 10, true).unwrap();
    engine.register_voice(voice, VoiceFamily::FeedForward).unwrap();
    engine
}

fn flow_engine(decoding: DecodingMode, voices_dir: Option<&std::path::Path>) -> SynthesisEngine {
    let flow = FlowMatchingEngine::new(
        Box::new(StubBackbone::new(6)),
        Box::new(StubFlow::new()),
        Box::new(StubConditioner::new()),
        LATENT_DIM,
        COND_DIM,
    )
    .with_seed(3);
    let codec = StreamingCodec::new(Some(Box::new(StubEncoder::new())), Box::new(StubDecoder::new()));

    let mut builder = SynthesisEngine::builder()
        .with_g2p(g2p())
        .with_flow_matching(flow, codec, unigram_vocab())
        .with_config(
            GenerationConfig::default()
                .with_ode_steps(2)
                .with_temperature(0.0)
                .with_decoding(decoding),
        );
    if let Some(dir) = voices_dir {
        builder = builder.with_voices_dir(dir);
    }
    let mut engine = builder.build().unwrap();

    let voice =
        VoiceState::new("nimbus", "Nimbus", vec![0.5; 4 * COND_DIM], 4, true).unwrap();
    engine.register_voice(voice, VoiceFamily::FlowMatching).unwrap();
    engine
}

#[test]
fn feed_forward_hello_single_callback() {
    let mut engine = feed_forward_engine();
    let mut chunks = Vec::new();
    engine
        .generate("Hello.", 1.0, "aria", &mut |chunk| chunks.push(chunk))
        .unwrap();

    // One sentence, one model call, one callback; trailing silence trimmed.
    assert_eq!(chunks.len(), 1);
    assert!(chunks[0].num_samples() <= 4800);
    assert!(chunks[0].num_samples() >= 4000);
    assert_eq!(chunks[0].sample_rate, 24_000);
}

#[test]
fn feed_forward_multi_sentence_batches() {
    let mut engine = feed_forward_engine();
    let mut chunks = 0;
    engine
        .generate(
            "The cat is here. The dog is there. All good.",
            1.0,
            "aria",
            &mut |_| chunks += 1,
        )
        .unwrap();
    // First sentence dispatched alone; the remaining two merge.
    assert_eq!(chunks, 2);
}

#[test]
fn unknown_voice_is_an_error() {
    let mut engine = feed_forward_engine();
    let result = engine.generate("Hello.", 1.0, "nope", &mut |_| {});
    assert!(matches!(result, Err(TtsError::UnknownVoice(_))));
}

#[test]
fn flow_streaming_emits_whole_frames() {
    let mut engine = flow_engine(DecodingMode::Streaming, None);
    let mut total = 0;
    engine
        .generate("Hello world.", 1.0, "nimbus", &mut |chunk| {
            total += chunk.num_samples();
        })
        .unwrap();

    // EOS at frame 6 plus 3 post-EOS frames: 10 frames of audio.
    assert_eq!(total, 10 * SAMPLES_PER_FRAME);
}

#[test]
fn flow_batch_mode_matches_streaming_output_length() {
    let mut streaming = flow_engine(DecodingMode::Streaming, None);
    let mut batch = flow_engine(DecodingMode::Batch, None);

    let mut streamed = 0;
    streaming
        .generate("Hello world.", 1.0, "nimbus", &mut |c| {
            streamed += c.num_samples();
        })
        .unwrap();

    let mut batched = 0;
    batch
        .generate("Hello world.", 1.0, "nimbus", &mut |c| {
            batched += c.num_samples();
        })
        .unwrap();

    assert_eq!(streamed, batched);
}

#[test]
fn clone_voice_persists_and_reloads() {
    let dir = tempfile::tempdir().unwrap();
    let wav_path = dir.path().join("reference.wav");
    wav::write_wav_samples(&wav_path, &vec![0.1f32; SAMPLES_PER_FRAME * 2], 24_000).unwrap();

    let voices_dir = dir.path().join("voices");
    let id = {
        let mut engine = flow_engine(DecodingMode::Streaming, Some(&voices_dir));
        let id = engine.clone_voice(&wav_path, "My Voice").unwrap();
        assert!(engine.voices().contains(&id));

        // The cloned voice synthesizes.
        let mut samples = 0;
        engine
            .generate("Hello.", 1.0, &id, &mut |c| samples += c.num_samples())
            .unwrap();
        assert!(samples > 0);
        id
    };

    // A fresh engine over the same directory sees the persisted voice.
    let engine = flow_engine(DecodingMode::Streaming, Some(&voices_dir));
    assert!(engine.voices().contains(&id));
}

#[test]
fn delete_cloned_voice_removes_blob() {
    let dir = tempfile::tempdir().unwrap();
    let wav_path = dir.path().join("reference.wav");
    wav::write_wav_samples(&wav_path, &vec![0.1f32; SAMPLES_PER_FRAME], 24_000).unwrap();

    let voices_dir = dir.path().join("voices");
    let mut engine = flow_engine(DecodingMode::Streaming, Some(&voices_dir));
    let id = engine.clone_voice(&wav_path, "Temp Voice").unwrap();
    let blob = voices_dir.join(format!("{id}.voice"));
    assert!(blob.exists());

    engine.delete_cloned_voice(&id).unwrap();
    assert!(!blob.exists());
    assert!(!engine.voices().contains(&id));
}

#[test]
fn bundled_voice_cannot_be_deleted() {
    let mut engine = flow_engine(DecodingMode::Streaming, None);
    assert!(engine.delete_cloned_voice("nimbus").is_err());
}

#[test]
fn sample_rate_reported() {
    let engine = flow_engine(DecodingMode::Streaming, None);
    assert_eq!(engine.sample_rate(), 24_000);
}

#[test]
fn warm_up_does_not_fail() {
    let mut engine = feed_forward_engine();
    engine.warm_up();
}
