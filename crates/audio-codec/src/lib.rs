//! # audio-codec
//!
//! Streaming neural audio codec driven through opaque model sessions.
//!
//! - `encode`: waveform to fixed-dimension per-frame embeddings, one
//!   stateless call (used for voice cloning).
//! - `decode`: latent frames to waveform, carrying recurrent decoder state
//!   forward across chunk boundaries within one utterance.
//!
//! Also home to the audio postprocessor (silence trimming, 16-bit PCM
//! conversion), WAV I/O, and reference-audio resampling.

pub mod postprocess;
pub mod resample;
pub mod wav;

use tracing::{debug, instrument};
use tts_core::types::{LATENT_DIM, SAMPLE_RATE};
use tts_core::{LatentFrame, ModelSession, StateMap, TensorValue, TtsError, TtsResult};

/// Streaming codec over an encoder and a decoder session.
///
/// Decoder state must be reused verbatim across chunks within one utterance
/// and reset between utterances; stale or cross-utterance state produces
/// audible discontinuities.
pub struct StreamingCodec {
    encoder: Option<Box<dyn ModelSession>>,
    decoder: Box<dyn ModelSession>,
    latent_dim: usize,
    sample_rate: u32,
}

impl StreamingCodec {
    /// Build a codec; the encoder session is optional (bundled-voice-only
    /// hosts ship none).
    pub fn new(encoder: Option<Box<dyn ModelSession>>, decoder: Box<dyn ModelSession>) -> Self {
        Self {
            encoder,
            decoder,
            latent_dim: LATENT_DIM,
            sample_rate: SAMPLE_RATE,
        }
    }

    /// The codec's output sample rate in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Whether voice cloning (encode) is available.
    pub fn can_encode(&self) -> bool {
        self.encoder.is_some()
    }

    /// Encode a waveform into per-frame embeddings.
    ///
    /// Returns the flattened `[frames, embedding_dim]` buffer and the frame
    /// count. Single stateless call.
    #[instrument(skip(self, waveform), fields(samples = waveform.len()))]
    pub fn encode(&mut self, waveform: &[f32]) -> TtsResult<(Vec<f32>, usize)> {
        let encoder = self
            .encoder
            .as_mut()
            .ok_or_else(|| TtsError::config("no encoder session loaded"))?;

        let inputs = [(
            "waveform",
            TensorValue::f32(vec![1, 1, waveform.len()], waveform.to_vec()),
        )];
        let outputs = encoder.run(&inputs)?;
        let embedding = outputs
            .get("embedding")
            .ok_or_else(|| TtsError::output("encoder produced no embedding"))?;

        let shape = embedding.shape();
        if shape.len() != 3 {
            return Err(TtsError::output(format!(
                "expected [1, frames, dim] embedding, got {shape:?}"
            )));
        }
        let frames = shape[1];
        let data = embedding.as_f32()?.to_vec();

        debug!(frames, dim = shape[2], "voice reference encoded");
        Ok((data, frames))
    }

    /// Zero-initialize decoder recurrent state from the model's declared
    /// shapes.
    pub fn init_decoder_state(&self) -> StateMap {
        StateMap::init_for(self.decoder.as_ref())
    }

    /// Decode a chunk of latent frames, updating `state` in place.
    #[instrument(skip(self, frames, state), fields(frames = frames.len()))]
    pub fn decode(&mut self, frames: &[LatentFrame], state: &mut StateMap) -> TtsResult<Vec<f32>> {
        if frames.is_empty() {
            return Ok(Vec::new());
        }

        let mut latents = Vec::with_capacity(frames.len() * self.latent_dim);
        for frame in frames {
            if frame.data.len() != self.latent_dim {
                return Err(TtsError::invalid_input(format!(
                    "latent frame has dim {}, expected {}",
                    frame.data.len(),
                    self.latent_dim
                )));
            }
            latents.extend_from_slice(&frame.data);
        }

        let mut inputs = vec![(
            "latents",
            TensorValue::f32(vec![1, frames.len(), self.latent_dim], latents),
        )];
        state.extend_inputs(&mut inputs);

        let outputs = self.decoder.run(&inputs)?;
        state.update_from(&outputs)?;

        let audio = outputs
            .get("audio")
            .ok_or_else(|| TtsError::output("decoder produced no audio"))?
            .as_f32()?
            .to_vec();
        Ok(audio)
    }
}

impl std::fmt::Debug for StreamingCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamingCodec")
            .field("latent_dim", &self.latent_dim)
            .field("sample_rate", &self.sample_rate)
            .field("can_encode", &self.can_encode())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tts_core::types::SAMPLES_PER_FRAME;
    use tts_core::{DType, Dim, TensorSpec};

    /// Decoder whose state counts decoded frames; output sample values
    /// encode the running frame index so state reuse is observable.
    struct CountingDecoder {
        inputs: Vec<TensorSpec>,
        outputs: Vec<TensorSpec>,
    }

    impl CountingDecoder {
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
                outputs: vec![TensorSpec::new("audio", DType::F32, vec![Dim::Dynamic])],
            }
        }
    }

    impl ModelSession for CountingDecoder {
        fn run(
            &mut self,
            inputs: &[(&str, TensorValue)],
        ) -> TtsResult<HashMap<String, TensorValue>> {
            let mut chunk_frames = 0;
            let mut seen = 0i64;
            for (name, value) in inputs {
                match *name {
                    "latents" => chunk_frames = value.shape()[1],
                    "past_frames" => seen = value.as_i64()?[0],
                    _ => {}
                }
            }

            let samples: Vec<f32> = (0..chunk_frames)
                .flat_map(|i| {
                    let index = seen + i as i64;
                    std::iter::repeat(index as f32).take(SAMPLES_PER_FRAME)
                })
                .collect();

            let mut out = HashMap::new();
            out.insert(
                "audio".to_string(),
                TensorValue::f32(vec![samples.len()], samples),
            );
            out.insert(
                "present_frames".to_string(),
                TensorValue::scalar_i64(seen + chunk_frames as i64),
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
                inputs: vec![TensorSpec::new(
                    "waveform",
                    DType::F32,
                    vec![Dim::Fixed(1), Dim::Fixed(1), Dim::Dynamic],
                )],
                outputs: vec![TensorSpec::new(
                    "embedding",
                    DType::F32,
                    vec![Dim::Fixed(1), Dim::Dynamic, Dim::Fixed(4)],
                )],
            }
        }
    }

    impl ModelSession for StubEncoder {
        fn run(
            &mut self,
            inputs: &[(&str, TensorValue)],
        ) -> TtsResult<HashMap<String, TensorValue>> {
            let samples = inputs[0].1.as_f32()?.len();
            let frames = samples.div_ceil(SAMPLES_PER_FRAME);
            let mut out = HashMap::new();
            out.insert(
                "embedding".to_string(),
                TensorValue::f32(vec![1, frames, 4], vec![0.25; frames * 4]),
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

    fn frame(value: f32) -> LatentFrame {
        LatentFrame::new(vec![value; LATENT_DIM])
    }

    #[test]
    fn test_decode_carries_state_across_chunks() {
        let mut codec = StreamingCodec::new(None, Box::new(CountingDecoder::new()));
        let mut state = codec.init_decoder_state();

        let first = codec.decode(&[frame(0.0), frame(0.0)], &mut state).unwrap();
        let second = codec.decode(&[frame(0.0)], &mut state).unwrap();

        assert_eq!(first.len(), 2 * SAMPLES_PER_FRAME);
        assert_eq!(second.len(), SAMPLES_PER_FRAME);
        // The third decoded frame knows two frames came before it.
        assert_eq!(second[0], 2.0);
    }

    #[test]
    fn test_fresh_state_restarts_the_stream() {
        let mut codec = StreamingCodec::new(None, Box::new(CountingDecoder::new()));

        let mut state = codec.init_decoder_state();
        codec.decode(&[frame(0.0)], &mut state).unwrap();

        let mut fresh = codec.init_decoder_state();
        let audio = codec.decode(&[frame(0.0)], &mut fresh).unwrap();
        assert_eq!(audio[0], 0.0);
    }

    #[test]
    fn test_decode_empty_chunk() {
        let mut codec = StreamingCodec::new(None, Box::new(CountingDecoder::new()));
        let mut state = codec.init_decoder_state();
        assert!(codec.decode(&[], &mut state).unwrap().is_empty());
    }

    #[test]
    fn test_decode_rejects_wrong_dim() {
        let mut codec = StreamingCodec::new(None, Box::new(CountingDecoder::new()));
        let mut state = codec.init_decoder_state();
        let bad = LatentFrame::new(vec![0.0; LATENT_DIM + 1]);
        assert!(codec.decode(&[bad], &mut state).is_err());
    }

    #[test]
    fn test_encode_returns_frame_count() {
        let mut codec =
            StreamingCodec::new(Some(Box::new(StubEncoder::new())), Box::new(CountingDecoder::new()));
        let waveform = vec![0.0f32; SAMPLES_PER_FRAME * 3];
        let (embedding, frames) = codec.encode(&waveform).unwrap();
        assert_eq!(frames, 3);
        assert_eq!(embedding.len(), frames * 4);
    }

    #[test]
    fn test_encode_without_encoder() {
        let mut codec = StreamingCodec::new(None, Box::new(CountingDecoder::new()));
        assert!(codec.encode(&[0.0; 16]).is_err());
    }
}
