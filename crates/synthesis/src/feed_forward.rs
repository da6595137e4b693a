//! Single-call feed-forward synthesis.
//!
//! One model invocation produces a full audio buffer: token ids framed by
//! boundary markers, a voice-style vector sliced from a per-voice table by
//! token count, and a speed scalar whose dtype follows whatever the loaded
//! model declares.

use tracing::{debug, instrument};
use tts_core::{DType, ModelSession, TensorValue, TtsError, TtsResult};

/// Post-inference trimming, specific to the model family.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TrimPolicy {
    /// Drop fixed sample counts from the head and tail.
    FixedOffsets { head: usize, tail: usize },
    /// Scan backward from the end while amplitude stays below the
    /// threshold, then keep a guard region past the detected boundary.
    TrailingSilence { threshold: f32, guard: usize },
}

/// A per-voice style table of shape `[rows, style_dim]`, flattened
/// row-major. Longer utterances select later rows.
#[derive(Debug, Clone)]
pub struct StyleTable {
    data: Vec<f32>,
    rows: usize,
    style_dim: usize,
}

impl StyleTable {
    /// Build a table; the buffer length must factor into rows x style_dim.
    pub fn new(data: Vec<f32>, rows: usize, style_dim: usize) -> TtsResult<Self> {
        if rows == 0 || data.len() != rows * style_dim {
            return Err(TtsError::invalid_input(format!(
                "style table length {} does not factor into {rows} x {style_dim}",
                data.len()
            )));
        }
        Ok(Self {
            data,
            rows,
            style_dim,
        })
    }

    /// Style vector dimension.
    pub fn style_dim(&self) -> usize {
        self.style_dim
    }

    /// The row for a given token count, clamped into the table.
    pub fn row(&self, token_count: usize) -> &[f32] {
        let row = token_count.min(self.rows - 1);
        &self.data[row * self.style_dim..(row + 1) * self.style_dim]
    }
}

/// Non-autoregressive engine: one session call per batch of tokens.
pub struct FeedForwardEngine {
    session: Box<dyn ModelSession>,
    trim: TrimPolicy,
    speed_dtype: DType,
}

impl FeedForwardEngine {
    /// Build the engine; the speed input dtype is read off the session's
    /// declared specs (models disagree on float vs integer speed).
    pub fn new(session: Box<dyn ModelSession>, trim: TrimPolicy) -> Self {
        let speed_dtype = session
            .inputs()
            .iter()
            .find(|spec| spec.name == "speed")
            .map(|spec| spec.dtype)
            .unwrap_or(DType::F32);
        Self {
            session,
            trim,
            speed_dtype,
        }
    }

    /// The engine's trim policy.
    pub fn trim_policy(&self) -> TrimPolicy {
        self.trim
    }

    /// Synthesize one batch of token ids into raw audio samples.
    #[instrument(skip(self, tokens, style), fields(tokens = tokens.len()))]
    pub fn run(&mut self, tokens: &[i64], style: &[f32], speed: f32) -> TtsResult<Vec<f32>> {
        if tokens.is_empty() {
            return Err(TtsError::invalid_input("no tokens to synthesize"));
        }

        // Boundary markers frame the sequence.
        let mut framed = Vec::with_capacity(tokens.len() + 2);
        framed.push(0);
        framed.extend_from_slice(tokens);
        framed.push(0);
        let framed_len = framed.len();

        let speed_tensor = match self.speed_dtype {
            DType::F32 => TensorValue::scalar_f32(speed),
            DType::I64 => TensorValue::scalar_i64(speed.round() as i64),
        };

        let inputs = [
            ("input_ids", TensorValue::i64(vec![1, framed_len], framed)),
            (
                "style",
                TensorValue::f32(vec![1, style.len()], style.to_vec()),
            ),
            ("speed", speed_tensor),
        ];
        let outputs = self.session.run(&inputs)?;
        let waveform = outputs
            .get("waveform")
            .or_else(|| outputs.get("audio"))
            .ok_or_else(|| TtsError::output("feed-forward model produced no waveform"))?
            .as_f32()?
            .to_vec();

        debug!(samples = waveform.len(), "feed-forward synthesis complete");
        Ok(waveform)
    }
}

impl std::fmt::Debug for FeedForwardEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeedForwardEngine")
            .field("trim", &self.trim)
            .field("speed_dtype", &self.speed_dtype)
            .finish()
    }
}
