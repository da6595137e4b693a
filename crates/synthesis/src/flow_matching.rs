//! Autoregressive flow-matching generation.
//!
//! Three-stage generation per utterance: a voice-conditioning pass, a
//! text-conditioning pass, then a frame loop. Each loop step feeds the
//! previous frame's latent through the backbone (carrying recurrent state
//! forward), reads off a conditioning vector and an end-of-speech logit, and
//! integrates the conditioning into a latent frame with the Euler sampler.
//!
//! Once the EOS logit first crosses the threshold, exactly
//! `frames_after_eos` further frames are generated before the loop halts; a
//! hard frame cap bounds runaway generation if EOS never fires.

use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, instrument, trace};
use tts_core::{
    CancelToken, GenerationConfig, LatentFrame, ModelSession, StateMap, TensorValue, TtsError,
    TtsResult,
};

use crate::euler;

/// How a frame loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopOutcome {
    /// EOS fired and the post-EOS frames were generated.
    Eos { frames: usize },
    /// The hard frame cap was reached without EOS.
    FrameCap { frames: usize },
    /// The caller stopped the loop (cancellation or a closed sink).
    Stopped { frames: usize },
}

impl LoopOutcome {
    /// Frames generated before the loop ended.
    pub fn frames(&self) -> usize {
        match *self {
            Self::Eos { frames } | Self::FrameCap { frames } | Self::Stopped { frames } => frames,
        }
    }
}

/// Autoregressive engine over a backbone and a flow (velocity) model plus a
/// text conditioner, all reached through opaque sessions.
pub struct FlowMatchingEngine {
    backbone: Box<dyn ModelSession>,
    flow: Box<dyn ModelSession>,
    text_conditioner: Box<dyn ModelSession>,
    latent_dim: usize,
    conditioning_dim: usize,
    rng: StdRng,
}

impl FlowMatchingEngine {
    /// Build the engine around its three model sessions.
    pub fn new(
        backbone: Box<dyn ModelSession>,
        flow: Box<dyn ModelSession>,
        text_conditioner: Box<dyn ModelSession>,
        latent_dim: usize,
        conditioning_dim: usize,
    ) -> Self {
        Self {
            backbone,
            flow,
            text_conditioner,
            latent_dim,
            conditioning_dim,
            rng: StdRng::from_entropy(),
        }
    }

    /// Seed the noise source for deterministic generation.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Latent dimension of one generated frame.
    pub fn latent_dim(&self) -> usize {
        self.latent_dim
    }

    /// Run one utterance, pushing frames into `on_frame` as they complete.
    ///
    /// `voice_embedding` is the flattened per-voice conditioning buffer of
    /// shape `[voice_frames, conditioning_dim]`. `on_frame` returning `false`
    /// stops the loop (downstream closed). Recurrent state is created here
    /// and dropped on every exit path; it never leaks across utterances.
    #[instrument(skip_all, fields(tokens = text_tokens.len(), voice_frames))]
    pub fn generate(
        &mut self,
        text_tokens: &[i64],
        voice_embedding: &[f32],
        voice_frames: usize,
        config: &GenerationConfig,
        cancel: &CancelToken,
        mut on_frame: impl FnMut(LatentFrame) -> bool,
    ) -> TtsResult<LoopOutcome> {
        if text_tokens.is_empty() {
            return Err(TtsError::invalid_input("no text tokens to condition on"));
        }
        if voice_frames * self.conditioning_dim != voice_embedding.len() {
            return Err(TtsError::invalid_input(format!(
                "voice embedding length {} does not factor into {voice_frames} x {}",
                voice_embedding.len(),
                self.conditioning_dim
            )));
        }

        let mut state = StateMap::init_for(self.backbone.as_ref());

        // Voice conditioning: empty latent sequence, voice embedding as
        // conditioning. Outputs besides the state update are discarded.
        self.condition(
            &mut state,
            TensorValue::f32(
                vec![1, voice_frames, self.conditioning_dim],
                voice_embedding.to_vec(),
            ),
        )?;

        // Text conditioning, same shape of call.
        let text_embedding = self.embed_text(text_tokens)?;
        self.condition(&mut state, text_embedding)?;

        debug!(state_tensors = state.len(), "conditioning passes complete");

        // Frame loop. The first step feeds the NaN sentinel instead of a
        // previous latent.
        let mut prev_latent = vec![f32::NAN; self.latent_dim];
        let mut eos_step: Option<usize> = None;
        let mut frames = 0;

        for step in 0..config.max_frames {
            if cancel.is_cancelled() {
                debug!(step, "generation cancelled");
                return Ok(LoopOutcome::Stopped { frames });
            }

            let (conditioning, eos_logit) = self.backbone_step(&mut state, &prev_latent)?;
            let noise = euler::initial_noise(self.latent_dim, config.temperature, &mut self.rng);
            let latent = euler::integrate(
                self.flow.as_mut(),
                &conditioning,
                noise,
                config.ode_steps,
            )?;

            if eos_step.is_none() && eos_logit > config.eos_threshold {
                trace!(step, eos_logit, "end of speech detected");
                eos_step = Some(step);
            }

            prev_latent.copy_from_slice(&latent);
            frames += 1;
            if !on_frame(LatentFrame::new(latent)) {
                return Ok(LoopOutcome::Stopped { frames });
            }

            if let Some(eos) = eos_step {
                if step >= eos + config.frames_after_eos {
                    debug!(frames, eos_step = eos, "generation complete");
                    return Ok(LoopOutcome::Eos { frames });
                }
            }
        }

        debug!(frames, "frame cap reached without EOS");
        Ok(LoopOutcome::FrameCap { frames })
    }

    /// Conditioning pass: empty latent plus a conditioning sequence; only
    /// the recurrent state update survives.
    fn condition(&mut self, state: &mut StateMap, conditioning: TensorValue) -> TtsResult<()> {
        let mut inputs = vec![
            (
                "latent",
                TensorValue::f32(vec![1, 0, self.latent_dim], Vec::new()),
            ),
            ("conditioning", conditioning),
        ];
        state.extend_inputs(&mut inputs);
        let outputs = self.backbone.run(&inputs)?;
        state.update_from(&outputs)
    }

    /// One generation step: previous latent in, conditioning vector and EOS
    /// logit out, state updated in place.
    fn backbone_step(
        &mut self,
        state: &mut StateMap,
        prev_latent: &[f32],
    ) -> TtsResult<(Vec<f32>, f32)> {
        let mut inputs = vec![
            (
                "latent",
                TensorValue::f32(vec![1, 1, self.latent_dim], prev_latent.to_vec()),
            ),
            (
                "conditioning",
                TensorValue::f32(vec![1, 0, self.conditioning_dim], Vec::new()),
            ),
        ];
        state.extend_inputs(&mut inputs);

        let outputs = self.backbone.run(&inputs)?;
        state.update_from(&outputs)?;

        let conditioning = outputs
            .get("condition")
            .ok_or_else(|| TtsError::output("backbone produced no condition"))?
            .as_f32()?
            .to_vec();
        let eos_logit = *outputs
            .get("eos_logit")
            .ok_or_else(|| TtsError::output("backbone produced no eos_logit"))?
            .as_f32()?
            .first()
            .ok_or_else(|| TtsError::output("empty eos_logit"))?;

        Ok((conditioning, eos_logit))
    }

    fn embed_text(&mut self, tokens: &[i64]) -> TtsResult<TensorValue> {
        let inputs = [(
            "token_ids",
            TensorValue::i64(vec![1, tokens.len()], tokens.to_vec()),
        )];
        let mut outputs = self.text_conditioner.run(&inputs)?;
        outputs
            .remove("embeddings")
            .ok_or_else(|| TtsError::output("text conditioner produced no embeddings"))
    }
}

impl std::fmt::Debug for FlowMatchingEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlowMatchingEngine")
            .field("latent_dim", &self.latent_dim)
            .field("conditioning_dim", &self.conditioning_dim)
            .finish()
    }
}
