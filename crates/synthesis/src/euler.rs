//! Fixed-step Euler integration of the learned velocity field.
//!
//! Flow matching transports a noise sample to a latent frame by following
//! the velocity model: starting from Gaussian noise scaled by
//! `sqrt(temperature)` (or zeros at temperature 0), each of `steps`
//! iterations applies `x <- x + velocity(x, s, t, conditioning) / steps`
//! with `s = i/steps` and `t = s + 1/steps`. All arithmetic is
//! single-precision.

use rand::Rng;
use rand_distr::StandardNormal;
use tts_core::{ModelSession, TensorValue, TtsError, TtsResult};

/// Sample the integration start point.
pub fn initial_noise(dim: usize, temperature: f32, rng: &mut impl Rng) -> Vec<f32> {
    if temperature <= 0.0 {
        return vec![0.0; dim];
    }
    let scale = temperature.sqrt();
    (0..dim)
        .map(|_| {
            let z: f32 = rng.sample(StandardNormal);
            z * scale
        })
        .collect()
}

/// Integrate the velocity field into one latent frame.
pub fn integrate(
    flow: &mut dyn ModelSession,
    conditioning: &[f32],
    mut x: Vec<f32>,
    steps: usize,
) -> TtsResult<Vec<f32>> {
    if steps == 0 {
        return Err(TtsError::config("ode_steps must be at least 1"));
    }

    let dim = x.len();
    let dt = 1.0 / steps as f32;

    for i in 0..steps {
        let s = i as f32 * dt;
        let t = s + dt;

        let inputs = [
            ("x", TensorValue::f32(vec![1, dim], x.clone())),
            ("s", TensorValue::scalar_f32(s)),
            ("t", TensorValue::scalar_f32(t)),
            (
                "condition",
                TensorValue::f32(vec![1, conditioning.len()], conditioning.to_vec()),
            ),
        ];
        let outputs = flow.run(&inputs)?;
        let velocity = outputs
            .get("velocity")
            .ok_or_else(|| TtsError::output("flow model produced no velocity"))?
            .as_f32()?;
        if velocity.len() != dim {
            return Err(TtsError::output(format!(
                "velocity length {} does not match latent dim {dim}",
                velocity.len()
            )));
        }

        for (value, v) in x.iter_mut().zip(velocity) {
            *value += v * dt;
        }
    }

    Ok(x)
}
