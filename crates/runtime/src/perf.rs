//! Device-speed measurement and adaptive buffer tiering.
//!
//! The scheduler measures per-frame generation time in a bounded rolling
//! window and recomputes its buffering parameters every few frames from the
//! speed ratio (mean generation time over the fixed per-frame audio
//! duration). The tier constants are empirically chosen configuration, not
//! protocol.

use std::collections::VecDeque;
use std::time::Duration;

use tracing::debug;
use tts_core::types::{SAMPLES_PER_FRAME, SAMPLE_RATE};

/// Rolling window size, in samples.
const WINDOW_CAPACITY: usize = 50;

/// Frames between recomputations.
const RECOMPUTE_EVERY: usize = 10;

/// Bounded rolling window of per-frame wall-clock generation times.
#[derive(Debug, Default)]
pub struct PerfWindow {
    samples: VecDeque<Duration>,
}

impl PerfWindow {
    /// Create an empty window.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one per-frame generation time.
    pub fn record(&mut self, elapsed: Duration) {
        if self.samples.len() == WINDOW_CAPACITY {
            self.samples.pop_front();
        }
        self.samples.push_back(elapsed);
    }

    /// Mean of the window, if any samples exist.
    pub fn mean(&self) -> Option<Duration> {
        if self.samples.is_empty() {
            return None;
        }
        let total: Duration = self.samples.iter().sum();
        Some(total / self.samples.len() as u32)
    }

    /// Number of recorded samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether no samples have been recorded.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Buffering parameters the consumer follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacingParams {
    /// Frames buffered before the first emission.
    pub initial_buffer: usize,
    /// Queued-frame count that triggers a decode thereafter.
    pub decode_threshold: usize,
    /// Frames always left behind in the buffer.
    pub reserve: usize,
}

/// One tier of the speed-ratio lookup table.
#[derive(Debug, Clone, Copy)]
pub struct PacingTier {
    /// Upper speed-ratio bound of this tier (inclusive).
    pub max_ratio: f32,
    /// Parameters applied inside this tier.
    pub params: PacingParams,
}

/// The ratio-to-buffering lookup table, ordered by ascending ratio; the
/// last tier catches everything above the table.
#[derive(Debug, Clone)]
pub struct PacingTiers {
    tiers: Vec<PacingTier>,
}

impl Default for PacingTiers {
    fn default() -> Self {
        Self {
            tiers: vec![
                PacingTier {
                    max_ratio: 1.0,
                    params: PacingParams {
                        initial_buffer: 8,
                        decode_threshold: 4,
                        reserve: 2,
                    },
                },
                PacingTier {
                    max_ratio: 1.5,
                    params: PacingParams {
                        initial_buffer: 14,
                        decode_threshold: 8,
                        reserve: 3,
                    },
                },
                PacingTier {
                    max_ratio: 2.0,
                    params: PacingParams {
                        initial_buffer: 22,
                        decode_threshold: 12,
                        reserve: 4,
                    },
                },
                PacingTier {
                    max_ratio: f32::INFINITY,
                    params: PacingParams {
                        initial_buffer: 30,
                        decode_threshold: 16,
                        reserve: 6,
                    },
                },
            ],
        }
    }
}

impl PacingTiers {
    /// Build a custom table; tiers must be ordered by ascending ratio.
    pub fn new(tiers: Vec<PacingTier>) -> Self {
        assert!(!tiers.is_empty(), "at least one pacing tier required");
        Self { tiers }
    }

    /// Parameters for a measured speed ratio.
    pub fn select(&self, ratio: f32) -> PacingParams {
        for tier in &self.tiers {
            if ratio <= tier.max_ratio {
                return tier.params;
            }
        }
        self.tiers.last().unwrap().params
    }
}

/// Self-tuning pacing state shared between producer and consumer.
#[derive(Debug)]
pub struct AdaptivePacing {
    window: PerfWindow,
    tiers: PacingTiers,
    frame_duration: Duration,
    current: PacingParams,
    frames_seen: usize,
}

impl Default for AdaptivePacing {
    fn default() -> Self {
        Self::new(PacingTiers::default())
    }
}

impl AdaptivePacing {
    /// Create pacing state starting at the slowest tier (conservative until
    /// measurements arrive).
    pub fn new(tiers: PacingTiers) -> Self {
        let current = tiers.tiers.last().unwrap().params;
        Self {
            window: PerfWindow::new(),
            tiers,
            frame_duration: Duration::from_micros(
                SAMPLES_PER_FRAME as u64 * 1_000_000 / SAMPLE_RATE as u64,
            ),
            current,
            frames_seen: 0,
        }
    }

    /// Record one frame's generation time; recomputes the parameters every
    /// [`RECOMPUTE_EVERY`] frames.
    pub fn record_frame(&mut self, elapsed: Duration) {
        self.window.record(elapsed);
        self.frames_seen += 1;

        if self.frames_seen % RECOMPUTE_EVERY == 0 {
            if let Some(ratio) = self.speed_ratio() {
                let params = self.tiers.select(ratio);
                if params != self.current {
                    debug!(
                        ratio,
                        initial = params.initial_buffer,
                        threshold = params.decode_threshold,
                        reserve = params.reserve,
                        "pacing retiered"
                    );
                }
                self.current = params;
                metrics::histogram!("tts_speed_ratio").record(f64::from(ratio));
            }
        }
    }

    /// Generation-time over playback-time ratio ("RTF" against one frame).
    pub fn speed_ratio(&self) -> Option<f32> {
        self.window
            .mean()
            .map(|mean| mean.as_secs_f32() / self.frame_duration.as_secs_f32())
    }

    /// Current buffering parameters.
    pub fn params(&self) -> PacingParams {
        self.current
    }

    /// Frames recorded so far.
    pub fn frames_seen(&self) -> usize {
        self.frames_seen
    }
}
