//! Adaptive streaming scheduler.
//!
//! Couples a frame producer (the autoregressive engine) and a consumer (the
//! codec decoder) through a bounded channel. The producer runs on a spawned
//! thread and blocks on send when the consumer falls behind; the consumer
//! waits for the adaptive initial buffer before its first decode, then
//! decodes whenever the queued count reaches the decode threshold, always
//! leaving the reserve behind. Producer completion closes the channel and
//! the consumer flushes the remainder.

use std::sync::Arc;
use std::sync::mpsc::{Receiver, SyncSender, TrySendError, sync_channel};
use std::time::Instant;

use parking_lot::Mutex;
use tracing::{debug, instrument, trace};
use tts_core::{CancelToken, LatentFrame, TtsError, TtsResult};

use crate::perf::AdaptivePacing;

/// Bound on in-flight frames between producer and consumer.
const CHANNEL_CAPACITY: usize = 64;

/// Producer-side handle: push completed frames, timing recorded as a side
/// effect.
pub struct FrameSink {
    tx: SyncSender<LatentFrame>,
    pacing: Arc<Mutex<AdaptivePacing>>,
    last_frame_at: Instant,
}

impl FrameSink {
    /// Push one frame. Returns `false` once the consumer has gone away;
    /// the producer should stop generating.
    pub fn push(&mut self, frame: LatentFrame) -> bool {
        let now = Instant::now();
        self.pacing
            .lock()
            .record_frame(now.duration_since(self.last_frame_at));
        self.last_frame_at = Instant::now();

        // Blocking send is the backpressure: a full queue parks the
        // producer until the consumer drains. The blocked time must not
        // count as generation time, hence the timestamp reset above.
        match self.tx.try_send(frame) {
            Ok(()) => true,
            Err(TrySendError::Full(frame)) => {
                let sent = self.tx.send(frame).is_ok();
                self.last_frame_at = Instant::now();
                sent
            }
            Err(TrySendError::Disconnected(_)) => false,
        }
    }
}

/// Run one streaming utterance.
///
/// `produce` runs on a spawned thread and pushes frames into the sink until
/// done (dropping the sink closes the channel). `consume` is called on the
/// current thread with decoded-chunk batches; the final call passes
/// `is_final = true`. On cancellation the queue is drained and discarded.
#[instrument(skip_all)]
pub fn run_streaming<P>(
    pacing: Arc<Mutex<AdaptivePacing>>,
    cancel: &CancelToken,
    produce: P,
    mut consume: impl FnMut(&[LatentFrame], bool) -> TtsResult<()>,
) -> TtsResult<()>
where
    P: FnOnce(FrameSink) -> TtsResult<()> + Send,
{
    let (tx, rx) = sync_channel(CHANNEL_CAPACITY);
    let sink = FrameSink {
        tx,
        pacing: pacing.clone(),
        last_frame_at: Instant::now(),
    };

    std::thread::scope(|scope| {
        let producer = scope.spawn(move || produce(sink));

        let consumer_result = consume_loop(&rx, &pacing, cancel, &mut consume);
        // A consumer error drops the receiver, which unblocks the producer.
        drop(rx);

        let producer_result = producer
            .join()
            .map_err(|_| TtsError::internal("producer thread panicked"))?;

        consumer_result?;
        producer_result
    })
}

fn consume_loop(
    rx: &Receiver<LatentFrame>,
    pacing: &Mutex<AdaptivePacing>,
    cancel: &CancelToken,
    consume: &mut impl FnMut(&[LatentFrame], bool) -> TtsResult<()>,
) -> TtsResult<()> {
    let mut buffered: Vec<LatentFrame> = Vec::new();
    let mut emitted = false;

    while let Ok(frame) = rx.recv() {
        if cancel.is_cancelled() {
            // Drain and discard; no decode after the stop point.
            while rx.recv().is_ok() {}
            debug!("cancelled, queue drained");
            return Ok(());
        }

        buffered.push(frame);

        let params = pacing.lock().params();
        let threshold = if emitted {
            params.decode_threshold
        } else {
            params.initial_buffer
        };
        if buffered.len() >= threshold && buffered.len() > params.reserve {
            let take = buffered.len() - params.reserve;
            trace!(take, buffered = buffered.len(), "decoding chunk");
            consume(&buffered[..take], false)?;
            buffered.drain(..take);
            emitted = true;
        }
    }

    if cancel.is_cancelled() {
        return Ok(());
    }

    // Channel closed: producer finished. Flush the remainder.
    debug!(remainder = buffered.len(), "flushing final chunk");
    consume(&buffered, true)
}
