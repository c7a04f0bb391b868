//! Fixed-interval block driver.
//!
//! [`ThreadedDriver`] owns an [`AudioProcessor`] on a dedicated thread and wakes
//! every [`DriverConfig::update_interval`]. Each tick it tops the output queue up
//! to one interval's worth of samples plus the latency target, rendering the
//! shortfall as a single block (clamped to `max_block`).
//!
//! Topology changes go through the processor's [`GraphEditor`](partita_core::GraphEditor),
//! which stays usable from any thread while the driver runs.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use partita_core::AudioProcessor;

use crate::queue::OutputQueue;
use crate::{Error, Result};

/// Timing and block-size limits for a [`ThreadedDriver`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverConfig {
    /// Time between ticks.
    pub update_interval: Duration,
    /// Samples to keep queued beyond one interval's worth.
    pub latency_samples: usize,
    /// Shortfalls below this are left for a later tick.
    pub min_block: usize,
    /// Largest block rendered in one tick.
    pub max_block: usize,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            update_interval: Duration::from_millis(15),
            latency_samples: 512,
            min_block: 0,
            max_block: 8192,
        }
    }
}

impl DriverConfig {
    /// Returns the block length to render for one tick, or 0 to skip.
    ///
    /// `needed = sample_rate * update_interval + latency_samples`. When more
    /// than `buffered` samples are needed, the shortfall is clamped to
    /// `max_block` and rendered if it reaches `max(min_block, 1)`.
    pub fn block_for(&self, sample_rate: u32, buffered: usize) -> usize {
        let per_tick = (f64::from(sample_rate) * self.update_interval.as_secs_f64()).round() as usize;
        let needed = per_tick + self.latency_samples;
        if needed <= buffered {
            return 0;
        }

        let block = (needed - buffered).min(self.max_block);
        if block < self.min_block.max(1) { 0 } else { block }
    }
}

#[derive(Default)]
struct Shared {
    stop: Mutex<bool>,
    wake: Condvar,
    running: AtomicBool,
    blocks: AtomicU64,
    samples: AtomicU64,
}

/// Renders blocks on a background thread at a fixed interval.
pub struct ThreadedDriver {
    shared: Arc<Shared>,
    thread: Option<JoinHandle<AudioProcessor>>,
}

impl ThreadedDriver {
    /// Moves `processor` onto a new `partita-driver` thread and starts ticking.
    ///
    /// # Panics
    ///
    /// Panics if `config.update_interval` is zero.
    pub fn start(
        processor: AudioProcessor,
        queue: OutputQueue,
        sample_rate: u32,
        config: DriverConfig,
    ) -> Result<Self> {
        assert!(
            !config.update_interval.is_zero(),
            "driver update interval must be non-zero"
        );
        let shared = Arc::new(Shared::default());
        shared.running.store(true, Ordering::Release);

        let thread_shared = Arc::clone(&shared);
        let thread = thread::Builder::new()
            .name("partita-driver".to_string())
            .spawn(move || run(processor, &queue, sample_rate, config, &thread_shared))
            .map_err(Error::SpawnDriver)?;

        tracing::info!(
            sample_rate,
            interval_ms = config.update_interval.as_millis() as u64,
            latency = config.latency_samples,
            "driver started"
        );

        Ok(Self {
            shared,
            thread: Some(thread),
        })
    }

    /// Returns true until the driver thread has exited.
    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::Acquire)
    }

    /// Returns the number of blocks rendered so far.
    pub fn blocks_rendered(&self) -> u64 {
        self.shared.blocks.load(Ordering::Relaxed)
    }

    /// Returns the number of samples rendered so far.
    pub fn samples_rendered(&self) -> u64 {
        self.shared.samples.load(Ordering::Relaxed)
    }

    /// Stops the driver, joins its thread and returns the processor.
    pub fn finish(mut self) -> AudioProcessor {
        match self.stop_and_join() {
            Some(processor) => processor,
            // `thread` is only taken here and in Drop, and `finish` consumes self.
            None => unreachable!("driver thread already joined"),
        }
    }

    fn stop_and_join(&mut self) -> Option<AudioProcessor> {
        let thread = self.thread.take()?;
        *self.shared.stop.lock() = true;
        self.shared.wake.notify_all();

        let processor = match thread.join() {
            Ok(processor) => processor,
            Err(payload) => std::panic::resume_unwind(payload),
        };
        tracing::info!(
            blocks = self.blocks_rendered(),
            samples = self.samples_rendered(),
            "driver stopped"
        );
        Some(processor)
    }
}

impl Drop for ThreadedDriver {
    fn drop(&mut self) {
        if thread::panicking() {
            *self.shared.stop.lock() = true;
            self.shared.wake.notify_all();
            return;
        }
        let _ = self.stop_and_join();
    }
}

impl std::fmt::Debug for ThreadedDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThreadedDriver")
            .field("running", &self.is_running())
            .field("blocks_rendered", &self.blocks_rendered())
            .finish()
    }
}

fn run(
    mut processor: AudioProcessor,
    queue: &OutputQueue,
    sample_rate: u32,
    config: DriverConfig,
    shared: &Shared,
) -> AudioProcessor {
    let mut deadline = Instant::now();
    loop {
        let block = config.block_for(sample_rate, queue.samples_buffered());
        if block > 0 {
            processor.update(block);
            shared.blocks.fetch_add(1, Ordering::Relaxed);
            shared.samples.fetch_add(block as u64, Ordering::Relaxed);
        } else {
            // Keep applying topology edits even when nothing needs rendering.
            processor.update(0);
        }

        deadline += config.update_interval;
        let now = Instant::now();
        if deadline + config.update_interval < now {
            tracing::debug!("driver fell behind, resetting tick deadline");
            deadline = now;
        }

        let mut stop = shared.stop.lock();
        while !*stop {
            if shared.wake.wait_until(&mut stop, deadline).timed_out() {
                break;
            }
        }
        if *stop {
            break;
        }
    }

    shared.running.store(false, Ordering::Release);
    processor
}
