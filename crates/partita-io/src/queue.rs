//! Locked sample queue between the graph and the device callback.
//!
//! [`OutputQueue`] pairs a [`RingBuffer`] with a mutex. The graph's output
//! module pushes whole blocks from a worker thread; the device callback pulls
//! exactly as many samples as the device asks for, padding with silence when
//! the queue runs dry.
//!
//! ## Drained state
//!
//! A pull that cannot be fully satisfied puts the queue in the *drained* state.
//! Entering it counts one underflow and fires the underflow callback once; the
//! next push leaves it. A fresh queue starts drained without counting, since
//! nothing has been produced yet.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

use parking_lot::Mutex;
use partita_core::RingBuffer;

/// Invoked once each time the queue enters the drained state.
pub type UnderflowCallback = Box<dyn FnMut() + Send>;

struct Inner {
    buffer: Mutex<RingBuffer<f32>>,
    /// Mirror of `buffer.size()` readable without the lock.
    buffered: AtomicUsize,
    drained: AtomicBool,
    underflows: AtomicU64,
    on_underflow: Mutex<Option<UnderflowCallback>>,
}

/// Cloneable handle to a shared mono sample queue.
#[derive(Clone)]
pub struct OutputQueue {
    inner: Arc<Inner>,
}

impl OutputQueue {
    /// Creates an empty, drained queue.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates an empty queue with `capacity` samples of storage reserved.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Arc::new(Inner {
                buffer: Mutex::new(RingBuffer::with_capacity(capacity)),
                buffered: AtomicUsize::new(0),
                drained: AtomicBool::new(true),
                underflows: AtomicU64::new(0),
                on_underflow: Mutex::new(None),
            }),
        }
    }

    /// Appends `samples` and leaves the drained state.
    pub fn push(&self, samples: &[f32]) {
        if samples.is_empty() {
            return;
        }
        let mut buffer = self.inner.buffer.lock();
        buffer.produce(samples);
        self.inner.buffered.store(buffer.size(), Ordering::Release);
        self.inner.drained.store(false, Ordering::Release);
    }

    /// Moves up to `out.len()` samples into `out` and zero-fills the rest.
    ///
    /// Returns the number of real samples written.
    pub fn fill(&self, out: &mut [f32]) -> usize {
        let taken = {
            let mut buffer = self.inner.buffer.lock();
            let taken = out.len().min(buffer.size());
            buffer.consume(&mut out[..taken]);
            self.inner.buffered.store(buffer.size(), Ordering::Release);
            taken
        };
        out[taken..].fill(0.0);

        if taken < out.len() && !self.inner.drained.swap(true, Ordering::AcqRel) {
            let count = self.inner.underflows.fetch_add(1, Ordering::Relaxed) + 1;
            tracing::warn!(
                requested = out.len(),
                available = taken,
                underflows = count,
                "output queue underflow"
            );
            if let Some(callback) = self.inner.on_underflow.lock().as_mut() {
                callback();
            }
        }
        taken
    }

    /// Returns the number of samples waiting to be played.
    pub fn samples_buffered(&self) -> usize {
        self.inner.buffered.load(Ordering::Acquire)
    }

    /// Returns true if the last pull came up short (or nothing was ever pushed).
    pub fn is_drained(&self) -> bool {
        self.inner.drained.load(Ordering::Acquire)
    }

    /// Returns how many times the queue has entered the drained state.
    pub fn underflow_count(&self) -> u64 {
        self.inner.underflows.load(Ordering::Relaxed)
    }

    /// Discards every buffered sample and returns to the drained state.
    ///
    /// Like a fresh queue, the next short read does not count an underflow.
    pub fn clear(&self) {
        let mut buffer = self.inner.buffer.lock();
        buffer.clear();
        self.inner.buffered.store(0, Ordering::Release);
        self.inner.drained.store(true, Ordering::Release);
    }

    /// Installs the callback fired on each new underflow, replacing any previous one.
    pub fn set_underflow_callback<F>(&self, callback: F)
    where
        F: FnMut() + Send + 'static,
    {
        *self.inner.on_underflow.lock() = Some(Box::new(callback));
    }
}

impl Default for OutputQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for OutputQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutputQueue")
            .field("buffered", &self.samples_buffered())
            .field("drained", &self.is_drained())
            .field("underflows", &self.underflow_count())
            .finish()
    }
}
