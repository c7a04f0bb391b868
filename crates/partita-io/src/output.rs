//! Device output fed from an [`OutputQueue`].

use crate::backend::{AudioBackend, BackendStreamConfig, ErrorCallback, OutputCallback, StreamHandle};
use crate::queue::OutputQueue;
use crate::Result;

/// Device buffers the callback can take without allocating, as a multiple of
/// the configured buffer size.
const SCRATCH_HEADROOM: usize = 4;

/// An open output stream that plays whatever is pushed into its queue.
///
/// The graph renders mono blocks; the device callback duplicates each mono
/// frame to every device channel. Dropping the `DeviceOutput` stops the stream.
#[derive(Debug)]
pub struct DeviceOutput {
    queue: OutputQueue,
    sample_rate: u32,
    channels: u16,
    latency_samples: usize,
    _stream: StreamHandle,
}

impl DeviceOutput {
    /// Opens an output stream on `backend` and starts playing.
    pub fn open(backend: &dyn AudioBackend, config: &BackendStreamConfig) -> Result<Self> {
        let queue = OutputQueue::with_capacity(config.buffer_size as usize * 4);
        let channels = usize::from(config.channels.max(1));

        let source = queue.clone();
        let mut mono = vec![0.0; config.buffer_size as usize * SCRATCH_HEADROOM];
        let callback: OutputCallback = Box::new(move |data: &mut [f32]| {
            let mono = mono_scratch(&mut mono, data.len() / channels);
            source.fill(mono);
            duplicate_to_channels(mono, data, channels);
        });
        let error_callback: ErrorCallback = Box::new(|message: &str| {
            tracing::warn!(error = message, "output stream error");
        });

        let stream = backend.build_output_stream(config, callback, error_callback)?;
        let sample_rate = backend.actual_sample_rate(config);

        Ok(Self {
            queue,
            sample_rate,
            channels: config.channels.max(1),
            latency_samples: config.buffer_size as usize,
            _stream: stream,
        })
    }

    /// Returns a handle to the queue the device pulls from.
    pub fn queue(&self) -> OutputQueue {
        self.queue.clone()
    }

    /// Returns the stream's sample rate in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Returns the number of device channels.
    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Returns the configured device buffer size in frames.
    pub fn latency_samples(&self) -> usize {
        self.latency_samples
    }

    /// Returns the number of rendered samples not yet played.
    pub fn samples_buffered(&self) -> usize {
        self.queue.samples_buffered()
    }

    /// Returns how many times playback ran out of rendered samples.
    pub fn underflow_count(&self) -> u64 {
        self.queue.underflow_count()
    }
}

/// Returns the first `frames` samples of `scratch`.
///
/// Grows `scratch` only when the device asks for more than it holds, which
/// allocates on the device thread and is logged.
fn mono_scratch(scratch: &mut Vec<f32>, frames: usize) -> &mut [f32] {
    if frames > scratch.len() {
        tracing::warn!(
            frames,
            capacity = scratch.len(),
            "device buffer exceeds scratch, growing on the audio thread"
        );
        scratch.resize(frames, 0.0);
    }
    &mut scratch[..frames]
}

/// Writes each mono frame to every channel of the interleaved `out`.
///
/// Trailing samples of `out` that do not form a whole frame are zeroed.
fn duplicate_to_channels(mono: &[f32], out: &mut [f32], channels: usize) {
    let mut frames = out.chunks_exact_mut(channels);
    for (frame, &sample) in frames.by_ref().zip(mono) {
        frame.fill(sample);
    }
    frames.into_remainder().fill(0.0);
}
