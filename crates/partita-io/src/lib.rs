//! Audio output layer for the Partita graph executor.
//!
//! This crate connects an [`AudioProcessor`](partita_core::AudioProcessor) to the
//! outside world:
//!
//! - **Device output**: [`DeviceOutput`] opens a stream through an [`AudioBackend`]
//!   (cpal by default) and feeds it from an [`OutputQueue`]
//! - **Graph sink**: [`OutputModule`] is the module that pushes rendered blocks
//!   into the queue
//! - **Driving**: [`ThreadedDriver`] renders blocks on its own thread, keeping the
//!   queue topped up to a latency target
//! - **WAV export**: [`write_wav`] and [`read_wav`] for offline rendering
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use partita_core::AudioProcessor;
//! use partita_io::{BackendStreamConfig, CpalBackend, DeviceOutput, DriverConfig, OutputModule, ThreadedDriver};
//!
//! let output = DeviceOutput::open(&CpalBackend::new(), &BackendStreamConfig::default())?;
//! let mut processor = AudioProcessor::with_threads(2)?;
//! let osc = processor.add_module(Box::new(my_oscillator));
//! let sink = processor.add_module(Box::new(OutputModule::new(output.queue())));
//! processor.route(osc).to(sink);
//!
//! let driver = ThreadedDriver::start(processor, output.queue(), output.sample_rate(), DriverConfig::default())?;
//! // ... later
//! let processor = driver.finish();
//! ```

pub mod backend;
pub mod cpal_backend;
mod device;
mod driver;
mod output;
mod output_module;
mod queue;
mod wav;

pub use backend::{AudioBackend, BackendStreamConfig, ErrorCallback, OutputCallback, StreamHandle};
pub use cpal_backend::CpalBackend;
pub use device::{AudioDevice, default_output_device, find_output_device, list_devices};
pub use driver::{DriverConfig, ThreadedDriver};
pub use output::DeviceOutput;
pub use output_module::OutputModule;
pub use queue::{OutputQueue, UnderflowCallback};
pub use wav::{WavSpec, read_wav, write_wav};

/// Error types for audio output operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// WAV file read/write error.
    #[error("WAV file error: {0}")]
    Wav(#[from] hound::Error),

    /// The requested WAV encoding is not supported.
    #[error("Unsupported sample format: {0}")]
    UnsupportedFormat(String),

    /// Audio stream setup or runtime error.
    #[error("Audio stream error: {0}")]
    Stream(String),

    /// No output device available on the system.
    #[error("No audio output device available")]
    NoDevice,

    /// The requested output device was not found.
    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    /// The OS refused to start the driver thread.
    #[error("Failed to spawn driver thread: {0}")]
    SpawnDriver(#[source] std::io::Error),

    /// Graph executor error (worker pool setup).
    #[error(transparent)]
    Core(#[from] partita_core::Error),

    /// Standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type for audio output operations.
pub type Result<T> = std::result::Result<T, Error>;
