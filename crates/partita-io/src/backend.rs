//! Pluggable output backend abstraction.
//!
//! [`AudioBackend`] decouples [`DeviceOutput`](crate::DeviceOutput) from any
//! particular platform audio API. [`CpalBackend`](crate::CpalBackend) is the
//! default implementation. Tests plug in a deterministic backend that calls the
//! output callback by hand.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────┐
//! │   DeviceOutput / partita CLI     │
//! └──────────────┬───────────────────┘
//!                │ uses AudioBackend trait
//!                ▼
//! ┌──────────────────────────────────┐
//! │        AudioBackend trait        │
//! │ list_devices / build_output_...  │
//! └──────────────┬───────────────────┘
//!        ┌───────┴────────┐
//!        ▼                ▼
//! ┌─────────────┐  ┌─────────────┐
//! │ CpalBackend │  │  test/mock  │
//! └─────────────┘  └─────────────┘
//! ```
//!
//! Callbacks are boxed closures so the trait stays object-safe, and streams come
//! back as a type-erased [`StreamHandle`] that stops playback on drop.

use crate::{AudioDevice, Result};

/// Configuration for building an output stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendStreamConfig {
    /// Requested sample rate in Hz.
    pub sample_rate: u32,
    /// Device buffer size in frames.
    pub buffer_size: u32,
    /// Number of interleaved device channels.
    pub channels: u16,
    /// Device index or name query. `None` selects the system default.
    pub device_name: Option<String>,
}

impl Default for BackendStreamConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48000,
            buffer_size: 512,
            channels: 2,
            device_name: None,
        }
    }
}

/// Type-erased output stream handle.
///
/// The stream plays while the handle exists; dropping it stops playback.
pub struct StreamHandle {
    _inner: Box<dyn Send>,
}

impl StreamHandle {
    /// Wraps a backend-specific stream object, keeping it alive until drop.
    pub fn new<T: Send + 'static>(stream: T) -> Self {
        Self {
            _inner: Box::new(stream),
        }
    }
}

impl std::fmt::Debug for StreamHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamHandle").finish_non_exhaustive()
    }
}

/// Output callback, run on the device thread.
///
/// Receives interleaved f32 samples (`frames * channels`) to fill.
pub type OutputCallback = Box<dyn FnMut(&mut [f32]) + Send>;

/// Error callback, run when the backend reports a streaming error.
pub type ErrorCallback = Box<dyn FnMut(&str) + Send>;

/// Platform output API.
pub trait AudioBackend: Send {
    /// Human-readable backend name (e.g. "cpal").
    fn name(&self) -> &str;

    /// Lists output devices in a stable order. Indices match [`AudioDevice::index`].
    fn list_devices(&self) -> Result<Vec<AudioDevice>>;

    /// Returns the system default output device, if any.
    fn default_output_device(&self) -> Result<Option<AudioDevice>>;

    /// Builds and starts an output stream.
    ///
    /// `callback` is invoked on the device thread for every device buffer.
    /// The stream runs until the returned [`StreamHandle`] is dropped.
    fn build_output_stream(
        &self,
        config: &BackendStreamConfig,
        callback: OutputCallback,
        error_callback: ErrorCallback,
    ) -> Result<StreamHandle>;

    /// Returns the sample rate the backend will actually run `config` at.
    fn actual_sample_rate(&self, config: &BackendStreamConfig) -> u32 {
        config.sample_rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = BackendStreamConfig::default();
        assert_eq!(config.sample_rate, 48000);
        assert_eq!(config.buffer_size, 512);
        assert_eq!(config.channels, 2);
        assert!(config.device_name.is_none());
    }

    #[test]
    fn test_stream_handle_debug() {
        let handle = StreamHandle::new(7u8);
        assert!(format!("{handle:?}").contains("StreamHandle"));
    }
}
