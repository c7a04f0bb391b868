//! cpal-based output backend.
//!
//! [`CpalBackend`] wraps [cpal](https://crates.io/crates/cpal) for cross-platform
//! output: ALSA on Linux, CoreAudio on macOS, WASAPI on Windows.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use partita_io::{AudioBackend, BackendStreamConfig, CpalBackend};
//!
//! let backend = CpalBackend::new();
//! let stream = backend.build_output_stream(
//!     &BackendStreamConfig::default(),
//!     Box::new(|buffer: &mut [f32]| buffer.fill(0.0)),
//!     Box::new(|err| eprintln!("audio error: {err}")),
//! )?;
//! // Plays silence until `stream` is dropped.
//! ```

use cpal::Host;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

use crate::backend::{AudioBackend, BackendStreamConfig, ErrorCallback, OutputCallback, StreamHandle};
use crate::device::{self, device_name};
use crate::{AudioDevice, Error, Result};

/// cpal output backend bound to the platform's default host.
pub struct CpalBackend {
    host: Host,
}

impl CpalBackend {
    /// Creates a backend on the platform's default audio host.
    pub fn new() -> Self {
        let host = cpal::default_host();
        tracing::info!(host = host.id().name(), "cpal backend initialized");
        Self { host }
    }

    /// Resolves a device query (index or name) to a cpal device, or the default.
    fn find_output_device(&self, query: Option<&str>) -> Result<cpal::Device> {
        let Some(query) = query else {
            return self.host.default_output_device().ok_or(Error::NoDevice);
        };

        let wanted = device::find_output_device(&self.list_devices()?, query)?;
        let devices = self
            .host
            .output_devices()
            .map_err(|e| Error::Stream(e.to_string()))?;
        for device in devices {
            if let Ok(name) = device_name(&device)
                && name == wanted.name
            {
                return Ok(device);
            }
        }
        Err(Error::DeviceNotFound(wanted.name))
    }
}

impl Default for CpalBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioBackend for CpalBackend {
    fn name(&self) -> &'static str {
        "cpal"
    }

    fn list_devices(&self) -> Result<Vec<AudioDevice>> {
        // Same host as `self.host`: both come from cpal::default_host().
        device::list_devices()
    }

    fn default_output_device(&self) -> Result<Option<AudioDevice>> {
        device::default_output_device()
    }

    fn build_output_stream(
        &self,
        config: &BackendStreamConfig,
        mut callback: OutputCallback,
        mut error_callback: ErrorCallback,
    ) -> Result<StreamHandle> {
        let device = self.find_output_device(config.device_name.as_deref())?;

        let stream_config = cpal::StreamConfig {
            channels: config.channels,
            sample_rate: config.sample_rate,
            buffer_size: cpal::BufferSize::Fixed(config.buffer_size),
        };

        let stream = device
            .build_output_stream(
                &stream_config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    callback(data);
                },
                move |err| {
                    error_callback(&err.to_string());
                },
                None,
            )
            .map_err(|e| Error::Stream(e.to_string()))?;

        stream.play().map_err(|e| Error::Stream(e.to_string()))?;
        tracing::info!(
            device = %device_name(&device).unwrap_or_default(),
            channels = config.channels,
            sample_rate = config.sample_rate,
            buffer_size = config.buffer_size,
            "output stream started"
        );

        Ok(StreamHandle::new(stream))
    }
}
