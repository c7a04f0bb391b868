//! Output device enumeration and lookup.

use cpal::Device;
use cpal::traits::{DeviceTrait, HostTrait};

use crate::{Error, Result};

const FALLBACK_SAMPLE_RATE: u32 = 48000;

/// Extract a device's display name (cpal 0.17+).
pub(crate) fn device_name(device: &Device) -> std::result::Result<String, cpal::DeviceNameError> {
    device.description().map(|d| d.name().to_string())
}

/// Output device information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioDevice {
    /// Position in the enumeration order, usable as a lookup query.
    pub index: usize,
    /// Human-readable device name.
    pub name: String,
    /// Default sample rate in Hz.
    pub default_sample_rate: u32,
    /// Channel count of the default output configuration.
    pub channels: u16,
}

fn describe(index: usize, device: &Device) -> Option<AudioDevice> {
    let name = device_name(device).ok()?;
    let (default_sample_rate, channels) = device
        .default_output_config()
        .map(|c| (c.sample_rate(), c.channels()))
        .unwrap_or((FALLBACK_SAMPLE_RATE, 2));
    Some(AudioDevice {
        index,
        name,
        default_sample_rate,
        channels,
    })
}

/// List output devices of the default host.
///
/// Devices whose name cannot be read are skipped; indices stay dense.
pub fn list_devices() -> Result<Vec<AudioDevice>> {
    let host = cpal::default_host();
    let outputs = host
        .output_devices()
        .map_err(|e| Error::Stream(e.to_string()))?;

    let mut devices = Vec::new();
    for device in outputs {
        if let Some(info) = describe(devices.len(), &device) {
            devices.push(info);
        }
    }
    Ok(devices)
}

/// Returns the default output device of the default host, if any.
///
/// The reported index is the device's position in [`list_devices`], or 0 when
/// it cannot be located there.
pub fn default_output_device() -> Result<Option<AudioDevice>> {
    let host = cpal::default_host();
    let Some(device) = host.default_output_device() else {
        return Ok(None);
    };
    let Some(mut info) = describe(0, &device) else {
        return Ok(None);
    };
    if let Some(listed) = list_devices()?.into_iter().find(|d| d.name == info.name) {
        info.index = listed.index;
    }
    Ok(Some(info))
}

/// Resolves `query` against `devices`.
///
/// Tried in order: a numeric index, an exact name, then a case-insensitive
/// substring of the name (first match wins).
pub fn find_output_device(devices: &[AudioDevice], query: &str) -> Result<AudioDevice> {
    let query = query.trim();

    if let Ok(index) = query.parse::<usize>() {
        return devices
            .iter()
            .find(|d| d.index == index)
            .cloned()
            .ok_or_else(|| {
                Error::DeviceNotFound(format!(
                    "output device index {index} (only {} devices available)",
                    devices.len()
                ))
            });
    }

    if let Some(device) = devices.iter().find(|d| d.name == query) {
        return Ok(device.clone());
    }

    let needle = query.to_lowercase();
    devices
        .iter()
        .find(|d| d.name.to_lowercase().contains(&needle))
        .cloned()
        .ok_or_else(|| Error::DeviceNotFound(format!("no output device matching '{query}'")))
}
