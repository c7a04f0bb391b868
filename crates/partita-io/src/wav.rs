//! WAV export for offline rendering.

use std::path::Path;

use hound::{SampleFormat, WavReader, WavWriter};

use crate::{Error, Result};

/// WAV file layout. Samples passed to [`write_wav`] are interleaved by `channels`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavSpec {
    /// Number of interleaved channels.
    pub channels: u16,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// 32 writes IEEE float; 8, 16 and 24 write integer PCM.
    pub bits_per_sample: u16,
}

impl Default for WavSpec {
    fn default() -> Self {
        Self {
            channels: 1,
            sample_rate: 48000,
            bits_per_sample: 32,
        }
    }
}

impl WavSpec {
    /// Returns an error if the sample depth cannot be written.
    pub fn validate(self) -> Result<()> {
        self.to_hound().map(|_| ())
    }

    fn to_hound(self) -> Result<hound::WavSpec> {
        let sample_format = match self.bits_per_sample {
            32 => SampleFormat::Float,
            8 | 16 | 24 => SampleFormat::Int,
            other => {
                return Err(Error::UnsupportedFormat(format!(
                    "{other}-bit samples (expected 8, 16, 24 or 32)"
                )));
            }
        };
        Ok(hound::WavSpec {
            channels: self.channels,
            sample_rate: self.sample_rate,
            bits_per_sample: self.bits_per_sample,
            sample_format,
        })
    }
}

/// Largest positive integer sample for `bits`, as f32.
fn int_scale(bits: u16) -> f32 {
    (1i32 << (bits - 1)) as f32
}

/// Write interleaved samples to a WAV file.
///
/// Integer formats clamp to the representable range.
pub fn write_wav<P: AsRef<Path>>(path: P, samples: &[f32], spec: WavSpec) -> Result<()> {
    let mut writer = WavWriter::create(path, spec.to_hound()?)?;

    if spec.bits_per_sample == 32 {
        for &sample in samples {
            writer.write_sample(sample)?;
        }
    } else {
        let scale = int_scale(spec.bits_per_sample);
        for &sample in samples {
            writer.write_sample((sample * scale).clamp(-scale, scale - 1.0) as i32)?;
        }
    }

    writer.finalize()?;
    Ok(())
}

/// Read a WAV file as interleaved f32 samples in `[-1, 1)` plus its spec.
pub fn read_wav<P: AsRef<Path>>(path: P) -> Result<(Vec<f32>, WavSpec)> {
    let reader = WavReader::open(path)?;
    let raw = reader.spec();
    let spec = WavSpec {
        channels: raw.channels,
        sample_rate: raw.sample_rate,
        bits_per_sample: raw.bits_per_sample,
    };

    let samples = match raw.sample_format {
        SampleFormat::Float => reader
            .into_samples::<f32>()
            .collect::<std::result::Result<Vec<_>, _>>()?,
        SampleFormat::Int => {
            let scale = int_scale(raw.bits_per_sample);
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<std::result::Result<Vec<_>, _>>()?
        }
    };

    Ok((samples, spec))
}
