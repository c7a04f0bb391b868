//! Demo leaf modules: oscillators and a mixer.
//!
//! Each module owns an [`AmplitudeControl`] that any thread may set. The value
//! is snapshotted in [`Module::commit`], so a whole block renders at one gain.

use partita_core::{Module, ModuleInputs};
use std::f32::consts::TAU;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

/// Shared, lock-free gain value (stored as `f32` bits).
#[derive(Debug, Clone)]
pub struct AmplitudeControl(Arc<AtomicU32>);

impl AmplitudeControl {
    /// Creates a control holding `amplitude`.
    pub fn new(amplitude: f32) -> Self {
        Self(Arc::new(AtomicU32::new(amplitude.to_bits())))
    }

    /// Sets the gain picked up at the next block boundary.
    pub fn set(&self, amplitude: f32) {
        self.0.store(amplitude.to_bits(), Ordering::Relaxed);
    }

    /// Returns the current gain.
    pub fn get(&self) -> f32 {
        f32::from_bits(self.0.load(Ordering::Relaxed))
    }
}

fn samples_per_cycle(frequency: f32, sample_rate: u32) -> usize {
    assert!(
        frequency.is_finite() && frequency > 0.0,
        "oscillator frequency must be positive, got {frequency}"
    );
    (sample_rate as f32 / frequency).round().max(1.0) as usize
}

/// Sine oscillator playing back a one-cycle wavetable.
///
/// The table holds `round(sample_rate / frequency)` samples, so the pitch is
/// quantised to whole-sample periods.
#[derive(Debug)]
pub struct SineGenerator {
    table: Vec<f32>,
    position: usize,
    control: AmplitudeControl,
    amplitude: f32,
}

impl SineGenerator {
    /// Default gain.
    pub const DEFAULT_AMPLITUDE: f32 = 0.6;

    /// Creates a sine at `frequency` Hz for a stream at `sample_rate`.
    pub fn new(frequency: f32, sample_rate: u32) -> Self {
        let len = samples_per_cycle(frequency, sample_rate);
        let table = (0..len)
            .map(|i| (i as f32 / len as f32 * TAU).sin())
            .collect();
        Self {
            table,
            position: 0,
            control: AmplitudeControl::new(Self::DEFAULT_AMPLITUDE),
            amplitude: Self::DEFAULT_AMPLITUDE,
        }
    }

    /// Returns a handle to this oscillator's gain.
    pub fn amplitude(&self) -> AmplitudeControl {
        self.control.clone()
    }
}

impl Module for SineGenerator {
    fn commit(&mut self) {
        self.amplitude = self.control.get();
    }

    fn sample(&mut self, _inputs: &ModuleInputs<'_>, output: &mut [f32]) {
        for out in output.iter_mut() {
            *out = self.table[self.position] * self.amplitude;
            self.position = (self.position + 1) % self.table.len();
        }
    }
}

/// Square oscillator: low for the first half of each period, high for the second.
#[derive(Debug)]
pub struct SquareGenerator {
    period: usize,
    position: usize,
    control: AmplitudeControl,
    amplitude: f32,
}

impl SquareGenerator {
    /// Default gain.
    pub const DEFAULT_AMPLITUDE: f32 = 0.6;

    /// Creates a square wave at `frequency` Hz for a stream at `sample_rate`.
    pub fn new(frequency: f32, sample_rate: u32) -> Self {
        Self {
            period: samples_per_cycle(frequency, sample_rate).max(2),
            position: 0,
            control: AmplitudeControl::new(Self::DEFAULT_AMPLITUDE),
            amplitude: Self::DEFAULT_AMPLITUDE,
        }
    }

    /// Returns a handle to this oscillator's gain.
    pub fn amplitude(&self) -> AmplitudeControl {
        self.control.clone()
    }
}

impl Module for SquareGenerator {
    fn commit(&mut self) {
        self.amplitude = self.control.get();
    }

    fn sample(&mut self, _inputs: &ModuleInputs<'_>, output: &mut [f32]) {
        let half = self.period / 2;
        for out in output.iter_mut() {
            let level = if (self.position / half) % 2 == 1 { 1.0 } else { -1.0 };
            *out = level * self.amplitude;
            self.position = (self.position + 1) % self.period;
        }
    }
}

/// Sums every input slot and applies a master gain.
///
/// Unrouted slots read as silence, so they add nothing.
#[derive(Debug)]
pub struct Mixer {
    control: AmplitudeControl,
    amplitude: f32,
}

impl Mixer {
    /// Creates a mixer at unity gain.
    pub fn new() -> Self {
        Self {
            control: AmplitudeControl::new(1.0),
            amplitude: 1.0,
        }
    }

    /// Returns a handle to the master gain.
    pub fn amplitude(&self) -> AmplitudeControl {
        self.control.clone()
    }
}

impl Default for Mixer {
    fn default() -> Self {
        Self::new()
    }
}

impl Module for Mixer {
    fn commit(&mut self) {
        self.amplitude = self.control.get();
    }

    fn sample(&mut self, inputs: &ModuleInputs<'_>, output: &mut [f32]) {
        output.fill(0.0);
        for input in inputs {
            for (out, &x) in output.iter_mut().zip(input.iter()) {
                *out += x;
            }
        }
        if self.amplitude != 1.0 {
            for out in output.iter_mut() {
                *out *= self.amplitude;
            }
        }
    }
}
