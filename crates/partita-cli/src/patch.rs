//! The demo patch: sine and square into a mixer, mixer into the output queue.

use partita_core::{GraphEditor, ModuleHandle};
use partita_io::{OutputModule, OutputQueue};

use crate::modules::{AmplitudeControl, Mixer, SineGenerator, SquareGenerator};

/// Square gain in the demo patch.
pub const SQUARE_AMPLITUDE: f32 = 0.25;

/// Handles and gain controls of a built demo patch.
#[derive(Debug)]
pub struct DemoPatch {
    pub sine: ModuleHandle,
    pub square: ModuleHandle,
    pub mixer: ModuleHandle,
    pub output: ModuleHandle,
    pub master: AmplitudeControl,
}

impl DemoPatch {
    /// Queues the patch on `editor`; it goes live at the next block.
    pub fn build(
        editor: &GraphEditor,
        frequency: f32,
        sample_rate: u32,
        queue: OutputQueue,
    ) -> Self {
        let sine_module = SineGenerator::new(frequency, sample_rate);
        let square_module = SquareGenerator::new(frequency, sample_rate);
        square_module.amplitude().set(SQUARE_AMPLITUDE);
        let mixer_module = Mixer::new();
        let master = mixer_module.amplitude();

        let output = editor.add_module(Box::new(OutputModule::new(queue)));
        let sine = editor.add_module(Box::new(sine_module));
        let square = editor.add_module(Box::new(square_module));
        let mixer = editor.add_module(Box::new(mixer_module));

        editor.route(sine).to_slot(mixer, 0);
        editor.route(square).to_slot(mixer, 1);
        editor.route(mixer).to(output);

        tracing::debug!(frequency, sample_rate, "demo patch queued");

        Self {
            sine,
            square,
            mixer,
            output,
            master,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use partita_core::AudioProcessor;

    #[test]
    fn test_patch_renders_into_queue() {
        let mut processor = AudioProcessor::new();
        let queue = OutputQueue::new();
        let patch = DemoPatch::build(&processor.editor(), 480.0, 48000, queue.clone());

        processor.update(100);
        assert_eq!(processor.module_count(), 4);
        assert_eq!(processor.input(patch.mixer, 0), Some(patch.sine));
        assert_eq!(processor.input(patch.mixer, 1), Some(patch.square));
        assert_eq!(processor.input(patch.output, 0), Some(patch.mixer));

        let mut out = vec![0.0; 100];
        assert_eq!(queue.fill(&mut out), 100);
        // Sample 0: sine is 0, square is low.
        assert!((out[0] + SQUARE_AMPLITUDE).abs() < 1e-6);
        // Sample 75: sine trough, square high.
        let expected = -SineGenerator::DEFAULT_AMPLITUDE + SQUARE_AMPLITUDE;
        assert!((out[75] - expected).abs() < 1e-5);
    }

    #[test]
    fn test_master_gain_applies_next_block() {
        let mut processor = AudioProcessor::new();
        let queue = OutputQueue::new();
        let patch = DemoPatch::build(&processor.editor(), 480.0, 48000, queue.clone());

        patch.master.set(0.0);
        processor.update(64);
        let mut out = vec![1.0; 64];
        queue.fill(&mut out);
        assert!(out.iter().all(|&x| x == 0.0));
    }
}
