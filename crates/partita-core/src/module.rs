//! The capability contract every graph node implements.
//!
//! A [`Module`] is driven in two phases per block:
//!
//! 1. [`commit()`](Module::commit) runs on the coordinating thread before any
//!    sampling starts. Modules whose parameters are changed from other threads
//!    (usually through atomics) copy them into private fields here, so the whole
//!    block observes one consistent value.
//! 2. [`sample()`](Module::sample) runs on a worker thread once every upstream
//!    module has finished writing its output for the block.
//!
//! ## Design Decisions
//!
//! - **Mono blocks**: every input and output is a single `f32` channel. Channel
//!   duplication happens at the device edge.
//!
//! - **Fixed fan-in**: a module sees exactly [`MAX_MODULE_INPUTS`] input slices.
//!   Unconnected slots are the shared silence slice, never absent, so modules
//!   do not need to special-case missing inputs.
//!
//! - **No identity inspection**: the executor never downcasts or compares
//!   modules. Identity lives in the handle the processor hands out.

/// Maximum number of input slots per module.
pub const MAX_MODULE_INPUTS: usize = 16;

/// Input slices handed to [`Module::sample`], one per slot.
///
/// All slices have the same length as the output buffer.
pub type ModuleInputs<'a> = [&'a [f32]; MAX_MODULE_INPUTS];

/// A unit of audio computation in the processing graph.
///
/// # Example
///
/// ```rust
/// use partita_core::{Module, ModuleInputs};
///
/// struct Gain {
///     gain: f32,
/// }
///
/// impl Module for Gain {
///     fn commit(&mut self) {}
///
///     fn sample(&mut self, inputs: &ModuleInputs<'_>, output: &mut [f32]) {
///         for (out, &x) in output.iter_mut().zip(inputs[0]) {
///             *out = x * self.gain;
///         }
///     }
/// }
/// ```
pub trait Module: Send {
    /// Snapshots externally-mutable parameters for the coming block.
    fn commit(&mut self);

    /// Fills `output` from `inputs`. The block length is `output.len()`.
    fn sample(&mut self, inputs: &ModuleInputs<'_>, output: &mut [f32]);
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Offset {
        pending: f32,
        active: f32,
    }

    impl Module for Offset {
        fn commit(&mut self) {
            self.active = self.pending;
        }

        fn sample(&mut self, inputs: &ModuleInputs<'_>, output: &mut [f32]) {
            for (out, &x) in output.iter_mut().zip(inputs[0]) {
                *out = x + self.active;
            }
        }
    }

    #[test]
    fn test_module_is_object_safe() {
        let mut module: Box<dyn Module> = Box::new(Offset {
            pending: 1.0,
            active: 0.0,
        });
        let input = [0.5_f32; 4];
        let silence = [0.0_f32; 4];
        let mut inputs: ModuleInputs<'_> = [&silence[..]; MAX_MODULE_INPUTS];
        inputs[0] = &input;

        let mut output = [0.0_f32; 4];
        module.sample(&inputs, &mut output);
        assert_eq!(output, [0.5; 4]);

        module.commit();
        module.sample(&inputs, &mut output);
        assert_eq!(output, [1.5; 4]);
    }
}
