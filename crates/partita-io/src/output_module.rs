//! Graph sink that hands rendered blocks to an [`OutputQueue`].

use partita_core::{Module, ModuleInputs};

use crate::queue::OutputQueue;

/// Pushes input slot 0 into an [`OutputQueue`] every block.
///
/// The input is also copied to the module's own output, so the same signal can
/// feed a meter or recorder downstream.
#[derive(Debug, Clone)]
pub struct OutputModule {
    queue: OutputQueue,
}

impl OutputModule {
    /// Creates a sink writing into `queue`.
    pub fn new(queue: OutputQueue) -> Self {
        Self { queue }
    }

    /// Returns the queue this sink writes into.
    pub fn queue(&self) -> &OutputQueue {
        &self.queue
    }
}

impl Module for OutputModule {
    fn commit(&mut self) {}

    fn sample(&mut self, inputs: &ModuleInputs<'_>, output: &mut [f32]) {
        self.queue.push(inputs[0]);
        output.copy_from_slice(inputs[0]);
    }
}
