//! Per-module registration records and the per-block sampling task.

use std::sync::Arc;

use parking_lot::{Mutex, RwLock, RwLockReadGuard};

use crate::module::{MAX_MODULE_INPUTS, Module, ModuleInputs};

use super::handle::ModuleHandle;

pub(crate) type SharedModule = Arc<Mutex<Box<dyn Module>>>;
pub(crate) type SharedBuffer = Arc<RwLock<Vec<f32>>>;

/// Binds a module to its input wiring and output buffer.
///
/// The harness's position in the processor's harness list is its work item id
/// for the block.
pub(crate) struct Harness {
    pub(crate) handle: ModuleHandle,
    pub(crate) module: SharedModule,
    /// `None` reads silence.
    pub(crate) inputs: [Option<ModuleHandle>; MAX_MODULE_INPUTS],
    /// Grown to the block length, never shrunk.
    pub(crate) output: SharedBuffer,
}

impl Harness {
    pub(crate) fn new(handle: ModuleHandle, module: Box<dyn Module>, block_length: usize) -> Self {
        Self {
            handle,
            module: Arc::new(Mutex::new(module)),
            inputs: [None; MAX_MODULE_INPUTS],
            output: Arc::new(RwLock::new(vec![0.0; block_length])),
        }
    }

    /// Replaces every input slot reading from `removed` with silence.
    pub(crate) fn scrub(&mut self, removed: ModuleHandle) -> usize {
        let mut scrubbed = 0;
        for input in &mut self.inputs {
            if *input == Some(removed) {
                *input = None;
                scrubbed += 1;
            }
        }
        scrubbed
    }
}

/// Resolves `handle` to its harness index, rejecting stale handles.
pub(crate) fn harness_index(
    harnesses: &[Harness],
    slot_index: &[Option<usize>],
    handle: ModuleHandle,
) -> Option<usize> {
    slot_index
        .get(handle.slot() as usize)
        .copied()
        .flatten()
        .filter(|&index| harnesses[index].handle == handle)
}

/// Everything one module needs to render one block on a worker thread.
///
/// Upstream buffers are only read here. The scheduler guarantees their
/// writers have finished before this task starts.
pub(crate) struct SampleTask {
    pub(crate) module: SharedModule,
    pub(crate) inputs: [Option<SharedBuffer>; MAX_MODULE_INPUTS],
    pub(crate) silence: Arc<[f32]>,
    pub(crate) output: SharedBuffer,
    pub(crate) len: usize,
}

impl SampleTask {
    pub(crate) fn run(self) {
        let len = self.len;
        let guards: [Option<RwLockReadGuard<'_, Vec<f32>>>; MAX_MODULE_INPUTS] =
            std::array::from_fn(|slot| self.inputs[slot].as_ref().map(|b| b.read_recursive()));
        let inputs: ModuleInputs<'_> = std::array::from_fn(|slot| match &guards[slot] {
            Some(buffer) => &buffer[..len],
            None => &self.silence[..len],
        });

        let mut output = self.output.write();
        self.module.lock().sample(&inputs, &mut output[..len]);
    }
}
