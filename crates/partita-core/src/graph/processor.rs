//! Block-based graph processor.
//!
//! [`AudioProcessor`] owns the registered modules, their wiring and output
//! buffers, and renders one block per [`update()`](AudioProcessor::update) call
//! by submitting one dependency-tagged work item per module to a [`PoolParty`].
//!
//! Topology is mutated through a [`GraphEditor`], which only appends to a
//! locked action queue. The queue is drained at the start of `update`, so a
//! mutation affects either a whole block or none of it.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::Result;
use crate::module::{MAX_MODULE_INPUTS, Module};
use crate::pool::PoolParty;

use super::action::{Action, Pending};
use super::handle::ModuleHandle;
use super::harness::{Harness, SampleTask, SharedBuffer, harness_index};

/// Cloneable, thread-safe handle for mutating a processor's topology.
///
/// Every method only enqueues an action and returns. Nothing changes until the
/// processor's next [`update()`](AudioProcessor::update).
#[derive(Clone)]
pub struct GraphEditor {
    pending: Arc<Mutex<Pending>>,
}

impl GraphEditor {
    /// Queues `module` for registration and returns its handle.
    ///
    /// The handle is valid immediately and may be routed before the module is
    /// actually registered.
    pub fn add_module(&self, module: Box<dyn Module>) -> ModuleHandle {
        let mut pending = self.pending.lock();
        let handle = pending.slots.allocate();
        pending.actions.push_back(Action::Add { handle, module });
        handle
    }

    /// Queues removal of `handle`. Unknown or already-removed handles are
    /// ignored when the action is applied.
    pub fn remove_module(&self, handle: ModuleHandle) {
        self.pending.lock().actions.push_back(Action::Remove(handle));
    }

    /// Queues routing `source`'s output into `dest`'s input `slot`.
    ///
    /// # Panics
    ///
    /// Panics if `slot >= MAX_MODULE_INPUTS`.
    pub fn set_input(&self, dest: ModuleHandle, slot: usize, source: ModuleHandle) {
        self.push_route(dest, slot, Some(source));
    }

    /// Queues disconnecting `dest`'s input `slot`, which then reads silence.
    ///
    /// # Panics
    ///
    /// Panics if `slot >= MAX_MODULE_INPUTS`.
    pub fn clear_input(&self, dest: ModuleHandle, slot: usize) {
        self.push_route(dest, slot, None);
    }

    /// Starts a fluent route from `source`: `editor.route(osc).to(mixer)`.
    pub fn route(&self, source: ModuleHandle) -> Route<'_> {
        Route {
            editor: self,
            source,
        }
    }

    /// Returns the number of actions waiting for the next block.
    pub fn pending_actions(&self) -> usize {
        self.pending.lock().actions.len()
    }

    fn push_route(&self, dest: ModuleHandle, slot: usize, source: Option<ModuleHandle>) {
        assert!(
            slot < MAX_MODULE_INPUTS,
            "input slot {slot} out of range (max {MAX_MODULE_INPUTS})"
        );
        self.pending
            .lock()
            .actions
            .push_back(Action::Route { dest, slot, source });
    }
}

impl std::fmt::Debug for GraphEditor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphEditor")
            .field("pending_actions", &self.pending_actions())
            .finish()
    }
}

/// Route under construction, created by [`GraphEditor::route`].
#[must_use = "a route does nothing until `to` or `to_slot` is called"]
#[derive(Debug)]
pub struct Route<'a> {
    editor: &'a GraphEditor,
    source: ModuleHandle,
}

impl Route<'_> {
    /// Routes the source into input slot 0 of `dest`.
    pub fn to(self, dest: ModuleHandle) {
        self.editor.set_input(dest, 0, self.source);
    }

    /// Routes the source into input `slot` of `dest`.
    pub fn to_slot(self, dest: ModuleHandle, slot: usize) {
        self.editor.set_input(dest, slot, self.source);
    }
}

/// Owns the module graph and renders it block by block.
///
/// `update` must be called from a single coordinating thread. Topology can be
/// changed from any thread through [`editor()`](Self::editor).
///
/// # Example
///
/// ```rust
/// use partita_core::{AudioProcessor, Module, ModuleInputs};
///
/// struct Dc(f32);
///
/// impl Module for Dc {
///     fn commit(&mut self) {}
///     fn sample(&mut self, _inputs: &ModuleInputs<'_>, output: &mut [f32]) {
///         output.fill(self.0);
///     }
/// }
///
/// let mut processor = AudioProcessor::with_threads(2).unwrap();
/// let dc = processor.add_module(Box::new(Dc(0.5)));
/// processor.update(64);
/// assert_eq!(processor.output(dc).unwrap(), vec![0.5; 64]);
/// ```
pub struct AudioProcessor {
    editor: GraphEditor,
    harnesses: Vec<Harness>,
    /// Handle slot -> harness index.
    slot_index: Vec<Option<usize>>,
    /// Per harness, the harness indices it reads from.
    dependencies: Vec<Vec<u32>>,
    dirty: bool,
    silence: Arc<[f32]>,
    block_length: usize,
    /// Length of the most recent `update`, 0 if it sampled nothing.
    last_block: usize,
    pool: PoolParty,
    rejected_routes: u64,
    blocks_processed: u64,
    visited: Vec<bool>,
    visit_stack: Vec<usize>,
    /// Actions taken off the shared queue, applied without holding its lock.
    applying: VecDeque<Action>,
    released: Vec<ModuleHandle>,
}

impl AudioProcessor {
    /// Creates an empty processor with no worker threads.
    ///
    /// Blocks render on the thread calling [`update()`](Self::update) until
    /// [`set_thread_count()`](Self::set_thread_count) starts a pool.
    pub fn new() -> Self {
        Self {
            editor: GraphEditor {
                pending: Arc::new(Mutex::new(Pending::default())),
            },
            harnesses: Vec::new(),
            slot_index: Vec::new(),
            dependencies: Vec::new(),
            dirty: false,
            silence: Arc::from(Vec::new()),
            block_length: 0,
            last_block: 0,
            pool: PoolParty::new(),
            rejected_routes: 0,
            blocks_processed: 0,
            visited: Vec::new(),
            visit_stack: Vec::new(),
            applying: VecDeque::new(),
            released: Vec::new(),
        }
    }

    /// Creates an empty processor backed by `threads` workers.
    ///
    /// # Panics
    ///
    /// Panics if `threads == 0`.
    pub fn with_threads(threads: usize) -> Result<Self> {
        let mut processor = Self::new();
        processor.set_thread_count(threads)?;
        Ok(processor)
    }

    /// Returns a handle other threads can use to change the topology.
    pub fn editor(&self) -> GraphEditor {
        self.editor.clone()
    }

    /// See [`GraphEditor::add_module`].
    pub fn add_module(&self, module: Box<dyn Module>) -> ModuleHandle {
        self.editor.add_module(module)
    }

    /// See [`GraphEditor::remove_module`].
    pub fn remove_module(&self, handle: ModuleHandle) {
        self.editor.remove_module(handle);
    }

    /// See [`GraphEditor::set_input`].
    pub fn set_input(&self, dest: ModuleHandle, slot: usize, source: ModuleHandle) {
        self.editor.set_input(dest, slot, source);
    }

    /// See [`GraphEditor::clear_input`].
    pub fn clear_input(&self, dest: ModuleHandle, slot: usize) {
        self.editor.clear_input(dest, slot);
    }

    /// See [`GraphEditor::route`].
    pub fn route(&self, source: ModuleHandle) -> Route<'_> {
        self.editor.route(source)
    }

    /// Resizes the worker pool.
    ///
    /// # Panics
    ///
    /// Panics if `threads == 0`.
    pub fn set_thread_count(&mut self, threads: usize) -> Result<()> {
        assert!(threads >= 1, "thread count must be at least 1");
        self.pool.setup(threads)
    }

    /// Returns the number of worker threads (0 before any `set_thread_count`).
    pub fn thread_count(&self) -> usize {
        self.pool.worker_count()
    }

    /// Returns the number of registered modules.
    pub fn module_count(&self) -> usize {
        self.harnesses.len()
    }

    /// Returns the current length of the per-module buffers.
    pub fn block_length(&self) -> usize {
        self.block_length
    }

    /// Returns true if `handle` is registered (pending actions not included).
    pub fn contains(&self, handle: ModuleHandle) -> bool {
        self.index_of(handle).is_some()
    }

    /// Returns the module feeding `dest`'s input `slot`, if any.
    ///
    /// # Panics
    ///
    /// Panics if `slot >= MAX_MODULE_INPUTS`.
    pub fn input(&self, dest: ModuleHandle, slot: usize) -> Option<ModuleHandle> {
        assert!(
            slot < MAX_MODULE_INPUTS,
            "input slot {slot} out of range (max {MAX_MODULE_INPUTS})"
        );
        let index = self.index_of(dest)?;
        self.harnesses[index].inputs[slot]
    }

    /// Returns a copy of the samples `handle` wrote in the most recent
    /// `update`. Empty if that update sampled nothing.
    pub fn output(&self, handle: ModuleHandle) -> Option<Vec<f32>> {
        let index = self.index_of(handle)?;
        let buffer = self.harnesses[index].output.read();
        Some(buffer[..self.last_block].to_vec())
    }

    /// Returns how many routes were rejected because they would form a cycle.
    pub fn rejected_routes(&self) -> u64 {
        self.rejected_routes
    }

    /// Returns how many non-empty blocks have been rendered.
    pub fn blocks_processed(&self) -> u64 {
        self.blocks_processed
    }

    /// Renders one block of `block_length` samples.
    ///
    /// Applies queued actions, rebuilds the dependency table if the topology
    /// changed, grows buffers, commits every module, then samples every module
    /// in dependency order and blocks until the whole block is done. With
    /// `block_length == 0` nothing is sampled.
    pub fn update(&mut self, block_length: usize) {
        self.apply_actions();

        if self.dirty {
            self.rebuild_dependencies();
            self.dirty = false;
        }

        self.ensure_block_length(block_length);

        for harness in &self.harnesses {
            harness.module.lock().commit();
        }

        self.last_block = block_length;
        if block_length == 0 {
            return;
        }

        for (index, harness) in self.harnesses.iter().enumerate() {
            let inputs: [Option<SharedBuffer>; MAX_MODULE_INPUTS] = std::array::from_fn(|slot| {
                let source = harness.inputs[slot]?;
                let source = harness_index(&self.harnesses, &self.slot_index, source)?;
                Some(Arc::clone(&self.harnesses[source].output))
            });
            let task = SampleTask {
                module: Arc::clone(&harness.module),
                inputs,
                silence: Arc::clone(&self.silence),
                output: Arc::clone(&harness.output),
                len: block_length,
            };
            let id = self
                .pool
                .add_work_with_dependencies(move || task.run(), &self.dependencies[index]);
            debug_assert_eq!(id as usize, index);
        }

        self.pool.work();
        self.blocks_processed += 1;
    }

    fn index_of(&self, handle: ModuleHandle) -> Option<usize> {
        harness_index(&self.harnesses, &self.slot_index, handle)
    }

    fn apply_actions(&mut self) {
        let mut actions = std::mem::take(&mut self.applying);
        std::mem::swap(&mut actions, &mut self.editor.pending.lock().actions);
        if actions.is_empty() {
            self.applying = actions;
            return;
        }

        while let Some(action) = actions.pop_front() {
            match action {
                Action::Add { handle, module } => self.apply_add(handle, module),
                Action::Remove(handle) => {
                    if self.apply_remove(handle) {
                        self.released.push(handle);
                    }
                }
                Action::Route { dest, slot, source } => self.apply_route(dest, slot, source),
            }
        }
        self.applying = actions;

        // Slots stay allocated until here, so nothing enqueued meanwhile can
        // have been handed a slot that is still live.
        if !self.released.is_empty() {
            let mut pending = self.editor.pending.lock();
            for handle in self.released.drain(..) {
                pending.slots.release(handle);
            }
        }
    }

    fn apply_add(&mut self, handle: ModuleHandle, module: Box<dyn Module>) {
        if self.contains(handle) {
            return;
        }

        let slot = handle.slot() as usize;
        if self.slot_index.len() <= slot {
            self.slot_index.resize(slot + 1, None);
        }
        self.slot_index[slot] = Some(self.harnesses.len());
        self.harnesses
            .push(Harness::new(handle, module, self.block_length));
        self.dirty = true;

        #[cfg(feature = "tracing")]
        tracing::debug!(module = %handle, modules = self.harnesses.len(), "module added");
    }

    fn apply_remove(&mut self, handle: ModuleHandle) -> bool {
        let Some(index) = self.index_of(handle) else {
            return false;
        };

        self.harnesses.remove(index);
        self.slot_index[handle.slot() as usize] = None;
        for entry in self.slot_index.iter_mut().flatten() {
            if *entry > index {
                *entry -= 1;
            }
        }

        let mut scrubbed = 0;
        for harness in &mut self.harnesses {
            scrubbed += harness.scrub(handle);
        }
        self.dirty = true;

        #[cfg(feature = "tracing")]
        tracing::debug!(module = %handle, scrubbed, "module removed");
        #[cfg(not(feature = "tracing"))]
        let _ = scrubbed;

        true
    }

    fn apply_route(&mut self, dest: ModuleHandle, slot: usize, source: Option<ModuleHandle>) {
        let Some(dest_index) = self.index_of(dest) else {
            return;
        };

        if let Some(source) = source {
            let Some(source_index) = self.index_of(source) else {
                return;
            };
            if self.reads_from(source_index, dest_index) {
                self.rejected_routes += 1;
                #[cfg(feature = "tracing")]
                tracing::warn!(%source, %dest, slot, "route rejected: would create a cycle");
                return;
            }
        }

        self.harnesses[dest_index].inputs[slot] = source;
        self.dirty = true;

        #[cfg(feature = "tracing")]
        tracing::debug!(%dest, slot, source = ?source, "input routed");
    }

    /// Returns true if harness `start` transitively reads from harness `target`.
    fn reads_from(&mut self, start: usize, target: usize) -> bool {
        if start == target {
            return true;
        }

        self.visited.clear();
        self.visited.resize(self.harnesses.len(), false);
        self.visit_stack.clear();
        self.visit_stack.push(start);
        self.visited[start] = true;

        while let Some(current) = self.visit_stack.pop() {
            for &input in self.harnesses[current].inputs.iter().flatten() {
                let Some(next) = harness_index(&self.harnesses, &self.slot_index, input) else {
                    continue;
                };
                if next == target {
                    return true;
                }
                if !self.visited[next] {
                    self.visited[next] = true;
                    self.visit_stack.push(next);
                }
            }
        }
        false
    }

    fn rebuild_dependencies(&mut self) {
        let count = self.harnesses.len();
        self.dependencies.truncate(count);
        self.dependencies.resize_with(count, Vec::new);

        for (harness, deps) in self.harnesses.iter().zip(self.dependencies.iter_mut()) {
            deps.clear();
            for &input in harness.inputs.iter().flatten() {
                if let Some(source) = harness_index(&self.harnesses, &self.slot_index, input) {
                    let source = source as u32;
                    if !deps.contains(&source) {
                        deps.push(source);
                    }
                }
            }
        }

        #[cfg(feature = "tracing")]
        tracing::trace!(modules = count, "dependency table rebuilt");
    }

    fn ensure_block_length(&mut self, block_length: usize) {
        if block_length <= self.block_length {
            return;
        }

        for harness in &self.harnesses {
            harness.output.write().resize(block_length, 0.0);
        }
        self.silence = Arc::from(vec![0.0; block_length]);

        #[cfg(feature = "tracing")]
        tracing::debug!(from = self.block_length, to = block_length, "block buffers grown");

        self.block_length = block_length;
    }
}

impl Default for AudioProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for AudioProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioProcessor")
            .field("modules", &self.harnesses.len())
            .field("threads", &self.pool.worker_count())
            .field("block_length", &self.block_length)
            .field("blocks_processed", &self.blocks_processed)
            .finish()
    }
}
