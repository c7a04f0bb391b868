//! Queued topology mutations.

use std::collections::VecDeque;

use crate::module::Module;

use super::handle::{ModuleHandle, SlotAllocator};

/// A topology mutation waiting for the next block boundary.
pub(crate) enum Action {
    /// Register `module` under a handle allocated at enqueue time.
    Add {
        handle: ModuleHandle,
        module: Box<dyn Module>,
    },
    /// Unregister a module and scrub every input slot that reads from it.
    Remove(ModuleHandle),
    /// Point `dest`'s input `slot` at `source`, or at silence when `None`.
    Route {
        dest: ModuleHandle,
        slot: usize,
        source: Option<ModuleHandle>,
    },
}

impl std::fmt::Debug for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Add { handle, .. } => f.debug_struct("Add").field("handle", handle).finish(),
            Self::Remove(handle) => f.debug_tuple("Remove").field(handle).finish(),
            Self::Route { dest, slot, source } => f
                .debug_struct("Route")
                .field("dest", dest)
                .field("slot", slot)
                .field("source", source)
                .finish(),
        }
    }
}

/// State shared between the processor and every [`GraphEditor`](super::GraphEditor).
///
/// Handles are allocated and released under the same lock that orders the
/// actions, so a recycled slot always carries a generation no queued action
/// has seen.
#[derive(Debug, Default)]
pub(crate) struct Pending {
    pub(crate) actions: VecDeque<Action>,
    pub(crate) slots: SlotAllocator,
}
