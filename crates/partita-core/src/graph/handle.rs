//! Generation-tagged module handles.
//!
//! A [`ModuleHandle`] names a registration, not a memory location. Slots are
//! recycled after removal, but each reuse bumps the slot's generation, so a
//! handle kept past its module's removal never aliases a newer module.

use core::fmt;

/// Identifies a module registered with an [`AudioProcessor`](super::AudioProcessor).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModuleHandle {
    slot: u32,
    generation: u32,
}

impl ModuleHandle {
    /// Returns the slot index this handle occupies.
    #[inline]
    pub fn slot(self) -> u32 {
        self.slot
    }

    /// Returns the generation of the slot at allocation time.
    #[inline]
    pub fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Display for ModuleHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "module#{}v{}", self.slot, self.generation)
    }
}

/// Hands out slots with a free list, tracking the live generation per slot.
#[derive(Debug, Default)]
pub(crate) struct SlotAllocator {
    generations: Vec<u32>,
    live: Vec<bool>,
    free: Vec<u32>,
}

impl SlotAllocator {
    pub(crate) fn allocate(&mut self) -> ModuleHandle {
        if let Some(slot) = self.free.pop() {
            let index = slot as usize;
            self.live[index] = true;
            return ModuleHandle {
                slot,
                generation: self.generations[index],
            };
        }

        let slot = self.generations.len() as u32;
        self.generations.push(0);
        self.live.push(true);
        ModuleHandle {
            slot,
            generation: 0,
        }
    }

    /// Returns true if `handle` is the current occupant of its slot.
    pub(crate) fn is_live(&self, handle: ModuleHandle) -> bool {
        let index = handle.slot as usize;
        index < self.live.len() && self.live[index] && self.generations[index] == handle.generation
    }

    /// Frees the slot held by `handle`. Stale handles are ignored.
    pub(crate) fn release(&mut self, handle: ModuleHandle) -> bool {
        if !self.is_live(handle) {
            return false;
        }
        let index = handle.slot as usize;
        self.live[index] = false;
        self.generations[index] = self.generations[index].wrapping_add(1);
        self.free.push(handle.slot);
        true
    }

    /// Number of slots ever allocated (live or free).
    pub(crate) fn slot_count(&self) -> usize {
        self.generations.len()
    }
}
