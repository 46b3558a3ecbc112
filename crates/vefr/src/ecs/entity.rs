//! # Entity — Generational Handles Into the Scene Graph
//!
//! An [`Entity`] is an opaque handle. The [`World`](super::world::World) owns
//! the data; the handle only names a slot. Slots are recycled after despawn,
//! so every handle carries a generation and stale handles fail lookups
//! instead of aliasing whatever entity now occupies the slot.
//!
//! ```text
//! Entity { index: 5, generation: 0 }  ← spawned
//! Entity { index: 5, generation: 1 }  ← slot reused after despawn
//! ```

use std::fmt;

/// A handle to one node of the live scene graph.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Entity {
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

impl Entity {
    /// Slot index. Stable for the entity's lifetime, reused afterwards.
    pub fn index(self) -> u32 {
        self.index
    }

    pub fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entity({}v{})", self.index, self.generation)
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index, self.generation)
    }
}

/// Hands out entity handles and recycles freed slots.
///
/// ```text
/// generations: [0, 1, 0, 2]   ← one counter per slot ever handed out
/// free_list:   [1, 3]         ← slots waiting for reuse
/// ```
pub(crate) struct EntityAllocator {
    generations: Vec<u32>,
    free_list: Vec<u32>,
    len: u32,
}

impl EntityAllocator {
    pub fn new() -> Self {
        Self {
            generations: Vec::new(),
            free_list: Vec::new(),
            len: 0,
        }
    }

    pub fn allocate(&mut self) -> Entity {
        if let Some(index) = self.free_list.pop() {
            // Generation was already bumped when the slot was freed.
            let generation = self.generations[index as usize];
            Entity { index, generation }
        } else {
            let index = self.len;
            self.len += 1;
            self.generations.push(0);
            Entity {
                index,
                generation: 0,
            }
        }
    }

    /// Free a slot. Returns `false` for handles that were already stale.
    pub fn deallocate(&mut self, entity: Entity) -> bool {
        if !self.is_alive(entity) {
            return false;
        }
        self.generations[entity.index as usize] += 1;
        self.free_list.push(entity.index);
        true
    }

    pub fn is_alive(&self, entity: Entity) -> bool {
        self.generations
            .get(entity.index as usize)
            .is_some_and(|&g| g == entity.generation)
    }

    pub fn alive_count(&self) -> usize {
        (self.len as usize) - self.free_list.len()
    }
}
