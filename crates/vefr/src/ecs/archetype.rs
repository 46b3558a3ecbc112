//! Archetype tables: entities that share exactly the same component set.
//!
//! ```text
//! Archetype [Transform, Name]
//!   Transform: [t0, t1, t2]
//!   Name:      [n0, n1, n2]
//!   entities:  [e0, e1, e2]   ← row i of every column belongs to entities[i]
//! ```

use std::any::TypeId;
use std::collections::HashMap;

use super::component::ComponentColumn;
use super::entity::Entity;

/// Sorted, deduplicated list of component types identifying an archetype.
pub(crate) type ArchetypeKey = Vec<TypeId>;

pub(crate) fn archetype_key(mut type_ids: Vec<TypeId>) -> ArchetypeKey {
    type_ids.sort();
    type_ids.dedup();
    type_ids
}

pub(crate) struct Archetype {
    pub columns: HashMap<TypeId, ComponentColumn>,
    pub entities: Vec<Entity>,
    /// Type names for diagnostics and logging.
    pub type_names: HashMap<TypeId, &'static str>,
}

impl Archetype {
    pub fn new(columns: HashMap<TypeId, ComponentColumn>) -> Self {
        Self {
            columns,
            entities: Vec::new(),
            type_names: HashMap::new(),
        }
    }

    pub fn with_key(key: &ArchetypeKey) -> Self {
        let columns = key.iter().map(|&t| (t, ComponentColumn::new())).collect();
        Self::new(columns)
    }

    pub fn has_component(&self, type_id: &TypeId) -> bool {
        self.columns.contains_key(type_id)
    }

    /// Swap-remove the row at `index`. Returns the entity that moved into the
    /// freed row, if any, so the caller can fix its location.
    pub fn swap_remove(&mut self, index: usize) -> Option<Entity> {
        for column in self.columns.values_mut() {
            column.swap_remove(index);
        }
        self.entities.swap_remove(index);
        self.entities.get(index).copied()
    }
}
