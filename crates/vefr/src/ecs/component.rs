//! Type-erased component columns.
//!
//! Archetypes hold a dynamic set of component types, so each column stores
//! `Box<dyn Any + Send + Sync>` and downcasts on access. No unsafe code; the
//! cost is one allocation per component, which is irrelevant at scene-editing
//! scale.

use std::any::Any;

/// One column of components inside an [`Archetype`](super::archetype::Archetype).
pub struct ComponentColumn {
    data: Vec<Box<dyn Any + Send + Sync>>,
}

impl ComponentColumn {
    pub fn new() -> Self {
        Self { data: Vec::new() }
    }

    pub fn push<T: 'static + Send + Sync>(&mut self, value: T) {
        self.data.push(Box::new(value));
    }

    pub fn push_any(&mut self, value: Box<dyn Any + Send + Sync>) {
        self.data.push(value);
    }

    /// # Panics
    ///
    /// Panics on a type mismatch, which means the archetype bookkeeping is broken.
    pub fn get<T: 'static>(&self, index: usize) -> &T {
        self.data[index].downcast_ref().unwrap_or_else(|| {
            panic!(
                "Component type mismatch: expected `{}` in column",
                std::any::type_name::<T>()
            )
        })
    }

    /// # Panics
    ///
    /// Panics on a type mismatch, which means the archetype bookkeeping is broken.
    pub fn get_mut<T: 'static>(&mut self, index: usize) -> &mut T {
        self.data[index].downcast_mut().unwrap_or_else(|| {
            panic!(
                "Component type mismatch: expected `{}` in column",
                std::any::type_name::<T>()
            )
        })
    }

    /// Overwrite the value at `index`, dropping the old one.
    pub fn replace(&mut self, index: usize, value: Box<dyn Any + Send + Sync>) {
        self.data[index] = value;
    }

    pub fn get_any(&self, index: usize) -> &dyn Any {
        &*self.data[index]
    }

    /// Swap-remove the value at `index` and hand it back, for moving an entity
    /// between archetypes.
    pub fn take(&mut self, index: usize) -> Box<dyn Any + Send + Sync> {
        self.data.swap_remove(index)
    }

    /// Swap-remove and drop the value at `index`.
    pub fn swap_remove(&mut self, index: usize) {
        self.data.swap_remove(index);
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_get_and_swap_remove() {
        let mut col = ComponentColumn::new();
        col.push(10u32);
        col.push(20u32);
        col.push(30u32);
        col.swap_remove(0);
        assert_eq!(col.len(), 2);
        assert_eq!(*col.get::<u32>(0), 30);
        assert_eq!(*col.get::<u32>(1), 20);
    }

    #[test]
    fn take_moves_value_between_columns() {
        let mut a = ComponentColumn::new();
        a.push(String::from("hips"));
        let mut b = ComponentColumn::new();
        b.push_any(a.take(0));
        assert_eq!(a.len(), 0);
        assert_eq!(b.get::<String>(0), "hips");
    }
}
