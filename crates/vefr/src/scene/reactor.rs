//! Component lifecycle events and the queues that carry them.
//!
//! Components with side effects do not react on their own. Code that changes
//! such a component goes through [`set_component`] / [`remove_component`],
//! which queue a [`ComponentEvent`]. A system later drains the queue and
//! folds each event through a pure reducer
//! `(state, event) -> (state, effects)`.
//!
//! ```text
//! set_component ──▶ Events<ComponentEvent<T>> ──▶ system ──▶ reduce() ──▶ effects
//! ```

use crate::ecs::{Entity, World};

/// What happened to a component.
#[derive(Debug, Clone, PartialEq)]
pub enum Lifecycle<T> {
    Mount(T),
    Update(T),
    Unmount,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComponentEvent<T> {
    pub entity: Entity,
    pub lifecycle: Lifecycle<T>,
}

/// A FIFO queue stored as a world resource.
///
/// Nothing empties a queue implicitly. Lifecycle queues are drained by the
/// reactor systems; effect queues written by those systems are read by the
/// runner between schedule runs and cleared at the start of the next one
/// (see [`clear_events`]).
#[derive(Debug)]
pub struct Events<E> {
    queue: Vec<E>,
}

impl<E> Default for Events<E> {
    fn default() -> Self {
        Self { queue: Vec::new() }
    }
}

impl<E> Events<E> {
    pub fn send(&mut self, event: E) {
        self.queue.push(event);
    }

    pub fn clear(&mut self) {
        self.queue.clear();
    }

    /// Take every queued event, oldest first.
    pub fn drain(&mut self) -> Vec<E> {
        std::mem::take(&mut self.queue)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &E> {
        self.queue.iter()
    }
}

/// Queue `event`, creating the queue resource on first use.
pub fn send_event<E: Send + Sync + 'static>(world: &mut World, event: E) {
    if !world.has_resource::<Events<E>>() {
        world.insert_resource(Events::<E>::default());
    }
    world.resource_mut::<Events<E>>().send(event);
}

/// Drain a queue, or nothing if it was never created.
pub fn drain_events<E: Send + Sync + 'static>(world: &mut World) -> Vec<E> {
    world
        .get_resource_mut::<Events<E>>()
        .map(Events::drain)
        .unwrap_or_default()
}

/// Drop whatever is left in a queue, if it exists.
pub fn clear_events<E: Send + Sync + 'static>(world: &mut World) {
    if let Some(events) = world.get_resource_mut::<Events<E>>() {
        events.clear();
    }
}

/// Attach or overwrite `T` on `entity` and queue a mount/update event.
pub fn set_component<T: Clone + Send + Sync + 'static>(world: &mut World, entity: Entity, value: T) {
    let lifecycle = if world.has::<T>(entity) {
        Lifecycle::Update(value.clone())
    } else {
        Lifecycle::Mount(value.clone())
    };
    world.insert(entity, value);
    send_event(world, ComponentEvent { entity, lifecycle });
}

/// Detach `T` from `entity`, queueing an unmount event if it was present.
pub fn remove_component<T: Send + Sync + 'static>(world: &mut World, entity: Entity) -> Option<T> {
    let removed = world.remove::<T>(entity)?;
    send_event(
        world,
        ComponentEvent::<T> {
            entity,
            lifecycle: Lifecycle::Unmount,
        },
    );
    Some(removed)
}
