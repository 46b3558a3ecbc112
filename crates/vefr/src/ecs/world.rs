//! # World — Entities, Components and Resources
//!
//! ```text
//! World
//!   allocator          entity handle lifecycle
//!   archetypes         sorted Vec<TypeId> → Archetype { columns, entities }
//!   entity_locations   entity index → (archetype key, row)
//!   resources          TypeId → Box<dyn Any>, global singletons
//! ```
//!
//! The scene exporter reads this structure through a handful of type-erased
//! accessors ([`World::component_types`], [`World::get_any_by_type_id`]) and
//! the importer writes through [`World::insert_any_component`]; everything
//! else is ordinary typed access.

use std::any::{Any, TypeId};
use std::collections::HashMap;

use super::archetype::{Archetype, ArchetypeKey, archetype_key};
use super::component::ComponentColumn;
use super::entity::{Entity, EntityAllocator};
use super::hierarchy::{Children, Parent};
use super::query::QueryParam;

pub type BoxedComponent = Box<dyn Any + Send + Sync>;

#[derive(Clone)]
struct EntityLocation {
    archetype_key: ArchetypeKey,
    row: usize,
}

/// The live scene graph: every entity, its components, and global resources.
pub struct World {
    allocator: EntityAllocator,
    archetypes: HashMap<ArchetypeKey, Archetype>,
    entity_locations: HashMap<u32, EntityLocation>,
    resources: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl World {
    pub fn new() -> Self {
        Self {
            allocator: EntityAllocator::new(),
            archetypes: HashMap::new(),
            entity_locations: HashMap::new(),
            resources: HashMap::new(),
        }
    }

    // ── Resources ────────────────────────────────────────────────────

    /// Insert a resource, replacing any previous value of the same type.
    pub fn insert_resource<T: 'static + Send + Sync>(&mut self, value: T) {
        self.resources.insert(TypeId::of::<T>(), Box::new(value));
    }

    /// # Panics
    ///
    /// Panics if the resource hasn't been inserted.
    pub fn resource<T: 'static + Send + Sync>(&self) -> &T {
        self.get_resource::<T>().unwrap_or_else(|| {
            panic!(
                "Resource `{}` not found. Did you forget to insert it?",
                std::any::type_name::<T>()
            )
        })
    }

    /// # Panics
    ///
    /// Panics if the resource hasn't been inserted.
    pub fn resource_mut<T: 'static + Send + Sync>(&mut self) -> &mut T {
        self.get_resource_mut::<T>().unwrap_or_else(|| {
            panic!(
                "Resource `{}` not found. Did you forget to insert it?",
                std::any::type_name::<T>()
            )
        })
    }

    pub fn get_resource<T: 'static + Send + Sync>(&self) -> Option<&T> {
        self.resources
            .get(&TypeId::of::<T>())
            .and_then(|r| r.downcast_ref::<T>())
    }

    pub fn get_resource_mut<T: 'static + Send + Sync>(&mut self) -> Option<&mut T> {
        self.resources
            .get_mut(&TypeId::of::<T>())
            .and_then(|r| r.downcast_mut::<T>())
    }

    pub fn has_resource<T: 'static + Send + Sync>(&self) -> bool {
        self.resources.contains_key(&TypeId::of::<T>())
    }

    /// Take a resource out of the world. Pair with [`World::insert_resource`]
    /// when a resource and the world must be borrowed at the same time.
    pub fn resource_remove<T: 'static + Send + Sync>(&mut self) -> Option<T> {
        self.resources
            .remove(&TypeId::of::<T>())
            .and_then(|r| r.downcast::<T>().ok())
            .map(|b| *b)
    }

    // ── Entities ─────────────────────────────────────────────────────

    pub fn entity_count(&self) -> usize {
        self.allocator.alive_count()
    }

    pub fn is_alive(&self, entity: Entity) -> bool {
        self.allocator.is_alive(entity)
    }

    pub fn spawn_empty(&mut self) -> Entity {
        let entity = self.allocator.allocate();
        let key = archetype_key(vec![]);
        let arch = self
            .archetypes
            .entry(key.clone())
            .or_insert_with(|| Archetype::new(HashMap::new()));
        let row = arch.entities.len();
        arch.entities.push(entity);
        self.entity_locations.insert(
            entity.index,
            EntityLocation {
                archetype_key: key,
                row,
            },
        );
        entity
    }

    /// Spawn a child under `parent`: the child gets [`Parent`] and is
    /// appended to the parent's [`Children`] list. World matrices are not
    /// cached until [`propagate_transforms`](super::propagate_transforms)
    /// runs.
    ///
    /// # Panics
    ///
    /// Panics if the parent entity is not alive.
    pub fn spawn_child<B: SpawnBundle>(&mut self, parent: Entity, bundle: B) -> Entity {
        assert!(
            self.allocator.is_alive(parent),
            "Cannot spawn child on dead parent {:?}",
            parent
        );

        let child = self.spawn(bundle);
        self.set_parent(child, parent);
        child
    }

    /// Move `child` under `parent`, appending it to the parent's
    /// [`Children`] and detaching it from any previous parent.
    ///
    /// # Panics
    ///
    /// Panics if either entity is not alive.
    pub fn set_parent(&mut self, child: Entity, parent: Entity) {
        assert!(
            self.allocator.is_alive(child) && self.allocator.is_alive(parent),
            "Cannot parent {:?} under {:?}: dead entity",
            child,
            parent
        );

        if let Some(previous) = self.get::<Parent>(child).map(|p| p.0) {
            if let Some(children) = self.get_mut::<Children>(previous) {
                children.0.retain(|&c| c != child);
            }
        }
        self.insert(child, Parent(parent));
        if let Some(children) = self.get_mut::<Children>(parent) {
            children.0.push(child);
        } else {
            self.insert(parent, Children(vec![child]));
        }
    }

    /// Despawn an entity and every descendant, detaching it from its parent.
    pub fn despawn_recursive(&mut self, entity: Entity) -> bool {
        if !self.allocator.is_alive(entity) {
            return false;
        }

        if let Some(parent) = self.get::<Parent>(entity).map(|p| p.0) {
            if let Some(children) = self.get_mut::<Children>(parent) {
                children.0.retain(|&c| c != entity);
            }
        }

        let mut to_despawn = vec![entity];
        let mut i = 0;
        while i < to_despawn.len() {
            if let Some(children) = self.get::<Children>(to_despawn[i]) {
                let child_list = children.0.clone();
                to_despawn.extend(child_list);
            }
            i += 1;
        }
        for e in to_despawn {
            self.despawn(e);
        }
        true
    }

    /// Despawn a single entity. Its children, if any, are left dangling.
    pub fn despawn(&mut self, entity: Entity) -> bool {
        if !self.allocator.is_alive(entity) {
            return false;
        }
        if let Some(loc) = self.entity_locations.remove(&entity.index) {
            if let Some(arch) = self.archetypes.get_mut(&loc.archetype_key) {
                if let Some(swapped) = arch.swap_remove(loc.row) {
                    if let Some(swapped_loc) = self.entity_locations.get_mut(&swapped.index) {
                        swapped_loc.row = loc.row;
                    }
                }
            }
        }
        self.allocator.deallocate(entity);
        true
    }

    // ── Typed component access ───────────────────────────────────────

    pub fn get<T: 'static + Send + Sync>(&self, entity: Entity) -> Option<&T> {
        let (arch, row) = self.locate(entity)?;
        Some(arch.columns.get(&TypeId::of::<T>())?.get::<T>(row))
    }

    pub fn get_mut<T: 'static + Send + Sync>(&mut self, entity: Entity) -> Option<&mut T> {
        if !self.allocator.is_alive(entity) {
            return None;
        }
        let loc = self.entity_locations.get(&entity.index)?;
        let arch = self.archetypes.get_mut(&loc.archetype_key)?;
        Some(arch.columns.get_mut(&TypeId::of::<T>())?.get_mut::<T>(loc.row))
    }

    pub fn has<T: 'static + Send + Sync>(&self, entity: Entity) -> bool {
        self.locate(entity)
            .is_some_and(|(arch, _)| arch.has_component(&TypeId::of::<T>()))
    }

    /// Add or replace a component, migrating the entity to a new archetype
    /// when the component type is new to it.
    ///
    /// # Panics
    ///
    /// Panics if the entity is not alive.
    pub fn insert<T: 'static + Send + Sync>(&mut self, entity: Entity, component: T) {
        if let Some(existing) = self.get_mut::<T>(entity) {
            *existing = component;
            return;
        }
        self.insert_any_component(
            entity,
            TypeId::of::<T>(),
            std::any::type_name::<T>(),
            Box::new(component),
        );
    }

    /// Remove a component and hand it back. `None` if the entity is dead or
    /// never had one.
    pub fn remove<T: 'static + Send + Sync>(&mut self, entity: Entity) -> Option<T> {
        let tid = TypeId::of::<T>();
        let (arch, _) = self.locate(entity)?;
        if !arch.has_component(&tid) {
            return None;
        }
        let old_key = self.entity_locations.get(&entity.index)?.archetype_key.clone();
        let new_key: ArchetypeKey = old_key.into_iter().filter(|&t| t != tid).collect();
        let removed = self.migrate(entity, new_key, None)?;
        removed.downcast::<T>().ok().map(|b| *b)
    }

    // ── Type-erased access ───────────────────────────────────────────

    /// Insert a boxed component whose concrete type is only known by
    /// `type_id`. Replaces an existing component of the same type.
    ///
    /// # Panics
    ///
    /// Panics if the entity is not alive.
    pub fn insert_any_component(
        &mut self,
        entity: Entity,
        type_id: TypeId,
        type_name: &'static str,
        boxed: BoxedComponent,
    ) {
        assert!(
            self.allocator.is_alive(entity),
            "Cannot insert component `{}` on dead entity {:?}",
            type_name,
            entity
        );
        let Some(loc) = self.entity_locations.get(&entity.index).cloned() else {
            return;
        };

        if loc.archetype_key.contains(&type_id) {
            if let Some(col) = self
                .archetypes
                .get_mut(&loc.archetype_key)
                .and_then(|a| a.columns.get_mut(&type_id))
            {
                col.replace(loc.row, boxed);
            }
            return;
        }

        let mut new_type_ids = loc.archetype_key.clone();
        new_type_ids.push(type_id);
        self.migrate(entity, archetype_key(new_type_ids), Some((type_id, type_name, boxed)));
    }

    /// Component types attached to `entity`, or an empty list for dead handles.
    pub fn component_types(&self, entity: Entity) -> Vec<TypeId> {
        if !self.allocator.is_alive(entity) {
            return Vec::new();
        }
        self.entity_locations
            .get(&entity.index)
            .map(|loc| loc.archetype_key.clone())
            .unwrap_or_default()
    }

    pub fn get_any_by_type_id(&self, entity: Entity, type_id: TypeId) -> Option<&dyn Any> {
        let (arch, row) = self.locate(entity)?;
        Some(arch.columns.get(&type_id)?.get_any(row))
    }

    // ── Queries ──────────────────────────────────────────────────────

    /// Visit every entity that has all of `Q`'s component types.
    pub fn query<Q: QueryParam>(&mut self, f: impl FnMut(Entity, Q::Item<'_>)) {
        self.query_with_types::<Q>(Q::type_ids(), f);
    }

    /// Like [`World::query`], restricted to entities that also carry `F`.
    pub fn query_filtered<Q: QueryParam, F: 'static + Send + Sync>(
        &mut self,
        f: impl FnMut(Entity, Q::Item<'_>),
    ) {
        let mut required = Q::type_ids();
        required.push(TypeId::of::<F>());
        self.query_with_types::<Q>(required, f);
    }

    /// Every alive entity carrying a component of type `T`.
    pub fn entities_with<T: 'static + Send + Sync>(&self) -> Vec<Entity> {
        let type_id = TypeId::of::<T>();
        self.archetypes
            .values()
            .filter(|a| a.has_component(&type_id))
            .flat_map(|a| a.entities.iter().copied())
            .collect()
    }

    fn query_with_types<Q: QueryParam>(
        &mut self,
        required: Vec<TypeId>,
        mut f: impl FnMut(Entity, Q::Item<'_>),
    ) {
        let matching: Vec<ArchetypeKey> = self
            .archetypes
            .iter()
            .filter(|(_, arch)| required.iter().all(|tid| arch.has_component(tid)))
            .map(|(key, _)| key.clone())
            .collect();

        for key in matching {
            let Some(arch) = self.archetypes.get_mut(&key) else {
                continue;
            };
            let mut cols = Q::extract(&mut arch.columns);
            for (row, &entity) in arch.entities.iter().enumerate() {
                f(entity, Q::fetch(&mut cols, row));
            }
            Q::restore(cols, &mut arch.columns);
        }
    }

    // ── Internals ────────────────────────────────────────────────────

    fn locate(&self, entity: Entity) -> Option<(&Archetype, usize)> {
        if !self.allocator.is_alive(entity) {
            return None;
        }
        let loc = self.entity_locations.get(&entity.index)?;
        Some((self.archetypes.get(&loc.archetype_key)?, loc.row))
    }

    /// Move `entity` into the archetype for `new_key`, carrying over every
    /// component the new archetype has a column for and pushing `added` into
    /// its column. Returns the component left behind when `new_key` drops one.
    fn migrate(
        &mut self,
        entity: Entity,
        new_key: ArchetypeKey,
        added: Option<(TypeId, &'static str, BoxedComponent)>,
    ) -> Option<BoxedComponent> {
        let loc = self.entity_locations.get(&entity.index)?.clone();

        self.archetypes
            .entry(new_key.clone())
            .or_insert_with(|| Archetype::with_key(&new_key));

        let old = self.archetypes.get_mut(&loc.archetype_key)?;
        let mut taken: HashMap<TypeId, BoxedComponent> = old
            .columns
            .iter_mut()
            .map(|(&tid, col)| (tid, col.take(loc.row)))
            .collect();
        let names: Vec<(TypeId, &'static str)> =
            old.type_names.iter().map(|(&t, &n)| (t, n)).collect();
        old.entities.swap_remove(loc.row);
        let swapped = old.entities.get(loc.row).copied();
        if let Some(swapped) = swapped {
            if let Some(swapped_loc) = self.entity_locations.get_mut(&swapped.index) {
                swapped_loc.row = loc.row;
            }
        }

        let new_arch = self.archetypes.get_mut(&new_key)?;
        for (tid, name) in names {
            new_arch.type_names.entry(tid).or_insert(name);
        }
        let new_row = new_arch.entities.len();
        new_arch.entities.push(entity);

        let mut added = added;
        if let Some((tid, name, _)) = &added {
            new_arch.type_names.entry(*tid).or_insert(*name);
        }
        for (&tid, col) in new_arch.columns.iter_mut() {
            match added.take_if(|(added_tid, _, _)| *added_tid == tid) {
                Some((_, _, boxed)) => col.push_any(boxed),
                None => col.push_any(
                    taken
                        .remove(&tid)
                        .expect("archetype migration lost a component column"),
                ),
            }
        }

        self.entity_locations.insert(
            entity.index,
            EntityLocation {
                archetype_key: new_key,
                row: new_row,
            },
        );

        taken.into_values().next()
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

// ── Spawn bundles ────────────────────────────────────────────────────────

/// A tuple of components spawned together.
pub trait SpawnBundle {
    fn type_ids() -> Vec<TypeId>;
    fn type_names() -> Vec<(TypeId, &'static str)>;
    fn push_into(self, columns: &mut HashMap<TypeId, ComponentColumn>);
}

macro_rules! impl_spawn_bundle {
    ($($T:ident),+) => {
        impl<$($T: 'static + Send + Sync),+> SpawnBundle for ($($T,)+) {
            fn type_ids() -> Vec<TypeId> {
                vec![$(TypeId::of::<$T>()),+]
            }

            fn type_names() -> Vec<(TypeId, &'static str)> {
                vec![$((TypeId::of::<$T>(), std::any::type_name::<$T>())),+]
            }

            #[allow(non_snake_case)]
            fn push_into(self, columns: &mut HashMap<TypeId, ComponentColumn>) {
                let ($($T,)+) = self;
                $(
                    columns
                        .get_mut(&TypeId::of::<$T>())
                        .expect("bundle column missing")
                        .push::<$T>($T);
                )+
            }
        }
    };
}

impl_spawn_bundle!(A);
impl_spawn_bundle!(A, B);
impl_spawn_bundle!(A, B, C);
impl_spawn_bundle!(A, B, C, D);
impl_spawn_bundle!(A, B, C, D, E);
impl_spawn_bundle!(A, B, C, D, E, F);
impl_spawn_bundle!(A, B, C, D, E, F, G);
impl_spawn_bundle!(A, B, C, D, E, F, G, H);

impl World {
    /// Spawn an entity with a tuple of components.
    ///
    /// # Panics
    ///
    /// Panics if the tuple names the same component type twice.
    pub fn spawn<B: SpawnBundle>(&mut self, bundle: B) -> Entity {
        let ids = B::type_ids();
        let key = archetype_key(ids.clone());
        assert_eq!(
            key.len(),
            ids.len(),
            "spawn bundle contains a duplicate component type"
        );

        let entity = self.allocator.allocate();
        let arch = self
            .archetypes
            .entry(key.clone())
            .or_insert_with(|| Archetype::with_key(&key));
        for (tid, name) in B::type_names() {
            arch.type_names.entry(tid).or_insert(name);
        }
        let row = arch.entities.len();
        arch.entities.push(entity);
        bundle.push_into(&mut arch.columns);

        self.entity_locations.insert(
            entity.index,
            EntityLocation {
                archetype_key: key,
                row,
            },
        );
        entity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Position {
        x: f32,
        y: f32,
    }
    #[derive(Debug, PartialEq)]
    struct Velocity {
        dx: f32,
    }
    #[derive(Debug, PartialEq)]
    struct Health(u32);
    struct Marker;

    #[test]
    fn spawn_and_query() {
        let mut world = World::new();
        world.spawn((Position { x: 1.0, y: 2.0 }, Velocity { dx: 0.5 }));
        world.spawn((Position { x: 3.0, y: 4.0 }, Velocity { dx: 1.0 }));
        world.spawn((Position { x: 5.0, y: 6.0 },));

        let mut seen = 0;
        world.query::<(&Position, &Velocity)>(|_, _| seen += 1);
        assert_eq!(seen, 2);
    }

    #[test]
    fn query_mutates_in_place() {
        let mut world = World::new();
        let e = world.spawn((Position { x: 0.0, y: 0.0 }, Velocity { dx: 2.0 }));
        world.query::<(&mut Position, &Velocity)>(|_, (pos, vel)| pos.x += vel.dx);
        assert_eq!(world.get::<Position>(e), Some(&Position { x: 2.0, y: 0.0 }));
    }

    #[test]
    fn query_filtered_requires_marker() {
        let mut world = World::new();
        world.spawn((Position { x: 0.0, y: 0.0 }, Marker));
        world.spawn((Position { x: 1.0, y: 1.0 },));
        let mut xs = Vec::new();
        world.query_filtered::<(&Position,), Marker>(|_, (p,)| xs.push(p.x));
        assert_eq!(xs, vec![0.0]);
    }

    #[test]
    fn despawn_keeps_swapped_rows_consistent() {
        let mut world = World::new();
        let e0 = world.spawn((Health(10),));
        let e1 = world.spawn((Health(20),));
        let e2 = world.spawn((Health(30),));
        world.despawn(e0);
        assert!(world.get::<Health>(e0).is_none());
        assert_eq!(world.get::<Health>(e1), Some(&Health(20)));
        assert_eq!(world.get::<Health>(e2), Some(&Health(30)));
        assert_eq!(world.entity_count(), 2);
    }

    #[test]
    fn insert_migrates_and_keeps_existing_components() {
        let mut world = World::new();
        let e = world.spawn((Position { x: 1.0, y: 2.0 },));
        let other = world.spawn((Position { x: 9.0, y: 9.0 },));
        world.insert(e, Velocity { dx: 3.0 });

        assert_eq!(world.get::<Velocity>(e), Some(&Velocity { dx: 3.0 }));
        assert_eq!(world.get::<Position>(e), Some(&Position { x: 1.0, y: 2.0 }));
        assert_eq!(world.get::<Position>(other), Some(&Position { x: 9.0, y: 9.0 }));
    }

    #[test]
    fn insert_replaces_existing_value() {
        let mut world = World::new();
        let e = world.spawn((Health(50), Marker));
        world.insert(e, Health(100));
        assert_eq!(world.get::<Health>(e), Some(&Health(100)));
        assert!(world.has::<Marker>(e));
    }

    #[test]
    fn insert_any_replaces_in_place() {
        let mut world = World::new();
        let a = world.spawn((Health(1), Marker));
        let b = world.spawn((Health(2), Marker));
        world.insert_any_component(
            a,
            TypeId::of::<Health>(),
            "Health",
            Box::new(Health(7)),
        );
        assert_eq!(world.get::<Health>(a), Some(&Health(7)));
        assert_eq!(world.get::<Health>(b), Some(&Health(2)));
    }

    #[test]
    fn remove_returns_value() {
        let mut world = World::new();
        let e = world.spawn((Position { x: 1.0, y: 2.0 }, Health(5)));
        assert_eq!(world.remove::<Health>(e), Some(Health(5)));
        assert!(!world.has::<Health>(e));
        assert_eq!(world.get::<Position>(e), Some(&Position { x: 1.0, y: 2.0 }));
        assert_eq!(world.remove::<Health>(e), None);
    }

    #[test]
    fn component_types_lists_everything_attached() {
        let mut world = World::new();
        let e = world.spawn((Position { x: 0.0, y: 0.0 }, Marker));
        let types = world.component_types(e);
        assert_eq!(types.len(), 2);
        assert!(types.contains(&TypeId::of::<Position>()));
        assert!(types.contains(&TypeId::of::<Marker>()));
        assert!(world.get_any_by_type_id(e, TypeId::of::<Position>()).is_some());
    }

    #[test]
    fn resources_round_trip() {
        let mut world = World::new();
        world.insert_resource(String::from("hello"));
        assert_eq!(world.resource::<String>(), "hello");
        let taken = world.resource_remove::<String>();
        assert_eq!(taken.as_deref(), Some("hello"));
        assert!(!world.has_resource::<String>());
    }

    #[test]
    fn stale_handle_reads_nothing() {
        let mut world = World::new();
        let e = world.spawn((Health(1),));
        world.despawn(e);
        let reused = world.spawn((Health(2),));
        assert_eq!(reused.index(), e.index());
        assert!(world.get::<Health>(e).is_none());
        assert_eq!(world.get::<Health>(reused), Some(&Health(2)));
    }

    #[test]
    fn set_parent_moves_between_children_lists() {
        let mut world = World::new();
        let a = world.spawn((Marker,));
        let b = world.spawn((Marker,));
        let child = world.spawn_child(a, (Health(1),));
        world.set_parent(child, b);

        assert_eq!(world.get::<Parent>(child), Some(&Parent(b)));
        assert!(world.get::<Children>(a).unwrap().0.is_empty());
        assert_eq!(world.get::<Children>(b).unwrap().0, vec![child]);
    }
}
