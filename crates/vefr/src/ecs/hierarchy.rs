//! # Entity Hierarchies — Parent/Child Relationships
//!
//! [`Parent`] and [`Children`] describe the scene tree; [`GlobalTransform`]
//! caches each entity's world matrix. Child order in [`Children`] is the
//! authoritative traversal order for every walker in this crate.
//!
//! ```ignore
//! let root = world.spawn((Transform::from_xyz(1.0, 0.0, 0.0),));
//! let hand = world.spawn_child(root, (Transform::from_xyz(0.0, 1.0, 0.0),));
//! propagate_transforms(&mut world);
//! // hand's GlobalTransform now sits at (1, 1, 0)
//! ```

use std::collections::VecDeque;

use crate::ecs::Entity;
use crate::ecs::world::World;
use crate::math::{Mat4, Transform};

/// Marks an entity as a child of another entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Parent(pub Entity);

/// Ordered child list of a parent entity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Children(pub Vec<Entity>);

/// World-space matrix computed by [`propagate_transforms`].
///
/// Code that needs a canonical world pose (the pose normalizer) may also
/// write this directly; the next propagation overwrites such edits.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GlobalTransform {
    pub matrix: Mat4,
}

impl GlobalTransform {
    pub fn from_matrix(matrix: Mat4) -> Self {
        Self { matrix }
    }
}

/// Recompute every [`GlobalTransform`] from the local transforms.
///
/// Roots (a [`Transform`] and no [`Parent`]) take their local matrix; children
/// take `parent_global * child_local`. Breadth-first, so parents are always
/// resolved first.
pub fn propagate_transforms(world: &mut World) {
    let mut roots = Vec::new();
    world.query::<(&Transform,)>(|entity, (transform,)| {
        roots.push((entity, transform.matrix()));
    });
    roots.retain(|(entity, _)| !world.has::<Parent>(*entity));

    let mut queue: VecDeque<(Entity, Mat4)> = VecDeque::new();
    for (entity, matrix) in roots {
        world.insert(entity, GlobalTransform { matrix });
        for child in children_of(world, entity) {
            queue.push_back((child, matrix));
        }
    }

    while let Some((entity, parent_matrix)) = queue.pop_front() {
        let local = world
            .get::<Transform>(entity)
            .map(|t| t.matrix())
            .unwrap_or(Mat4::IDENTITY);
        let matrix = parent_matrix * local;
        world.insert(entity, GlobalTransform { matrix });
        for child in children_of(world, entity) {
            queue.push_back((child, matrix));
        }
    }
}

/// Direct children of `entity`, in stored order.
pub fn children_of(world: &World, entity: Entity) -> Vec<Entity> {
    world
        .get::<Children>(entity)
        .map(|c| c.0.clone())
        .unwrap_or_default()
}

/// World matrix of `entity` composed from the local [`Transform`]s along its
/// [`Parent`] chain. Entities without a `Transform` contribute identity.
///
/// Reads only local state, so it is correct whether or not
/// [`propagate_transforms`] has run since the tree last changed. Cached
/// [`GlobalTransform`]s are ignored.
pub fn world_matrix(world: &World, entity: Entity) -> Mat4 {
    let local = |e: Entity| {
        world
            .get::<Transform>(e)
            .map(|t| t.matrix())
            .unwrap_or(Mat4::IDENTITY)
    };
    let mut matrix = local(entity);
    let mut current = entity;
    // A parent chain longer than the entity count can only be a cycle.
    for _ in 0..world.entity_count() {
        let Some(&Parent(parent)) = world.get::<Parent>(current) else {
            break;
        };
        matrix = local(parent) * matrix;
        current = parent;
    }
    matrix
}

/// `entity` and all its descendants, depth-first pre-order.
pub fn subtree(world: &World, entity: Entity) -> Vec<Entity> {
    let mut out = Vec::new();
    let mut stack = vec![entity];
    while let Some(current) = stack.pop() {
        out.push(current);
        let children = children_of(world, current);
        stack.extend(children.into_iter().rev());
    }
    out
}

/// First entity in `entity`'s subtree (pre-order) matching `pred`.
pub fn find_in_subtree(
    world: &World,
    entity: Entity,
    include_root: bool,
    mut pred: impl FnMut(&World, Entity) -> bool,
) -> Option<Entity> {
    subtree(world, entity)
        .into_iter()
        .filter(|&e| include_root || e != entity)
        .find(|&e| pred(world, e))
}
