//! # Export Extensions — Hooks Around the Tree Walk
//!
//! Export reads live entity state, so an extension that wants the document to
//! look different edits the world in a `before*` hook and puts it back in the
//! matching `after*` hook.
//!
//! ```text
//! before(root)
//!   before_node(e)
//!     ..children..
//!     before_component(e, c, node, i)  after_component(e, c, node, i)   per component
//!   after_node(e, node, i)
//! after(root)
//! ```
//!
//! Every pair is a bracket: once an extension's `before*` hook has returned
//! `Ok`, its `after*` counterpart runs even if the walk in between failed.
//! Hooks run in list order at every point.

use std::any::TypeId;
use std::collections::HashMap;

use crate::ecs::{Children, Entity, Parent, World};
use crate::error::ExportError;
use crate::gltf::document::{SceneDocument, SceneNode};
use crate::scene::components::GltfSource;

/// A set of hooks invoked around an export. Every method defaults to a no-op.
#[allow(unused_variables)]
pub trait ExportExtension {
    /// Used in logs and errors.
    fn name(&self) -> &'static str;

    fn before(
        &mut self,
        world: &mut World,
        root: Entity,
        document: &mut SceneDocument,
    ) -> Result<(), ExportError> {
        Ok(())
    }

    fn before_node(&mut self, world: &mut World, entity: Entity) -> Result<(), ExportError> {
        Ok(())
    }

    fn before_component(
        &mut self,
        world: &mut World,
        entity: Entity,
        component: TypeId,
        node: &mut SceneNode,
        index: usize,
    ) -> Result<(), ExportError> {
        Ok(())
    }

    fn after_component(
        &mut self,
        world: &mut World,
        entity: Entity,
        component: TypeId,
        node: &mut SceneNode,
        index: usize,
    ) -> Result<(), ExportError> {
        Ok(())
    }

    /// `exported` is `None` when the node was abandoned because something
    /// below it failed.
    fn after_node(
        &mut self,
        world: &mut World,
        entity: Entity,
        exported: Option<(usize, &mut SceneNode)>,
    ) -> Result<(), ExportError> {
        Ok(())
    }

    fn after(
        &mut self,
        world: &mut World,
        root: Entity,
        document: &mut SceneDocument,
    ) -> Result<(), ExportError> {
        Ok(())
    }
}

/// Exports the root as if it had no parent, so its matrix is not expressed
/// relative to whatever it is mounted under.
#[derive(Debug, Default)]
pub struct DetachRootParent {
    saved: Option<Parent>,
}

impl ExportExtension for DetachRootParent {
    fn name(&self) -> &'static str {
        "DetachRootParent"
    }

    fn before(
        &mut self,
        world: &mut World,
        root: Entity,
        _document: &mut SceneDocument,
    ) -> Result<(), ExportError> {
        self.saved = world.remove::<Parent>(root);
        Ok(())
    }

    fn after(
        &mut self,
        world: &mut World,
        root: Entity,
        _document: &mut SceneDocument,
    ) -> Result<(), ExportError> {
        if let Some(parent) = self.saved.take() {
            world.insert(root, parent);
        }
        Ok(())
    }
}

/// Keeps the children of nested model instances out of the document; the
/// model's own `EE_model` payload already references them.
#[derive(Debug, Default)]
pub struct SkipNestedScenes {
    hidden: HashMap<Entity, Vec<Entity>>,
}

impl ExportExtension for SkipNestedScenes {
    fn name(&self) -> &'static str {
        "SkipNestedScenes"
    }

    fn before_node(&mut self, world: &mut World, entity: Entity) -> Result<(), ExportError> {
        if !world.has::<GltfSource>(entity) {
            return Ok(());
        }
        if let Some(children) = world.get_mut::<Children>(entity) {
            if !children.0.is_empty() {
                self.hidden.insert(entity, std::mem::take(&mut children.0));
            }
        }
        Ok(())
    }

    fn after_node(
        &mut self,
        world: &mut World,
        entity: Entity,
        _exported: Option<(usize, &mut SceneNode)>,
    ) -> Result<(), ExportError> {
        if let Some(children) = self.hidden.remove(&entity) {
            if let Some(current) = world.get_mut::<Children>(entity) {
                current.0 = children;
            }
        }
        Ok(())
    }
}

/// `[SkipNestedScenes, DetachRootParent]`
pub fn default_export_extensions() -> Vec<Box<dyn ExportExtension>> {
    vec![
        Box::new(SkipNestedScenes::default()),
        Box::new(DetachRootParent::default()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Transform;

    #[test]
    fn detach_root_parent_restores_in_after() {
        let mut world = World::new();
        let stage = world.spawn((Transform::default(),));
        let root = world.spawn_child(stage, (Transform::default(),));
        let mut doc = SceneDocument::new("test");

        let mut ext = DetachRootParent::default();
        ext.before(&mut world, root, &mut doc).unwrap();
        assert!(!world.has::<Parent>(root));
        ext.after(&mut world, root, &mut doc).unwrap();
        assert_eq!(world.get::<Parent>(root), Some(&Parent(stage)));
    }

    #[test]
    fn detach_root_parent_ignores_parentless_root() {
        let mut world = World::new();
        let root = world.spawn((Transform::default(),));
        let mut doc = SceneDocument::new("test");
        let mut ext = DetachRootParent::default();
        ext.before(&mut world, root, &mut doc).unwrap();
        ext.after(&mut world, root, &mut doc).unwrap();
        assert!(!world.has::<Parent>(root));
    }

    #[test]
    fn skip_nested_scenes_hides_only_model_children() {
        let mut world = World::new();
        let model = world.spawn((Transform::default(), GltfSource::new("chair.glb")));
        let mesh = world.spawn_child(model, (Transform::default(),));
        let group = world.spawn((Transform::default(),));
        let member = world.spawn_child(group, (Transform::default(),));

        let mut ext = SkipNestedScenes::default();
        ext.before_node(&mut world, model).unwrap();
        ext.before_node(&mut world, group).unwrap();
        assert!(world.get::<Children>(model).unwrap().0.is_empty());
        assert_eq!(world.get::<Children>(group).unwrap().0, vec![member]);

        ext.after_node(&mut world, model, None).unwrap();
        ext.after_node(&mut world, group, None).unwrap();
        assert_eq!(world.get::<Children>(model).unwrap().0, vec![mesh]);
    }

    #[test]
    fn default_order() {
        let names: Vec<_> = default_export_extensions().iter().map(|e| e.name()).collect();
        assert_eq!(names, vec!["SkipNestedScenes", "DetachRootParent"]);
    }
}
