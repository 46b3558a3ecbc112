//! # Scene Export — Entity Tree to Scene Document
//!
//! Walks the tree under a root entity depth-first. A node's index is assigned
//! only after all of its children have been appended, so indices are
//! post-order and a parent always comes after its descendants:
//!
//! ```text
//! root            nodes[2]  children: [1]
//! └─ a            nodes[1]  children: [0]
//!    └─ b         nodes[0]
//! scenes[0].nodes = [2]
//! ```
//!
//! Children are visited in their stored [`Children`](crate::ecs::Children)
//! order. The tree must be acyclic.

use std::any::TypeId;
use std::collections::{BTreeMap, BTreeSet};

use serde_json::Value;

use crate::config::ExportConfig;
use crate::ecs::hierarchy::{children_of, world_matrix};
use crate::ecs::{Entity, Parent, World};
use crate::error::ExportError;
use crate::gltf::document::{SceneDocument, SceneNode};
use crate::gltf::extension::ExportExtension;
use crate::gltf::urls::clean_storage_provider_urls;
use crate::math::{Mat4, Transform, Vec3, mat4_to_array};
use crate::registry::ComponentRegistry;
use crate::scene::components::Name;

/// Export the tree under `root`.
///
/// Extensions run in slice order. If any hook or the walk fails, every
/// `after*` hook whose `before*` counterpart already succeeded still runs,
/// and the first error is returned.
pub fn export_gltf_scene(
    world: &mut World,
    root: Entity,
    registry: &ComponentRegistry,
    extensions: &mut [Box<dyn ExportExtension>],
    config: &ExportConfig,
) -> Result<SceneDocument, ExportError> {
    if !world.is_alive(root) {
        return Err(ExportError::DeadEntity(root));
    }

    let mut document = SceneDocument::new(&config.generator);
    let mut first_error = None;

    let mut entered = 0;
    for extension in extensions.iter_mut() {
        if let Err(e) = extension.before(world, root, &mut document) {
            first_error = Some(e);
            break;
        }
        entered += 1;
    }

    if first_error.is_none() {
        let mut walker = Walker {
            world: &mut *world,
            registry,
            extensions: &mut *extensions,
            nodes: Vec::new(),
            extensions_used: BTreeSet::new(),
        };
        match walker.export_node(root) {
            Ok(root_index) => {
                document.nodes = walker.nodes;
                document.extensions_used = walker.extensions_used;
                document.scenes[0].nodes.push(root_index);
                if let Some(url) = &config.storage_provider_url {
                    for node in &mut document.nodes {
                        for payload in node.extensions.values_mut() {
                            clean_storage_provider_urls(payload, url);
                        }
                    }
                }
            }
            Err(e) => first_error = Some(e),
        }
    }

    for extension in extensions[..entered].iter_mut() {
        if let Err(e) = extension.after(world, root, &mut document) {
            log::debug!("export extension {} failed in after: {e}", extension.name());
            first_error.get_or_insert(e);
        }
    }

    match first_error {
        Some(e) => Err(e),
        None => {
            log::debug!(
                "exported {} nodes ({} extension ids) from {root}",
                document.nodes.len(),
                document.extensions_used.len()
            );
            Ok(document)
        }
    }
}

/// Local matrix written to the node of `entity`.
///
/// With a parent: `inverse(parent_world) * world`. Without one: identity
/// carrying only the entity's own scale. World matrices are composed from
/// the local transforms (see [`world_matrix`]), so the tree does not need a
/// prior [`propagate_transforms`](crate::ecs::propagate_transforms).
pub fn export_matrix(world: &World, entity: Entity) -> Mat4 {
    match world.get::<Parent>(entity) {
        Some(&Parent(parent)) => world_matrix(world, parent).inverse() * world_matrix(world, entity),
        None => {
            let scale = world
                .get::<Transform>(entity)
                .map(|t| t.scale)
                .unwrap_or(Vec3::ONE);
            Mat4::from_scale(scale)
        }
    }
}

struct Walker<'a> {
    world: &'a mut World,
    registry: &'a ComponentRegistry,
    extensions: &'a mut [Box<dyn ExportExtension>],
    nodes: Vec<SceneNode>,
    extensions_used: BTreeSet<String>,
}

impl Walker<'_> {
    fn export_node(&mut self, entity: Entity) -> Result<usize, ExportError> {
        if !self.world.is_alive(entity) {
            return Err(ExportError::DeadEntity(entity));
        }

        let mut first_error = None;
        let mut entered = 0;
        for extension in self.extensions.iter_mut() {
            if let Err(e) = extension.before_node(self.world, entity) {
                first_error = Some(e);
                break;
            }
            entered += 1;
        }

        let mut index = None;
        if first_error.is_none() {
            match self.build_node(entity) {
                Ok(i) => index = Some(i),
                Err(e) => first_error = Some(e),
            }
        }

        for extension in self.extensions[..entered].iter_mut() {
            let exported = match index {
                Some(i) => Some((i, &mut self.nodes[i])),
                None => None,
            };
            if let Err(e) = extension.after_node(self.world, entity, exported) {
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(index.unwrap_or_default()),
        }
    }

    fn build_node(&mut self, entity: Entity) -> Result<usize, ExportError> {
        let mut child_indices = Vec::new();
        for child in children_of(self.world, entity) {
            child_indices.push(self.export_node(child)?);
        }

        let index = self.nodes.len();
        self.nodes.push(SceneNode {
            name: self.world.get::<Name>(entity).map(|n| n.0.clone()),
            ..Default::default()
        });

        let mut payloads = BTreeMap::new();
        for component in self.registry.components_of(self.world, entity) {
            self.export_component(entity, component, index, &mut payloads)?;
        }

        let node = &mut self.nodes[index];
        node.extensions = payloads;
        node.children = child_indices;
        Ok(index)
    }

    fn export_component(
        &mut self,
        entity: Entity,
        component: TypeId,
        index: usize,
        payloads: &mut BTreeMap<String, Value>,
    ) -> Result<(), ExportError> {
        let mut first_error = None;
        let mut entered = 0;
        for extension in self.extensions.iter_mut() {
            let node = &mut self.nodes[index];
            if let Err(e) = extension.before_component(self.world, entity, component, node, index) {
                first_error = Some(e);
                break;
            }
            entered += 1;
        }

        if first_error.is_none() {
            if let Err(e) = self.write_component(entity, component, index, payloads) {
                first_error = Some(e);
            }
        }

        for extension in self.extensions[..entered].iter_mut() {
            let node = &mut self.nodes[index];
            if let Err(e) = extension.after_component(self.world, entity, component, node, index) {
                first_error.get_or_insert(e);
            }
        }

        first_error.map_or(Ok(()), Err)
    }

    fn write_component(
        &mut self,
        entity: Entity,
        component: TypeId,
        index: usize,
        payloads: &mut BTreeMap<String, Value>,
    ) -> Result<(), ExportError> {
        let Some(json_id) = self.registry.json_id(component) else {
            return Ok(());
        };

        if component == TypeId::of::<Transform>() {
            let matrix = export_matrix(self.world, entity);
            self.nodes[index].matrix = Some(mat4_to_array(&matrix));
            return Ok(());
        }

        let payload = self
            .registry
            .serialize(self.world, entity, component)
            .map_err(|source| ExportError::Component {
                component: self
                    .registry
                    .kind(component)
                    .map(|k| k.type_name)
                    .unwrap_or("<unknown>"),
                entity,
                source,
            })?;
        match payload {
            Some(value) => {
                payloads.insert(json_id.to_string(), value);
                self.extensions_used.insert(json_id.to_string());
            }
            None => log::debug!("{entity}: `{json_id}` has no payload, skipped"),
        }
        Ok(())
    }
}
