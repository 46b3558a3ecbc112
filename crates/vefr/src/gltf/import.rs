//! # Scene Import — glTF to Entity Tree
//!
//! Builds an entity tree from a glTF document under a freshly spawned root
//! entity. Each node becomes one entity with a [`Transform`], an optional
//! [`Name`], a [`Bone`] marker if it is a skin joint, and one component per
//! node extension the registry recognises. Unknown extension ids are skipped.
//!
//! Document-level extensions (a humanoid description, for instance) are
//! returned untouched in [`ImportedScene::extensions`].

use std::collections::HashSet;

use serde_json::{Map, Value};

use crate::config::ExportConfig;
use crate::ecs::hierarchy::propagate_transforms;
use crate::ecs::{Entity, World};
use crate::error::ImportError;
use crate::gltf::document::SceneDocument;
use crate::gltf::urls::parse_storage_provider_urls;
use crate::math::{Quat, Transform, Vec3};
use crate::registry::ComponentRegistry;
use crate::scene::components::{Bone, Name};

/// Result of an import.
#[derive(Debug)]
pub struct ImportedScene {
    /// Parent of every top-level node.
    pub root: Entity,
    /// Node index → spawned entity. `None` for nodes outside the default scene.
    pub nodes: Vec<Option<Entity>>,
    pub extensions: Map<String, Value>,
}

impl ImportedScene {
    pub fn entity(&self, node: usize) -> Option<Entity> {
        self.nodes.get(node).copied().flatten()
    }
}

/// Format-neutral view of one node.
struct NodeData {
    name: Option<String>,
    transform: Transform,
    children: Vec<usize>,
    extensions: Vec<(String, Value)>,
    joint: bool,
}

/// Import one of this crate's own scene documents.
pub fn import_scene_document(
    world: &mut World,
    document: &SceneDocument,
    registry: &ComponentRegistry,
    config: &ExportConfig,
) -> Result<ImportedScene, ImportError> {
    let nodes: Vec<NodeData> = document
        .nodes
        .iter()
        .map(|n| NodeData {
            name: n.name.clone(),
            transform: Transform::from_matrix(n.local_matrix()),
            children: n.children.clone(),
            extensions: n
                .extensions
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            joint: false,
        })
        .collect();
    if document.scenes.is_empty() {
        return Err(ImportError::NoScene);
    }
    let roots = document.root_nodes().to_vec();
    spawn_tree(world, &nodes, &roots, document.extensions.clone(), registry, config)
}

/// Import a `.gltf` (JSON) or `.glb` document. Buffers are not loaded.
#[cfg(feature = "import")]
pub fn import_gltf_scene(
    world: &mut World,
    bytes: &[u8],
    registry: &ComponentRegistry,
    config: &ExportConfig,
) -> Result<ImportedScene, ImportError> {
    let gltf = ::gltf::Gltf::from_slice_without_validation(bytes)?;
    let document = &gltf.document;

    let joints: HashSet<usize> = document
        .skins()
        .flat_map(|skin| skin.joints().map(|j| j.index()).collect::<Vec<_>>())
        .collect();

    let nodes: Vec<NodeData> = document
        .nodes()
        .map(|node| {
            let (t, r, s) = node.transform().decomposed();
            NodeData {
                name: node.name().map(str::to_string),
                transform: Transform {
                    translation: Vec3::from_array(t),
                    rotation: Quat::from_array(r),
                    scale: Vec3::from_array(s),
                },
                children: node.children().map(|c| c.index()).collect(),
                extensions: node
                    .extensions()
                    .map(|m| m.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
                    .unwrap_or_default(),
                joint: joints.contains(&node.index()),
            }
        })
        .collect();

    let scene = document
        .default_scene()
        .or_else(|| document.scenes().next())
        .ok_or(ImportError::NoScene)?;
    let roots: Vec<usize> = scene.nodes().map(|n| n.index()).collect();
    let extensions = document.extensions().cloned().unwrap_or_default();

    spawn_tree(world, &nodes, &roots, extensions, registry, config)
}

/// Read and import a file from disk.
#[cfg(feature = "import")]
pub fn import_gltf_file(
    world: &mut World,
    path: impl AsRef<std::path::Path>,
    registry: &ComponentRegistry,
    config: &ExportConfig,
) -> Result<ImportedScene, ImportError> {
    let bytes = std::fs::read(path)?;
    import_gltf_scene(world, &bytes, registry, config)
}

fn spawn_tree(
    world: &mut World,
    nodes: &[NodeData],
    roots: &[usize],
    extensions: Map<String, Value>,
    registry: &ComponentRegistry,
    config: &ExportConfig,
) -> Result<ImportedScene, ImportError> {
    let root = world.spawn((Transform::default(),));
    let mut spawned = vec![None; nodes.len()];
    let mut seen = HashSet::new();

    let mut stack: Vec<(usize, Entity)> = roots.iter().rev().map(|&i| (i, root)).collect();
    while let Some((index, parent)) = stack.pop() {
        let Some(data) = nodes.get(index) else {
            log::warn!("node index {index} out of range, skipped");
            continue;
        };
        if !seen.insert(index) {
            log::warn!("node {index} is referenced twice, second reference skipped");
            continue;
        }

        let entity = world.spawn_child(parent, (data.transform,));
        if let Some(name) = &data.name {
            world.insert(entity, Name::new(name.clone()));
        }
        if data.joint {
            world.insert(entity, Bone);
        }
        for (id, payload) in &data.extensions {
            let mut payload = payload.clone();
            if let Some(url) = &config.storage_provider_url {
                parse_storage_provider_urls(&mut payload, url);
            }
            let known = registry
                .insert_payload(world, entity, id, payload)
                .map_err(|source| ImportError::Payload {
                    id: id.clone(),
                    node: index,
                    source,
                })?;
            if !known {
                log::debug!("node {index}: unknown extension `{id}` skipped");
            }
        }

        spawned[index] = Some(entity);
        stack.extend(data.children.iter().rev().map(|&c| (c, entity)));
    }

    propagate_transforms(world);
    log::debug!(
        "imported {} of {} nodes under {root}",
        seen.len(),
        nodes.len()
    );
    Ok(ImportedScene {
        root,
        nodes: spawned,
        extensions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::hierarchy::children_of;
    use crate::gltf::export::export_gltf_scene;
    use crate::gltf::extension::default_export_extensions;
    use crate::scene::components::{GltfSource, SpawnPoint};

    #[test]
    fn exported_scene_imports_back() {
        let mut world = World::new();
        let root = world.spawn((Transform::default(), Name::new("root")));
        let spawn = world.spawn_child(
            root,
            (
                Transform::from_xyz(0.0, 0.0, 5.0),
                Name::new("spawn"),
                SpawnPoint {
                    permissioned_users: vec!["u1".into()],
                },
            ),
        );
        world.spawn_child(spawn, (Transform::from_xyz(1.0, 0.0, 0.0), Name::new("marker")));
        propagate_transforms(&mut world);

        let registry = ComponentRegistry::with_builtins();
        let config = ExportConfig::default();
        let doc = export_gltf_scene(
            &mut world,
            root,
            &registry,
            &mut default_export_extensions(),
            &config,
        )
        .unwrap();

        let mut target = World::new();
        let imported = import_scene_document(&mut target, &doc, &registry, &config).unwrap();
        let top = children_of(&target, imported.root);
        assert_eq!(top.len(), 1);
        assert_eq!(target.get::<Name>(top[0]).unwrap().as_str(), "root");

        let spawn_node = doc.nodes.iter().position(|n| n.name.as_deref() == Some("spawn")).unwrap();
        let spawn_entity = imported.entity(spawn_node).unwrap();
        assert_eq!(
            target.get::<SpawnPoint>(spawn_entity).unwrap().permissioned_users,
            vec!["u1".to_string()]
        );
        let t = target.get::<Transform>(spawn_entity).unwrap();
        assert!(t.translation.abs_diff_eq(Vec3::new(0.0, 0.0, 5.0), 1e-5));
    }

    #[test]
    fn unknown_extensions_are_skipped_and_urls_expanded() {
        let doc = SceneDocument::from_json(
            br#"{
                "asset": {"version": "2.0"},
                "scenes": [{"nodes": [0]}],
                "nodes": [{
                    "name": "chair",
                    "extensions": {
                        "EE_model": {"src": "__$project$__/acme/park/chair.glb"},
                        "EE_future_thing": {"x": 1}
                    }
                }]
            }"#,
        )
        .unwrap();
        let config = ExportConfig::default().with_storage_provider_url("https://cdn.example.com");
        let mut world = World::new();
        let imported =
            import_scene_document(&mut world, &doc, &ComponentRegistry::with_builtins(), &config)
                .unwrap();
        let chair = imported.entity(0).unwrap();
        assert_eq!(
            world.get::<GltfSource>(chair).unwrap().src,
            "https://cdn.example.com/projects/acme/park/chair.glb"
        );
    }

    #[test]
    fn malformed_payload_reports_node() {
        let doc = SceneDocument::from_json(
            br#"{"asset":{"version":"2.0"},"scenes":[{"nodes":[0]}],
                 "nodes":[{"extensions":{"EE_spawn_point":{"permissionedUsers":"all"}}}]}"#,
        )
        .unwrap();
        let mut world = World::new();
        let err = import_scene_document(
            &mut world,
            &doc,
            &ComponentRegistry::with_builtins(),
            &ExportConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ImportError::Payload { node: 0, .. }));
    }

    #[cfg(feature = "import")]
    #[test]
    fn gltf_import_marks_joints_and_reads_document_extensions() {
        let json = br#"{
            "asset": {"version": "2.0"},
            "scene": 0,
            "scenes": [{"nodes": [0]}],
            "nodes": [
                {"name": "Armature", "children": [1]},
                {"name": "Hips", "translation": [0.0, 1.0, 0.0], "children": [2]},
                {"name": "Spine"}
            ],
            "skins": [{"joints": [1, 2]}],
            "extensionsUsed": ["VRMC_vrm"],
            "extensions": {"VRMC_vrm": {"humanoid": {"humanBones": {"hips": {"node": 1}}}}}
        }"#;
        let mut world = World::new();
        let imported = import_gltf_scene(
            &mut world,
            json,
            &ComponentRegistry::with_builtins(),
            &ExportConfig::default(),
        )
        .unwrap();

        let hips = imported.entity(1).unwrap();
        assert!(world.has::<Bone>(hips));
        assert!(!world.has::<Bone>(imported.entity(0).unwrap()));
        assert_eq!(world.get::<Transform>(hips).unwrap().translation, Vec3::Y);
        assert!(imported.extensions.contains_key("VRMC_vrm"));
    }
}
