//! # Avatar Retargeting
//!
//! Maps an imported skeleton onto the canonical [`HumanBone`] set and poses
//! it:
//!
//! - documents with a humanoid extension use its explicit bone list and get
//!   a rest-pose fix ([`normalize_humanoid_rest_pose`]);
//! - everything else is resolved from Mixamo-style joint names and forced
//!   into a T-pose ([`enforce_t_pose`]).
//!
//! The resulting [`AvatarRig`] is attached to the avatar's root entity.

pub mod bones;
pub mod mixamo;
pub mod pose;
pub mod rig;
pub mod vrm;

pub use bones::HumanBone;
pub use mixamo::{find_hips, resolve_mixamo};
pub use pose::{enforce_t_pose, normalize_humanoid_rest_pose};
pub use rig::{AvatarRig, BoneMapping, RigSource};
pub use vrm::resolve_humanoid;

use crate::ecs::{Entity, World};
use crate::error::RetargetError;
use crate::gltf::ImportedScene;

/// Resolve and pose an imported avatar, attaching the rig to its root.
pub fn setup_avatar_rig(
    world: &mut World,
    imported: &ImportedScene,
    name: &str,
) -> Result<AvatarRig, RetargetError> {
    match resolve_humanoid(imported)? {
        Some(mapping) => {
            normalize_humanoid_rest_pose(world, imported.root, &mapping)?;
            let rig = AvatarRig {
                name: name.to_string(),
                mapping,
                source: RigSource::Vrm,
            };
            log::info!("rigged `{name}` from humanoid extension ({} bones)", rig.mapping.len());
            world.insert(imported.root, rig.clone());
            Ok(rig)
        }
        None => retarget_mixamo(world, imported.root, name),
    }
}

/// Resolve Mixamo-style names under `root`, T-pose the result, and attach
/// the rig to `root`.
pub fn retarget_mixamo(
    world: &mut World,
    root: Entity,
    name: &str,
) -> Result<AvatarRig, RetargetError> {
    let mapping = resolve_mixamo(world, root)?;
    enforce_t_pose(world, &mapping)?;
    let rig = AvatarRig {
        name: name.to_string(),
        mapping,
        source: RigSource::Mixamo,
    };
    log::info!("rigged `{name}` from joint names ({} bones)", rig.mapping.len());
    world.insert(root, rig.clone());
    Ok(rig)
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExportConfig;
    use crate::gltf::import_scene_document;
    use crate::gltf::SceneDocument;
    use crate::registry::ComponentRegistry;
    use testing::spawn_mixamo_rig;

    #[test]
    fn mixamo_rig_is_attached_to_root() {
        let mut world = World::new();
        let rig = spawn_mixamo_rig(&mut world, "mixamorig:");
        let attached = retarget_mixamo(&mut world, rig.root, "ybot").unwrap();
        assert_eq!(attached.source, RigSource::Mixamo);
        assert_eq!(world.get::<AvatarRig>(rig.root), Some(&attached));
        assert_eq!(attached.mapping.get(HumanBone::Hips), Some(rig.hips));
    }

    #[test]
    fn reloading_replaces_the_rig() {
        let mut world = World::new();
        let rig = spawn_mixamo_rig(&mut world, "");
        retarget_mixamo(&mut world, rig.root, "first").unwrap();
        retarget_mixamo(&mut world, rig.root, "second").unwrap();
        assert_eq!(world.get::<AvatarRig>(rig.root).unwrap().name, "second");
    }

    #[test]
    fn humanoid_extension_takes_precedence() {
        let doc = SceneDocument::from_json(
            br#"{
                "asset": {"version": "2.0"},
                "scenes": [{"nodes": [0]}],
                "nodes": [
                    {"name": "Armature", "children": [1]},
                    {"name": "J_Bip_C_Hips", "children": [2]},
                    {"name": "J_Bip_C_Spine"}
                ],
                "extensions": {"VRMC_vrm": {"humanoid": {"humanBones": {
                    "hips": {"node": 1}, "spine": {"node": 2}
                }}}}
            }"#,
        )
        .unwrap();
        let mut world = World::new();
        let imported = import_scene_document(
            &mut world,
            &doc,
            &ComponentRegistry::with_builtins(),
            &ExportConfig::default(),
        )
        .unwrap();

        let rig = setup_avatar_rig(&mut world, &imported, "vrm").unwrap();
        assert_eq!(rig.source, RigSource::Vrm);
        assert_eq!(rig.mapping.get(HumanBone::Spine), imported.entity(2));
        assert!(world.has::<AvatarRig>(imported.root));
    }
}
