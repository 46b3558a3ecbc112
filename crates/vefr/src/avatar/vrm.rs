//! Reading the humanoid bone list from a model's `VRM` (0.x) or `VRMC_vrm`
//! (1.0) document extension.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::avatar::bones::HumanBone;
use crate::avatar::rig::BoneMapping;
use crate::error::RetargetError;
use crate::gltf::ImportedScene;

pub const VRM0_EXTENSION: &str = "VRM";
pub const VRM1_EXTENSION: &str = "VRMC_vrm";

#[derive(Deserialize)]
struct Vrm {
    humanoid: Humanoid,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Humanoid {
    human_bones: HumanBones,
}

/// VRM 0.x writes a `[{ bone, node }]` list, VRM 1.0 a `{ bone: { node } }`
/// map. The shape decides, not the extension key.
#[derive(Deserialize)]
#[serde(untagged)]
enum HumanBones {
    List(Vec<ListedBone>),
    Map(BTreeMap<String, MappedBone>),
}

#[derive(Deserialize)]
struct ListedBone {
    bone: String,
    node: usize,
}

#[derive(Deserialize)]
struct MappedBone {
    node: usize,
}

fn known<E: std::fmt::Display>(
    parsed: Result<HumanBone, E>,
    node: usize,
) -> Option<(HumanBone, usize)> {
    match parsed {
        Ok(bone) => Some((bone, node)),
        Err(e) => {
            log::warn!("{e}, skipped");
            None
        }
    }
}

/// `(bone, node index)` pairs, or `None` when the document has no humanoid
/// extension. `VRM` takes precedence over `VRMC_vrm` when both are present.
/// List-form names go through the VRM 0.x renames; unknown names are
/// skipped.
pub fn humanoid_bone_nodes(
    extensions: &Map<String, Value>,
) -> Result<Option<Vec<(HumanBone, usize)>>, RetargetError> {
    let Some((id, value)) = [VRM0_EXTENSION, VRM1_EXTENSION]
        .into_iter()
        .find_map(|id| extensions.get(id).map(|v| (id, v)))
    else {
        return Ok(None);
    };
    let vrm = Vrm::deserialize(value)
        .map_err(|e| RetargetError::Humanoid(format!("{id}: {e}")))?;

    let pairs = match vrm.humanoid.human_bones {
        HumanBones::List(bones) => bones
            .into_iter()
            .filter_map(|b| known(HumanBone::from_vrm0_name(&b.bone), b.node))
            .collect(),
        HumanBones::Map(bones) => bones
            .into_iter()
            .filter_map(|(name, b)| known(name.parse::<HumanBone>(), b.node))
            .collect(),
    };
    Ok(Some(pairs))
}

/// Bone mapping from an imported document's humanoid extension.
pub fn resolve_humanoid(imported: &ImportedScene) -> Result<Option<BoneMapping>, RetargetError> {
    let Some(pairs) = humanoid_bone_nodes(&imported.extensions)? else {
        return Ok(None);
    };
    let mut mapping = BoneMapping::new();
    for (bone, node) in pairs {
        let entity = imported.entity(node).ok_or(RetargetError::UnknownNode(node))?;
        mapping.insert(bone, entity)?;
    }
    Ok(Some(mapping))
}
