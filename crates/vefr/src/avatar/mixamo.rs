//! Resolving Mixamo-style bone names onto the humanoid bone set.
//!
//! Rigs exported from the usual DCC pipelines name their joints
//! `mixamorig:Hips`, `mixamorig1:Spine`, `mixamorigLeftArm`, or drop the
//! prefix entirely (`Hips`). The hips bone decides how every other name is
//! normalized:
//!
//! ```text
//! hips name          prefix added   char 9 dropped   "LeftArm" node → lookup key
//! Hips               mixamorig      no               mixamorigLeftArm
//! mixamorigHips      -              no               mixamorigLeftArm
//! mixamorig:Hips     -              yes (':')        mixamorigLeftArm
//! mixamorig1:Hips    -              yes ('1')        mixamorigLeftArm
//! ```
//!
//! Whether char 9 is dropped is guessed from the hips name alone: anything
//! other than `h`/`p` at offset 9 counts as a decoration. Rigs whose names
//! diverge from their hips bone resolve incorrectly.

use crate::avatar::bones::HumanBone;
use crate::avatar::rig::BoneMapping;
use crate::ecs::hierarchy::{find_in_subtree, subtree};
use crate::ecs::{Entity, GlobalTransform, World};
use crate::error::RetargetError;
use crate::math::{Mat4, Quat, Transform};
use crate::scene::components::Name;

pub const MIXAMO_PREFIX: &str = "mixamorig";

/// Offset of the character that marks a decorated name (`mixamorig1:`).
const DECORATION_OFFSET: usize = 9;

/// Normalized Mixamo joint name → humanoid bone.
pub const MIXAMO_TO_HUMAN_BONE: &[(&str, HumanBone)] = &[
    ("mixamorigHips", HumanBone::Hips),
    ("mixamorigSpine", HumanBone::Spine),
    ("mixamorigSpine1", HumanBone::Chest),
    ("mixamorigSpine2", HumanBone::UpperChest),
    ("mixamorigNeck", HumanBone::Neck),
    ("mixamorigHead", HumanBone::Head),
    ("mixamorigLeftShoulder", HumanBone::LeftShoulder),
    ("mixamorigLeftArm", HumanBone::LeftUpperArm),
    ("mixamorigLeftForeArm", HumanBone::LeftLowerArm),
    ("mixamorigLeftHand", HumanBone::LeftHand),
    ("mixamorigLeftHandThumb1", HumanBone::LeftThumbMetacarpal),
    ("mixamorigLeftHandThumb2", HumanBone::LeftThumbProximal),
    ("mixamorigLeftHandThumb3", HumanBone::LeftThumbDistal),
    ("mixamorigLeftHandIndex1", HumanBone::LeftIndexProximal),
    ("mixamorigLeftHandIndex2", HumanBone::LeftIndexIntermediate),
    ("mixamorigLeftHandIndex3", HumanBone::LeftIndexDistal),
    ("mixamorigLeftHandMiddle1", HumanBone::LeftMiddleProximal),
    ("mixamorigLeftHandMiddle2", HumanBone::LeftMiddleIntermediate),
    ("mixamorigLeftHandMiddle3", HumanBone::LeftMiddleDistal),
    ("mixamorigLeftHandRing1", HumanBone::LeftRingProximal),
    ("mixamorigLeftHandRing2", HumanBone::LeftRingIntermediate),
    ("mixamorigLeftHandRing3", HumanBone::LeftRingDistal),
    ("mixamorigLeftHandPinky1", HumanBone::LeftLittleProximal),
    ("mixamorigLeftHandPinky2", HumanBone::LeftLittleIntermediate),
    ("mixamorigLeftHandPinky3", HumanBone::LeftLittleDistal),
    ("mixamorigRightShoulder", HumanBone::RightShoulder),
    ("mixamorigRightArm", HumanBone::RightUpperArm),
    ("mixamorigRightForeArm", HumanBone::RightLowerArm),
    ("mixamorigRightHand", HumanBone::RightHand),
    ("mixamorigRightHandThumb1", HumanBone::RightThumbMetacarpal),
    ("mixamorigRightHandThumb2", HumanBone::RightThumbProximal),
    ("mixamorigRightHandThumb3", HumanBone::RightThumbDistal),
    ("mixamorigRightHandIndex1", HumanBone::RightIndexProximal),
    ("mixamorigRightHandIndex2", HumanBone::RightIndexIntermediate),
    ("mixamorigRightHandIndex3", HumanBone::RightIndexDistal),
    ("mixamorigRightHandMiddle1", HumanBone::RightMiddleProximal),
    ("mixamorigRightHandMiddle2", HumanBone::RightMiddleIntermediate),
    ("mixamorigRightHandMiddle3", HumanBone::RightMiddleDistal),
    ("mixamorigRightHandRing1", HumanBone::RightRingProximal),
    ("mixamorigRightHandRing2", HumanBone::RightRingIntermediate),
    ("mixamorigRightHandRing3", HumanBone::RightRingDistal),
    ("mixamorigRightHandPinky1", HumanBone::RightLittleProximal),
    ("mixamorigRightHandPinky2", HumanBone::RightLittleIntermediate),
    ("mixamorigRightHandPinky3", HumanBone::RightLittleDistal),
    ("mixamorigLeftUpLeg", HumanBone::LeftUpperLeg),
    ("mixamorigLeftLeg", HumanBone::LeftLowerLeg),
    ("mixamorigLeftFoot", HumanBone::LeftFoot),
    ("mixamorigLeftToeBase", HumanBone::LeftToes),
    ("mixamorigRightUpLeg", HumanBone::RightUpperLeg),
    ("mixamorigRightLeg", HumanBone::RightLowerLeg),
    ("mixamorigRightFoot", HumanBone::RightFoot),
    ("mixamorigRightToeBase", HumanBone::RightToes),
];

pub fn lookup(normalized: &str) -> Option<HumanBone> {
    MIXAMO_TO_HUMAN_BONE
        .iter()
        .find(|(name, _)| *name == normalized)
        .map(|&(_, bone)| bone)
}

/// Remove every `:`.
pub fn strip_colons(name: &str) -> String {
    name.replace(':', "")
}

/// Per-skeleton naming rule derived from the hips bone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NameNormalizer {
    pub add_prefix: bool,
    pub drop_decoration: bool,
}

impl NameNormalizer {
    pub fn from_hips_name(hips: &str) -> Self {
        let add_prefix = !hips.contains(MIXAMO_PREFIX);
        let decoration = hips.chars().nth(DECORATION_OFFSET);
        let drop_decoration =
            !add_prefix && !matches!(decoration, Some('h' | 'H' | 'p' | 'P'));
        Self {
            add_prefix,
            drop_decoration,
        }
    }

    /// Table key for a joint name.
    pub fn normalize(&self, name: &str) -> String {
        let mut bone = if self.add_prefix {
            format!("{MIXAMO_PREFIX}{name}")
        } else {
            name.to_string()
        };
        if self.drop_decoration {
            bone = bone
                .chars()
                .enumerate()
                .filter(|&(i, _)| i != DECORATION_OFFSET)
                .map(|(_, c)| c)
                .collect();
        }
        strip_colons(&bone)
    }
}

fn name_of(world: &World, entity: Entity) -> Option<&str> {
    world.get::<Name>(entity).map(Name::as_str)
}

/// First descendant of `root` (pre-order, root excluded) whose name contains
/// `hip` or `pelvis`, ignoring case.
pub fn find_hips(world: &World, root: Entity) -> Option<Entity> {
    find_in_subtree(world, root, false, |world, entity| {
        name_of(world, entity).is_some_and(|name| {
            let lower = name.to_lowercase();
            lower.contains("hip") || lower.contains("pelvis")
        })
    })
}

/// Map the named joints under `root` onto humanoid bones.
///
/// `root` itself is never mapped. Unknown names are skipped. As a side effect
/// every node's world matrix (root included) is reset to identity and every
/// mapped bone's local rotation is cleared, so the pose normalizer starts
/// from a neutral rig.
pub fn resolve_mixamo(world: &mut World, root: Entity) -> Result<BoneMapping, RetargetError> {
    let hips = find_hips(world, root).ok_or(RetargetError::MissingHips)?;
    let hips_name = name_of(world, hips).unwrap_or_default().to_string();
    let normalizer = NameNormalizer::from_hips_name(&hips_name);
    log::debug!("hips `{hips_name}` resolved as {normalizer:?}");

    let mut mapping = BoneMapping::new();
    for entity in subtree(world, root) {
        world.insert(entity, GlobalTransform::from_matrix(Mat4::IDENTITY));
        if entity == root {
            continue;
        }

        let Some(name) = name_of(world, entity) else {
            continue;
        };
        let key = normalizer.normalize(name);
        let Some(bone) = lookup(&key) else {
            log::debug!("`{name}` is not a humanoid joint");
            continue;
        };
        if mapping.contains(bone) {
            log::warn!("`{name}` maps to {bone}, which is already taken; skipped");
            continue;
        }
        mapping.insert(bone, entity)?;

        match world.get_mut::<Transform>(entity) {
            Some(t) => t.rotation = Quat::IDENTITY,
            None => world.insert(entity, Transform::default()),
        }
    }
    Ok(mapping)
}
