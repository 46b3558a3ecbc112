//! Pose normalization.
//!
//! [`enforce_t_pose`] rewrites limb rotations into a T-pose. Local rotations
//! alone do not fix rigs whose world matrices were baked in a different rest
//! pose, so the shoulder and upper leg subtrees also get their world matrices
//! overwritten with the target rotation. Nothing re-propagates afterwards;
//! callers that run [`propagate_transforms`](crate::ecs::propagate_transforms)
//! later replace those world matrices with ones derived from the new locals.

use std::f32::consts::{FRAC_PI_2, FRAC_PI_3, FRAC_PI_6, PI};

use crate::avatar::bones::HumanBone;
use crate::avatar::rig::BoneMapping;
use crate::ecs::hierarchy::subtree;
use crate::ecs::{Entity, GlobalTransform, Parent, World};
use crate::error::RetargetError;
use crate::math::{Mat4, Quat, Transform, euler_xyz};

fn set_local_rotation(world: &mut World, entity: Entity, rotation: Quat) {
    match world.get_mut::<Transform>(entity) {
        Some(t) => t.rotation = rotation,
        None => world.insert(entity, Transform::from_rotation(rotation)),
    }
}

fn set_subtree_world(world: &mut World, entity: Entity, matrix: Mat4) {
    for e in subtree(world, entity) {
        world.insert(e, GlobalTransform::from_matrix(matrix));
    }
}

/// Target local rotation of each posed bone.
pub fn t_pose_rotation(bone: HumanBone) -> Option<Quat> {
    let rotation = match bone {
        HumanBone::RightShoulder => euler_xyz(FRAC_PI_2, 0.0, FRAC_PI_2),
        HumanBone::LeftShoulder => euler_xyz(FRAC_PI_2, 0.0, -FRAC_PI_2),
        HumanBone::LeftUpperArm
        | HumanBone::RightUpperArm
        | HumanBone::LeftLowerArm
        | HumanBone::RightLowerArm
        | HumanBone::LeftLowerLeg
        | HumanBone::RightLowerLeg => Quat::IDENTITY,
        HumanBone::LeftUpperLeg | HumanBone::RightUpperLeg => euler_xyz(0.0, 0.0, PI),
        HumanBone::LeftFoot | HumanBone::RightFoot => euler_xyz(FRAC_PI_3, 0.0, 0.0),
        HumanBone::LeftToes | HumanBone::RightToes => euler_xyz(FRAC_PI_6, 0.0, 0.0),
        _ => return None,
    };
    Some(rotation)
}

const REQUIRED: &[HumanBone] = &[
    HumanBone::RightShoulder,
    HumanBone::LeftShoulder,
    HumanBone::LeftUpperArm,
    HumanBone::RightUpperArm,
    HumanBone::LeftLowerArm,
    HumanBone::RightLowerArm,
    HumanBone::LeftUpperLeg,
    HumanBone::RightUpperLeg,
    HumanBone::LeftLowerLeg,
    HumanBone::RightLowerLeg,
    HumanBone::LeftFoot,
    HumanBone::RightFoot,
];

/// Bones whose whole subtree gets its world matrix stomped.
const WORLD_OVERRIDES: &[HumanBone] = &[
    HumanBone::RightShoulder,
    HumanBone::LeftShoulder,
    HumanBone::LeftUpperLeg,
    HumanBone::RightUpperLeg,
];

/// Pose the mapped skeleton into a T-pose. Toes are optional; every other
/// posed bone must be mapped.
pub fn enforce_t_pose(world: &mut World, mapping: &BoneMapping) -> Result<(), RetargetError> {
    for &bone in REQUIRED {
        mapping.require(bone)?;
    }

    for &bone in REQUIRED.iter().chain([HumanBone::LeftToes, HumanBone::RightToes].iter()) {
        let (Some(entity), Some(rotation)) = (mapping.get(bone), t_pose_rotation(bone)) else {
            continue;
        };
        set_local_rotation(world, entity, rotation);
        if WORLD_OVERRIDES.contains(&bone) {
            set_subtree_world(world, entity, Mat4::from_quat(rotation));
        }
    }
    Ok(())
}

/// Rest-pose fix for rigs described by a humanoid extension: clears every
/// rotation under `root`, faces the model backwards in world space (except
/// the hips' parent), and turns the hips by π about Y.
pub fn normalize_humanoid_rest_pose(
    world: &mut World,
    root: Entity,
    mapping: &BoneMapping,
) -> Result<(), RetargetError> {
    let hips = mapping.require(HumanBone::Hips)?;
    let hips_parent = world.get::<Parent>(hips).map(|p| p.0);
    let flip = Quat::from_rotation_y(PI);

    for entity in subtree(world, root) {
        set_local_rotation(world, entity, Quat::IDENTITY);
        let world_matrix = if Some(entity) == hips_parent {
            Mat4::IDENTITY
        } else {
            Mat4::from_quat(flip)
        };
        world.insert(entity, GlobalTransform::from_matrix(world_matrix));
    }
    set_local_rotation(world, hips, flip);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::avatar::mixamo::resolve_mixamo;
    use crate::avatar::testing::spawn_mixamo_rig;
    use crate::ecs::propagate_transforms;
    use crate::math::mat4_approx_eq;

    fn world_rotation(world: &World, entity: Entity) -> Quat {
        let m = world.get::<GlobalTransform>(entity).unwrap().matrix;
        m.to_scale_rotation_translation().1
    }

    fn same_rotation(a: Quat, b: Quat) -> bool {
        a.dot(b).abs() > 1.0 - 1e-5
    }

    #[test]
    fn shoulders_and_legs_reach_target_world_rotation() {
        let mut world = World::new();
        let rig = spawn_mixamo_rig(&mut world, "mixamorig:");
        propagate_transforms(&mut world);
        let mapping = resolve_mixamo(&mut world, rig.root).unwrap();
        enforce_t_pose(&mut world, &mapping).unwrap();

        let right = euler_xyz(FRAC_PI_2, 0.0, FRAC_PI_2);
        let shoulder = mapping.get(HumanBone::RightShoulder).unwrap();
        assert!(same_rotation(world_rotation(&world, shoulder), right));
        let hand = mapping.get(HumanBone::RightHand).unwrap();
        assert!(same_rotation(world_rotation(&world, hand), right));
        assert!(same_rotation(world_rotation(&world, rig.prop), right));

        let leg = mapping.get(HumanBone::LeftUpperLeg).unwrap();
        assert!(same_rotation(world_rotation(&world, leg), euler_xyz(0.0, 0.0, PI)));

        let foot = mapping.get(HumanBone::LeftFoot).unwrap();
        let local = world.get::<Transform>(foot).unwrap().rotation;
        assert!(same_rotation(local, euler_xyz(FRAC_PI_3, 0.0, 0.0)));
        let elbow = mapping.get(HumanBone::LeftLowerArm).unwrap();
        assert_eq!(world.get::<Transform>(elbow).unwrap().rotation, Quat::IDENTITY);
    }

    #[test]
    fn target_is_independent_of_prior_pose() {
        let mut world = World::new();
        let a = spawn_mixamo_rig(&mut world, "");
        let b = spawn_mixamo_rig(&mut world, "");
        for entity in subtree(&world, b.root) {
            if let Some(t) = world.get_mut::<Transform>(entity) {
                t.rotation = Quat::from_rotation_x(0.4) * t.rotation * Quat::from_rotation_z(-1.1);
            }
        }
        propagate_transforms(&mut world);

        let ma = resolve_mixamo(&mut world, a.root).unwrap();
        let mb = resolve_mixamo(&mut world, b.root).unwrap();
        enforce_t_pose(&mut world, &ma).unwrap();
        enforce_t_pose(&mut world, &mb).unwrap();

        for bone in [HumanBone::LeftShoulder, HumanBone::RightUpperLeg] {
            let wa = world.get::<GlobalTransform>(ma.get(bone).unwrap()).unwrap().matrix;
            let wb = world.get::<GlobalTransform>(mb.get(bone).unwrap()).unwrap().matrix;
            assert!(mat4_approx_eq(&wa, &wb, 1e-5), "{bone}");
        }
    }

    #[test]
    fn missing_limb_is_reported() {
        let mut world = World::new();
        let rig = spawn_mixamo_rig(&mut world, "mixamorig");
        let foot = world
            .entities_with::<crate::scene::components::Name>()
            .into_iter()
            .find(|&e| {
                world
                    .get::<crate::scene::components::Name>(e)
                    .is_some_and(|n| n.as_str() == "mixamorigRightFoot")
            })
            .unwrap();
        world.despawn_recursive(foot);

        let mapping = resolve_mixamo(&mut world, rig.root).unwrap();
        assert!(matches!(
            enforce_t_pose(&mut world, &mapping),
            Err(RetargetError::MissingBone(HumanBone::RightFoot))
        ));
    }

    #[test]
    fn toes_are_optional() {
        let mut world = World::new();
        let rig = spawn_mixamo_rig(&mut world, "mixamorig");
        let mut mapping = resolve_mixamo(&mut world, rig.root).unwrap();
        let mut trimmed = BoneMapping::new();
        for (bone, entity) in mapping.iter() {
            if !matches!(bone, HumanBone::LeftToes | HumanBone::RightToes) {
                trimmed.insert(bone, entity).unwrap();
            }
        }
        mapping = trimmed;
        assert!(enforce_t_pose(&mut world, &mapping).is_ok());
    }

    #[test]
    fn humanoid_rest_pose_flips_everything_but_hips_parent() {
        let mut world = World::new();
        let rig = spawn_mixamo_rig(&mut world, "mixamorig");
        let mapping = resolve_mixamo(&mut world, rig.root).unwrap();
        normalize_humanoid_rest_pose(&mut world, rig.root, &mapping).unwrap();

        let flip = Quat::from_rotation_y(PI);
        assert_eq!(world.get::<GlobalTransform>(rig.root).unwrap().matrix, Mat4::IDENTITY);
        assert!(same_rotation(world_rotation(&world, rig.hips), flip));
        assert!(same_rotation(world.get::<Transform>(rig.hips).unwrap().rotation, flip));
        assert_eq!(world.get::<Transform>(rig.right_arm).unwrap().rotation, Quat::IDENTITY);
    }
}
