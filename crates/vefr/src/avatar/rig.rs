//! Bone mappings and the rig component.

use std::collections::{BTreeMap, HashMap};

use crate::avatar::bones::HumanBone;
use crate::ecs::Entity;
use crate::error::RetargetError;

/// Canonical bone ↔ entity, one skeleton's worth. No entity carries two
/// bones.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoneMapping {
    bones_to_entities: BTreeMap<HumanBone, Entity>,
    entities_to_bones: HashMap<Entity, HumanBone>,
}

impl BoneMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map `bone` to `entity`, replacing any earlier entity for `bone`.
    pub fn insert(&mut self, bone: HumanBone, entity: Entity) -> Result<(), RetargetError> {
        if let Some(&existing) = self.entities_to_bones.get(&entity) {
            if existing != bone {
                return Err(RetargetError::DuplicateEntity {
                    entity,
                    first: existing,
                    second: bone,
                });
            }
        }
        if let Some(previous) = self.bones_to_entities.insert(bone, entity) {
            self.entities_to_bones.remove(&previous);
        }
        self.entities_to_bones.insert(entity, bone);
        Ok(())
    }

    pub fn get(&self, bone: HumanBone) -> Option<Entity> {
        self.bones_to_entities.get(&bone).copied()
    }

    pub fn require(&self, bone: HumanBone) -> Result<Entity, RetargetError> {
        self.get(bone).ok_or(RetargetError::MissingBone(bone))
    }

    pub fn bone_of(&self, entity: Entity) -> Option<HumanBone> {
        self.entities_to_bones.get(&entity).copied()
    }

    pub fn contains(&self, bone: HumanBone) -> bool {
        self.bones_to_entities.contains_key(&bone)
    }

    pub fn len(&self) -> usize {
        self.bones_to_entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bones_to_entities.is_empty()
    }

    /// Mapped bones in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (HumanBone, Entity)> + '_ {
        self.bones_to_entities.iter().map(|(&b, &e)| (b, e))
    }
}

/// Where a rig's mapping came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RigSource {
    /// A humanoid extension in the model document.
    Vrm,
    /// Resolved from Mixamo-style bone names.
    Mixamo,
}

/// Attached to an avatar's root entity. Replaced whenever a new skeleton is
/// loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct AvatarRig {
    pub name: String,
    pub mapping: BoneMapping,
    pub source: RigSource,
}
