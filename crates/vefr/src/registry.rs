//! # Component Serializer Registry
//!
//! Maps component types to their stable wire identifier (`EE_*`) and to
//! type-erased serialize/deserialize functions. Built once at startup with
//! [`ComponentRegistry::with_builtins`] (plus any [`ComponentRegistry::register`]
//! calls), then only read.
//!
//! ```text
//! TypeId(Transform)     → "EE_transform"      (special-cased by the exporter)
//! TypeId(MediaSettings) → "EE_media_settings"
//! TypeId(Name)          → no id               (fills node.name instead)
//! ```

use std::any::{Any, TypeId};
use std::collections::HashMap;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::ecs::{BoxedComponent, Entity, World};
use crate::math::Transform;
use crate::scene::components::{
    Bone, GltfSource, Interactable, MediaSettings, Name, SceneSettings, SpawnPoint, VisualScript,
};

/// A component kind that can appear in a scene document.
pub trait SceneComponent: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Wire identifier, used as the node extension key. `None` keeps the
    /// component out of documents.
    const JSON_ID: Option<&'static str>;

    /// JSON payload for this value. `Ok(None)` means "nothing to write".
    fn to_payload(&self) -> serde_json::Result<Option<Value>> {
        let value = serde_json::to_value(self)?;
        Ok((!value.is_null()).then_some(value))
    }

    fn from_payload(value: Value) -> serde_json::Result<Self> {
        serde_json::from_value(value)
    }
}

impl SceneComponent for Transform {
    const JSON_ID: Option<&'static str> = Some("EE_transform");
}

type SerializeFn = fn(&dyn Any) -> serde_json::Result<Option<Value>>;
type DeserializeFn = fn(Value) -> serde_json::Result<BoxedComponent>;

/// One registered component kind.
#[derive(Clone, Copy)]
pub struct ComponentKind {
    pub type_id: TypeId,
    pub type_name: &'static str,
    pub json_id: Option<&'static str>,
    serialize: SerializeFn,
    deserialize: DeserializeFn,
}

impl std::fmt::Debug for ComponentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentKind")
            .field("type_name", &self.type_name)
            .field("json_id", &self.json_id)
            .finish()
    }
}

fn serialize_erased<T: SceneComponent>(value: &dyn Any) -> serde_json::Result<Option<Value>> {
    match value.downcast_ref::<T>() {
        Some(component) => component.to_payload(),
        None => Ok(None),
    }
}

fn deserialize_erased<T: SceneComponent>(value: Value) -> serde_json::Result<BoxedComponent> {
    Ok(Box::new(T::from_payload(value)?))
}

#[derive(Debug, Default)]
pub struct ComponentRegistry {
    kinds: Vec<ComponentKind>,
    by_type: HashMap<TypeId, usize>,
    by_id: HashMap<&'static str, usize>,
}

impl ComponentRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-populated with every built-in scene component.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry
            .register::<Transform>()
            .register::<Name>()
            .register::<GltfSource>()
            .register::<MediaSettings>()
            .register::<SpawnPoint>()
            .register::<Interactable>()
            .register::<VisualScript>()
            .register::<SceneSettings>()
            .register::<Bone>();
        registry
    }

    /// Register `T`. Registering the same type twice keeps the first entry.
    ///
    /// # Panics
    ///
    /// Panics if another type already claimed `T::JSON_ID`.
    pub fn register<T: SceneComponent>(&mut self) -> &mut Self {
        let type_id = TypeId::of::<T>();
        if self.by_type.contains_key(&type_id) {
            return self;
        }
        let index = self.kinds.len();
        if let Some(id) = T::JSON_ID {
            let previous = self.by_id.insert(id, index);
            assert!(previous.is_none(), "component id `{id}` registered twice");
        }
        self.by_type.insert(type_id, index);
        self.kinds.push(ComponentKind {
            type_id,
            type_name: std::any::type_name::<T>(),
            json_id: T::JSON_ID,
            serialize: serialize_erased::<T>,
            deserialize: deserialize_erased::<T>,
        });
        self
    }

    pub fn kind(&self, type_id: TypeId) -> Option<&ComponentKind> {
        self.by_type.get(&type_id).map(|&i| &self.kinds[i])
    }

    pub fn kind_by_id(&self, json_id: &str) -> Option<&ComponentKind> {
        self.by_id.get(json_id).map(|&i| &self.kinds[i])
    }

    pub fn json_id(&self, type_id: TypeId) -> Option<&'static str> {
        self.kind(type_id).and_then(|k| k.json_id)
    }

    /// Every registered kind, in registration order.
    pub fn kinds(&self) -> &[ComponentKind] {
        &self.kinds
    }

    /// Components attached to `entity`: registered kinds in registration
    /// order, then unregistered types.
    pub fn components_of(&self, world: &World, entity: Entity) -> Vec<TypeId> {
        let attached = world.component_types(entity);
        let mut ordered: Vec<TypeId> = self
            .kinds
            .iter()
            .map(|k| k.type_id)
            .filter(|t| attached.contains(t))
            .collect();
        ordered.extend(attached.into_iter().filter(|t| !self.by_type.contains_key(t)));
        ordered
    }

    /// Payload of one component. `Ok(None)` when the type has no identifier,
    /// is not attached, or serialized to `null`.
    pub fn serialize(
        &self,
        world: &World,
        entity: Entity,
        type_id: TypeId,
    ) -> serde_json::Result<Option<Value>> {
        let Some(kind) = self.kind(type_id) else {
            return Ok(None);
        };
        if kind.json_id.is_none() {
            return Ok(None);
        }
        match world.get_any_by_type_id(entity, type_id) {
            Some(value) => (kind.serialize)(value),
            None => Ok(None),
        }
    }

    /// Deserialize `value` as the component registered under `json_id` and
    /// attach it to `entity`. Returns `Ok(false)` for unknown identifiers.
    pub fn insert_payload(
        &self,
        world: &mut World,
        entity: Entity,
        json_id: &str,
        value: Value,
    ) -> serde_json::Result<bool> {
        let Some(kind) = self.kind_by_id(json_id) else {
            return Ok(false);
        };
        let boxed = (kind.deserialize)(value)?;
        world.insert_any_component(entity, kind.type_id, kind.type_name, boxed);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Glow {
        strength: f32,
    }

    impl SceneComponent for Glow {
        const JSON_ID: Option<&'static str> = Some("EE_glow");
    }

    #[derive(Debug, Serialize, Deserialize)]
    struct Hidden;

    impl SceneComponent for Hidden {
        const JSON_ID: Option<&'static str> = Some("EE_hidden");
    }

    #[test]
    fn builtins_have_stable_ids() {
        let registry = ComponentRegistry::with_builtins();
        assert_eq!(registry.json_id(TypeId::of::<Transform>()), Some("EE_transform"));
        assert_eq!(registry.json_id(TypeId::of::<MediaSettings>()), Some("EE_media_settings"));
        assert_eq!(registry.json_id(TypeId::of::<VisualScript>()), Some("EE_visual_script"));
        assert_eq!(registry.json_id(TypeId::of::<Name>()), None);
        assert!(registry.kind_by_id("EE_model").is_some());
    }

    #[test]
    fn serializes_registered_component() {
        let mut registry = ComponentRegistry::new();
        registry.register::<Glow>();
        let mut world = World::new();
        let e = world.spawn((Glow { strength: 2.0 },));
        let payload = registry.serialize(&world, e, TypeId::of::<Glow>()).unwrap();
        assert_eq!(payload, Some(json!({ "strength": 2.0 })));
    }

    #[test]
    fn unit_struct_payload_is_skipped() {
        let mut registry = ComponentRegistry::new();
        registry.register::<Hidden>();
        let mut world = World::new();
        let e = world.spawn((Hidden,));
        assert_eq!(registry.serialize(&world, e, TypeId::of::<Hidden>()).unwrap(), None);
    }

    #[test]
    fn unregistered_component_serializes_to_none() {
        let registry = ComponentRegistry::new();
        let mut world = World::new();
        let e = world.spawn((7u32,));
        assert_eq!(registry.serialize(&world, e, TypeId::of::<u32>()).unwrap(), None);
    }

    #[test]
    fn components_follow_registration_order() {
        let mut registry = ComponentRegistry::new();
        registry.register::<Glow>().register::<Name>();
        let mut world = World::new();
        let e = world.spawn((5u8, Name::new("lamp"), Glow { strength: 1.0 }));
        assert_eq!(
            registry.components_of(&world, e),
            vec![TypeId::of::<Glow>(), TypeId::of::<Name>(), TypeId::of::<u8>()]
        );
    }

    #[test]
    fn insert_payload_attaches_component() {
        let registry = ComponentRegistry::with_builtins();
        let mut world = World::new();
        let e = world.spawn_empty();
        let known = registry
            .insert_payload(&mut world, e, "EE_model", json!({ "src": "chair.glb" }))
            .unwrap();
        assert!(known);
        assert_eq!(world.get::<GltfSource>(e).unwrap().src, "chair.glb");

        let unknown = registry
            .insert_payload(&mut world, e, "EE_unknown", json!({}))
            .unwrap();
        assert!(!unknown);
    }

    #[test]
    fn malformed_payload_is_an_error() {
        let registry = ComponentRegistry::with_builtins();
        let mut world = World::new();
        let e = world.spawn_empty();
        assert!(
            registry
                .insert_payload(&mut world, e, "EE_spawn_point", json!({ "permissionedUsers": 3 }))
                .is_err()
        );
    }

    #[test]
    #[should_panic(expected = "registered twice")]
    fn duplicate_id_panics() {
        #[derive(Serialize, Deserialize)]
        struct OtherGlow;
        impl SceneComponent for OtherGlow {
            const JSON_ID: Option<&'static str> = Some("EE_glow");
        }
        let mut registry = ComponentRegistry::new();
        registry.register::<Glow>().register::<OtherGlow>();
    }
}
