//! Built-in scene components.
//!
//! Field names serialize in camelCase so payloads match what existing scene
//! documents carry under each `EE_*` extension key.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::registry::SceneComponent;

/// Display name of an entity. Written to `node.name`, never as an extension.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Name(pub String);

impl Name {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl SceneComponent for Name {
    const JSON_ID: Option<&'static str> = None;
}

/// Marks an entity imported as a skeleton joint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bone;

impl SceneComponent for Bone {
    const JSON_ID: Option<&'static str> = None;
}

/// A nested model loaded from another document. Its children belong to that
/// document and are not flattened into the exported one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GltfSource {
    pub src: String,
    pub camera_occlusion: bool,
}

impl Default for GltfSource {
    fn default() -> Self {
        Self {
            src: String::new(),
            camera_occlusion: true,
        }
    }
}

impl GltfSource {
    pub fn new(src: impl Into<String>) -> Self {
        Self {
            src: src.into(),
            ..Default::default()
        }
    }
}

impl SceneComponent for GltfSource {
    const JSON_ID: Option<&'static str> = Some("EE_model");
}

/// Attenuation curve for positional audio.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceModel {
    Exponential,
    Inverse,
    #[default]
    Linear,
}

/// Scene-wide audio defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MediaSettings {
    pub immersive_media: bool,
    pub ref_distance: f32,
    pub rolloff_factor: f32,
    pub max_distance: f32,
    pub distance_model: DistanceModel,
    pub cone_inner_angle: f32,
    pub cone_outer_angle: f32,
    pub cone_outer_gain: f32,
}

impl Default for MediaSettings {
    fn default() -> Self {
        Self {
            immersive_media: false,
            ref_distance: 20.0,
            rolloff_factor: 1.0,
            max_distance: 10000.0,
            distance_model: DistanceModel::Linear,
            cone_inner_angle: 360.0,
            cone_outer_angle: 0.0,
            cone_outer_gain: 0.0,
        }
    }
}

impl SceneComponent for MediaSettings {
    const JSON_ID: Option<&'static str> = Some("EE_media_settings");
}

/// Where avatars appear. An empty user list means anyone may spawn here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SpawnPoint {
    pub permissioned_users: Vec<String>,
}

impl SceneComponent for SpawnPoint {
    const JSON_ID: Option<&'static str> = Some("EE_spawn_point");
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UiVisibilityOverride {
    #[default]
    None,
    Off,
    On,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UiActivationType {
    #[default]
    Proximity,
    Hover,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractableCallback {
    #[serde(rename = "callbackID")]
    pub callback_id: String,
    pub target: Option<String>,
}

/// Something the local user can click or walk up to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Interactable {
    pub label: String,
    pub ui_interactable: bool,
    pub ui_visibility_override: UiVisibilityOverride,
    pub ui_activation_type: UiActivationType,
    pub activation_distance: f32,
    pub click_interact: bool,
    pub callbacks: Vec<InteractableCallback>,
    /// Runtime state, never persisted.
    #[serde(skip)]
    pub highlighted: bool,
    #[serde(skip)]
    pub can_interact: bool,
}

impl Default for Interactable {
    fn default() -> Self {
        Self {
            label: "E".to_string(),
            ui_interactable: true,
            ui_visibility_override: UiVisibilityOverride::None,
            ui_activation_type: UiActivationType::Proximity,
            activation_distance: 2.0,
            click_interact: false,
            callbacks: Vec::new(),
            highlighted: false,
            can_interact: false,
        }
    }
}

impl SceneComponent for Interactable {
    const JSON_ID: Option<&'static str> = Some("EE_interactable");
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum VisualScriptDomain {
    #[default]
    #[serde(rename = "ECS")]
    Ecs,
}

/// A node-graph script attached to an entity. The graph itself is opaque
/// JSON here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VisualScript {
    pub domain: VisualScriptDomain,
    pub visual_script: Option<Value>,
    pub run: bool,
    pub disabled: bool,
}

impl SceneComponent for VisualScript {
    const JSON_ID: Option<&'static str> = Some("EE_visual_script");
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SceneSettings {
    #[serde(rename = "thumbnailURL")]
    pub thumbnail_url: String,
    #[serde(rename = "loadingScreenURL")]
    pub loading_screen_url: String,
    pub primary_color: String,
    pub background_color: String,
    pub alternative_color: String,
    /// Avatars falling below this height respawn.
    pub scene_kill_height: f32,
    pub spectate_entity: Option<String>,
}

impl Default for SceneSettings {
    fn default() -> Self {
        Self {
            thumbnail_url: String::new(),
            loading_screen_url: String::new(),
            primary_color: "#000000".to_string(),
            background_color: "#FFFFFF".to_string(),
            alternative_color: "#000000".to_string(),
            scene_kill_height: -10.0,
            spectate_entity: None,
        }
    }
}

impl SceneComponent for SceneSettings {
    const JSON_ID: Option<&'static str> = Some("EE_scene_settings");
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn media_settings_defaults_serialize_camel_case() {
        let value = serde_json::to_value(MediaSettings::default()).unwrap();
        assert_eq!(
            value,
            json!({
                "immersiveMedia": false,
                "refDistance": 20.0,
                "rolloffFactor": 1.0,
                "maxDistance": 10000.0,
                "distanceModel": "linear",
                "coneInnerAngle": 360.0,
                "coneOuterAngle": 0.0,
                "coneOuterGain": 0.0
            })
        );
    }

    #[test]
    fn interactable_skips_runtime_state() {
        let interactable = Interactable {
            highlighted: true,
            ..Default::default()
        };
        let value = serde_json::to_value(&interactable).unwrap();
        assert!(value.get("highlighted").is_none());
        assert_eq!(value["label"], "E");
        assert_eq!(value["uiActivationType"], "proximity");
        assert_eq!(value["activationDistance"], 2.0);
    }

    #[test]
    fn scene_settings_keep_url_field_names() {
        let value = serde_json::to_value(SceneSettings::default()).unwrap();
        assert_eq!(value["thumbnailURL"], "");
        assert_eq!(value["sceneKillHeight"], -10.0);
        assert!(value["spectateEntity"].is_null());
    }

    #[test]
    fn visual_script_domain_is_uppercase() {
        let script: VisualScript =
            serde_json::from_value(json!({ "domain": "ECS", "run": true })).unwrap();
        assert!(script.run);
        assert!(!script.disabled);
        assert_eq!(script.visual_script, None);
    }

    #[test]
    fn name_is_a_plain_string() {
        assert_eq!(serde_json::to_value(Name::new("hips")).unwrap(), json!("hips"));
    }
}
