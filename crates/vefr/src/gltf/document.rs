//! The exported scene document: a glTF 2.0 JSON subset with per-node vendor
//! extensions.
//!
//! Node identity is positional. A document is built by one export pass and
//! never edited afterwards except by export extensions' `after` hooks.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ExportError;
use crate::math::{Mat4, Quat, Vec3};

pub const GLTF_VERSION: &str = "2.0";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generator: Option<String>,
    pub version: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    #[serde(default)]
    pub nodes: Vec<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneNode {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Local matrix relative to the parent node, column-major.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matrix: Option<[f32; 16]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translation: Option<[f32; 3]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<[f32; 4]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<[f32; 3]>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<usize>,
    /// Component identifier → payload.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extensions: BTreeMap<String, Value>,
}

impl SceneNode {
    /// Local matrix from `matrix`, else from the TRS fields, else identity.
    pub fn local_matrix(&self) -> Mat4 {
        if let Some(m) = &self.matrix {
            return Mat4::from_cols_array(m);
        }
        let t = self.translation.map(Vec3::from_array).unwrap_or(Vec3::ZERO);
        let r = self.rotation.map(Quat::from_array).unwrap_or(Quat::IDENTITY);
        let s = self.scale.map(Vec3::from_array).unwrap_or(Vec3::ONE);
        Mat4::from_scale_rotation_translation(s, r, t)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneDocument {
    pub asset: Asset,
    #[serde(default)]
    pub scene: usize,
    #[serde(default)]
    pub scenes: Vec<Scene>,
    #[serde(default)]
    pub nodes: Vec<SceneNode>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub extensions_used: BTreeSet<String>,
    /// Document-level extensions, e.g. a humanoid description.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub extensions: Map<String, Value>,
}

impl SceneDocument {
    /// An empty document with one empty scene.
    pub fn new(generator: &str) -> Self {
        Self {
            asset: Asset {
                generator: Some(generator.to_string()),
                version: GLTF_VERSION.to_string(),
            },
            scene: 0,
            scenes: vec![Scene::default()],
            nodes: Vec::new(),
            extensions_used: BTreeSet::new(),
            extensions: Map::new(),
        }
    }

    /// Root node indices of the default scene.
    pub fn root_nodes(&self) -> &[usize] {
        self.scenes
            .get(self.scene)
            .map(|s| s.nodes.as_slice())
            .unwrap_or(&[])
    }

    /// Index of the node whose `children` contains `index`.
    pub fn parent_of(&self, index: usize) -> Option<usize> {
        self.nodes.iter().position(|n| n.children.contains(&index))
    }

    /// Check that every child and scene root index points at a node.
    pub fn validate(&self) -> Result<(), ExportError> {
        let len = self.nodes.len();
        let referenced = self
            .nodes
            .iter()
            .flat_map(|n| n.children.iter())
            .chain(self.scenes.iter().flat_map(|s| s.nodes.iter()));
        for &index in referenced {
            if index >= len {
                return Err(ExportError::DanglingIndex { index, len });
            }
        }
        Ok(())
    }

    pub fn to_json(&self, pretty: bool) -> Result<Vec<u8>, ExportError> {
        let bytes = if pretty {
            serde_json::to_vec_pretty(self)?
        } else {
            serde_json::to_vec(self)?
        };
        Ok(bytes)
    }

    pub fn from_json(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(bytes)
    }
}
