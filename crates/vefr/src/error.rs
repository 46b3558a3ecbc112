//! Error types.
//!
//! Each subsystem has its own enum; [`Error`] wraps them all so application
//! code can use the crate-wide [`Result`] with `?`.

use thiserror::Error;

use crate::avatar::HumanBone;
use crate::ecs::Entity;

/// Failures while walking the entity tree into a scene document.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("entity {0} is not alive")]
    DeadEntity(Entity),

    #[error("failed to serialize component `{component}` on {entity}: {source}")]
    Component {
        component: &'static str,
        entity: Entity,
        #[source]
        source: serde_json::Error,
    },

    /// An export extension hook refused to continue.
    #[error("export extension `{extension}` failed: {message}")]
    Extension {
        extension: &'static str,
        message: String,
    },

    #[error("document references node {index} but only {len} nodes exist")]
    DanglingIndex { index: usize, len: usize },

    #[error("failed to encode document: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Failures while building an entity tree from a glTF document.
#[derive(Error, Debug)]
pub enum ImportError {
    #[cfg(feature = "import")]
    #[error("invalid glTF: {0}")]
    Gltf(#[from] ::gltf::Error),

    #[error("document has no scenes")]
    NoScene,

    #[error("malformed `{id}` payload on node {node}: {source}")]
    Payload {
        id: String,
        node: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures while mapping a skeleton onto the humanoid bone set or posing it.
#[derive(Error, Debug)]
pub enum RetargetError {
    #[error("no hips bone found under the avatar root")]
    MissingHips,

    #[error("rig has no `{0}` bone")]
    MissingBone(HumanBone),

    #[error("humanoid bone list references node {0}, which was not imported")]
    UnknownNode(usize),

    #[error("malformed humanoid extension: {0}")]
    Humanoid(String),

    #[error("entity {entity} is mapped to both `{first}` and `{second}`")]
    DuplicateEntity {
        entity: Entity,
        first: HumanBone,
        second: HumanBone,
    },
}

/// Failures while storing an exported document.
#[derive(Error, Debug)]
pub enum UploadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid destination path `{0}`")]
    InvalidPath(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Any error this crate can produce.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Export(#[from] ExportError),

    #[error(transparent)]
    Import(#[from] ImportError),

    #[error(transparent)]
    Retarget(#[from] RetargetError),

    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub type Result<T> = std::result::Result<T, Error>;
