pub use crate::avatar::{
    AvatarRig, BoneMapping, HumanBone, RigSource, enforce_t_pose, normalize_humanoid_rest_pose,
    resolve_mixamo, retarget_mixamo, setup_avatar_rig,
};
pub use crate::config::ExportConfig;
pub use crate::ecs::{Children, Entity, GlobalTransform, Parent, Schedule, World, propagate_transforms};
pub use crate::error::{Error, ExportError, ImportError, RetargetError, UploadError};
pub use crate::gltf::{
    AssetUploader, ExportExtension, FileSystemUploader, ImportedScene, SceneDocument, SceneNode,
    default_export_extensions, export_gltf_scene, import_scene_document, upload_scene,
};
#[cfg(feature = "import")]
pub use crate::gltf::{import_gltf_file, import_gltf_scene};
pub use crate::math::{Mat4, Quat, Transform, Vec3};
pub use crate::registry::{ComponentRegistry, SceneComponent};
pub use crate::scene::{
    Bone, GltfSource, Interactable, MediaSettings, Name, SceneSettings, SpawnPoint, VisualScript,
    scene_schedule,
};
