//! glTF scene documents: export, import, URL portability and upload.

pub mod document;
pub mod export;
pub mod extension;
pub mod import;
pub mod upload;
pub mod urls;

pub use document::{SceneDocument, SceneNode};
pub use export::{export_gltf_scene, export_matrix};
pub use extension::{DetachRootParent, ExportExtension, SkipNestedScenes, default_export_extensions};
#[cfg(feature = "import")]
pub use import::{import_gltf_file, import_gltf_scene};
pub use import::{ImportedScene, import_scene_document};
pub use upload::{AssetUploader, FileSystemUploader, UploadRequest, upload_scene, upload_scene_to};
