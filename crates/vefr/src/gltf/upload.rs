//! Handing exported documents to project storage.
//!
//! Upload happens after export returns; nothing here touches the world.

use std::path::{Component, Path, PathBuf};

use crate::config::ExportConfig;
use crate::error::{Error, UploadError};
use crate::gltf::document::SceneDocument;
use crate::gltf::urls::parse_static_asset_path;

pub const GLTF_CONTENT_TYPE: &str = "model/gltf+json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRequest {
    /// `<org>/<project>`
    pub project: String,
    pub bytes: Vec<u8>,
    /// Destination relative to the project root.
    pub path: String,
    pub content_type: String,
}

/// A project file store. Returns the URL the file can be fetched from.
pub trait AssetUploader {
    fn upload(&self, request: UploadRequest) -> Result<String, UploadError>;
}

/// Stores project files under `{root}/projects/{project}/{path}`.
#[derive(Debug, Clone)]
pub struct FileSystemUploader {
    root: PathBuf,
    base_url: String,
}

impl FileSystemUploader {
    pub fn new(root: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            base_url: base_url.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Relative paths that stay inside their base directory.
fn checked_relative(path: &str) -> Result<&Path, UploadError> {
    let p = Path::new(path);
    let ok = !path.is_empty() && p.components().all(|c| matches!(c, Component::Normal(_)));
    if ok {
        Ok(p)
    } else {
        Err(UploadError::InvalidPath(path.to_string()))
    }
}

impl AssetUploader for FileSystemUploader {
    fn upload(&self, request: UploadRequest) -> Result<String, UploadError> {
        let project = checked_relative(&request.project)?;
        let relative = checked_relative(&request.path)?;
        let destination = self.root.join("projects").join(project).join(relative);
        if let Some(dir) = destination.parent() {
            std::fs::create_dir_all(dir)?;
        }
        std::fs::write(&destination, &request.bytes)?;
        log::debug!(
            "wrote {} bytes ({}) to {}",
            request.bytes.len(),
            request.content_type,
            destination.display()
        );
        Ok(format!(
            "{}/projects/{}/{}",
            self.base_url.trim_end_matches('/'),
            request.project,
            request.path
        ))
    }
}

/// Encode `document` and upload it as `relative_path` in `project`.
pub fn upload_scene(
    document: &SceneDocument,
    uploader: &dyn AssetUploader,
    project: &str,
    relative_path: &str,
    config: &ExportConfig,
) -> Result<String, Error> {
    let bytes = document.to_json(config.pretty)?;
    let url = uploader.upload(UploadRequest {
        project: project.to_string(),
        bytes,
        path: relative_path.to_string(),
        content_type: GLTF_CONTENT_TYPE.to_string(),
    })?;
    log::info!("exported model data to {url}");
    Ok(url)
}

/// Like [`upload_scene`], taking the destination as a full static asset URL
/// such as `https://cdn/projects/acme/park/scene.gltf`.
pub fn upload_scene_to(
    document: &SceneDocument,
    uploader: &dyn AssetUploader,
    asset_url: &str,
    config: &ExportConfig,
) -> Result<String, Error> {
    let target = parse_static_asset_path(asset_url)
        .ok_or_else(|| UploadError::InvalidPath(asset_url.to_string()))?;
    upload_scene(document, uploader, &target.project, &target.relative_path, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[derive(Default)]
    struct MemoryUploader {
        received: RefCell<Vec<UploadRequest>>,
    }

    impl AssetUploader for MemoryUploader {
        fn upload(&self, request: UploadRequest) -> Result<String, UploadError> {
            let url = format!("mem://{}/{}", request.project, request.path);
            self.received.borrow_mut().push(request);
            Ok(url)
        }
    }

    fn temp_root(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!("vefr-upload-{tag}-{}", std::process::id()))
    }

    #[test]
    fn upload_scene_sends_gltf_json() {
        let uploader = MemoryUploader::default();
        let doc = SceneDocument::new("test");
        let url = upload_scene(&doc, &uploader, "acme/park", "scene.gltf", &ExportConfig::default())
            .unwrap();
        assert_eq!(url, "mem://acme/park/scene.gltf");

        let received = uploader.received.borrow();
        assert_eq!(received[0].content_type, "model/gltf+json");
        let parsed = SceneDocument::from_json(&received[0].bytes).unwrap();
        assert_eq!(parsed, doc);
    }

    #[test]
    fn upload_scene_to_splits_asset_url() {
        let uploader = MemoryUploader::default();
        let doc = SceneDocument::new("test");
        let url = upload_scene_to(
            &doc,
            &uploader,
            "https://cdn.example.com/projects/acme/park/scenes/lobby.gltf",
            &ExportConfig::default(),
        )
        .unwrap();
        assert_eq!(url, "mem://acme/park/scenes/lobby.gltf");

        let err = upload_scene_to(&doc, &uploader, "lobby.gltf", &ExportConfig::default());
        assert!(matches!(err, Err(Error::Upload(UploadError::InvalidPath(_)))));
    }

    #[test]
    fn filesystem_uploader_writes_under_projects() {
        let root = temp_root("fs");
        let uploader = FileSystemUploader::new(&root, "http://localhost:3030/");
        let url = uploader
            .upload(UploadRequest {
                project: "acme/park".into(),
                bytes: b"{}".to_vec(),
                path: "scenes/a.gltf".into(),
                content_type: GLTF_CONTENT_TYPE.into(),
            })
            .unwrap();
        assert_eq!(url, "http://localhost:3030/projects/acme/park/scenes/a.gltf");
        let written = std::fs::read(root.join("projects/acme/park/scenes/a.gltf")).unwrap();
        assert_eq!(written, b"{}");
        std::fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn filesystem_uploader_rejects_escaping_paths() {
        let uploader = FileSystemUploader::new(temp_root("escape"), "http://localhost");
        for path in ["../x.gltf", "/etc/x.gltf", ""] {
            let err = uploader
                .upload(UploadRequest {
                    project: "acme/park".into(),
                    bytes: Vec::new(),
                    path: path.into(),
                    content_type: GLTF_CONTENT_TYPE.into(),
                })
                .unwrap_err();
            assert!(matches!(err, UploadError::InvalidPath(_)));
        }
    }
}
