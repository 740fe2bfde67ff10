use std::fmt::Display;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use hub_common::{Entity, HubConfig, HubError, HubResult, StorageLink, StorageLinkRequest};
use hub_transport::{FilePart, HttpResponse, MultipartForm, RequestBody};
use serde_json::{json, Value};

use crate::api::{response_data, ApiClient};

/// Metadata sent with a weights upload.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Checkpoint {
    pub epoch: u32,
    pub is_best: bool,
    /// Mean average precision; only sent with the final weights.
    pub map: f64,
    pub is_final: bool,
}

/// Upload, metrics, export and predict calls for models.
#[derive(Debug, Clone)]
pub struct ModelUpload {
    api: ApiClient,
    config: HubConfig,
}

impl ModelUpload {
    pub fn new(api: &ApiClient, config: &HubConfig) -> Self {
        Self {
            api: api.rebase(config.v1_url("/models")),
            config: config.clone(),
        }
    }

    /// Uploads `last.pt` for a training checkpoint, or `best.pt` when
    /// `checkpoint.is_final` is set.
    pub async fn upload_model(
        &self,
        id: &str,
        weights: impl AsRef<Path>,
        checkpoint: Checkpoint,
    ) -> HubResult<Option<HttpResponse>> {
        let result: HubResult<Option<HttpResponse>> = async {
            let (_, bytes) = read_file(weights.as_ref()).await?;
            let mut form = MultipartForm::default()
                .field("epoch", checkpoint.epoch)
                .field("type", if checkpoint.is_final { "final" } else { "epoch" });
            form = if checkpoint.is_final {
                form.field("map", checkpoint.map)
            } else {
                form.field("isBest", checkpoint.is_best)
            };
            let part = if checkpoint.is_final { "best.pt" } else { "last.pt" };
            let form = form.file(FilePart {
                field: part.to_string(),
                file_name: Some(part.to_string()),
                bytes,
            });

            let resp = self
                .api
                .post(&format!("/{id}/upload"), RequestBody::Multipart(form))
                .await?;
            if checkpoint.is_final {
                tracing::debug!(model = %id, "model optimized weights uploaded");
            } else {
                tracing::debug!(model = %id, epoch = checkpoint.epoch, "model checkpoint weights uploaded");
            }
            Ok(resp)
        }
        .await;
        logged(result, format_args!("failed to upload weights for model({id})"))
    }

    pub async fn upload_metrics(&self, id: &str, metrics: Value) -> HubResult<Option<HttpResponse>> {
        let payload = json!({"metrics": metrics, "type": "metrics"});
        let result = self.api.post_json(&format!("/{id}"), payload).await;
        if result.is_ok() {
            tracing::debug!(model = %id, "model metrics uploaded");
        }
        logged(result, format_args!("failed to upload metrics for model({id})"))
    }

    pub async fn export(&self, id: &str, format: &str) -> HubResult<Option<HttpResponse>> {
        let result = self
            .api
            .post_json(&format!("/{id}/export"), json!({"format": format}))
            .await;
        logged(result, format_args!("failed to export model({id})"))
    }

    /// Sends `image` to the inference endpoint; `config` entries become form
    /// fields (strings as-is, everything else JSON-encoded).
    pub async fn predict(
        &self,
        id: &str,
        image: impl AsRef<Path>,
        config: &Entity,
    ) -> HubResult<Option<HttpResponse>> {
        let result: HubResult<Option<HttpResponse>> = async {
            let (path, bytes) = read_file(image.as_ref()).await?;
            let mut form = MultipartForm::default();
            for (name, value) in config {
                form = match value {
                    Value::String(s) => form.field(name.as_str(), s),
                    other => form.field(name.as_str(), other),
                };
            }
            let form = form.file(FilePart {
                field: "image".to_string(),
                file_name: file_name(&path),
                bytes,
            });
            let url = self.config.v1_url(&format!("/predict/{id}"));
            self.api.post(&url, RequestBody::Multipart(form)).await
        }
        .await;
        logged(result, format_args!("failed to predict for model({id})"))
    }
}

#[derive(Debug, Clone)]
pub struct DatasetUpload {
    api: ApiClient,
}

impl DatasetUpload {
    pub fn new(api: &ApiClient, config: &HubConfig) -> Self {
        Self {
            api: api.rebase(config.v1_url("/datasets")),
        }
    }

    /// Uploads a dataset archive; the multipart part is named after the file.
    pub async fn upload_dataset(
        &self,
        id: &str,
        file: impl AsRef<Path>,
    ) -> HubResult<Option<HttpResponse>> {
        let result: HubResult<Option<HttpResponse>> = async {
            let (path, bytes) = read_file(file.as_ref()).await?;
            let name = file_name(&path).unwrap_or_else(|| "dataset".to_string());
            let form = MultipartForm::default().file(FilePart {
                field: name.clone(),
                file_name: Some(name),
                bytes,
            });
            let resp = self
                .api
                .post(&format!("/{id}/upload"), RequestBody::Multipart(form))
                .await?;
            tracing::debug!(dataset = %id, "dataset uploaded");
            Ok(resp)
        }
        .await;
        logged(result, format_args!("failed to upload dataset({id})"))
    }
}

#[derive(Debug, Clone)]
pub struct ProjectUpload {
    api: ApiClient,
}

impl ProjectUpload {
    pub fn new(api: &ApiClient, config: &HubConfig) -> Self {
        Self {
            api: api.rebase(config.v1_url("/projects")),
        }
    }

    pub async fn upload_image(
        &self,
        id: &str,
        file: impl AsRef<Path>,
    ) -> HubResult<Option<HttpResponse>> {
        let result: HubResult<Option<HttpResponse>> = async {
            let (path, bytes) = read_file(file.as_ref()).await?;
            let form = MultipartForm::default().file(FilePart {
                field: "file".to_string(),
                file_name: file_name(&path),
                bytes,
            });
            let resp = self
                .api
                .post(&format!("/{id}/upload"), RequestBody::Multipart(form))
                .await?;
            tracing::debug!(project = %id, "project image uploaded");
            Ok(resp)
        }
        .await;
        logged(result, format_args!("failed to upload image for project({id})"))
    }
}

/// Signed download links from `{api_root}/v1/storage`.
#[derive(Debug, Clone)]
pub struct StorageClient {
    api: ApiClient,
}

impl StorageClient {
    pub fn new(api: &ApiClient, config: &HubConfig) -> Self {
        Self {
            api: api.rebase(config.v1_url("/storage")),
        }
    }

    /// `Ok(None)` when the server has no link for `object` or the failure
    /// was suppressed.
    pub async fn link(
        &self,
        collection: &str,
        doc_id: &str,
        object: &str,
    ) -> HubResult<Option<String>> {
        let result: HubResult<Option<String>> = async {
            let request = StorageLinkRequest {
                collection,
                doc_id,
                object,
            };
            match self.api.post_json("", serde_json::to_value(&request)?).await? {
                Some(resp) => Ok(response_data::<StorageLink>(&resp)?.url),
                None => Ok(None),
            }
        }
        .await;
        logged(
            result,
            format_args!("failed to get {object} link for {collection}({doc_id})"),
        )
    }
}

fn logged<T>(result: HubResult<T>, what: impl Display) -> HubResult<T> {
    if let Err(e) = &result {
        tracing::error!(error=%e, "{what}");
    }
    result
}

/// Relative paths resolve against the current directory.
pub(crate) fn resolve(path: &Path) -> HubResult<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

pub(crate) async fn read_file(path: &Path) -> HubResult<(PathBuf, Bytes)> {
    let path = resolve(path)?;
    let is_file = tokio::fs::metadata(&path)
        .await
        .map(|m| m.is_file())
        .unwrap_or(false);
    if !is_file {
        return Err(HubError::FileNotFound(path));
    }
    let bytes = tokio::fs::read(&path).await?;
    Ok((path, Bytes::from(bytes)))
}

fn file_name(path: &Path) -> Option<String> {
    path.file_name().map(|n| n.to_string_lossy().into_owned())
}
