use std::path::Path;
use std::time::Duration;

use hub_common::{lookup, Entity, HubConfig, HubError, HubResult};
use hub_transport::HttpResponse;
use serde_json::Value;

use crate::api::ApiClient;
use crate::crud::CrudClient;
use crate::heartbeat::Heartbeat;
use crate::paginated::{ListOptions, PaginatedList};
use crate::resources::{Facade, Record};
use crate::uploads::{Checkpoint, ModelUpload, StorageClient};

const NAME: &str = "model";

#[derive(Debug, Clone)]
pub struct Model {
    record: Record,
    uploads: ModelUpload,
    storage: StorageClient,
    heartbeat: Heartbeat,
}

impl Model {
    pub async fn new(api: &ApiClient, config: &HubConfig, id: Option<&str>) -> Self {
        let crud = CrudClient::new(api, config, "models", NAME);
        Self {
            record: Record::open(crud, id).await,
            uploads: ModelUpload::new(api, config),
            storage: StorageClient::new(api, config),
            heartbeat: Heartbeat::new(api, config),
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.record.id()
    }

    pub fn data(&self) -> &Entity {
        self.record.data()
    }

    pub async fn get_data(&mut self) {
        self.record.get_data().await
    }

    pub async fn create_model(&mut self, data: Value) {
        self.record.create(data).await
    }

    pub async fn delete(&self, hard: bool) -> Option<HttpResponse> {
        self.record.delete(hard).await
    }

    pub async fn update(&self, data: Value) -> Option<HttpResponse> {
        self.record.update(data).await
    }

    /// Training can resume from the last uploaded weights.
    pub fn is_resumable(&self) -> bool {
        self.record.flag("hasLastWeights")
    }

    pub fn has_best_weights(&self) -> bool {
        self.record.flag("hasBestWeights")
    }

    pub fn is_pretrained(&self) -> bool {
        self.record.flag("isPretrained")
    }

    pub fn is_trained(&self) -> bool {
        self.record.flag("isTrained")
    }

    pub fn is_custom(&self) -> bool {
        self.record.flag("isCustom")
    }

    /// Architecture config file name, e.g. `yolov8n.yaml`.
    pub fn get_architecture(&self) -> Option<String> {
        lookup(self.data(), &["lineage", "architecture", "name"])
            .and_then(Value::as_str)
            .map(|name| format!("{name}.yaml"))
    }

    pub async fn get_dataset_url(&self) -> HubResult<Option<String>> {
        self.get_download_link("dataset").await
    }

    /// `weight` is `best`, `last` or `parent`. The parent weights of a
    /// non-custom model come from its lineage instead of storage.
    pub async fn get_weights_url(&self, weight: &str) -> HubResult<Option<String>> {
        if weight == "parent" && !self.is_custom() {
            return Ok(lookup(self.data(), &["lineage", "parent", "url"])
                .and_then(Value::as_str)
                .map(str::to_string));
        }
        self.get_download_link(weight).await
    }

    pub async fn get_download_link(&self, object: &str) -> HubResult<Option<String>> {
        let id = self.require_id()?;
        self.storage.link("models", id, object).await
    }

    pub async fn upload_model(
        &self,
        weights: impl AsRef<Path>,
        checkpoint: Checkpoint,
    ) -> HubResult<Option<HttpResponse>> {
        let id = self.require_id()?;
        self.uploads.upload_model(id, weights, checkpoint).await
    }

    pub async fn upload_metrics(&self, metrics: Value) -> HubResult<Option<HttpResponse>> {
        let id = self.require_id()?;
        self.uploads.upload_metrics(id, metrics).await
    }

    pub async fn export(&self, format: &str) -> HubResult<Option<HttpResponse>> {
        let id = self.require_id()?;
        self.uploads.export(id, format).await
    }

    pub async fn predict(
        &self,
        image: impl AsRef<Path>,
        config: &Entity,
    ) -> HubResult<Option<HttpResponse>> {
        let id = self.require_id()?;
        self.uploads.predict(id, image, config).await
    }

    /// Starts a background heartbeat loop for this model. Pair with
    /// [`Heartbeat::stop_on`] to stop it on process signals.
    /// Starts reporting liveness for this model in the background.
    /// Must be called inside a Tokio runtime; see [`Heartbeat::start`].
    pub fn start_heartbeat(&self, interval: Duration) -> HubResult<()> {
        let id = self.require_id()?;
        self.heartbeat.start(id, interval);
        Ok(())
    }

    pub fn stop_heartbeat(&self) {
        self.heartbeat.stop()
    }

    pub fn heartbeat(&self) -> &Heartbeat {
        &self.heartbeat
    }

    fn require_id(&self) -> HubResult<&str> {
        self.id().ok_or(HubError::MissingId(NAME))
    }
}

impl Facade for Model {
    fn record(&self) -> &Record {
        &self.record
    }

    fn record_mut(&mut self) -> &mut Record {
        &mut self.record
    }
}

pub async fn model_list(
    api: &ApiClient,
    config: &HubConfig,
    options: ListOptions,
) -> HubResult<PaginatedList> {
    PaginatedList::new(api, config, "models", NAME, options).await
}
