use std::path::Path;

use hub_common::{Entity, HubConfig, HubError, HubResult};
use hub_transport::HttpResponse;
use serde_json::Value;

use crate::api::ApiClient;
use crate::crud::CrudClient;
use crate::paginated::{ListOptions, PaginatedList};
use crate::resources::{Facade, Record};
use crate::uploads::{DatasetUpload, StorageClient};

const NAME: &str = "dataset";

#[derive(Debug, Clone)]
pub struct Dataset {
    record: Record,
    uploads: DatasetUpload,
    storage: StorageClient,
}

impl Dataset {
    pub async fn new(api: &ApiClient, config: &HubConfig, id: Option<&str>) -> Self {
        let crud = CrudClient::new(api, config, "datasets", NAME);
        Self {
            record: Record::open(crud, id).await,
            uploads: DatasetUpload::new(api, config),
            storage: StorageClient::new(api, config),
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

    pub async fn create_dataset(&mut self, data: Value) {
        self.record.create(data).await
    }

    pub async fn delete(&self, hard: bool) -> Option<HttpResponse> {
        self.record.delete(hard).await
    }

    pub async fn update(&self, data: Value) -> Option<HttpResponse> {
        self.record.update(data).await
    }

    pub async fn upload_dataset(&self, file: impl AsRef<Path>) -> HubResult<Option<HttpResponse>> {
        let id = self.id().ok_or(HubError::MissingId(NAME))?;
        self.uploads.upload_dataset(id, file).await
    }

    pub async fn get_download_link(&self, object: &str) -> HubResult<Option<String>> {
        let id = self.id().ok_or(HubError::MissingId(NAME))?;
        self.storage.link("datasets", id, object).await
    }
}

impl Facade for Dataset {
    fn record(&self) -> &Record {
        &self.record
    }

    fn record_mut(&mut self) -> &mut Record {
        &mut self.record
    }
}

pub async fn dataset_list(
    api: &ApiClient,
    config: &HubConfig,
    options: ListOptions,
) -> HubResult<PaginatedList> {
    PaginatedList::new(api, config, "datasets", NAME, options).await
}

#[cfg(test)]
mod tests {
    use hub_transport::{MemoryTransport, Method};
    use serde_json::json;

    use super::*;
    use crate::resources::testing::{api, config};

    #[tokio::test]
    async fn test_upload_and_link() {
        let transport = MemoryTransport::new();
        transport.route_json(Method::GET, "http://hub/v1/datasets/d1", json!({"data": {"name": "coco8"}}));
        transport.route_json(Method::POST, "http://hub/v1/datasets/d1/upload", json!({"data": {}}));
        transport.route_json(Method::POST, "http://hub/v1/storage", json!({"data": {"url": "https://zip"}}));

        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("coco8.zip");
        std::fs::write(&archive, b"zip").unwrap();

        let ds = Dataset::new(&api(&transport), &config(), Some("d1")).await;
        assert_eq!(ds.data()["name"], "coco8");
        assert!(ds.upload_dataset(&archive).await.unwrap().is_some());

        let link = ds.get_download_link("archive").await.unwrap();
        assert_eq!(link.as_deref(), Some("https://zip"));
        let sent = transport.requests_to(&Method::POST, "http://hub/v1/storage");
        assert_eq!(
            sent[0].json_body(),
            Some(&json!({"collection": "datasets", "docId": "d1", "object": "archive"}))
        );
    }

    #[tokio::test]
    async fn test_public_list_query() {
        let transport = MemoryTransport::new();
        transport.route_json(Method::GET, "http://hub/v1/datasets", json!({"data": {"results": [], "total": 0}}));
        let options = ListOptions {
            public: Some(true),
            ..ListOptions::default()
        };
        dataset_list(&api(&transport), &config(), options).await.unwrap();
        assert_eq!(transport.requests()[0].query_value("public"), Some("true"));
    }
}
