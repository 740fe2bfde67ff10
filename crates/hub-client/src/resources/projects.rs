use std::path::Path;

use hub_common::{Entity, HubConfig, HubError, HubResult};
use hub_transport::HttpResponse;
use serde_json::Value;

use crate::api::ApiClient;
use crate::crud::CrudClient;
use crate::paginated::{ListOptions, PaginatedList};
use crate::resources::{Facade, Record};
use crate::uploads::ProjectUpload;

const NAME: &str = "project";

#[derive(Debug, Clone)]
pub struct Project {
    record: Record,
    uploads: ProjectUpload,
}

impl Project {
    pub async fn new(api: &ApiClient, config: &HubConfig, id: Option<&str>) -> Self {
        let crud = CrudClient::new(api, config, "projects", NAME);
        Self {
            record: Record::open(crud, id).await,
            uploads: ProjectUpload::new(api, config),
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

    pub async fn create_project(&mut self, data: Value) {
        self.record.create(data).await
    }

    pub async fn delete(&self, hard: bool) -> Option<HttpResponse> {
        self.record.delete(hard).await
    }

    pub async fn update(&self, data: Value) -> Option<HttpResponse> {
        self.record.update(data).await
    }

    /// Uploads the project's cover image.
    pub async fn upload_image(&self, file: impl AsRef<Path>) -> HubResult<Option<HttpResponse>> {
        let id = self.id().ok_or(HubError::MissingId(NAME))?;
        self.uploads.upload_image(id, file).await
    }
}

impl Facade for Project {
    fn record(&self) -> &Record {
        &self.record
    }

    fn record_mut(&mut self) -> &mut Record {
        &mut self.record
    }
}

pub async fn project_list(
    api: &ApiClient,
    config: &HubConfig,
    options: ListOptions,
) -> HubResult<PaginatedList> {
    PaginatedList::new(api, config, "projects", NAME, options).await
}

#[cfg(test)]
mod tests {
    use hub_transport::{MemoryTransport, Method};
    use serde_json::json;

    use super::*;
    use crate::resources::testing::{api, config};

    #[tokio::test]
    async fn test_crud_round() {
        let transport = MemoryTransport::new();
        transport.route_json(Method::POST, "http://hub/v1/projects", json!({"data": {"id": "p1"}}));
        transport.route_json(Method::GET, "http://hub/v1/projects/p1", json!({"data": {"name": "demo"}}));
        transport.route_json(Method::PATCH, "http://hub/v1/projects/p1", json!({"data": {}}));
        transport.route_json(Method::DELETE, "http://hub/v1/projects/p1", json!({"data": {}}));

        let mut project = Project::new(&api(&transport), &config(), None).await;
        project.create_project(json!({"name": "demo"})).await;
        assert_eq!(project.id(), Some("p1"));
        assert_eq!(project.data()["name"], "demo");

        assert!(project.update(json!({"name": "renamed"})).await.is_some());
        assert!(project.delete(false).await.is_some());
        let deleted = transport.requests_to(&Method::DELETE, "http://hub/v1/projects/p1");
        assert_eq!(deleted[0].query_value("hard"), Some("false"));
    }

    #[tokio::test]
    async fn test_upload_image_requires_id() {
        let transport = MemoryTransport::new();
        let project = Project::new(&api(&transport), &config(), None).await;
        let err = project.upload_image("cover.png").await.unwrap_err();
        assert!(matches!(err, HubError::MissingId("project")));
    }
}
