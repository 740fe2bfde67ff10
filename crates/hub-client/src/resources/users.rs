use hub_common::{Entity, HubConfig};
use hub_transport::HttpResponse;
use serde_json::Value;

use crate::api::ApiClient;
use crate::crud::CrudClient;
use crate::resources::{Facade, Record};

#[derive(Debug, Clone)]
pub struct User {
    record: Record,
}

impl User {
    pub async fn new(api: &ApiClient, config: &HubConfig, id: Option<&str>) -> Self {
        let crud = CrudClient::new(api, config, "users", "user");
        Self {
            record: Record::open(crud, id).await,
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

    pub async fn create_user(&mut self, data: Value) {
        self.record.create(data).await
    }

    pub async fn delete(&self, hard: bool) -> Option<HttpResponse> {
        self.record.delete(hard).await
    }

    pub async fn update(&self, data: Value) -> Option<HttpResponse> {
        self.record.update(data).await
    }
}

impl Facade for User {
    fn record(&self) -> &Record {
        &self.record
    }

    fn record_mut(&mut self) -> &mut Record {
        &mut self.record
    }
}
