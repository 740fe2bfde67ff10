use hub_common::HubConfig;
use hub_transport::{HttpResponse, RequestBody};
use serde_json::Value;

use crate::api::ApiClient;

/// The five CRUD verbs bound to `{api_root}/v1/{resource}`.
///
/// Failures are logged and come back as `None`, regardless of the
/// client's error policy.
#[derive(Debug, Clone)]
pub struct CrudClient {
    api: ApiClient,
    name: &'static str,
}

impl CrudClient {
    pub fn new(api: &ApiClient, config: &HubConfig, resource: &str, name: &'static str) -> Self {
        Self {
            api: api.rebase(config.v1_url(&format!("/{resource}"))),
            name,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub async fn create(&self, data: Value) -> Option<HttpResponse> {
        match self.api.post("", RequestBody::Json(data)).await {
            Ok(resp) => resp,
            Err(e) => {
                tracing::error!(error=%e, "failed to create {}", self.name);
                None
            }
        }
    }

    pub async fn read(&self, id: &str) -> Option<HttpResponse> {
        match self.api.get(&format!("/{id}"), &[]).await {
            Ok(resp) => resp,
            Err(e) => {
                tracing::error!(error=%e, "failed to read {}({id})", self.name);
                None
            }
        }
    }

    pub async fn update(&self, id: &str, data: Value) -> Option<HttpResponse> {
        match self.api.patch(&format!("/{id}"), RequestBody::Json(data)).await {
            Ok(resp) => resp,
            Err(e) => {
                tracing::error!(error=%e, "failed to update {}({id})", self.name);
                None
            }
        }
    }

    /// `hard = false` asks the server for a soft delete.
    pub async fn delete(&self, id: &str, hard: bool) -> Option<HttpResponse> {
        match self
            .api
            .delete(&format!("/{id}"), &[("hard", hard.to_string())])
            .await
        {
            Ok(resp) => resp,
            Err(e) => {
                tracing::error!(error=%e, "failed to delete {}({id})", self.name);
                None
            }
        }
    }

    pub async fn list(&self, page: u32, limit: u32) -> Option<HttpResponse> {
        let query = [("page", page.to_string()), ("limit", limit.to_string())];
        match self.api.get("", &query).await {
            Ok(resp) => resp,
            Err(e) => {
                tracing::error!(error=%e, "failed to list {}", self.name);
                None
            }
        }
    }
}
