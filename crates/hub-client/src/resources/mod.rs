pub mod datasets;
pub mod models;
pub mod projects;
pub mod teams;
pub mod users;

use hub_common::{CreatedRecord, Entity, HubError};
use hub_transport::HttpResponse;
use serde_json::Value;

use crate::api::response_data;
use crate::crud::CrudClient;

/// Shared access to the [`Record`] behind every facade.
pub trait Facade {
    fn record(&self) -> &Record;
    fn record_mut(&mut self) -> &mut Record;
}

/// Id and cached field map of one remote record, plus the CRUD client for
/// its collection. Every facade wraps one of these.
#[derive(Debug, Clone)]
pub struct Record {
    crud: CrudClient,
    id: Option<String>,
    data: Entity,
}

impl Record {
    /// With an id, the record's data is fetched immediately.
    pub async fn open(crud: CrudClient, id: Option<&str>) -> Self {
        let mut record = Self {
            crud,
            id: id.map(str::to_string),
            data: Entity::new(),
        };
        if record.id.is_some() {
            record.get_data().await;
        }
        record
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn data(&self) -> &Entity {
        &self.data
    }

    pub fn crud(&self) -> &CrudClient {
        &self.crud
    }

    /// Boolean field, `false` when missing.
    pub fn flag(&self, field: &str) -> bool {
        self.data.get(field).and_then(Value::as_bool).unwrap_or(false)
    }

    /// Refreshes `data` from the server. Failures are logged and leave the
    /// cached data untouched.
    pub async fn get_data(&mut self) {
        let name = self.crud.name();
        let Some(id) = self.id.clone() else {
            tracing::error!("no {name} id has been set, update the id or create a {name}");
            return;
        };

        let Some(resp) = self.crud.read(&id).await else {
            return;
        };
        match response_data::<Entity>(&resp) {
            Ok(data) => {
                tracing::debug!(%id, "{name} data retrieved");
                self.data = data;
            }
            Err(e) => tracing::error!(%id, error=%e, "failed to decode {name} data"),
        }
    }

    /// Creates a new record, adopts the id the server assigned and loads it.
    pub async fn create(&mut self, data: Value) {
        let name = self.crud.name();
        let Some(resp) = self.crud.create(data).await else {
            return;
        };
        match response_data::<CreatedRecord>(&resp) {
            Ok(CreatedRecord { id: Some(id) }) => {
                tracing::debug!(%id, "{name} created");
                self.id = Some(id);
                self.get_data().await;
            }
            Ok(CreatedRecord { id: None }) => {
                tracing::error!("create {name} response did not carry an id")
            }
            Err(e) => tracing::error!(error=%e, "failed to create {name}"),
        }
    }

    pub async fn delete(&self, hard: bool) -> Option<HttpResponse> {
        let id = self.require_id()?;
        self.crud.delete(id, hard).await
    }

    pub async fn update(&self, data: Value) -> Option<HttpResponse> {
        let id = self.require_id()?;
        self.crud.update(id, data).await
    }

    fn require_id(&self) -> Option<&str> {
        let id = self.id.as_deref();
        if id.is_none() {
            tracing::error!(error=%HubError::MissingId(self.crud.name()), "request skipped");
        }
        id
    }
}


#[cfg(test)]
mod tests {
    use hub_transport::{MemoryTransport, Method, StatusCode};
    use serde_json::json;

    use super::testing::{api, config};
    use super::*;

    fn crud(transport: &MemoryTransport) -> CrudClient {
        CrudClient::new(&api(transport), &config(), "users", "user")
    }

    #[tokio::test]
    async fn test_open_fetches_data() {
        let transport = MemoryTransport::new();
        transport.route_json(
            Method::GET,
            "http://hub/v1/users/u1",
            json!({"data": {"id": "u1", "name": "ada", "active": true}}),
        );
        let record = Record::open(crud(&transport), Some("u1")).await;
        assert_eq!(record.id(), Some("u1"));
        assert_eq!(record.data()["name"], "ada");
        assert!(record.flag("active"));
        assert!(!record.flag("missing"));

        let empty = Record::open(crud(&transport), None).await;
        assert!(empty.data().is_empty());
        assert_eq!(transport.request_count(), 1);
    }

    #[tokio::test]
    async fn test_create_adopts_id() {
        let transport = MemoryTransport::new();
        transport.route_json(Method::POST, "http://hub/v1/users", json!({"data": {"id": "u9"}}));
        transport.route_json(
            Method::GET,
            "http://hub/v1/users/u9",
            json!({"data": {"id": "u9", "name": "grace"}}),
        );
        let mut record = Record::open(crud(&transport), None).await;
        record.create(json!({"name": "grace"})).await;
        assert_eq!(record.id(), Some("u9"));
        assert_eq!(record.data()["name"], "grace");
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_data() {
        let transport = MemoryTransport::new();
        transport.route_json(Method::GET, "http://hub/v1/users/u1", json!({"data": {"name": "ada"}}));
        let mut record = Record::open(crud(&transport), Some("u1")).await;

        transport.route_status(Method::GET, "http://hub/v1/users/u1", StatusCode::INTERNAL_SERVER_ERROR);
        record.get_data().await;
        assert_eq!(record.data()["name"], "ada");
    }

    #[tokio::test]
    async fn test_without_id_nothing_is_sent() {
        let transport = MemoryTransport::new();
        let record = Record::open(crud(&transport), None).await;
        assert!(record.delete(true).await.is_none());
        assert!(record.update(json!({})).await.is_none());
        assert_eq!(transport.request_count(), 0);
    }
}
