use hub_common::{Entity, HubConfig, HubResult};
use hub_transport::HttpResponse;
use serde_json::Value;

use crate::api::ApiClient;
use crate::crud::CrudClient;
use crate::paginated::{ListOptions, PaginatedList};
use crate::resources::{Facade, Record};

const NAME: &str = "team";

#[derive(Debug, Clone)]
pub struct Team {
    record: Record,
}

impl Team {
    pub async fn new(api: &ApiClient, config: &HubConfig, id: Option<&str>) -> Self {
        let crud = CrudClient::new(api, config, "teams", NAME);
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

    pub async fn create_team(&mut self, data: Value) {
        self.record.create(data).await
    }

    pub async fn delete(&self, hard: bool) -> Option<HttpResponse> {
        self.record.delete(hard).await
    }

    pub async fn update(&self, data: Value) -> Option<HttpResponse> {
        self.record.update(data).await
    }
}

impl Facade for Team {
    fn record(&self) -> &Record {
        &self.record
    }

    fn record_mut(&mut self) -> &mut Record {
        &mut self.record
    }
}

pub async fn team_list(
    api: &ApiClient,
    config: &HubConfig,
    options: ListOptions,
) -> HubResult<PaginatedList> {
    PaginatedList::new(api, config, "teams", NAME, options).await
}

#[cfg(test)]
mod tests {
    use hub_transport::{MemoryTransport, Method};
    use serde_json::json;

    use super::*;
    use crate::resources::testing::{api, config};

    #[tokio::test]
    async fn test_team_list_uses_teams_collection() {
        let transport = MemoryTransport::new();
        transport.route_json(
            Method::GET,
            "http://hub/v1/teams",
            json!({"data": {"results": [{"id": "t1"}, {"id": "t2"}], "total": 2}}),
        );
        let list = team_list(&api(&transport), &config(), ListOptions::page_size(2))
            .await
            .unwrap();
        assert_eq!(list.results().len(), 2);
        assert_eq!(list.total_pages(), 1);
    }
}
