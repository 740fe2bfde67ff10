use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A server-side record, kept as the raw field map the API returned.
pub type Entity = Map<String, Value>;

/// Every API response wraps its payload in a `data` field.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct Envelope<T> {
    #[serde(default)]
    pub data: T,
}

/// One page of a cursor-paginated list.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PageResult {
    #[serde(default)]
    pub results: Vec<Entity>,

    #[serde(default, rename = "total")]
    pub total_count: u64,

    /// Cursor for the following page; absent on the last page.
    #[serde(default)]
    pub last_record_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HeartbeatRequest {
    pub agent: String,
    pub agent_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HeartbeatAck {
    #[serde(default)]
    pub agent_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct CreatedRecord {
    #[serde(default)]
    pub id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct StorageLink {
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StorageLinkRequest<'a> {
    pub collection: &'a str,
    pub doc_id: &'a str,
    pub object: &'a str,
}

/// Follows `path` through nested objects, e.g. `["lineage", "parent", "url"]`.
pub fn lookup<'a>(entity: &'a Entity, path: &[&str]) -> Option<&'a Value> {
    let (first, rest) = path.split_first()?;
    rest.iter()
        .try_fold(entity.get(*first)?, |value, key| value.get(*key))
}
