pub mod config;
pub mod entity;
pub mod error;
pub mod telemetry;

pub use config::HubConfig;
pub use entity::{
    lookup, CreatedRecord, Entity, Envelope, HeartbeatAck, HeartbeatRequest, PageResult,
    StorageLink, StorageLinkRequest,
};
pub use error::{status_message, HubError, HubResult, RATE_LIMIT_RESET_HEADER};
