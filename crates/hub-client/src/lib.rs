pub mod api;
pub mod auth;
pub mod client;
pub mod crud;
pub mod heartbeat;
pub mod paginated;
pub mod resources;
pub mod uploads;

pub use api::{response_data, ApiClient};
pub use auth::{Auth, Credentials};
pub use client::HubClient;
pub use crud::CrudClient;
pub use heartbeat::{Heartbeat, RateLimits, AGENT_NAME, HEARTBEAT_INTERVAL};
pub use paginated::{ListOptions, PaginatedList};
pub use resources::datasets::Dataset;
pub use resources::models::Model;
pub use resources::projects::Project;
pub use resources::teams::Team;
pub use resources::users::User;
pub use resources::{Facade, Record};
pub use uploads::{Checkpoint, DatasetUpload, ModelUpload, ProjectUpload, StorageClient};
