use std::sync::Arc;

use hub_common::{HubConfig, HubError, HubResult};
use hub_transport::{ReqwestTransport, Transport};

use crate::api::ApiClient;
use crate::auth::{Auth, Credentials};
use crate::paginated::{ListOptions, PaginatedList};
use crate::resources::datasets::{dataset_list, Dataset};
use crate::resources::models::{model_list, Model};
use crate::resources::projects::{project_list, Project};
use crate::resources::teams::{team_list, Team};
use crate::resources::users::User;

/// Entry point: logs in once, then hands out resource facades and lists
/// that share its transport and auth headers.
pub struct HubClient {
    config: HubConfig,
    transport: Arc<dyn Transport>,
    auth: Auth,
    authenticated: bool,
}

impl std::fmt::Debug for HubClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HubClient")
            .field("api_root", &self.config.api_root)
            .field("authenticated", &self.authenticated)
            .finish()
    }
}

impl HubClient {
    pub fn new(config: HubConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            auth: Auth::new(transport.clone(), config.clone()),
            config,
            transport,
            authenticated: false,
        }
    }

    /// Builds a client over HTTP and logs in. Empty credentials fall back
    /// to `HUB_API_KEY`.
    pub async fn connect(config: HubConfig, credentials: Credentials) -> Self {
        let credentials = if credentials.is_empty() {
            Credentials::from_env()
        } else {
            credentials
        };
        let mut client = Self::new(config, Arc::new(ReqwestTransport::new()));
        client.login(&credentials).await;
        client
    }

    /// API key or ID token are checked against the API; email and password
    /// are only used when neither is given.
    pub async fn login(&mut self, credentials: &Credentials) -> bool {
        self.auth.set_api_key(credentials.api_key.clone());
        self.auth.set_id_token(credentials.id_token.clone());

        let ok = if self.auth.has_credentials() {
            self.auth.authenticate().await
        } else if let (Some(email), Some(password)) = (&credentials.email, &credentials.password) {
            self.auth.authorize(email, password).await
        } else {
            tracing::warn!("no credentials provided");
            false
        };

        if ok {
            tracing::info!(api_root = %self.config.api_root, "authenticated");
            self.authenticated = true;
        }
        ok
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    pub fn config(&self) -> &HubConfig {
        &self.config
    }

    pub async fn model(&self, id: Option<&str>) -> HubResult<Model> {
        Ok(Model::new(&self.api(false)?, &self.config, id).await)
    }

    pub async fn dataset(&self, id: Option<&str>) -> HubResult<Dataset> {
        Ok(Dataset::new(&self.api(false)?, &self.config, id).await)
    }

    pub async fn project(&self, id: Option<&str>) -> HubResult<Project> {
        Ok(Project::new(&self.api(false)?, &self.config, id).await)
    }

    pub async fn user(&self, id: Option<&str>) -> HubResult<User> {
        Ok(User::new(&self.api(false)?, &self.config, id).await)
    }

    pub async fn team(&self, id: Option<&str>) -> HubResult<Team> {
        Ok(Team::new(&self.api(false)?, &self.config, id).await)
    }

    pub async fn model_list(&self, options: ListOptions) -> HubResult<PaginatedList> {
        model_list(&self.api(is_public(&options))?, &self.config, options).await
    }

    pub async fn dataset_list(&self, options: ListOptions) -> HubResult<PaginatedList> {
        dataset_list(&self.api(is_public(&options))?, &self.config, options).await
    }

    pub async fn project_list(&self, options: ListOptions) -> HubResult<PaginatedList> {
        project_list(&self.api(is_public(&options))?, &self.config, options).await
    }

    pub async fn team_list(&self, options: ListOptions) -> HubResult<PaginatedList> {
        team_list(&self.api(is_public(&options))?, &self.config, options).await
    }

    fn api(&self, public: bool) -> HubResult<ApiClient> {
        if !self.authenticated && !public {
            return Err(HubError::Unauthenticated);
        }
        Ok(ApiClient::new(
            self.transport.clone(),
            self.config.api_root.clone(),
            self.auth.auth_header().unwrap_or_default(),
            self.config.suppress_errors,
        ))
    }
}

fn is_public(options: &ListOptions) -> bool {
    options.public == Some(true)
}
