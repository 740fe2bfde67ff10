use std::sync::Arc;

use hub_common::{status_message, HubConfig, RATE_LIMIT_RESET_HEADER};
use hub_transport::{Headers, HttpRequest, Method, RequestBody, Transport, TransportError};
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub api_key: Option<String>,
    pub id_token: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

impl Credentials {
    /// API key from `HUB_API_KEY`, nothing else.
    pub fn from_env() -> Self {
        Self {
            api_key: std::env::var("HUB_API_KEY").ok().filter(|k| !k.is_empty()),
            ..Self::default()
        }
    }

    pub fn api_key(key: impl Into<String>) -> Self {
        Self {
            api_key: Some(key.into()),
            ..Self::default()
        }
    }

    pub fn id_token(token: impl Into<String>) -> Self {
        Self {
            id_token: Some(token.into()),
            ..Self::default()
        }
    }

    pub fn email_password(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: Some(email.into()),
            password: Some(password.into()),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.api_key.is_none()
            && self.id_token.is_none()
            && (self.email.is_none() || self.password.is_none())
    }
}

#[derive(Debug, Default, Deserialize)]
struct AuthCheck {
    #[serde(default)]
    success: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInResponse {
    id_token: Option<String>,
}

/// API-key / ID-token state for one client.
pub struct Auth {
    transport: Arc<dyn Transport>,
    config: HubConfig,
    api_key: Option<String>,
    id_token: Option<String>,
}

impl Auth {
    pub fn new(transport: Arc<dyn Transport>, config: HubConfig) -> Self {
        Self {
            transport,
            config,
            api_key: None,
            id_token: None,
        }
    }

    pub fn set_api_key(&mut self, key: Option<String>) {
        self.api_key = key;
    }

    pub fn set_id_token(&mut self, token: Option<String>) {
        self.id_token = token;
    }

    pub fn has_credentials(&self) -> bool {
        self.id_token.is_some() || self.api_key.is_some()
    }

    /// Bearer ID token wins over the API key.
    pub fn auth_header(&self) -> Option<Headers> {
        if let Some(token) = &self.id_token {
            Some(Headers::from([(
                "authorization".to_string(),
                format!("Bearer {token}"),
            )]))
        } else {
            self.api_key
                .as_ref()
                .map(|key| Headers::from([("x-api-key".to_string(), key.clone())]))
        }
    }

    /// Checks the stored credentials against the API. Invalid credentials
    /// are cleared.
    pub async fn authenticate(&mut self) -> bool {
        let Some(header) = self.auth_header() else {
            tracing::warn!("no API key or ID token set, cannot authenticate");
            self.reset();
            return false;
        };

        let req = HttpRequest::new(Method::POST, self.config.v1_url("/auth")).headers(&header);
        match self.transport.send(req).await {
            Ok(resp) if resp.json::<AuthCheck>().unwrap_or_default().success => return true,
            Ok(_) => tracing::warn!("invalid API key"),
            Err(e) => log_failure("authentication failed", &e),
        }

        self.reset();
        false
    }

    /// Email/password sign-in; stores the returned ID token.
    pub async fn authorize(&mut self, email: &str, password: &str) -> bool {
        let req = HttpRequest::new(Method::POST, self.config.auth_url.clone())
            .header("origin", self.config.web_root.clone())
            .body(RequestBody::Json(json!({"email": email, "password": password})));

        match self.transport.send(req).await {
            Ok(resp) => match resp.json::<SignInResponse>().ok().and_then(|r| r.id_token) {
                Some(token) => {
                    self.id_token = Some(token);
                    return true;
                }
                None => tracing::warn!("sign-in response did not carry an ID token"),
            },
            Err(e) => log_failure("authorization failed", &e),
        }
        false
    }

    fn reset(&mut self) {
        self.api_key = None;
        self.id_token = None;
    }
}

fn log_failure(what: &str, e: &TransportError) {
    let status = e.status().map(|s| s.as_u16());
    let message = status_message(status, e.header(RATE_LIMIT_RESET_HEADER));
    tracing::warn!(?status, error=%e, "{what}: {message}");
}
