pub const DEFAULT_API_ROOT: &str = "https://api.ultralytics.com";
pub const DEFAULT_WEB_ROOT: &str = "https://hub.ultralytics.com";
pub const DEFAULT_AUTH_URL: &str =
    "http://localhost:9099/identitytoolkit.googleapis.com/v1/accounts:signInWithPassword";

/// Service roots and error policy shared by every client built from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HubConfig {
    pub api_root: String,
    pub web_root: String,
    /// Identity-toolkit sign-in URL used for email/password login.
    pub auth_url: String,
    /// When set, failed API calls are logged and surface as `Ok(None)`
    /// instead of `Err(HubError::Api)`.
    pub suppress_errors: bool,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            api_root: DEFAULT_API_ROOT.to_string(),
            web_root: DEFAULT_WEB_ROOT.to_string(),
            auth_url: DEFAULT_AUTH_URL.to_string(),
            suppress_errors: true,
        }
    }
}

impl HubConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_root: env_or("ULTRALYTICS_HUB_API", defaults.api_root),
            web_root: env_or("ULTRALYTICS_HUB_WEB", defaults.web_root),
            auth_url: env_or("ULTRALYTICS_FIREBASE_AUTH_URL", defaults.auth_url),
            suppress_errors: std::env::var("ULTRALYTICS_HUB_EXCEPTIONS")
                .map(|v| parse_flag(&v))
                .unwrap_or(defaults.suppress_errors),
        }
    }

    /// Builds `{api_root}/v1{path}`; `path` is expected to start with `/`.
    pub fn v1_url(&self, path: &str) -> String {
        format!("{}/v1{}", self.api_root.trim_end_matches('/'), path)
    }
}

fn env_or(key: &str, default: String) -> String {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or(default)
}

pub fn parse_flag(raw: &str) -> bool {
    raw.trim().eq_ignore_ascii_case("true")
}
