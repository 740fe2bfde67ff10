use std::path::PathBuf;

use chrono::DateTime;
use thiserror::Error;

pub const RATE_LIMIT_RESET_HEADER: &str = "x-ratelimit-reset";

#[derive(Debug, Error)]
pub enum HubError {
    /// A request failed at the transport level; `message` comes from [`status_message`].
    #[error("{message}")]
    Api {
        message: String,
        status: Option<u16>,
    },

    #[error("Access Denied: Authentication required.")]
    Unauthenticated,

    #[error("page size must be greater than zero")]
    InvalidPageSize,

    #[error("no {0} id has been set; update the id or create the {0} first")]
    MissingId(&'static str),

    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("unexpected response: {0}")]
    Decode(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl HubError {
    pub fn status(&self) -> Option<u16> {
        match self {
            HubError::Api { status, .. } => *status,
            _ => None,
        }
    }
}

pub type HubResult<T> = Result<T, HubError>;

/// Human-readable message for a failed request.
///
/// `status` is `None` when the request never produced a response (timeouts,
/// refused connections). `rate_limit_reset` is the raw `X-RateLimit-Reset`
/// header value, only consulted for 429.
pub fn status_message(status: Option<u16>, rate_limit_reset: Option<&str>) -> String {
    match status {
        Some(401) => "Unauthorized: Please check your credentials.".to_string(),
        Some(404) => "Resource not found.".to_string(),
        Some(500) => "Internal server error.".to_string(),
        Some(429) => rate_limited_message(rate_limit_reset),
        Some(code) => http::StatusCode::from_u16(code)
            .ok()
            .and_then(|s| s.canonical_reason())
            .map(str::to_string)
            .unwrap_or_else(unknown_error),
        None => unknown_error(),
    }
}

fn unknown_error() -> String {
    "Unknown error occurred.".to_string()
}

fn rate_limited_message(reset: Option<&str>) -> String {
    let Some(raw) = reset else {
        return "Rate Limits Exceeded: Please try again later.".to_string();
    };

    let reset_time = raw
        .trim()
        .parse::<i64>()
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "unknown".to_string());

    format!(
        "You have exceeded the rate limits for this request. \
         You will be able to make requests again after {reset_time}."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_status_messages() {
        assert_eq!(
            status_message(Some(401), None),
            "Unauthorized: Please check your credentials."
        );
        assert_eq!(status_message(Some(404), None), "Resource not found.");
        assert_eq!(status_message(Some(500), None), "Internal server error.");
    }

    #[test]
    fn test_fallback_messages() {
        assert_eq!(status_message(Some(503), None), "Service Unavailable");
        assert_eq!(status_message(Some(599), None), "Unknown error occurred.");
        assert_eq!(status_message(None, None), "Unknown error occurred.");
    }

    #[test]
    fn test_rate_limit_messages() {
        assert_eq!(
            status_message(Some(429), None),
            "Rate Limits Exceeded: Please try again later."
        );
        assert_eq!(
            status_message(Some(429), Some("0")),
            "You have exceeded the rate limits for this request. \
             You will be able to make requests again after 1970-01-01 00:00:00."
        );
        assert!(status_message(Some(429), Some("soon")).ends_with("after unknown."));
    }

    #[test]
    fn test_error_status() {
        let err = HubError::Api {
            message: status_message(Some(404), None),
            status: Some(404),
        };
        assert_eq!(err.status(), Some(404));
        assert_eq!(err.to_string(), "Resource not found.");
        assert_eq!(HubError::InvalidPageSize.status(), None);
    }
}
