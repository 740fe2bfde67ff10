use std::sync::Arc;

use hub_common::{status_message, Envelope, HubError, HubResult, RATE_LIMIT_RESET_HEADER};
use hub_transport::{Headers, HttpRequest, HttpResponse, Method, RequestBody, Transport};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Sends requests relative to a base URL with a fixed header set.
///
/// Failed requests are logged with a message from [`status_message`]; they
/// then either become `Err(HubError::Api)` or, with `suppress_errors`, `Ok(None)`.
#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn Transport>,
    base_url: String,
    headers: Headers,
    suppress_errors: bool,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("suppress_errors", &self.suppress_errors)
            .finish()
    }
}

impl ApiClient {
    pub fn new(
        transport: Arc<dyn Transport>,
        base_url: impl Into<String>,
        headers: Headers,
        suppress_errors: bool,
    ) -> Self {
        Self {
            transport,
            base_url: base_url.into(),
            headers,
            suppress_errors,
        }
    }

    /// Same transport, headers and error policy against another base URL.
    pub fn rebase(&self, base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..self.clone()
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn suppress_errors(&self) -> bool {
        self.suppress_errors
    }

    /// Absolute endpoints (`http…`) bypass the base URL.
    pub fn url(&self, endpoint: &str) -> String {
        if endpoint.starts_with("http") {
            endpoint.to_string()
        } else {
            format!("{}{}", self.base_url, endpoint)
        }
    }

    pub async fn request(
        &self,
        method: Method,
        endpoint: &str,
        query: &[(&str, String)],
        body: RequestBody,
    ) -> HubResult<Option<HttpResponse>> {
        let url = self.url(endpoint);
        let mut req = HttpRequest::new(method.clone(), url.clone())
            .headers(&self.headers)
            .body(body);
        for (name, value) in query {
            req = req.query(name, value);
        }

        match self.transport.send(req).await {
            Ok(resp) => Ok(Some(resp)),
            Err(e) => {
                let status = e.status().map(|s| s.as_u16());
                let message = status_message(status, e.header(RATE_LIMIT_RESET_HEADER));
                tracing::error!(%method, %url, ?status, error=%e, "{message}");
                if self.suppress_errors {
                    Ok(None)
                } else {
                    Err(HubError::Api { message, status })
                }
            }
        }
    }

    pub async fn get(
        &self,
        endpoint: &str,
        query: &[(&str, String)],
    ) -> HubResult<Option<HttpResponse>> {
        self.request(Method::GET, endpoint, query, RequestBody::Empty)
            .await
    }

    pub async fn post(&self, endpoint: &str, body: RequestBody) -> HubResult<Option<HttpResponse>> {
        self.request(Method::POST, endpoint, &[], body).await
    }

    pub async fn post_json(&self, endpoint: &str, body: Value) -> HubResult<Option<HttpResponse>> {
        self.post(endpoint, RequestBody::Json(body)).await
    }

    pub async fn put(&self, endpoint: &str, body: RequestBody) -> HubResult<Option<HttpResponse>> {
        self.request(Method::PUT, endpoint, &[], body).await
    }

    pub async fn patch(&self, endpoint: &str, body: RequestBody) -> HubResult<Option<HttpResponse>> {
        self.request(Method::PATCH, endpoint, &[], body).await
    }

    pub async fn delete(
        &self,
        endpoint: &str,
        query: &[(&str, String)],
    ) -> HubResult<Option<HttpResponse>> {
        self.request(Method::DELETE, endpoint, query, RequestBody::Empty)
            .await
    }
}

/// Decodes the `data` field of an API response.
pub fn response_data<T: DeserializeOwned + Default>(resp: &HttpResponse) -> HubResult<T> {
    let envelope: Envelope<T> = resp
        .json()
        .map_err(|e| HubError::Decode(format!("{e}: {}", resp.text())))?;
    Ok(envelope.data)
}

#[cfg(test)]
mod tests {
    use hub_transport::{MemoryTransport, StatusCode};
    use serde_json::json;

    use super::*;

    fn client(transport: &MemoryTransport, suppress: bool) -> ApiClient {
        let headers = Headers::from([("x-api-key".to_string(), "k".to_string())]);
        ApiClient::new(
            Arc::new(transport.clone()),
            "http://hub/v1/models",
            headers,
            suppress,
        )
    }

    #[tokio::test]
    async fn test_relative_and_absolute_endpoints() {
        let transport = MemoryTransport::new();
        transport.route_json(Method::GET, "http://hub/v1/models/m1", json!({"data": {}}));
        transport.route_json(Method::POST, "http://other/v1/storage", json!({"data": {}}));
        let api = client(&transport, false);

        api.get("/m1", &[]).await.unwrap().unwrap();
        api.post_json("http://other/v1/storage", json!({})).await.unwrap().unwrap();

        let reqs = transport.requests();
        assert_eq!(reqs[0].url, "http://hub/v1/models/m1");
        assert_eq!(reqs[0].headers.get("x-api-key").map(String::as_str), Some("k"));
        assert_eq!(reqs[1].url, "http://other/v1/storage");
    }

    #[tokio::test]
    async fn test_failure_raises_when_not_suppressed() {
        let transport = MemoryTransport::new();
        transport.route_status(Method::GET, "http://hub/v1/models/m1", StatusCode::UNAUTHORIZED);
        let api = client(&transport, false);

        let err = api.get("/m1", &[]).await.unwrap_err();
        assert_eq!(err.status(), Some(401));
        assert_eq!(err.to_string(), "Unauthorized: Please check your credentials.");
    }

    #[tokio::test]
    async fn test_failure_suppressed_to_none() {
        let transport = MemoryTransport::new();
        let api = client(&transport, true);
        assert!(api.get("/missing", &[]).await.unwrap().is_none());
    }

    #[test]
    fn test_response_data() {
        let resp = HttpResponse::ok_json(&json!({"data": {"id": "abc"}}));
        let created: hub_common::CreatedRecord = response_data(&resp).unwrap();
        assert_eq!(created.id.as_deref(), Some("abc"));

        let bad = HttpResponse::new(StatusCode::OK, "not json");
        let err = response_data::<hub_common::CreatedRecord>(&bad).unwrap_err();
        assert!(matches!(err, HubError::Decode(_)));
    }
}
