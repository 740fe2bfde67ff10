use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use dashmap::DashMap;
use http::{Method, StatusCode};
use serde_json::json;

use crate::types::{HttpRequest, HttpResponse, Transport, TransportError};

pub type Responder =
    Arc<dyn Fn(&HttpRequest) -> Result<HttpResponse, TransportError> + Send + Sync>;

/// In-process [`Transport`]: routes are matched on method and URL (query
/// string excluded); unmatched requests get a 404. Every request is recorded.
#[derive(Clone, Default)]
pub struct MemoryTransport {
    routes: Arc<DashMap<(Method, String), Responder>>,
    log: Arc<Mutex<Vec<HttpRequest>>>,
}

impl std::fmt::Debug for MemoryTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryTransport")
            .field("routes", &self.routes.len())
            .field("requests", &self.request_count())
            .finish()
    }
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route<F>(&self, method: Method, url: impl Into<String>, responder: F) -> &Self
    where
        F: Fn(&HttpRequest) -> Result<HttpResponse, TransportError> + Send + Sync + 'static,
    {
        self.routes.insert((method, url.into()), Arc::new(responder));
        self
    }

    /// Route that always answers 200 with `body` as JSON.
    pub fn route_json(&self, method: Method, url: impl Into<String>, body: serde_json::Value) -> &Self {
        self.route(method, url, move |_| Ok(HttpResponse::ok_json(&body)))
    }

    /// Route that always fails with `status`.
    pub fn route_status(&self, method: Method, url: impl Into<String>, status: StatusCode) -> &Self {
        self.route(method, url, move |_| {
            TransportError::check(HttpResponse::new(status, Vec::new()))
        })
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.log.lock().map(|g| g.clone()).unwrap_or_default()
    }

    pub fn request_count(&self) -> usize {
        self.log.lock().map(|g| g.len()).unwrap_or_default()
    }

    pub fn requests_to(&self, method: &Method, url: &str) -> Vec<HttpRequest> {
        self.requests()
            .into_iter()
            .filter(|r| &r.method == method && r.path() == url)
            .collect()
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        if let Ok(mut log) = self.log.lock() {
            log.push(request.clone());
        }

        let key = (request.method.clone(), request.path().to_string());
        let responder = self.routes.get(&key).map(|r| r.value().clone());
        let result = match responder {
            Some(respond) => respond(&request),
            None => Ok(HttpResponse::json_value(
                StatusCode::NOT_FOUND,
                &json!({"message": "route not found"}),
            )),
        };
        result.and_then(TransportError::check)
    }
}
