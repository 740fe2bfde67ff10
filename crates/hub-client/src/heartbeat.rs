use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use hub_common::{HeartbeatAck, HeartbeatRequest, HubConfig};
use tokio::sync::Notify;
use tokio::task::JoinHandle;

use crate::api::{response_data, ApiClient};

/// Default spacing between heartbeats.
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(300);

/// Client identity reported in every heartbeat.
pub const AGENT_NAME: &str = concat!("hub-sdk-rs-", env!("CARGO_PKG_VERSION"), "-local");

/// Minimum spacing the server expects per reporting channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimits {
    pub metrics: Duration,
    pub ckpt: Duration,
    pub heartbeat: Duration,
}

impl Default for RateLimits {
    fn default() -> Self {
        Self {
            metrics: Duration::from_secs(3),
            ckpt: Duration::from_secs(900),
            heartbeat: HEARTBEAT_INTERVAL,
        }
    }
}

/// Background liveness reporter for one model.
///
/// Clones share state: `stop()` on any clone ends every loop started from
/// any of them. Stopping is one-way; a stopped heartbeat never sends again.
#[derive(Clone)]
pub struct Heartbeat {
    api: ApiClient,
    agent: String,
    rate_limits: RateLimits,
    alive: Arc<AtomicBool>,
    wake: Arc<Notify>,
    agent_id: Arc<Mutex<Option<String>>>,
    tasks: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl std::fmt::Debug for Heartbeat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Heartbeat")
            .field("agent", &self.agent)
            .field("alive", &self.is_alive())
            .field("agent_id", &self.agent_id())
            .finish()
    }
}

impl Heartbeat {
    pub fn new(api: &ApiClient, config: &HubConfig) -> Self {
        Self {
            api: api.rebase(config.v1_url("/agent/heartbeat/models")),
            agent: AGENT_NAME.to_string(),
            rate_limits: RateLimits::default(),
            alive: Arc::new(AtomicBool::new(true)),
            wake: Arc::new(Notify::new()),
            agent_id: Arc::new(Mutex::new(None)),
            tasks: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_agent(mut self, agent: impl Into<String>) -> Self {
        self.agent = agent.into();
        self
    }

    pub fn agent(&self) -> &str {
        &self.agent
    }

    pub fn rate_limits(&self) -> RateLimits {
        self.rate_limits
    }

    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    /// True while any spawned loop has not exited yet.
    pub fn is_running(&self) -> bool {
        self.tasks
            .lock()
            .map(|tasks| tasks.iter().any(|t| !t.is_finished()))
            .unwrap_or(false)
    }

    /// Latest agent id assigned by the server.
    pub fn agent_id(&self) -> Option<String> {
        self.agent_id.lock().ok().and_then(|g| g.clone())
    }

    /// Spawns a heartbeat loop for `model_id` and returns immediately.
    /// Each call spawns another loop; loops are not deduplicated.
    ///
    /// # Panics
    ///
    /// Panics when called outside a Tokio runtime.
    pub fn start(&self, model_id: &str, interval: Duration) {
        let this = self.clone();
        let model_id = model_id.to_string();
        let handle = tokio::spawn(async move { this.run(model_id, interval).await });
        if let Ok(mut tasks) = self.tasks.lock() {
            tasks.retain(|t| !t.is_finished());
            tasks.push(handle);
        }
    }

    /// Clears the liveness flag. Loops exit at the top of their next
    /// iteration; a heartbeat already in flight still completes.
    pub fn stop(&self) {
        if self.alive.swap(false, Ordering::SeqCst) {
            tracing::info!(agent = %self.agent, "heartbeat stopped");
        }
        self.wake.notify_waiters();
    }

    /// Stops and waits for every spawned loop. Returns false if the loops
    /// did not finish within `timeout`.
    pub async fn shutdown(&self, timeout: Duration) -> bool {
        self.stop();
        let tasks: Vec<JoinHandle<()>> = match self.tasks.lock() {
            Ok(mut tasks) => tasks.drain(..).collect(),
            Err(_) => Vec::new(),
        };
        tokio::time::timeout(timeout, futures_util::future::join_all(tasks))
            .await
            .is_ok()
    }

    /// Calls `stop()` once `signal` resolves, e.g. `tokio::signal::ctrl_c()`.
    /// Like `start`, this must run inside a Tokio runtime.
    pub fn stop_on<F>(&self, signal: F) -> JoinHandle<()>
    where
        F: Future + Send + 'static,
    {
        let this = self.clone();
        tokio::spawn(async move {
            signal.await;
            this.stop();
        })
    }

    async fn run(self, model_id: String, interval: Duration) {
        let endpoint = format!("/{model_id}");
        tracing::debug!(%model_id, ?interval, "heartbeat loop started");

        while self.is_alive() {
            let request = HeartbeatRequest {
                agent: self.agent.clone(),
                agent_id: self.agent_id(),
            };
            let body = match serde_json::to_value(&request) {
                Ok(body) => body,
                Err(e) => {
                    tracing::error!(%model_id, error=%e, "failed to encode heartbeat");
                    break;
                }
            };

            let ack = match self.api.post_json(&endpoint, body).await {
                Ok(Some(resp)) => response_data::<HeartbeatAck>(&resp),
                Ok(None) => {
                    tracing::warn!(%model_id, "heartbeat failed, stopping");
                    break;
                }
                Err(e) => Err(e),
            };
            match ack {
                Ok(ack) => self.reconcile(ack.agent_id),
                Err(e) => {
                    tracing::warn!(%model_id, error=%e, "heartbeat failed, stopping");
                    break;
                }
            }

            let wake = self.wake.notified();
            if !self.is_alive() {
                break;
            }
            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                _ = wake => {}
            }
        }
        tracing::debug!(%model_id, "heartbeat loop exited");
    }

    /// Adopts whatever id the server returned, including none.
    fn reconcile(&self, assigned: Option<String>) {
        if let Ok(mut current) = self.agent_id.lock() {
            if *current != assigned {
                tracing::info!(agent_id = ?assigned, "agent id reassigned");
                *current = assigned;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use hub_transport::{Headers, HttpResponse, MemoryTransport, Method, StatusCode};
    use serde_json::{json, Value};

    use super::*;

    const URL: &str = "http://hub/v1/agent/heartbeat/models/m1";

    fn heartbeat(transport: &MemoryTransport) -> Heartbeat {
        let config = HubConfig {
            api_root: "http://hub".to_string(),
            suppress_errors: false,
            ..HubConfig::default()
        };
        let api = ApiClient::new(Arc::new(transport.clone()), "", Headers::new(), false);
        Heartbeat::new(&api, &config)
    }

    fn serve_counting_ids(transport: &MemoryTransport) {
        let counter = Arc::new(AtomicUsize::new(0));
        transport.route(Method::POST, URL, move |_| {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(HttpResponse::ok_json(&json!({"data": {"agentId": format!("agent-{n}")}})))
        });
    }

    async fn wait_for_requests(transport: &MemoryTransport, n: usize) {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        while transport.request_count() < n && tokio::time::Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    #[test]
    fn test_defaults() {
        let limits = RateLimits::default();
        assert_eq!(limits.metrics, Duration::from_secs(3));
        assert_eq!(limits.ckpt, Duration::from_secs(900));
        assert_eq!(limits.heartbeat, Duration::from_secs(300));
        assert!(AGENT_NAME.starts_with("hub-sdk-rs-"));
        assert!(AGENT_NAME.ends_with("-local"));
    }

    #[tokio::test]
    async fn test_agent_id_tracks_last_response() {
        let transport = MemoryTransport::new();
        serve_counting_ids(&transport);
        let hb = heartbeat(&transport);

        hb.start("m1", Duration::from_millis(10));
        wait_for_requests(&transport, 3).await;
        assert!(hb.shutdown(Duration::from_secs(5)).await);

        let sent = transport.requests_to(&Method::POST, URL);
        let n = sent.len();
        assert!(n >= 3);
        assert_eq!(hb.agent_id(), Some(format!("agent-{n}")));

        // Each payload carries the id assigned by the previous response.
        assert_eq!(sent[0].json_body(), Some(&json!({"agent": AGENT_NAME, "agentId": null})));
        for (i, req) in sent.iter().enumerate().skip(1) {
            let body = req.json_body().cloned().unwrap_or(Value::Null);
            assert_eq!(body["agentId"], json!(format!("agent-{i}")));
        }
    }

    #[tokio::test]
    async fn test_null_agent_id_clears_current() {
        let transport = MemoryTransport::new();
        let counter = Arc::new(AtomicUsize::new(0));
        transport.route(Method::POST, URL, move |_| {
            let agent_id = match counter.fetch_add(1, Ordering::SeqCst) {
                0 => json!("a1"),
                _ => Value::Null,
            };
            Ok(HttpResponse::ok_json(&json!({"data": {"agentId": agent_id}})))
        });
        let hb = heartbeat(&transport);

        hb.start("m1", Duration::from_millis(10));
        wait_for_requests(&transport, 3).await;
        assert!(hb.shutdown(Duration::from_secs(5)).await);

        assert_eq!(hb.agent_id(), None);
        let sent = transport.requests_to(&Method::POST, URL);
        assert!(sent.len() >= 3);
        assert_eq!(sent[1].json_body().map(|b| &b["agentId"]), Some(&json!("a1")));
        assert_eq!(sent[2].json_body().map(|b| &b["agentId"]), Some(&Value::Null));
    }

    #[tokio::test]
    async fn test_no_posts_after_stop() {
        let transport = MemoryTransport::new();
        serve_counting_ids(&transport);
        let hb = heartbeat(&transport);

        hb.start("m1", Duration::from_secs(60));
        wait_for_requests(&transport, 1).await;
        assert!(hb.is_running());
        hb.stop();
        assert!(hb.shutdown(Duration::from_secs(5)).await);
        let count = transport.request_count();
        assert_eq!(count, 1);
        assert!(!hb.is_running());

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(transport.request_count(), count);

        // A stopped heartbeat stays stopped.
        hb.start("m1", Duration::from_millis(1));
        assert!(hb.shutdown(Duration::from_secs(5)).await);
        assert_eq!(transport.request_count(), count);
    }

    #[tokio::test]
    async fn test_error_ends_loop() {
        let transport = MemoryTransport::new();
        transport.route_status(Method::POST, URL, StatusCode::INTERNAL_SERVER_ERROR);
        let hb = heartbeat(&transport);

        hb.start("m1", Duration::from_millis(1));
        assert!(hb.shutdown_after_exit().await);
        assert_eq!(transport.request_count(), 1);
        assert_eq!(hb.agent_id(), None);
    }

    #[tokio::test]
    async fn test_each_start_spawns_a_loop() {
        let transport = MemoryTransport::new();
        serve_counting_ids(&transport);
        let hb = heartbeat(&transport);

        hb.start("m1", Duration::from_secs(60));
        hb.start("m1", Duration::from_secs(60));
        wait_for_requests(&transport, 2).await;
        assert!(hb.shutdown(Duration::from_secs(5)).await);
        assert_eq!(transport.request_count(), 2);
    }

    #[tokio::test]
    async fn test_stop_on_signal() {
        let transport = MemoryTransport::new();
        serve_counting_ids(&transport);
        let hb = heartbeat(&transport);
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();

        hb.start("m1", Duration::from_secs(60));
        let hook = hb.stop_on(async move {
            let _ = rx.await;
        });
        wait_for_requests(&transport, 1).await;
        assert!(hb.is_alive());

        tx.send(()).unwrap();
        hook.await.unwrap();
        assert!(!hb.is_alive());
        assert!(hb.shutdown(Duration::from_secs(5)).await);
        assert_eq!(transport.request_count(), 1);
    }

    impl Heartbeat {
        /// Joins loops that exit on their own, without clearing `alive`.
        async fn shutdown_after_exit(&self) -> bool {
            let tasks: Vec<JoinHandle<()>> = self.tasks.lock().unwrap().drain(..).collect();
            tokio::time::timeout(Duration::from_secs(5), futures_util::future::join_all(tasks))
                .await
                .is_ok()
        }
    }
}
