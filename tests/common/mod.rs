//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use tokio::net::TcpListener;

use waitlist_service::config::WaitlistConfig;
use waitlist_service::http::HttpServer;
use waitlist_service::lifecycle::Shutdown;
use waitlist_service::storage::WaitlistStore;

/// A running server on an ephemeral port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub client: reqwest::Client,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// POST a submission as client `ip`; returns status and JSON body.
    pub async fn join(&self, body: Value, ip: &str) -> (u16, Value) {
        let res = self
            .client
            .post(self.url("/api/waitlist"))
            .header("x-forwarded-for", ip)
            .json(&body)
            .send()
            .await
            .expect("server unreachable");
        let status = res.status().as_u16();
        (status, res.json().await.expect("non-JSON response"))
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Start a server over `store` and wait until it accepts connections.
pub async fn start_server(config: WaitlistConfig, store: Arc<dyn WaitlistStore>) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config, store);
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    let client = reqwest::Client::builder()
        .no_proxy()
        .timeout(Duration::from_secs(10))
        .build()
        .unwrap();

    TestServer {
        addr,
        shutdown,
        client,
    }
}

#[allow(dead_code)]
pub fn submission(email: &str, role: &str) -> Value {
    json!({ "email": email, "role": role })
}
