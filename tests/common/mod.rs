//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::time::Duration;

use axum_adapter::AxumAdapter;

/// Start `adapter` on an ephemeral localhost port.
pub async fn start(adapter: &mut AxumAdapter) -> SocketAddr {
    adapter
        .listen("127.0.0.1:0")
        .await
        .expect("adapter should bind an ephemeral port")
}

/// Client without connection pooling, so every request opens a fresh connection.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .timeout(Duration::from_secs(10))
        .build()
        .unwrap()
}

pub fn url(addr: SocketAddr, path: &str) -> String {
    format!("http://{addr}{path}")
}
