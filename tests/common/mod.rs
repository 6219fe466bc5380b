//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::fs;
use std::net::SocketAddr;
use std::path::Path;

use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use maintenance_response::config::{GatewayConfig, MaintenanceConfig};
use maintenance_response::lifecycle::Shutdown;
use maintenance_response::HttpServer;

pub const HTML_PAGE: &str = "<html><body><h1>Down for maintenance</h1></body></html>";
pub const JSON_PAGE: &str = r#"{"status":"maintenance"}"#;

/// Start a mock upstream that answers every request with `200 OK` and `body`.
pub async fn start_mock_backend(body: &'static str) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    tokio::spawn(async move {
                        let mut buf = [0u8; 4096];
                        let _ = socket.read(&mut buf).await;
                        let response = format!(
                            "HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

/// A temp directory holding an HTML and a JSON maintenance page.
pub fn maintenance_pages() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("index.html"), HTML_PAGE).unwrap();
    fs::write(dir.path().join("status.json"), JSON_PAGE).unwrap();
    dir
}

/// Enabled maintenance config serving every page in `dir`.
pub fn maintenance_config(dir: &Path, filters: &[&str]) -> MaintenanceConfig {
    MaintenanceConfig {
        enabled: true,
        content: vec![format!("{}/*", dir.display())],
        query_filter: filters.iter().map(|f| f.to_string()).collect(),
    }
}

/// Gateway config pointing at `upstream`, listening on an ephemeral port.
pub fn gateway_config(upstream: SocketAddr, maintenance: MaintenanceConfig) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.upstream.address = upstream.to_string();
    config.maintenance = maintenance;
    config
}

/// A running gateway and the means to drive it.
pub struct TestGateway {
    pub addr: SocketAddr,
    pub updates: tokio::sync::mpsc::UnboundedSender<GatewayConfig>,
    pub shutdown: Shutdown,
    pub task: tokio::task::JoinHandle<Result<(), std::io::Error>>,
}

impl TestGateway {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

/// Start a gateway with `config` on an ephemeral port.
pub async fn start_gateway(config: GatewayConfig) -> TestGateway {
    let listener = TcpListener::bind(&config.listener.bind_address).await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (updates, config_updates) = tokio::sync::mpsc::unbounded_channel();
    let shutdown = Shutdown::new();

    let server = HttpServer::new(config);
    let task = tokio::spawn(server.run(listener, config_updates, shutdown.subscribe()));

    TestGateway {
        addr,
        updates,
        shutdown,
        task,
    }
}
