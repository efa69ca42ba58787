//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use serde_json::Value;
use tempfile::TempDir;
use tokio::net::TcpListener;

use config_service::store::Settings;
use config_service::{ConfigServer, ConfigStore, ServiceConfig, Shutdown};

/// An isolated server with its own settings file.
pub struct TestServer {
    pub addr: SocketAddr,
    pub settings_path: PathBuf,
    shutdown: Shutdown,
    _dir: TempDir,
}

impl TestServer {
    pub fn config_url(&self) -> String {
        format!("http://{}/api/v1/config", self.addr)
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

pub fn settings(value: Value) -> Settings {
    match value {
        Value::Object(map) => map,
        other => panic!("expected a JSON object, got {}", other),
    }
}

/// Start a server on an ephemeral port.
///
/// `persisted` seeds the settings file before the store opens.
pub async fn start_server(overrides: Value, persisted: Option<&str>) -> TestServer {
    let dir = tempfile::tempdir().unwrap();
    let settings_path = dir.path().join("config-service.json");
    if let Some(content) = persisted {
        std::fs::write(&settings_path, content).unwrap();
    }
    serve(dir, settings_path, overrides).await
}

/// Start a server whose settings file lives at `relative` inside a fresh
/// temporary directory. Parent directories are not created.
pub async fn start_server_at(relative: &str, overrides: Value) -> TestServer {
    let dir = tempfile::tempdir().unwrap();
    let settings_path = dir.path().join(relative);
    serve(dir, settings_path, overrides).await
}

async fn serve(dir: TempDir, settings_path: PathBuf, overrides: Value) -> TestServer {
    let store = Arc::new(ConfigStore::open(&settings_path, settings(overrides)).unwrap());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server = ConfigServer::new(ServiceConfig::default(), store);
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    TestServer {
        addr,
        settings_path,
        shutdown,
        _dir: dir,
    }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}
