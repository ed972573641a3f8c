#![allow(dead_code)]

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde_json::Value;
use tempfile::TempDir;

use books_api::auth::TokenService;
use books_api::config::AppConfig;
use books_api::database::Database;
use books_api::server;
use books_api::state::AppState;

pub const MAGIC_KEY: &str = "11111111-1111-1111-1111-111111111111";
pub const UNKNOWN_KEY: &str = "22222222-2222-2222-2222-222222222222";

pub struct TestServer {
    pub base_url: String,
    pub client: reqwest::Client,
    // Keeps the datastore and keys file alive for the server's lifetime
    _dir: TempDir,
}

impl TestServer {
    /// Serve the full router on a free port against a fresh datastore
    pub async fn spawn() -> Result<Self> {
        let dir = tempfile::tempdir().context("failed to create temp dir")?;
        let keys_path = dir.path().join("magic-keys.json");
        std::fs::write(&keys_path, format!("[\"{}\"]", MAGIC_KEY))?;

        let port = portpicker::pick_unused_port().context("failed to pick free port")?;

        let mut config = AppConfig::development();
        config.server.host = "127.0.0.1".to_string();
        config.server.port = port;
        config.database.path = dir.path().join("books.db");
        config.security.magic_keys_path = keys_path;
        config.api.enable_request_logging = false;

        let tokens = TokenService::initialize(&config)?;
        let database = Database::open(&config.database).await?;
        let bind_addr = config.bind_addr()?;
        let app = server::app(AppState::new(config, tokens, database));

        let listener = tokio::net::TcpListener::bind(bind_addr).await?;
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        let server = Self {
            base_url: format!("http://127.0.0.1:{}", port),
            client: reqwest::Client::new(),
            _dir: dir,
        };
        server.wait_ready(Duration::from_secs(10)).await?;
        Ok(server)
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if let Ok(resp) = self.client.get(self.url("/health")).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Log in with the seeded magic key and return the bearer token
    pub async fn login(&self) -> Result<String> {
        let res = self
            .client
            .get(self.url(&format!("/api/login/{}", MAGIC_KEY)))
            .send()
            .await?;
        anyhow::ensure!(res.status() == StatusCode::OK, "login failed: {}", res.status());
        let body: Value = res.json().await?;
        body["token"]
            .as_str()
            .map(str::to_string)
            .context("login response has no token")
    }

    /// Create a book as an authenticated caller and return the stored record
    pub async fn create_book(&self, token: &str, body: Value) -> Result<Value> {
        let res = self
            .client
            .post(self.url("/api/books"))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await?;
        anyhow::ensure!(
            res.status() == StatusCode::CREATED,
            "create failed: {}",
            res.status()
        );
        Ok(res.json().await?)
    }
}
