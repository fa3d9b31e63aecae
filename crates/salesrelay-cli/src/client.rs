//! Async HTTP client for poking the sales-tracker backend.

use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use reqwest::{Client, StatusCode};
use serde_json::Value;

/// Connection settings for the backend.
#[derive(Debug, Clone)]
pub struct BackendConfig {
  pub base_url: String,
  pub token:    Option<String>,
}

/// Async HTTP client for the backend connectivity checks.
///
/// Cheap to clone — the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct BackendClient {
  client: Client,
  config: BackendConfig,
}

impl BackendClient {
  pub fn new(config: BackendConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(15))
      .build()
      .context("failed to build HTTP client")?;
    Ok(Self { client, config })
  }

  fn url(&self, path: &str) -> String {
    format!("{}{path}", self.config.base_url.trim_end_matches('/'))
  }

  /// `GET /api/` — reachability probe. Returns the status and a snippet
  /// of the body.
  pub async fn ping(&self) -> Result<(StatusCode, String)> {
    let resp = self
      .client
      .get(self.url("/api/"))
      .send()
      .await
      .context("backend unreachable")?;

    let status = resp.status();
    let body = resp.text().await.unwrap_or_default();
    let snippet: String = body.chars().take(200).collect();
    Ok((status, snippet))
  }

  /// `GET /api/accounts/users/me` with the configured bearer token.
  pub async fn whoami(&self) -> Result<Value> {
    let token = self
      .config
      .token
      .as_deref()
      .ok_or_else(|| anyhow!("no token configured"))?;

    let resp = self
      .client
      .get(self.url("/api/accounts/users/me"))
      .bearer_auth(token)
      .send()
      .await
      .context("GET /users/me failed")?;

    if !resp.status().is_success() {
      return Err(anyhow!("GET /users/me → {}", resp.status()));
    }
    resp.json().await.context("deserialising identity")
  }
}
