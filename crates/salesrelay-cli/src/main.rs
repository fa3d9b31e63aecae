//! `salesrelay-check` — backend connectivity checker.
//!
//! # Usage
//!
//! ```
//! salesrelay-check --url https://backend.example.com
//! salesrelay-check --url http://localhost:8000 --token <bearer>
//! ```

mod client;

use anyhow::Result;
use clap::Parser;
use client::{BackendClient, BackendConfig};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "salesrelay-check", about = "Ping the sales-tracker backend")]
struct Args {
  /// Base URL of the backend (default: http://localhost:8000).
  #[arg(long, env = "SALESRELAY_URL", default_value = "http://localhost:8000")]
  url: String,

  /// Bearer token; when given, the identity endpoint is checked too.
  #[arg(long, env = "SALESRELAY_TOKEN")]
  token: Option<String>,
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let args = Args::parse();
  let has_token = args.token.is_some();

  let client = BackendClient::new(BackendConfig {
    base_url: args.url.clone(),
    token:    args.token,
  })?;

  tracing::info!(url = %args.url, "checking backend connectivity");
  let (status, snippet) = client.ping().await?;

  if status.is_success() {
    println!("backend reachable: {status}");
  } else {
    println!("backend answered with {status}");
  }
  if !snippet.is_empty() {
    println!("body: {snippet}");
  }

  if has_token {
    let identity = client.whoami().await?;
    println!(
      "authenticated as {} (superuser: {})",
      identity["username"].as_str().unwrap_or("<unknown>"),
      identity["is_superuser"].as_bool().unwrap_or(false),
    );
  }

  Ok(())
}
