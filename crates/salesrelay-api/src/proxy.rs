//! Pass-through proxy for the backend's invitation endpoints.
//!
//! These handlers do no work of their own: they forward the bearer token
//! and body upstream and relay the JSON answer verbatim, status included.
//! The one guard is on content type — an upstream that answers with HTML
//! (typically a framework error page) is reported as a bad gateway with a
//! short preview of the body instead of being relayed as-is.

use std::time::Duration;

use axum::{
  Json,
  extract::State,
  http::{HeaderMap, StatusCode},
  response::{IntoResponse, Response},
};
use salesrelay_core::store::MessageStore;
use serde_json::Value;

use crate::{AppState, auth::{IdentityVerifier, bearer_token}, error::ApiError};

/// How much of a non-JSON upstream body is echoed back to the caller.
const PREVIEW_LIMIT: usize = 200;

// ─── Upstream client ─────────────────────────────────────────────────────────

/// Thin reqwest wrapper around the backend base URL.
///
/// Cheap to clone — the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct UpstreamClient {
  client:   reqwest::Client,
  base_url: String,
}

impl UpstreamClient {
  pub fn new(base_url: impl Into<String>) -> Result<Self, reqwest::Error> {
    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(30))
      .build()?;
    Ok(Self {
      client,
      base_url: base_url.into(),
    })
  }

  fn url(&self, path: &str) -> String {
    format!("{}{path}", self.base_url.trim_end_matches('/'))
  }

  /// `GET <base>/<path>` with the bearer token attached.
  pub async fn get_json(
    &self,
    path: &str,
    token: &str,
  ) -> Result<(StatusCode, Value), ApiError> {
    let req = self.client.get(self.url(path)).bearer_auth(token);
    Self::exchange(path, req).await
  }

  /// `POST <base>/<path>` with the bearer token and a JSON body.
  pub async fn post_json(
    &self,
    path: &str,
    token: &str,
    body: &Value,
  ) -> Result<(StatusCode, Value), ApiError> {
    let req = self.client.post(self.url(path)).bearer_auth(token).json(body);
    Self::exchange(path, req).await
  }

  async fn exchange(
    path: &str,
    req: reqwest::RequestBuilder,
  ) -> Result<(StatusCode, Value), ApiError> {
    let resp = req.send().await.map_err(|e| ApiError::Upstream {
      details: format!("backend unreachable on {path}: {e}"),
      preview: None,
    })?;

    let status = resp.status();
    let content_type = resp
      .headers()
      .get(reqwest::header::CONTENT_TYPE)
      .and_then(|v| v.to_str().ok())
      .unwrap_or("")
      .to_string();

    if !content_type.contains("application/json") {
      let text = resp.text().await.unwrap_or_default();
      let preview: String = text.chars().take(PREVIEW_LIMIT).collect();
      return Err(ApiError::Upstream {
        details: format!(
          "backend returned {status} with content-type {content_type:?} instead of JSON"
        ),
        preview: Some(preview),
      });
    }

    let body = resp.json::<Value>().await.map_err(|e| ApiError::Upstream {
      details: format!("backend sent undecodable JSON on {path}: {e}"),
      preview: None,
    })?;

    // reqwest and axum share the http crate, but convert defensively.
    let status = StatusCode::from_u16(status.as_u16())
      .unwrap_or(StatusCode::BAD_GATEWAY);

    Ok((status, body))
  }
}

// ─── Handlers ────────────────────────────────────────────────────────────────

/// `POST /api/accounts/create-invitation` — forwarded verbatim.
pub async fn create_invitation<S, V>(
  State(state): State<AppState<S, V>>,
  headers: HeaderMap,
  Json(body): Json<Value>,
) -> Result<Response, ApiError>
where
  S: MessageStore,
  V: IdentityVerifier,
{
  let token = bearer_token(&headers).ok_or(ApiError::Unauthorized)?;

  let (status, data) = state
    .upstream
    .post_json("/api/accounts/create-invitation/", token, &body)
    .await?;
  Ok((status, Json(data)).into_response())
}

/// `POST /api/accounts/send-invitation` — forwarded verbatim.
pub async fn send_invitation<S, V>(
  State(state): State<AppState<S, V>>,
  headers: HeaderMap,
  Json(body): Json<Value>,
) -> Result<Response, ApiError>
where
  S: MessageStore,
  V: IdentityVerifier,
{
  let token = bearer_token(&headers).ok_or(ApiError::Unauthorized)?;

  let (status, data) = state
    .upstream
    .post_json("/api/accounts/send-invitation/", token, &body)
    .await?;
  Ok((status, Json(data)).into_response())
}

/// `GET /api/accounts/invitations` — forwarded verbatim.
pub async fn list_invitations<S, V>(
  State(state): State<AppState<S, V>>,
  headers: HeaderMap,
) -> Result<Response, ApiError>
where
  S: MessageStore,
  V: IdentityVerifier,
{
  let token = bearer_token(&headers).ok_or(ApiError::Unauthorized)?;

  let (status, data) = state
    .upstream
    .get_json("/api/accounts/invitations/", token)
    .await?;
  Ok((status, Json(data)).into_response())
}
