//! Bearer-token access guard backed by an external identity authority.
//!
//! Mutation and listing of contact messages require a superuser identity.
//! The guard verifies the presented token against the authority's
//! "who am I" endpoint on every request; nothing is cached, so each
//! guarded operation costs one upstream round trip.

use std::{future::Future, time::Duration};

use axum::http::{HeaderMap, header};
use serde::Deserialize;

use crate::error::ApiError;

// ─── Identity ────────────────────────────────────────────────────────────────

/// The slice of the authority's user record the guard cares about.
/// Unknown fields are ignored; a missing `is_superuser` reads as `false`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Identity {
  #[serde(default)]
  pub id:           Option<i64>,
  #[serde(default)]
  pub username:     Option<String>,
  #[serde(default)]
  pub email:        Option<String>,
  #[serde(default)]
  pub is_superuser: bool,
}

// ─── Verifier trait ──────────────────────────────────────────────────────────

/// Resolves a bearer token to an [`Identity`].
///
/// Implemented over HTTP in production ([`HttpIdentityVerifier`]) and by
/// stubs in tests. A failed resolution is always `Unauthorized`; privilege
/// checks happen in [`require_superuser`].
pub trait IdentityVerifier: Send + Sync {
  fn verify<'a>(
    &'a self,
    token: &'a str,
  ) -> impl Future<Output = Result<Identity, ApiError>> + Send + 'a;
}

// ─── HTTP implementation ─────────────────────────────────────────────────────

/// Verifier that calls `GET <base_url>/users/me` with the bearer token.
#[derive(Clone)]
pub struct HttpIdentityVerifier {
  client:   reqwest::Client,
  base_url: String,
}

impl HttpIdentityVerifier {
  pub fn new(base_url: impl Into<String>) -> Result<Self, reqwest::Error> {
    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(10))
      .build()?;
    Ok(Self {
      client,
      base_url: base_url.into(),
    })
  }

  fn whoami_url(&self) -> String {
    format!("{}/users/me", self.base_url.trim_end_matches('/'))
  }
}

impl IdentityVerifier for HttpIdentityVerifier {
  async fn verify(&self, token: &str) -> Result<Identity, ApiError> {
    let resp = self
      .client
      .get(self.whoami_url())
      .bearer_auth(token)
      .send()
      .await
      .map_err(|e| {
        tracing::warn!(error = %e, "identity authority unreachable");
        ApiError::Unauthorized
      })?;

    if !resp.status().is_success() {
      tracing::debug!(status = %resp.status(), "identity check rejected");
      return Err(ApiError::Unauthorized);
    }

    resp.json::<Identity>().await.map_err(|e| {
      tracing::warn!(error = %e, "identity authority returned an undecodable body");
      ApiError::Unauthorized
    })
  }
}

// ─── Guard helpers ───────────────────────────────────────────────────────────

/// Extract the token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
  headers
    .get(header::AUTHORIZATION)?
    .to_str()
    .ok()?
    .strip_prefix("Bearer ")
}

/// Resolve the request's bearer token and require the superuser flag.
///
/// `Unauthorized` when the header is missing/malformed or the token does
/// not resolve; `Forbidden` when it resolves to a non-privileged identity.
pub async fn require_superuser<V: IdentityVerifier>(
  headers: &HeaderMap,
  verifier: &V,
) -> Result<Identity, ApiError> {
  let token = bearer_token(headers).ok_or(ApiError::Unauthorized)?;
  let identity = verifier.verify(token).await?;
  if !identity.is_superuser {
    return Err(ApiError::Forbidden);
  }
  Ok(identity)
}

// ─── Tests ───────────────────────────────────────────────────────────────────
