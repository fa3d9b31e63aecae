//! Handlers for `/api/contact-messages` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/api/contact-messages` | Superuser only |
//! | `POST`   | `/api/contact-messages` | Public contact form |
//! | `PATCH`  | `/api/contact-messages/{id}` | Superuser only, partial body |
//! | `DELETE` | `/api/contact-messages/{id}` | Superuser only |

use axum::{
  Json,
  extract::{Path, State},
  http::HeaderMap,
};
use salesrelay_core::{
  message::{MessagePatch, NewMessage},
  store::MessageStore,
};
use serde_json::{Value, json};

use crate::{AppState, auth::{IdentityVerifier, require_superuser}, error::ApiError};

fn store_error<E: std::error::Error + Send + Sync + 'static>(e: E) -> ApiError {
  ApiError::Store(Box::new(e))
}

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /api/contact-messages` — the collection is pruned by the store
/// before it is returned.
pub async fn list<S, V>(
  State(state): State<AppState<S, V>>,
  headers: HeaderMap,
) -> Result<Json<Value>, ApiError>
where
  S: MessageStore,
  S::Error: std::error::Error + Send + Sync + 'static,
  V: IdentityVerifier,
{
  require_superuser(&headers, state.verifier.as_ref()).await?;

  let messages = state.store.list().await.map_err(store_error)?;
  Ok(Json(json!({ "messages": messages })))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /api/contact-messages` — submission from the public contact
/// form, so no credential is required.
pub async fn create<S, V>(
  State(state): State<AppState<S, V>>,
  Json(body): Json<NewMessage>,
) -> Result<Json<Value>, ApiError>
where
  S: MessageStore,
  S::Error: std::error::Error + Send + Sync + 'static,
  V: IdentityVerifier,
{
  validate(&body)?;

  let message = state.store.add(body).await.map_err(store_error)?;
  tracing::info!(id = message.id, subject = %message.subject, "contact message received");
  Ok(Json(json!({ "success": true })))
}

fn validate(body: &NewMessage) -> Result<(), ApiError> {
  if body.name.trim().is_empty()
    || body.email.trim().is_empty()
    || body.subject.trim().is_empty()
    || body.message.trim().is_empty()
  {
    return Err(ApiError::BadRequest("all fields are required".into()));
  }
  if !is_plausible_email(&body.email) {
    return Err(ApiError::BadRequest("invalid email address".into()));
  }
  Ok(())
}

/// Minimal shape check: `local@domain.tld`, no whitespace, exactly one
/// `@`, and a dot with something on both sides in the domain.
fn is_plausible_email(email: &str) -> bool {
  if email.chars().any(char::is_whitespace) {
    return false;
  }
  let Some((local, domain)) = email.split_once('@') else {
    return false;
  };
  if local.is_empty() || domain.contains('@') {
    return false;
  }
  match domain.rsplit_once('.') {
    Some((host, tld)) => !host.is_empty() && !tld.is_empty(),
    None => false,
  }
}

// ─── Update ───────────────────────────────────────────────────────────────────

/// `PATCH /api/contact-messages/{id}` — shallow merge; absent fields are
/// preserved, and `id` can never change.
pub async fn update<S, V>(
  State(state): State<AppState<S, V>>,
  Path(id): Path<i64>,
  headers: HeaderMap,
  Json(patch): Json<MessagePatch>,
) -> Result<Json<Value>, ApiError>
where
  S: MessageStore,
  S::Error: std::error::Error + Send + Sync + 'static,
  V: IdentityVerifier,
{
  require_superuser(&headers, state.verifier.as_ref()).await?;

  state
    .store
    .update(id, patch)
    .await
    .map_err(store_error)?
    .ok_or_else(|| ApiError::NotFound(format!("message {id} not found")))?;

  Ok(Json(json!({ "success": true })))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

/// `DELETE /api/contact-messages/{id}`
pub async fn remove<S, V>(
  State(state): State<AppState<S, V>>,
  Path(id): Path<i64>,
  headers: HeaderMap,
) -> Result<Json<Value>, ApiError>
where
  S: MessageStore,
  S::Error: std::error::Error + Send + Sync + 'static,
  V: IdentityVerifier,
{
  require_superuser(&headers, state.verifier.as_ref()).await?;

  let removed = state.store.delete(id).await.map_err(store_error)?;
  if !removed {
    return Err(ApiError::NotFound(format!("message {id} not found")));
  }

  tracing::info!(id, "contact message deleted");
  Ok(Json(json!({ "success": true })))
}
