//! HTTP layer for salesrelay.
//!
//! Exposes an axum [`Router`] with the contact-message API (backed by any
//! [`MessageStore`]), the bearer-token access guard, and the invitation
//! pass-through proxy.

pub mod auth;
pub mod error;
pub mod messages;
pub mod proxy;

pub use error::ApiError;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Router,
  routing::{get, patch},
};
use salesrelay_core::store::MessageStore;
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use auth::IdentityVerifier;
use proxy::UpstreamClient;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `SALESRELAY_*` environment variables.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  pub host:              String,
  pub port:              u16,
  /// Location of the contact-message JSON file. Defaults to
  /// `contact-messages.json` in the working directory.
  #[serde(default = "default_store_path")]
  pub store_path:        PathBuf,
  /// Base URL of the backend the invitation endpoints are proxied to.
  pub backend_base_url:  String,
  /// Base URL of the identity authority (`<base>/users/me`).
  pub identity_base_url: String,
}

fn default_store_path() -> PathBuf {
  PathBuf::from("contact-messages.json")
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
#[derive(Clone)]
pub struct AppState<S: MessageStore, V: IdentityVerifier> {
  pub store:    Arc<S>,
  pub verifier: Arc<V>,
  pub upstream: Arc<UpstreamClient>,
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the axum [`Router`] for the relay.
pub fn router<S, V>(state: AppState<S, V>) -> Router
where
  S: MessageStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
  V: IdentityVerifier + Clone + Send + Sync + 'static,
{
  Router::new()
    .route(
      "/api/contact-messages",
      get(messages::list::<S, V>).post(messages::create::<S, V>),
    )
    .route(
      "/api/contact-messages/{id}",
      patch(messages::update::<S, V>).delete(messages::remove::<S, V>),
    )
    .route(
      "/api/accounts/create-invitation",
      axum::routing::post(proxy::create_invitation::<S, V>),
    )
    .route(
      "/api/accounts/send-invitation",
      axum::routing::post(proxy::send_invitation::<S, V>),
    )
    .route(
      "/api/accounts/invitations",
      get(proxy::list_invitations::<S, V>),
    )
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

// ─── Integration tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  use axum::{
    Json,
    body::Body,
    http::{HeaderMap, Request, StatusCode, header},
    response::{Html, IntoResponse},
  };
  use chrono::{Duration, Utc};
  use salesrelay_core::message::ContactMessage;
  use salesrelay_store_json::JsonStore;
  use serde_json::{Value, json};
  use tempfile::TempDir;
  use tower::ServiceExt as _;

  use crate::auth::Identity;

  // ── Fixtures ────────────────────────────────────────────────────────────────

  /// Verifier that accepts any token and reports a fixed privilege level.
  #[derive(Clone)]
  struct StubVerifier {
    superuser: bool,
  }

  impl IdentityVerifier for StubVerifier {
    async fn verify(&self, _token: &str) -> Result<Identity, ApiError> {
      Ok(Identity {
        is_superuser: self.superuser,
        ..Identity::default()
      })
    }
  }

  struct Fixture {
    state: AppState<JsonStore, StubVerifier>,
    path:  std::path::PathBuf,
    _dir:  TempDir,
  }

  async fn fixture(superuser: bool) -> Fixture {
    fixture_with_upstream(superuser, "http://127.0.0.1:9").await
  }

  async fn fixture_with_upstream(superuser: bool, upstream: &str) -> Fixture {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("contact-messages.json");
    let store = JsonStore::open(&path).await.unwrap();

    let state = AppState {
      store:    Arc::new(store),
      verifier: Arc::new(StubVerifier { superuser }),
      upstream: Arc::new(UpstreamClient::new(upstream).unwrap()),
    };
    Fixture { state, path, _dir: dir }
  }

  async fn send(
    state: AppState<JsonStore, StubVerifier>,
    method: &str,
    uri: &str,
    bearer: Option<&str>,
    body: Option<Value>,
  ) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = bearer {
      builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let req = match body {
      Some(v) => builder
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(v.to_string()))
        .unwrap(),
      None => builder.body(Body::empty()).unwrap(),
    };

    let resp = router(state).oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
      Value::Null
    } else {
      serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
  }

  fn seed(path: &std::path::Path, messages: &[ContactMessage]) {
    std::fs::write(path, serde_json::to_vec_pretty(messages).unwrap()).unwrap();
  }

  fn aged(id: i64, age: Duration) -> ContactMessage {
    ContactMessage {
      id,
      name:      "Alice".into(),
      email:     "alice@example.com".into(),
      subject:   "Hello".into(),
      message:   "Hi".into(),
      timestamp: Utc::now() - age,
      read:      false,
    }
  }

  // ── Authorization gating ────────────────────────────────────────────────────

  #[tokio::test]
  async fn guarded_endpoints_require_a_credential() {
    for (method, uri) in [
      ("GET", "/api/contact-messages"),
      ("PATCH", "/api/contact-messages/1"),
      ("DELETE", "/api/contact-messages/1"),
    ] {
      let f = fixture(true).await;
      let body = (method == "PATCH").then(|| json!({ "read": true }));
      let (status, resp) = send(f.state, method, uri, None, body).await;
      assert_eq!(status, StatusCode::UNAUTHORIZED, "{method} {uri}");
      assert!(resp["error"].is_string(), "{method} {uri}: {resp}");
    }
  }

  #[tokio::test]
  async fn guarded_endpoints_reject_non_superusers() {
    for (method, uri) in [
      ("GET", "/api/contact-messages"),
      ("PATCH", "/api/contact-messages/1"),
      ("DELETE", "/api/contact-messages/1"),
    ] {
      let f = fixture(false).await;
      let body = (method == "PATCH").then(|| json!({ "read": true }));
      let (status, resp) = send(f.state, method, uri, Some("t"), body).await;
      assert_eq!(status, StatusCode::FORBIDDEN, "{method} {uri}");
      assert!(resp["error"].is_string(), "{method} {uri}: {resp}");
    }
  }

  // ── Contact form ────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn contact_form_accepts_a_valid_submission_without_auth() {
    let f = fixture(true).await;
    let body = json!({
      "name": "Alice",
      "email": "alice@example.com",
      "subject": "Hello",
      "message": "A question about pricing",
    });

    let (status, resp) =
      send(f.state.clone(), "POST", "/api/contact-messages", None, Some(body)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resp, json!({ "success": true }));

    let (_, listed) =
      send(f.state, "GET", "/api/contact-messages", Some("t"), None).await;
    let messages = listed["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0]["name"], "Alice");
    assert_eq!(messages[0]["read"], false);
  }

  #[tokio::test]
  async fn contact_form_rejects_blank_fields_and_bad_emails() {
    let blank = json!({
      "name": "", "email": "a@b.co", "subject": "s", "message": "m",
    });
    let bad_email = json!({
      "name": "A", "email": "not-an-email", "subject": "s", "message": "m",
    });

    for body in [blank, bad_email] {
      let f = fixture(true).await;
      let (status, resp) =
        send(f.state, "POST", "/api/contact-messages", None, Some(body)).await;
      assert_eq!(status, StatusCode::BAD_REQUEST);
      assert!(resp["error"].is_string());
    }
  }

  #[tokio::test]
  async fn contact_form_rejects_missing_fields_with_400() {
    // A body with fields absent entirely, not just blank.
    let f = fixture(true).await;
    let (status, resp) = send(
      f.state,
      "POST",
      "/api/contact-messages",
      None,
      Some(json!({ "name": "Alice" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(resp["error"].is_string(), "{resp}");
  }

  // ── List with retention ─────────────────────────────────────────────────────

  #[tokio::test]
  async fn list_returns_pruned_collection_and_rewrites_storage() {
    let f = fixture(true).await;
    seed(&f.path, &[aged(1, Duration::days(1)), aged(2, Duration::days(5))]);

    let (status, resp) =
      send(f.state, "GET", "/api/contact-messages", Some("t"), None).await;
    assert_eq!(status, StatusCode::OK);
    let messages = resp["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0]["id"], 1);

    let on_disk: Vec<ContactMessage> =
      serde_json::from_slice(&std::fs::read(&f.path).unwrap()).unwrap();
    assert_eq!(on_disk.len(), 1);
  }

  // ── Update / delete ─────────────────────────────────────────────────────────

  #[tokio::test]
  async fn patch_marks_read_and_preserves_everything_else() {
    let f = fixture(true).await;
    seed(&f.path, &[aged(1, Duration::days(1))]);

    let (status, resp) = send(
      f.state.clone(),
      "PATCH",
      "/api/contact-messages/1",
      Some("t"),
      Some(json!({ "read": true })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resp, json!({ "success": true }));

    let (_, listed) =
      send(f.state, "GET", "/api/contact-messages", Some("t"), None).await;
    let msg = &listed["messages"][0];
    assert_eq!(msg["id"], 1);
    assert_eq!(msg["read"], true);
    assert_eq!(msg["name"], "Alice");
  }

  #[tokio::test]
  async fn patch_unknown_id_is_404_and_changes_nothing() {
    let f = fixture(true).await;
    seed(&f.path, &[aged(1, Duration::days(1))]);

    let (status, resp) = send(
      f.state.clone(),
      "PATCH",
      "/api/contact-messages/99",
      Some("t"),
      Some(json!({ "read": true })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(resp["error"].is_string());

    let (_, listed) =
      send(f.state, "GET", "/api/contact-messages", Some("t"), None).await;
    assert_eq!(listed["messages"][0]["read"], false);
  }

  #[tokio::test]
  async fn delete_removes_then_404s_on_repeat() {
    let f = fixture(true).await;
    seed(&f.path, &[aged(1, Duration::days(1))]);

    let (status, resp) = send(
      f.state.clone(),
      "DELETE",
      "/api/contact-messages/1",
      Some("t"),
      None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resp, json!({ "success": true }));

    let (status, _) =
      send(f.state, "DELETE", "/api/contact-messages/1", Some("t"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
  }

  // ── Invitation proxy ────────────────────────────────────────────────────────

  async fn spawn_upstream(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
      axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
  }

  #[tokio::test]
  async fn proxy_requires_a_bearer_token() {
    let f = fixture(true).await;
    for (method, uri, body) in [
      (
        "POST",
        "/api/accounts/create-invitation",
        Some(json!({ "email": "new@example.com" })),
      ),
      (
        "POST",
        "/api/accounts/send-invitation",
        Some(json!({ "invitation_id": 1 })),
      ),
      ("GET", "/api/accounts/invitations", None),
    ] {
      let (status, resp) = send(f.state.clone(), method, uri, None, body).await;
      assert_eq!(status, StatusCode::UNAUTHORIZED, "{method} {uri}");
      assert!(resp["error"].is_string(), "{method} {uri}: {resp}");
    }
  }

  #[tokio::test]
  async fn proxy_relays_upstream_json_and_status_verbatim() {
    let app = Router::new()
      .route(
        "/api/accounts/create-invitation/",
        axum::routing::post(|headers: HeaderMap, Json(body): Json<Value>| async move {
          assert_eq!(auth::bearer_token(&headers), Some("tok"));
          (
            StatusCode::CREATED,
            Json(json!({ "invitation": { "email": body["email"], "token": "inv-1" } })),
          )
        }),
      )
      .route(
        "/api/accounts/send-invitation/",
        axum::routing::post(|Json(body): Json<Value>| async move {
          Json(json!({ "success": true, "sent_to": body["email"] }))
        }),
      )
      .route(
        "/api/accounts/invitations/",
        get(|| async { Json(json!({ "invitations": [{ "token": "inv-1" }] })) }),
      );
    let upstream = spawn_upstream(app).await;
    let f = fixture_with_upstream(true, &upstream).await;

    let (status, resp) = send(
      f.state.clone(),
      "POST",
      "/api/accounts/create-invitation",
      Some("tok"),
      Some(json!({ "email": "new@example.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(resp["invitation"]["token"], "inv-1");
    assert_eq!(resp["invitation"]["email"], "new@example.com");

    let (status, resp) = send(
      f.state.clone(),
      "POST",
      "/api/accounts/send-invitation",
      Some("tok"),
      Some(json!({ "email": "new@example.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resp["success"], true);
    assert_eq!(resp["sent_to"], "new@example.com");

    let (status, resp) = send(
      f.state,
      "GET",
      "/api/accounts/invitations",
      Some("tok"),
      None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resp["invitations"][0]["token"], "inv-1");
  }

  #[tokio::test]
  async fn proxy_relays_upstream_error_statuses() {
    let app = Router::new().route(
      "/api/accounts/invitations/",
      get(|| async {
        (StatusCode::FORBIDDEN, Json(json!({ "detail": "not allowed" })))
      }),
    );
    let upstream = spawn_upstream(app).await;
    let f = fixture_with_upstream(true, &upstream).await;

    let (status, resp) =
      send(f.state, "GET", "/api/accounts/invitations", Some("tok"), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(resp["detail"], "not allowed");
  }

  #[tokio::test]
  async fn proxy_turns_non_json_upstream_into_502_with_preview() {
    let app = Router::new().route(
      "/api/accounts/invitations/",
      get(|| async {
        (StatusCode::INTERNAL_SERVER_ERROR, Html("<html>Server Error (500)</html>"))
          .into_response()
      }),
    );
    let upstream = spawn_upstream(app).await;
    let f = fixture_with_upstream(true, &upstream).await;

    let (status, resp) =
      send(f.state, "GET", "/api/accounts/invitations", Some("tok"), None).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(resp["details"].is_string());
    assert!(
      resp["response_preview"]
        .as_str()
        .unwrap()
        .contains("Server Error"),
      "{resp}"
    );
  }

  #[tokio::test]
  async fn proxy_turns_unreachable_upstream_into_502() {
    // Bind and drop a listener so the port refuses connections.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let f = fixture_with_upstream(true, &format!("http://{addr}")).await;
    let (status, resp) =
      send(f.state, "GET", "/api/accounts/invitations", Some("tok"), None).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(resp["details"].is_string());
  }
}
