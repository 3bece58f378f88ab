//! HTTP server assembly for the Rubfang survey.
//!
//! Turns a [`ServerConfig`] and an opened store into the served axum
//! [`Router`]: API routes from `rubfang-api`, wrapped in CORS and request
//! tracing layers.

pub mod error;
pub mod settings;

pub use error::{Error, Result};
pub use settings::{BackendConfig, ServerConfig};

use std::{sync::Arc, time::Duration};

use axum::{
  Router,
  http::{HeaderValue, Method, header},
};
use rubfang_api::{AppState, ClientConfig, DashboardAuth};
use rubfang_core::{Survey, store::DocumentStore};
use tower_http::{
  cors::{AllowOrigin, CorsLayer},
  trace::TraceLayer,
};

// ─── Application state ───────────────────────────────────────────────────────

/// Wrap `store` in the survey service and the dashboard/client settings.
pub fn app_state<S>(store: S, config: &ServerConfig) -> Result<AppState<S>>
where
  S: DocumentStore + 'static,
{
  let auth = DashboardAuth::new(
    config.dashboard_password_hash.clone(),
    config.session_secret.as_deref(),
    config.secure_cookies,
  )
  .map_err(|_| Error::SessionKey)?;

  if config.dashboard_password_hash.is_none() {
    tracing::warn!("dashboard_password_hash is not set; dashboard login is disabled");
  }
  if config.line_client_id.is_none() {
    tracing::warn!("line_client_id is not set; the login gate will report an error");
  }

  Ok(AppState {
    survey: Arc::new(Survey::new(Arc::new(store), config.rules())),
    auth:   Arc::new(auth),
    client: Arc::new(ClientConfig { line_client_id: config.line_client_id.clone() }),
  })
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// CORS for the browser client. Credentials are allowed so the dashboard
/// cookie travels with cross-origin requests.
pub fn cors_layer(origins: &[String]) -> Result<CorsLayer> {
  let allow_origin = if origins.is_empty() {
    AllowOrigin::mirror_request()
  } else {
    let origins = origins
      .iter()
      .map(|o| HeaderValue::from_str(o.trim()).map_err(|_| Error::InvalidOrigin(o.clone())))
      .collect::<Result<Vec<_>>>()?;
    AllowOrigin::list(origins)
  };

  Ok(
    CorsLayer::new()
      .allow_origin(allow_origin)
      .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::OPTIONS])
      .allow_headers([header::CONTENT_TYPE])
      .allow_credentials(true)
      .max_age(Duration::from_secs(60 * 60)),
  )
}

/// Build the served router for `state`.
pub fn app<S>(state: AppState<S>, config: &ServerConfig) -> Result<Router>
where
  S: DocumentStore + 'static,
{
  Ok(
    rubfang_api::router(state)
      .layer(cors_layer(&config.cors_origins)?)
      .layer(TraceLayer::new_for_http()),
  )
}

// ─── Integration tests ───────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use axum::{body::Body, http::Request};
  use rubfang_core::memory::MemoryStore;
  use tower::ServiceExt as _;

  use super::*;

  fn router(config: &ServerConfig) -> Router {
    let state = app_state(MemoryStore::new(), config).unwrap();
    app(state, config).unwrap()
  }

  #[tokio::test]
  async fn preflight_mirrors_origin_when_unrestricted() {
    let resp = router(&ServerConfig::default())
      .oneshot(
        Request::builder()
          .method("OPTIONS")
          .uri("/api/feedback")
          .header(header::ORIGIN, "https://anywhere.example")
          .header(header::ACCESS_CONTROL_REQUEST_METHOD, "PATCH")
          .body(Body::empty())
          .unwrap(),
      )
      .await
      .unwrap();

    assert_eq!(
      resp.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
      "https://anywhere.example"
    );
    assert_eq!(
      resp.headers().get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS).unwrap(),
      "true"
    );
  }

  #[tokio::test]
  async fn configured_origins_are_enforced() {
    let config = ServerConfig {
      cors_origins: vec!["https://survey.example".into()],
      ..Default::default()
    };
    let get = |origin: &'static str| {
      Request::builder()
        .uri("/health")
        .header(header::ORIGIN, origin)
        .body(Body::empty())
        .unwrap()
    };

    let allowed = router(&config).oneshot(get("https://survey.example")).await.unwrap();
    assert_eq!(
      allowed.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
      "https://survey.example"
    );

    let other = router(&config).oneshot(get("https://evil.example")).await.unwrap();
    assert!(other.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
  }

  #[test]
  fn invalid_origin_is_reported() {
    assert!(matches!(
      cors_layer(&["bad\norigin".into()]),
      Err(Error::InvalidOrigin(_))
    ));
  }

  #[tokio::test]
  async fn group_bound_comes_from_config() {
    let config = ServerConfig { max_group_number: 5, ..Default::default() };
    let resp = router(&config)
      .oneshot(
        Request::builder()
          .method("POST")
          .uri("/api/registration")
          .header(header::CONTENT_TYPE, "application/json")
          .body(Body::from(
            serde_json::json!({
              "lineUserId": "U1",
              "fullName": "Test",
              "role": "fa_team",
              "groupNumber": 6
            })
            .to_string(),
          ))
          .unwrap(),
      )
      .await
      .unwrap();
    assert_eq!(resp.status(), axum::http::StatusCode::BAD_REQUEST);

    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"], "กลุ่มต้องเป็นเลข 1-5");
  }
}
