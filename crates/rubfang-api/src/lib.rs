//! JSON API for the Rubfang survey.
//!
//! Exposes an axum [`Router`] backed by any
//! [`rubfang_core::store::DocumentStore`]. TLS, CORS and request tracing are
//! the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! let app = rubfang_api::router(state).layer(cors).layer(TraceLayer::new_for_http());
//! ```

pub mod auth;
pub mod dashboard;
pub mod error;
pub mod feedback;
pub mod registration;
pub mod status;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use rubfang_core::{Survey, store::DocumentStore};

pub use auth::DashboardAuth;
pub use error::ApiError;

// ─── Application state ───────────────────────────────────────────────────────

/// Settings the browser client reads at startup.
#[derive(Debug, Clone, Default)]
pub struct ClientConfig {
  pub line_client_id: Option<String>,
}

/// Shared state threaded through all axum handlers.
pub struct AppState<S> {
  pub survey: Arc<Survey<S>>,
  pub auth:   Arc<DashboardAuth>,
  pub client: Arc<ClientConfig>,
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      survey: self.survey.clone(),
      auth:   self.auth.clone(),
      client: self.client.clone(),
    }
  }
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build the fully-materialised router.
///
/// The returned `Router<()>` can be merged into any parent router regardless
/// of its own state type.
pub fn router<S>(state: AppState<S>) -> Router<()>
where
  S: DocumentStore + 'static,
{
  Router::new()
    // Respondents
    .route(
      "/api/registration",
      get(registration::lookup::<S>).post(registration::upsert::<S>),
    )
    .route(
      "/api/feedback",
      get(feedback::query::<S>)
        .post(feedback::submit::<S>)
        .patch(feedback::update::<S>),
    )
    .route("/api/progress", get(feedback::progress::<S>))
    .route("/api/client-config", get(status::client_config::<S>))
    // Dashboard
    .route("/api/dashboard-auth", post(auth::login::<S>))
    .route("/dashboard/feedback", get(dashboard::listing::<S>))
    .route("/dashboard/summary", get(dashboard::summary::<S>))
    .route("/health", get(status::health))
    .with_state(state)
}
