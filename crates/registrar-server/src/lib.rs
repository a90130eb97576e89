//! HTTP server for the registrar.
//!
//! Wraps [`registrar_api::api_router`] with bearer-token authentication and
//! the admin account endpoints, and mounts everything under `/api`.

pub mod auth;
pub mod config;

#[cfg(test)]
mod tests;

pub use config::ServerConfig;

use std::sync::Arc;

use axum::{
  Router, middleware,
  routing::{get, post, put},
};
use registrar_core::store::AdminStore;
use tower_http::trace::TraceLayer;

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through the auth handlers.
pub struct AppState<S> {
  pub store:  Arc<S>,
  pub config: Arc<ServerConfig>,
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self { store: Arc::clone(&self.store), config: Arc::clone(&self.config) }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the full application router.
///
/// Everything under `/api` except `POST /api/login` requires a session.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: AdminStore + 'static,
{
  let protected = Router::new()
    .route("/logout", post(auth::logout::<S>))
    .route("/me", get(auth::me).put(auth::update_me::<S>))
    .route("/me/password", put(auth::update_password::<S>))
    .with_state(state.clone())
    .merge(registrar_api::api_router(Arc::clone(&state.store)))
    .route_layer(middleware::from_fn_with_state(state.clone(), auth::require_session::<S>));

  let api = Router::new()
    .route("/login", post(auth::login::<S>))
    .with_state(state)
    .merge(protected);

  Router::new()
    .route("/health", get(|| async { "ok" }))
    .nest("/api", api)
    .layer(TraceLayer::new_for_http())
}
