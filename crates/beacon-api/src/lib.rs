//! JSON REST API for Beacon.
//!
//! Exposes an axum [`Router`] over a [`LifecycleEngine`] and
//! [`LocationTracker`] backed by any [`beacon_core::store::AlertStore`].
//! The identity collaborator is abstracted behind
//! [`beacon_core::directory::Directory`]; each request carries the actor id
//! in the `X-Actor-Id` header and the role is resolved through the
//! directory (see [`identity`]). TLS and transport concerns are the
//! caller's responsibility.

pub mod admin;
pub mod alerts;
pub mod error;
pub mod guardians;
pub mod identity;
pub mod responders;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post, put},
};
use beacon_core::{
  directory::Directory,
  engine::LifecycleEngine,
  notify::AlertNotifier,
  store::AlertStore,
  tracker::LocationTracker,
};

pub use error::ApiError;

// ─── Application state ───────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
pub struct AppState<S, D, N> {
  pub engine:    Arc<LifecycleEngine<S, D, N>>,
  pub tracker:   Arc<LocationTracker<S, D>>,
  pub directory: Arc<D>,
}

// Manual impl: `Arc` fields clone regardless of the type parameters.
impl<S, D, N> Clone for AppState<S, D, N> {
  fn clone(&self) -> Self {
    Self {
      engine:    Arc::clone(&self.engine),
      tracker:   Arc::clone(&self.tracker),
      directory: Arc::clone(&self.directory),
    }
  }
}

impl<S, D, N> AppState<S, D, N>
where
  S: AlertStore,
  D: Directory,
  N: AlertNotifier,
{
  pub fn new(store: Arc<S>, directory: Arc<D>, notifier: Arc<N>) -> Self {
    Self {
      engine:    Arc::new(LifecycleEngine::new(
        Arc::clone(&store),
        Arc::clone(&directory),
        notifier,
      )),
      tracker:   Arc::new(LocationTracker::new(
        store,
        Arc::clone(&directory),
      )),
      directory,
    }
  }
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build a fully-materialised router for `state`.
pub fn router<S, D, N>(state: AppState<S, D, N>) -> Router
where
  S: AlertStore + 'static,
  D: Directory + 'static,
  N: AlertNotifier + 'static,
{
  Router::new()
    // Owner
    .route("/alerts", post(alerts::create::<S, D, N>))
    .route("/alerts/cancel", post(alerts::cancel::<S, D, N>))
    .route("/alerts/active", get(alerts::active::<S, D, N>))
    .route("/alerts/history", get(alerts::history::<S, D, N>))
    .route("/alerts/{id}/location", post(alerts::update_location::<S, D, N>))
    .route(
      "/alerts/{id}/description",
      put(alerts::update_description::<S, D, N>),
    )
    // Guardians
    .route("/guardians/alerts", get(guardians::open_alerts::<S, D, N>))
    .route("/guardians/respond/{id}", post(guardians::respond::<S, D, N>))
    .route("/guardians/resolve/{id}", post(guardians::resolve::<S, D, N>))
    // Responders
    .route("/responders/alerts", get(responders::open_alerts::<S, D, N>))
    .route(
      "/responders/alerts/mine",
      get(responders::engagements::<S, D, N>),
    )
    .route("/responders/respond/{id}", post(responders::respond::<S, D, N>))
    .route(
      "/responders/alerts/{id}/status",
      put(responders::set_status::<S, D, N>),
    )
    // Admin
    .route("/admin/alerts", get(admin::list::<S, D, N>))
    .route("/admin/alerts/{id}/history", get(admin::history::<S, D, N>))
    .route("/admin/alerts/{id}/status", put(admin::force_status::<S, D, N>))
    .with_state(state)
}

#[cfg(test)]
mod tests;
