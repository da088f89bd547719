//! Actor identity extraction.
//!
//! Authentication itself is owned by the external identity collaborator;
//! this layer trusts the `X-Actor-Id` header (as set by the fronting
//! gateway) and resolves the role through the [`Directory`]. A missing,
//! malformed, or unknown id is a 401.

use axum::{extract::FromRequestParts, http::request::Parts};
use beacon_core::{
  actor::Actor, directory::Directory, notify::AlertNotifier, store::AlertStore,
};
use uuid::Uuid;

use crate::{AppState, error::ApiError};

pub const ACTOR_HEADER: &str = "x-actor-id";

/// The authenticated caller.
#[derive(Debug, Clone, Copy)]
pub struct Identity(pub Actor);

impl<S, D, N> FromRequestParts<AppState<S, D, N>> for Identity
where
  S: AlertStore + 'static,
  D: Directory + 'static,
  N: AlertNotifier + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S, D, N>,
  ) -> Result<Self, Self::Rejection> {
    let id = parts
      .headers
      .get(ACTOR_HEADER)
      .and_then(|v| v.to_str().ok())
      .and_then(|s| Uuid::parse_str(s).ok())
      .ok_or(ApiError::Unauthenticated)?;
    let role = state
      .directory
      .role_of(id)
      .ok_or(ApiError::Unauthenticated)?;
    Ok(Identity(Actor::new(id, role)))
  }
}
