//! Guardian endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/guardians/alerts` | Open alerts of the guardian's dependents |
//! | `POST` | `/guardians/respond/:id` | Claim; idempotent on repeat calls |
//! | `POST` | `/guardians/resolve/:id` | Body: `{"notes":"..."}` (optional) |

use axum::{
  Json,
  extract::{Path, State},
};
use beacon_core::{
  alert::{Alert, AlertStatus},
  directory::Directory,
  notify::AlertNotifier,
  store::AlertStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{AppState, error::ApiError, identity::Identity};

/// `GET /guardians/alerts` — open alerts the guardian may claim, i.e. those
/// raised by their dependents.
pub async fn open_alerts<S, D, N>(
  State(state): State<AppState<S, D, N>>,
  Identity(actor): Identity,
) -> Result<Json<Vec<Alert>>, ApiError>
where
  S: AlertStore + 'static,
  D: Directory + 'static,
  N: AlertNotifier + 'static,
{
  Ok(Json(state.engine.open_alerts_for(actor).await?))
}

/// `POST /guardians/respond/:id` — join the responding set. A repeat call
/// by the same guardian succeeds without re-joining.
pub async fn respond<S, D, N>(
  State(state): State<AppState<S, D, N>>,
  Identity(actor): Identity,
  Path(id): Path<Uuid>,
) -> Result<Json<Alert>, ApiError>
where
  S: AlertStore + 'static,
  D: Directory + 'static,
  N: AlertNotifier + 'static,
{
  let outcome = state.engine.claim(actor, id).await?;
  Ok(Json(outcome.alert))
}

#[derive(Debug, Deserialize)]
pub struct ResolveBody {
  pub notes: Option<String>,
}

/// `POST /guardians/resolve/:id` — move the alert to `resolved`. Requires
/// membership in the responding set.
pub async fn resolve<S, D, N>(
  State(state): State<AppState<S, D, N>>,
  Identity(actor): Identity,
  Path(id): Path<Uuid>,
  Json(body): Json<ResolveBody>,
) -> Result<Json<Alert>, ApiError>
where
  S: AlertStore + 'static,
  D: Directory + 'static,
  N: AlertNotifier + 'static,
{
  Ok(Json(
    state
      .engine
      .advance(actor, id, AlertStatus::Resolved, body.notes)
      .await?,
  ))
}
