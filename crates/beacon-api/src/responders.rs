//! Responder endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/responders/alerts` | All open alerts (coarse dispatch, no proximity filter) |
//! | `GET`  | `/responders/alerts/mine` | Alerts this responder has claimed |
//! | `POST` | `/responders/respond/:id` | Claim; 400 on a repeat claim |
//! | `PUT`  | `/responders/alerts/:id/status` | Body: `{"status":"on_scene","notes":null}` |

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

/// `GET /responders/alerts` — every open alert, for pull-style dispatch.
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

/// `GET /responders/alerts/mine` — this responder's engagements, newest
/// first.
pub async fn engagements<S, D, N>(
  State(state): State<AppState<S, D, N>>,
  Identity(actor): Identity,
) -> Result<Json<Vec<Alert>>, ApiError>
where
  S: AlertStore + 'static,
  D: Directory + 'static,
  N: AlertNotifier + 'static,
{
  Ok(Json(state.engine.engagements(actor).await?))
}

/// `POST /responders/respond/:id` — join the responding set. Unlike the
/// guardian endpoint, a repeat claim is a 400.
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
  if !outcome.newly_joined {
    return Err(ApiError::AlreadyClaimed { alert: id, actor: actor.id });
  }
  Ok(Json(outcome.alert))
}

#[derive(Debug, Deserialize)]
pub struct StatusBody {
  pub status: AlertStatus,
  pub notes:  Option<String>,
}

/// `PUT /responders/alerts/:id/status` — advance along the lifecycle table.
pub async fn set_status<S, D, N>(
  State(state): State<AppState<S, D, N>>,
  Identity(actor): Identity,
  Path(id): Path<Uuid>,
  Json(body): Json<StatusBody>,
) -> Result<Json<Alert>, ApiError>
where
  S: AlertStore + 'static,
  D: Directory + 'static,
  N: AlertNotifier + 'static,
{
  Ok(Json(
    state
      .engine
      .advance(actor, id, body.status, body.notes)
      .await?,
  ))
}
