//! Owner-facing alert endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/alerts` | Body: [`CreateBody`]; 201 + `{alertId, notifiedContacts}` |
//! | `POST` | `/alerts/cancel` | Cancels the owner's `active` alert; 404 otherwise |
//! | `GET`  | `/alerts/active` | `{active, alert?}` |
//! | `GET`  | `/alerts/history` | All alerts ever raised, newest first |
//! | `POST` | `/alerts/:id/location` | Body: [`LocationBody`] |
//! | `PUT`  | `/alerts/:id/description` | Body: `{"description":"..."}` |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use beacon_core::{
  alert::{Alert, GeoPoint, NewLocationSample},
  directory::Directory,
  engine::CreateAlert,
  notify::AlertNotifier,
  store::AlertStore,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{AppState, error::ApiError, identity::Identity};

// ─── Create ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBody {
  pub location:    GeoPoint,
  pub description: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateResponse {
  pub alert_id:          Uuid,
  pub notified_contacts: usize,
}

/// `POST /alerts` — 201 + `{alertId, notifiedContacts}`; 400 with the
/// existing alert if the owner already has an open one.
pub async fn create<S, D, N>(
  State(state): State<AppState<S, D, N>>,
  Identity(actor): Identity,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: AlertStore + 'static,
  D: Directory + 'static,
  N: AlertNotifier + 'static,
{
  let created = state
    .engine
    .create(actor, CreateAlert {
      location:    body.location,
      description: body.description,
    })
    .await?;
  Ok((
    StatusCode::CREATED,
    Json(CreateResponse {
      alert_id:          created.alert.alert_id,
      notified_contacts: created.contacts_notified,
    }),
  ))
}

// ─── Cancel ──────────────────────────────────────────────────────────────────

/// `POST /alerts/cancel` — cancels the owner's current alert while it is
/// still `active`; 404 once a responder is en route.
pub async fn cancel<S, D, N>(
  State(state): State<AppState<S, D, N>>,
  Identity(actor): Identity,
) -> Result<Json<Alert>, ApiError>
where
  S: AlertStore + 'static,
  D: Directory + 'static,
  N: AlertNotifier + 'static,
{
  Ok(Json(state.engine.cancel(actor).await?))
}

// ─── Current / history ───────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct ActiveResponse {
  pub active: bool,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub alert:  Option<Alert>,
}

/// `GET /alerts/active`
pub async fn active<S, D, N>(
  State(state): State<AppState<S, D, N>>,
  Identity(actor): Identity,
) -> Result<Json<ActiveResponse>, ApiError>
where
  S: AlertStore + 'static,
  D: Directory + 'static,
  N: AlertNotifier + 'static,
{
  let alert = state.engine.active_for_owner(actor).await?;
  Ok(Json(ActiveResponse { active: alert.is_some(), alert }))
}

/// `GET /alerts/history`
pub async fn history<S, D, N>(
  State(state): State<AppState<S, D, N>>,
  Identity(actor): Identity,
) -> Result<Json<Vec<Alert>>, ApiError>
where
  S: AlertStore + 'static,
  D: Directory + 'static,
  N: AlertNotifier + 'static,
{
  Ok(Json(state.engine.history_for_owner(actor).await?))
}

// ─── Location ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationBody {
  pub location: LocationPayload,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationPayload {
  pub latitude:    f64,
  pub longitude:   f64,
  pub accuracy:    Option<f64>,
  pub captured_at: Option<DateTime<Utc>>,
}

/// `POST /alerts/:id/location` — owner only, open alerts only.
pub async fn update_location<S, D, N>(
  State(state): State<AppState<S, D, N>>,
  Identity(actor): Identity,
  Path(id): Path<Uuid>,
  Json(body): Json<LocationBody>,
) -> Result<Json<Alert>, ApiError>
where
  S: AlertStore + 'static,
  D: Directory + 'static,
  N: AlertNotifier + 'static,
{
  let sample = NewLocationSample {
    coordinates: GeoPoint {
      latitude:  body.location.latitude,
      longitude: body.location.longitude,
    },
    accuracy:    body.location.accuracy,
    captured_at: body.location.captured_at,
  };
  Ok(Json(state.tracker.append(actor, id, sample).await?))
}

// ─── Description ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct DescriptionBody {
  pub description: String,
}

/// `PUT /alerts/:id/description`
pub async fn update_description<S, D, N>(
  State(state): State<AppState<S, D, N>>,
  Identity(actor): Identity,
  Path(id): Path<Uuid>,
  Json(body): Json<DescriptionBody>,
) -> Result<Json<Alert>, ApiError>
where
  S: AlertStore + 'static,
  D: Directory + 'static,
  N: AlertNotifier + 'static,
{
  Ok(Json(
    state
      .engine
      .update_description(actor, id, body.description)
      .await?,
  ))
}
