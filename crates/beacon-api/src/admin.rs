//! Admin endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/admin/alerts` | `{activeAlerts, historicalAlerts, totals}` |
//! | `GET`  | `/admin/alerts/:id/history` | Status audit trail, oldest first |
//! | `PUT`  | `/admin/alerts/:id/status` | Unconditional override; 200 `{alert}` |

use axum::{
  Json,
  extract::{Path, State},
};
use beacon_core::{
  alert::{Alert, AlertStatus},
  directory::Directory,
  engine::AlertTotals,
  lifecycle::StatusChange,
  notify::AlertNotifier,
  store::AlertStore,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{AppState, error::ApiError, identity::Identity};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResponse {
  pub active_alerts:     Vec<Alert>,
  pub historical_alerts: Vec<Alert>,
  pub totals:            AlertTotals,
}

/// `GET /admin/alerts`
pub async fn list<S, D, N>(
  State(state): State<AppState<S, D, N>>,
  Identity(actor): Identity,
) -> Result<Json<ListResponse>, ApiError>
where
  S: AlertStore + 'static,
  D: Directory + 'static,
  N: AlertNotifier + 'static,
{
  let overview = state.engine.admin_overview(actor).await?;
  Ok(Json(ListResponse {
    active_alerts:     overview.active_alerts,
    historical_alerts: overview.historical_alerts,
    totals:            overview.totals,
  }))
}

/// `GET /admin/alerts/:id/history` — every status change the alert has
/// gone through, including admin overrides under their own origin.
pub async fn history<S, D, N>(
  State(state): State<AppState<S, D, N>>,
  Identity(actor): Identity,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<StatusChange>>, ApiError>
where
  S: AlertStore + 'static,
  D: Directory + 'static,
  N: AlertNotifier + 'static,
{
  Ok(Json(state.engine.audit_trail(actor, id).await?))
}

#[derive(Debug, Deserialize)]
pub struct OverrideBody {
  pub status: AlertStatus,
}

#[derive(Debug, Serialize)]
pub struct OverrideResponse {
  pub alert: Alert,
}

/// `PUT /admin/alerts/:id/status` — set any enumerated status, bypassing
/// the transition table. Recorded in the audit trail as an admin override.
pub async fn force_status<S, D, N>(
  State(state): State<AppState<S, D, N>>,
  Identity(actor): Identity,
  Path(id): Path<Uuid>,
  Json(body): Json<OverrideBody>,
) -> Result<Json<OverrideResponse>, ApiError>
where
  S: AlertStore + 'static,
  D: Directory + 'static,
  N: AlertNotifier + 'static,
{
  let alert = state.engine.force_status(actor, id, body.status).await?;
  Ok(Json(OverrideResponse { alert }))
}
