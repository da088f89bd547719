//! API error type and [`axum::response::IntoResponse`] implementation.
//!
//! Maps the core taxonomy onto HTTP: not-found and no-cancellable-alert to
//! 404, authorization failures to 403, lost CAS races to 409, everything
//! malformed or conflicting-on-create to 400. A duplicate-create response
//! carries the owner's existing alert for reference.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use beacon_core::Error as CoreError;
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("missing or unknown actor identity")]
  Unauthenticated,

  /// The responder endpoint rejects repeat claims; the guardian endpoint
  /// stays idempotent and never produces this.
  #[error("actor {actor} has already claimed alert {alert}")]
  AlreadyClaimed { alert: Uuid, actor: Uuid },

  #[error(transparent)]
  Core(#[from] CoreError),
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let message = self.to_string();
    let (status, body) = match self {
      ApiError::Unauthenticated => {
        (StatusCode::UNAUTHORIZED, json!({ "error": message }))
      }
      ApiError::AlreadyClaimed { .. } => {
        (StatusCode::BAD_REQUEST, json!({ "error": message }))
      }
      ApiError::Core(core) => match core {
        CoreError::AlertNotFound(_) | CoreError::NoCancellableAlert(_) => {
          (StatusCode::NOT_FOUND, json!({ "error": message }))
        }
        CoreError::DuplicateActive { existing, .. } => (
          StatusCode::BAD_REQUEST,
          json!({ "error": message, "alert": *existing }),
        ),
        CoreError::Forbidden { .. } => {
          (StatusCode::FORBIDDEN, json!({ "error": message }))
        }
        CoreError::InvalidTransition { .. }
        | CoreError::InvalidState { .. }
        | CoreError::Validation(_) => {
          (StatusCode::BAD_REQUEST, json!({ "error": message }))
        }
        CoreError::StatusConflict { .. } => {
          (StatusCode::CONFLICT, json!({ "error": message }))
        }
        CoreError::Storage(e) => {
          tracing::error!(error = %e, "store failure");
          (
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({ "error": "internal storage error" }),
          )
        }
      },
    };
    (status, Json(body)).into_response()
  }
}
