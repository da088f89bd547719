//! Actors — the identities that operate on alerts.
//!
//! Identity and session management live in an external collaborator; requests
//! arrive here already authenticated, carrying a stable actor id and a role.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The role an actor holds for the duration of one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
  /// An ordinary user — may own alerts but not respond to others'.
  User,
  /// Linked to one or more dependent users; may act on their alerts.
  Guardian,
  /// May claim and advance any alert.
  Responder,
  /// Operational override powers.
  Admin,
}

/// An authenticated identity performing an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
  pub id:   Uuid,
  pub role: Role,
}

impl Actor {
  pub fn new(id: Uuid, role: Role) -> Self { Self { id, role } }
}
