//! The identity collaborator interface.
//!
//! Identity, sessions, and the guardian→dependent relation are owned by an
//! external system. This trait is the seam: it supplies roles, guardian
//! links, the responder roster, and each owner's out-of-band emergency
//! contacts. [`InMemoryDirectory`] is the roster-backed implementation used
//! by the server binary and by tests.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::actor::Role;

/// An out-of-band emergency contact registered by an alert owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmergencyContact {
  pub name:  String,
  pub phone: String,
}

/// Read-only view of the external identity system.
pub trait Directory: Send + Sync {
  /// The role held by `actor`, or `None` if the id is unknown.
  fn role_of(&self, actor: Uuid) -> Option<Role>;

  /// Whether the directed edge `guardian -> dependent` exists.
  fn is_guardian_of(&self, guardian: Uuid, dependent: Uuid) -> bool;

  /// All actors holding the responder role.
  fn responders(&self) -> Vec<Uuid>;

  /// All guardians with a dependent edge to `dependent`.
  fn guardians_of(&self, dependent: Uuid) -> Vec<Uuid>;

  /// The owner's registered out-of-band emergency contacts.
  fn emergency_contacts(&self, owner: Uuid) -> Vec<EmergencyContact>;
}

// ─── In-memory implementation ────────────────────────────────────────────────

/// A static roster, built at startup (or per test) and never mutated after.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDirectory {
  roles:    HashMap<Uuid, Role>,
  /// guardian -> set of dependents
  links:    HashMap<Uuid, HashSet<Uuid>>,
  contacts: HashMap<Uuid, Vec<EmergencyContact>>,
}

impl InMemoryDirectory {
  pub fn new() -> Self { Self::default() }

  pub fn with_actor(mut self, id: Uuid, role: Role) -> Self {
    self.roles.insert(id, role);
    self
  }

  /// Register `guardian` (assigning the guardian role) with an edge to each
  /// dependent.
  pub fn with_guardian(
    mut self,
    guardian: Uuid,
    dependents: impl IntoIterator<Item = Uuid>,
  ) -> Self {
    self.roles.insert(guardian, Role::Guardian);
    self.links.entry(guardian).or_default().extend(dependents);
    self
  }

  pub fn with_contacts(
    mut self,
    owner: Uuid,
    contacts: Vec<EmergencyContact>,
  ) -> Self {
    self.contacts.insert(owner, contacts);
    self
  }
}

impl Directory for InMemoryDirectory {
  fn role_of(&self, actor: Uuid) -> Option<Role> {
    self.roles.get(&actor).copied()
  }

  fn is_guardian_of(&self, guardian: Uuid, dependent: Uuid) -> bool {
    self
      .links
      .get(&guardian)
      .is_some_and(|deps| deps.contains(&dependent))
  }

  fn responders(&self) -> Vec<Uuid> {
    self
      .roles
      .iter()
      .filter(|(_, role)| **role == Role::Responder)
      .map(|(id, _)| *id)
      .collect()
  }

  fn guardians_of(&self, dependent: Uuid) -> Vec<Uuid> {
    self
      .links
      .iter()
      .filter(|(_, deps)| deps.contains(&dependent))
      .map(|(g, _)| *g)
      .collect()
  }

  fn emergency_contacts(&self, owner: Uuid) -> Vec<EmergencyContact> {
    self.contacts.get(&owner).cloned().unwrap_or_default()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn guardian_edge_is_directional() {
    let guardian = Uuid::new_v4();
    let dependent = Uuid::new_v4();
    let dir = InMemoryDirectory::new()
      .with_actor(dependent, Role::User)
      .with_guardian(guardian, [dependent]);

    assert!(dir.is_guardian_of(guardian, dependent));
    assert!(!dir.is_guardian_of(dependent, guardian));
    assert_eq!(dir.guardians_of(dependent), vec![guardian]);
    assert_eq!(dir.role_of(guardian), Some(Role::Guardian));
  }

  #[test]
  fn unknown_actor_has_no_role() {
    let dir = InMemoryDirectory::new();
    assert_eq!(dir.role_of(Uuid::new_v4()), None);
    assert!(dir.responders().is_empty());
  }

  #[test]
  fn contacts_default_to_empty() {
    let owner = Uuid::new_v4();
    let dir = InMemoryDirectory::new().with_contacts(owner, vec![
      EmergencyContact { name: "Ada".into(), phone: "+1555".into() },
    ]);
    assert_eq!(dir.emergency_contacts(owner).len(), 1);
    assert!(dir.emergency_contacts(Uuid::new_v4()).is_empty());
  }
}
