//! Server configuration, deserialised from `config.toml` plus `BEACON_*`
//! environment overrides.
//!
//! The roster section stands in for the external identity system: it lists
//! every known actor id with its role, the guardian→dependent edges, and
//! each owner's out-of-band emergency contacts. It is loaded once at
//! startup into an [`InMemoryDirectory`].

use std::path::PathBuf;

use beacon_core::{
  actor::Role,
  directory::{EmergencyContact, InMemoryDirectory},
};
use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
  pub host:       String,
  pub port:       u16,
  pub store_path: PathBuf,
  #[serde(default)]
  pub roster:     Roster,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Roster {
  #[serde(default)]
  pub users:      Vec<Uuid>,
  #[serde(default)]
  pub responders: Vec<Uuid>,
  #[serde(default)]
  pub admins:     Vec<Uuid>,
  #[serde(default)]
  pub guardians:  Vec<GuardianEntry>,
  #[serde(default)]
  pub contacts:   Vec<ContactEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GuardianEntry {
  pub id:         Uuid,
  #[serde(default)]
  pub dependents: Vec<Uuid>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContactEntry {
  pub owner: Uuid,
  pub name:  String,
  pub phone: String,
}

impl Roster {
  /// Materialise the roster into the directory the engine consults.
  pub fn build_directory(&self) -> InMemoryDirectory {
    let mut directory = InMemoryDirectory::new();
    for id in &self.users {
      directory = directory.with_actor(*id, Role::User);
    }
    for id in &self.responders {
      directory = directory.with_actor(*id, Role::Responder);
    }
    for id in &self.admins {
      directory = directory.with_actor(*id, Role::Admin);
    }
    for entry in &self.guardians {
      directory =
        directory.with_guardian(entry.id, entry.dependents.iter().copied());
    }
    for entry in &self.contacts {
      let contact = EmergencyContact {
        name:  entry.name.clone(),
        phone: entry.phone.clone(),
      };
      directory = directory.with_contacts(entry.owner, vec![contact]);
    }
    directory
  }

  pub fn actor_count(&self) -> usize {
    self.users.len()
      + self.responders.len()
      + self.admins.len()
      + self.guardians.len()
  }
}
