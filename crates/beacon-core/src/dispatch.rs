//! Dispatch selector — which actors are eligible to see and claim an alert.
//!
//! Deliberately coarse: every responder is eligible regardless of distance
//! (no proximity filtering), plus the owner's guardians. Dispatch is
//! pull-style; nothing here pushes assignments, and eligible actors discover
//! candidate alerts by querying open alerts.

use std::collections::BTreeSet;

use uuid::Uuid;

use crate::directory::Directory;

/// All actors with the responder role.
pub fn eligible_responders<D: Directory + ?Sized>(directory: &D) -> Vec<Uuid> {
  directory.responders()
}

/// All guardians with a dependent edge to `owner`.
pub fn eligible_guardians<D: Directory + ?Sized>(
  directory: &D,
  owner: Uuid,
) -> Vec<Uuid> {
  directory.guardians_of(owner)
}

/// The union of both pools — the fanout audience for a new alert.
pub fn eligible_actors<D: Directory + ?Sized>(
  directory: &D,
  owner: Uuid,
) -> BTreeSet<Uuid> {
  let mut actors: BTreeSet<Uuid> =
    eligible_responders(directory).into_iter().collect();
  actors.extend(eligible_guardians(directory, owner));
  actors
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{actor::Role, directory::InMemoryDirectory};

  #[test]
  fn union_of_responders_and_owner_guardians() {
    let owner = Uuid::new_v4();
    let other_user = Uuid::new_v4();
    let r1 = Uuid::new_v4();
    let r2 = Uuid::new_v4();
    let own_guardian = Uuid::new_v4();
    let other_guardian = Uuid::new_v4();

    let dir = InMemoryDirectory::new()
      .with_actor(owner, Role::User)
      .with_actor(r1, Role::Responder)
      .with_actor(r2, Role::Responder)
      .with_guardian(own_guardian, [owner])
      .with_guardian(other_guardian, [other_user]);

    let actors = eligible_actors(&dir, owner);
    assert_eq!(actors.len(), 3);
    assert!(actors.contains(&r1));
    assert!(actors.contains(&r2));
    assert!(actors.contains(&own_guardian));
    assert!(!actors.contains(&other_guardian));
    assert!(!actors.contains(&owner));
  }

  #[test]
  fn actor_in_both_pools_counted_once() {
    // A responder who is also the owner's guardian appears once.
    let owner = Uuid::new_v4();
    let both = Uuid::new_v4();
    let dir = InMemoryDirectory::new()
      .with_guardian(both, [owner])
      .with_actor(both, Role::Responder);

    assert_eq!(eligible_actors(&dir, owner).len(), 1);
  }
}
