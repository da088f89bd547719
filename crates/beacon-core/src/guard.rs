//! Access-control guard.
//!
//! One capability function over `(actor, action, alert)` decides allow/deny
//! for every operation, so authorization is testable without HTTP plumbing
//! and no handler carries ad hoc role conditionals. Relationship checks
//! (guardian edges) go through the [`Directory`] collaborator.

use strum::Display;

use crate::{
  actor::{Actor, Role},
  alert::Alert,
  directory::Directory,
  error::{Error, Result},
};

/// Everything an actor can ask the system to do to an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum AlertAction {
  /// Raise a new alert.
  Create,
  /// Cancel the actor's own `active` alert.
  Cancel,
  /// Read the actor's own current alert or alert history.
  ViewOwn,
  /// Append a location sample to the actor's own alert.
  UpdateLocation,
  /// Edit the free-text description of the actor's own alert.
  UpdateDescription,
  /// Join the alert's responding set.
  Claim,
  /// Move the alert along the lifecycle table.
  Advance,
  /// Unconditional admin status override.
  Override,
  /// List every alert in the system.
  ListAll,
}

/// Decide whether `actor` may perform `action`.
///
/// `alert` must be supplied for alert-scoped actions (everything except
/// `Create`, `Cancel`, `ViewOwn`, and `ListAll`); a missing alert denies.
pub fn authorize<D: Directory + ?Sized>(
  directory: &D,
  actor: Actor,
  action: AlertAction,
  alert: Option<&Alert>,
) -> Result<()> {
  let deny = || Err(Error::Forbidden { actor: actor.id, action });

  match action {
    // Owner-scope operations: any ordinary user, on their own records.
    AlertAction::Create | AlertAction::Cancel | AlertAction::ViewOwn => {
      match actor.role {
        Role::User => Ok(()),
        _ => deny(),
      }
    }

    // Only the owner device reports its own position or edits the
    // description.
    AlertAction::UpdateLocation | AlertAction::UpdateDescription => {
      match (actor.role, alert) {
        (Role::User, Some(a)) if a.owner_id == actor.id => Ok(()),
        _ => deny(),
      }
    }

    // Claiming: all responders; guardians only over their dependents.
    AlertAction::Claim => match (actor.role, alert) {
      (Role::Responder, Some(_)) => Ok(()),
      (Role::Guardian, Some(a))
        if directory.is_guardian_of(actor.id, a.owner_id) =>
      {
        Ok(())
      }
      _ => deny(),
    },

    // Advancing additionally requires membership in the responding set.
    AlertAction::Advance => match (actor.role, alert) {
      (Role::Responder | Role::Guardian, Some(a)) => {
        if actor.role == Role::Guardian
          && !directory.is_guardian_of(actor.id, a.owner_id)
        {
          return deny();
        }
        if !a.responding_actors.contains(&actor.id) {
          return deny();
        }
        Ok(())
      }
      _ => deny(),
    },

    AlertAction::Override | AlertAction::ListAll => match actor.role {
      Role::Admin => Ok(()),
      _ => deny(),
    },
  }
}
