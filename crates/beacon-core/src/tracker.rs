//! Location tracker — owner-gated appends to an alert's position history.
//!
//! Samples are accepted and ordered by server receipt; the canonical
//! position is always the most recently appended sample, never re-ordered by
//! the client-supplied capture timestamp. Concurrent calls for the same
//! alert serialise through the store's atomic append, so no sample is lost
//! or overwritten.

use std::sync::Arc;

use uuid::Uuid;

use crate::{
  actor::Actor,
  alert::{Alert, NewLocationSample},
  directory::Directory,
  error::{Error, Result},
  guard::{self, AlertAction},
  store::AlertStore,
};

pub struct LocationTracker<S, D> {
  store:     Arc<S>,
  directory: Arc<D>,
}

impl<S, D> LocationTracker<S, D>
where
  S: AlertStore,
  D: Directory,
{
  pub fn new(store: Arc<S>, directory: Arc<D>) -> Self {
    Self { store, directory }
  }

  /// Append one sample to the alert's history and advance the canonical
  /// position.
  ///
  /// Only the owner device reports its own position. The open-state check
  /// runs inside the store's append transaction, so a concurrent resolve
  /// cannot slip a sample onto a closed alert.
  pub async fn append(
    &self,
    actor: Actor,
    alert_id: Uuid,
    sample: NewLocationSample,
  ) -> Result<Alert> {
    sample.validate()?;

    let alert = self
      .store
      .get_alert(alert_id)
      .await?
      .ok_or(Error::AlertNotFound(alert_id))?;

    guard::authorize(
      self.directory.as_ref(),
      actor,
      AlertAction::UpdateLocation,
      Some(&alert),
    )?;

    self.store.append_location(alert_id, sample).await
  }
}
