//! Notification fanout — best-effort side-channel signalling.
//!
//! Sends are fire-and-forget: a failed send is logged and never blocks or
//! rolls back the lifecycle operation that triggered it. Alert durability
//! must not depend on this channel.

use std::future::Future;

use thiserror::Error;
use uuid::Uuid;

use crate::{alert::Alert, directory::EmergencyContact};

/// A failed delivery attempt. Only ever logged, never propagated.
#[derive(Debug, Error)]
#[error("notification send failed: {0}")]
pub struct NotifyError(pub String);

/// External best-effort notification sink (push transport, SMS gateway,
/// etc.). Implementations must not block the lifecycle path for long.
pub trait AlertNotifier: Send + Sync {
  /// Signal an eligible actor (responder or guardian) about a new alert.
  fn notify_actor(
    &self,
    actor: Uuid,
    alert: &Alert,
  ) -> impl Future<Output = Result<(), NotifyError>> + Send;

  /// Signal one of the owner's out-of-band emergency contacts.
  fn notify_contact(
    &self,
    contact: &EmergencyContact,
    alert: &Alert,
  ) -> impl Future<Output = Result<(), NotifyError>> + Send;
}

/// Log-only sink — the default when no real transport is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl AlertNotifier for LogNotifier {
  async fn notify_actor(
    &self,
    actor: Uuid,
    alert: &Alert,
  ) -> Result<(), NotifyError> {
    tracing::info!(
      alert_id = %alert.alert_id,
      actor_id = %actor,
      "would notify eligible actor"
    );
    Ok(())
  }

  async fn notify_contact(
    &self,
    contact: &EmergencyContact,
    alert: &Alert,
  ) -> Result<(), NotifyError> {
    tracing::info!(
      alert_id = %alert.alert_id,
      contact = %contact.name,
      "would notify emergency contact"
    );
    Ok(())
  }
}
