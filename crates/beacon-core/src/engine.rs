//! The alert lifecycle engine — the only component that mutates alert
//! status.
//!
//! Every operation runs guard checks first, then funnels its write through
//! one of the store's atomic primitives. The engine itself holds no locks;
//! a losing concurrent writer surfaces [`Error::StatusConflict`] and may
//! retry after re-reading.

use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use crate::{
  actor::{Actor, Role},
  alert::{Alert, AlertStatus, GeoPoint, NewAlert},
  directory::Directory,
  dispatch,
  error::{Error, Result},
  guard::{self, AlertAction},
  lifecycle::{self, ChangeOrigin, StatusChange},
  notify::AlertNotifier,
  store::{AlertStore, ClaimOutcome, StatusUpdate},
};

// ─── Request / response types ────────────────────────────────────────────────

/// Input to [`LifecycleEngine::create`].
#[derive(Debug, Clone)]
pub struct CreateAlert {
  pub location:    GeoPoint,
  pub description: Option<String>,
}

/// Result of a successful creation.
#[derive(Debug, Clone)]
pub struct CreatedAlert {
  pub alert:             Alert,
  /// How many out-of-band emergency contacts were signalled.
  pub contacts_notified: usize,
}

/// Per-status counts for the admin overview.
#[derive(Debug, Clone, Copy, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertTotals {
  pub active:    usize,
  pub en_route:  usize,
  pub on_scene:  usize,
  pub resolved:  usize,
  pub cancelled: usize,
  pub total:     usize,
}

/// The admin list view: everything, split open/closed, with totals.
#[derive(Debug, Clone)]
pub struct AdminOverview {
  pub active_alerts:     Vec<Alert>,
  pub historical_alerts: Vec<Alert>,
  pub totals:            AlertTotals,
}

// ─── Engine ──────────────────────────────────────────────────────────────────

pub struct LifecycleEngine<S, D, N> {
  store:     Arc<S>,
  directory: Arc<D>,
  notifier:  Arc<N>,
}

impl<S, D, N> LifecycleEngine<S, D, N>
where
  S: AlertStore,
  D: Directory,
  N: AlertNotifier,
{
  pub fn new(store: Arc<S>, directory: Arc<D>, notifier: Arc<N>) -> Self {
    Self { store, directory, notifier }
  }

  pub fn directory(&self) -> &Arc<D> { &self.directory }

  // ── Creation ──────────────────────────────────────────────────────────

  /// Raise a new alert for `actor`.
  ///
  /// Fails with [`Error::DuplicateActive`] (carrying the existing alert) if
  /// the owner already has an open alert. Notification fanout — eligible
  /// actors plus out-of-band contacts — is best-effort: send failures are
  /// logged and never fail the creation.
  pub async fn create(
    &self,
    actor: Actor,
    input: CreateAlert,
  ) -> Result<CreatedAlert> {
    guard::authorize(
      self.directory.as_ref(),
      actor,
      AlertAction::Create,
      None,
    )?;
    input.location.validate()?;
    let description = validate_description(input.description)?;

    // Pre-check so the conflict response can include the existing alert.
    // The store's uniqueness index still backstops racing creates.
    if let Some(existing) = self.store.find_active_by_owner(actor.id).await? {
      return Err(Error::DuplicateActive {
        owner:    actor.id,
        existing: Box::new(existing),
      });
    }

    let mut alert = self
      .store
      .create_alert(NewAlert {
        owner_id: actor.id,
        location: input.location,
        description,
      })
      .await?;

    let contacts = self.directory.emergency_contacts(actor.id);
    if !contacts.is_empty() {
      // Latched before any send is attempted; send failures do not clear it.
      self.store.mark_contacts_notified(alert.alert_id).await?;
      alert.contacts_notified = true;
      for contact in &contacts {
        if let Err(e) = self.notifier.notify_contact(contact, &alert).await {
          tracing::warn!(
            alert_id = %alert.alert_id,
            contact = %contact.name,
            error = %e,
            "emergency-contact notification failed"
          );
        }
      }
    }

    for eligible in dispatch::eligible_actors(self.directory.as_ref(), actor.id)
    {
      if let Err(e) = self.notifier.notify_actor(eligible, &alert).await {
        tracing::warn!(
          alert_id = %alert.alert_id,
          actor_id = %eligible,
          error = %e,
          "eligible-actor notification failed"
        );
      }
    }

    Ok(CreatedAlert { alert, contacts_notified: contacts.len() })
  }

  // ── Claiming ──────────────────────────────────────────────────────────

  /// Join the alert's responding set; the first claim on an `active` alert
  /// also flips it to `en_route` in the same atomic store operation.
  ///
  /// Idempotent at this level: a repeat claim by the same actor succeeds
  /// with `newly_joined == false`. Callers that must reject re-claims
  /// (the responder endpoint) inspect the outcome.
  pub async fn claim(
    &self,
    actor: Actor,
    alert_id: Uuid,
  ) -> Result<ClaimOutcome> {
    let alert = self.fetch(alert_id).await?;
    guard::authorize(
      self.directory.as_ref(),
      actor,
      AlertAction::Claim,
      Some(&alert),
    )?;

    self.store.claim(alert_id, actor.id).await
  }

  // ── Advancing ─────────────────────────────────────────────────────────

  /// Move the alert to a direct successor status per the lifecycle table.
  /// Requires membership in the responding set (checked by the guard).
  pub async fn advance(
    &self,
    actor: Actor,
    alert_id: Uuid,
    target: AlertStatus,
    notes: Option<String>,
  ) -> Result<Alert> {
    let alert = self.fetch(alert_id).await?;
    guard::authorize(
      self.directory.as_ref(),
      actor,
      AlertAction::Advance,
      Some(&alert),
    )?;

    // Cancellation is owner-only and has its own operation; it is never a
    // valid advance target.
    if target == AlertStatus::Cancelled
      || !lifecycle::permitted(alert.status, target)
    {
      return Err(Error::InvalidTransition { from: alert.status, to: target });
    }

    self
      .store
      .update_status(alert_id, StatusUpdate {
        expected: Some(alert.status),
        to: target,
        notes,
        origin: ChangeOrigin::Advance,
        actor_id: actor.id,
      })
      .await
  }

  // ── Cancellation ──────────────────────────────────────────────────────

  /// Cancel the owner's current alert — only while its persisted status is
  /// exactly `active`. Once any responder has claimed, cancellation is
  /// unavailable and the owner sees "not found".
  pub async fn cancel(&self, actor: Actor) -> Result<Alert> {
    guard::authorize(
      self.directory.as_ref(),
      actor,
      AlertAction::Cancel,
      None,
    )?;

    let alert = self
      .store
      .find_active_by_owner(actor.id)
      .await?
      .filter(|a| a.status == AlertStatus::Active)
      .ok_or(Error::NoCancellableAlert(actor.id))?;

    self
      .store
      .update_status(alert.alert_id, StatusUpdate {
        expected: Some(AlertStatus::Active),
        to:       AlertStatus::Cancelled,
        notes:    None,
        origin:   ChangeOrigin::Cancel,
        actor_id: actor.id,
      })
      .await
  }

  // ── Admin override ────────────────────────────────────────────────────

  /// Set the status to any enumerated value, bypassing the transition
  /// table — including backward moves such as `resolved -> active`.
  ///
  /// The write still CASes against the status this call observed, so a
  /// losing concurrent writer surfaces [`Error::StatusConflict`] instead of
  /// silently clobbering; retry after re-reading is safe. The audit trail
  /// records the change as [`ChangeOrigin::AdminOverride`].
  pub async fn force_status(
    &self,
    actor: Actor,
    alert_id: Uuid,
    target: AlertStatus,
  ) -> Result<Alert> {
    let alert = self.fetch(alert_id).await?;
    guard::authorize(
      self.directory.as_ref(),
      actor,
      AlertAction::Override,
      Some(&alert),
    )?;

    self
      .store
      .update_status(alert_id, StatusUpdate {
        expected: Some(alert.status),
        to:       target,
        notes:    None,
        origin:   ChangeOrigin::AdminOverride,
        actor_id: actor.id,
      })
      .await
  }

  // ── Description ───────────────────────────────────────────────────────

  /// Replace the owner-supplied description while the alert is open.
  pub async fn update_description(
    &self,
    actor: Actor,
    alert_id: Uuid,
    description: String,
  ) -> Result<Alert> {
    let description = validate_description(Some(description))?
      .ok_or_else(|| Error::Validation("description is required".into()))?;

    let alert = self.fetch(alert_id).await?;
    guard::authorize(
      self.directory.as_ref(),
      actor,
      AlertAction::UpdateDescription,
      Some(&alert),
    )?;
    if alert.status.is_terminal() {
      return Err(Error::InvalidState {
        id:     alert_id,
        status: alert.status,
      });
    }

    self.store.set_description(alert_id, description).await
  }

  // ── Owner queries ─────────────────────────────────────────────────────

  /// The owner's current open alert, if any.
  pub async fn active_for_owner(&self, actor: Actor) -> Result<Option<Alert>> {
    guard::authorize(
      self.directory.as_ref(),
      actor,
      AlertAction::ViewOwn,
      None,
    )?;
    self.store.find_active_by_owner(actor.id).await
  }

  /// Every alert the owner has ever raised, newest first.
  pub async fn history_for_owner(&self, actor: Actor) -> Result<Vec<Alert>> {
    guard::authorize(
      self.directory.as_ref(),
      actor,
      AlertAction::ViewOwn,
      None,
    )?;
    self.store.find_by_owner(actor.id).await
  }

  // ── Discovery (pull-style dispatch) ───────────────────────────────────

  /// Open alerts the actor is eligible to claim: all of them for
  /// responders, only dependents' alerts for guardians.
  pub async fn open_alerts_for(&self, actor: Actor) -> Result<Vec<Alert>> {
    let open = self.store.find_by_status(&AlertStatus::OPEN).await?;
    match actor.role {
      Role::Responder => Ok(open),
      Role::Guardian => Ok(
        open
          .into_iter()
          .filter(|a| self.directory.is_guardian_of(actor.id, a.owner_id))
          .collect(),
      ),
      _ => Err(Error::Forbidden {
        actor:  actor.id,
        action: AlertAction::Claim,
      }),
    }
  }

  /// Alerts the actor has claimed, newest first.
  pub async fn engagements(&self, actor: Actor) -> Result<Vec<Alert>> {
    match actor.role {
      Role::Responder | Role::Guardian => {
        self.store.find_by_responder(actor.id).await
      }
      _ => Err(Error::Forbidden {
        actor:  actor.id,
        action: AlertAction::Claim,
      }),
    }
  }

  // ── Admin queries ─────────────────────────────────────────────────────

  /// All alerts split open/closed, with per-status totals.
  pub async fn admin_overview(&self, actor: Actor) -> Result<AdminOverview> {
    guard::authorize(
      self.directory.as_ref(),
      actor,
      AlertAction::ListAll,
      None,
    )?;

    let active_alerts = self.store.find_by_status(&AlertStatus::OPEN).await?;
    let historical_alerts =
      self.store.find_by_status(&AlertStatus::CLOSED).await?;

    let mut totals = AlertTotals::default();
    for alert in active_alerts.iter().chain(historical_alerts.iter()) {
      match alert.status {
        AlertStatus::Active => totals.active += 1,
        AlertStatus::EnRoute => totals.en_route += 1,
        AlertStatus::OnScene => totals.on_scene += 1,
        AlertStatus::Resolved => totals.resolved += 1,
        AlertStatus::Cancelled => totals.cancelled += 1,
      }
      totals.total += 1;
    }

    Ok(AdminOverview { active_alerts, historical_alerts, totals })
  }

  /// The alert's status audit trail, oldest first. Admin overrides appear
  /// under their own origin, distinct from actor-driven transitions.
  pub async fn audit_trail(
    &self,
    actor: Actor,
    alert_id: Uuid,
  ) -> Result<Vec<StatusChange>> {
    guard::authorize(
      self.directory.as_ref(),
      actor,
      AlertAction::ListAll,
      None,
    )?;
    self.fetch(alert_id).await?;
    self.store.status_history(alert_id).await
  }

  // ── Internals ─────────────────────────────────────────────────────────

  async fn fetch(&self, alert_id: Uuid) -> Result<Alert> {
    self
      .store
      .get_alert(alert_id)
      .await?
      .ok_or(Error::AlertNotFound(alert_id))
  }
}

/// Trim a description, mapping empty input to an error and `None` through.
fn validate_description(input: Option<String>) -> Result<Option<String>> {
  match input {
    None => Ok(None),
    Some(s) => {
      let trimmed = s.trim();
      if trimmed.is_empty() {
        Err(Error::Validation("description must not be empty".into()))
      } else {
        Ok(Some(trimmed.to_string()))
      }
    }
  }
}
