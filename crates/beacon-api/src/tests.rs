//! Integration tests driving the full router over an in-memory store.

use std::sync::Arc;

use axum::{
  body::Body,
  http::{Request, StatusCode},
};
use beacon_core::{
  actor::Role,
  directory::{EmergencyContact, InMemoryDirectory},
  notify::LogNotifier,
};
use beacon_store_sqlite::SqliteStore;
use serde_json::{Value, json};
use tower::ServiceExt as _;
use uuid::Uuid;

use crate::{AppState, identity::ACTOR_HEADER, router};

type TestState = AppState<SqliteStore, InMemoryDirectory, LogNotifier>;

/// The cast of actors every test draws from.
struct Roster {
  owner:     Uuid,
  bystander: Uuid,
  responder: Uuid,
  responder2: Uuid,
  guardian:  Uuid,
  stranger_guardian: Uuid,
  admin:     Uuid,
}

impl Roster {
  fn new() -> Self {
    Self {
      owner:     Uuid::new_v4(),
      bystander: Uuid::new_v4(),
      responder: Uuid::new_v4(),
      responder2: Uuid::new_v4(),
      guardian:  Uuid::new_v4(),
      stranger_guardian: Uuid::new_v4(),
      admin:     Uuid::new_v4(),
    }
  }

  fn directory(&self) -> InMemoryDirectory {
    InMemoryDirectory::new()
      .with_actor(self.owner, Role::User)
      .with_actor(self.bystander, Role::User)
      .with_actor(self.responder, Role::Responder)
      .with_actor(self.responder2, Role::Responder)
      .with_actor(self.admin, Role::Admin)
      .with_guardian(self.guardian, [self.owner])
      .with_guardian(self.stranger_guardian, [Uuid::new_v4()])
  }
}

async fn make_state(directory: InMemoryDirectory) -> TestState {
  let store = SqliteStore::open_in_memory().await.unwrap();
  AppState::new(Arc::new(store), Arc::new(directory), Arc::new(LogNotifier))
}

async fn send(
  state: &TestState,
  method: &str,
  uri: &str,
  actor: Option<Uuid>,
  body: Option<Value>,
) -> axum::response::Response {
  let mut builder = Request::builder().method(method).uri(uri);
  if let Some(actor) = actor {
    builder = builder.header(ACTOR_HEADER, actor.to_string());
  }
  let req = match body {
    Some(v) => builder
      .header("content-type", "application/json")
      .body(Body::from(v.to_string()))
      .unwrap(),
    None => builder.body(Body::empty()).unwrap(),
  };
  router(state.clone()).oneshot(req).await.unwrap()
}

async fn body_json(resp: axum::response::Response) -> Value {
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
    .await
    .unwrap();
  serde_json::from_slice(&bytes).unwrap()
}

fn create_body() -> Value {
  json!({
    "location": { "latitude": 40.0, "longitude": -73.0 },
    "description": "need help",
  })
}

/// Create an alert as `owner` and return its id.
async fn raise_alert(state: &TestState, owner: Uuid) -> Uuid {
  let resp = send(state, "POST", "/alerts", Some(owner), Some(create_body()))
    .await;
  assert_eq!(resp.status(), StatusCode::CREATED);
  let body = body_json(resp).await;
  body["alertId"].as_str().unwrap().parse().unwrap()
}

// ── Identity ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn missing_actor_header_returns_401() {
  let state = make_state(Roster::new().directory()).await;
  let resp = send(&state, "GET", "/alerts/active", None, None).await;
  assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn unknown_actor_returns_401() {
  let state = make_state(Roster::new().directory()).await;
  let resp =
    send(&state, "GET", "/alerts/active", Some(Uuid::new_v4()), None).await;
  assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

// ── Creation ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_reports_notified_contact_count() {
  let roster = Roster::new();
  let directory = roster.directory().with_contacts(roster.owner, vec![
    EmergencyContact { name: "Ada".into(), phone: "+15550100".into() },
    EmergencyContact { name: "Grace".into(), phone: "+15550101".into() },
  ]);
  let state = make_state(directory).await;

  let resp =
    send(&state, "POST", "/alerts", Some(roster.owner), Some(create_body()))
      .await;
  assert_eq!(resp.status(), StatusCode::CREATED);
  let body = body_json(resp).await;
  assert_eq!(body["notifiedContacts"], 2);

  let resp =
    send(&state, "GET", "/alerts/active", Some(roster.owner), None).await;
  let body = body_json(resp).await;
  assert_eq!(body["active"], true);
  assert_eq!(body["alert"]["status"], "active");
  assert_eq!(body["alert"]["contactsNotified"], true);
}

#[tokio::test]
async fn create_without_contacts_notifies_nobody() {
  let roster = Roster::new();
  let state = make_state(roster.directory()).await;

  let resp =
    send(&state, "POST", "/alerts", Some(roster.owner), Some(create_body()))
      .await;
  assert_eq!(resp.status(), StatusCode::CREATED);
  let body = body_json(resp).await;
  assert_eq!(body["notifiedContacts"], 0);

  let resp =
    send(&state, "GET", "/alerts/active", Some(roster.owner), None).await;
  let body = body_json(resp).await;
  assert_eq!(body["alert"]["contactsNotified"], false);
}

#[tokio::test]
async fn second_create_returns_400_with_existing_alert() {
  let roster = Roster::new();
  let state = make_state(roster.directory()).await;

  let first = raise_alert(&state, roster.owner).await;

  let resp =
    send(&state, "POST", "/alerts", Some(roster.owner), Some(create_body()))
      .await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  let body = body_json(resp).await;
  assert_eq!(body["alert"]["alertId"], first.to_string());

  // Exactly one alert exists for the owner.
  let resp =
    send(&state, "GET", "/alerts/history", Some(roster.owner), None).await;
  assert_eq!(body_json(resp).await.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn non_user_roles_cannot_create() {
  let roster = Roster::new();
  let state = make_state(roster.directory()).await;
  let resp = send(
    &state,
    "POST",
    "/alerts",
    Some(roster.responder),
    Some(create_body()),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn create_rejects_out_of_range_coordinates() {
  let roster = Roster::new();
  let state = make_state(roster.directory()).await;
  let resp = send(
    &state,
    "POST",
    "/alerts",
    Some(roster.owner),
    Some(json!({ "location": { "latitude": 91.0, "longitude": 0.0 } })),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// ── Claiming ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn responder_claim_flips_to_en_route_and_reclaim_is_400() {
  let roster = Roster::new();
  let state = make_state(roster.directory()).await;
  let id = raise_alert(&state, roster.owner).await;

  let resp = send(
    &state,
    "POST",
    &format!("/responders/respond/{id}"),
    Some(roster.responder),
    None,
  )
  .await;
  assert_eq!(resp.status(), StatusCode::OK);
  let body = body_json(resp).await;
  assert_eq!(body["status"], "en_route");
  assert_eq!(
    body["respondingActors"],
    json!([roster.responder.to_string()])
  );

  let resp = send(
    &state,
    "POST",
    &format!("/responders/respond/{id}"),
    Some(roster.responder),
    None,
  )
  .await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn two_responders_both_join_one_flip() {
  let roster = Roster::new();
  let state = make_state(roster.directory()).await;
  let id = raise_alert(&state, roster.owner).await;

  for r in [roster.responder, roster.responder2] {
    let resp = send(
      &state,
      "POST",
      &format!("/responders/respond/{id}"),
      Some(r),
      None,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
  }

  let resp =
    send(&state, "GET", "/alerts/active", Some(roster.owner), None).await;
  let body = body_json(resp).await;
  assert_eq!(body["alert"]["status"], "en_route");
  assert_eq!(
    body["alert"]["respondingActors"].as_array().unwrap().len(),
    2
  );
}

#[tokio::test]
async fn guardian_claim_requires_dependent_link() {
  let roster = Roster::new();
  let state = make_state(roster.directory()).await;
  let id = raise_alert(&state, roster.owner).await;

  let resp = send(
    &state,
    "POST",
    &format!("/guardians/respond/{id}"),
    Some(roster.stranger_guardian),
    None,
  )
  .await;
  assert_eq!(resp.status(), StatusCode::FORBIDDEN);

  // The linked guardian may claim, and repeat claims stay idempotent.
  for _ in 0..2 {
    let resp = send(
      &state,
      "POST",
      &format!("/guardians/respond/{id}"),
      Some(roster.guardian),
      None,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
  }
}

#[tokio::test]
async fn claim_unknown_alert_returns_404() {
  let roster = Roster::new();
  let state = make_state(roster.directory()).await;
  let resp = send(
    &state,
    "POST",
    &format!("/responders/respond/{}", Uuid::new_v4()),
    Some(roster.responder),
    None,
  )
  .await;
  assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// ── Cancellation ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn cancel_active_alert_then_second_cancel_is_404() {
  let roster = Roster::new();
  let state = make_state(roster.directory()).await;
  raise_alert(&state, roster.owner).await;

  let resp =
    send(&state, "POST", "/alerts/cancel", Some(roster.owner), None).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let body = body_json(resp).await;
  assert_eq!(body["status"], "cancelled");
  assert!(!body["resolvedAt"].is_null());

  let resp =
    send(&state, "POST", "/alerts/cancel", Some(roster.owner), None).await;
  assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn cancel_unavailable_once_claimed() {
  let roster = Roster::new();
  let state = make_state(roster.directory()).await;
  let id = raise_alert(&state, roster.owner).await;
  send(
    &state,
    "POST",
    &format!("/responders/respond/{id}"),
    Some(roster.responder),
    None,
  )
  .await;

  let resp =
    send(&state, "POST", "/alerts/cancel", Some(roster.owner), None).await;
  assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// ── Advancing ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn advance_requires_responding_set_membership() {
  let roster = Roster::new();
  let state = make_state(roster.directory()).await;
  let id = raise_alert(&state, roster.owner).await;
  send(
    &state,
    "POST",
    &format!("/responders/respond/{id}"),
    Some(roster.responder),
    None,
  )
  .await;

  // responder2 never claimed, so advancing is forbidden.
  let resp = send(
    &state,
    "PUT",
    &format!("/responders/alerts/{id}/status"),
    Some(roster.responder2),
    Some(json!({ "status": "on_scene" })),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn responder_advances_to_on_scene_then_resolved() {
  let roster = Roster::new();
  let state = make_state(roster.directory()).await;
  let id = raise_alert(&state, roster.owner).await;
  send(
    &state,
    "POST",
    &format!("/responders/respond/{id}"),
    Some(roster.responder),
    None,
  )
  .await;

  let resp = send(
    &state,
    "PUT",
    &format!("/responders/alerts/{id}/status"),
    Some(roster.responder),
    Some(json!({ "status": "on_scene" })),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::OK);
  assert_eq!(body_json(resp).await["status"], "on_scene");

  let resp = send(
    &state,
    "PUT",
    &format!("/responders/alerts/{id}/status"),
    Some(roster.responder),
    Some(json!({ "status": "resolved", "notes": "owner safe" })),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::OK);
  let body = body_json(resp).await;
  assert_eq!(body["status"], "resolved");
  assert_eq!(body["notes"], "owner safe");
  assert!(!body["resolvedAt"].is_null());
}

#[tokio::test]
async fn advance_rejects_non_successor_targets() {
  let roster = Roster::new();
  let state = make_state(roster.directory()).await;
  let id = raise_alert(&state, roster.owner).await;
  send(
    &state,
    "POST",
    &format!("/responders/respond/{id}"),
    Some(roster.responder),
    None,
  )
  .await;

  // en_route -> active is not an edge, and cancellation is owner-only.
  for target in ["active", "cancelled"] {
    let resp = send(
      &state,
      "PUT",
      &format!("/responders/alerts/{id}/status"),
      Some(roster.responder),
      Some(json!({ "status": target })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "target {target}");
  }
}

#[tokio::test]
async fn guardian_resolves_with_notes() {
  let roster = Roster::new();
  let state = make_state(roster.directory()).await;
  let id = raise_alert(&state, roster.owner).await;
  send(
    &state,
    "POST",
    &format!("/guardians/respond/{id}"),
    Some(roster.guardian),
    None,
  )
  .await;

  let resp = send(
    &state,
    "POST",
    &format!("/guardians/resolve/{id}"),
    Some(roster.guardian),
    Some(json!({ "notes": "walked home together" })),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::OK);
  let body = body_json(resp).await;
  assert_eq!(body["status"], "resolved");
  assert_eq!(body["notes"], "walked home together");
}

// ── Location ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn location_update_appends_and_moves_canonical() {
  let roster = Roster::new();
  let state = make_state(roster.directory()).await;
  let id = raise_alert(&state, roster.owner).await;

  let resp = send(
    &state,
    "POST",
    &format!("/alerts/{id}/location"),
    Some(roster.owner),
    Some(json!({
      "location": { "latitude": 40.1, "longitude": -73.1, "accuracy": 8.0 }
    })),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::OK);
  let body = body_json(resp).await;
  assert_eq!(body["locationHistory"].as_array().unwrap().len(), 2);
  assert_eq!(body["canonicalLocation"]["latitude"], 40.1);
}

#[tokio::test]
async fn location_update_is_owner_only() {
  let roster = Roster::new();
  let state = make_state(roster.directory()).await;
  let id = raise_alert(&state, roster.owner).await;

  for actor in [roster.bystander, roster.responder] {
    let resp = send(
      &state,
      "POST",
      &format!("/alerts/{id}/location"),
      Some(actor),
      Some(json!({ "location": { "latitude": 40.1, "longitude": -73.1 } })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
  }
}

#[tokio::test]
async fn location_update_rejected_on_terminal_alert() {
  let roster = Roster::new();
  let state = make_state(roster.directory()).await;
  let id = raise_alert(&state, roster.owner).await;
  send(&state, "POST", "/alerts/cancel", Some(roster.owner), None).await;

  let resp = send(
    &state,
    "POST",
    &format!("/alerts/{id}/location"),
    Some(roster.owner),
    Some(json!({ "location": { "latitude": 40.1, "longitude": -73.1 } })),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn location_update_validates_coordinates() {
  let roster = Roster::new();
  let state = make_state(roster.directory()).await;
  let id = raise_alert(&state, roster.owner).await;

  let resp = send(
    &state,
    "POST",
    &format!("/alerts/{id}/location"),
    Some(roster.owner),
    Some(json!({ "location": { "latitude": 40.1, "longitude": -181.0 } })),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// ── Description ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn description_update_and_validation() {
  let roster = Roster::new();
  let state = make_state(roster.directory()).await;
  let id = raise_alert(&state, roster.owner).await;

  let resp = send(
    &state,
    "PUT",
    &format!("/alerts/{id}/description"),
    Some(roster.owner),
    Some(json!({ "description": "white sedan, northbound" })),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::OK);
  assert_eq!(
    body_json(resp).await["description"],
    "white sedan, northbound"
  );

  let resp = send(
    &state,
    "PUT",
    &format!("/alerts/{id}/description"),
    Some(roster.owner),
    Some(json!({ "description": "   " })),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

  let resp = send(
    &state,
    "PUT",
    &format!("/alerts/{id}/description"),
    Some(roster.bystander),
    Some(json!({ "description": "not yours" })),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

// ── Discovery ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn responders_see_all_open_alerts_guardians_only_dependents() {
  let roster = Roster::new();
  let state = make_state(roster.directory()).await;
  let own = raise_alert(&state, roster.owner).await;
  let other = raise_alert(&state, roster.bystander).await;

  let resp =
    send(&state, "GET", "/responders/alerts", Some(roster.responder), None)
      .await;
  assert_eq!(resp.status(), StatusCode::OK);
  assert_eq!(body_json(resp).await.as_array().unwrap().len(), 2);

  let resp =
    send(&state, "GET", "/guardians/alerts", Some(roster.guardian), None)
      .await;
  assert_eq!(resp.status(), StatusCode::OK);
  let body = body_json(resp).await;
  let ids: Vec<&str> = body
    .as_array()
    .unwrap()
    .iter()
    .map(|a| a["alertId"].as_str().unwrap())
    .collect();
  assert_eq!(ids, vec![own.to_string()]);
  assert_ne!(ids[0], other.to_string());
}

#[tokio::test]
async fn engagements_list_claimed_alerts() {
  let roster = Roster::new();
  let state = make_state(roster.directory()).await;
  let id = raise_alert(&state, roster.owner).await;
  raise_alert(&state, roster.bystander).await;
  send(
    &state,
    "POST",
    &format!("/responders/respond/{id}"),
    Some(roster.responder),
    None,
  )
  .await;

  let resp = send(
    &state,
    "GET",
    "/responders/alerts/mine",
    Some(roster.responder),
    None,
  )
  .await;
  assert_eq!(resp.status(), StatusCode::OK);
  let body = body_json(resp).await;
  assert_eq!(body.as_array().unwrap().len(), 1);
  assert_eq!(body[0]["alertId"], id.to_string());
}

// ── Admin ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn admin_override_reopens_resolved_alert() {
  let roster = Roster::new();
  let state = make_state(roster.directory()).await;
  let id = raise_alert(&state, roster.owner).await;
  send(
    &state,
    "POST",
    &format!("/responders/respond/{id}"),
    Some(roster.responder),
    None,
  )
  .await;
  send(
    &state,
    "PUT",
    &format!("/responders/alerts/{id}/status"),
    Some(roster.responder),
    Some(json!({ "status": "resolved" })),
  )
  .await;

  let resp = send(
    &state,
    "PUT",
    &format!("/admin/alerts/{id}/status"),
    Some(roster.admin),
    Some(json!({ "status": "active" })),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::OK);
  let body = body_json(resp).await;
  assert_eq!(body["alert"]["status"], "active");
  assert!(body["alert"]["resolvedAt"].is_null());
}

#[tokio::test]
async fn admin_endpoints_are_admin_only() {
  let roster = Roster::new();
  let state = make_state(roster.directory()).await;
  let id = raise_alert(&state, roster.owner).await;

  let resp = send(
    &state,
    "PUT",
    &format!("/admin/alerts/{id}/status"),
    Some(roster.responder),
    Some(json!({ "status": "resolved" })),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::FORBIDDEN);

  let resp =
    send(&state, "GET", "/admin/alerts", Some(roster.owner), None).await;
  assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn audit_trail_distinguishes_admin_overrides() {
  let roster = Roster::new();
  let state = make_state(roster.directory()).await;
  let id = raise_alert(&state, roster.owner).await;
  send(
    &state,
    "POST",
    &format!("/responders/respond/{id}"),
    Some(roster.responder),
    None,
  )
  .await;
  send(
    &state,
    "PUT",
    &format!("/responders/alerts/{id}/status"),
    Some(roster.responder),
    Some(json!({ "status": "resolved" })),
  )
  .await;
  send(
    &state,
    "PUT",
    &format!("/admin/alerts/{id}/status"),
    Some(roster.admin),
    Some(json!({ "status": "active" })),
  )
  .await;

  let resp = send(
    &state,
    "GET",
    &format!("/admin/alerts/{id}/history"),
    Some(roster.admin),
    None,
  )
  .await;
  assert_eq!(resp.status(), StatusCode::OK);
  let body = body_json(resp).await;
  let origins: Vec<&str> = body
    .as_array()
    .unwrap()
    .iter()
    .map(|c| c["origin"].as_str().unwrap())
    .collect();
  assert_eq!(origins, vec!["claim", "advance", "admin_override"]);

  let resp = send(
    &state,
    "GET",
    &format!("/admin/alerts/{id}/history"),
    Some(roster.responder),
    None,
  )
  .await;
  assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn admin_list_splits_open_and_closed_with_totals() {
  let roster = Roster::new();
  let state = make_state(roster.directory()).await;
  raise_alert(&state, roster.owner).await;
  let closed = raise_alert(&state, roster.bystander).await;
  send(
    &state,
    "POST",
    "/alerts/cancel",
    Some(roster.bystander),
    None,
  )
  .await;

  let resp = send(&state, "GET", "/admin/alerts", Some(roster.admin), None)
    .await;
  assert_eq!(resp.status(), StatusCode::OK);
  let body = body_json(resp).await;
  assert_eq!(body["activeAlerts"].as_array().unwrap().len(), 1);
  assert_eq!(body["historicalAlerts"].as_array().unwrap().len(), 1);
  assert_eq!(
    body["historicalAlerts"][0]["alertId"],
    closed.to_string()
  );
  assert_eq!(body["totals"]["active"], 1);
  assert_eq!(body["totals"]["cancelled"], 1);
  assert_eq!(body["totals"]["total"], 2);
}
