//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::{Duration, TimeZone, Utc};
use cod_core::{
  Error as CoreError,
  delivery::{DeliveryFilter, NewDelivery},
  fake_order::{Flags, NewFakeOrder},
  high_risk::NewHighRiskOrder,
  history::{HistoryEntry, Sender, kinds},
  lifecycle,
  order::{NewOrder, OrderChange, OrderFilter},
  status::{FakeOrderStatus, HighRiskStatus, OrderStatus},
  store::DashboardStore,
  user::User,
};
use uuid::Uuid;

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn new_order(id: &str, status: OrderStatus, age_days: i64) -> NewOrder {
  let created = Utc.with_ymd_and_hms(2025, 5, 20, 10, 0, 0).unwrap() - Duration::days(age_days);
  NewOrder {
    order_id:             id.into(),
    tracking_id:          Some(format!("TRK-{id}")),
    assigned_courier:     None,
    customer_name:        "Ayesha Khan".into(),
    customer_address:     "House 12, Street 4, Gulberg, Lahore".into(),
    customer_email:       "ayesha@example.com".into(),
    customer_phone:       "+92 300 1234567".into(),
    total_price:          4500.0,
    status,
    created_date:         Some(created),
    confirmation_history: vec![HistoryEntry::new(
      "WhatsApp Message",
      "Please confirm your order",
      created,
    )
    .with_status("sent")],
  }
}

// ─── Orders ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn insert_and_get_order() {
  let s = store().await;
  let created = lifecycle::create_order(&s, new_order("ORD-1001", OrderStatus::Pending, 0))
    .await
    .unwrap();

  let fetched = s.get_order("ORD-1001").await.unwrap().unwrap();
  assert_eq!(fetched, created);
  assert_eq!(fetched.confirmation_history.len(), 1);
  assert_eq!(fetched.confirmation_history[0].status.as_deref(), Some("sent"));
}

#[tokio::test]
async fn get_order_missing_returns_none() {
  let s = store().await;
  assert!(s.get_order("ORD-404").await.unwrap().is_none());
}

#[tokio::test]
async fn duplicate_order_is_rejected() {
  let s = store().await;
  lifecycle::create_order(&s, new_order("ORD-1", OrderStatus::Pending, 0))
    .await
    .unwrap();

  let err = s
    .insert_order(s.get_order("ORD-1").await.unwrap().unwrap())
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Duplicate(_)));

  let err = lifecycle::create_order(&s, new_order("ORD-1", OrderStatus::Confirmed, 0))
    .await
    .unwrap_err();
  assert!(matches!(err, CoreError::DuplicateKey(_)));

  // The first insert is untouched.
  let kept = s.get_order("ORD-1").await.unwrap().unwrap();
  assert_eq!(kept.status, OrderStatus::Pending);
  assert_eq!(kept.confirmation_history.len(), 1);
}

#[tokio::test]
async fn list_orders_newest_first_with_filter() {
  let s = store().await;
  for (id, status, age) in [
    ("ORD-1", OrderStatus::Confirmed, 3),
    ("ORD-2", OrderStatus::Pending, 1),
    ("ORD-3", OrderStatus::Unconfirmed, 2),
  ] {
    lifecycle::create_order(&s, new_order(id, status, age)).await.unwrap();
  }

  let all = s.list_orders(&OrderFilter::default()).await.unwrap();
  let ids: Vec<_> = all.iter().map(|o| o.order_id.as_str()).collect();
  assert_eq!(ids, ["ORD-2", "ORD-3", "ORD-1"]);

  let confirmed = s
    .list_orders(&OrderFilter::status(Some(OrderStatus::Confirmed)))
    .await
    .unwrap();
  assert_eq!(confirmed.len(), 1);
  assert_eq!(confirmed[0].order_id, "ORD-1");

  let waiting = s.list_orders(&OrderFilter::awaiting_confirmation()).await.unwrap();
  let ids: Vec<_> = waiting.iter().map(|o| o.order_id.as_str()).collect();
  assert_eq!(ids, ["ORD-2", "ORD-3"]);
}

#[tokio::test]
async fn suffix_lookup_prefers_newest() {
  let s = store().await;
  lifecycle::create_order(&s, new_order("ORD-A-4372", OrderStatus::Pending, 5))
    .await
    .unwrap();
  lifecycle::create_order(&s, new_order("ORD-B-4372", OrderStatus::Pending, 1))
    .await
    .unwrap();

  let found = s.find_order_by_suffix("4372").await.unwrap().unwrap();
  assert_eq!(found.order_id, "ORD-B-4372");
  assert!(s.find_order_by_suffix("9999").await.unwrap().is_none());
  assert!(s.find_order_by_suffix("").await.unwrap().is_none());
  assert!(s.find_order_by_suffix("B-4372").await.unwrap().is_none());
}

#[tokio::test]
async fn suffix_lookup_matches_whole_segment() {
  let s = store().await;
  lifecycle::create_order(&s, new_order("ORD-12", OrderStatus::Pending, 5))
    .await
    .unwrap();
  lifecycle::create_order(&s, new_order("ORD-112", OrderStatus::Pending, 1))
    .await
    .unwrap();
  lifecycle::create_order(&s, new_order("7", OrderStatus::Pending, 0))
    .await
    .unwrap();

  let found = s.find_order_by_suffix("12").await.unwrap().unwrap();
  assert_eq!(found.order_id, "ORD-12");
  let found = s.find_order_by_suffix("112").await.unwrap().unwrap();
  assert_eq!(found.order_id, "ORD-112");
  let found = s.find_order_by_suffix("7").await.unwrap().unwrap();
  assert_eq!(found.order_id, "7");
  assert!(s.find_order_by_suffix("2").await.unwrap().is_none());
}

#[tokio::test]
async fn action_lands_on_the_matching_customer() {
  let s = store().await;
  lifecycle::create_order(&s, new_order("ORD-12", OrderStatus::Pending, 5))
    .await
    .unwrap();
  lifecycle::create_order(&s, new_order("ORD-112", OrderStatus::Pending, 1))
    .await
    .unwrap();

  let resolved = lifecycle::record_action(&s, "CUST-12", "mark_resolved", None)
    .await
    .unwrap();
  assert_eq!(resolved.order_id, "ORD-12");
  assert_eq!(resolved.status, OrderStatus::Confirmed);

  let other = s.get_order("ORD-112").await.unwrap().unwrap();
  assert_eq!(other.status, OrderStatus::Pending);
  assert_eq!(other.confirmation_history.len(), 1);
}

#[tokio::test]
async fn apply_change_on_missing_order_reports_false() {
  let s = store().await;
  let found = s
    .apply_order_change("ORD-404", OrderChange::status(OrderStatus::Confirmed))
    .await
    .unwrap();
  assert!(!found);
}

#[tokio::test]
async fn concurrent_appends_are_all_kept() {
  let s = store().await;
  lifecycle::create_order(&s, new_order("ORD-7", OrderStatus::Pending, 0))
    .await
    .unwrap();

  let now = Utc::now();
  let a = s.apply_order_change(
    "ORD-7",
    OrderChange::append(HistoryEntry::new(kinds::REMINDER_SENT, "first", now)),
  );
  let b = s.apply_order_change(
    "ORD-7",
    OrderChange::append(HistoryEntry::new(kinds::CUSTOMER_CALLED, "second", now)),
  );
  let (a, b) = tokio::join!(a, b);
  assert!(a.unwrap() && b.unwrap());

  let order = s.get_order("ORD-7").await.unwrap().unwrap();
  assert_eq!(order.confirmation_history.len(), 3);
  let contents: Vec<_> = order.confirmation_history.iter().map(|e| e.content.as_str()).collect();
  assert!(contents.contains(&"first"));
  assert!(contents.contains(&"second"));
}

// ─── Order lifecycle ─────────────────────────────────────────────────────────

#[tokio::test]
async fn invalid_status_leaves_order_unchanged() {
  let s = store().await;
  lifecycle::create_order(&s, new_order("ORD-9", OrderStatus::Pending, 0))
    .await
    .unwrap();

  let err = lifecycle::update_order_status(&s, "ORD-9", "shipped", Some("YES"))
    .await
    .unwrap_err();
  assert!(matches!(err, CoreError::InvalidArgument(_)));

  let order = s.get_order("ORD-9").await.unwrap().unwrap();
  assert_eq!(order.status, OrderStatus::Pending);
  assert_eq!(order.confirmation_history.len(), 1);
}

#[tokio::test]
async fn response_appends_response_then_tag() {
  let s = store().await;
  lifecycle::create_order(&s, new_order("ORD-10", OrderStatus::Pending, 0))
    .await
    .unwrap();

  let order = lifecycle::update_order_status(&s, "ORD-10", "confirmed", Some("YES"))
    .await
    .unwrap();
  assert_eq!(order.status, OrderStatus::Confirmed);

  let tail: Vec<_> = order.confirmation_history[1..]
    .iter()
    .map(|e| (e.kind.as_str(), e.content.as_str()))
    .collect();
  assert_eq!(tail, [(kinds::RESPONSE, "YES"), (kinds::TAG, "Confirmed")]);
}

#[tokio::test]
async fn status_only_update_adds_no_history() {
  let s = store().await;
  lifecycle::create_order(&s, new_order("ORD-11", OrderStatus::Pending, 0))
    .await
    .unwrap();

  let order = lifecycle::update_order_status(&s, "ORD-11", "unconfirmed", Some("  "))
    .await
    .unwrap();
  assert_eq!(order.status, OrderStatus::Unconfirmed);
  assert_eq!(order.confirmation_history.len(), 1);

  let err = lifecycle::update_order_status(&s, "ORD-404", "confirmed", None)
    .await
    .unwrap_err();
  assert!(matches!(err, CoreError::NotFound(_)));
}

#[tokio::test]
async fn mark_resolved_confirms_order() {
  let s = store().await;
  lifecycle::create_order(&s, new_order("ORD-615929564372", OrderStatus::Unconfirmed, 4))
    .await
    .unwrap();

  let order = lifecycle::record_action(&s, "CUST-615929564372", "mark_resolved", None)
    .await
    .unwrap();
  assert_eq!(order.status, OrderStatus::Confirmed);
  let last = order.confirmation_history.last().unwrap();
  assert_eq!(last.kind, kinds::MARKED_RESOLVED);
  assert_eq!(last.status.as_deref(), Some("completed"));

  let reminded = lifecycle::record_action(
    &s,
    "CUST-615929564372",
    "send_reminder",
    Some("Second reminder via SMS"),
  )
  .await
  .unwrap();
  assert_eq!(reminded.status, OrderStatus::Confirmed);
  assert_eq!(reminded.confirmation_history.last().unwrap().content, "Second reminder via SMS");

  let err = lifecycle::record_action(&s, "CUST-615929564372", "email_customer", None)
    .await
    .unwrap_err();
  assert!(matches!(err, CoreError::InvalidArgument(_)));

  let err = lifecycle::record_action(&s, "CUST-000", "call_customer", None)
    .await
    .unwrap_err();
  assert!(matches!(err, CoreError::NotFound(_)));
}

#[tokio::test]
async fn bulk_confirm_reports_missing() {
  let s = store().await;
  lifecycle::create_order(&s, new_order("ORD-1", OrderStatus::Pending, 0))
    .await
    .unwrap();
  lifecycle::create_order(&s, new_order("ORD-2", OrderStatus::Unconfirmed, 0))
    .await
    .unwrap();

  let ids = ["ORD-1", "ORD-404", "ORD-2"].map(String::from);
  let outcome = lifecycle::confirm_orders(&s, &ids).await.unwrap();
  assert_eq!(outcome.confirmed, ["ORD-1", "ORD-2"]);
  assert_eq!(outcome.missing, ["ORD-404"]);

  let confirmed = s
    .list_orders(&OrderFilter::status(Some(OrderStatus::Confirmed)))
    .await
    .unwrap();
  assert_eq!(confirmed.len(), 2);
  assert!(confirmed.iter().all(|o| o.confirmation_history.len() == 1));
}

// ─── Deliveries ──────────────────────────────────────────────────────────────

fn new_delivery(tracking: &str, courier: &str, status: &str) -> NewDelivery {
  NewDelivery {
    tracking:         tracking.into(),
    customer_name:    "Bilal Ahmed".into(),
    customer_phone:   "+92 321 7654321".into(),
    customer_address: "Block 7, Clifton".into(),
    merchant:         "Wardrobe Co".into(),
    order_status:     status.into(),
    no_of_items:      2,
    courier:          courier.into(),
    city:             "Karachi".into(),
    order_value:      3200,
    created_date:     None,
  }
}

#[tokio::test]
async fn deliveries_filter_by_courier() {
  let s = store().await;
  lifecycle::create_delivery(&s, new_delivery("PX-1", "PostEx", "Delivered"))
    .await
    .unwrap();
  lifecycle::create_delivery(&s, new_delivery("LP-1", "leopard", "On Route to Customer"))
    .await
    .unwrap();

  let postex = s
    .list_deliveries(&DeliveryFilter::courier(Some("postex")))
    .await
    .unwrap();
  assert_eq!(postex.len(), 1);
  assert_eq!(postex[0].courier, "postex");
  assert!(postex[0].is_delivered());

  let all = s.list_deliveries(&DeliveryFilter::courier(Some("all"))).await.unwrap();
  assert_eq!(all.len(), 2);

  let fetched = s.get_delivery("LP-1").await.unwrap().unwrap();
  assert_eq!(fetched.no_of_items, 2);

  let err = lifecycle::create_delivery(&s, new_delivery("PX-1", "postex", "Delivered"))
    .await
    .unwrap_err();
  assert!(matches!(err, CoreError::DuplicateKey(_)));
}

// ─── Fake orders ─────────────────────────────────────────────────────────────

fn new_fake(id: &str) -> NewFakeOrder {
  NewFakeOrder {
    order_id:              id.into(),
    customer:              "Daniel Johnson".into(),
    phone:                 "+1 (555) 333-4444".into(),
    address:               "456 Pine Ave, Chicago, IL".into(),
    amount:                1299.99,
    status:                FakeOrderStatus::New,
    suspicious:            false,
    flag_count:            0,
    order_history:         vec!["Previous canceled order".into()],
    verification_required: false,
  }
}

#[tokio::test]
async fn fake_order_flags_and_messages() {
  let s = store().await;
  let created = lifecycle::create_fake_order(&s, new_fake("ORD-2001")).await.unwrap();
  assert!(created.messages.is_empty());

  let flagged = lifecycle::update_fake_order_flags(
    &s,
    "ORD-2001",
    Flags {
      flag_count: 2,
      suspicious: true,
    },
    Some("Flagged after address mismatch"),
  )
  .await
  .unwrap();
  assert_eq!(flagged.flag_count, 2);
  assert!(flagged.suspicious);
  assert_eq!(flagged.status, FakeOrderStatus::New);
  assert_eq!(flagged.messages.len(), 1);
  assert_eq!(flagged.messages[0].sender, Sender::System);
  assert!(flagged.updated_at >= created.updated_at);

  let checked = lifecycle::update_fake_order_status(&s, "ORD-2001", "checking", None)
    .await
    .unwrap();
  assert_eq!(checked.status, FakeOrderStatus::Checking);
  assert_eq!(checked.flag_count, 2);

  let messaged =
    lifecycle::add_fake_order_message(&s, "ORD-2001", "Called, no answer", Some(Sender::User))
      .await
      .unwrap();
  let texts: Vec<_> = messaged.messages.iter().map(|m| m.text.as_str()).collect();
  assert_eq!(texts, ["Flagged after address mismatch", "Called, no answer"]);
  assert_eq!(messaged.order_history, ["Previous canceled order"]);

  let listed = s.list_fake_orders(Some(FakeOrderStatus::Checking)).await.unwrap();
  assert_eq!(listed.len(), 1);
  assert!(s.list_fake_orders(Some(FakeOrderStatus::Canceled)).await.unwrap().is_empty());
}

#[tokio::test]
async fn deleting_fake_order_drops_its_messages() {
  let s = store().await;
  lifecycle::create_fake_order(&s, new_fake("ORD-3")).await.unwrap();
  lifecycle::add_fake_order_message(&s, "ORD-3", "hello", None).await.unwrap();

  lifecycle::delete_fake_order(&s, "ORD-3").await.unwrap();
  assert!(s.get_fake_order("ORD-3").await.unwrap().is_none());

  // Re-creating under the same id starts with a clean log.
  let again = lifecycle::create_fake_order(&s, new_fake("ORD-3")).await.unwrap();
  assert!(s.get_fake_order(&again.order_id).await.unwrap().unwrap().messages.is_empty());

  let err = lifecycle::delete_fake_order(&s, "ORD-404").await.unwrap_err();
  assert!(matches!(err, CoreError::NotFound(_)));
}

// ─── High-risk orders ────────────────────────────────────────────────────────

fn new_high_risk(id: &str, rate: i64) -> NewHighRiskOrder {
  NewHighRiskOrder {
    order_id:     id.into(),
    customer:     "Sara Ahmed".into(),
    area:         "Orangi Town".into(),
    address:      "Sector 11, Orangi Town, Karachi".into(),
    risk_rate:    rate,
    risk_factors: vec!["High return rate".into(), "Address hard to verify".into()],
    status:       HighRiskStatus::New,
  }
}

#[tokio::test]
async fn high_risk_round_trip_and_status() {
  let s = store().await;
  let err = lifecycle::create_high_risk_order(&s, new_high_risk("HR-0", 101))
    .await
    .unwrap_err();
  assert!(matches!(err, CoreError::InvalidArgument(_)));
  assert!(s.get_high_risk_order("HR-0").await.unwrap().is_none());

  lifecycle::create_high_risk_order(&s, new_high_risk("HR-1", 82)).await.unwrap();
  let updated = lifecycle::update_high_risk_status(
    &s,
    "HR-1",
    "payment_requested",
    Some("Advance payment requested"),
  )
  .await
  .unwrap();
  assert_eq!(updated.status, HighRiskStatus::PaymentRequested);
  assert_eq!(updated.risk_rate, 82);
  assert_eq!(updated.risk_factors.len(), 2);
  assert_eq!(updated.messages.len(), 1);

  let listed = s.list_high_risk_orders(None).await.unwrap();
  assert_eq!(listed.len(), 1);

  lifecycle::delete_high_risk_order(&s, "HR-1").await.unwrap();
  assert!(s.list_high_risk_orders(None).await.unwrap().is_empty());
}

// ─── Users ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn users_are_unique_by_email() {
  let s = store().await;
  let user = User::new("  Admin@Example.com ", "Admin", "$argon2id$stub".into());
  let saved = s.insert_user(user.clone()).await.unwrap();
  assert_eq!(saved.email, "admin@example.com");

  let by_email = s.get_user_by_email("ADMIN@example.com").await.unwrap().unwrap();
  assert_eq!(by_email.user_id, user.user_id);
  assert_eq!(by_email.password_hash, "$argon2id$stub");

  let by_id = s.get_user(user.user_id).await.unwrap().unwrap();
  assert_eq!(by_id.email, "admin@example.com");
  assert!(s.get_user(Uuid::new_v4()).await.unwrap().is_none());

  let clash = User::new("admin@example.com", "Someone Else", "x".into());
  let err = s.insert_user(clash).await.unwrap_err();
  assert!(matches!(err, Error::Duplicate(_)));
}
