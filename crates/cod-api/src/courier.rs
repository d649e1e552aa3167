//! Outbound courier booking webhooks.
//!
//! Booking is acknowledged to the dashboard regardless of what the courier
//! endpoint does. The webhook outcome is logged and named in the response
//! message, but it never turns into an error.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

/// Webhook endpoints, one per booking target. An absent URL skips the call.
#[derive(Debug, Clone, Deserialize)]
pub struct CourierConfig {
  #[serde(default)]
  pub postex_url:      Option<String>,
  #[serde(default)]
  pub leopard_url:     Option<String>,
  #[serde(default)]
  pub recommended_url: Option<String>,
  #[serde(default = "default_timeout_secs")]
  pub timeout_secs:    u64,
}

fn default_timeout_secs() -> u64 { 30 }

impl Default for CourierConfig {
  fn default() -> Self {
    Self {
      postex_url:      None,
      leopard_url:     None,
      recommended_url: None,
      timeout_secs:    default_timeout_secs(),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingTarget {
  Postex,
  Leopard,
  Recommended,
}

impl BookingTarget {
  fn label(self) -> &'static str {
    match self {
      Self::Postex => "PostEx",
      Self::Leopard => "Leopard",
      Self::Recommended => "recommended portals",
    }
  }
}

/// What happened to one webhook call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookOutcome {
  Delivered,
  Rejected(u16),
  TimedOut,
  Failed,
  NotConfigured,
}

/// Body returned by every booking endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingReceipt {
  pub success: bool,
  pub message: String,
}

impl BookingReceipt {
  pub fn new(target: BookingTarget, booked: usize, outcome: WebhookOutcome) -> Self {
    let booked = format!("Successfully booked {booked} orders with {}", target.label());
    let message = match outcome {
      WebhookOutcome::Delivered => booked,
      WebhookOutcome::Rejected(code) => {
        format!("Orders processed (webhook status: {code}). {booked}")
      }
      WebhookOutcome::TimedOut => format!("Orders processed (webhook timeout). {booked}"),
      WebhookOutcome::Failed => format!("Orders processed (webhook error). {booked}"),
      WebhookOutcome::NotConfigured => {
        format!("Orders processed (webhook not configured). {booked}")
      }
    };
    Self {
      success: true,
      message,
    }
  }
}

/// Posts order ids to courier webhooks.
///
/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Debug, Clone)]
pub struct CourierDispatcher {
  client: Client,
  config: CourierConfig,
}

impl CourierDispatcher {
  pub fn new(config: CourierConfig) -> Result<Self, reqwest::Error> {
    let client = Client::builder()
      .timeout(Duration::from_secs(config.timeout_secs))
      .build()?;
    Ok(Self { client, config })
  }

  fn url(&self, target: BookingTarget) -> Option<&str> {
    match target {
      BookingTarget::Postex => self.config.postex_url.as_deref(),
      BookingTarget::Leopard => self.config.leopard_url.as_deref(),
      BookingTarget::Recommended => self.config.recommended_url.as_deref(),
    }
  }

  /// POST `order_ids` as a JSON array to the target's webhook. Only a `200`
  /// reply counts as delivered.
  pub async fn book(&self, target: BookingTarget, order_ids: &[String]) -> WebhookOutcome {
    let label = target.label();
    let Some(url) = self.url(target) else {
      tracing::warn!(courier = label, "no webhook configured; booking acknowledged");
      return WebhookOutcome::NotConfigured;
    };

    let outcome = match self.client.post(url).json(order_ids).send().await {
      Ok(resp) if resp.status() == StatusCode::OK => WebhookOutcome::Delivered,
      Ok(resp) => WebhookOutcome::Rejected(resp.status().as_u16()),
      Err(e) if e.is_timeout() => WebhookOutcome::TimedOut,
      Err(e) => {
        tracing::warn!(courier = label, error = %e, "webhook request failed");
        WebhookOutcome::Failed
      }
    };

    match outcome {
      WebhookOutcome::Delivered => {
        tracing::info!(courier = label, orders = order_ids.len(), "webhook delivered");
      }
      other => {
        tracing::warn!(
          courier = label,
          orders = order_ids.len(),
          outcome = ?other,
          "webhook not delivered; booking acknowledged"
        );
      }
    }
    outcome
  }
}

#[cfg(test)]
mod tests {
  use axum::{Json, Router, http::StatusCode as HookStatus, routing::post};

  use super::*;

  #[test]
  fn receipts_always_succeed() {
    let ok = BookingReceipt::new(BookingTarget::Postex, 3, WebhookOutcome::Delivered);
    assert!(ok.success);
    assert_eq!(ok.message, "Successfully booked 3 orders with PostEx");

    let rejected = BookingReceipt::new(BookingTarget::Leopard, 2, WebhookOutcome::Rejected(502));
    assert!(rejected.success);
    assert!(rejected.message.starts_with("Orders processed (webhook status: 502)."));

    let timeout = BookingReceipt::new(BookingTarget::Recommended, 1, WebhookOutcome::TimedOut);
    assert!(timeout.message.contains("webhook timeout"));
    assert!(timeout.message.ends_with("recommended portals"));
  }

  #[tokio::test]
  async fn missing_url_is_not_configured() {
    let dispatcher = CourierDispatcher::new(CourierConfig::default()).unwrap();
    let outcome = dispatcher.book(BookingTarget::Postex, &["ORD-1".into()]).await;
    assert_eq!(outcome, WebhookOutcome::NotConfigured);
  }

  // ── Live webhook outcomes ───────────────────────────────────────────────────

  /// Serve `app` on an ephemeral local port and return its webhook URL.
  async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
      axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}/hook")
  }

  fn postex_dispatcher(url: String) -> CourierDispatcher {
    CourierDispatcher::new(CourierConfig {
      postex_url: Some(url),
      timeout_secs: 1,
      ..CourierConfig::default()
    })
    .unwrap()
  }

  fn ids() -> Vec<String> { vec!["ORD-1".into(), "ORD-2".into()] }

  #[tokio::test]
  async fn ok_response_is_delivered() {
    let url = serve(Router::new().route(
      "/hook",
      post(|Json(ids): Json<Vec<String>>| async move {
        assert_eq!(ids, vec!["ORD-1".to_string(), "ORD-2".to_string()]);
        HookStatus::OK
      }),
    ))
    .await;
    let outcome = postex_dispatcher(url).book(BookingTarget::Postex, &ids()).await;
    assert_eq!(outcome, WebhookOutcome::Delivered);
  }

  #[tokio::test]
  async fn non_ok_status_is_rejected() {
    let failing = post(|| async { HookStatus::INTERNAL_SERVER_ERROR });
    let url = serve(Router::new().route("/hook", failing)).await;
    let outcome = postex_dispatcher(url).book(BookingTarget::Postex, &ids()).await;
    assert_eq!(outcome, WebhookOutcome::Rejected(500));

    let url = serve(Router::new().route("/hook", post(|| async { HookStatus::CREATED }))).await;
    let outcome = postex_dispatcher(url).book(BookingTarget::Postex, &ids()).await;
    assert_eq!(outcome, WebhookOutcome::Rejected(201));
  }

  #[tokio::test]
  async fn slow_webhook_times_out() {
    let url = serve(Router::new().route(
      "/hook",
      post(|| async {
        tokio::time::sleep(Duration::from_secs(3)).await;
        HookStatus::OK
      }),
    ))
    .await;
    let outcome = postex_dispatcher(url).book(BookingTarget::Postex, &ids()).await;
    assert_eq!(outcome, WebhookOutcome::TimedOut);
  }

  #[tokio::test]
  async fn refused_connection_is_failed() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let outcome = postex_dispatcher(format!("http://{addr}/hook"))
      .book(BookingTarget::Postex, &ids())
      .await;
    assert_eq!(outcome, WebhookOutcome::Failed);
  }
}
