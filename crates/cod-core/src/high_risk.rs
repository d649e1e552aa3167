//! Orders shipping to high-risk delivery areas.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  Error, Result, format,
  history::{HistoryBearing, Message, RecordChange},
  status::{HighRiskStatus, StatusCounts},
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighRiskAreaRecord {
  pub order_id:     String,
  pub customer:     String,
  pub area:         String,
  pub address:      String,
  /// Percentage, `0..=100`.
  pub risk_rate:    u8,
  pub risk_factors: Vec<String>,
  pub status:       HighRiskStatus,
  pub date:         DateTime<Utc>,
  pub created_at:   DateTime<Utc>,
  pub updated_at:   DateTime<Utc>,
  pub messages:     Vec<Message>,
}

impl HistoryBearing for HighRiskAreaRecord {
  type Entry = Message;

  fn history(&self) -> &[Message] { &self.messages }
}

/// Status and messages written together by
/// [`crate::store::DashboardStore::apply_high_risk_change`]. `updated_at` is
/// bumped on every applied change.
pub type HighRiskChange = RecordChange<HighRiskStatus, Message>;

/// Input to [`crate::lifecycle::create_high_risk_order`].
#[derive(Debug, Clone, Deserialize)]
pub struct NewHighRiskOrder {
  pub order_id:     String,
  pub customer:     String,
  pub area:         String,
  pub address:      String,
  pub risk_rate:    i64,
  #[serde(default)]
  pub risk_factors: Vec<String>,
  #[serde(default = "default_status")]
  pub status:       HighRiskStatus,
}

fn default_status() -> HighRiskStatus { HighRiskStatus::New }

/// Accept a risk rate only within `0..=100`.
pub fn validate_risk_rate(rate: i64) -> Result<u8> {
  u8::try_from(rate)
    .ok()
    .filter(|r| *r <= 100)
    .ok_or_else(|| Error::InvalidArgument(format!("risk_rate must be between 0 and 100, got {rate}")))
}

// ─── Frontend projection ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct HighRiskView {
  pub id:            String,
  pub order_id:      String,
  pub customer:      String,
  pub area:          String,
  pub address:       String,
  pub risk_rate:     u8,
  pub risk_factors:  Vec<String>,
  pub status:        HighRiskStatus,
  pub date:          String,
  pub created_at:    DateTime<Utc>,
  pub updated_at:    DateTime<Utc>,
  pub last_activity: Option<DateTime<Utc>>,
  pub messages:      Vec<Message>,
}

impl From<HighRiskAreaRecord> for HighRiskView {
  fn from(r: HighRiskAreaRecord) -> Self {
    Self {
      id:            r.order_id.clone(),
      last_activity: r.last_activity(),
      date:          format::date(r.date),
      order_id:      r.order_id,
      customer:      r.customer,
      area:          r.area,
      address:       r.address,
      risk_rate:     r.risk_rate,
      risk_factors:  r.risk_factors,
      status:        r.status,
      created_at:    r.created_at,
      updated_at:    r.updated_at,
      messages:      r.messages,
    }
  }
}

// ─── Stats ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HighRiskStats {
  #[serde(flatten)]
  pub by_status: StatusCounts,
  pub total:     usize,
}

pub fn high_risk_stats(records: &[HighRiskAreaRecord]) -> HighRiskStats {
  let by_status = StatusCounts::tally(records.iter().map(|r| r.status));
  HighRiskStats {
    total: by_status.total(),
    by_status,
  }
}
