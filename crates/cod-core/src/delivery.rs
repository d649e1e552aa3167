//! Courier deliveries and their aggregates.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::format;

/// Courier status string that counts as a successful delivery.
pub const DELIVERED: &str = "Delivered";

pub const POSTEX: &str = "postex";
pub const LEOPARD: &str = "leopard";

// ─── Records ─────────────────────────────────────────────────────────────────

/// One parcel handed to a courier. `tracking` is the unique key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Delivery {
  pub tracking:         String,
  pub customer_name:    String,
  pub customer_phone:   String,
  pub customer_address: String,
  pub merchant:         String,
  /// Free-text courier status, e.g. `On Route to Customer`.
  pub order_status:     String,
  pub no_of_items:      u32,
  /// Lower-case courier key, e.g. `postex`.
  pub courier:          String,
  pub city:             String,
  /// Whole rupees.
  pub order_value:      i64,
  pub created_date:     DateTime<Utc>,
}

impl Delivery {
  pub fn is_delivered(&self) -> bool { self.order_status == DELIVERED }
}

/// Input to [`crate::lifecycle::create_delivery`].
#[derive(Debug, Clone, Deserialize)]
pub struct NewDelivery {
  pub tracking:         String,
  pub customer_name:    String,
  pub customer_phone:   String,
  pub customer_address: String,
  #[serde(default)]
  pub merchant:         String,
  pub order_status:     String,
  #[serde(default = "default_items")]
  pub no_of_items:      u32,
  pub courier:          String,
  pub city:             String,
  pub order_value:      i64,
  #[serde(default)]
  pub created_date:     Option<DateTime<Utc>>,
}

fn default_items() -> u32 { 1 }

/// Parameters for [`crate::store::DashboardStore::list_deliveries`].
#[derive(Debug, Clone, Default)]
pub struct DeliveryFilter {
  pub courier: Option<String>,
}

impl DeliveryFilter {
  /// `None`, empty, and `all` mean every courier.
  pub fn courier(raw: Option<&str>) -> Self {
    let courier = raw
      .map(str::trim)
      .filter(|c| !c.is_empty() && *c != "all")
      .map(str::to_lowercase);
    Self { courier }
  }
}

// ─── Frontend projection ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryView {
  #[serde(flatten)]
  pub delivery:         Delivery,
  pub id:               String,
  pub customer:         String,
  pub phone:            String,
  pub address:          String,
  pub items:            u32,
  pub value:            String,
  pub date:             String,
  pub status:           String,
  pub assigned_courier: String,
}

impl From<Delivery> for DeliveryView {
  fn from(d: Delivery) -> Self {
    Self {
      id:               d.tracking.clone(),
      customer:         d.customer_name.clone(),
      phone:            d.customer_phone.clone(),
      address:          d.customer_address.clone(),
      items:            d.no_of_items,
      value:            format::rupees(d.order_value),
      date:             format::date(d.created_date),
      status:           format::slug(&d.order_status),
      assigned_courier: d.courier.clone(),
      delivery:         d,
    }
  }
}

// ─── Aggregates ──────────────────────────────────────────────────────────────

/// `delivered / total * 100` to one decimal, or `0` for an empty group.
pub fn success_rate(delivered: usize, total: usize) -> f64 {
  if total == 0 {
    return 0.0;
  }
  format::round_to(delivered as f64 / total as f64 * 100.0, 1)
}

#[derive(Default)]
struct Tally {
  total:     usize,
  delivered: usize,
  value:     i64,
}

impl Tally {
  fn add(&mut self, d: &Delivery) {
    self.total += 1;
    self.delivered += usize::from(d.is_delivered());
    self.value += d.order_value;
  }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourierStats {
  pub courier:      String,
  pub success_rate: f64,
  pub total_orders: usize,
  pub avg_value:    f64,
}

/// Per-courier performance keyed by courier key.
pub fn courier_stats(deliveries: &[Delivery]) -> BTreeMap<String, CourierStats> {
  let mut tallies: BTreeMap<&str, Tally> = BTreeMap::new();
  for d in deliveries {
    tallies.entry(d.courier.as_str()).or_default().add(d);
  }

  tallies
    .into_iter()
    .map(|(courier, t)| {
      let avg = if t.total == 0 { 0.0 } else { t.value as f64 / t.total as f64 };
      let stats = CourierStats {
        courier:      format::capitalize(courier),
        success_rate: success_rate(t.delivered, t.total),
        total_orders: t.total,
        avg_value:    format::round_to(avg, 0),
      };
      (courier.to_owned(), stats)
    })
    .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CityStats {
  pub city:         String,
  pub postex_rate:  f64,
  pub leopard_rate: f64,
}

/// Postex and Leopard success rates per city, sorted by city name. A courier
/// with no deliveries in a city scores `0`.
pub fn city_stats(deliveries: &[Delivery]) -> Vec<CityStats> {
  let mut tallies: BTreeMap<&str, (Tally, Tally)> = BTreeMap::new();
  for d in deliveries {
    let (postex, leopard) = tallies.entry(d.city.as_str()).or_default();
    match d.courier.as_str() {
      POSTEX => postex.add(d),
      LEOPARD => leopard.add(d),
      _ => {}
    }
  }

  tallies
    .into_iter()
    .map(|(city, (postex, leopard))| CityStats {
      city:         city.to_owned(),
      postex_rate:  success_rate(postex.delivered, postex.total),
      leopard_rate: success_rate(leopard.delivered, leopard.total),
    })
    .collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DeliveryCounts {
  pub total:   usize,
  pub postex:  usize,
  pub leopard: usize,
}

pub fn delivery_counts(deliveries: &[Delivery]) -> DeliveryCounts {
  let count = |key: &str| deliveries.iter().filter(|d| d.courier == key).count();
  DeliveryCounts {
    total:   deliveries.len(),
    postex:  count(POSTEX),
    leopard: count(LEOPARD),
  }
}

#[derive(Debug, Clone, Serialize)]
pub struct DeliverySummary {
  pub total_orders:        usize,
  pub postex_orders:       usize,
  pub leopard_orders:      usize,
  pub courier_performance: BTreeMap<String, CourierStats>,
}

pub fn delivery_summary(deliveries: &[Delivery]) -> DeliverySummary {
  let counts = delivery_counts(deliveries);
  DeliverySummary {
    total_orders:        counts.total,
    postex_orders:       counts.postex,
    leopard_orders:      counts.leopard,
    courier_performance: courier_stats(deliveries),
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  fn delivery(tracking: &str, courier: &str, city: &str, status: &str, value: i64) -> Delivery {
    Delivery {
      tracking:         tracking.into(),
      customer_name:    "Ali Hassan".into(),
      customer_phone:   "3001234567".into(),
      customer_address: "Block 15, Gulshan-e-Iqbal, Karachi".into(),
      merchant:         "Elyscents Pakistan".into(),
      order_status:     status.into(),
      no_of_items:      2,
      courier:          courier.into(),
      city:             city.into(),
      order_value:      value,
      created_date:     Utc.with_ymd_and_hms(2025, 5, 20, 10, 30, 0).unwrap(),
    }
  }

  #[test]
  fn three_of_four_delivered_is_seventy_five_percent() {
    let deliveries = [
      delivery("1", POSTEX, "Karachi", DELIVERED, 1000),
      delivery("2", POSTEX, "Karachi", DELIVERED, 2000),
      delivery("3", POSTEX, "Lahore", DELIVERED, 3000),
      delivery("4", POSTEX, "Lahore", "Returned", 2001),
    ];
    let stats = courier_stats(&deliveries);
    let postex = &stats[POSTEX];
    assert_eq!(postex.success_rate, 75.0);
    assert_eq!(postex.total_orders, 4);
    assert_eq!(postex.courier, "Postex");
    assert_eq!(postex.avg_value, 2000.0);
  }

  #[test]
  fn success_rate_handles_empty_and_rounding() {
    assert_eq!(success_rate(0, 0), 0.0);
    assert_eq!(success_rate(2, 3), 66.7);
  }

  #[test]
  fn delivered_match_is_exact() {
    let d = delivery("1", LEOPARD, "Lahore", "delivered", 100);
    assert!(!d.is_delivered());
  }

  #[test]
  fn city_stats_split_by_courier() {
    let deliveries = [
      delivery("1", POSTEX, "Karachi", DELIVERED, 1000),
      delivery("2", LEOPARD, "Karachi", DELIVERED, 1000),
      delivery("3", LEOPARD, "Karachi", "dispatched", 1000),
      delivery("4", LEOPARD, "Lahore", "Returned", 1000),
    ];
    let stats = city_stats(&deliveries);
    assert_eq!(stats, vec![
      CityStats {
        city:         "Karachi".into(),
        postex_rate:  100.0,
        leopard_rate: 50.0,
      },
      CityStats {
        city:         "Lahore".into(),
        postex_rate:  0.0,
        leopard_rate: 0.0,
      },
    ]);
  }

  #[test]
  fn summary_combines_counts_and_performance() {
    let deliveries = [
      delivery("1", POSTEX, "Karachi", DELIVERED, 1000),
      delivery("2", LEOPARD, "Karachi", DELIVERED, 1000),
      delivery("3", "tcs", "Karachi", DELIVERED, 1000),
    ];
    let summary = delivery_summary(&deliveries);
    assert_eq!(summary.total_orders, 3);
    assert_eq!(summary.postex_orders, 1);
    assert_eq!(summary.leopard_orders, 1);
    assert_eq!(summary.courier_performance.len(), 3);
  }

  #[test]
  fn view_formats_for_the_grid() {
    let view = DeliveryView::from(delivery("LEO1", LEOPARD, "Karachi", "On Route to Customer", 1500));
    let json = serde_json::to_value(view).unwrap();
    assert_eq!(json["id"], "LEO1");
    assert_eq!(json["value"], "Rs. 1,500");
    assert_eq!(json["status"], "on_route_to_customer");
    assert_eq!(json["order_status"], "On Route to Customer");
    assert_eq!(json["assignedCourier"], "leopard");
    assert_eq!(json["date"], "2025-05-20");
  }

  #[test]
  fn courier_filter_treats_all_as_none() {
    assert_eq!(DeliveryFilter::courier(Some("all")).courier, None);
    assert_eq!(DeliveryFilter::courier(Some("Postex")).courier.as_deref(), Some("postex"));
  }
}
