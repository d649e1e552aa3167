//! Display formatting shared by the frontend projections.

use chrono::{DateTime, Utc};

/// `2025-05-20`
pub fn date(dt: DateTime<Utc>) -> String { dt.format("%Y-%m-%d").to_string() }

/// `10:30 AM`
pub fn clock(dt: DateTime<Utc>) -> String { dt.format("%I:%M %p").to_string() }

/// `2025-05-20 10:30 AM`
pub fn date_clock(dt: DateTime<Utc>) -> String {
  dt.format("%Y-%m-%d %I:%M %p").to_string()
}

/// Round half away from zero to `decimals` places.
pub fn round_to(value: f64, decimals: i32) -> f64 {
  let factor = 10f64.powi(decimals);
  (value * factor).round() / factor
}

/// `postex` → `Postex`; the tail is lower-cased.
pub fn capitalize(s: &str) -> String {
  let mut chars = s.chars();
  match chars.next() {
    Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
    None => String::new(),
  }
}

/// `On Route to Customer` → `on_route_to_customer`
pub fn slug(s: &str) -> String { s.to_lowercase().replace(' ', "_") }

/// `1500` → `Rs. 1,500`
pub fn rupees(amount: i64) -> String {
  let digits = amount.unsigned_abs().to_string();
  let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
  for (i, ch) in digits.chars().enumerate() {
    if i > 0 && (digits.len() - i) % 3 == 0 {
      grouped.push(',');
    }
    grouped.push(ch);
  }
  let sign = if amount < 0 { "-" } else { "" };
  format!("Rs. {sign}{grouped}")
}
