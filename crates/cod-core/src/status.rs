//! Closed status enumerations, one per record type.
//!
//! Each enum round-trips through its snake_case wire name. Transitions are
//! unrestricted: any status of a record type may follow any other of the same
//! type. What the type system does rule out is assigning a status from the
//! wrong record type.

use std::{collections::BTreeMap, str::FromStr};

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString, VariantNames};

use crate::{Error, Result};

/// Confirmation state of a plain [`Order`](crate::order::Order).
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
  Display, EnumString, AsRefStr, VariantNames,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OrderStatus {
  Confirmed,
  Pending,
  Unconfirmed,
}

impl OrderStatus {
  /// The label written into synthetic `Tag` history entries.
  pub fn tag_label(self) -> &'static str {
    match self {
      Self::Confirmed => "Confirmed",
      Self::Pending => "Pending",
      Self::Unconfirmed => "Unconfirmed",
    }
  }

  /// Statuses whose customers have not yet confirmed.
  pub fn awaiting_confirmation() -> [Self; 2] { [Self::Pending, Self::Unconfirmed] }
}

/// Review state of a [`FakeOrderRecord`](crate::fake_order::FakeOrderRecord).
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
  Display, EnumString, AsRefStr, VariantNames,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FakeOrderStatus {
  New,
  Checking,
  RequiresVerification,
  PartialPaymentRequested,
  Flagged,
  Blacklisted,
  Processing,
  Completed,
  Canceled,
}

/// Review state of a [`HighRiskAreaRecord`](crate::high_risk::HighRiskAreaRecord).
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
  Display, EnumString, AsRefStr, VariantNames,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum HighRiskStatus {
  New,
  Analyzing,
  HighRisk,
  PaymentRequested,
  PaymentReceived,
  Processing,
  Review,
  Completed,
}

/// Parse a status name, rejecting unknown values with
/// [`Error::InvalidArgument`] that lists the accepted names.
pub fn parse_status<T>(raw: &str) -> Result<T>
where
  T: FromStr + VariantNames,
{
  T::from_str(raw).map_err(|_| {
    Error::InvalidArgument(format!(
      "invalid status {raw:?}; must be one of: {}",
      T::VARIANTS.join(", ")
    ))
  })
}

/// Parse an optional list filter. Absent, empty, and `all` all mean "no
/// filter".
pub fn parse_filter<T>(raw: Option<&str>) -> Result<Option<T>>
where
  T: FromStr + VariantNames,
{
  match raw.map(str::trim) {
    None | Some("") | Some("all") => Ok(None),
    Some(s) => parse_status(s).map(Some),
  }
}

/// Per-status tallies with every variant present, zero or not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct StatusCounts(BTreeMap<&'static str, usize>);

impl StatusCounts {
  pub fn tally<T>(statuses: impl IntoIterator<Item = T>) -> Self
  where
    T: AsRef<str> + VariantNames,
  {
    let mut counts: BTreeMap<&'static str, usize> =
      T::VARIANTS.iter().map(|name| (*name, 0)).collect();
    for status in statuses {
      if let Some(n) = counts.get_mut(status.as_ref()) {
        *n += 1;
      }
    }
    Self(counts)
  }

  pub fn get(&self, status: impl AsRef<str>) -> usize {
    self.0.get(status.as_ref()).copied().unwrap_or(0)
  }

  pub fn total(&self) -> usize { self.0.values().sum() }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn wire_names_are_snake_case() {
    assert_eq!(OrderStatus::Unconfirmed.as_ref(), "unconfirmed");
    assert_eq!(FakeOrderStatus::PartialPaymentRequested.as_ref(), "partial_payment_requested");
    assert_eq!(HighRiskStatus::HighRisk.to_string(), "high_risk");
  }

  #[test]
  fn parse_known_status() {
    let s: FakeOrderStatus = parse_status("blacklisted").unwrap();
    assert_eq!(s, FakeOrderStatus::Blacklisted);
  }

  #[test]
  fn parse_unknown_status_lists_choices() {
    let err = parse_status::<OrderStatus>("shipped").unwrap_err();
    match err {
      Error::InvalidArgument(msg) => {
        assert!(msg.contains("confirmed, pending, unconfirmed"), "{msg}");
      }
      other => panic!("expected InvalidArgument, got {other:?}"),
    }
  }

  #[test]
  fn status_belonging_to_another_record_type_is_rejected() {
    assert!(parse_status::<OrderStatus>("flagged").is_err());
    assert!(parse_status::<HighRiskStatus>("checking").is_err());
  }

  #[test]
  fn tally_lists_every_variant() {
    let counts = StatusCounts::tally([HighRiskStatus::Review, HighRiskStatus::Review]);
    assert_eq!(counts.get(HighRiskStatus::Review), 2);
    assert_eq!(counts.get(HighRiskStatus::New), 0);
    assert_eq!(counts.total(), 2);

    let json = serde_json::to_value(&counts).unwrap();
    assert_eq!(json.as_object().unwrap().len(), HighRiskStatus::VARIANTS.len());
  }

  #[test]
  fn all_means_no_filter() {
    assert_eq!(parse_filter::<OrderStatus>(Some("all")).unwrap(), None);
    assert_eq!(parse_filter::<OrderStatus>(None).unwrap(), None);
    assert_eq!(
      parse_filter::<OrderStatus>(Some("pending")).unwrap(),
      Some(OrderStatus::Pending)
    );
  }
}
