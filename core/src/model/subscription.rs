// grocer/src/model/subscription.rs

use crate::model::order::CASH_ON_DELIVERY;
use chrono::{DateTime, Duration, Months, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
  #[default]
  Daily,
  Weekly,
  Monthly,
}

impl Frequency {
  pub fn as_str(&self) -> &'static str {
    match self {
      Frequency::Daily => "daily",
      Frequency::Weekly => "weekly",
      Frequency::Monthly => "monthly",
    }
  }

  /// The delivery date one period after `from`.
  ///
  /// Monthly steps are calendar months; a day that does not exist in the next
  /// month clamps to its last day (Jan 31 -> Feb 28/29). Returns `None` only
  /// when the result leaves chrono's representable range.
  pub fn advance(&self, from: DateTime<Utc>) -> Option<DateTime<Utc>> {
    match self {
      Frequency::Daily => from.checked_add_signed(Duration::days(1)),
      Frequency::Weekly => from.checked_add_signed(Duration::days(7)),
      Frequency::Monthly => from.checked_add_months(Months::new(1)),
    }
  }
}

impl fmt::Display for Frequency {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Frequency {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "daily" => Ok(Frequency::Daily),
      "weekly" => Ok(Frequency::Weekly),
      "monthly" => Ok(Frequency::Monthly),
      other => Err(format!("unknown frequency '{}'", other)),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BillingType {
  Prepaid,
  #[default]
  Postpaid,
}

impl BillingType {
  /// Cash on delivery is collected per delivery; every other method pays up front.
  pub fn for_payment_method(payment_method: &str) -> Self {
    if payment_method == CASH_ON_DELIVERY {
      BillingType::Postpaid
    } else {
      BillingType::Prepaid
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      BillingType::Prepaid => "Prepaid",
      BillingType::Postpaid => "Postpaid",
    }
  }
}

impl FromStr for BillingType {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim() {
      "Prepaid" => Ok(BillingType::Prepaid),
      "Postpaid" => Ok(BillingType::Postpaid),
      other => Err(format!("unknown billing type '{}'", other)),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
  #[default]
  Active,
  Paused,
  Cancelled,
}

impl SubscriptionStatus {
  pub fn as_str(&self) -> &'static str {
    match self {
      SubscriptionStatus::Active => "active",
      SubscriptionStatus::Paused => "paused",
      SubscriptionStatus::Cancelled => "cancelled",
    }
  }

  /// `cancelled` is terminal; `active` and `paused` move freely between each other.
  pub fn can_become(&self, next: SubscriptionStatus) -> bool {
    match self {
      SubscriptionStatus::Cancelled => next == SubscriptionStatus::Cancelled,
      SubscriptionStatus::Active | SubscriptionStatus::Paused => true,
    }
  }
}

impl fmt::Display for SubscriptionStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for SubscriptionStatus {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "active" => Ok(SubscriptionStatus::Active),
      "paused" => Ok(SubscriptionStatus::Paused),
      "cancelled" => Ok(SubscriptionStatus::Cancelled),
      other => Err(format!("unknown subscription status '{}'", other)),
    }
  }
}

/// A recurring delivery plan. It tags the orders it spawns but never owns them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
  pub id: Uuid,
  pub user: Uuid,
  pub product: Uuid,
  pub quantity: u32,
  pub frequency: Frequency,
  pub start_date: DateTime<Utc>,
  pub end_date: Option<DateTime<Utc>>,
  /// Human-readable plan length, e.g. "1 Month".
  pub duration: Option<String>,
  pub billing_type: BillingType,
  /// Never earlier than the last generated order; moves one period per generation.
  pub next_delivery_date: DateTime<Utc>,
  pub status: SubscriptionStatus,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl Subscription {
  pub fn is_due(&self, now: DateTime<Utc>) -> bool {
    self.status == SubscriptionStatus::Active && self.next_delivery_date <= now
  }
}
