// grocer/src/lifecycle.rs

//! The order status state machine.
//!
//! `Order Placed -> Confirmed -> Packed -> Shipped -> Out for Delivery -> Delivered`,
//! with `Cancelled` reachable from anything short of `Delivered`. Which edges
//! are legal depends on the [`TransitionPolicy`].

use crate::error::{GrocerError, GrocerResult};
use crate::model::{Order, OrderStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const DELIVERED_COMMENT: &str = "Package delivered to customer.";
pub const CHECKOUT_VOIDED_COMMENT: &str = "Order cancelled because checkout could not be completed.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransitionPolicy {
  /// Any status may be set from any status, backward moves included.
  #[default]
  Permissive,
  /// Forward moves only; `Delivered` and `Cancelled` are terminal.
  Strict,
}

impl TransitionPolicy {
  pub fn allows(&self, from: OrderStatus, to: OrderStatus) -> bool {
    if from == to {
      return true;
    }
    match self {
      TransitionPolicy::Permissive => true,
      TransitionPolicy::Strict => match (from.stage(), to.stage()) {
        // Cancelled is terminal.
        (None, _) => false,
        (Some(_), None) => from != OrderStatus::Delivered,
        (Some(a), Some(b)) => from != OrderStatus::Delivered && b > a,
      },
    }
  }

  /// Every status `from` may move to, itself included.
  pub fn allowed_targets(&self, from: OrderStatus) -> Vec<OrderStatus> {
    OrderStatus::ALL
      .into_iter()
      .filter(|to| self.allows(from, *to))
      .collect()
  }
}

impl fmt::Display for TransitionPolicy {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      TransitionPolicy::Permissive => "permissive",
      TransitionPolicy::Strict => "strict",
    })
  }
}

impl FromStr for TransitionPolicy {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "permissive" => Ok(TransitionPolicy::Permissive),
      "strict" => Ok(TransitionPolicy::Strict),
      other => Err(format!("unknown transition policy '{}'", other)),
    }
  }
}

impl Order {
  /// Moves the order to `to` if `policy` allows it, appending one tracking entry.
  ///
  /// `comment` falls back to `Order status updated to <status>`.
  pub fn transition(
    &mut self,
    policy: TransitionPolicy,
    to: OrderStatus,
    comment: Option<&str>,
    now: DateTime<Utc>,
  ) -> GrocerResult<()> {
    if !policy.allows(self.order_status, to) {
      return Err(GrocerError::Conflict(format!(
        "Cannot change order status from {} to {}",
        self.order_status, to
      )));
    }
    let comment = match comment.map(str::trim).filter(|c| !c.is_empty()) {
      Some(c) => c.to_string(),
      None => format!("Order status updated to {}", to),
    };
    self.enter_status(to, comment, now);
    Ok(())
  }

  /// Marks the order delivered. A cancelled order is never delivered,
  /// whatever the policy.
  pub fn mark_delivered(&mut self, policy: TransitionPolicy, now: DateTime<Utc>) -> GrocerResult<()> {
    if self.order_status == OrderStatus::Cancelled {
      return Err(GrocerError::Conflict("Cannot mark a cancelled order as delivered".to_string()));
    }
    self.transition(policy, OrderStatus::Delivered, Some(DELIVERED_COMMENT), now)
  }

  /// Sets the status unconditionally and applies the entry side effects.
  pub(crate) fn enter_status(&mut self, status: OrderStatus, comment: impl Into<String>, now: DateTime<Utc>) {
    self.order_status = status;
    if status == OrderStatus::Delivered {
      self.is_delivered = true;
      self.delivered_at = Some(now);
      if self.is_cash_on_delivery() && !self.is_paid {
        self.is_paid = true;
        self.paid_at = Some(now);
      }
    }
    self.push_tracking(status, comment, now);
  }

  /// Cancels an order whose checkout was rolled back.
  pub(crate) fn void(&mut self, now: DateTime<Utc>) {
    self.enter_status(OrderStatus::Cancelled, CHECKOUT_VOIDED_COMMENT, now);
  }
}
