// grocer/src/subscriptions.rs

//! Customer-facing subscription management.

use crate::engine::Engine;
use crate::error::{GrocerError, GrocerResult};
use crate::model::{BillingType, Caller, Frequency, Subscription, SubscriptionStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

/// Body of a new subscription. The required fields are optional here so a
/// missing one is reported as a validation error rather than a parse failure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSubscription {
  pub product: Option<Uuid>,
  pub quantity: Option<u32>,
  pub frequency: Option<Frequency>,
  pub start_date: Option<DateTime<Utc>>,
  #[serde(default)]
  pub end_date: Option<DateTime<Utc>>,
  #[serde(default)]
  pub duration: Option<String>,
  #[serde(default)]
  pub billing_type: Option<BillingType>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionUpdate {
  #[serde(default)]
  pub status: Option<SubscriptionStatus>,
  #[serde(default)]
  pub quantity: Option<u32>,
  #[serde(default)]
  pub frequency: Option<Frequency>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionUpdateOutcome {
  pub subscription: Subscription,
  /// Orders cancelled because this update cancelled the subscription.
  pub cancelled_orders: Vec<Uuid>,
}

impl Engine {
  #[instrument(name = "Engine::create_subscription", skip(self, input), fields(user_id = %caller.user_id), err(Display))]
  pub async fn create_subscription(
    &self,
    caller: &Caller,
    input: NewSubscription,
    now: DateTime<Utc>,
  ) -> GrocerResult<Subscription> {
    let (Some(product), Some(quantity), Some(frequency), Some(start_date)) =
      (input.product, input.quantity.filter(|q| *q > 0), input.frequency, input.start_date)
    else {
      return Err(GrocerError::Validation("Please fill all fields".to_string()));
    };
    if self.stores().products.get(product).await?.is_none() {
      return Err(GrocerError::not_found("Product", product));
    }

    let subscription = Subscription {
      id: Uuid::new_v4(),
      user: caller.user_id,
      product,
      quantity,
      frequency,
      start_date,
      end_date: input.end_date,
      duration: input.duration,
      billing_type: input.billing_type.unwrap_or_default(),
      next_delivery_date: start_date,
      status: SubscriptionStatus::Active,
      created_at: now,
      updated_at: now,
    };
    self.stores().subscriptions.insert(&subscription).await?;
    info!(subscription_id = %subscription.id, %frequency, "Subscription created.");
    Ok(subscription)
  }

  pub async fn list_my_subscriptions(&self, caller: &Caller) -> GrocerResult<Vec<Subscription>> {
    self.stores().subscriptions.list_for_user(caller.user_id).await
  }

  pub async fn list_subscriptions(&self) -> GrocerResult<Vec<Subscription>> {
    self.stores().subscriptions.list_all().await
  }

  /// Applies a partial update. Moving into `cancelled` also cancels the
  /// subscription's unshipped orders.
  #[instrument(name = "Engine::update_subscription", skip(self, update), fields(user_id = %caller.user_id), err(Display))]
  pub async fn update_subscription(
    &self,
    caller: &Caller,
    id: Uuid,
    update: SubscriptionUpdate,
    now: DateTime<Utc>,
  ) -> GrocerResult<SubscriptionUpdateOutcome> {
    let mut subscription = self
      .stores()
      .subscriptions
      .get(id)
      .await?
      .ok_or_else(|| GrocerError::not_found("Subscription", id))?;
    if !caller.may_access(subscription.user) {
      return Err(GrocerError::Unauthorized("Not authorized".to_string()));
    }

    let previous = subscription.status;
    if let Some(status) = update.status {
      if !previous.can_become(status) {
        return Err(GrocerError::Conflict(format!(
          "Cannot change a cancelled subscription to {}",
          status
        )));
      }
      subscription.status = status;
    }
    if let Some(quantity) = update.quantity {
      if quantity == 0 {
        return Err(GrocerError::Validation("Quantity must be at least 1".to_string()));
      }
      subscription.quantity = quantity;
    }
    if let Some(frequency) = update.frequency {
      subscription.frequency = frequency;
    }
    subscription.updated_at = now;

    if !self.stores().subscriptions.update(&subscription).await? {
      return match self.stores().subscriptions.get(id).await? {
        Some(_) => Err(GrocerError::Conflict(
          "Subscription was cancelled while this update was in progress".to_string(),
        )),
        None => Err(GrocerError::not_found("Subscription", id)),
      };
    }
    // The stored delivery date may have been advanced since it was read.
    if let Some(stored) = self.stores().subscriptions.get(id).await? {
      subscription = stored;
    }

    let cancelled_orders =
      if previous != SubscriptionStatus::Cancelled && subscription.status == SubscriptionStatus::Cancelled {
        self.cancel_linked_orders(subscription.id, now).await?
      } else {
        Vec::new()
      };

    Ok(SubscriptionUpdateOutcome {
      subscription,
      cancelled_orders,
    })
  }
}
