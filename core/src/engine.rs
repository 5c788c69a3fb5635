// grocer/src/engine.rs

use crate::checkout::{build_checkout_pipeline, CheckoutCtxData};
use crate::error::GrocerError;
use crate::lifecycle::TransitionPolicy;
use crate::pipeline::Pipeline;
use crate::store::Stores;
use std::sync::Arc;

/// Entry point for every lifecycle operation.
///
/// Cheap to clone; clones share the stores and the built checkout pipeline.
#[derive(Clone)]
pub struct Engine {
  stores: Stores,
  policy: TransitionPolicy,
  checkout: Arc<Pipeline<CheckoutCtxData, GrocerError>>,
}

impl Engine {
  pub fn new(stores: Stores) -> Self {
    Self {
      stores,
      policy: TransitionPolicy::default(),
      checkout: Arc::new(build_checkout_pipeline()),
    }
  }

  pub fn with_policy(mut self, policy: TransitionPolicy) -> Self {
    self.policy = policy;
    self
  }

  pub fn stores(&self) -> &Stores {
    &self.stores
  }

  pub fn policy(&self) -> TransitionPolicy {
    self.policy
  }

  pub fn checkout_pipeline(&self) -> &Pipeline<CheckoutCtxData, GrocerError> {
    &self.checkout
  }
}

impl std::fmt::Debug for Engine {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Engine")
      .field("policy", &self.policy)
      .field("checkout_steps", &self.checkout.step_names())
      .finish()
  }
}
