// grocer/src/lib.rs

//! Grocer: the order and subscription lifecycle engine of an online grocery
//! storefront.
//!
//! The engine covers:
//!  - Checkout as a named-step pipeline: input and stock validation, atomic
//!    stock reservation, order creation and subscription spawning, with
//!    compensators that undo completed steps when a later one fails.
//!  - The subscription generation cycle that turns due subscriptions into orders.
//!  - An explicit order status state machine with an append-only tracking trail.
//!  - Cancellation sync from subscriptions to their unshipped orders.
//!  - Store-wide analytics.
//!
//! Persistence is abstracted behind the traits in [`store`]; [`MemoryStore`]
//! implements all of them for tests and local runs.

pub mod analytics;
pub mod checkout;
pub mod engine;
pub mod error;
pub mod lifecycle;
pub mod model;
pub mod orders;
pub mod pipeline;
pub mod scheduler;
pub mod store;
pub mod subscriptions;
pub mod sync;

// --- Re-exports for the Public API ---

pub use crate::analytics::Analytics;
pub use crate::checkout::{CartLine, CheckoutOutcome, CheckoutRequest};
pub use crate::engine::Engine;
pub use crate::error::{GrocerError, GrocerResult, StockIssue};
pub use crate::lifecycle::TransitionPolicy;
pub use crate::model::{
  BillingType, Caller, Frequency, Order, OrderItem, OrderStatus, Product, ProductView, Role, ShippingAddress,
  Subscription, SubscriptionStatus, TrackingEntry, UserProfile,
};
pub use crate::pipeline::{ContextData, Pipeline, PipelineControl, PipelineError, PipelineResult};
pub use crate::scheduler::{GenerationReport, SkipReason, SkippedSubscription};
pub use crate::store::{MemoryStore, OrderStore, ProductCatalog, Stores, SubscriptionStore, UserDirectory};
pub use crate::subscriptions::{NewSubscription, SubscriptionUpdate, SubscriptionUpdateOutcome};
