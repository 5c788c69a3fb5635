// grocer/src/model/mod.rs

//! Records owned or referenced by the lifecycle engine.

pub mod order;
pub mod product;
pub mod subscription;
pub mod user;

pub use order::{Order, OrderItem, OrderStatus, ShippingAddress, TrackingEntry};
pub use product::{Product, ProductView};
pub use subscription::{BillingType, Frequency, Subscription, SubscriptionStatus};
pub use user::{Caller, Role, UserProfile};
