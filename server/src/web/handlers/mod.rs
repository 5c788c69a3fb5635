// grocer_server/src/web/handlers/mod.rs

pub mod order_handlers;
pub mod product_handlers;
pub mod subscription_handlers;
