// grocer_server/src/web/routes.rs

use actix_web::web;

use crate::web::handlers::{order_handlers, product_handlers, subscription_handlers};

async fn health_check_handler() -> actix_web::HttpResponse {
  actix_web::HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

pub fn configure_app_routes(cfg: &mut web::ServiceConfig) {
  cfg.service(
    web::scope("/api")
      .route("/health", web::get().to(health_check_handler))
      // Fixed segments are registered before `/{order_id}` so they are not parsed as ids.
      .service(
        web::scope("/orders")
          .route("", web::post().to(order_handlers::checkout_handler))
          .route("", web::get().to(order_handlers::list_orders_handler))
          .route("/my", web::get().to(order_handlers::my_orders_handler))
          .route("/analytics", web::get().to(order_handlers::analytics_handler))
          .route("/generate", web::post().to(order_handlers::generate_orders_handler))
          .route("/{order_id}", web::get().to(order_handlers::get_order_handler))
          .route("/{order_id}/deliver", web::put().to(order_handlers::mark_delivered_handler))
          .route("/{order_id}/status", web::put().to(order_handlers::update_order_status_handler)),
      )
      .service(
        web::scope("/subscriptions")
          .route("", web::post().to(subscription_handlers::create_subscription_handler))
          .route("", web::get().to(subscription_handlers::list_subscriptions_handler))
          .route("/my", web::get().to(subscription_handlers::my_subscriptions_handler))
          .route(
            "/{subscription_id}",
            web::put().to(subscription_handlers::update_subscription_handler),
          ),
      )
      .service(
        web::scope("/products")
          .route("", web::get().to(product_handlers::list_products_handler))
          .route("/{product_id}", web::get().to(product_handlers::get_product_handler)),
      ),
  );
}
