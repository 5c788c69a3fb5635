// grocer_server/tests/api_tests.rs

use actix_web::http::StatusCode;
use actix_web::{test, web, App};
use grocer::{Engine, Product, Stores};
use grocer_server::config::{AppConfig, StoreBackend};
use grocer_server::state::AppState;
use grocer_server::web::configure_app_routes;
use rust_decimal::Decimal;
use serde_json::{json, Value};
use uuid::Uuid;

const CUSTOMER: &str = "5d3c1a7e-2b4f-4c8d-9e6a-0f1b2c3d4e5f";
const OTHER_CUSTOMER: &str = "8a9b0c1d-2e3f-4a5b-8c7d-9e0f1a2b3c4d";
const ADMIN: &str = "11111111-2222-4333-8444-555555555555";

struct Harness {
  stores: Stores,
  config: AppConfig,
}

impl Harness {
  fn new() -> Self {
    Self {
      stores: Stores::in_memory(),
      config: AppConfig {
        store_backend: StoreBackend::Memory,
        ..AppConfig::default()
      },
    }
  }

  async fn add_product(&self, name: &str, stock: u32) -> Uuid {
    let product = Product {
      id: Uuid::new_v4(),
      name: name.to_string(),
      image: format!("/images/{}.jpg", name.to_ascii_lowercase()),
      price: Decimal::new(50, 0),
      count_in_stock: stock,
      is_active: true,
      has_image: true,
    };
    self.stores.products.put(&product).await.unwrap();
    product.id
  }

  fn state(&self) -> AppState {
    AppState::new(Engine::new(self.stores.clone()), self.config.clone())
  }
}

macro_rules! service {
  ($harness:expr) => {
    test::init_service(
      App::new()
        .app_data(web::Data::new($harness.state()))
        .configure(configure_app_routes),
    )
    .await
  };
}

fn checkout_body(product: Uuid, qty: u32) -> Value {
  json!({
    "orderItems": [{ "product": product, "qty": qty }],
    "shippingAddress": { "address": "12 Market Road", "city": "Hyderabad", "postalCode": "500001" },
    "paymentMethod": "UPI",
    "itemsPrice": 100,
    "shippingPrice": 0,
    "taxPrice": 15,
    "totalPrice": 115
  })
}

#[actix_web::test]
async fn health_is_open() {
  let harness = Harness::new();
  let app = service!(harness);
  let resp = test::call_service(&app, test::TestRequest::get().uri("/api/health").to_request()).await;
  assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn checkout_requires_identity() {
  let harness = Harness::new();
  let milk = harness.add_product("Milk", 5).await;
  let app = service!(harness);

  let req = test::TestRequest::post()
    .uri("/api/orders")
    .set_json(checkout_body(milk, 2))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

  let req = test::TestRequest::post()
    .uri("/api/orders")
    .insert_header(("X-User-ID", "not-a-uuid"))
    .set_json(checkout_body(milk, 2))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn checkout_creates_order_and_takes_stock() {
  let harness = Harness::new();
  let milk = harness.add_product("Milk", 5).await;
  let app = service!(harness);

  let req = test::TestRequest::post()
    .uri("/api/orders")
    .insert_header(("X-User-ID", CUSTOMER))
    .set_json(checkout_body(milk, 2))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::CREATED);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["orderStatus"], "Order Placed");
  assert_eq!(body["isPaid"], false);
  assert_eq!(body["trackingHistory"].as_array().map(Vec::len), Some(1));
  assert_eq!(body["subscriptionIds"], json!([]));

  let product = harness.stores.products.get(milk).await.unwrap().unwrap();
  assert_eq!(product.count_in_stock, 3);
}

#[actix_web::test]
async fn checkout_with_short_stock_is_a_bad_request_listing_issues() {
  let harness = Harness::new();
  let milk = harness.add_product("Milk", 1).await;
  let app = service!(harness);

  let req = test::TestRequest::post()
    .uri("/api/orders")
    .insert_header(("X-User-ID", CUSTOMER))
    .set_json(checkout_body(milk, 2))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  let body: Value = test::read_body_json(resp).await;
  assert!(body["error"].as_str().unwrap().starts_with("Cannot place order"));
  assert_eq!(body["issues"].as_array().map(Vec::len), Some(1));
}

#[actix_web::test]
async fn admin_routes_reject_customers() {
  let harness = Harness::new();
  let app = service!(harness);

  for uri in ["/api/orders", "/api/orders/analytics", "/api/subscriptions"] {
    let req = test::TestRequest::get()
      .uri(uri)
      .insert_header(("X-User-ID", CUSTOMER))
      .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "{}", uri);

    let req = test::TestRequest::get()
      .uri(uri)
      .insert_header(("X-User-ID", ADMIN))
      .insert_header(("X-User-Role", "admin"))
      .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK, "{}", uri);
  }
}

#[actix_web::test]
async fn order_is_visible_to_owner_and_admin_only() {
  let harness = Harness::new();
  let milk = harness.add_product("Milk", 5).await;
  let app = service!(harness);

  let req = test::TestRequest::post()
    .uri("/api/orders")
    .insert_header(("X-User-ID", CUSTOMER))
    .set_json(checkout_body(milk, 1))
    .to_request();
  let body: Value = test::call_and_read_body_json(&app, req).await;
  let order_id = body["id"].as_str().unwrap().to_string();
  let uri = format!("/api/orders/{}", order_id);

  let owner = test::TestRequest::get().uri(&uri).insert_header(("X-User-ID", CUSTOMER)).to_request();
  assert_eq!(test::call_service(&app, owner).await.status(), StatusCode::OK);

  let stranger = test::TestRequest::get()
    .uri(&uri)
    .insert_header(("X-User-ID", OTHER_CUSTOMER))
    .to_request();
  assert_eq!(test::call_service(&app, stranger).await.status(), StatusCode::UNAUTHORIZED);

  let admin = test::TestRequest::get()
    .uri(&uri)
    .insert_header(("X-User-ID", ADMIN))
    .insert_header(("X-User-Role", "admin"))
    .to_request();
  assert_eq!(test::call_service(&app, admin).await.status(), StatusCode::OK);

  let missing = test::TestRequest::get()
    .uri(&format!("/api/orders/{}", Uuid::new_v4()))
    .insert_header(("X-User-ID", ADMIN))
    .insert_header(("X-User-Role", "admin"))
    .to_request();
  assert_eq!(test::call_service(&app, missing).await.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn status_update_validates_the_status_name() {
  let harness = Harness::new();
  let milk = harness.add_product("Milk", 5).await;
  let app = service!(harness);

  let req = test::TestRequest::post()
    .uri("/api/orders")
    .insert_header(("X-User-ID", CUSTOMER))
    .set_json(checkout_body(milk, 1))
    .to_request();
  let body: Value = test::call_and_read_body_json(&app, req).await;
  let uri = format!("/api/orders/{}/status", body["id"].as_str().unwrap());

  let req = test::TestRequest::put()
    .uri(&uri)
    .insert_header(("X-User-ID", ADMIN))
    .insert_header(("X-User-Role", "admin"))
    .set_json(json!({ "status": "Teleported" }))
    .to_request();
  assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

  let req = test::TestRequest::put()
    .uri(&uri)
    .insert_header(("X-User-ID", ADMIN))
    .insert_header(("X-User-Role", "admin"))
    .set_json(json!({ "status": "Shipped", "comment": "Left the warehouse." }))
    .to_request();
  let body: Value = test::call_and_read_body_json(&app, req).await;
  assert_eq!(body["orderStatus"], "Shipped");
  assert_eq!(body["trackingHistory"][1]["comment"], "Left the warehouse.");
}

#[actix_web::test]
async fn generate_is_admin_only_by_default() {
  let harness = Harness::new();
  let app = service!(harness);

  let req = test::TestRequest::post().uri("/api/orders/generate").to_request();
  assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);

  let req = test::TestRequest::post()
    .uri("/api/orders/generate")
    .insert_header(("X-User-ID", ADMIN))
    .insert_header(("X-User-Role", "admin"))
    .to_request();
  let body: Value = test::call_and_read_body_json(&app, req).await;
  assert_eq!(body["message"], "No orders to generate due today.");
}

#[actix_web::test]
async fn generate_can_be_opened_by_configuration() {
  let mut harness = Harness::new();
  harness.config.generate_requires_admin = false;
  let app = service!(harness);

  let req = test::TestRequest::post().uri("/api/orders/generate").to_request();
  assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
}

#[actix_web::test]
async fn cancelling_a_subscription_reports_cancelled_orders() {
  let harness = Harness::new();
  let milk = harness.add_product("Milk", 10).await;
  let app = service!(harness);

  let req = test::TestRequest::post()
    .uri("/api/subscriptions")
    .insert_header(("X-User-ID", CUSTOMER))
    .set_json(json!({
      "product": milk,
      "quantity": 2,
      "frequency": "daily",
      "startDate": "2024-01-01T09:00:00Z"
    }))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::CREATED);
  let subscription: Value = test::read_body_json(resp).await;
  let sub_uri = format!("/api/subscriptions/{}", subscription["id"].as_str().unwrap());

  let req = test::TestRequest::post()
    .uri("/api/orders/generate")
    .insert_header(("X-User-ID", ADMIN))
    .insert_header(("X-User-Role", "admin"))
    .to_request();
  let report: Value = test::call_and_read_body_json(&app, req).await;
  assert_eq!(report["message"], "Generated 1 orders");

  let stranger = test::TestRequest::put()
    .uri(&sub_uri)
    .insert_header(("X-User-ID", OTHER_CUSTOMER))
    .set_json(json!({ "status": "cancelled" }))
    .to_request();
  assert_eq!(test::call_service(&app, stranger).await.status(), StatusCode::UNAUTHORIZED);

  let req = test::TestRequest::put()
    .uri(&sub_uri)
    .insert_header(("X-User-ID", CUSTOMER))
    .set_json(json!({ "status": "cancelled" }))
    .to_request();
  let body: Value = test::call_and_read_body_json(&app, req).await;
  assert_eq!(body["status"], "cancelled");
  assert_eq!(body["cancelledOrders"].as_array().map(Vec::len), Some(1));

  let req = test::TestRequest::put()
    .uri(&sub_uri)
    .insert_header(("X-User-ID", CUSTOMER))
    .set_json(json!({ "status": "active" }))
    .to_request();
  assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn products_carry_the_purchasable_flag() {
  let harness = Harness::new();
  let milk = harness.add_product("Milk", 0).await;
  let app = service!(harness);

  let req = test::TestRequest::get().uri(&format!("/api/products/{}", milk)).to_request();
  let body: Value = test::call_and_read_body_json(&app, req).await;
  assert_eq!(body["name"], "Milk");
  assert_eq!(body["isPurchasable"], false);

  let req = test::TestRequest::get().uri("/api/products").to_request();
  let body: Value = test::call_and_read_body_json(&app, req).await;
  assert_eq!(body.as_array().map(Vec::len), Some(1));
}
