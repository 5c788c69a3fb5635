// tests/checkout_tests.rs
mod common;

use common::*;
use grocer::{
  BillingType, CartLine, Frequency, GrocerError, OrderStatus, ProductCatalog, SubscriptionStatus, SubscriptionStore,
};
use serial_test::serial;
use std::sync::Arc;
use uuid::Uuid;

#[tokio::test]
#[serial]
async fn test_checkout_places_order_and_decrements_stock() {
  setup_tracing();
  let shop = Shop::new();
  let milk = shop.add_product("Milk", 50, 5).await;
  let customer = shop.add_customer(None).await;
  let now = at(2024, 5, 1);

  let outcome = shop
    .engine
    .checkout(&customer, checkout_request(vec![CartLine::new(milk.id, 2)], "UPI"), now)
    .await
    .unwrap();

  let order = &outcome.order;
  assert_eq!(shop.stock(milk.id), 3);
  assert_eq!(order.order_status, OrderStatus::OrderPlaced);
  assert_eq!(order.tracking_history.len(), 1);
  assert_eq!(order.tracking_history[0].comment, "Your order has been placed successfully.");
  assert_eq!(order.tracking_history[0].date, now);
  assert!(!order.is_paid);
  assert_eq!(order.paid_at, None);
  assert_eq!(order.items_price, money(100));
  assert_eq!(order.tax_price, money(15));
  assert_eq!(order.total_price, money(115));
  assert_eq!(order.cod_charge, money(0));
  assert_eq!(order.user, customer.user_id);
  assert!(outcome.subscription_ids.is_empty());

  // Item snapshot comes from the catalog record.
  let item = &order.order_items[0];
  assert_eq!(item.name, "Milk");
  assert_eq!(item.price, money(50));
  assert_eq!(item.image, "/images/milk.jpg");
  assert_eq!(item.qty, 2);

  let stored = shop.engine.get_order(&customer, order.id).await.unwrap();
  assert_eq!(&stored, order);
}

#[tokio::test]
#[serial]
async fn test_paid_checkout_records_paid_at() {
  setup_tracing();
  let shop = Shop::new();
  let rice = shop.add_product("Rice", 90, 10).await;
  let customer = shop.add_customer(None).await;
  let now = at(2024, 5, 2);

  let mut request = checkout_request(vec![CartLine::new(rice.id, 1)], "Card");
  request.is_paid = true;
  request.cod_charge = Some(money(0));
  let outcome = shop.engine.checkout(&customer, request, now).await.unwrap();

  assert!(outcome.order.is_paid);
  assert_eq!(outcome.order.paid_at, Some(now));
}

#[tokio::test]
#[serial]
async fn test_stock_validation_is_all_or_nothing() {
  setup_tracing();
  let shop = Shop::new();
  let eggs = shop.add_product("Eggs", 6, 12).await;
  let bread = shop.add_product("Bread", 40, 1).await;
  let customer = shop.add_customer(None).await;
  let ghost = Uuid::new_v4();

  let mut ghost_line = CartLine::new(ghost, 1);
  ghost_line.name = Some("Paneer".to_string());
  let request = checkout_request(
    vec![CartLine::new(eggs.id, 6), CartLine::new(bread.id, 3), ghost_line],
    "UPI",
  );
  let err = shop.engine.checkout(&customer, request, at(2024, 5, 3)).await.unwrap_err();

  match &err {
    GrocerError::Stock { issues } => {
      assert_eq!(issues.len(), 2);
      assert_eq!(issues[0].product_id, bread.id);
      assert_eq!(issues[0].available, Some(1));
      assert_eq!(issues[1].product_id, ghost);
      assert_eq!(issues[1].available, None);
    }
    other => panic!("Expected a stock error, got {:?}", other),
  }
  assert_eq!(
    err.to_string(),
    "Cannot place order: Insufficient stock for \"Bread\". Available: 1, Requested: 3; Product \"Paneer\" not found"
  );
  assert_eq!(shop.stock(eggs.id), 12);
  assert_eq!(shop.stock(bread.id), 1);
  assert!(shop.engine.list_orders().await.unwrap().is_empty());
}

#[tokio::test]
#[serial]
async fn test_missing_product_label_falls_back_to_id() {
  setup_tracing();
  let shop = Shop::new();
  let customer = shop.add_customer(None).await;
  let ghost = Uuid::new_v4();

  let err = shop
    .engine
    .checkout(&customer, checkout_request(vec![CartLine::new(ghost, 1)], "UPI"), at(2024, 5, 3))
    .await
    .unwrap_err();
  assert_eq!(err.to_string(), format!("Cannot place order: Product \"{}\" not found", ghost));
}

#[tokio::test]
#[serial]
async fn test_invalid_input_is_rejected_before_stock_is_read() {
  setup_tracing();
  let shop = Shop::new();
  let milk = shop.add_product("Milk", 50, 5).await;
  let customer = shop.add_customer(None).await;
  let now = at(2024, 5, 4);

  let empty = checkout_request(Vec::new(), "UPI");
  let err = shop.engine.checkout(&customer, empty, now).await.unwrap_err();
  assert!(matches!(&err, GrocerError::Validation(m) if m == "No order items"));

  let zero_qty = checkout_request(vec![CartLine::new(milk.id, 0)], "UPI");
  assert!(matches!(
    shop.engine.checkout(&customer, zero_qty, now).await,
    Err(GrocerError::Validation(_))
  ));

  let mut no_address = checkout_request(vec![CartLine::new(milk.id, 1)], "UPI");
  no_address.shipping_address = None;
  assert!(matches!(
    shop.engine.checkout(&customer, no_address, now).await,
    Err(GrocerError::Validation(m)) if m == "Shipping address is required"
  ));

  let mut no_payment = checkout_request(vec![CartLine::new(milk.id, 1)], "UPI");
  no_payment.payment_method = Some("  ".to_string());
  assert!(matches!(
    shop.engine.checkout(&customer, no_payment, now).await,
    Err(GrocerError::Validation(m)) if m == "Payment method is required"
  ));

  assert_eq!(shop.stock(milk.id), 5);
}

#[tokio::test]
#[serial]
async fn test_subscription_lines_spawn_subscriptions() {
  setup_tracing();
  let shop = Shop::new();
  let milk = shop.add_product("Milk", 50, 20).await;
  let curd = shop.add_product("Curd", 30, 20).await;
  let customer = shop.add_customer(None).await;
  let now = at(2024, 6, 1);
  let start = at(2024, 6, 3);

  let request = checkout_request(
    vec![
      CartLine::new(milk.id, 1).subscribe(Frequency::Daily, Some(start)),
      CartLine::new(curd.id, 2).subscribe(Frequency::Weekly, None),
    ],
    "Cash on Delivery",
  );
  let outcome = shop.engine.checkout(&customer, request, now).await.unwrap();

  assert_eq!(outcome.subscription_ids.len(), 2);
  // The order links only the last subscription created.
  assert_eq!(outcome.order.subscription_id, Some(outcome.subscription_ids[1]));
  let stored = shop.engine.get_order(&customer, outcome.order.id).await.unwrap();
  assert_eq!(stored.subscription_id, Some(outcome.subscription_ids[1]));

  let daily = shop.subscription(outcome.subscription_ids[0]).await;
  assert_eq!(daily.product, milk.id);
  assert_eq!(daily.frequency, Frequency::Daily);
  assert_eq!(daily.start_date, start);
  assert_eq!(daily.next_delivery_date, start);
  assert_eq!(daily.billing_type, BillingType::Postpaid);
  assert_eq!(daily.status, SubscriptionStatus::Active);
  assert_eq!(daily.user, customer.user_id);

  let weekly = shop.subscription(outcome.subscription_ids[1]).await;
  assert_eq!(weekly.quantity, 2);
  assert_eq!(weekly.start_date, now);
  assert_eq!(weekly.next_delivery_date, now);

  let item = &outcome.order.order_items[0];
  assert!(item.is_subscription);
  assert_eq!(item.frequency, Some(Frequency::Daily));
  assert_eq!(item.start_date, Some(start));
}

#[tokio::test]
#[serial]
async fn test_prepaid_methods_create_prepaid_subscriptions() {
  setup_tracing();
  let shop = Shop::new();
  let milk = shop.add_product("Milk", 50, 20).await;
  let customer = shop.add_customer(None).await;

  let mut line = CartLine::new(milk.id, 1);
  line.is_subscription = true;
  let outcome = shop
    .engine
    .checkout(&customer, checkout_request(vec![line], "UPI"), at(2024, 6, 1))
    .await
    .unwrap();

  let sub = shop.subscription(outcome.subscription_ids[0]).await;
  assert_eq!(sub.billing_type, BillingType::Prepaid);
  // Frequency defaults to daily.
  assert_eq!(sub.frequency, Frequency::Daily);
}

#[tokio::test]
#[serial]
async fn test_lost_reservation_race_restores_earlier_lines() {
  setup_tracing();
  let store = grocer::MemoryStore::new();
  let catalog = RacingCatalog {
    inner: store.clone(),
    loses_on: Uuid::nil(),
  };
  let apples = grocer::Product {
    id: Uuid::new_v4(),
    name: "Apples".to_string(),
    image: "/images/apples.jpg".to_string(),
    price: money(120),
    count_in_stock: 10,
    is_active: true,
    has_image: true,
  };
  let pears = grocer::Product {
    id: Uuid::new_v4(),
    name: "Pears".to_string(),
    ..apples.clone()
  };
  ProductCatalog::put(&catalog, &apples).await.unwrap();
  ProductCatalog::put(&catalog, &pears).await.unwrap();
  let catalog = RacingCatalog {
    loses_on: pears.id,
    ..catalog
  };

  let shop = Shop::with_stores(store.clone(), stores_with(&store, Some(Arc::new(catalog)), None));
  let customer = shop.add_customer(None).await;
  let request = checkout_request(vec![CartLine::new(apples.id, 4), CartLine::new(pears.id, 2)], "UPI");
  let err = shop.engine.checkout(&customer, request, at(2024, 7, 1)).await.unwrap_err();

  match err {
    GrocerError::Stock { issues } => {
      assert_eq!(issues.len(), 1);
      assert_eq!(issues[0].product_id, pears.id);
    }
    other => panic!("Expected a stock error, got {:?}", other),
  }
  assert_eq!(shop.stock(apples.id), 10);
  assert_eq!(shop.stock(pears.id), 10);
  assert!(shop.engine.list_orders().await.unwrap().is_empty());
}

#[tokio::test]
#[serial]
async fn test_failed_subscription_insert_voids_order_and_releases_stock() {
  setup_tracing();
  let store = grocer::MemoryStore::new();
  let broken = BrokenSubscriptions { inner: store.clone() };
  let shop = Shop::with_stores(store.clone(), stores_with(&store, None, Some(Arc::new(broken))));
  let milk = shop.add_product("Milk", 50, 5).await;
  let customer = shop.add_customer(None).await;

  let request = checkout_request(vec![CartLine::new(milk.id, 2).subscribe(Frequency::Weekly, None)], "UPI");
  let err = shop.engine.checkout(&customer, request, at(2024, 7, 2)).await.unwrap_err();

  assert!(matches!(err, GrocerError::Storage { .. }));
  assert_eq!(shop.stock(milk.id), 5);

  let orders = shop.engine.list_my_orders(&customer).await.unwrap();
  assert_eq!(orders.len(), 1);
  let voided = &orders[0];
  assert_eq!(voided.order_status, OrderStatus::Cancelled);
  assert_eq!(voided.tracking_history.len(), 2);
  assert_eq!(
    voided.tracking_history[1].comment,
    "Order cancelled because checkout could not be completed."
  );
  assert!(SubscriptionStore::list_all(&store).await.unwrap().is_empty());
}

#[tokio::test]
#[serial]
async fn test_checkout_pipeline_step_layout() {
  let shop = Shop::new();
  assert_eq!(
    shop.engine.checkout_pipeline().step_names(),
    vec![
      "validate_checkout_input",
      "validate_stock",
      "reserve_stock",
      "create_order",
      "create_subscriptions"
    ]
  );
}

#[tokio::test]
#[serial]
async fn test_repeated_product_lines_are_validated_against_their_total() {
  setup_tracing();
  let shop = Shop::new();
  let curd = shop.add_product("Curd", 30, 5).await;
  let customer = shop.add_customer(None).await;

  let request = checkout_request(vec![CartLine::new(curd.id, 3), CartLine::new(curd.id, 3)], "UPI");
  let err = shop.engine.checkout(&customer, request, at(2024, 5, 6)).await.unwrap_err();

  match &err {
    GrocerError::Stock { issues } => {
      assert_eq!(issues.len(), 2);
      assert!(issues.iter().all(|i| i.product_id == curd.id));
      assert!(issues.iter().all(|i| i.requested == 6 && i.available == Some(5)));
    }
    other => panic!("Expected a stock error, got {:?}", other),
  }
  assert_eq!(shop.stock(curd.id), 5);
  assert!(shop.engine.list_orders().await.unwrap().is_empty());
}

#[tokio::test]
#[serial]
async fn test_submitted_prices_are_stored_at_full_precision() {
  setup_tracing();
  let shop = Shop::new();
  let dal = shop.add_product("Dal", 120, 5).await;
  let customer = shop.add_customer(None).await;

  let mut request = checkout_request(vec![CartLine::new(dal.id, 1)], "UPI");
  request.tax_price = rust_decimal::Decimal::new(15_125, 3);
  request.total_price = rust_decimal::Decimal::new(115_125, 3);
  let order = shop.engine.checkout(&customer, request, at(2024, 5, 6)).await.unwrap().order;

  let stored = shop.engine.get_order(&customer, order.id).await.unwrap();
  assert_eq!(stored.tax_price, rust_decimal::Decimal::new(15_125, 3));
  assert_eq!(stored.total_price.to_string(), "115.125");
}
