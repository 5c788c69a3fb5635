// grocer/src/checkout/pipeline.rs

//! The `checkout` pipeline and its step handlers.

use crate::checkout::context::{CheckoutCtxData, Reservation};
use crate::checkout::CartLine;
use crate::error::{GrocerError, GrocerResult, StockIssue};
use crate::model::{
  BillingType, Order, OrderItem, OrderStatus, Product, Subscription, SubscriptionStatus, TrackingEntry,
};
use crate::pipeline::{ContextData, Pipeline, PipelineControl, PipelineError, SkipCondition};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

pub const ORDER_PLACED_COMMENT: &str = "Your order has been placed successfully.";

type Ctx = ContextData<CheckoutCtxData>;

pub fn build_checkout_pipeline() -> Pipeline<CheckoutCtxData, GrocerError> {
  let no_subscription_lines: SkipCondition<CheckoutCtxData> = Arc::new(|data| !data.has_subscription_lines());

  let mut p = Pipeline::<CheckoutCtxData, GrocerError>::new(
    "checkout",
    &[
      ("validate_checkout_input", false, None),
      ("validate_stock", false, None),
      ("reserve_stock", false, None),
      ("create_order", false, None),
      ("create_subscriptions", false, Some(no_subscription_lines)),
    ],
  );

  p.on_step("validate_checkout_input", validate_checkout_input);
  p.on_step("validate_stock", validate_stock);
  p.on_step("reserve_stock", reserve_stock);
  p.compensate_step("reserve_stock", release_reserved_stock);
  p.on_step("create_order", create_order);
  p.compensate_step("create_order", void_order);
  p.on_step("create_subscriptions", create_subscriptions);
  p.compensate_step("create_subscriptions", cancel_created_subscriptions);
  p
}

async fn validate_checkout_input(ctx: Ctx) -> GrocerResult<PipelineControl> {
  ctx.with(|data| {
    let req = &data.request;
    if req.order_items.is_empty() {
      return Err(GrocerError::Validation("No order items".to_string()));
    }
    if let Some(line) = req.order_items.iter().find(|line| line.qty == 0) {
      return Err(GrocerError::Validation(format!(
        "Quantity for \"{}\" must be at least 1",
        line.label()
      )));
    }
    match &req.shipping_address {
      Some(addr) if !addr.address.trim().is_empty() => {}
      _ => return Err(GrocerError::Validation("Shipping address is required".to_string())),
    }
    if req.payment_method.as_deref().map_or(true, |m| m.trim().is_empty()) {
      return Err(GrocerError::Validation("Payment method is required".to_string()));
    }
    Ok(PipelineControl::Continue)
  })
}

/// Checks every line before anything is mutated and reports every offender at once.
///
/// Lines for the same product draw on the same stock, so each line is judged
/// against the total the cart asks of its product.
async fn validate_stock(ctx: Ctx) -> GrocerResult<PipelineControl> {
  let (stores, lines) = ctx.with(|data| (data.stores.clone(), data.request.order_items.clone()));

  let mut wanted: HashMap<Uuid, u32> = HashMap::new();
  for line in &lines {
    let total = wanted.entry(line.product).or_insert(0);
    *total = total.saturating_add(line.qty);
  }

  let mut issues = Vec::new();
  let mut catalog: HashMap<Uuid, Product> = HashMap::new();
  for line in &lines {
    let product = match catalog.get(&line.product) {
      Some(product) => Some(product.clone()),
      None => stores.products.get(line.product).await?,
    };
    match product {
      None => issues.push(StockIssue::missing(line.product, &line.label(), line.qty)),
      Some(product) => {
        let requested = wanted.get(&product.id).copied().unwrap_or(line.qty);
        if product.count_in_stock < requested {
          issues.push(StockIssue::insufficient(
            product.id,
            &product.name,
            product.count_in_stock,
            requested,
          ));
        }
        catalog.insert(product.id, product);
      }
    }
  }

  if !issues.is_empty() {
    debug!(issues = issues.len(), "Stock validation rejected the cart.");
    return Err(GrocerError::Stock { issues });
  }
  ctx.update(|data| data.catalog = catalog);
  Ok(PipelineControl::Continue)
}

async fn reserve_stock(ctx: Ctx) -> GrocerResult<PipelineControl> {
  let (stores, lines) = ctx.with(|data| (data.stores.clone(), data.request.order_items.clone()));

  for line in &lines {
    if stores.products.try_decrement_stock(line.product, line.qty).await? {
      ctx.update(|data| {
        data.reservations.push(Reservation {
          product: line.product,
          qty: line.qty,
        })
      });
      continue;
    }

    // Lost a race since validation: report the line as it stands now.
    let issue = match stores.products.get(line.product).await? {
      Some(product) => StockIssue::insufficient(product.id, &product.name, product.count_in_stock, line.qty),
      None => StockIssue::missing(line.product, &line.label(), line.qty),
    };
    warn!(product_id = %line.product, qty = line.qty, "Stock reservation lost a race.");
    return Err(GrocerError::Stock { issues: vec![issue] });
  }
  Ok(PipelineControl::Continue)
}

async fn release_reserved_stock(ctx: Ctx) -> GrocerResult<()> {
  let (stores, reservations) = ctx.update(|data| (data.stores.clone(), std::mem::take(&mut data.reservations)));

  let mut first_err = None;
  for r in reservations.iter().rev() {
    if let Err(e) = stores.products.restore_stock(r.product, r.qty).await {
      warn!(product_id = %r.product, qty = r.qty, error = %e, "Failed to restore reserved stock.");
      first_err.get_or_insert(e);
    }
  }
  match first_err {
    Some(e) => Err(e),
    None => {
      debug!(released = reservations.len(), "Released reserved stock.");
      Ok(())
    }
  }
}

fn snapshot_item(line: &CartLine, product: &Product) -> OrderItem {
  OrderItem {
    name: product.name.clone(),
    qty: line.qty,
    image: product.image.clone(),
    price: product.price,
    product: product.id,
    is_subscription: line.is_subscription,
    frequency: line.is_subscription.then(|| line.frequency.unwrap_or_default()),
    start_date: if line.is_subscription { line.start_date } else { None },
  }
}

fn draft_order(data: &CheckoutCtxData) -> GrocerResult<Order> {
  let req = &data.request;
  let order_items = req
    .order_items
    .iter()
    .map(|line| {
      data
        .catalog
        .get(&line.product)
        .map(|product| snapshot_item(line, product))
        .ok_or_else(|| {
          GrocerError::from(PipelineError::ContextIncomplete {
            step_name: "create_order".to_string(),
            detail: format!("product {} was not validated", line.product),
          })
        })
    })
    .collect::<GrocerResult<Vec<_>>>()?;

  let shipping_address = req
    .shipping_address
    .clone()
    .ok_or_else(|| GrocerError::Validation("Shipping address is required".to_string()))?;
  let payment_method = req
    .payment_method
    .clone()
    .ok_or_else(|| GrocerError::Validation("Payment method is required".to_string()))?;

  Ok(Order {
    id: Uuid::new_v4(),
    user: data.customer,
    order_items,
    shipping_address,
    payment_method,
    items_price: req.items_price,
    shipping_price: req.shipping_price,
    tax_price: req.tax_price,
    total_price: req.total_price,
    cod_charge: req.cod_charge.unwrap_or(Decimal::ZERO),
    is_paid: req.is_paid,
    paid_at: req.is_paid.then_some(data.now),
    is_delivered: false,
    delivered_at: None,
    subscription_id: None,
    order_status: OrderStatus::OrderPlaced,
    tracking_history: vec![TrackingEntry {
      status: OrderStatus::OrderPlaced,
      date: data.now,
      comment: ORDER_PLACED_COMMENT.to_string(),
    }],
    created_at: data.now,
    updated_at: data.now,
  })
}

async fn create_order(ctx: Ctx) -> GrocerResult<PipelineControl> {
  let (stores, order) = ctx.with(|data| Ok::<_, GrocerError>((data.stores.clone(), draft_order(data)?)))?;

  stores.orders.insert(&order).await?;
  info!(order_id = %order.id, user_id = %order.user, "Order created.");
  ctx.update(|data| data.order = Some(order));
  Ok(PipelineControl::Continue)
}

/// Orders are never deleted on rollback; a persisted order is cancelled instead.
async fn void_order(ctx: Ctx) -> GrocerResult<()> {
  let (stores, order, now) = ctx.with(|data| (data.stores.clone(), data.order.clone(), data.now));
  let Some(mut order) = order else {
    return Ok(());
  };

  order.void(now);
  stores.orders.update(&order).await?;
  warn!(order_id = %order.id, "Order voided during checkout rollback.");
  ctx.update(|data| data.order = Some(order));
  Ok(())
}

async fn create_subscriptions(ctx: Ctx) -> GrocerResult<PipelineControl> {
  let (stores, customer, now, payment_method, lines) = ctx.with(|data| {
    (
      data.stores.clone(),
      data.customer,
      data.now,
      data.request.payment_method.clone().unwrap_or_default(),
      data.request.order_items.clone(),
    )
  });
  let billing_type = BillingType::for_payment_method(&payment_method);

  for line in lines.iter().filter(|line| line.is_subscription) {
    let start_date = line.start_date.unwrap_or(now);
    let subscription = Subscription {
      id: Uuid::new_v4(),
      user: customer,
      product: line.product,
      quantity: line.qty,
      frequency: line.frequency.unwrap_or_default(),
      start_date,
      end_date: None,
      duration: None,
      billing_type,
      next_delivery_date: start_date,
      status: SubscriptionStatus::Active,
      created_at: now,
      updated_at: now,
    };
    stores.subscriptions.insert(&subscription).await?;
    debug!(subscription_id = %subscription.id, product_id = %line.product, "Subscription created at checkout.");
    ctx.update(|data| data.subscriptions.push(subscription));
  }

  // The order keeps a single back-reference: the last subscription created.
  let linked = ctx.update(|data| {
    let last = data.subscriptions.last().map(|s| s.id);
    let now = data.now;
    data.order.as_mut().map(|order| {
      order.subscription_id = last;
      order.updated_at = now;
      order.clone()
    })
  });
  if let Some(order) = linked {
    stores.orders.update(&order).await?;
  }
  Ok(PipelineControl::Continue)
}

async fn cancel_created_subscriptions(ctx: Ctx) -> GrocerResult<()> {
  let (stores, now, created) = ctx.with(|data| (data.stores.clone(), data.now, data.subscriptions.clone()));

  for mut subscription in created {
    subscription.status = SubscriptionStatus::Cancelled;
    subscription.updated_at = now;
    stores.subscriptions.update(&subscription).await?;
    warn!(subscription_id = %subscription.id, "Subscription cancelled during checkout rollback.");
  }
  Ok(())
}
