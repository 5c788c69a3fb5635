// grocer_server/src/web/handlers/order_handlers.rs

use actix_web::{web, HttpResponse};
use chrono::Utc;
use grocer::{CheckoutRequest, GenerationReport, GrocerError, Order, OrderStatus, SkippedSubscription};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::state::AppState;
use crate::web::auth::{AdminUser, AuthenticatedUser};

/// A placed order plus every subscription the checkout created.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PlacedOrder<'a> {
  #[serde(flatten)]
  order: &'a Order,
  subscription_ids: &'a [Uuid],
}

#[derive(Serialize)]
struct GenerateResponse<'a> {
  message: String,
  orders: &'a [Order],
  skipped: &'a [SkippedSubscription],
}

impl<'a> GenerateResponse<'a> {
  fn from_report(report: &'a GenerationReport) -> Self {
    Self {
      message: report.message(),
      orders: &report.generated,
      skipped: &report.skipped,
    }
  }
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdatePayload {
  pub status: String,
  #[serde(default)]
  pub comment: Option<String>,
}

#[instrument(
  name = "handler::checkout",
  skip(app_state, auth_user, payload),
  fields(user_id = %auth_user.caller.user_id)
)]
pub async fn checkout_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  payload: web::Json<CheckoutRequest>,
) -> Result<HttpResponse, AppError> {
  let outcome = app_state
    .engine
    .checkout(&auth_user.caller, payload.into_inner(), Utc::now())
    .await?;
  info!(order_id = %outcome.order.id, "Checkout completed.");
  Ok(HttpResponse::Created().json(PlacedOrder {
    order: &outcome.order,
    subscription_ids: &outcome.subscription_ids,
  }))
}

#[instrument(name = "handler::my_orders", skip(app_state, auth_user), fields(user_id = %auth_user.caller.user_id))]
pub async fn my_orders_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let orders = app_state.engine.list_my_orders(&auth_user.caller).await?;
  Ok(HttpResponse::Ok().json(orders))
}

#[instrument(name = "handler::list_orders", skip_all)]
pub async fn list_orders_handler(app_state: web::Data<AppState>, _admin: AdminUser) -> Result<HttpResponse, AppError> {
  let orders = app_state.engine.list_orders().await?;
  Ok(HttpResponse::Ok().json(orders))
}

#[instrument(name = "handler::analytics", skip_all)]
pub async fn analytics_handler(app_state: web::Data<AppState>, _admin: AdminUser) -> Result<HttpResponse, AppError> {
  let analytics = app_state.engine.analytics().await?;
  Ok(HttpResponse::Ok().json(analytics))
}

/// Runs one generation cycle. Admin-only unless `GENERATE_REQUIRES_ADMIN=false`.
#[instrument(name = "handler::generate_orders", skip_all)]
pub async fn generate_orders_handler(
  app_state: web::Data<AppState>,
  auth_user: Option<AuthenticatedUser>,
) -> Result<HttpResponse, AppError> {
  if app_state.config.generate_requires_admin {
    match auth_user {
      Some(user) if user.caller.is_admin() => {}
      Some(user) => {
        warn!(user_id = %user.caller.user_id, "Generation requested by a non-admin.");
        return Err(AppError::Auth("Not authorized as an admin".to_string()));
      }
      None => return Err(AppError::Auth("Not authorized, no valid user id".to_string())),
    }
  }

  let report = app_state.engine.generate_due_orders(Utc::now()).await?;
  Ok(HttpResponse::Ok().json(GenerateResponse::from_report(&report)))
}

#[instrument(name = "handler::get_order", skip(app_state, auth_user, path), fields(order_id = %path.as_ref()))]
pub async fn get_order_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let order = app_state.engine.get_order(&auth_user.caller, path.into_inner()).await?;
  Ok(HttpResponse::Ok().json(order))
}

#[instrument(name = "handler::mark_delivered", skip(app_state, _admin, path), fields(order_id = %path.as_ref()))]
pub async fn mark_delivered_handler(
  app_state: web::Data<AppState>,
  _admin: AdminUser,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let order = app_state.engine.mark_delivered(path.into_inner(), Utc::now()).await?;
  Ok(HttpResponse::Ok().json(order))
}

#[instrument(name = "handler::update_order_status", skip(app_state, _admin, path, payload), fields(order_id = %path.as_ref()))]
pub async fn update_order_status_handler(
  app_state: web::Data<AppState>,
  _admin: AdminUser,
  path: web::Path<Uuid>,
  payload: web::Json<StatusUpdatePayload>,
) -> Result<HttpResponse, AppError> {
  let payload = payload.into_inner();
  let status = payload
    .status
    .parse::<OrderStatus>()
    .map_err(|_| GrocerError::Validation(format!("Invalid order status '{}'", payload.status)))?;
  let order = app_state
    .engine
    .update_order_status(path.into_inner(), status, payload.comment.as_deref(), Utc::now())
    .await?;
  Ok(HttpResponse::Ok().json(order))
}
