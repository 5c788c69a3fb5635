// grocer_server/src/web/handlers/subscription_handlers.rs

use actix_web::{web, HttpResponse};
use chrono::Utc;
use grocer::{NewSubscription, Subscription, SubscriptionUpdate};
use serde::Serialize;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::AppError;
use crate::state::AppState;
use crate::web::auth::{AdminUser, AuthenticatedUser};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdatedSubscription<'a> {
  #[serde(flatten)]
  subscription: &'a Subscription,
  cancelled_orders: &'a [Uuid],
}

#[instrument(name = "handler::create_subscription", skip(app_state, auth_user, payload), fields(user_id = %auth_user.caller.user_id))]
pub async fn create_subscription_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  payload: web::Json<NewSubscription>,
) -> Result<HttpResponse, AppError> {
  let subscription = app_state
    .engine
    .create_subscription(&auth_user.caller, payload.into_inner(), Utc::now())
    .await?;
  info!(subscription_id = %subscription.id, "Subscription created.");
  Ok(HttpResponse::Created().json(subscription))
}

#[instrument(name = "handler::my_subscriptions", skip(app_state, auth_user), fields(user_id = %auth_user.caller.user_id))]
pub async fn my_subscriptions_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let subscriptions = app_state.engine.list_my_subscriptions(&auth_user.caller).await?;
  Ok(HttpResponse::Ok().json(subscriptions))
}

#[instrument(name = "handler::list_subscriptions", skip_all)]
pub async fn list_subscriptions_handler(
  app_state: web::Data<AppState>,
  _admin: AdminUser,
) -> Result<HttpResponse, AppError> {
  let subscriptions = app_state.engine.list_subscriptions().await?;
  Ok(HttpResponse::Ok().json(subscriptions))
}

#[instrument(
  name = "handler::update_subscription",
  skip(app_state, auth_user, path, payload),
  fields(user_id = %auth_user.caller.user_id, subscription_id = %path.as_ref())
)]
pub async fn update_subscription_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  path: web::Path<Uuid>,
  payload: web::Json<SubscriptionUpdate>,
) -> Result<HttpResponse, AppError> {
  let outcome = app_state
    .engine
    .update_subscription(&auth_user.caller, path.into_inner(), payload.into_inner(), Utc::now())
    .await?;
  if !outcome.cancelled_orders.is_empty() {
    info!(cancelled = outcome.cancelled_orders.len(), "Subscription cancellation cancelled linked orders.");
  }
  Ok(HttpResponse::Ok().json(UpdatedSubscription {
    subscription: &outcome.subscription,
    cancelled_orders: &outcome.cancelled_orders,
  }))
}
