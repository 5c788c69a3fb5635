// grocer_server/src/web/handlers/product_handlers.rs

use actix_web::{web, HttpResponse};
use grocer::GrocerError;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::AppError;
use crate::state::AppState;

#[instrument(name = "handler::list_products", skip(app_state))]
pub async fn list_products_handler(app_state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
  let products = app_state.engine.stores().products.list().await?;
  info!("Fetched {} products.", products.len());
  let views = products.iter().map(|p| p.view()).collect::<Vec<_>>();
  Ok(HttpResponse::Ok().json(views))
}

#[instrument(name = "handler::get_product", skip(app_state, path), fields(product_id = %path.as_ref()))]
pub async fn get_product_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let product_id = path.into_inner();
  let product = app_state
    .engine
    .stores()
    .products
    .get(product_id)
    .await?
    .ok_or_else(|| GrocerError::not_found("Product", product_id))?;
  Ok(HttpResponse::Ok().json(product.view()))
}
