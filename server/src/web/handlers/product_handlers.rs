// storefront_server/src/web/handlers/product_handlers.rs

use actix_web::{web, HttpResponse};
use serde_json::json;
use storefront::catalog;
use storefront::guard::GuardChain;
use storefront::validation::{FieldErrors, ProductForm, Validated};
use storefront::MessageLevel;
use tracing::{info, instrument, warn};

use crate::errors::AppError;
use crate::state::AppState;
use crate::web::responses::{page, redirect};
use crate::web::session::Visitor;

pub const ADD_PRODUCT_PATH: &str = "/products/add";

async fn render_catalog(app_state: &AppState, visitor: &Visitor, page_name: &str) -> Result<HttpResponse, AppError> {
  let products = catalog::list_products(app_state.catalog.as_ref()).await?;
  info!("Listing {} products.", products.len());
  Ok(page(visitor, page_name, json!({ "products": products })))
}

#[instrument(name = "handler::home", skip(app_state, visitor))]
pub async fn home_handler(app_state: web::Data<AppState>, visitor: Visitor) -> Result<HttpResponse, AppError> {
  render_catalog(&app_state, &visitor, "home").await
}

#[instrument(name = "handler::list_products", skip(app_state, visitor))]
pub async fn list_products_handler(
  app_state: web::Data<AppState>,
  visitor: Visitor,
) -> Result<HttpResponse, AppError> {
  render_catalog(&app_state, &visitor, "products").await
}

#[instrument(name = "handler::product_detail", skip(app_state, visitor, path), fields(product_id = %path.as_ref()))]
pub async fn product_detail_handler(
  app_state: web::Data<AppState>,
  visitor: Visitor,
  path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
  let product_id = path.into_inner();
  let product = catalog::product_detail(app_state.catalog.as_ref(), product_id).await?;
  Ok(page(&visitor, "product_detail", json!({ "product": product })))
}

fn render_product_form(visitor: &Visitor, form: &ProductForm, errors: &FieldErrors) -> HttpResponse {
  page(visitor, "add_product", json!({ "form": form, "errors": errors }))
}

#[instrument(name = "handler::add_product_form", skip(visitor))]
pub async fn add_product_form_handler(visitor: Visitor) -> Result<HttpResponse, AppError> {
  if let Some(denied) = visitor.guard(&GuardChain::staff(), ADD_PRODUCT_PATH) {
    return Ok(denied);
  }
  Ok(render_product_form(&visitor, &ProductForm::default(), &FieldErrors::new()))
}

#[instrument(name = "handler::add_product", skip(app_state, visitor, form))]
pub async fn add_product_handler(
  app_state: web::Data<AppState>,
  visitor: Visitor,
  form: web::Form<ProductForm>,
) -> Result<HttpResponse, AppError> {
  if let Some(denied) = visitor.guard(&GuardChain::staff(), ADD_PRODUCT_PATH) {
    warn!("Add product refused for a non-staff visitor.");
    return Ok(denied);
  }

  let form = form.into_inner();
  match catalog::add_product(app_state.catalog.as_ref(), &form).await? {
    Validated::Valid(product) => {
      visitor
        .session
        .push_message(MessageLevel::Success, format!("Product \"{}\" was added.", product.name));
      Ok(redirect("/"))
    }
    Validated::Invalid(errors) => Ok(render_product_form(&visitor, &form, &errors)),
  }
}
