// storefront_server/src/web/handlers/cart_handlers.rs

use actix_web::{web, HttpRequest, HttpResponse};
use serde_json::json;
use storefront::cart::view_cart;
use storefront::guard::{safe_next, GuardChain};
use storefront::models::ProductId;
use storefront::MessageLevel;
use tracing::{debug, info, instrument};

use crate::errors::AppError;
use crate::state::AppState;
use crate::web::responses::{page, redirect, referer_path};
use crate::web::session::Visitor;

#[instrument(name = "handler::view_cart", skip(app_state, visitor))]
pub async fn view_cart_handler(app_state: web::Data<AppState>, visitor: Visitor) -> Result<HttpResponse, AppError> {
  let cart = visitor.session.cart();
  let view = view_cart(app_state.catalog.as_ref(), &cart).await?;
  Ok(page(
    &visitor,
    "cart",
    json!({ "lines": view.lines, "total_price": view.total_price }),
  ))
}

/// Anonymous visitors are sent to log in and come back to the page they were on.
#[instrument(name = "handler::add_to_cart", skip(req, visitor, path), fields(product_id = %path.as_ref()))]
pub async fn add_to_cart_handler(
  req: HttpRequest,
  visitor: Visitor,
  path: web::Path<ProductId>,
) -> Result<HttpResponse, AppError> {
  let product_id = path.into_inner();
  let back = referer_path(&req);

  if let Some(away) = visitor.guard(&GuardChain::members(), &safe_next(back.as_deref())) {
    debug!("Anonymous add-to-cart; asking for a login.");
    visitor.session.push_message(
      MessageLevel::Info,
      "To add items to the cart, please register or log in.",
    );
    return Ok(away);
  }

  let cart = visitor.session.cart().add(product_id);
  visitor.session.set_cart(&cart)?;
  info!(quantity = cart.quantity(product_id), "Product added to cart.");
  visitor
    .session
    .push_message(MessageLevel::Success, "Product added to your cart.");

  let target = back
    .filter(|path| safe_next(Some(path.as_str())) == *path)
    .unwrap_or_else(|| "/products".to_string());
  Ok(redirect(&target))
}

#[instrument(name = "handler::remove_from_cart", skip(visitor, path), fields(product_id = %path.as_ref()))]
pub async fn remove_from_cart_handler(visitor: Visitor, path: web::Path<ProductId>) -> Result<HttpResponse, AppError> {
  let product_id = path.into_inner();
  let cart = visitor.session.cart();
  if cart.contains(product_id) {
    visitor.session.set_cart(&cart.remove(product_id))?;
    visitor
      .session
      .push_message(MessageLevel::Success, "Product removed from your cart.");
  }
  Ok(redirect("/cart"))
}
