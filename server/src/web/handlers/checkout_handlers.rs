// storefront_server/src/web/handlers/checkout_handlers.rs

use actix_web::{web, HttpResponse};
use storefront::guard::GuardChain;
use storefront::{MessageLevel, ShopError};
use tracing::{error, info, instrument};

use crate::errors::AppError;
use crate::state::AppState;
use crate::web::responses::redirect;
use crate::web::session::Visitor;

pub const CHECKOUT_PATH: &str = "/checkout";

#[instrument(name = "handler::checkout", skip(app_state, visitor))]
pub async fn checkout_handler(app_state: web::Data<AppState>, visitor: Visitor) -> Result<HttpResponse, AppError> {
  if let Some(away) = visitor.guard(&GuardChain::members(), CHECKOUT_PATH) {
    return Ok(away);
  }
  let Some(owner) = visitor.identity.as_ref() else {
    error!("Member guard passed without an identity.");
    return Err(AppError::Internal("checkout without identity".to_string()));
  };

  match app_state.checkout.checkout(&visitor.session, owner).await {
    Ok(receipt) => {
      info!(
        order_id = receipt.order.id,
        total = receipt.total_price(),
        skipped = receipt.skipped.len(),
        "Checkout completed."
      );
      visitor.session.push_message(
        MessageLevel::Success,
        format!("Your order has been placed. Order number: {}.", receipt.order.id),
      );
      Ok(redirect("/"))
    }
    Err(ShopError::EmptyCart) => {
      visitor
        .session
        .push_message(MessageLevel::Warning, "Your cart is empty.");
      Ok(redirect("/cart"))
    }
    Err(other) => Err(other.into()),
  }
}
