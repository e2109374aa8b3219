// storefront_server/src/web/routes.rs

use actix_web::{web, HttpResponse};

use super::handlers::{auth_handlers, cart_handlers, checkout_handlers, product_handlers};

async fn health_check_handler() -> HttpResponse {
  HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

pub fn configure_app_routes(cfg: &mut web::ServiceConfig) {
  cfg
    .route("/health", web::get().to(health_check_handler))
    .route("/", web::get().to(product_handlers::home_handler))
    // Catalog. `/products/add` must be registered before `/products/{id}`.
    .service(
      web::scope("/products")
        .route("", web::get().to(product_handlers::list_products_handler))
        .service(
          web::resource("/add")
            .route(web::get().to(product_handlers::add_product_form_handler))
            .route(web::post().to(product_handlers::add_product_handler)),
        )
        .route("/{product_id}", web::get().to(product_handlers::product_detail_handler)),
    )
    // Identity
    .service(
      web::resource("/register")
        .route(web::get().to(auth_handlers::register_form_handler))
        .route(web::post().to(auth_handlers::register_handler)),
    )
    .service(
      web::resource("/login")
        .route(web::get().to(auth_handlers::login_form_handler))
        .route(web::post().to(auth_handlers::login_handler)),
    )
    .service(
      web::resource("/logout")
        .route(web::get().to(auth_handlers::logout_handler))
        .route(web::post().to(auth_handlers::logout_handler)),
    )
    // Cart
    .service(
      web::scope("/cart")
        .route("", web::get().to(cart_handlers::view_cart_handler))
        .service(
          web::resource("/add/{product_id}")
            .route(web::get().to(cart_handlers::add_to_cart_handler))
            .route(web::post().to(cart_handlers::add_to_cart_handler)),
        )
        .service(
          web::resource("/remove/{product_id}")
            .route(web::get().to(cart_handlers::remove_from_cart_handler))
            .route(web::post().to(cart_handlers::remove_from_cart_handler)),
        ),
    )
    .service(
      web::resource(checkout_handlers::CHECKOUT_PATH)
        .route(web::get().to(checkout_handlers::checkout_handler))
        .route(web::post().to(checkout_handlers::checkout_handler)),
    );
}

#[cfg(test)]
mod tests {
  use crate::web::handlers::test_support::*;
  use actix_web::http::StatusCode;
  use actix_web::test;

  #[actix_web::test]
  async fn health_check_answers_ok() {
    let app = test::init_service(app(memory_state())).await;
    let res = test::call_service(&app, test::TestRequest::get().uri("/health").to_request()).await;
    assert_eq!(res.status(), StatusCode::OK);
  }

  #[actix_web::test]
  async fn first_visit_sets_session_cookie() {
    let app = test::init_service(app(memory_state())).await;
    let res = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
    let cookie = res
      .response()
      .cookies()
      .find(|c| c.name() == crate::config::DEFAULT_SESSION_COOKIE);
    assert!(cookie.is_some_and(|c| c.http_only() == Some(true)));
  }
}
