// storefront_server/src/web/mod.rs

pub mod handlers;
pub mod responses;
pub mod routes;
pub mod session;

use actix_web::body::MessageBody;
use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::middleware::from_fn;
use actix_web::{web, App};
use tracing_actix_web::TracingLogger;

use crate::errors::AppError;
use crate::state::AppState;
pub use routes::configure_app_routes;
use session::session_middleware;

/// The full application: shared state, session cookies, request tracing and
/// the route table. Used by `main` and by the handler tests.
pub fn build_app(
  state: AppState,
) -> App<
  impl ServiceFactory<
    ServiceRequest,
    Config = (),
    Response = ServiceResponse<impl MessageBody>,
    Error = actix_web::Error,
    InitError = (),
  >,
> {
  App::new()
    .app_data(web::Data::new(state))
    // Unparseable ids are unknown resources; unreadable bodies and queries are bad requests.
    .app_data(web::PathConfig::default().error_handler(|err, req| {
      AppError::NotFound(format!("{} ({})", req.path(), err)).into()
    }))
    .app_data(web::FormConfig::default().error_handler(|err, _req| AppError::BadRequest(err.to_string()).into()))
    .app_data(web::QueryConfig::default().error_handler(|err, _req| AppError::BadRequest(err.to_string()).into()))
    .wrap(from_fn(session_middleware))
    .wrap(TracingLogger::default())
    .configure(configure_app_routes)
}
