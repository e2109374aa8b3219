// storefront_server/src/web/handlers/mod.rs

pub mod auth_handlers;
pub mod cart_handlers;
pub mod checkout_handlers;
pub mod product_handlers;

#[cfg(test)]
pub(crate) mod test_support;
