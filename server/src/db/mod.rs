// storefront_server/src/db/mod.rs

pub mod postgres;
pub mod seed;
