// storefront/src/catalog.rs

use crate::error::{ShopError, ShopResult};
use crate::models::{Product, ProductId};
use crate::store::CatalogStore;
use crate::validation::{validate_product, ProductForm, Validated};
use tracing::{info, instrument};

#[instrument(name = "catalog::list_products", skip(catalog))]
pub async fn list_products(catalog: &dyn CatalogStore) -> ShopResult<Vec<Product>> {
  Ok(catalog.list().await?)
}

#[instrument(name = "catalog::product_detail", skip(catalog))]
pub async fn product_detail(catalog: &dyn CatalogStore, id: ProductId) -> ShopResult<Product> {
  catalog
    .find_by_id(id)
    .await?
    .ok_or_else(|| ShopError::NotFound(format!("product {}", id)))
}

/// Validates and stores a new product. Invalid input writes nothing and comes
/// back as `Validated::Invalid`. Access control is the caller's job.
#[instrument(name = "catalog::add_product", skip(catalog, form), fields(name = %form.name))]
pub async fn add_product(catalog: &dyn CatalogStore, form: &ProductForm) -> ShopResult<Validated<Product>> {
  match validate_product(form) {
    Validated::Valid(new_product) => {
      let product = catalog.create(new_product).await?;
      info!(product_id = product.id, price = product.price, "Product added to catalog.");
      Ok(Validated::Valid(product))
    }
    Validated::Invalid(errors) => Ok(Validated::Invalid(errors)),
  }
}
