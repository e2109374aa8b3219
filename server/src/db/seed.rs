// storefront_server/src/db/seed.rs

use crate::state::AppState;
use storefront::models::NewProduct;
use storefront::{ShopError, StoreError};
use tracing::{info, warn};

fn demo_products() -> Vec<NewProduct> {
  [
    ("Ceramic Teapot", "A 1.2 litre stoneware teapot with a bamboo handle.", 4500),
    ("Loose Leaf Sampler", "Six 50 g tins of green, black and oolong tea.", 2800),
    ("Double-Wall Glass Mug", "Heat-resistant borosilicate glass, 350 ml.", 1200),
    ("Cast Iron Kettle", "Enamelled interior, suitable for all hobs.", 7900),
  ]
  .into_iter()
  .map(|(name, description, price)| NewProduct {
    name: name.to_string(),
    description: description.to_string(),
    price,
  })
  .collect()
}

/// Fills an empty catalog with demo products and makes sure the configured
/// staff account exists.
pub async fn seed_demo_data(state: &AppState) -> anyhow::Result<()> {
  if state.catalog.list().await?.is_empty() {
    for product in demo_products() {
      state.catalog.create(product).await?;
    }
    info!("Seeded demo products.");
  } else {
    info!("Catalog already has products; skipping product seed.");
  }

  if let Some(staff) = &state.config.staff_account {
    match state
      .accounts
      .ensure_staff(&staff.username, &staff.email, &staff.password)
      .await
    {
      Ok(user) => info!(user_id = user.id, username = %user.username, "Staff account ready."),
      Err(ShopError::Store(StoreError::Conflict(reason))) => {
        warn!(%reason, "No staff account was seeded.");
      }
      Err(other) => return Err(other.into()),
    }
  }
  Ok(())
}
