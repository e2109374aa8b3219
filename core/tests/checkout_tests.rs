// tests/checkout_tests.rs
mod common;

use common::*;
use serde_json::json;
use std::sync::Arc;
use storefront::models::OrderStatus;
use storefront::session::CART_KEY;
use storefront::store::memory::MemoryOrders;
use storefront::store::{CatalogStore, OrderStore};
use storefront::{Cart, SessionStore, ShopError};

#[tokio::test]
async fn test_checkout_scenario_single_line() {
  setup_tracing();
  let shop = TestShop::new();
  shop.stock(&[product(7, "Teapot", 50)]);
  let member = shop.member("alice").await;
  let session = shop.session("sess-a");
  shop.sessions.set("sess-a", CART_KEY, json!({ "7": 3 }));

  let receipt = shop.checkout.checkout(&session, &member).await.unwrap();

  assert_eq!(receipt.order.status, OrderStatus::Pending);
  assert_eq!(receipt.order.user_id, member.user_id);
  assert_eq!(receipt.order.items.len(), 1);
  let item = &receipt.order.items[0];
  assert_eq!((item.product_id, item.quantity, item.price), (7, 3, 50));
  assert_eq!(receipt.total_price(), 150);
  assert!(receipt.skipped.is_empty());
  assert_eq!(shop.sessions.get("sess-a", CART_KEY), Some(json!({})));

  let stored = shop.orders.find_order(receipt.order.id).await.unwrap().unwrap();
  assert_eq!(stored, receipt.order);
}

#[tokio::test]
async fn test_total_is_sum_of_price_times_quantity() {
  setup_tracing();
  let shop = TestShop::new();
  shop.stock(&[product(1, "A", 199), product(2, "B", 5), product(3, "C", 1000)]);
  let member = shop.member("bob").await;
  let session = shop.session("sess-b");
  let cart: Cart = vec![(1, 2), (2, 10), (3, 1)].into_iter().collect();
  session.set_cart(&cart).unwrap();

  let receipt = shop.checkout.checkout(&session, &member).await.unwrap();

  assert_eq!(receipt.order.items.len(), 3);
  assert_eq!(receipt.total_price(), 2 * 199 + 10 * 5 + 1000);
  assert!(session.cart().is_empty());
}

#[tokio::test]
async fn test_empty_cart_creates_no_order() {
  setup_tracing();
  let shop = TestShop::new();
  let member = shop.member("erin").await;
  let session = shop.session("sess-empty");

  let result = shop.checkout.checkout(&session, &member).await;

  assert!(matches!(result, Err(ShopError::EmptyCart)));
  assert_eq!(shop.orders.order_count(), 0);
}

#[tokio::test]
async fn test_order_item_price_is_a_snapshot() {
  setup_tracing();
  let shop = TestShop::new();
  shop.stock(&[product(4, "Lamp", 2500)]);
  let member = shop.member("frank").await;
  let session = shop.session("sess-snap");
  session.set_cart(&Cart::new().add(4)).unwrap();

  let receipt = shop.checkout.checkout(&session, &member).await.unwrap();
  shop.catalog.update_price(4, 9999).await.unwrap();
  shop.catalog.remove(4).await.unwrap();

  let stored = shop.orders.find_order(receipt.order.id).await.unwrap().unwrap();
  assert_eq!(stored.items[0].price, 2500);
  assert_eq!(stored.total_price(), 2500);
}

#[tokio::test]
async fn test_failed_write_rolls_back_and_keeps_cart() {
  setup_tracing();
  let orders = Arc::new(MemoryOrders::new());
  let failing = Arc::new(FailingOrders {
    inner: orders.clone(),
    items_before_failure: 1,
  });
  let shop = TestShop::with_orders(orders, failing);
  shop.stock(&[product(1, "A", 10), product(2, "B", 20)]);
  let member = shop.member("gina").await;
  let session = shop.session("sess-fail");
  let cart = Cart::new().add(1).add(2);
  session.set_cart(&cart).unwrap();

  let result = shop.checkout.checkout(&session, &member).await;

  assert!(matches!(result, Err(ShopError::Store(_))), "got {:?}", result);
  assert_eq!(shop.orders.order_count(), 0);
  assert_eq!(session.cart(), cart);
}

#[tokio::test]
async fn test_stale_entries_are_skipped_and_reported() {
  setup_tracing();
  let shop = TestShop::new();
  shop.stock(&[product(1, "Kept", 40)]);
  let member = shop.member("hank").await;
  let session = shop.session("sess-stale");
  shop.sessions.set("sess-stale", CART_KEY, json!({ "1": 2, "77": 1, "junk": 3 }));

  let receipt = shop.checkout.checkout(&session, &member).await.unwrap();

  assert_eq!(receipt.order.items.len(), 1);
  assert_eq!(receipt.total_price(), 80);
  let mut skipped = receipt.skipped.clone();
  skipped.sort();
  assert_eq!(skipped, vec!["77".to_string(), "junk".to_string()]);
  assert!(session.cart().is_empty());
}

#[tokio::test]
async fn test_only_stale_entries_is_an_empty_cart() {
  setup_tracing();
  let shop = TestShop::new();
  let member = shop.member("ivy").await;
  let session = shop.session("sess-all-stale");
  let cart = Cart::new().add(404);
  session.set_cart(&cart).unwrap();

  let result = shop.checkout.checkout(&session, &member).await;

  assert!(matches!(result, Err(ShopError::EmptyCart)));
  assert_eq!(shop.orders.order_count(), 0);
  assert_eq!(session.cart(), cart);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_checkouts_create_one_order() {
  setup_tracing();
  let shop = Arc::new(TestShop::new());
  shop.stock(&[product(7, "Teapot", 50)]);
  let member = shop.member("jack").await;
  shop.session("sess-race").set_cart(&Cart::new().add(7).add(7)).unwrap();

  let mut tasks = Vec::new();
  for _ in 0..8 {
    let shop = shop.clone();
    let member = member.clone();
    tasks.push(tokio::spawn(async move {
      let session = shop.session("sess-race");
      shop.checkout.checkout(&session, &member).await
    }));
  }

  let mut placed = 0;
  let mut empty = 0;
  for task in tasks {
    match task.await.unwrap() {
      Ok(_) => placed += 1,
      Err(ShopError::EmptyCart) => empty += 1,
      Err(other) => panic!("unexpected checkout error: {:?}", other),
    }
  }

  assert_eq!(placed, 1);
  assert_eq!(empty, 7);
  assert_eq!(shop.orders.order_count(), 1);
  assert_eq!(shop.checkout.locks().tracked_sessions(), 0);
}

#[tokio::test]
async fn test_orders_for_user_and_status_update() {
  setup_tracing();
  let shop = TestShop::new();
  shop.stock(&[product(1, "A", 10)]);
  let member = shop.member("kim").await;
  let session = shop.session("sess-hist");

  session.set_cart(&Cart::new().add(1)).unwrap();
  let first = shop.checkout.checkout(&session, &member).await.unwrap();
  session.set_cart(&Cart::new().add(1).add(1)).unwrap();
  let second = shop.checkout.checkout(&session, &member).await.unwrap();

  let history = shop.orders.orders_for_user(member.user_id).await.unwrap();
  let ids: Vec<_> = history.iter().map(|o| o.id).collect();
  assert_eq!(ids, vec![second.order.id, first.order.id]);

  let shipped = shop.orders.set_status(first.order.id, OrderStatus::Shipped).await.unwrap();
  assert_eq!(shipped.status, OrderStatus::Shipped);
  assert_eq!(shipped.items, first.order.items);
}
