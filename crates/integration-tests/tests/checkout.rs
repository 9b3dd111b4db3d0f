//! Order placement: stock, totals, payment outcomes and concurrency.

#![allow(clippy::unwrap_used)]

use std::str::FromStr;
use std::time::Duration;

use axum::http::{Method, StatusCode};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::{Value, json};

use stockroom_api::db::{CartStore, OrderStore};
use stockroom_api::models::{OrderScope, Product};
use stockroom_api::services::checkout::CheckoutError;
use stockroom_api::services::payment::FixedPaymentProcessor;
use stockroom_core::{OrderId, OrderStatus, PaymentOutcome};
use stockroom_integration_tests::{TestApp, send};

fn decimal(value: &Value) -> Decimal {
    Decimal::from_str(value.as_str().unwrap()).unwrap()
}

async fn add(app: &TestApp, token: &str, product: &Product, quantity: i32) {
    let res = app
        .post(
            "/cart/items",
            Some(token),
            json!({"product_id": product.id.as_i32(), "quantity": quantity}),
        )
        .await;
    assert_eq!(res.status, StatusCode::CREATED, "{}", res.text);
}

#[tokio::test]
async fn test_approved_checkout_takes_stock_and_empties_cart() {
    let app = TestApp::approving();
    let (_, token) = app.user("buyer@example.com", false).await;
    let lighting = app.category("Lighting").await;
    let lamp = app.product(&lighting, "Lamp", dec!(10.00), 5).await;
    let bulb = app.product(&lighting, "Bulb", dec!(2.50), 10).await;
    add(&app, &token, &lamp, 2).await;
    add(&app, &token, &bulb, 4).await;

    let res = app.post("/orders/", Some(&token), json!({})).await;
    assert_eq!(res.status, StatusCode::CREATED, "{}", res.text);
    assert_eq!(res.json["status"], "PAID");
    assert_eq!(decimal(&res.json["total"]), dec!(30.00));
    assert_eq!(res.json["items"].as_array().unwrap().len(), 2);

    assert_eq!(app.stock(&lamp).await, 3);
    assert_eq!(app.stock(&bulb).await, 6);
    assert_eq!(app.get("/cart/", Some(&token)).await.json, json!([]));
    assert_eq!(app.payments.charges(), 1);

    let order_id = OrderId::new(i32::try_from(res.json["id"].as_i64().unwrap()).unwrap());
    let logs = app.store.payment_logs(order_id).await.unwrap();
    assert_eq!(logs.len(), 1);
    assert!(logs.first().unwrap().success);
}

#[tokio::test]
async fn test_declined_payment_keeps_stock_and_cart() {
    let app = TestApp::new(FixedPaymentProcessor::declining());
    let (user, token) = app.user("buyer@example.com", false).await;
    let lighting = app.category("Lighting").await;
    let lamp = app.product(&lighting, "Lamp", dec!(10.00), 5).await;
    add(&app, &token, &lamp, 2).await;

    let res = app.post("/orders/", Some(&token), json!({})).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.detail(), "Payment failed. Please try again.");

    assert_eq!(app.stock(&lamp).await, 5);
    let cart = app.store.cart_for_user(user.id).await.unwrap().unwrap();
    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.items.first().unwrap().quantity.get(), 2);

    let orders = app.store.list_orders(OrderScope::User(user.id)).await.unwrap();
    assert_eq!(orders.len(), 1);
    let failed = orders.first().unwrap();
    assert_eq!(failed.order.status, OrderStatus::Failed);
    assert_eq!(failed.order.total, dec!(20.00));

    let logs = app.store.payment_logs(failed.order.id).await.unwrap();
    assert_eq!(logs.len(), 1);
    assert!(!logs.first().unwrap().success);
}

#[tokio::test]
async fn test_retry_after_decline_is_a_new_attempt() {
    let app = TestApp::new(FixedPaymentProcessor::declining());
    let (user, token) = app.user("buyer@example.com", false).await;
    let lighting = app.category("Lighting").await;
    let lamp = app.product(&lighting, "Lamp", dec!(10.00), 1).await;
    add(&app, &token, &lamp, 1).await;

    for _ in 0..2 {
        let res = app.post("/orders/", Some(&token), json!({})).await;
        assert_eq!(res.status, StatusCode::BAD_REQUEST);
    }

    assert_eq!(app.payments.charges(), 2);
    assert_eq!(app.stock(&lamp).await, 1);
    let orders = app.store.list_orders(OrderScope::User(user.id)).await.unwrap();
    assert!(orders.iter().all(|o| o.order.status == OrderStatus::Failed));
    assert_eq!(orders.len(), 2);
}

#[tokio::test]
async fn test_slow_processor_times_out() {
    let app = TestApp::with_timeout(
        FixedPaymentProcessor::approving().with_delay(Duration::from_millis(500)),
        Duration::from_millis(20),
    );
    let (user, token) = app.user("buyer@example.com", false).await;
    let lighting = app.category("Lighting").await;
    let lamp = app.product(&lighting, "Lamp", dec!(10.00), 5).await;
    add(&app, &token, &lamp, 1).await;

    let err = app.state.checkout().create_order(&user).await.unwrap_err();
    let CheckoutError::PaymentFailed { order_id, outcome } = err else {
        panic!("expected payment failure, got {err:?}");
    };
    assert_eq!(outcome, PaymentOutcome::TimedOut);

    let order = app.store.order(order_id).await.unwrap().unwrap();
    assert_eq!(order.order.status, OrderStatus::Failed);
    assert_eq!(app.stock(&lamp).await, 5);
}

#[tokio::test]
async fn test_empty_or_missing_cart_creates_no_order() {
    let app = TestApp::approving();
    let (user, token) = app.user("buyer@example.com", false).await;

    let res = app.post("/orders/", Some(&token), json!({})).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.detail(), "Cart is empty");

    // A cart that exists but has had its only item removed.
    let lighting = app.category("Lighting").await;
    let lamp = app.product(&lighting, "Lamp", dec!(10.00), 5).await;
    add(&app, &token, &lamp, 1).await;
    let item = app.store.cart_for_user(user.id).await.unwrap().unwrap();
    let item_id = item.items.first().unwrap().id;
    app.delete(&format!("/cart/items/{item_id}"), Some(&token)).await;

    let res = app.post("/orders/", Some(&token), json!({})).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.detail(), "Cart is empty");

    assert!(app.store.list_orders(OrderScope::All).await.unwrap().is_empty());
    assert_eq!(app.payments.charges(), 0);
}

#[tokio::test]
async fn test_insufficient_stock_changes_nothing() {
    let app = TestApp::approving();
    let (user, token) = app.user("buyer@example.com", false).await;
    let (_, admin) = app.user("ops@example.com", true).await;
    let lighting = app.category("Lighting").await;
    let lamp = app.product(&lighting, "Lamp", dec!(10.00), 3).await;
    let bulb = app.product(&lighting, "Bulb", dec!(1.00), 3).await;
    add(&app, &token, &bulb, 1).await;
    add(&app, &token, &lamp, 3).await;

    // Stock drops after the item went into the cart.
    let res = app
        .put(&format!("/products/{}", lamp.id), Some(&admin), Some(json!({"stock": 2})))
        .await;
    assert_eq!(res.status, StatusCode::OK);

    let res = app.post("/orders/", Some(&token), json!({})).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.detail(), "Insufficient stock for Lamp");

    assert_eq!(app.stock(&lamp).await, 2);
    assert_eq!(app.stock(&bulb).await, 3);
    assert_eq!(app.store.cart_for_user(user.id).await.unwrap().unwrap().items.len(), 2);
    assert!(app.store.list_orders(OrderScope::All).await.unwrap().is_empty());
    assert_eq!(app.payments.charges(), 0);
}

#[tokio::test]
async fn test_order_total_beyond_storable_amount_is_rejected() {
    let app = TestApp::approving();
    let (user, token) = app.user("buyer@example.com", false).await;
    let vaults = app.category("Vaults").await;
    let vault = app.product(&vaults, "Vault", dec!(9999999999.99), 5).await;
    add(&app, &token, &vault, 2).await;

    let res = app.post("/orders/", Some(&token), json!({})).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.detail(), "Order total is too large");

    assert_eq!(app.stock(&vault).await, 5);
    assert_eq!(app.store.cart_for_user(user.id).await.unwrap().unwrap().items.len(), 1);
    assert!(app.store.list_orders(OrderScope::All).await.unwrap().is_empty());
    assert_eq!(app.payments.charges(), 0);
}

#[tokio::test]
async fn test_order_keeps_price_at_checkout() {
    let app = TestApp::approving();
    let (_, token) = app.user("buyer@example.com", false).await;
    let (_, admin) = app.user("ops@example.com", true).await;
    let lighting = app.category("Lighting").await;
    let lamp = app.product(&lighting, "Lamp", dec!(10.00), 5).await;
    add(&app, &token, &lamp, 2).await;

    let res = app.post("/orders/", Some(&token), json!({})).await;
    assert_eq!(res.status, StatusCode::CREATED);
    let uri = format!("/orders/{}", res.json["id"]);

    app.put(&format!("/products/{}", lamp.id), Some(&admin), Some(json!({"price": "99.00"})))
        .await;

    let res = app.get(&uri, Some(&token)).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(decimal(&res.json["total"]), dec!(20.00));
    let item = res.json["items"].as_array().unwrap().first().unwrap().clone();
    assert_eq!(decimal(&item["price"]), dec!(10.00));
    assert_eq!(item["quantity"], 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_checkouts_share_last_unit() {
    let app = TestApp::approving();
    let (_, alice) = app.user("alice@example.com", false).await;
    let (_, bob) = app.user("bob@example.com", false).await;
    let lighting = app.category("Lighting").await;
    let lamp = app.product(&lighting, "Lamp", dec!(10.00), 1).await;
    add(&app, &alice, &lamp, 1).await;
    add(&app, &bob, &lamp, 1).await;

    let checkouts: Vec<_> = [alice, bob]
        .into_iter()
        .map(|token| {
            let router = app.router();
            tokio::spawn(async move {
                send(router, Method::POST, "/orders/", Some(&token), None).await
            })
        })
        .collect();

    let mut responses = Vec::new();
    for handle in checkouts {
        responses.push(handle.await.unwrap());
    }

    let mut statuses: Vec<StatusCode> = responses.iter().map(|r| r.status).collect();
    statuses.sort();
    assert_eq!(statuses, [StatusCode::CREATED, StatusCode::BAD_REQUEST]);
    let loser = responses
        .iter()
        .find(|r| r.status == StatusCode::BAD_REQUEST)
        .unwrap();
    assert_eq!(loser.detail(), "Insufficient stock for Lamp");

    assert_eq!(app.stock(&lamp).await, 0);
    assert_eq!(app.payments.charges(), 1);
}
