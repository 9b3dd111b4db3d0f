//! Order listing and visibility.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use rust_decimal_macros::dec;
use serde_json::{Value, json};

use stockroom_integration_tests::TestApp;

/// Place an order of one lamp for `token` and return its ID.
async fn place_order(app: &TestApp, token: &str, product_id: i32) -> Value {
    let res = app
        .post(
            "/cart/items",
            Some(token),
            json!({"product_id": product_id, "quantity": 1}),
        )
        .await;
    assert_eq!(res.status, StatusCode::CREATED);
    let res = app.post("/orders/", Some(token), json!({})).await;
    assert_eq!(res.status, StatusCode::CREATED);
    res.json["id"].clone()
}

#[tokio::test]
async fn test_orders_require_auth() {
    let app = TestApp::approving();
    assert_eq!(app.get("/orders/", None).await.status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        app.post("/orders/", None, json!({})).await.status,
        StatusCode::UNAUTHORIZED
    );
}

#[tokio::test]
async fn test_users_see_own_orders_and_admins_see_all() {
    let app = TestApp::approving();
    let (_, alice) = app.user("alice@example.com", false).await;
    let (_, bob) = app.user("bob@example.com", false).await;
    let (_, admin) = app.user("ops@example.com", true).await;
    let lighting = app.category("Lighting").await;
    let lamp = app.product(&lighting, "Lamp", dec!(10.00), 10).await;

    let first = place_order(&app, &alice, lamp.id.as_i32()).await;
    let second = place_order(&app, &alice, lamp.id.as_i32()).await;

    let res = app.get("/orders/", Some(&alice)).await;
    let ids: Vec<Value> = res
        .json
        .as_array()
        .unwrap()
        .iter()
        .map(|o| o["id"].clone())
        .collect();
    assert_eq!(ids, [second, first], "newest first");

    let res = app.get("/orders/", Some(&bob)).await;
    assert_eq!(res.json, json!([]));

    let res = app.get("/orders/", Some(&admin)).await;
    assert_eq!(res.json.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_order_detail_visibility() {
    let app = TestApp::approving();
    let (_, alice) = app.user("alice@example.com", false).await;
    let (_, bob) = app.user("bob@example.com", false).await;
    let (_, admin) = app.user("ops@example.com", true).await;
    let lighting = app.category("Lighting").await;
    let lamp = app.product(&lighting, "Lamp", dec!(10.00), 10).await;

    let id = place_order(&app, &alice, lamp.id.as_i32()).await;
    let uri = format!("/orders/{id}");

    let res = app.get(&uri, Some(&alice)).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json["status"], "PAID");

    let res = app.get(&uri, Some(&bob)).await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);
    assert_eq!(res.detail(), "Not authorized");

    let res = app.get(&uri, Some(&admin)).await;
    assert_eq!(res.status, StatusCode::OK);

    let res = app.get("/orders/999", Some(&admin)).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert_eq!(res.detail(), "Order not found");
}
