//! Categories and products.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use rust_decimal_macros::dec;
use serde_json::json;

use stockroom_integration_tests::TestApp;

#[tokio::test]
async fn test_category_create_and_list() {
    let app = TestApp::approving();
    let (_, user) = app.user("buyer@example.com", false).await;
    let (_, admin) = app.user("ops@example.com", true).await;

    let res = app.post("/categories/", Some(&user), json!({"name": "Lighting"})).await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);

    let res = app.post("/categories/", Some(&admin), json!({"name": "Lighting"})).await;
    assert_eq!(res.status, StatusCode::CREATED);
    assert_eq!(res.json["name"], "Lighting");

    let res = app.post("/categories/", Some(&admin), json!({"name": "Lighting"})).await;
    assert_eq!(res.status, StatusCode::CONFLICT);

    let res = app.get("/categories/", None).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_product_create_requires_known_category() {
    let app = TestApp::approving();
    let (_, admin) = app.user("ops@example.com", true).await;
    let lighting = app.category("Lighting").await;

    let res = app
        .post(
            "/products/",
            Some(&admin),
            json!({"name": "Lamp", "price": "12.50", "stock": 3, "category_id": 999}),
        )
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.detail(), "Invalid category");

    let res = app
        .post(
            "/products/",
            Some(&admin),
            json!({
                "name": "Lamp",
                "description": "Brass",
                "price": "12.50",
                "stock": 3,
                "category_id": lighting.id.as_i32(),
            }),
        )
        .await;
    assert_eq!(res.status, StatusCode::CREATED);
    assert_eq!(res.json["name"], "Lamp");
    assert_eq!(res.json["price"], "12.50");
    assert_eq!(res.json["category"]["name"], "Lighting");

    let id = res.json["id"].as_i64().unwrap();
    let res = app.get(&format!("/products/{id}"), None).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json["description"], "Brass");
}

#[tokio::test]
async fn test_product_price_must_fit_storage() {
    let app = TestApp::approving();
    let (_, admin) = app.user("ops@example.com", true).await;
    let lighting = app.category("Lighting").await;

    for price in ["79228162514264337593543950335", "10000000000.00", "1.005"] {
        let res = app
            .post(
                "/products/",
                Some(&admin),
                json!({
                    "name": "Lamp",
                    "price": price,
                    "stock": 1,
                    "category_id": lighting.id.as_i32(),
                }),
            )
            .await;
        assert_eq!(res.status, StatusCode::UNPROCESSABLE_ENTITY, "price {price}");
    }
    assert_eq!(app.get("/products/", None).await.json, json!([]));

    let lamp = app.product(&lighting, "Lamp", dec!(10.00), 1).await;
    let res = app
        .put(
            &format!("/products/{}", lamp.id),
            Some(&admin),
            Some(json!({"price": "10000000000.00"})),
        )
        .await;
    assert_eq!(res.status, StatusCode::UNPROCESSABLE_ENTITY);
    let res = app.get(&format!("/products/{}", lamp.id), None).await;
    assert_eq!(res.json["price"], "10.00");
}

#[tokio::test]
async fn test_product_writes_are_admin_only() {
    let app = TestApp::approving();
    let (_, user) = app.user("buyer@example.com", false).await;
    let lighting = app.category("Lighting").await;
    let lamp = app.product(&lighting, "Lamp", dec!(10.00), 1).await;

    let res = app
        .post(
            "/products/",
            Some(&user),
            json!({"name": "X", "price": "1.00", "stock": 1, "category_id": lighting.id.as_i32()}),
        )
        .await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);

    let uri = format!("/products/{}", lamp.id);
    let res = app.put(&uri, Some(&user), Some(json!({"stock": 9}))).await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);

    let res = app.delete(&uri, None).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(app.stock(&lamp).await, 1);
}

#[tokio::test]
async fn test_product_not_found() {
    let app = TestApp::approving();
    let (_, admin) = app.user("ops@example.com", true).await;

    let res = app.get("/products/999", None).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert_eq!(res.detail(), "Product not found");

    let res = app.put("/products/999", Some(&admin), Some(json!({"stock": 1}))).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);

    let res = app.delete("/products/999", Some(&admin)).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_product_list_filters_and_pages() {
    let app = TestApp::approving();
    let lighting = app.category("Lighting").await;
    let paper = app.category("Paper").await;
    for n in 0..3 {
        app.product(&lighting, &format!("Lamp {n}"), dec!(10.00), 1).await;
    }
    app.product(&paper, "Notebook", dec!(4.00), 10).await;

    let res = app.get("/products/", None).await;
    assert_eq!(res.json.as_array().unwrap().len(), 4);

    let res = app.get("/products/?category=Lighting", None).await;
    let names: Vec<&str> = res
        .json
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["Lamp 0", "Lamp 1", "Lamp 2"]);

    let res = app.get("/products/?category=Lighting&skip=1&limit=1", None).await;
    let page = res.json.as_array().unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(page.first().unwrap()["name"], "Lamp 1");

    let res = app.get("/products/?category=Garden", None).await;
    assert_eq!(res.status, StatusCode::OK);
    assert!(res.json.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_product_partial_update() {
    let app = TestApp::approving();
    let (_, admin) = app.user("ops@example.com", true).await;
    let lighting = app.category("Lighting").await;
    let paper = app.category("Paper").await;
    let lamp = app.product(&lighting, "Lamp", dec!(10.00), 1).await;
    let uri = format!("/products/{}", lamp.id);

    let res = app
        .put(&uri, Some(&admin), Some(json!({"price": "11.00", "stock": 7})))
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json["price"], "11.00");
    assert_eq!(res.json["stock"], 7);
    assert_eq!(res.json["name"], "Lamp");

    let res = app.put(&uri, Some(&admin), Some(json!({"category_id": 999}))).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.detail(), "Invalid category");

    let res = app
        .put(&uri, Some(&admin), Some(json!({"category_id": paper.id.as_i32()})))
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json["category"]["name"], "Paper");

    let res = app.put(&uri, Some(&admin), Some(json!({"stock": -1}))).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(app.stock(&lamp).await, 7);
}

#[tokio::test]
async fn test_product_delete() {
    let app = TestApp::approving();
    let (_, admin) = app.user("ops@example.com", true).await;
    let lighting = app.category("Lighting").await;
    let lamp = app.product(&lighting, "Lamp", dec!(10.00), 1).await;
    let uri = format!("/products/{}", lamp.id);

    let res = app.delete(&uri, Some(&admin)).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.detail(), "Product deleted");

    let res = app.get(&uri, None).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_ordered_product_cannot_be_deleted() {
    let app = TestApp::approving();
    let (_, admin) = app.user("ops@example.com", true).await;
    let (_, buyer) = app.user("buyer@example.com", false).await;
    let lighting = app.category("Lighting").await;
    let lamp = app.product(&lighting, "Lamp", dec!(10.00), 2).await;

    app.post(
        "/cart/items",
        Some(&buyer),
        json!({"product_id": lamp.id.as_i32(), "quantity": 1}),
    )
    .await;
    let res = app.post("/orders/", Some(&buyer), json!({})).await;
    assert_eq!(res.status, StatusCode::CREATED);

    let res = app.delete(&format!("/products/{}", lamp.id), Some(&admin)).await;
    assert_eq!(res.status, StatusCode::CONFLICT);
    assert_eq!(app.stock(&lamp).await, 1);
}
