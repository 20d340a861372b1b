//! Checkout and order history.

use axum::http::StatusCode;
use serde_json::json;

use eglys_core::ProductId;
use eglys_integration_tests::{TestApp, assert_error};

#[tokio::test]
async fn test_checkout_records_order_and_clears_cart() {
    let app = TestApp::new();
    let user = app.register("ana@example.com").await;
    app.add_to_cart(user, 1, 2).await;
    app.add_to_cart(user, 4, 1).await;

    let response = app.checkout(user).await;
    assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);
    assert_eq!(response.body["success"], true);
    assert_eq!(response.body["total"], "290000");
    assert_eq!(response.body["cartCleared"], true);
    let order_id = response.body["orderId"].as_i64().unwrap_or_default();

    let cart = app.get(&format!("/cart/{user}")).await;
    assert_eq!(cart.body["items"].as_array().map(Vec::len), Some(0));

    let orders = app.get(&format!("/orders/{user}")).await;
    assert_eq!(orders.status, StatusCode::OK);
    assert_eq!(orders.body.as_array().map(Vec::len), Some(1));
    assert_eq!(orders.body[0]["id"], order_id);
    assert_eq!(orders.body[0]["status"], "confirmed");

    let detail = app.get(&format!("/orders/{user}/{order_id}")).await;
    assert_eq!(detail.status, StatusCode::OK);
    assert_eq!(detail.body["total"], "290000");
    let lines = detail.body["lines"].as_array().cloned().unwrap_or_default();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["productId"], 1);
    assert_eq!(lines[0]["qty"], 2);
    assert_eq!(lines[0]["unitPriceSnapshot"], "30000");
    assert_eq!(lines[0]["subtotal"], "60000");
}

#[tokio::test]
async fn test_checkout_empty_cart() {
    let app = TestApp::new();
    let user = app.register("ana@example.com").await;

    let response = app.checkout(user).await;
    assert_error(&response, StatusCode::BAD_REQUEST, "empty_cart");
    assert_eq!(app.store.order_count().await, 0);
}

#[tokio::test]
async fn test_checkout_twice_only_orders_once() {
    let app = TestApp::new();
    let user = app.register("ana@example.com").await;
    app.add_to_cart(user, 2, 1).await;

    let (first, second) = tokio::join!(app.checkout(user), app.checkout(user));
    let statuses = [first.status, second.status];

    assert!(statuses.contains(&StatusCode::OK));
    assert!(statuses.contains(&StatusCode::BAD_REQUEST));
    assert_eq!(app.store.order_count().await, 1);
}

#[tokio::test]
async fn test_checkout_with_product_gone_from_catalog() {
    let app = TestApp::new();
    let user = app.register("ana@example.com").await;
    app.add_to_cart(user, 6, 1).await;
    app.add_to_cart(user, 1, 1).await;
    app.store.remove_product(ProductId::new(6)).await;

    let response = app.checkout(user).await;
    assert_error(&response, StatusCode::CONFLICT, "product_not_found");

    // Nothing recorded, cart untouched.
    assert_eq!(app.store.order_count().await, 0);
    let cart = app.get(&format!("/cart/{user}")).await;
    assert_eq!(cart.body["items"].as_array().map(Vec::len), Some(2));
}

#[tokio::test]
async fn test_orders_are_scoped_to_user() {
    let app = TestApp::new();
    let ana = app.register("ana@example.com").await;
    let luis = app.register("luis@example.com").await;
    app.add_to_cart(ana, 1, 1).await;
    let order_id = app.checkout(ana).await.body["orderId"]
        .as_i64()
        .unwrap_or_default();

    let response = app.get(&format!("/orders/{luis}")).await;
    assert_eq!(response.body.as_array().map(Vec::len), Some(0));

    let response = app.get(&format!("/orders/{luis}/{order_id}")).await;
    assert_error(&response, StatusCode::NOT_FOUND, "not_found");
}

#[tokio::test]
async fn test_orders_newest_first() {
    let app = TestApp::new();
    let user = app.register("ana@example.com").await;

    app.add_to_cart(user, 1, 1).await;
    let first = app.checkout(user).await.body["orderId"].clone();
    app.add_to_cart(user, 4, 1).await;
    let second = app.checkout(user).await.body["orderId"].clone();

    let orders = app.get(&format!("/orders/{user}")).await;
    assert_eq!(orders.body[0]["id"], second);
    assert_eq!(orders.body[1]["id"], first);
    assert_eq!(orders.body[0]["total"], "230000");
}

#[tokio::test]
async fn test_checkout_rejects_malformed_body() {
    let app = TestApp::new();

    let response = app.post("/checkout", &json!({})).await;
    assert_error(&response, StatusCode::UNPROCESSABLE_ENTITY, "invalid_request");

    let response = app.post("/checkout", &json!({ "userId": "ana" })).await;
    assert_error(&response, StatusCode::UNPROCESSABLE_ENTITY, "invalid_request");
}
