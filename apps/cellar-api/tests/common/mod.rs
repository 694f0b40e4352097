#![allow(dead_code)]

use axum::http::StatusCode;
use axum_test::TestServer;
use cellar_api::{AppState, create_app};
use serde_json::{Value, json};

pub fn server() -> TestServer {
    TestServer::new(create_app(AppState::in_memory())).expect("build test server")
}

pub async fn create_restaurant(server: &TestServer, name: &str, email: &str) -> i64 {
    create_restaurant_with(server, json!({ "name": name, "email": email })).await
}

pub async fn create_restaurant_with(server: &TestServer, body: Value) -> i64 {
    let res = server.post("/api/restaurants").json(&body).await;
    res.assert_status(StatusCode::CREATED);
    res.json::<Value>()["id"].as_i64().expect("restaurant id")
}

pub async fn create_wine(
    server: &TestServer,
    restaurant_id: i64,
    name: &str,
    wine_type: &str,
    price: &str,
    stock: i32,
) -> i64 {
    let res = server
        .post("/api/wines")
        .json(&json!({
            "restaurantId": restaurant_id,
            "name": name,
            "type": wine_type,
            "price": price,
            "stockQuantity": stock,
        }))
        .await;
    res.assert_status(StatusCode::CREATED);
    res.json::<Value>()["id"].as_i64().expect("wine id")
}

pub async fn record_sale(
    server: &TestServer,
    restaurant_id: i64,
    wine_id: i64,
    quantity: i32,
) -> Value {
    let res = server
        .post("/api/sales")
        .json(&json!({
            "restaurantId": restaurant_id,
            "wineId": wine_id,
            "quantity": quantity,
        }))
        .await;
    res.assert_status(StatusCode::CREATED);
    res.json::<Value>()
}
