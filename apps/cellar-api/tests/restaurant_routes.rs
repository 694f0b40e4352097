mod common;

use axum::http::StatusCode;
use common::{create_restaurant, create_restaurant_with, create_wine, record_sale, server};
use serde_json::{Value, json};

#[tokio::test]
async fn test_create_restaurant_defaults() {
    let server = server();
    let res = server
        .post("/api/restaurants")
        .json(&json!({
            "name": "  Bella Vista Restaurant ",
            "email": "Restaurant@Demo.com",
            "businessType": "restaurant",
        }))
        .await;
    res.assert_status(StatusCode::CREATED);
    let body: Value = res.json();
    assert_eq!(body["name"], "Bella Vista Restaurant");
    assert_eq!(body["email"], "restaurant@demo.com");
    assert_eq!(body["plan"], "starter");
    assert_eq!(body["isActive"], true);
    assert!(body["createdAt"].is_string());
}

#[tokio::test]
async fn test_explicit_null_plan_is_kept() {
    let server = server();
    let id = create_restaurant_with(
        &server,
        json!({ "name": "Planless", "email": "planless@demo.com", "plan": null }),
    )
    .await;
    let body: Value = server.get(&format!("/api/restaurants/{id}")).await.json();
    assert!(body["plan"].is_null());
}

#[tokio::test]
async fn test_duplicate_email_conflicts() {
    let server = server();
    create_restaurant(&server, "The Wine Cellar", "winecellar@demo.com").await;
    let res = server
        .post("/api/restaurants")
        .json(&json!({ "name": "Copycat", "email": "WINECELLAR@demo.com" }))
        .await;
    res.assert_status(StatusCode::CONFLICT);
    assert!(res.json::<Value>()["error"].is_string());
}

#[tokio::test]
async fn test_invalid_input_is_bad_request() {
    let server = server();
    let res = server
        .post("/api/restaurants")
        .json(&json!({ "name": "", "email": "nobody@demo.com" }))
        .await;
    res.assert_status(StatusCode::BAD_REQUEST);

    let res = server
        .post("/api/restaurants")
        .json(&json!({ "name": "Bad plan", "email": "plan@demo.com", "plan": "platinum" }))
        .await;
    res.assert_status(StatusCode::BAD_REQUEST);

    let res = server
        .post("/api/restaurants")
        .content_type("application/json")
        .bytes("{not json".into())
        .await;
    res.assert_status(StatusCode::BAD_REQUEST);
    assert!(res.json::<Value>()["error"].is_string());
}

#[tokio::test]
async fn test_get_restaurant_includes_available_wines_and_counts() {
    let server = server();
    let id = create_restaurant(&server, "Bella Vista Restaurant", "restaurant@demo.com").await;
    let sancerre = create_wine(&server, id, "Sancerre Loire Valley", "White Wine", "65.00", 24).await;
    let barolo = create_wine(&server, id, "Barolo Brunate 2018", "Red Wine", "120.00", 3).await;
    server
        .put(&format!("/api/wines/{barolo}"))
        .json(&json!({ "isAvailable": false }))
        .await
        .assert_status_ok();
    record_sale(&server, id, sancerre, 2).await;
    server
        .post("/api/menu-views")
        .json(&json!({ "restaurantId": id }))
        .await
        .assert_status(StatusCode::CREATED);

    let res = server.get(&format!("/api/restaurants/{id}")).await;
    res.assert_status_ok();
    let body: Value = res.json();
    assert_eq!(body["name"], "Bella Vista Restaurant");
    let wines = body["wines"].as_array().unwrap();
    assert_eq!(wines.len(), 1);
    assert_eq!(wines[0]["name"], "Sancerre Loire Valley");
    assert_eq!(body["_count"]["wines"], 2);
    assert_eq!(body["_count"]["sales"], 1);
    assert_eq!(body["_count"]["menuViews"], 1);
}

#[tokio::test]
async fn test_list_restaurants_newest_first_with_counts() {
    let server = server();
    let first = create_restaurant(&server, "First", "first@demo.com").await;
    let second = create_restaurant(&server, "Second", "second@demo.com").await;
    create_wine(&server, second, "Opus One 2018", "Red Wine", "380.00", 8).await;

    let body: Value = server.get("/api/restaurants").await.json();
    let list = body.as_array().unwrap();
    assert_eq!(list.len(), 2);
    assert_eq!(list[0]["id"], second);
    assert_eq!(list[0]["wineCount"], 1);
    assert_eq!(list[1]["id"], first);
    assert_eq!(list[1]["saleCount"], 0);
}

#[tokio::test]
async fn test_update_restaurant() {
    let server = server();
    let id = create_restaurant(&server, "Vintage Lounge", "vintage@demo.com").await;
    let res = server
        .put(&format!("/api/restaurants/{id}"))
        .json(&json!({ "isActive": false, "plan": "enterprise" }))
        .await;
    res.assert_status_ok();
    let body: Value = res.json();
    assert_eq!(body["isActive"], false);
    assert_eq!(body["plan"], "enterprise");
    assert_eq!(body["name"], "Vintage Lounge");

    server
        .put("/api/restaurants/999")
        .json(&json!({ "name": "Ghost" }))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_update_restaurant_null_clears_plan() {
    let server = server();
    let id = create_restaurant_with(
        &server,
        json!({ "name": "Urban Wine Bar", "email": "urban@demo.com", "phone": "(555) 456-7890", "plan": "enterprise" }),
    )
    .await;

    let body: Value = server
        .put(&format!("/api/restaurants/{id}"))
        .json(&json!({ "name": "Urban Wine Bar & Kitchen" }))
        .await
        .json();
    assert_eq!(body["plan"], "enterprise");
    assert_eq!(body["phone"], "(555) 456-7890");

    let res = server
        .put(&format!("/api/restaurants/{id}"))
        .json(&json!({ "plan": null, "phone": null }))
        .await;
    res.assert_status_ok();
    let body: Value = res.json();
    assert_eq!(body["plan"], Value::Null);
    assert_eq!(body["phone"], Value::Null);
    assert_eq!(body["name"], "Urban Wine Bar & Kitchen");
}

#[tokio::test]
async fn test_delete_restaurant_cascades() {
    let server = server();
    let id = create_restaurant(&server, "Urban Wine Bar", "urban@demo.com").await;
    let wine = create_wine(&server, id, "Krug Grande Cuvée", "Champagne", "180.00", 15).await;
    record_sale(&server, id, wine, 1).await;

    let res = server.delete(&format!("/api/restaurants/{id}")).await;
    res.assert_status_ok();
    assert_eq!(
        res.json::<Value>()["message"],
        "Restaurant deleted successfully"
    );

    server
        .get(&format!("/api/restaurants/{id}"))
        .await
        .assert_status(StatusCode::NOT_FOUND);
    server
        .get(&format!("/api/wines/{wine}"))
        .await
        .assert_status(StatusCode::NOT_FOUND);
    let sales: Value = server.get("/api/sales").await.json();
    assert_eq!(sales.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_unknown_and_malformed_ids() {
    let server = server();
    let res = server.get("/api/restaurants/42").await;
    res.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(res.json::<Value>()["error"], "Restaurant 42 not found");

    server
        .get("/api/restaurants/abc")
        .await
        .assert_status(StatusCode::BAD_REQUEST);
    server
        .delete("/api/restaurants/42")
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_health() {
    let server = server();
    let res = server.get("/health").await;
    res.assert_status_ok();
    assert_eq!(res.json::<Value>(), json!({ "status": "ok" }));
}
