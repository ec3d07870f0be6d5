//! Integration tests for the shop registry and visits.

#![allow(clippy::unwrap_used)]

use reqwest::StatusCode;
use serde_json::json;

use fieldops_integration_tests::{TestContext, json_body};

#[tokio::test]
async fn test_create_and_read_shop() {
    let ctx = TestContext::spawn().await;
    let dist = ctx.register("Dev", "dev@example.com", "Distributor").await;
    let member = ctx.register("Ravi", "ravi@example.com", "Team Member").await;

    let resp = ctx
        .post("/shops", Some(&dist.token))
        .json(&json!({
            "name": "A",
            "contact": "1",
            "address": "X",
            "latitude": 1.0,
            "longitude": 2.0,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let shop = json_body(resp).await;
    assert_eq!(shop["isAssigned"], false);
    assert_eq!(shop["status"], "Open");
    assert_eq!(shop["latitude"], 1.0);
    assert!(shop["lastVisited"].is_null());

    let id = shop["id"].as_i64().unwrap();
    let resp = ctx
        .get(&format!("/shops/{id}"), Some(&member.token))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(json_body(resp).await["name"], "A");

    let resp = ctx.get("/shops", Some(&member.token)).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(json_body(resp).await.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_team_member_cannot_manage_shops() {
    let ctx = TestContext::spawn().await;
    let member = ctx.register("Ravi", "ravi@example.com", "Team Member").await;

    let resp = ctx
        .post("/shops", Some(&member.token))
        .json(&json!({
            "name": "A",
            "contact": "1",
            "address": "X",
            "latitude": 1.0,
            "longitude": 2.0,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_create_shop_validation() {
    let ctx = TestContext::spawn().await;
    let dist = ctx.register("Dev", "dev@example.com", "Distributor").await;

    let resp = ctx
        .post("/shops", Some(&dist.token))
        .json(&json!({ "name": "A", "contact": "1" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        json_body(resp).await["message"],
        "Please enter all required fields"
    );

    let resp = ctx
        .post("/shops", Some(&dist.token))
        .json(&json!({
            "name": "A",
            "contact": "1",
            "address": "X",
            "latitude": 91.0,
            "longitude": 2.0,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = ctx
        .post("/shops", Some(&dist.token))
        .header("content-type", "application/json")
        .body("{\"name\": ")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(json_body(resp).await["message"].is_string());
}

#[tokio::test]
async fn test_update_shop() {
    let ctx = TestContext::spawn().await;
    let dist = ctx.register("Dev", "dev@example.com", "Distributor").await;
    let id = ctx.create_shop(&dist.token, "Corner Store").await;

    let resp = ctx
        .put(&format!("/shops/{id}"), Some(&dist.token))
        .json(&json!({ "remarks": "Back entrance", "status": "Closed" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let shop = json_body(resp).await;
    assert_eq!(shop["remarks"], "Back entrance");
    assert_eq!(shop["status"], "Closed");
    assert_eq!(shop["name"], "Corner Store");

    let resp = ctx
        .put("/shops/999", Some(&dist.token))
        .json(&json!({ "remarks": "x" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(json_body(resp).await["message"], "Shop not found");
}

#[tokio::test]
async fn test_visit_records_outcome() {
    let ctx = TestContext::spawn().await;
    let dist = ctx.register("Dev", "dev@example.com", "Distributor").await;
    let member = ctx.register("Ravi", "ravi@example.com", "Team Member").await;
    let id = ctx.create_shop(&dist.token, "Corner Store").await;

    let resp = ctx
        .put(&format!("/shops/{id}/visit"), Some(&member.token))
        .json(&json!({ "status": "Closed", "visitRemarks": "Shutters down" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let shop = json_body(resp).await;
    assert_eq!(shop["status"], "Closed");
    assert_eq!(shop["visitRemarks"], "Shutters down");
    assert!(shop["lastVisited"].is_string());

    // Visits are for team members only.
    let resp = ctx
        .put(&format!("/shops/{id}/visit"), Some(&dist.token))
        .json(&json!({ "status": "Open" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_delete_shop_is_admin_only() {
    let ctx = TestContext::spawn().await;
    let admin = ctx.register("Root", "root@example.com", "Admin").await;
    let dist = ctx.register("Dev", "dev@example.com", "Distributor").await;
    let id = ctx.create_shop(&dist.token, "Corner Store").await;
    let path = format!("/shops/{id}");

    let resp = ctx.delete(&path, Some(&dist.token)).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = ctx.delete(&path, Some(&admin.token)).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(json_body(resp).await["message"], "Shop removed");

    let resp = ctx.get(&path, Some(&admin.token)).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = ctx.delete(&path, Some(&admin.token)).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_malformed_shop_id() {
    let ctx = TestContext::spawn().await;
    let member = ctx.register("Ravi", "ravi@example.com", "Team Member").await;

    let resp = ctx.get("/shops/abc", Some(&member.token)).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}
