//! Integration tests for accounts, bearer tokens and the role gate.

#![allow(clippy::unwrap_used)]

use reqwest::StatusCode;
use serde_json::json;

use fieldops_integration_tests::{PASSWORD, TestContext, json_body};

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn test_health_endpoints() {
    let ctx = TestContext::spawn().await;

    let resp = ctx.get("/health", None).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.text().await.unwrap(), "ok");

    let resp = ctx.get("/health/ready", None).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_responses_carry_request_id() {
    let ctx = TestContext::spawn().await;

    let resp = ctx
        .get("/health", None)
        .header("x-request-id", "trace-me")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.headers()["x-request-id"], "trace-me");

    let resp = ctx.get("/health", None).send().await.unwrap();
    assert!(resp.headers().contains_key("x-request-id"));
}

// =============================================================================
// Registration and login
// =============================================================================

#[tokio::test]
async fn test_register_defaults_to_team_member() {
    let ctx = TestContext::spawn().await;

    let resp = ctx
        .post("/users/register", None)
        .json(&json!({
            "name": "Asha Rao",
            "email": "Asha@Example.com",
            "password": PASSWORD,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);

    let body = json_body(resp).await;
    assert_eq!(body["name"], "Asha Rao");
    assert_eq!(body["email"], "asha@example.com");
    assert_eq!(body["role"], "Team Member");
    assert!(body["token"].as_str().is_some_and(|t| !t.is_empty()));
    assert!(body.get("password").is_none());
}

#[tokio::test]
async fn test_register_rejects_duplicates_and_missing_fields() {
    let ctx = TestContext::spawn().await;
    ctx.register("Asha Rao", "asha@example.com", "Team Member").await;

    let resp = ctx
        .post("/users/register", None)
        .json(&json!({
            "name": "Someone Else",
            "email": "ASHA@example.com",
            "password": PASSWORD,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(resp).await["message"], "User already exists");

    let resp = ctx
        .post("/users/register", None)
        .json(&json!({ "email": "ravi@example.com", "password": PASSWORD }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        json_body(resp).await["message"],
        "Please enter all required fields"
    );
}

#[tokio::test]
async fn test_login() {
    let ctx = TestContext::spawn().await;
    let asha = ctx.register("Asha Rao", "asha@example.com", "Distributor").await;

    let resp = ctx
        .post("/users/login", None)
        .json(&json!({ "email": "asha@example.com", "password": PASSWORD }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await;
    assert_eq!(body["id"], asha.id);
    assert_eq!(body["role"], "Distributor");

    for (email, password) in [
        ("asha@example.com", "wrong password"),
        ("nobody@example.com", PASSWORD),
    ] {
        let resp = ctx
            .post("/users/login", None)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json_body(resp).await["message"], "Invalid email or password");
    }
}

// =============================================================================
// Tokens
// =============================================================================

#[tokio::test]
async fn test_profile_requires_token() {
    let ctx = TestContext::spawn().await;
    let asha = ctx.register("Asha Rao", "asha@example.com", "Team Member").await;

    let resp = ctx.get("/users/profile", None).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(resp).await["message"], "Not authorized, no token");

    let resp = ctx
        .get("/users/profile", Some("not.a.token"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(resp).await["message"], "Not authorized, token failed");

    let resp = ctx
        .get("/users/profile", Some(&asha.token))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await;
    assert_eq!(body["id"], asha.id);
    assert_eq!(body["email"], "asha@example.com");
}

#[tokio::test]
async fn test_token_from_another_server_is_rejected() {
    let first = TestContext::spawn().await;
    let second = TestContext::spawn().await;
    let asha = first.register("Asha Rao", "asha@example.com", "Admin").await;

    // Same signing key, but the user does not exist in the second store.
    let resp = second
        .get("/users/profile", Some(&asha.token))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

// =============================================================================
// Role gate
// =============================================================================

#[tokio::test]
async fn test_role_gate_checks_authentication_before_role() {
    let ctx = TestContext::spawn().await;
    let member = ctx.register("Ravi", "ravi@example.com", "Team Member").await;

    // No token: 401 even on a route the caller could never use.
    let resp = ctx.delete("/shops/1", None).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = ctx.delete("/shops/1", Some(&member.token)).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    assert_eq!(
        json_body(resp).await["message"],
        "Forbidden: You do not have the required role to access this resource."
    );
}
