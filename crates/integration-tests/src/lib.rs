//! Integration tests for Fieldops.
//!
//! Each test spawns the full API router on an ephemeral port over an
//! in-memory store and talks to it with `reqwest`, so no database or running
//! server is needed:
//!
//! ```bash
//! cargo test -p fieldops-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `users` - Registration, login, tokens and the role gate
//! - `shops` - Shop registry and visits
//! - `plans` - Plan creation, my-day, ownership and status changes

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::sync::Arc;

use reqwest::{Client, RequestBuilder, Response};
use secrecy::SecretString;
use serde_json::{Value, json};

use fieldops_api::config::{LogFormat, SentryConfig, StoreConfig};
use fieldops_api::db::MemoryStore;
use fieldops_api::{ApiConfig, AppState};

/// Password used for every account created by the helpers.
pub const PASSWORD: &str = "correct horse battery";

const JWT_SECRET: &str = "k9$Lm2#Qx7!Vb4@Zr8&Wt1*Np6^Hs3%Ef";

fn test_config() -> ApiConfig {
    ApiConfig {
        store: StoreConfig::Memory,
        host: [127, 0, 0, 1].into(),
        port: 0,
        jwt_secret: SecretString::from(JWT_SECRET),
        token_ttl: chrono::Duration::days(30),
        log_format: LogFormat::Text,
        sentry: SentryConfig::default(),
    }
}

/// A registered account.
#[derive(Debug, Clone)]
pub struct Account {
    pub id: i64,
    pub token: String,
}

/// A server on an ephemeral port plus a client pointed at it.
pub struct TestContext {
    pub client: Client,
    pub base_url: String,
}

impl TestContext {
    /// Spawn a fresh server with an empty store.
    pub async fn spawn() -> Self {
        let state = AppState::new(&test_config(), Arc::new(MemoryStore::new()));
        let app = fieldops_api::app(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            client: Client::new(),
            base_url: format!("http://{addr}"),
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    pub fn get(&self, path: &str, token: Option<&str>) -> RequestBuilder {
        with_token(self.client.get(self.url(path)), token)
    }

    pub fn post(&self, path: &str, token: Option<&str>) -> RequestBuilder {
        with_token(self.client.post(self.url(path)), token)
    }

    pub fn put(&self, path: &str, token: Option<&str>) -> RequestBuilder {
        with_token(self.client.put(self.url(path)), token)
    }

    pub fn delete(&self, path: &str, token: Option<&str>) -> RequestBuilder {
        with_token(self.client.delete(self.url(path)), token)
    }

    /// Register an account with the given role (`"Admin"`, `"Distributor"`,
    /// `"Team Member"`).
    pub async fn register(&self, name: &str, email: &str, role: &str) -> Account {
        let resp = self
            .post("/users/register", None)
            .json(&json!({
                "name": name,
                "email": email,
                "password": PASSWORD,
                "role": role,
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 201, "register {email}");
        let body: Value = resp.json().await.unwrap();
        Account {
            id: body["id"].as_i64().unwrap(),
            token: body["token"].as_str().unwrap().to_owned(),
        }
    }

    /// Create a shop as `token` and return its id.
    pub async fn create_shop(&self, token: &str, name: &str) -> i64 {
        let resp = self
            .post("/shops", Some(token))
            .json(&json!({
                "name": name,
                "contact": "555-0100",
                "address": format!("{name} Road"),
                "latitude": 12.97,
                "longitude": 77.59,
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 201, "create shop {name}");
        json_body(resp).await["id"].as_i64().unwrap()
    }

    /// Create a plan for `team_member` on `date` and return its id.
    pub async fn create_plan(&self, token: &str, team_member: i64, date: &str, shops: &[i64]) -> i64 {
        let resp = self
            .post("/plans", Some(token))
            .json(&json!({
                "teamMember": team_member,
                "date": date,
                "shopIds": shops,
                "startingPoint": "Depot",
                "finalDestination": "Depot",
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 201, "create plan");
        json_body(resp).await["id"].as_i64().unwrap()
    }
}

fn with_token(builder: RequestBuilder, token: Option<&str>) -> RequestBuilder {
    match token {
        Some(token) => builder.bearer_auth(token),
        None => builder,
    }
}

/// Decode a JSON response body.
pub async fn json_body(resp: Response) -> Value {
    resp.json().await.unwrap()
}

/// Today's date in the server's time zone, as `YYYY-MM-DD`.
#[must_use]
pub fn today() -> String {
    chrono::Local::now().format("%Y-%m-%d").to_string()
}

/// Tomorrow's date in the server's time zone, as `YYYY-MM-DD`.
#[must_use]
pub fn tomorrow() -> String {
    (chrono::Local::now().date_naive() + chrono::Days::new(1))
        .format("%Y-%m-%d")
        .to_string()
}
