//! Shared helpers for the HTTP integration tests.
//!
//! Each test builds its own router over a private in-memory database and
//! drives it with `tower::ServiceExt::oneshot`, so no server is started.

#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde::Serialize;
use serde_json::Value;
use std::str::FromStr;
use std::sync::Arc;
use tower::ServiceExt;

use recipe_api::config::Config;
use recipe_api::db::{self, DbPool, NewRecipe, Price, Recipe, Session, User};
use recipe_api::AppState;

pub struct TestApp {
    pub router: Router,
    pub db: DbPool,
}

impl TestApp {
    pub async fn new() -> Self {
        let db = db::connect("sqlite::memory:")
            .await
            .expect("Failed to open test database");
        let state = Arc::new(AppState::new(Config::default(), db.clone()));
        Self {
            router: recipe_api::api::create_router(state),
            db,
        }
    }

    pub async fn send(&self, request: TestRequest) -> TestResponse {
        request.send(self.router.clone()).await
    }

    /// Create a user directly in the database
    pub async fn create_user(&self, email: &str, password: &str) -> User {
        User::create(&self.db, email, password, "Test Name")
            .await
            .expect("Failed to create user")
    }

    /// Issue a token for a user without going through the API
    pub async fn token_for(&self, user: &User) -> String {
        Session::issue(&self.db, user.id, 7)
            .await
            .expect("Failed to issue token")
    }

    /// Create a user and return it with a valid token
    pub async fn authenticated_user(&self, email: &str) -> (User, String) {
        let user = self.create_user(email, "testpass123").await;
        let token = self.token_for(&user).await;
        (user, token)
    }

    /// Insert a recipe with default values for the given user
    pub async fn create_recipe(&self, user: &User, title: &str) -> Recipe {
        let mut conn = self.db.acquire().await.expect("Failed to acquire connection");
        Recipe::create(
            &mut conn,
            user.id,
            &NewRecipe {
                title: title.to_string(),
                time_minutes: 22,
                price: price("5.25"),
                description: "Sample description".to_string(),
                link: Some("http://example.com/recipe.pdf".to_string()),
            },
        )
        .await
        .expect("Failed to create recipe")
    }
}

pub fn price(value: &str) -> Price {
    Price::new(rust_decimal::Decimal::from_str(value).expect("Invalid decimal"))
        .expect("Invalid price")
}

/// Builder for a request sent to the router
pub struct TestRequest {
    method: Method,
    uri: String,
    headers: Vec<(String, String)>,
    body: Option<String>,
}

impl TestRequest {
    fn new(method: Method, uri: &str) -> Self {
        Self {
            method,
            uri: uri.to_owned(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn get(uri: &str) -> Self {
        Self::new(Method::GET, uri)
    }

    pub fn post(uri: &str) -> Self {
        Self::new(Method::POST, uri)
    }

    pub fn put(uri: &str) -> Self {
        Self::new(Method::PUT, uri)
    }

    pub fn patch(uri: &str) -> Self {
        Self::new(Method::PATCH, uri)
    }

    pub fn delete(uri: &str) -> Self {
        Self::new(Method::DELETE, uri)
    }

    pub fn header(mut self, key: &str, value: &str) -> Self {
        self.headers.push((key.to_owned(), value.to_owned()));
        self
    }

    /// Authenticate with a token issued by the API
    pub fn token(self, token: &str) -> Self {
        self.header(header::AUTHORIZATION.as_str(), &format!("Token {}", token))
    }

    pub fn json<T: Serialize>(mut self, data: &T) -> Self {
        self.body = Some(serde_json::to_string(data).expect("Failed to serialize JSON"));
        self.headers.push((
            header::CONTENT_TYPE.as_str().to_owned(),
            "application/json".to_owned(),
        ));
        self
    }

    async fn send(self, app: Router) -> TestResponse {
        let mut builder = Request::builder().method(self.method).uri(self.uri);

        for (key, value) in self.headers {
            builder = builder.header(key, value);
        }

        let request = builder
            .body(Body::from(self.body.unwrap_or_default()))
            .expect("Failed to build request");

        let response = app
            .oneshot(request)
            .await
            .expect("Failed to execute request");

        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read response body")
            .to_vec();

        TestResponse { status, body }
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    body: Vec<u8>,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).expect("Failed to deserialize JSON response")
    }

    pub fn text(&self) -> String {
        String::from_utf8(self.body.clone()).expect("Failed to decode response as UTF-8")
    }

    pub fn assert_status(self, expected: StatusCode) -> Self {
        assert_eq!(
            self.status,
            expected,
            "unexpected status, body: {}",
            String::from_utf8_lossy(&self.body)
        );
        self
    }
}
