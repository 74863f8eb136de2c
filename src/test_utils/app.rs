use axum::http::{HeaderName, HeaderValue};
use axum_test::{TestRequest, TestResponse, TestServer};
use rusqlite::Connection;
use serde_json::{Value, json};

use crate::{AppState, app_state::AppEnv, auth::CSRF_HEADER, build_router, endpoints};

pub(crate) const TEST_EMAIL: &str = "a@x.com";
pub(crate) const TEST_PASSWORD: &str = "password1";

/// The full router behind a test server that keeps cookies between requests,
/// plus the CSRF token of the current session.
pub(crate) struct TestApp {
    pub server: TestServer,
    pub csrf: String,
}

impl TestApp {
    /// A fresh app with an empty database and an anonymous session.
    pub async fn new() -> Self {
        let state = AppState::new(Connection::open_in_memory().unwrap(), "foobar").unwrap();
        let state = AppState {
            password_cost: 4,
            login_delay: std::time::Duration::ZERO,
            app_env: AppEnv::new("test"),
            ..state
        };

        let mut server =
            TestServer::try_new(build_router(state)).expect("Could not create test server.");
        server.save_cookies();

        let mut app = Self {
            server,
            csrf: String::new(),
        };
        app.refresh_csrf().await;

        app
    }

    /// A fresh app with [TEST_EMAIL] registered and logged in.
    pub async fn logged_in() -> Self {
        let mut app = Self::new().await;
        app.register(TEST_EMAIL, TEST_PASSWORD)
            .await
            .assert_status(axum::http::StatusCode::CREATED);
        app.log_in(TEST_EMAIL, TEST_PASSWORD)
            .await
            .assert_status_ok();

        app
    }

    /// Fetch the CSRF token of the current session, creating one if needed.
    pub async fn refresh_csrf(&mut self) {
        let response = self.server.get(endpoints::CSRF).await;
        response.assert_status_ok();

        self.csrf = response.json::<Value>()["csrf"]
            .as_str()
            .expect("CSRF token missing")
            .to_owned();
    }

    pub async fn register(&self, email: &str, password: &str) -> TestResponse {
        self.post_json(
            endpoints::REGISTER,
            &json!({ "email": email, "password": password }),
        )
        .await
    }

    /// Log in and pick up the CSRF token of the new session.
    pub async fn log_in(&mut self, email: &str, password: &str) -> TestResponse {
        let response = self
            .post_json(
                endpoints::LOG_IN,
                &json!({ "email": email, "password": password }),
            )
            .await;
        self.refresh_csrf().await;

        response
    }

    pub async fn get(&self, path: &str) -> TestResponse {
        self.server.get(path).await
    }

    pub async fn post_json(&self, path: &str, body: &Value) -> TestResponse {
        self.with_csrf(self.server.post(path)).json(body).await
    }

    pub async fn patch_json(&self, path: &str, body: &Value) -> TestResponse {
        self.with_csrf(self.server.patch(path)).json(body).await
    }

    pub async fn delete(&self, path: &str) -> TestResponse {
        self.with_csrf(self.server.delete(path))
            .content_type("application/json")
            .await
    }

    /// Create a category and return its ID.
    pub async fn create_category(&self, name: &str) -> i64 {
        let response = self
            .post_json(endpoints::CATEGORIES, &json!({ "name": name }))
            .await;
        response.assert_status(axum::http::StatusCode::CREATED);

        response.json::<Value>()["id"]
            .as_i64()
            .expect("category ID missing")
    }

    /// Create a transaction and return its ID.
    pub async fn create_transaction(&self, body: &Value) -> i64 {
        let response = self.post_json(endpoints::TRANSACTIONS, body).await;
        response.assert_status(axum::http::StatusCode::CREATED);

        response.json::<Value>()["id"]
            .as_i64()
            .expect("transaction ID missing")
    }

    fn with_csrf(&self, request: TestRequest) -> TestRequest {
        request.add_header(
            HeaderName::from_static(CSRF_HEADER),
            HeaderValue::from_str(&self.csrf).expect("CSRF token is not a valid header value"),
        )
    }
}
