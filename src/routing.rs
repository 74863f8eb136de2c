//! Application router configuration with protected and unprotected route definitions.

use axum::{
    Json, Router,
    extract::State,
    middleware,
    routing::{get, patch, post},
};
use serde_json::{Value, json};
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};

use crate::{
    AppState, Error,
    auth::{
        auth_guard, csrf_guard, get_csrf_token, get_current_user, json_guard, log_in, log_out,
        register_user,
    },
    category::{
        create_category_endpoint, delete_category_endpoint, list_categories_endpoint,
        update_category_endpoint,
    },
    endpoints,
    error::handle_panic,
    http_policy::add_http_policy_layers,
    logging::{expose_internal_errors, logging_middleware, make_request_span},
    report::{month_report_endpoint, year_report_endpoint},
    transaction::{
        create_transaction_endpoint, delete_transaction_endpoint, get_transaction_endpoint,
        list_transactions_endpoint, update_transaction_endpoint,
    },
};

/// Return a router with all the app's routes.
///
/// Mutating requests pass through the guards in this order: CSRF token,
/// JSON content type, then the logged in session. Log out only needs the
/// CSRF token since its request has no body.
pub fn build_router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route(
            endpoints::CATEGORIES,
            get(list_categories_endpoint).post(create_category_endpoint),
        )
        .route(
            endpoints::CATEGORY,
            patch(update_category_endpoint).delete(delete_category_endpoint),
        )
        .route(
            endpoints::TRANSACTIONS,
            get(list_transactions_endpoint).post(create_transaction_endpoint),
        )
        .route(
            endpoints::TRANSACTION,
            get(get_transaction_endpoint)
                .patch(update_transaction_endpoint)
                .delete(delete_transaction_endpoint),
        )
        .route(endpoints::MONTH_REPORT, get(month_report_endpoint))
        .route(endpoints::YEAR_REPORT, get(year_report_endpoint))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    let guarded_routes = Router::new()
        .route(endpoints::REGISTER, post(register_user))
        .route(endpoints::LOG_IN, post(log_in))
        .merge(protected_routes)
        .route_layer(middleware::from_fn(json_guard))
        .route(endpoints::LOG_OUT, post(log_out))
        .route_layer(middleware::from_fn_with_state(state.clone(), csrf_guard));

    let unprotected_routes = Router::new()
        .route(endpoints::ROOT, get(get_health))
        .route(endpoints::ME, get(get_current_user))
        .route(endpoints::CSRF, get(get_csrf_token));

    let allowed_origins = state.allowed_origins.clone();
    let router = guarded_routes
        .merge(unprotected_routes)
        .fallback(get_404_not_found)
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(middleware::from_fn_with_state(
            state.app_env.clone(),
            expose_internal_errors,
        ))
        .layer(middleware::from_fn(logging_middleware))
        .with_state(state);

    add_http_policy_layers(router, allowed_origins).layer(
        TraceLayer::new_for_http()
            .make_span_with(make_request_span)
            // Errors are already logged where they are converted into responses.
            .on_failure(()),
    )
}

/// Report that the API is up and which environment it runs in.
async fn get_health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "app": "Budget Buddy API",
        "env": state.app_env.as_str(),
    }))
}

async fn get_404_not_found() -> Error {
    Error::NOT_FOUND
}


#[cfg(test)]
mod api_scenario_tests {
    use axum::http::StatusCode;
    use serde_json::{Value, json};

    use crate::{
        endpoints::{self, format_endpoint},
        test_utils::{TEST_EMAIL, TEST_PASSWORD, TestApp},
    };

    #[tokio::test]
    async fn month_report_spreads_expense_over_daily_series() {
        let app = TestApp::logged_in().await;
        let groceries = app.create_category("Groceries").await;
        app.create_transaction(&json!({
            "type": "expense",
            "amount": "42.50",
            "txn_date": "2024-06-03",
            "category_id": groceries,
        }))
        .await;

        let response = app.get("/reports/month?month=2024-06").await;

        response.assert_status_ok();
        let report = response.json::<Value>();
        assert_eq!(report["period"], json!({ "from": "2024-06-01", "to": "2024-07-01" }));
        assert_eq!(report["totals"]["expense"], "42.50");
        assert_eq!(report["totals"]["net"], "-42.50");
        assert_eq!(
            report["byCategory"],
            json!([{
                "category_id": groceries,
                "category_name": "Groceries",
                "type": "expense",
                "total": "42.50",
            }])
        );

        let daily = report["daily"].as_array().expect("daily series missing");
        assert_eq!(daily.len(), 30);
        for point in daily {
            let expected = if point["date"] == "2024-06-03" { "42.50" } else { "0.00" };
            assert_eq!(point["expense"], expected, "{point}");
            assert_eq!(point["income"], "0.00", "{point}");
        }
    }

    #[tokio::test]
    async fn same_day_income_and_expense_net_out() {
        let app = TestApp::logged_in().await;
        app.create_transaction(&json!({
            "type": "income",
            "amount": "1000.00",
            "txn_date": "2024-06-15",
        }))
        .await;
        app.create_transaction(&json!({
            "type": "expense",
            "amount": "250.00",
            "txn_date": "2024-06-15",
        }))
        .await;

        let report = app.get("/reports/month?month=2024-06").await.json::<Value>();

        assert_eq!(
            report["totals"],
            json!({ "income": "1000.00", "expense": "250.00", "net": "750.00" })
        );
        let day = report["daily"]
            .as_array()
            .and_then(|daily| daily.iter().find(|point| point["date"] == "2024-06-15"))
            .expect("2024-06-15 missing from daily series");
        assert_eq!(day["net"], "750.00");
        assert_eq!(report["byCategory"][0]["category_id"], json!(null));
        assert_eq!(report["byCategory"][0]["category_name"], "Uncategorized");
    }

    #[tokio::test]
    async fn transaction_amount_is_returned_as_written() {
        let app = TestApp::logged_in().await;
        let id = app
            .create_transaction(&json!({
                "type": "expense",
                "amount": 12.34,
                "txn_date": "2024-06-03",
            }))
            .await;

        let response = app.get(&format_endpoint(endpoints::TRANSACTION, id)).await;

        response.assert_status_ok();
        let transaction = response.json::<Value>();
        assert_eq!(transaction["amount"], "12.34");
        assert_eq!(transaction["txn_date"], "2024-06-03");
        assert_eq!(transaction["currency"], "USD");
    }

    #[tokio::test]
    async fn failed_log_in_does_not_reveal_registered_emails() {
        let mut app = TestApp::new().await;
        app.register(TEST_EMAIL, TEST_PASSWORD)
            .await
            .assert_status(StatusCode::CREATED);

        let wrong_password = app.log_in(TEST_EMAIL, "password2").await;
        let unknown_email = app.log_in("nobody@x.com", TEST_PASSWORD).await;

        wrong_password.assert_status(StatusCode::UNAUTHORIZED);
        unknown_email.assert_status(StatusCode::UNAUTHORIZED);
        assert_eq!(wrong_password.text(), unknown_email.text());
        wrong_password.assert_json(&json!({ "error": "Invalid credentials" }));
    }

    #[tokio::test]
    async fn other_users_transactions_are_not_found() {
        let mut app = TestApp::logged_in().await;
        let id = app
            .create_transaction(&json!({
                "type": "expense",
                "amount": "5.00",
                "txn_date": "2024-06-03",
            }))
            .await;

        app.post_json("/auth/logout", &json!({}))
            .await
            .assert_status_ok();
        app.refresh_csrf().await;
        app.register("b@x.com", TEST_PASSWORD)
            .await
            .assert_status(StatusCode::CREATED);
        app.log_in("b@x.com", TEST_PASSWORD).await.assert_status_ok();

        let path = format_endpoint(endpoints::TRANSACTION, id);
        app.get(&path).await.assert_status(StatusCode::NOT_FOUND);
        app.patch_json(&path, &json!({ "amount": "6.00" }))
            .await
            .assert_status(StatusCode::NOT_FOUND);
        app.delete(&path).await.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn non_positive_id_is_unprocessable() {
        let app = TestApp::logged_in().await;

        let response = app.get("/transactions/0").await;

        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        response.assert_json(&json!({ "error": "Invalid id" }));
    }

    #[tokio::test]
    async fn log_out_ends_the_session() {
        let app = TestApp::logged_in().await;
        let me = app.get("/auth/me").await.json::<Value>();
        assert_eq!(me["user"]["email"], TEST_EMAIL);

        app.post_json("/auth/logout", &json!({}))
            .await
            .assert_json(&json!({ "ok": true }));

        app.get("/auth/me")
            .await
            .assert_json(&json!({ "user": null }));
        app.get("/categories")
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }
}
