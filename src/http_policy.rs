//! Cross-origin policy and security headers applied to every response.

use std::sync::Arc;

use axum::{
    Router,
    extract::{Request, State},
    http::{
        HeaderName, HeaderValue, Method,
        header::{
            CONTENT_SECURITY_POLICY, CONTENT_TYPE, ORIGIN, REFERRER_POLICY,
            X_CONTENT_TYPE_OPTIONS, X_FRAME_OPTIONS,
        },
    },
    middleware::{self, Next},
    response::{IntoResponse, Response},
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    set_header::SetResponseHeaderLayer,
};

use crate::{Error, auth::CSRF_HEADER};

const CONTENT_SECURITY_POLICY_VALUE: &str =
    "default-src 'none'; frame-ancestors 'none'; base-uri 'none'; form-action 'none'";
const PERMISSIONS_POLICY_VALUE: &str = "geolocation=(), camera=(), microphone=()";

/// Add the cross-origin checks and security headers to `router`.
///
/// From the outside in: security headers, then the origin allow-list, then
/// CORS. A request from an origin outside `allowed_origins`, preflight
/// included, gets `403 Origin not allowed`.
pub fn add_http_policy_layers(router: Router, allowed_origins: Arc<[String]>) -> Router {
    let cors = cors_layer(&allowed_origins);

    let router = router
        .layer(cors)
        .layer(middleware::from_fn_with_state(allowed_origins, origin_guard));

    add_security_headers(router)
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("ignoring CORS origin that is not a valid header value: {origin:?}");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE, HeaderName::from_static(CSRF_HEADER)])
}

/// Middleware that rejects requests whose `Origin` header is not in the
/// allow-list. Requests without an `Origin` header are passed through.
pub async fn origin_guard(
    State(allowed_origins): State<Arc<[String]>>,
    request: Request,
    next: Next,
) -> Response {
    let Some(origin) = request.headers().get(ORIGIN) else {
        return next.run(request).await;
    };

    let is_allowed = origin
        .to_str()
        .map(|origin| allowed_origins.iter().any(|allowed| allowed == origin))
        .unwrap_or(false);

    if is_allowed {
        next.run(request).await
    } else {
        tracing::debug!("rejected request from origin {origin:?}");
        Error::OriginNotAllowed.into_response()
    }
}

fn add_security_headers(router: Router) -> Router {
    let headers = [
        (X_CONTENT_TYPE_OPTIONS, "nosniff"),
        (X_FRAME_OPTIONS, "DENY"),
        (REFERRER_POLICY, "strict-origin-when-cross-origin"),
        (
            HeaderName::from_static("cross-origin-resource-policy"),
            "same-site",
        ),
        (
            HeaderName::from_static("cross-origin-opener-policy"),
            "same-origin",
        ),
        (
            HeaderName::from_static("permissions-policy"),
            PERMISSIONS_POLICY_VALUE,
        ),
        (CONTENT_SECURITY_POLICY, CONTENT_SECURITY_POLICY_VALUE),
    ];

    headers.into_iter().fold(router, |router, (name, value)| {
        router.layer(SetResponseHeaderLayer::if_not_present(
            name,
            HeaderValue::from_static(value),
        ))
    })
}

#[cfg(test)]
mod http_policy_tests {
    use std::sync::Arc;

    use axum::{
        Router,
        http::{HeaderValue, Method, StatusCode, header},
        routing::get,
    };
    use axum_test::TestServer;
    use serde_json::Value;

    use super::add_http_policy_layers;

    const ALLOWED: &str = "http://localhost:5173";

    fn server() -> TestServer {
        let router = Router::new().route("/", get(|| async { "ok" }));
        let router = add_http_policy_layers(router, Arc::from([ALLOWED.to_owned()]));

        TestServer::try_new(router).expect("Could not create test server.")
    }

    #[tokio::test]
    async fn sets_security_headers() {
        let response = server().get("/").await;

        response.assert_status_ok();
        assert_eq!(response.header(header::X_CONTENT_TYPE_OPTIONS), "nosniff");
        assert_eq!(response.header(header::X_FRAME_OPTIONS), "DENY");
        assert_eq!(
            response.header(header::REFERRER_POLICY),
            "strict-origin-when-cross-origin"
        );
        assert!(
            response
                .header(header::CONTENT_SECURITY_POLICY)
                .to_str()
                .unwrap()
                .starts_with("default-src 'none'")
        );
    }

    #[tokio::test]
    async fn request_without_origin_is_allowed() {
        server().get("/").await.assert_status_ok();
    }

    #[tokio::test]
    async fn allowed_origin_gets_cors_headers() {
        let response = server()
            .get("/")
            .add_header(header::ORIGIN, HeaderValue::from_static(ALLOWED))
            .await;

        response.assert_status_ok();
        assert_eq!(response.header(header::ACCESS_CONTROL_ALLOW_ORIGIN), ALLOWED);
        assert_eq!(
            response.header(header::ACCESS_CONTROL_ALLOW_CREDENTIALS),
            "true"
        );
    }

    #[tokio::test]
    async fn other_origin_is_forbidden() {
        let response = server()
            .get("/")
            .add_header(header::ORIGIN, HeaderValue::from_static("http://evil.test"))
            .await;

        response.assert_status(StatusCode::FORBIDDEN);
        assert_eq!(response.json::<Value>()["error"], "Origin not allowed");
        assert_eq!(response.header(header::X_FRAME_OPTIONS), "DENY");
    }

    #[tokio::test]
    async fn preflight_from_other_origin_is_forbidden() {
        let response = server()
            .method(Method::OPTIONS, "/")
            .add_header(header::ORIGIN, HeaderValue::from_static("http://evil.test"))
            .add_header(
                header::ACCESS_CONTROL_REQUEST_METHOD,
                HeaderValue::from_static("POST"),
            )
            .await;

        response.assert_status(StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn preflight_allows_csrf_header() {
        let response = server()
            .method(Method::OPTIONS, "/")
            .add_header(header::ORIGIN, HeaderValue::from_static(ALLOWED))
            .add_header(
                header::ACCESS_CONTROL_REQUEST_METHOD,
                HeaderValue::from_static("PATCH"),
            )
            .await;

        response.assert_status_ok();
        let allowed_headers = response
            .header(header::ACCESS_CONTROL_ALLOW_HEADERS)
            .to_str()
            .unwrap()
            .to_ascii_lowercase();
        assert!(allowed_headers.contains("x-csrf-token"));
        assert!(
            response
                .headers()
                .contains_key(header::ACCESS_CONTROL_ALLOW_METHODS)
        );
    }
}
