/// API surface tests
///
/// These drive the full router without a live database: the pool is lazy and
/// every exercised path (auth rejection, request validation, routing) fails
/// or succeeds before any query runs. End-to-end tests against PostgreSQL
/// live alongside a deployment, not in CI.

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use std::sync::Arc;
use taskhive_api::{
    app::{build_router, AppState},
    config::{
        ApiConfig, AuthConfig, Config, DatabaseConfig, EmailConfig, RateLimitConfig, UploadConfig,
    },
};
use taskhive_shared::mailer::NoopMailer;
use tower::ServiceExt as _;

fn test_config() -> Config {
    Config {
        api: ApiConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            frontend_url: "http://localhost:3000".to_string(),
            production: false,
        },
        database: DatabaseConfig {
            url: "postgresql://localhost:1/taskhive_offline".to_string(),
            max_connections: 2,
        },
        auth: AuthConfig {
            jwt_secret: "integration-test-secret-that-is-long-enough".to_string(),
            access_token_ttl_hours: 24,
            refresh_token_ttl_days: 30,
        },
        email: EmailConfig {
            enabled: false,
            smtp_host: String::new(),
            smtp_port: 587,
            smtp_username: String::new(),
            smtp_password: String::new(),
            from: "TaskHive <noreply@taskhive.app>".to_string(),
        },
        uploads: UploadConfig {
            dir: "./uploads".to_string(),
            max_bytes: 1024 * 1024,
        },
        rate_limit: RateLimitConfig {
            window_secs: 900,
            max_requests: 100,
        },
    }
}

fn test_app() -> Router {
    let config = test_config();
    let db = sqlx::postgres::PgPoolOptions::new()
        .connect_lazy(&config.database.url)
        .expect("lazy pool");

    build_router(AppState::new(db, config, Arc::new(NoopMailer)))
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_protected_route_requires_auth() {
    let app = test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/tasks")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body = body_json(response).await;
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_invalid_bearer_token_is_rejected() {
    let app = test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/dashboard/stats")
                .header("authorization", "Bearer not-a-real-token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_non_bearer_authorization_is_bad_request() {
    let app = test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/notifications")
                .header("authorization", "Basic dXNlcjpwYXNz")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_register_validation_failure_is_400_with_details() {
    let app = test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/register")
                .header("content-type", "application/json")
                .body(Body::from(
                    serde_json::json!({
                        "username": "ab",
                        "email": "not-an-email",
                        "password": "123",
                        "full_name": ""
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    let details = body["details"].as_array().expect("validation details");
    let fields: Vec<&str> = details
        .iter()
        .map(|d| d["field"].as_str().unwrap())
        .collect();
    assert!(fields.contains(&"username"));
    assert!(fields.contains(&"email"));
    assert!(fields.contains(&"password"));
    assert!(fields.contains(&"full_name"));
}

#[tokio::test]
async fn test_login_rejects_malformed_body() {
    let app = test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/login")
                .header("content-type", "application/json")
                .body(Body::from("{\"email\": \"a@b.com\""))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_refresh_requires_token() {
    let app = test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/refresh")
                .header("content-type", "application/json")
                .body(Body::from(
                    serde_json::json!({"refresh_token": ""}).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let app = test_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/nope")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_security_and_rate_limit_headers_present() {
    let app = test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/tasks")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let headers = response.headers();
    assert_eq!(headers.get("X-Content-Type-Options").unwrap(), "nosniff");
    assert_eq!(headers.get("X-Frame-Options").unwrap(), "DENY");
    // Not in production mode, so no HSTS
    assert!(headers.get("Strict-Transport-Security").is_none());
    assert!(headers.contains_key("X-RateLimit-Limit"));
    assert!(headers.contains_key("X-RateLimit-Remaining"));
}

#[tokio::test]
async fn test_rate_limit_exhaustion_returns_429() {
    let config = {
        let mut c = test_config();
        c.rate_limit = RateLimitConfig {
            window_secs: 900,
            max_requests: 2,
        };
        c
    };
    let db = sqlx::postgres::PgPoolOptions::new()
        .connect_lazy(&config.database.url)
        .expect("lazy pool");
    let app = build_router(AppState::new(db, config, Arc::new(NoopMailer)));

    for _ in 0..2 {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/tasks")
                    .header("x-forwarded-for", "203.0.113.9")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        // Unauthorized, but the request was admitted
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/tasks")
                .header("x-forwarded-for", "203.0.113.9")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(response.headers().contains_key("Retry-After"));
    assert_eq!(response.headers().get("X-RateLimit-Remaining").unwrap(), "0");
}
