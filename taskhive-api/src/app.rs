/// Application state and router builder
///
/// # Router layout
///
/// ```text
/// /api
/// ├── /health                      # public
/// ├── /auth                        # register/login/refresh/logout public, /me authed
/// ├── /users                       # authed
/// ├── /tasks                       # authed (+ comments, history, attachments)
/// ├── /categories                  # authed
/// ├── /notifications               # authed
/// └── /dashboard                   # authed
/// /uploads                         # static attachment files
/// ```
///
/// Middleware, outermost first: body limit, security headers, compression,
/// CORS, request tracing; rate limiting wraps `/api`; bearer auth wraps the
/// protected resource routers.

use crate::{
    config::Config,
    error::ApiError,
    middleware::{rate_limit, security},
    routes,
};
use axum::{
    extract::{DefaultBodyLimit, Request, State},
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{delete, get, patch, post, put},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use taskhive_shared::{auth::middleware::authenticate_bearer, mailer::Mailer};
use tower_http::{
    compression::CompressionLayer,
    cors::CorsLayer,
    services::ServeDir,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned into every handler via Axum's `State` extractor; Arc keeps the
/// clones cheap.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,

    /// Outgoing email sender
    pub mailer: Arc<dyn Mailer>,

    /// Per-client rate limiter
    pub rate_limiter: Arc<rate_limit::RateLimiter>,
}

impl AppState {
    /// Creates new application state
    pub fn new(db: PgPool, config: Config, mailer: Arc<dyn Mailer>) -> Self {
        let rate_limiter = Arc::new(rate_limit::RateLimiter::new(config.rate_limit));
        Self {
            db,
            config: Arc::new(config),
            mailer,
            rate_limiter,
        }
    }

    /// JWT signing secret
    pub fn jwt_secret(&self) -> &str {
        &self.config.auth.jwt_secret
    }
}

/// Builds the complete Axum router with all routes and middleware
pub fn build_router(state: AppState) -> Router {
    // Public: health check and authentication entry points
    let public_routes = Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/auth/register", post(routes::auth::register))
        .route("/auth/login", post(routes::auth::login))
        .route("/auth/refresh", post(routes::auth::refresh))
        .route("/auth/logout", post(routes::auth::logout));

    let user_routes = Router::new()
        .route("/", get(routes::users::list_users))
        .route("/change-password", post(routes::users::change_password))
        .route(
            "/:id",
            get(routes::users::get_user)
                .put(routes::users::update_user)
                .delete(routes::users::delete_user),
        )
        .route("/:id/tasks", get(routes::users::get_user_tasks))
        .route("/:id/settings", put(routes::users::update_settings));

    let task_routes = Router::new()
        .route(
            "/",
            get(routes::tasks::list_tasks).post(routes::tasks::create_task),
        )
        .route(
            "/:id",
            get(routes::tasks::get_task)
                .put(routes::tasks::update_task)
                .delete(routes::tasks::delete_task),
        )
        .route("/:id/history", get(routes::tasks::get_task_history))
        .route(
            "/:id/comments",
            get(routes::tasks::get_comments).post(routes::tasks::add_comment),
        )
        .route("/:id/attachments", post(routes::tasks::upload_attachment))
        .route(
            "/:id/attachments/:file_id",
            delete(routes::tasks::delete_attachment),
        );

    let category_routes = Router::new()
        .route(
            "/",
            get(routes::categories::list_categories).post(routes::categories::create_category),
        )
        .route(
            "/:id",
            get(routes::categories::get_category)
                .put(routes::categories::update_category)
                .delete(routes::categories::delete_category),
        );

    let notification_routes = Router::new()
        .route("/", get(routes::notifications::list_notifications))
        .route("/unread-count", get(routes::notifications::unread_count))
        .route("/read-all", patch(routes::notifications::mark_all_read))
        .route(
            "/:id/read",
            patch(routes::notifications::mark_read),
        )
        .route("/:id", delete(routes::notifications::delete_notification));

    let dashboard_routes = Router::new()
        .route("/stats", get(routes::dashboard::get_stats))
        .route("/recent", get(routes::dashboard::get_recent_activity))
        .route("/charts", get(routes::dashboard::get_chart_data))
        .route(
            "/tasks-by-status",
            get(routes::dashboard::get_tasks_by_status),
        );

    // Everything past authentication
    let protected_routes = Router::new()
        .route("/auth/me", get(routes::auth::me))
        .nest("/users", user_routes)
        .nest("/tasks", task_routes)
        .nest("/categories", category_routes)
        .nest("/notifications", notification_routes)
        .nest("/dashboard", dashboard_routes)
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth_layer,
        ));

    let api = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            rate_limit::rate_limit_layer,
        ));

    let cors = if state.config.api.production {
        let origin: Option<HeaderValue> = state.config.api.frontend_url.parse().ok();
        let mut layer = CorsLayer::new()
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true);
        if let Some(origin) = origin {
            layer = layer.allow_origin(origin);
        }
        layer
    } else {
        CorsLayer::permissive()
    };

    Router::new()
        .nest("/api", api)
        .nest_service("/uploads", ServeDir::new(&state.config.uploads.dir))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(CompressionLayer::new())
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            security::security_headers,
        ))
        .layer(DefaultBodyLimit::max(state.config.uploads.max_bytes))
        .with_state(state)
}

/// Bearer authentication middleware
///
/// Validates the access token, loads the user row, and injects
/// `CurrentUser` into request extensions.
async fn auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    let user = authenticate_bearer(&state.db, state.jwt_secret(), auth_header).await?;

    req.extensions_mut().insert(user);

    Ok(next.run(req).await)
}
