/// Authentication endpoints
///
/// # Endpoints
///
/// - `POST /api/auth/register` - Register a new account
/// - `POST /api/auth/login` - Login and get tokens
/// - `POST /api/auth/refresh` - Rotate the refresh token, get a new access token
/// - `POST /api/auth/logout` - Revoke a refresh token
/// - `GET  /api/auth/me` - Current user with settings
///
/// Access tokens are short-lived JWTs; refresh tokens are opaque, stored
/// hashed server-side, and single-use (rotated on every refresh, deleted on
/// logout).

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    response::ApiResponse,
};
use axum::{extract::State, http::StatusCode, Extension, Json};
use serde::{Deserialize, Serialize};
use taskhive_shared::{
    auth::{jwt, middleware::CurrentUser, password, refresh},
    models::{
        refresh_token::RefreshToken,
        settings::UserSettings,
        user::{CreateUser, User, UserProfile},
    },
};
use validator::Validate;

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Unique username
    #[validate(length(min = 3, message = "Username must be at least 3 characters"))]
    pub username: String,

    /// Email address
    #[validate(email(message = "Invalid email address"))]
    pub email: String,

    /// Password
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,

    /// Display name
    #[validate(length(min = 1, message = "Full name is required"))]
    pub full_name: String,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// Email address
    #[validate(email(message = "Invalid email address"))]
    pub email: String,

    /// Password
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Refresh/logout request
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    /// Opaque refresh token
    pub refresh_token: String,
}

/// Tokens plus the authenticated user
#[derive(Debug, Serialize)]
pub struct AuthPayload {
    pub user: User,
    pub access_token: String,
    pub refresh_token: String,
}

/// Tokens returned by refresh
#[derive(Debug, Serialize)]
pub struct TokenPayload {
    pub access_token: String,
    pub refresh_token: String,
}

/// Issues an access token and stores a fresh refresh token for the user
async fn issue_tokens(state: &AppState, user: &User) -> ApiResult<(String, String)> {
    let access_token = jwt::create_access_token(
        user.id,
        &user.email,
        &user.role,
        state.jwt_secret(),
        state.config.auth.access_token_ttl_hours,
    )?;

    let refresh_token = refresh::generate_token();
    RefreshToken::create(
        &state.db,
        user.id,
        &refresh::hash_token(&refresh_token),
        state.config.auth.refresh_token_ttl_days,
    )
    .await?;

    Ok((access_token, refresh_token))
}

/// Register a new user
///
/// Duplicate email or username returns 400 without creating a row.
///
/// # Errors
///
/// - `400 Bad Request`: validation failed, or the email/username is taken
/// - `500 Internal Server Error`: server error
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<AuthPayload>>)> {
    req.validate().map_err(ApiError::from_validation)?;

    if User::exists_with_email_or_username(&state.db, &req.email, &req.username).await? {
        return Err(ApiError::BadRequest(
            "User already exists with this email or username".to_string(),
        ));
    }

    let password_hash = password::hash_password(&req.password)?;

    let user = User::create(
        &state.db,
        CreateUser {
            username: req.username,
            email: req.email,
            password_hash,
            full_name: req.full_name,
        },
    )
    .await?;

    UserSettings::create_default(&state.db, user.id).await?;

    let (access_token, refresh_token) = issue_tokens(&state, &user).await?;

    tracing::info!(user_id = %user.id, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::data(AuthPayload {
            user,
            access_token,
            refresh_token,
        })),
    ))
}

/// Login with email and password
///
/// # Errors
///
/// - `401 Unauthorized`: unknown email, wrong password, or deactivated account
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<ApiResponse<AuthPayload>>> {
    req.validate().map_err(ApiError::from_validation)?;

    let user = User::find_by_email(&state.db, &req.email)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Invalid credentials".to_string()))?;

    if !user.is_active {
        return Err(ApiError::Unauthorized("Account is deactivated".to_string()));
    }

    if !password::verify_password(&req.password, &user.password_hash)? {
        return Err(ApiError::Unauthorized("Invalid credentials".to_string()));
    }

    User::update_last_login(&state.db, user.id).await?;

    let (access_token, refresh_token) = issue_tokens(&state, &user).await?;

    Ok(Json(ApiResponse::data(AuthPayload {
        user,
        access_token,
        refresh_token,
    })))
}

/// Exchange a refresh token for new tokens
///
/// The presented token is consumed: its row is replaced by the new token's
/// hash, so replaying it fails.
///
/// # Errors
///
/// - `401 Unauthorized`: unknown, expired, or already-used refresh token
pub async fn refresh(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> ApiResult<Json<ApiResponse<TokenPayload>>> {
    if req.refresh_token.is_empty() {
        return Err(ApiError::BadRequest("Refresh token required".to_string()));
    }

    let old_hash = refresh::hash_token(&req.refresh_token);

    let stored = RefreshToken::find_valid(&state.db, &old_hash)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Invalid or expired refresh token".to_string()))?;

    let user = User::find_by_id(&state.db, stored.user_id)
        .await?
        .filter(|u| u.is_active)
        .ok_or_else(|| ApiError::Unauthorized("User not found".to_string()))?;

    let access_token = jwt::create_access_token(
        user.id,
        &user.email,
        &user.role,
        state.jwt_secret(),
        state.config.auth.access_token_ttl_hours,
    )?;

    let new_token = refresh::generate_token();
    RefreshToken::rotate(
        &state.db,
        &old_hash,
        user.id,
        &refresh::hash_token(&new_token),
        state.config.auth.refresh_token_ttl_days,
    )
    .await?;

    Ok(Json(ApiResponse::data(TokenPayload {
        access_token,
        refresh_token: new_token,
    })))
}

/// Revoke a refresh token
///
/// Always succeeds, whether or not the token existed.
pub async fn logout(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> ApiResult<Json<ApiResponse<()>>> {
    if !req.refresh_token.is_empty() {
        RefreshToken::delete_by_hash(&state.db, &refresh::hash_token(&req.refresh_token)).await?;
    }

    Ok(Json(ApiResponse::message("Logged out successfully")))
}

/// Current user joined with their settings
pub async fn me(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> ApiResult<Json<ApiResponse<UserProfile>>> {
    let profile = User::find_profile(&state.db, current.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(ApiResponse::data(profile)))
}
