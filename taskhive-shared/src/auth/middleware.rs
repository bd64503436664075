/// Bearer-token authentication for Axum
///
/// The API server wraps [`authenticate_bearer`] in a per-route middleware
/// layer. On success the resolved [`CurrentUser`] is inserted into request
/// extensions; handlers extract it with `Extension<CurrentUser>`.
///
/// Authentication validates the access JWT and then loads the user row, so a
/// deactivated account is rejected even while its tokens are still unexpired.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use super::jwt::{validate_access_token, JwtError};
use crate::models::user::{Role, User};

/// The authenticated user attached to request extensions
#[derive(Debug, Clone, Serialize)]
pub struct CurrentUser {
    /// User ID
    pub id: Uuid,

    /// Username
    pub username: String,

    /// Email address
    pub email: String,

    /// Display name
    pub full_name: String,

    /// Parsed role
    pub role: Role,
}

impl CurrentUser {
    /// Builds the request context from a freshly loaded user row
    fn from_user(user: &User) -> Result<Self, AuthError> {
        let role = user
            .role
            .parse::<Role>()
            .map_err(|_| AuthError::InvalidToken(format!("Unknown role '{}'", user.role)))?;

        Ok(Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            full_name: user.full_name.clone(),
            role,
        })
    }
}

/// Error type for authentication failures
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Missing authorization header
    #[error("Missing credentials")]
    MissingCredentials,

    /// Authorization header is not a Bearer token
    #[error("Invalid authorization header: {0}")]
    InvalidFormat(String),

    /// Token validation failed
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    /// User no longer exists
    #[error("User not found")]
    UserNotFound,

    /// Account has been deactivated
    #[error("User account is deactivated")]
    AccountDeactivated,

    /// Database error during user lookup
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<JwtError> for AuthError {
    fn from(err: JwtError) -> Self {
        AuthError::InvalidToken(err.to_string())
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = match self {
            AuthError::InvalidFormat(_) => StatusCode::BAD_REQUEST,
            AuthError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::UNAUTHORIZED,
        };

        let body = Json(json!({
            "success": false,
            "error": self.to_string(),
        }));

        (status, body).into_response()
    }
}

/// Validates a bearer token and resolves the current user
///
/// # Arguments
///
/// * `pool` - Database connection pool
/// * `jwt_secret` - Secret used to sign access tokens
/// * `auth_header` - Raw `Authorization` header value, if present
///
/// # Errors
///
/// Returns an [`AuthError`] for missing/malformed headers, invalid or expired
/// tokens, unknown users, and deactivated accounts.
pub async fn authenticate_bearer(
    pool: &PgPool,
    jwt_secret: &str,
    auth_header: Option<&str>,
) -> Result<CurrentUser, AuthError> {
    let header = auth_header.ok_or(AuthError::MissingCredentials)?;

    let token = header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AuthError::InvalidFormat("Expected Bearer token".to_string()))?;

    let claims = validate_access_token(token, jwt_secret)?;

    let user = User::find_by_id(pool, claims.sub)
        .await
        .map_err(|e| AuthError::DatabaseError(e.to_string()))?
        .ok_or(AuthError::UserNotFound)?;

    if !user.is_active {
        return Err(AuthError::AccountDeactivated);
    }

    CurrentUser::from_user(&user)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_error_status_codes() {
        let resp = AuthError::MissingCredentials.into_response();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let resp = AuthError::InvalidFormat("basic auth".to_string()).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = AuthError::AccountDeactivated.into_response();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let resp = AuthError::DatabaseError("boom".to_string()).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
