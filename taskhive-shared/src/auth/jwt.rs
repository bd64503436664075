/// JWT access token creation and validation
///
/// Access tokens are short-lived HS256 tokens carrying the user's identity
/// and role. Refresh tokens are deliberately NOT JWTs: they are opaque,
/// server-side tokens handled by [`crate::auth::refresh`], so a stolen
/// refresh token can be revoked by deleting its row.
///
/// # Example
///
/// ```
/// use taskhive_shared::auth::jwt::{create_access_token, validate_access_token, Claims};
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let secret = "test-secret-key-at-least-32-bytes-long";
/// let token = create_access_token(Uuid::new_v4(), "a@b.com", "user", secret, 24)?;
/// let claims = validate_access_token(&token, secret)?;
/// assert_eq!(claims.role, "user");
/// # Ok(())
/// # }
/// ```

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const ISSUER: &str = "taskhive";

/// Error type for JWT operations
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    /// Failed to create token
    #[error("Failed to create token: {0}")]
    CreateError(String),

    /// Failed to validate token
    #[error("Failed to validate token: {0}")]
    ValidationError(String),

    /// Token has expired
    #[error("Token has expired")]
    Expired,

    /// Invalid issuer
    #[error("Invalid token issuer")]
    InvalidIssuer,
}

/// Access token claims
///
/// Standard claims (`sub`, `iss`, `iat`, `exp`, `nbf`) plus the user's email
/// and role, mirroring what handlers need without a user lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - user ID
    pub sub: Uuid,

    /// Issuer - always "taskhive"
    pub iss: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Not before (Unix timestamp)
    pub nbf: i64,

    /// User email (custom claim)
    pub email: String,

    /// User role (custom claim)
    pub role: String,
}

impl Claims {
    /// Creates claims expiring `ttl_hours` from now
    pub fn new(user_id: Uuid, email: &str, role: &str, ttl_hours: i64) -> Self {
        let now = Utc::now();
        let expiration = now + Duration::hours(ttl_hours);

        Self {
            sub: user_id,
            iss: ISSUER.to_string(),
            iat: now.timestamp(),
            exp: expiration.timestamp(),
            nbf: now.timestamp(),
            email: email.to_string(),
            role: role.to_string(),
        }
    }

    /// Checks if the token has expired
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }
}

/// Creates a signed access token
///
/// # Errors
///
/// Returns `JwtError::CreateError` if encoding fails.
pub fn create_access_token(
    user_id: Uuid,
    email: &str,
    role: &str,
    secret: &str,
    ttl_hours: i64,
) -> Result<String, JwtError> {
    let claims = Claims::new(user_id, email, role, ttl_hours);
    let header = Header::new(Algorithm::HS256);
    let key = EncodingKey::from_secret(secret.as_bytes());

    encode(&header, &claims, &key)
        .map_err(|e| JwtError::CreateError(format!("Token encoding failed: {}", e)))
}

/// Validates an access token and extracts its claims
///
/// Verifies the signature, expiry, not-before, and issuer.
///
/// # Errors
///
/// Returns `JwtError::Expired` for expired tokens, `JwtError::InvalidIssuer`
/// for issuer mismatches, and `JwtError::ValidationError` otherwise.
pub fn validate_access_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    let key = DecodingKey::from_secret(secret.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[ISSUER]);
    validation.validate_exp = true;
    validation.validate_nbf = true;

    let token_data = decode::<Claims>(token, &key, &validation).map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
        jsonwebtoken::errors::ErrorKind::InvalidIssuer => JwtError::InvalidIssuer,
        _ => JwtError::ValidationError(format!("Token validation failed: {}", e)),
    })?;

    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    #[test]
    fn test_claims_creation() {
        let user_id = Uuid::new_v4();
        let claims = Claims::new(user_id, "user@example.com", "manager", 24);

        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.iss, "taskhive");
        assert_eq!(claims.email, "user@example.com");
        assert_eq!(claims.role, "manager");
        assert!(!claims.is_expired());
        assert_eq!(claims.exp - claims.iat, 24 * 3600);
    }

    #[test]
    fn test_create_and_validate_token() {
        let user_id = Uuid::new_v4();
        let token = create_access_token(user_id, "a@b.com", "admin", SECRET, 1).unwrap();

        let claims = validate_access_token(&token, SECRET).unwrap();
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.email, "a@b.com");
        assert_eq!(claims.role, "admin");
    }

    #[test]
    fn test_validate_with_wrong_secret() {
        let token = create_access_token(Uuid::new_v4(), "a@b.com", "user", SECRET, 1).unwrap();
        assert!(validate_access_token(&token, "wrong-secret").is_err());
    }

    #[test]
    fn test_validate_expired_token() {
        // Negative TTL produces an already-expired token
        let token = create_access_token(Uuid::new_v4(), "a@b.com", "user", SECRET, -1).unwrap();

        let result = validate_access_token(&token, SECRET);
        assert!(matches!(result, Err(JwtError::Expired)));
    }

    #[test]
    fn test_validate_garbage_token() {
        assert!(validate_access_token("not-a-jwt", SECRET).is_err());
    }
}
