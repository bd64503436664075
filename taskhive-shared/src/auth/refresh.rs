/// Opaque refresh token generation and hashing
///
/// Refresh tokens are 48 random characters handed to the client exactly once.
/// Only the SHA-256 hex digest is stored, so a database leak does not leak
/// usable tokens. Tokens are single-use: the row is replaced on refresh and
/// deleted on logout (see [`crate::models::refresh_token`]).

use rand::Rng;
use sha2::{Digest, Sha256};

/// Length of the random portion of a refresh token
const TOKEN_LEN: usize = 48;

/// Generates a new opaque refresh token
///
/// # Example
///
/// ```
/// use taskhive_shared::auth::refresh::generate_token;
///
/// let token = generate_token();
/// assert_eq!(token.len(), 48);
/// ```
pub fn generate_token() -> String {
    const CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
    let mut rng = rand::thread_rng();

    (0..TOKEN_LEN)
        .map(|_| {
            let idx = rng.gen_range(0..CHARSET.len());
            CHARSET[idx] as char
        })
        .collect()
}

/// Hashes a refresh token for storage and lookup
///
/// # Example
///
/// ```
/// use taskhive_shared::auth::refresh::hash_token;
///
/// let hash = hash_token("some-token");
/// assert_eq!(hash.len(), 64); // SHA-256 hex
/// ```
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_token_length_and_charset() {
        let token = generate_token();
        assert_eq!(token.len(), TOKEN_LEN);
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_generate_token_unique() {
        assert_ne!(generate_token(), generate_token());
    }

    #[test]
    fn test_hash_token_deterministic() {
        assert_eq!(hash_token("abc"), hash_token("abc"));
        assert_ne!(hash_token("abc"), hash_token("abd"));
        assert_eq!(hash_token("abc").len(), 64);
    }
}
