/// Authentication and authorization
///
/// - `jwt`: HS256 access token creation and validation
/// - `password`: Argon2id password hashing
/// - `refresh`: opaque refresh token generation and hashing
/// - `middleware`: bearer-token Axum middleware loading the current user
/// - `authorization`: role checks for protected routes

pub mod authorization;
pub mod jwt;
pub mod middleware;
pub mod password;
pub mod refresh;
