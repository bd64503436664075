/// Middleware for the API server
///
/// - `rate_limit`: in-memory token bucket per client
/// - `security`: security headers on every response

pub mod rate_limit;
pub mod security;
