/// API route handlers, one module per resource
///
/// - `health`: health check
/// - `auth`: registration, login, token refresh, logout, current user
/// - `users`: user administration, settings, password changes
/// - `tasks`: task CRUD, history, comments, attachments
/// - `categories`: category CRUD
/// - `notifications`: notification list and read state
/// - `dashboard`: stats, activity, and chart data

pub mod auth;
pub mod categories;
pub mod dashboard;
pub mod health;
pub mod notifications;
pub mod tasks;
pub mod users;
