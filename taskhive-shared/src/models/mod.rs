/// Database models
///
/// One module per table, each owning its SQL. Handlers and scheduler jobs go
/// through these operations instead of issuing ad-hoc queries.
///
/// # Models
///
/// - `user`: accounts, roles, and profile data
/// - `settings`: per-user notification/theme preferences
/// - `category`: task categories
/// - `task`: tasks, filtering, recurrence, and dashboard counts
/// - `comment`: threaded task comments
/// - `attachment`: uploaded file metadata
/// - `notification`: in-app notifications
/// - `history`: field-level task audit trail
/// - `refresh_token`: server-side refresh token store

pub mod attachment;
pub mod category;
pub mod comment;
pub mod history;
pub mod notification;
pub mod refresh_token;
pub mod settings;
pub mod task;
pub mod user;
