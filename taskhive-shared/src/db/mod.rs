/// Database access layer
///
/// - `pool`: PostgreSQL connection pool construction and health checks
/// - `migrations`: sqlx migration runner
/// - `seed`: first-run seeding of the admin account and default categories

pub mod migrations;
pub mod pool;
pub mod seed;
