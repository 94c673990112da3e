/// Database layer
///
/// # Modules
///
/// - `pool`: PostgreSQL connection pool with health checks
/// - `migrations`: Embedded schema migrations, applied at startup
///
/// Models and their queries live in the `models` module at crate root.

pub mod migrations;
pub mod pool;
