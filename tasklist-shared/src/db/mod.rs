/// Database layer
///
/// - `pool`: PostgreSQL connection pool with health checks
/// - `migrations`: Embedded schema migrations
///
/// Queries themselves live in `store::postgres`.

pub mod migrations;
pub mod pool;
