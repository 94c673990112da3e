/// Redis integration
///
/// Redis is only needed when several API instances run behind a load
/// balancer: the login attempt store keeps its counters and lockouts there so
/// every instance sees the same state.
///
/// ```text
/// ┌────────────┐   INCR/EXPIRE   login_attempts:{email}
/// │ API (n)    │ ──────────────> login_attempts:{email}:locked (TTL 15m)
/// └────────────┘
/// ```

pub mod client;

pub use client::{RedisClient, RedisClientError, RedisConfig};
