/// Login attempt throttling
///
/// Repeated failed logins for one email lock that email out for a while
/// (3 failures, 15 minutes by default). A successful login clears the
/// counter.
///
/// Two stores implement [`AttemptStore`]:
///
/// - [`MemoryAttemptStore`]: process-local, for single-instance deployments
///   and tests
/// - [`RedisAttemptStore`]: shared through Redis so every API instance sees
///   the same lockouts
///
/// # Example
///
/// ```no_run
/// use projectdesk_shared::auth::throttle::{AttemptStore, MemoryAttemptStore, ThrottleDecision, ThrottlePolicy};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = MemoryAttemptStore::new(ThrottlePolicy::default());
///
/// if let ThrottleDecision::Locked { retry_after } = store.check("dev@example.com").await? {
///     println!("locked for another {}s", retry_after.as_secs());
/// }
/// # Ok(())
/// # }
/// ```

use async_trait::async_trait;
use redis::AsyncCommands;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::redis::client::{RedisClient, RedisClientError};

/// Key prefix for attempt counters in Redis
const KEY_PREFIX: &str = "login_attempts:";

/// Error type for attempt stores
#[derive(Debug, thiserror::Error)]
pub enum ThrottleError {
    #[error("Attempt store unavailable: {0}")]
    Backend(#[from] RedisClientError),
}

impl From<redis::RedisError> for ThrottleError {
    fn from(err: redis::RedisError) -> Self {
        ThrottleError::Backend(err.into())
    }
}

/// How many failures lock an email, and for how long
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThrottlePolicy {
    pub max_attempts: u32,
    pub lock_duration: Duration,
}

impl Default for ThrottlePolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            lock_duration: Duration::from_secs(15 * 60),
        }
    }
}

/// Outcome of a throttle check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThrottleDecision {
    Allowed,
    Locked { retry_after: Duration },
}

impl ThrottleDecision {
    pub fn is_locked(&self) -> bool {
        matches!(self, ThrottleDecision::Locked { .. })
    }
}

/// Storage for failed login counters
#[async_trait]
pub trait AttemptStore: Send + Sync {
    /// Whether `email` may attempt a login now
    async fn check(&self, email: &str) -> Result<ThrottleDecision, ThrottleError>;

    /// Counts a failed login; returns `Locked` once the limit is reached
    async fn record_failure(&self, email: &str) -> Result<ThrottleDecision, ThrottleError>;

    /// Forgets every failure for `email`
    async fn reset(&self, email: &str) -> Result<(), ThrottleError>;

    /// Short backend name for health output
    fn backend(&self) -> &'static str;
}

fn normalize(email: &str) -> String {
    email.trim().to_lowercase()
}

#[derive(Debug, Default)]
struct AttemptEntry {
    failures: u32,
    last_failure: Option<Instant>,
    locked_until: Option<Instant>,
}

impl AttemptEntry {
    /// Still counting toward a lock, or still locked
    fn is_live(&self, now: Instant, window: Duration) -> bool {
        let locked = self.locked_until.is_some_and(|until| until > now);
        let recent = self
            .last_failure
            .is_some_and(|at| now.duration_since(at) < window);
        locked || recent
    }
}

#[derive(Debug)]
struct MemoryState {
    entries: HashMap<String, AttemptEntry>,
    last_sweep: Instant,
}

/// Process-local attempt store
///
/// Counters older than the lock duration are forgotten on the next failure.
/// At most once per lock duration, a failure also sweeps out every entry
/// that is neither locked nor recent, so emails that never come back do not
/// pile up.
#[derive(Debug)]
pub struct MemoryAttemptStore {
    policy: ThrottlePolicy,
    state: Mutex<MemoryState>,
}

impl MemoryAttemptStore {
    pub fn new(policy: ThrottlePolicy) -> Self {
        Self {
            policy,
            state: Mutex::new(MemoryState {
                entries: HashMap::new(),
                last_sweep: Instant::now(),
            }),
        }
    }

    /// Number of emails currently tracked
    pub async fn tracked(&self) -> usize {
        self.state.lock().await.entries.len()
    }

    fn sweep(&self, state: &mut MemoryState, now: Instant) {
        let window = self.policy.lock_duration;
        if now.duration_since(state.last_sweep) < window {
            return;
        }

        let before = state.entries.len();
        state.entries.retain(|_, entry| entry.is_live(now, window));
        state.last_sweep = now;

        tracing::debug!(
            removed = before - state.entries.len(),
            remaining = state.entries.len(),
            "Swept login attempt entries"
        );
    }
}

#[async_trait]
impl AttemptStore for MemoryAttemptStore {
    async fn check(&self, email: &str) -> Result<ThrottleDecision, ThrottleError> {
        let now = Instant::now();
        let mut state = self.state.lock().await;

        let Some(entry) = state.entries.get_mut(&normalize(email)) else {
            return Ok(ThrottleDecision::Allowed);
        };

        match entry.locked_until {
            Some(until) if until > now => Ok(ThrottleDecision::Locked {
                retry_after: until - now,
            }),
            Some(_) => {
                *entry = AttemptEntry::default();
                Ok(ThrottleDecision::Allowed)
            }
            None => Ok(ThrottleDecision::Allowed),
        }
    }

    async fn record_failure(&self, email: &str) -> Result<ThrottleDecision, ThrottleError> {
        let now = Instant::now();
        let mut state = self.state.lock().await;
        self.sweep(&mut state, now);
        let entry = state.entries.entry(normalize(email)).or_default();

        if let Some(until) = entry.locked_until {
            if until > now {
                return Ok(ThrottleDecision::Locked {
                    retry_after: until - now,
                });
            }
            *entry = AttemptEntry::default();
        }

        let stale = entry
            .last_failure
            .is_some_and(|at| now.duration_since(at) >= self.policy.lock_duration);
        if stale {
            entry.failures = 0;
        }

        entry.failures += 1;
        entry.last_failure = Some(now);

        if entry.failures >= self.policy.max_attempts {
            entry.locked_until = Some(now + self.policy.lock_duration);
            return Ok(ThrottleDecision::Locked {
                retry_after: self.policy.lock_duration,
            });
        }

        Ok(ThrottleDecision::Allowed)
    }

    async fn reset(&self, email: &str) -> Result<(), ThrottleError> {
        self.state.lock().await.entries.remove(&normalize(email));
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

/// Redis-backed attempt store
///
/// Keys per email:
/// - `login_attempts:{email}`: failure counter, expires with the lock duration
/// - `login_attempts:{email}:locked`: present while locked, TTL is the
///   remaining lock time
///
/// Counting and locking run in one Lua script so concurrent failures on
/// different instances cannot overshoot the limit.
#[derive(Clone)]
pub struct RedisAttemptStore {
    client: RedisClient,
    policy: ThrottlePolicy,
}

const RECORD_FAILURE_SCRIPT: &str = r#"
local counter = KEYS[1]
local lock = KEYS[2]
local max_attempts = tonumber(ARGV[1])
local lock_secs = tonumber(ARGV[2])

local ttl = redis.call('TTL', lock)
if ttl > 0 then
    return {1, ttl}
end

local failures = redis.call('INCR', counter)
redis.call('EXPIRE', counter, lock_secs)

if failures >= max_attempts then
    redis.call('SET', lock, failures, 'EX', lock_secs)
    redis.call('DEL', counter)
    return {1, lock_secs}
end

return {0, max_attempts - failures}
"#;

impl RedisAttemptStore {
    pub fn new(client: RedisClient, policy: ThrottlePolicy) -> Self {
        Self { client, policy }
    }

    fn keys(email: &str) -> (String, String) {
        let counter = format!("{}{}", KEY_PREFIX, normalize(email));
        let lock = format!("{}:locked", counter);
        (counter, lock)
    }

    async fn with_timeout<T, F>(&self, fut: F) -> Result<T, ThrottleError>
    where
        F: std::future::Future<Output = Result<T, redis::RedisError>>,
    {
        let timeout = self.client.config().command_timeout();
        tokio::time::timeout(timeout, fut)
            .await
            .map_err(|_| ThrottleError::Backend(RedisClientError::Timeout(timeout)))?
            .map_err(ThrottleError::from)
    }
}

#[async_trait]
impl AttemptStore for RedisAttemptStore {
    async fn check(&self, email: &str) -> Result<ThrottleDecision, ThrottleError> {
        let (_, lock) = Self::keys(email);
        let mut conn = self.client.get_connection();

        let ttl: i64 = self.with_timeout(conn.ttl(&lock)).await?;

        if ttl > 0 {
            Ok(ThrottleDecision::Locked {
                retry_after: Duration::from_secs(ttl as u64),
            })
        } else {
            Ok(ThrottleDecision::Allowed)
        }
    }

    async fn record_failure(&self, email: &str) -> Result<ThrottleDecision, ThrottleError> {
        let (counter, lock) = Self::keys(email);
        let mut conn = self.client.get_connection();

        let script = redis::Script::new(RECORD_FAILURE_SCRIPT);
        let mut invocation = script.key(&counter);
        invocation
            .key(&lock)
            .arg(self.policy.max_attempts)
            .arg(self.policy.lock_duration.as_secs());

        let result: Vec<i64> = self.with_timeout(invocation.invoke_async(&mut conn)).await?;

        match result.as_slice() {
            [1, ttl, ..] => Ok(ThrottleDecision::Locked {
                retry_after: Duration::from_secs((*ttl).max(0) as u64),
            }),
            _ => Ok(ThrottleDecision::Allowed),
        }
    }

    async fn reset(&self, email: &str) -> Result<(), ThrottleError> {
        let (counter, lock) = Self::keys(email);
        let mut conn = self.client.get_connection();

        let _: i64 = self.with_timeout(conn.del(vec![counter, lock])).await?;
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "redis"
    }
}
