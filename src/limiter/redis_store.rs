use std::time::Duration;

use async_trait::async_trait;
use redis::{aio::ConnectionManager, Client, Script};
use uuid::Uuid;

use super::{Admission, CounterStore};

const KEY_PREFIX: &str = "mapmarkers:ratelimit:";

// Sorted set per key, scored by admission time in ms from the server clock so
// every instance agrees. Returns -1 when admitted, else ms until a slot frees.
const ADMIT_SCRIPT: &str = r#"
local t = redis.call('TIME')
local now = tonumber(t[1]) * 1000 + math.floor(tonumber(t[2]) / 1000)
local window = tonumber(ARGV[1])
local max = tonumber(ARGV[2])
redis.call('ZREMRANGEBYSCORE', KEYS[1], '-inf', now - window)
if redis.call('ZCARD', KEYS[1]) >= max then
    local oldest = redis.call('ZRANGE', KEYS[1], 0, 0, 'WITHSCORES')
    return math.max(tonumber(oldest[2]) + window - now, 0)
end
redis.call('ZADD', KEYS[1], now, ARGV[3])
redis.call('PEXPIRE', KEYS[1], window)
return -1
"#;

/// Counters shared by every instance pointed at the same Redis.
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
    script: Script,
}

impl RedisStore {
    pub async fn connect(client: Client) -> redis::RedisResult<RedisStore> {
        let conn = ConnectionManager::new(client).await?;
        Ok(RedisStore {
            conn,
            script: Script::new(ADMIT_SCRIPT),
        })
    }
}

#[async_trait]
impl CounterStore for RedisStore {
    async fn admit(&self, key: &str, max_requests: usize, window: Duration) -> anyhow::Result<Admission> {
        let mut conn = self.conn.clone();
        let wait_ms: i64 = self
            .script
            .key(format!("{KEY_PREFIX}{key}"))
            .arg(window.as_millis() as u64)
            .arg(max_requests)
            .arg(Uuid::now_v7().to_string())
            .invoke_async(&mut conn)
            .await?;

        Ok(match u64::try_from(wait_ms) {
            Ok(ms) => Admission::Rejected { retry_after: Duration::from_millis(ms) },
            Err(_) => Admission::Admitted,
        })
    }

    // keys expire on their own via PEXPIRE
    async fn sweep(&self, _window: Duration) {}
}
