//! Per-client quota for mutating requests.
//!
//! Each [`Gate`] keeps its own counters per client address. A request is let
//! through while fewer than `max_requests` earlier admissions from the same
//! address fall inside the trailing `window`; rejected attempts are not counted.
//! Counters live in a [`CounterStore`]: process memory by default, or Redis
//! when a store URL is configured so that every instance shares them.

mod memory;
mod redis_store;

use std::{fmt, net::IpAddr, sync::Arc, time::Duration};

use async_trait::async_trait;

pub use memory::MemoryStore;
pub use redis_store::RedisStore;

use crate::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Gate {
    CreateMarker,
    EditMarker,
    DeleteMarker,
    CreateRoom,
}

impl fmt::Display for Gate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Gate::CreateMarker => write!(f, "create_marker"),
            Gate::EditMarker => write!(f, "edit_marker"),
            Gate::DeleteMarker => write!(f, "delete_marker"),
            Gate::CreateRoom => write!(f, "create_room"),
        }
    }
}

/// Outcome of one admission attempt against a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Admitted,
    Rejected { retry_after: Duration },
}

#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Counts a hit for `key` unless `max_requests` hits already fall inside `window`.
    async fn admit(&self, key: &str, max_requests: usize, window: Duration) -> anyhow::Result<Admission>;

    /// Forgets keys with no hits left in `window`.
    async fn sweep(&self, window: Duration);
}

/// Which store backs the counters, decided from configuration.
#[derive(Debug, Clone)]
pub enum StoreKind {
    Memory,
    Redis(redis::Client),
}

impl StoreKind {
    pub fn from_url(store_url: Option<&str>) -> anyhow::Result<StoreKind> {
        match store_url {
            None => Ok(StoreKind::Memory),
            Some(url) => Ok(StoreKind::Redis(redis::Client::open(url)?)),
        }
    }

    pub async fn connect(self) -> anyhow::Result<Arc<dyn CounterStore>> {
        match self {
            StoreKind::Memory => {
                tracing::info!("rate limit counters kept in process memory");
                Ok(Arc::new(MemoryStore::default()))
            }
            StoreKind::Redis(client) => {
                tracing::info!("rate limit counters kept in redis");
                Ok(Arc::new(RedisStore::connect(client).await?))
            }
        }
    }
}

pub struct RateLimiter {
    max_requests: usize,
    window: Duration,
    store: Arc<dyn CounterStore>,
}

impl fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RateLimiter")
            .field("max_requests", &self.max_requests)
            .field("window", &self.window)
            .finish_non_exhaustive()
    }
}

impl RateLimiter {
    pub fn new(max_requests: usize, window: Duration, store: Arc<dyn CounterStore>) -> Self {
        Self {
            max_requests,
            window,
            store,
        }
    }

    pub fn in_memory(max_requests: usize, window: Duration) -> Self {
        Self::new(max_requests, window, Arc::new(MemoryStore::default()))
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Records an admission for `client` at `gate`, or reports how long until one frees up.
    pub async fn check(&self, gate: Gate, client: IpAddr) -> Result<(), AppError> {
        let key = format!("{gate}:{client}");
        match self.store.admit(&key, self.max_requests, self.window).await? {
            Admission::Admitted => Ok(()),
            Admission::Rejected { retry_after } => {
                tracing::warn!(%gate, %client, ?retry_after, "rate limit exceeded");
                Err(AppError::RateLimited { retry_after })
            }
        }
    }

    pub async fn sweep(&self) {
        self.store.sweep(self.window).await;
    }
}

#[cfg(test)]
mod tests {
    use std::net::Ipv4Addr;

    use super::*;

    const ALICE: IpAddr = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1));
    const BOB: IpAddr = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 2));

    fn limiter() -> RateLimiter {
        RateLimiter::in_memory(3, Duration::from_secs(60))
    }

    #[tokio::test(start_paused = true)]
    async fn fourth_request_in_window_is_rejected() {
        let limiter = limiter();
        for _ in 0..3 {
            limiter.check(Gate::CreateMarker, ALICE).await.unwrap();
        }

        match limiter.check(Gate::CreateMarker, ALICE).await {
            Err(AppError::RateLimited { retry_after }) => assert_eq!(retry_after, Duration::from_secs(60)),
            other => panic!("expected rate limit, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn gates_and_clients_are_independent() {
        let limiter = limiter();
        for _ in 0..3 {
            limiter.check(Gate::CreateMarker, ALICE).await.unwrap();
        }

        limiter.check(Gate::CreateRoom, ALICE).await.unwrap();
        limiter.check(Gate::CreateMarker, BOB).await.unwrap();
        assert!(limiter.check(Gate::CreateMarker, ALICE).await.is_err());
    }

    #[test]
    fn no_store_url_keeps_counters_in_memory() {
        assert!(matches!(StoreKind::from_url(None).unwrap(), StoreKind::Memory));
    }

    #[test]
    fn redis_url_selects_redis() {
        let kind = StoreKind::from_url(Some("redis://127.0.0.1:6379/0")).unwrap();
        assert!(matches!(kind, StoreKind::Redis(_)));
    }

    #[test]
    fn malformed_store_url_is_refused() {
        assert!(StoreKind::from_url(Some("not a url")).is_err());
        assert!(StoreKind::from_url(Some("http://127.0.0.1:6379")).is_err());
    }

    #[tokio::test]
    async fn memory_kind_connects_without_a_server() {
        let store = StoreKind::Memory.connect().await.unwrap();
        let window = Duration::from_secs(60);
        assert_eq!(store.admit("k", 1, window).await.unwrap(), Admission::Admitted);
        assert!(matches!(store.admit("k", 1, window).await.unwrap(), Admission::Rejected { .. }));
    }
}
