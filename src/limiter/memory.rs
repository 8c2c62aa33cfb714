use std::{
    collections::{HashMap, VecDeque},
    sync::Mutex,
    time::Duration,
};

use async_trait::async_trait;
use tokio::time::Instant;

use super::{Admission, CounterStore};

/// Rolling-window counters for a single process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    hits: Mutex<HashMap<String, VecDeque<Instant>>>,
}

impl MemoryStore {
    #[cfg(test)]
    fn tracked(&self) -> usize {
        self.hits.lock().unwrap().len()
    }
}

#[async_trait]
impl CounterStore for MemoryStore {
    async fn admit(&self, key: &str, max_requests: usize, window: Duration) -> anyhow::Result<Admission> {
        let now = Instant::now();
        let mut hits = self.hits.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let recent = hits.entry(key.to_owned()).or_default();

        while recent.front().is_some_and(|&at| now.duration_since(at) >= window) {
            recent.pop_front();
        }

        if recent.len() >= max_requests {
            let retry_after = match recent.front() {
                Some(&oldest) => window.saturating_sub(now.duration_since(oldest)),
                None => window,
            };
            return Ok(Admission::Rejected { retry_after });
        }

        recent.push_back(now);
        Ok(Admission::Admitted)
    }

    async fn sweep(&self, window: Duration) {
        let now = Instant::now();
        let mut hits = self.hits.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        hits.retain(|_, recent| recent.back().is_some_and(|&at| now.duration_since(at) < window));
    }
}
