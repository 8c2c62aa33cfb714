use std::{net::SocketAddr, str::FromStr, time::Duration};

use anyhow::Context;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub max_connections: u32,
    pub rate_limit_max_requests: usize,
    pub rate_limit_window: Duration,
    /// Shared counter store; counters stay in process memory when unset.
    pub rate_limit_store_url: Option<String>,
}

impl Config {
    /// Reads the process environment, falling back to a `.env` file.
    pub fn from_env() -> anyhow::Result<Config> {
        Self::from_lookup(|key| dotenv::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Config> {
        let database_url = lookup("DATABASE_URL").context("DATABASE_URL must be set")?;

        let rate_limit_max_requests = parse_or(&lookup, "RATE_LIMIT_MAX_REQUESTS", 3)?;
        let rate_limit_window_secs: u64 = parse_or(&lookup, "RATE_LIMIT_WINDOW_SECS", 60)?;
        anyhow::ensure!(rate_limit_max_requests > 0, "RATE_LIMIT_MAX_REQUESTS must be positive");
        anyhow::ensure!(rate_limit_window_secs > 0, "RATE_LIMIT_WINDOW_SECS must be positive");

        Ok(Config {
            database_url,
            bind_addr: parse_or(&lookup, "BIND_ADDR", SocketAddr::from(([0, 0, 0, 0], 8080)))?,
            max_connections: parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 16)?,
            rate_limit_max_requests,
            rate_limit_window: Duration::from_secs(rate_limit_window_secs),
            rate_limit_store_url: lookup("RATE_LIMIT_STORE_URL").or_else(|| lookup("REDIS_URL")),
        })
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw.parse().with_context(|| format!("invalid {key}: {raw:?}")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> anyhow::Result<Config> {
        let vars: HashMap<String, String> =
            vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_match_the_public_policy() {
        let config = config(&[("DATABASE_URL", "sqlite::memory:")]).unwrap();
        assert_eq!(config.bind_addr.port(), 8080);
        assert_eq!(config.rate_limit_max_requests, 3);
        assert_eq!(config.rate_limit_window, Duration::from_secs(60));
    }

    #[test]
    fn store_url_falls_back_to_redis_url() {
        let base = ("DATABASE_URL", "sqlite::memory:");
        assert_eq!(config(&[base]).unwrap().rate_limit_store_url, None);

        let config_with = |vars: &[(&str, &str)]| config(vars).unwrap().rate_limit_store_url;
        assert_eq!(
            config_with(&[base, ("REDIS_URL", "redis://cache:6379")]).as_deref(),
            Some("redis://cache:6379")
        );
        assert_eq!(
            config_with(&[base, ("REDIS_URL", "redis://cache:6379"), ("RATE_LIMIT_STORE_URL", "redis://limits:6379")])
                .as_deref(),
            Some("redis://limits:6379")
        );
    }

    #[test]
    fn database_url_is_required() {
        assert!(config(&[]).is_err());
    }

    #[test]
    fn bad_numbers_name_the_variable() {
        let err = config(&[("DATABASE_URL", "sqlite::memory:"), ("RATE_LIMIT_WINDOW_SECS", "soon")])
            .unwrap_err();
        assert!(err.to_string().contains("RATE_LIMIT_WINDOW_SECS"));
    }

    #[test]
    fn zero_quota_is_refused() {
        assert!(config(&[("DATABASE_URL", "sqlite::memory:"), ("RATE_LIMIT_MAX_REQUESTS", "0")]).is_err());
    }
}
