//! Environment-backed service configuration, resolved once at startup.

use std::env;

pub const ENV_NEWS_FEED_URL: &str = "NEWS_FEED_URL";
pub const ENV_INGEST_SHARED_SECRET: &str = "INGEST_SHARED_SECRET";
pub const ENV_FETCH_CACHE_TTL_SECS: &str = "FETCH_CACHE_TTL_SECS";

pub const DEFAULT_FEED_URL: &str = "https://www.aljazeera.net/xml/rss/all.xml";
pub const DEFAULT_CACHE_TTL_SECS: u64 = 300;
// Dev-only fallback; deployments must set INGEST_SHARED_SECRET.
pub const DEFAULT_DEV_SECRET: &str = "dev-secret";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub feed_url: String,
    pub shared_secret: String,
    pub cache_ttl_secs: u64,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let feed_url =
            env::var(ENV_NEWS_FEED_URL).unwrap_or_else(|_| DEFAULT_FEED_URL.to_string());
        let shared_secret = env::var(ENV_INGEST_SHARED_SECRET)
            .unwrap_or_else(|_| DEFAULT_DEV_SECRET.to_string());
        let cache_ttl_secs = parse_ttl(env::var(ENV_FETCH_CACHE_TTL_SECS).ok());

        Self {
            feed_url,
            shared_secret,
            cache_ttl_secs,
        }
    }
}

fn parse_ttl(raw: Option<String>) -> u64 {
    raw.and_then(|s| s.trim().parse::<u64>().ok())
        .unwrap_or(DEFAULT_CACHE_TTL_SECS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ttl_parses_or_defaults() {
        assert_eq!(parse_ttl(Some("120".into())), 120);
        assert_eq!(parse_ttl(Some(" 60 ".into())), 60);
        assert_eq!(parse_ttl(Some("abc".into())), DEFAULT_CACHE_TTL_SECS);
        assert_eq!(parse_ttl(None), DEFAULT_CACHE_TTL_SECS);
    }

    #[serial_test::serial]
    #[test]
    fn from_env_reads_overrides() {
        env::set_var(ENV_NEWS_FEED_URL, "https://feed.test/rss");
        env::set_var(ENV_INGEST_SHARED_SECRET, "s3cret");
        env::set_var(ENV_FETCH_CACHE_TTL_SECS, "42");

        let cfg = AppConfig::from_env();
        assert_eq!(cfg.feed_url, "https://feed.test/rss");
        assert_eq!(cfg.shared_secret, "s3cret");
        assert_eq!(cfg.cache_ttl_secs, 42);

        env::remove_var(ENV_NEWS_FEED_URL);
        env::remove_var(ENV_INGEST_SHARED_SECRET);
        env::remove_var(ENV_FETCH_CACHE_TTL_SECS);

        let cfg = AppConfig::from_env();
        assert_eq!(cfg.feed_url, DEFAULT_FEED_URL);
        assert_eq!(cfg.shared_secret, DEFAULT_DEV_SECRET);
        assert_eq!(cfg.cache_ttl_secs, DEFAULT_CACHE_TTL_SECS);
    }
}
