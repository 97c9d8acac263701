use anyhow::{Context, Result};
use async_trait::async_trait;
use metrics::{counter, histogram};
use quick_xml::de::from_str;
use serde::Deserialize;
use time::format_description::well_known::{Rfc2822, Rfc3339};
use time::{OffsetDateTime, UtcOffset};

use crate::cache::ResponseCache;
use crate::ingest::normalize_text;
use crate::ingest::types::UpdateFetcher;
use crate::model::RawUpdate;

const MAX_FETCH_ATTEMPTS: u32 = 3;
const INITIAL_BACKOFF_MS: u64 = 500;

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}
#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    item: Vec<Item>,
}
#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    description: Option<String>,
}

/// Normalize the feed's RFC 2822 pubDate to RFC 3339; keep the raw string
/// when it doesn't parse.
fn normalize_pub_date(ts: &str) -> String {
    OffsetDateTime::parse(ts, &Rfc2822)
        .ok()
        .map(|dt| dt.to_offset(UtcOffset::UTC))
        .and_then(|dt| dt.format(&Rfc3339).ok())
        .unwrap_or_else(|| ts.to_string())
}

/// RSS-over-HTTP fetcher for the news site's update feed.
pub struct NewsFeedFetcher {
    mode: Mode,
    cache: ResponseCache,
    cache_ttl_secs: u64,
}

enum Mode {
    Fixture(String),
    Http { url: String, client: reqwest::Client },
}

impl NewsFeedFetcher {
    /// Parse a canned feed body. Used by tests and offline runs.
    pub fn from_fixture_str(s: &str) -> Self {
        Self {
            mode: Mode::Fixture(s.to_string()),
            cache: ResponseCache::new(),
            cache_ttl_secs: 0,
        }
    }

    pub fn from_url(url: impl Into<String>, cache_ttl_secs: u64) -> Self {
        Self {
            mode: Mode::Http {
                url: url.into(),
                client: reqwest::Client::new(),
            },
            cache: ResponseCache::new(),
            cache_ttl_secs,
        }
    }

    fn parse_items(s: &str) -> Result<Vec<RawUpdate>> {
        let t0 = std::time::Instant::now();
        let xml_clean = scrub_html_entities_for_xml(s);
        let rss: Rss = from_str(&xml_clean).context("parsing news feed xml")?;

        let mut out = Vec::with_capacity(rss.channel.item.len());
        for it in rss.channel.item {
            let text_raw = format!(
                "{}. {}",
                it.title.as_deref().unwrap_or_default(),
                it.description.as_deref().unwrap_or_default()
            );
            let content = normalize_text(&text_raw);
            if content.is_empty() {
                continue;
            }

            out.push(RawUpdate {
                time: it
                    .pub_date
                    .as_deref()
                    .map(normalize_pub_date)
                    .unwrap_or_default(),
                link: it.link.unwrap_or_default(),
                content,
            });
        }

        let ms = t0.elapsed().as_secs_f64() * 1_000.0;
        histogram!("feed_parse_ms").record(ms);
        counter!("feed_items_total").increment(out.len() as u64);
        Ok(out)
    }

    /// GET with exponential backoff, capped at a small fixed attempt count.
    async fn fetch_body(client: &reqwest::Client, url: &str) -> Result<String> {
        let mut delay = std::time::Duration::from_millis(INITIAL_BACKOFF_MS);
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            match client
                .get(url)
                .send()
                .await
                .and_then(|r| r.error_for_status())
            {
                Ok(resp) => return resp.text().await.context("news feed .text()"),
                Err(e) if attempt < MAX_FETCH_ATTEMPTS => {
                    tracing::warn!(error = ?e, attempt, "news feed fetch failed, retrying");
                    counter!("feed_fetch_retries_total").increment(1);
                    tokio::time::sleep(delay).await;
                    delay *= 2;
                }
                Err(e) => {
                    counter!("feed_fetch_errors_total").increment(1);
                    return Err(e).context("news feed get()");
                }
            }
        }
    }
}

#[async_trait]
impl UpdateFetcher for NewsFeedFetcher {
    async fn fetch_latest(&self) -> Result<Vec<RawUpdate>> {
        match &self.mode {
            Mode::Fixture(s) => Self::parse_items(s),

            Mode::Http { url, client } => {
                let now = chrono::Utc::now().timestamp().max(0) as u64;
                let body = match self.cache.get(url, now, self.cache_ttl_secs) {
                    Some(cached) => cached,
                    None => {
                        let fresh = Self::fetch_body(client, url).await?;
                        self.cache.put(url, now, fresh.clone());
                        fresh
                    }
                };
                Self::parse_items(&body)
            }
        }
    }

    fn name(&self) -> &'static str {
        "news-feed"
    }
}

fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pub_date_normalizes_to_rfc3339() {
        let out = normalize_pub_date("Tue, 05 Aug 2025 14:30:00 +0200");
        assert_eq!(out, "2025-08-05T12:30:00Z");
    }

    #[test]
    fn unparseable_pub_date_passes_through() {
        assert_eq!(normalize_pub_date("yesterday"), "yesterday");
    }

    #[test]
    fn items_without_text_are_skipped() {
        let xml = r#"<rss><channel>
            <item><title></title><link>https://news.test/1</link></item>
            <item><title>تحديث</title><link>https://news.test/2</link></item>
        </channel></rss>"#;
        let out = NewsFeedFetcher::parse_items(xml).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].link, "https://news.test/2");
        assert_eq!(out[0].content, "تحديث");
    }
}
