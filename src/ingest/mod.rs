// src/ingest/mod.rs
pub mod fetcher;
pub mod types;

use std::fmt::Write as _;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge};
use once_cell::sync::OnceCell;
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::classify::ClassifierTables;
use crate::ingest::types::UpdateFetcher;
use crate::model::{ExtractionResult, NewAidPoint, RawUpdate};
use crate::store::AidPointStore;

/// Rows older than this are hard-deleted after every cycle. Fixed, not
/// request-configurable.
pub const RETENTION_DAYS: i64 = 90;

const CONTENT_MAX_CHARS: usize = 500;

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("ingest_updates_total", "Raw updates fetched from the feed.");
        describe_counter!(
            "ingest_excluded_total",
            "Updates dropped by the military-term exclusion filter."
        );
        describe_counter!(
            "ingest_unresolved_total",
            "Updates classified without a location or category."
        );
        describe_counter!("ingest_upserted_total", "AidPoint rows created or refreshed.");
        describe_counter!(
            "ingest_upsert_errors_total",
            "Per-record store failures (logged and skipped)."
        );
        describe_counter!("ingest_deleted_total", "Rows removed by the retention pass.");
        describe_counter!("feed_items_total", "Items parsed out of the news feed.");
        describe_counter!("feed_fetch_retries_total", "Feed fetch attempts that were retried.");
        describe_counter!("feed_fetch_errors_total", "Feed fetches that failed after backoff.");
        describe_histogram!("feed_parse_ms", "Feed parse time in milliseconds.");
        describe_gauge!("ingest_last_run_ts", "Unix ts when the last ingest cycle ran.");
    });
}

/// Normalize scraped text: entity decode, strip tags, collapse whitespace,
/// drop trailing punctuation, cap length.
pub fn normalize_text(s: &str) -> String {
    let mut out = html_escape::decode_html_entities(s).to_string();

    static RE_TAGS: OnceCell<regex::Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[^>]+>").unwrap());
    out = re_tags.replace_all(&out, "").to_string();

    static RE_WS: OnceCell<regex::Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());
    out = re_ws.replace_all(&out, " ").to_string();
    out = out.trim().to_string();

    while let Some(last) = out.chars().last() {
        if matches!(last, '!' | '?' | '.' | ',' | '؟' | '،') {
            out.pop();
        } else {
            break;
        }
    }

    if out.chars().count() > CONTENT_MAX_CHARS {
        out = out.chars().take(CONTENT_MAX_CHARS).collect();
    }

    out
}

/// Stable upsert key for one source update: sha256 over the article link,
/// falling back to the content when the link is missing.
pub fn news_link_id(update: &RawUpdate) -> String {
    let src = if update.link.is_empty() {
        update.content.as_bytes()
    } else {
        update.link.as_bytes()
    };
    let digest = Sha256::digest(src);
    let mut out = String::with_capacity(64);
    for b in digest {
        let _ = write!(&mut out, "{b:02x}");
    }
    out
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct IngestOutcome {
    pub upserted: usize,
    pub deleted: usize,
}

/// One ingestion cycle: fetch, filter, classify, upsert, prune.
///
/// A fetch failure aborts the cycle. A per-record upsert failure is logged
/// and skipped; the batch and the retention pass still run. Retention
/// failures propagate.
pub async fn run_once(
    now: DateTime<Utc>,
    fetcher: &dyn UpdateFetcher,
    store: &dyn AidPointStore,
    tables: &ClassifierTables,
) -> Result<IngestOutcome> {
    ensure_metrics_described();

    let updates = fetcher
        .fetch_latest()
        .await
        .with_context(|| format!("fetching updates from {}", fetcher.name()))?;
    counter!("ingest_updates_total").increment(updates.len() as u64);

    let mut upserted = 0usize;
    for update in &updates {
        if !tables.should_include(&update.content) {
            counter!("ingest_excluded_total").increment(1);
            continue;
        }

        let ExtractionResult {
            location,
            category,
            needs,
            status,
            place_name,
            ..
        } = tables.classify(&update.content);

        let (Some((latitude, longitude)), Some(category), Some(name)) =
            (location, category, place_name)
        else {
            counter!("ingest_unresolved_total").increment(1);
            continue;
        };

        let record = NewAidPoint {
            news_link_id: news_link_id(update),
            name,
            description: update.content.clone(),
            latitude,
            longitude,
            needs,
            ngo_link: update.link.clone(),
            category,
            status,
        };

        match store.upsert(record, now) {
            Ok(_) => upserted += 1,
            Err(e) => {
                tracing::warn!(error = ?e, link = %update.link, "aid point upsert failed, skipping record");
                counter!("ingest_upsert_errors_total").increment(1);
            }
        }
    }

    let cutoff = now - Duration::days(RETENTION_DAYS);
    let deleted = store
        .delete_created_before(cutoff)
        .context("retention delete")?;

    counter!("ingest_upserted_total").increment(upserted as u64);
    counter!("ingest_deleted_total").increment(deleted as u64);
    gauge!("ingest_last_run_ts").set(now.timestamp() as f64);
    tracing::info!(
        target: "ingest",
        updates = updates.len(),
        upserted,
        deleted,
        "ingest cycle finished"
    );

    Ok(IngestOutcome { upserted, deleted })
}
