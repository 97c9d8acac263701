// tests/ingest_upsert.rs
//
// Orchestrator-level behavior against the store seam: upsert idempotence,
// retention, and per-record failure tolerance.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use relief_tracker::classify::{ClassifierTables, DEFAULT_KEYWORDS};
use relief_tracker::ingest::{self, types::UpdateFetcher, RETENTION_DAYS};
use relief_tracker::model::{Category, NewAidPoint, RawUpdate, Status};
use relief_tracker::store::{AidPointStore, MemoryStore};

struct FixedFetcher(Vec<RawUpdate>);

#[async_trait]
impl UpdateFetcher for FixedFetcher {
    async fn fetch_latest(&self) -> Result<Vec<RawUpdate>> {
        Ok(self.0.clone())
    }
    fn name(&self) -> &'static str {
        "FixedFetcher"
    }
}

/// Store whose upsert always fails; reads and retention still work.
struct RejectingStore(MemoryStore);

impl AidPointStore for RejectingStore {
    fn upsert(&self, _record: NewAidPoint, _now: DateTime<Utc>) -> Result<relief_tracker::store::Upserted> {
        Err(anyhow!("store rejected the row"))
    }
    fn all(&self) -> Result<Vec<relief_tracker::model::AidPoint>> {
        self.0.all()
    }
    fn delete_created_before(&self, cutoff: DateTime<Utc>) -> Result<usize> {
        self.0.delete_created_before(cutoff)
    }
}

fn tables() -> ClassifierTables {
    ClassifierTables::from_toml_str(DEFAULT_KEYWORDS).expect("tables")
}

fn shifa_update() -> RawUpdate {
    RawUpdate {
        time: "2025-08-05T09:15:00Z".into(),
        link: "https://news.test/shifa-supplies".into(),
        content: "مستشفى الشفاء يحتاج إلى مستلزمات طبية".into(),
    }
}

fn seed_point(hash: &str) -> NewAidPoint {
    NewAidPoint {
        news_link_id: hash.to_string(),
        name: "Seed".into(),
        description: "seeded".into(),
        latitude: 31.5,
        longitude: 34.46,
        needs: vec![],
        ngo_link: String::new(),
        category: Category::Humanitarian,
        status: Status::Active,
    }
}

#[tokio::test]
async fn reingesting_same_update_keeps_one_row_and_refreshes_timestamp() {
    let fetcher = FixedFetcher(vec![shifa_update()]);
    let store = MemoryStore::new();
    let tables = tables();

    let t0 = Utc::now();
    let t1 = t0 + Duration::hours(2);

    let first = ingest::run_once(t0, &fetcher, &store, &tables).await.unwrap();
    assert_eq!(first.upserted, 1);

    let second = ingest::run_once(t1, &fetcher, &store, &tables).await.unwrap();
    assert_eq!(second.upserted, 1);

    let rows = store.all().unwrap();
    assert_eq!(rows.len(), 1, "same news_link_id must not duplicate");
    assert_eq!(rows[0].created_at, t0, "created_at must survive the update path");
    assert_eq!(rows[0].last_updated, t1, "last_updated must advance");
    assert_eq!(rows[0].name, "Al-Shifa Hospital");
    assert_eq!(rows[0].category, Category::Medical);
}

#[tokio::test]
async fn retention_removes_only_rows_older_than_the_window() {
    let fetcher = FixedFetcher(vec![]);
    let store = MemoryStore::new();
    let tables = tables();
    let now = Utc::now();

    store
        .upsert(seed_point("old"), now - Duration::days(RETENTION_DAYS + 1))
        .unwrap();
    store
        .upsert(seed_point("young"), now - Duration::days(RETENTION_DAYS - 1))
        .unwrap();

    let outcome = ingest::run_once(now, &fetcher, &store, &tables).await.unwrap();
    assert_eq!(outcome.deleted, 1);

    let rows = store.all().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].news_link_id, "young");
}

#[tokio::test]
async fn military_only_updates_never_reach_the_store() {
    let fetcher = FixedFetcher(vec![RawUpdate {
        time: String::new(),
        link: "https://news.test/military".into(),
        content: "تحركات جنود ودبابات قرب الحدود".into(),
    }]);
    let store = MemoryStore::new();

    let outcome = ingest::run_once(Utc::now(), &fetcher, &store, &tables())
        .await
        .unwrap();
    assert_eq!(outcome.upserted, 0);
    assert!(store.all().unwrap().is_empty());
}

#[tokio::test]
async fn updates_without_location_or_category_are_skipped() {
    let fetcher = FixedFetcher(vec![RawUpdate {
        time: String::new(),
        link: "https://news.test/no-signal".into(),
        content: "تعليق عام على الأحداث".into(),
    }]);
    let store = MemoryStore::new();

    let outcome = ingest::run_once(Utc::now(), &fetcher, &store, &tables())
        .await
        .unwrap();
    assert_eq!(outcome.upserted, 0);
    assert!(store.all().unwrap().is_empty());
}

#[tokio::test]
async fn per_record_store_failure_does_not_abort_the_cycle() {
    let fetcher = FixedFetcher(vec![shifa_update()]);
    let store = RejectingStore(MemoryStore::new());

    let outcome = ingest::run_once(Utc::now(), &fetcher, &store, &tables())
        .await
        .expect("cycle must survive per-record failures");
    assert_eq!(outcome.upserted, 0);
    assert_eq!(outcome.deleted, 0);
}
