//! AidPoint store seam. The persistence engine proper is a collaborator; the
//! pipeline only needs upsert-by-hash, enumeration, and retention deletes.

use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::Result;
use chrono::{DateTime, Utc};

use crate::model::{encode_needs, AidPoint, NewAidPoint};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upserted {
    Created,
    Updated,
}

pub trait AidPointStore: Send + Sync {
    /// Insert or refresh the row keyed by `news_link_id`. The update path
    /// refreshes mutable fields and `last_updated` without touching
    /// `created_at`; the create path stamps both timestamps with `now`.
    fn upsert(&self, record: NewAidPoint, now: DateTime<Utc>) -> Result<Upserted>;

    /// All rows in insertion order.
    fn all(&self) -> Result<Vec<AidPoint>>;

    /// Hard-delete rows created before `cutoff`; returns how many went.
    fn delete_created_before(&self, cutoff: DateTime<Utc>) -> Result<usize>;
}

/// In-memory implementation backing the service. Insertion-ordered rows plus
/// a hash index, so reads enumerate stably.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    rows: Vec<AidPoint>,
    by_hash: HashMap<String, usize>,
    next_id: i64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AidPointStore for MemoryStore {
    fn upsert(&self, record: NewAidPoint, now: DateTime<Utc>) -> Result<Upserted> {
        let mut inner = self.inner.lock().expect("store mutex poisoned");

        let existing = inner.by_hash.get(&record.news_link_id).copied();
        if let Some(i) = existing {
            let row = &mut inner.rows[i];
            row.name = record.name;
            row.description = record.description;
            row.latitude = record.latitude;
            row.longitude = record.longitude;
            row.needs = encode_needs(&record.needs);
            row.ngo_link = record.ngo_link;
            row.category = record.category;
            row.status = record.status;
            row.last_updated = now;
            return Ok(Upserted::Updated);
        }

        inner.next_id += 1;
        let id = inner.next_id;
        let row = AidPoint {
            id,
            name: record.name,
            description: record.description,
            latitude: record.latitude,
            longitude: record.longitude,
            needs: encode_needs(&record.needs),
            ngo_link: record.ngo_link,
            category: record.category,
            status: record.status,
            last_updated: now,
            created_at: now,
            news_link_id: record.news_link_id.clone(),
        };
        let idx = inner.rows.len();
        inner.rows.push(row);
        inner.by_hash.insert(record.news_link_id, idx);
        Ok(Upserted::Created)
    }

    fn all(&self) -> Result<Vec<AidPoint>> {
        let inner = self.inner.lock().expect("store mutex poisoned");
        Ok(inner.rows.clone())
    }

    fn delete_created_before(&self, cutoff: DateTime<Utc>) -> Result<usize> {
        let mut inner = self.inner.lock().expect("store mutex poisoned");
        let before = inner.rows.len();
        inner.rows.retain(|row| row.created_at >= cutoff);
        let removed = before - inner.rows.len();
        if removed > 0 {
            let rebuilt: HashMap<String, usize> = inner
                .rows
                .iter()
                .enumerate()
                .map(|(i, row)| (row.news_link_id.clone(), i))
                .collect();
            inner.by_hash = rebuilt;
        }
        Ok(removed)
    }
}
