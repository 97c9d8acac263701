//! Record types shared across the ingestion pipeline and the read view.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One scraped news update. Ephemeral: lives only within a single ingestion
/// cycle, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawUpdate {
    /// Publication timestamp as reported by the feed (RFC 3339 when the feed
    /// date parsed, otherwise the raw string).
    pub time: String,
    pub link: String,
    pub content: String,
}

/// Aid category of a point on the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Category {
    Medical,
    Military,
    Humanitarian,
    Food,
    Water,
    Shelter,
}

/// Operational status of an aid point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    #[default]
    Active,
    Urgent,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    High,
    Medium,
    #[default]
    Low,
}

/// What the classifier extracted from one update's text. An all-empty result
/// is legal; without both a location and a category no AidPoint is created.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExtractionResult {
    pub location: Option<(f64, f64)>,
    pub category: Option<Category>,
    pub needs: Vec<String>,
    pub status: Status,
    pub severity: Severity,
    pub place_name: Option<String>,
}

/// Persisted row: one ingested, geotagged update. `news_link_id` is the
/// upsert key (a content/link hash) — the same physical place can hold
/// several rows from different updates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AidPoint {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub latitude: f64,
    pub longitude: f64,
    /// JSON-encoded string array; parse/serialize at the boundary.
    pub needs: String,
    pub ngo_link: String,
    pub category: Category,
    pub status: Status,
    pub last_updated: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub news_link_id: String,
}

impl AidPoint {
    /// Decode the serialized needs column. An unparseable column reads as
    /// empty rather than failing the whole view.
    pub fn needs_list(&self) -> Vec<String> {
        serde_json::from_str(&self.needs).unwrap_or_default()
    }
}

/// Mutable fields of an upsert; the store fills in `id`, `created_at` and
/// `last_updated`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAidPoint {
    pub news_link_id: String,
    pub name: String,
    pub description: String,
    pub latitude: f64,
    pub longitude: f64,
    pub needs: Vec<String>,
    pub ngo_link: String,
    pub category: Category,
    pub status: Status,
}

pub fn encode_needs(needs: &[String]) -> String {
    serde_json::to_string(needs).unwrap_or_else(|_| "[]".to_string())
}

/// One source update attached to a map location.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsUpdate {
    pub link: String,
    pub time: DateTime<Utc>,
    pub excerpt: String,
}

/// Display-oriented aggregation of AidPoints sharing a rounded coordinate and
/// name. Never persisted; recomputed from rows on every read.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReliefLocation {
    pub id: i64,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub category: Category,
    pub status: Status,
    pub needs: Vec<String>,
    pub news_updates: Vec<NewsUpdate>,
    pub last_updated: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn needs_round_trip_through_serialized_column() {
        let needs = vec!["Medical Supplies".to_string(), "Fuel".to_string()];
        let encoded = encode_needs(&needs);
        let point = AidPoint {
            id: 1,
            name: "x".into(),
            description: String::new(),
            latitude: 0.0,
            longitude: 0.0,
            needs: encoded,
            ngo_link: String::new(),
            category: Category::Medical,
            status: Status::Active,
            last_updated: Utc::now(),
            created_at: Utc::now(),
            news_link_id: "abc".into(),
        };
        assert_eq!(point.needs_list(), needs);
    }

    #[test]
    fn garbage_needs_column_reads_as_empty() {
        let point = AidPoint {
            id: 1,
            name: "x".into(),
            description: String::new(),
            latitude: 0.0,
            longitude: 0.0,
            needs: "not json".into(),
            ngo_link: String::new(),
            category: Category::Food,
            status: Status::Active,
            last_updated: Utc::now(),
            created_at: Utc::now(),
            news_link_id: "abc".into(),
        };
        assert!(point.needs_list().is_empty());
    }

    #[test]
    fn category_serializes_uppercase() {
        assert_eq!(
            serde_json::to_string(&Category::Medical).unwrap(),
            "\"MEDICAL\""
        );
        assert_eq!(serde_json::to_string(&Status::Critical).unwrap(), "\"CRITICAL\"");
        assert_eq!(serde_json::to_string(&Severity::High).unwrap(), "\"high\"");
    }
}
