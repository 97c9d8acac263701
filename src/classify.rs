//! Arabic keyword classifier: ordered tables compiled from a TOML document.
//!
//! Every table is an explicit ordered list evaluated front to back. Order IS
//! the tie-break: the place table resolves by first substring match, not by
//! specificity, which is why the document keeps facilities before cities and
//! cities before generic terms.

use anyhow::{anyhow, Context};
use serde::Deserialize;

use crate::model::{Category, ExtractionResult, Severity, Status};

pub const DEFAULT_KEYWORDS: &str = include_str!("../config/keywords.toml");
pub const ENV_KEYWORDS_CONFIG_PATH: &str = "KEYWORDS_CONFIG_PATH";

#[derive(Debug, Clone, Deserialize)]
pub struct PlaceEntry {
    /// Arabic substring that triggers this entry.
    pub keyword: String,
    /// Display name for the map.
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub needs: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContextGroup {
    pub category: Category,
    pub keywords: Vec<String>,
    #[serde(default)]
    pub needs: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeverityGroup {
    pub severity: Severity,
    pub status: Status,
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FallbackEntry {
    pub region_keywords: Vec<String>,
    pub name: String,
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InclusionFilter {
    pub exclude: Vec<String>,
    pub civilian: Vec<String>,
}

/// The compiled tables. Construct once at startup and share behind an `Arc`.
#[derive(Debug, Clone, Deserialize)]
pub struct ClassifierTables {
    pub fallback: FallbackEntry,
    pub filter: InclusionFilter,
    #[serde(default)]
    pub places: Vec<PlaceEntry>,
    #[serde(default)]
    pub context: Vec<ContextGroup>,
    #[serde(default)]
    pub severity: Vec<SeverityGroup>,
}

impl ClassifierTables {
    pub fn from_toml_str(raw: &str) -> anyhow::Result<Self> {
        let tables: Self = toml::from_str(raw).context("parsing keyword tables")?;
        if tables.places.is_empty() {
            return Err(anyhow!("keyword tables: place table must not be empty"));
        }
        if tables.filter.exclude.is_empty() || tables.filter.civilian.is_empty() {
            return Err(anyhow!("keyword tables: filter lists must not be empty"));
        }
        Ok(tables)
    }

    /// Embedded tables, overridable via `KEYWORDS_CONFIG_PATH`.
    pub fn load_default() -> anyhow::Result<Self> {
        if let Ok(path) = std::env::var(ENV_KEYWORDS_CONFIG_PATH) {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("reading keyword tables from {path}"))?;
            return Self::from_toml_str(&content);
        }
        Self::from_toml_str(DEFAULT_KEYWORDS)
    }

    /// Inclusion filter, applied upstream of classification: drop updates
    /// about military activity unless they also carry civilian signal.
    pub fn should_include(&self, content: &str) -> bool {
        let excluded = contains_any(content, &self.filter.exclude);
        if !excluded {
            return true;
        }
        contains_any(content, &self.filter.civilian)
    }

    /// Classify one update's text. Never fails; absence of a location or
    /// category simply means no AidPoint is created downstream.
    pub fn classify(&self, content: &str) -> ExtractionResult {
        let mut out = ExtractionResult::default();

        // Location: first substring match wins, table order is the tie-break.
        for place in &self.places {
            if content.contains(place.keyword.as_str()) {
                out.location = Some((place.lat, place.lon));
                out.place_name = Some(place.name.clone());
                out.category = place.category;
                for need in &place.needs {
                    push_unique(&mut out.needs, need);
                }
                break;
            }
        }

        // Region-center fallback: a region mention plus civilian signal.
        if out.location.is_none()
            && contains_any(content, &self.fallback.region_keywords)
            && contains_any(content, &self.filter.civilian)
        {
            out.location = Some((self.fallback.lat, self.fallback.lon));
            out.place_name = Some(self.fallback.name.clone());
        }

        // Context enrichment: every matching group unions its needs; the
        // first matching group also sets the category when still unset.
        for group in &self.context {
            if contains_any(content, &group.keywords) {
                for need in &group.needs {
                    push_unique(&mut out.needs, need);
                }
                if out.category.is_none() {
                    out.category = Some(group.category);
                }
            }
        }

        // Severity: ordered high -> low, first matching group wins.
        for group in &self.severity {
            if contains_any(content, &group.keywords) {
                out.severity = group.severity;
                out.status = group.status;
                break;
            }
        }

        out
    }
}

fn contains_any(content: &str, terms: &[String]) -> bool {
    terms.iter().any(|t| content.contains(t.as_str()))
}

fn push_unique(needs: &mut Vec<String>, need: &str) {
    if !needs.iter().any(|n| n == need) {
        needs.push(need.to_string());
    }
}
