//! Map-view aggregation: groups AidPoint rows into ReliefLocations and
//! spreads groups that share a coordinate cell so markers don't stack.
//!
//! Pure over its input slice. Groups form in first-seen input order; no
//! canonical sort is imposed before jitter assignment, so the offsets are
//! deterministic per input sequence, not across arbitrary re-orderings.

use std::collections::HashMap;
use std::f64::consts::PI;

use crate::model::{AidPoint, NewsUpdate, ReliefLocation};

/// ~200 m per jitter step at this latitude.
const JITTER_STEP_DEG: f64 = 0.002;

/// Four decimals ≈ 11 m: rows inside that cell sharing a display name are
/// the same physical location.
fn cell_key(lat: f64, lon: f64) -> String {
    format!("{lat:.4},{lon:.4}")
}

pub fn normalize(points: &[AidPoint]) -> Vec<ReliefLocation> {
    let mut groups: Vec<ReliefLocation> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for point in points {
        let key = format!("{}|{}", cell_key(point.latitude, point.longitude), point.name);
        let update = NewsUpdate {
            link: point.ngo_link.clone(),
            time: point.last_updated,
            excerpt: point.description.clone(),
        };

        match index.get(&key).copied() {
            Some(i) => {
                let group = &mut groups[i];
                for need in point.needs_list() {
                    if !group.needs.contains(&need) {
                        group.needs.push(need);
                    }
                }
                // Arrival order; consumers sort by time themselves if needed.
                group.news_updates.push(update);
                if point.last_updated > group.last_updated {
                    group.last_updated = point.last_updated;
                    group.status = point.status;
                }
            }
            None => {
                index.insert(key, groups.len());
                groups.push(ReliefLocation {
                    id: point.id,
                    name: point.name.clone(),
                    latitude: point.latitude,
                    longitude: point.longitude,
                    category: point.category,
                    status: point.status,
                    needs: point.needs_list(),
                    news_updates: vec![update],
                    last_updated: point.last_updated,
                });
            }
        }
    }

    apply_jitter(&mut groups);
    groups
}

/// Polar offset for cells holding more than one group (same rounded
/// coordinate, different names). Offsets are display-only, never persisted.
fn apply_jitter(groups: &mut [ReliefLocation]) {
    let mut cells: HashMap<String, Vec<usize>> = HashMap::new();
    for (i, group) in groups.iter().enumerate() {
        cells
            .entry(cell_key(group.latitude, group.longitude))
            .or_default()
            .push(i);
    }

    for members in cells.values() {
        if members.len() < 2 {
            continue;
        }
        let count = members.len() as f64;
        for (slot, &i) in members.iter().enumerate() {
            let angle = 2.0 * PI * slot as f64 / count;
            let radius = JITTER_STEP_DEG * slot as f64;
            groups[i].latitude += radius * angle.cos();
            groups[i].longitude += radius * angle.sin();
        }
    }
}
