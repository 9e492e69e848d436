//! Duplicate grouping across the registry, plus the looser existence check
//! used when inserting a single new candidate.

use tracing::debug;

use crate::geo::distance_meters;
use crate::matching::name::{exact_normalized_match, normalize, similarity};
use crate::registry::types::{Coordinates, Record};

/// Batch-dedup thresholds: both must hold for a pair to be grouped.
pub const GROUP_NAME_SIMILARITY: f64 = 0.75;
pub const GROUP_DISTANCE_METERS: f64 = 300.0;

/// Insertion-time existence check is looser on purpose — it only decides
/// skip-vs-insert for one new record, not a registry-wide collapse.
pub const EXISTING_NAME_SIMILARITY: f64 = 0.6;
pub const EXISTING_DISTANCE_METERS: f64 = 500.0;
pub const EXISTING_EXACT_DISTANCE_METERS: f64 = 1000.0;

/// Co-located, similarly named buildings that are historically distinct and
/// must never be merged, however close their names and coordinates get.
const NEVER_MERGE_NAMES: &[&str] = &[
    "kotelnicheskaya embankment building",
    "kudrinskaya square building",
    "hotel ukraina",
    "moscow state university main building",
    "ministry of foreign affairs building",
    "hotel leningradskaya",
    "red gates administrative building",
];

fn is_merge_exception(record: &Record) -> bool {
    let normalized = normalize(&record.name);
    NEVER_MERGE_NAMES.iter().any(|n| normalized.contains(n))
}

fn is_duplicate_pair(a: &Record, b: &Record) -> bool {
    if is_merge_exception(a) || is_merge_exception(b) {
        return false;
    }
    let name_match = exact_normalized_match(&a.name, &b.name)
        || similarity(&a.name, &b.name) >= GROUP_NAME_SIMILARITY;
    name_match && distance_meters(&a.coordinates, &b.coordinates) < GROUP_DISTANCE_METERS
}

/// Partition `records` into duplicate groups of size ≥ 2, returned as index
/// groups in input order.
///
/// Grouping is star-shaped around each group's first record: later records
/// join a group only by matching the seed directly, never through an
/// intermediate member. That keeps one weak match from chaining distinct
/// buildings into a single merge.
pub fn group(records: &[Record]) -> Vec<Vec<usize>> {
    let mut visited = vec![false; records.len()];
    let mut groups = Vec::new();

    for i in 0..records.len() {
        if visited[i] {
            continue;
        }
        visited[i] = true;

        let mut members = vec![i];
        for j in (i + 1)..records.len() {
            if visited[j] {
                continue;
            }
            if is_duplicate_pair(&records[i], &records[j]) {
                visited[j] = true;
                members.push(j);
            }
        }

        if members.len() >= 2 {
            debug!(
                seed = %records[i].id,
                size = members.len(),
                name = %records[i].name,
                "duplicate group found"
            );
            groups.push(members);
        }
    }

    groups
}

/// Decide whether a new candidate already exists in the registry. Returns the
/// first matching record, hidden ones included — a soft-deleted duplicate
/// still blocks re-insertion.
pub fn find_existing<'a>(
    name: &str,
    coordinates: &Coordinates,
    records: &'a [Record],
) -> Option<&'a Record> {
    records.iter().find(|r| {
        let distance = distance_meters(coordinates, &r.coordinates);
        if exact_normalized_match(name, &r.name) && distance < EXISTING_EXACT_DISTANCE_METERS {
            return true;
        }
        similarity(name, &r.name) >= EXISTING_NAME_SIMILARITY
            && distance < EXISTING_DISTANCE_METERS
    })
}
