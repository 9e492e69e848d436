//! Resolving a duplicate group to one survivor and applying the deletions.

use std::time::Duration;

use tracing::{info, warn};

use crate::error::SweepStats;
use crate::matching::completeness;
use crate::registry::types::{Record, RecordPatch, MAX_IMAGES};
use crate::registry::RecordStore;

/// One resolved duplicate group: the record to keep and, in input order, the
/// records to delete.
#[derive(Debug)]
pub struct GroupResolution<'a> {
    pub keep: &'a Record,
    pub delete: Vec<&'a Record>,
}

/// Keep the member with the highest completeness score; ties go to the
/// first-seen member. Everyone else is marked for deletion.
pub fn resolve<'a>(members: &[&'a Record]) -> Option<GroupResolution<'a>> {
    if members.len() < 2 {
        return None;
    }

    let mut best = 0;
    let mut best_score = completeness::score(members[0]);
    for (i, member) in members.iter().enumerate().skip(1) {
        let score = completeness::score(member);
        if score > best_score {
            best = i;
            best_score = score;
        }
    }

    let delete = members
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != best)
        .map(|(_, r)| *r)
        .collect();

    Some(GroupResolution {
        keep: members[best],
        delete,
    })
}

/// Fields the survivor inherits from the duplicates it replaces. Only
/// missing fields are filled — an existing place identifier, URL, or image
/// is never overwritten — and user flags are carried over so deleting a
/// duplicate cannot regress the kept record.
fn backfill_patch(keep: &Record, duplicates: &[&Record]) -> Option<RecordPatch> {
    let mut patch = RecordPatch::default();
    let mut changed = false;

    if keep.place_id.is_none() {
        if let Some(id) = duplicates.iter().find_map(|d| d.place_id.clone()) {
            patch.place_id = Some(id);
            changed = true;
        }
    }
    if keep.map_url.is_none() {
        if let Some(url) = duplicates.iter().find_map(|d| d.map_url.clone()) {
            patch.map_url = Some(url);
            changed = true;
        }
    }
    if keep.image_urls.is_empty() {
        if let Some(mut images) = duplicates
            .iter()
            .find(|d| !d.image_urls.is_empty())
            .map(|d| d.image_urls.clone())
        {
            images.truncate(MAX_IMAGES);
            patch.image_urls = Some(images);
            changed = true;
        }
    }
    if !keep.is_prioritized && duplicates.iter().any(|d| d.is_prioritized) {
        patch.is_prioritized = Some(true);
        changed = true;
    }
    if !keep.is_favourite && duplicates.iter().any(|d| d.is_favourite) {
        patch.is_favourite = Some(true);
        changed = true;
    }
    if !keep.has_special_marker && duplicates.iter().any(|d| d.has_special_marker) {
        patch.has_special_marker = Some(true);
        changed = true;
    }

    changed.then_some(patch)
}

/// Backfill each survivor, then issue the deletions. Deletions are
/// independent and order-insensitive; one failure is logged and counted, the
/// rest of the batch proceeds. A group whose backfill fails keeps its
/// duplicates — deleting them first would lose the fields they carry.
/// Re-running after a partial failure is idempotent — already deleted records
/// simply stop appearing in the next grouping pass.
pub async fn apply(
    store: &dyn RecordStore,
    resolutions: &[GroupResolution<'_>],
    pacing: Duration,
) -> SweepStats {
    let mut stats = SweepStats::default();

    for resolution in resolutions {
        stats.processed += 1;
        info!(
            keep = %resolution.keep.id,
            name = %resolution.keep.name,
            duplicates = resolution.delete.len(),
            "resolving duplicate group"
        );

        if let Some(patch) = backfill_patch(resolution.keep, &resolution.delete) {
            match store.patch(&resolution.keep.id, &patch).await {
                Ok(_) => {
                    info!(record_id = %resolution.keep.id, "survivor backfilled from duplicates");
                    tokio::time::sleep(pacing).await;
                }
                Err(e) => {
                    stats.record_failure(&resolution.keep.id, &e);
                    continue;
                }
            }
        }

        for duplicate in &resolution.delete {
            match store.delete(&duplicate.id).await {
                Ok(()) => {
                    info!(
                        record_id = %duplicate.id,
                        name = %duplicate.name,
                        kept = %resolution.keep.id,
                        "duplicate deleted"
                    );
                    stats.changed += 1;
                }
                Err(e) => {
                    warn!(record_id = %duplicate.id, error = %e, "delete failed; continuing");
                    stats.failed += 1;
                }
            }
            tokio::time::sleep(pacing).await;
        }
    }

    stats
}
