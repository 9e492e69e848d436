//! Place-identifier repair sweep: find live records whose identifier points
//! at a bare street address and re-resolve them to a real point of interest.

use std::collections::HashMap;

use anyhow::Result;
use tokio::time::sleep;
use tracing::info;

use crate::error::SweepStats;
use crate::places::PlaceDetails;
use crate::resolve::RepairOutcome;
use crate::state::AppState;

pub async fn run(state: &AppState) -> Result<SweepStats> {
    let records = state.registry.list_all().await?;

    // Details cache lives for this sweep only. Unbounded — acceptable for a
    // registry this size; revisit if sweeps ever span millions of records.
    let mut details_cache: HashMap<String, PlaceDetails> = HashMap::new();
    let mut stats = SweepStats::default();

    // Repair is a normal read path: hidden records stay out of it.
    for record in records.iter().filter(|r| r.is_live() && r.place_id.is_some()) {
        stats.processed += 1;

        match state.resolver.repair_place_id(record, &mut details_cache).await {
            Ok(RepairOutcome::Replaced(patch)) => {
                match state.registry.patch(&record.id, &patch).await {
                    Ok(_) => stats.changed += 1,
                    Err(e) => stats.record_failure(&record.id, &e),
                }
                sleep(state.write_delay).await;
            }
            Ok(RepairOutcome::AlreadyPoi) => {}
            Ok(RepairOutcome::NoBetterCandidate) => stats.skipped += 1,
            // neither address-only nor POI: conservatively left alone
            Err(crate::error::RegistryError::AmbiguousClassification) => stats.skipped += 1,
            Err(e) => stats.record_failure(&record.id, &e),
        }
    }

    info!(%stats, cached_places = details_cache.len(), "repair sweep finished");
    Ok(stats)
}
