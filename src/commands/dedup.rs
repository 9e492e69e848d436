//! Batch dedup sweep: collapse duplicate groups across the whole registry.
//!
//! Catches duplicates the insertion-time existence check missed — records
//! created before the check existed, or edited into collision by hand.
//! Safe to re-run at any time; a second pass over its own output finds
//! nothing left to delete.

use anyhow::Result;
use tracing::info;

use crate::error::SweepStats;
use crate::matching::{group, merge};
use crate::state::AppState;

pub async fn run(state: &AppState) -> Result<SweepStats> {
    let records = state.registry.list_all().await?;
    let groups = group::group(&records);
    info!(
        records = records.len(),
        groups = groups.len(),
        "dedup sweep started"
    );

    let resolutions: Vec<_> = groups
        .iter()
        .filter_map(|members| {
            let members: Vec<&_> = members.iter().map(|&i| &records[i]).collect();
            merge::resolve(&members)
        })
        .collect();

    let stats = merge::apply(state.registry.as_ref(), &resolutions, state.write_delay).await;
    info!(%stats, "dedup sweep finished");
    Ok(stats)
}
