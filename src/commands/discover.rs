//! Discovery ingest: run a generative-discovery query, reconcile each
//! candidate against its grounding evidence, and insert whatever does not
//! already exist in the registry.

use anyhow::Result;
use tokio::time::sleep;
use tracing::info;

use crate::error::SweepStats;
use crate::matching::group::find_existing;
use crate::resolve::ResolutionState;
use crate::state::AppState;

pub async fn run(state: &AppState, query: &str, origin_hint: Option<&str>) -> Result<SweepStats> {
    let response = state.discovery.discover(query, origin_hint).await?;
    info!(
        query,
        candidates = response.candidates.len(),
        grounding = response.grounding_evidence.len(),
        "discovery pass"
    );

    // Hidden records included on purpose: a soft-deleted duplicate must keep
    // blocking re-insertion.
    let mut records = state.registry.list_all().await?;
    let mut stats = SweepStats::default();

    for candidate in &response.candidates {
        stats.processed += 1;

        let reconciled = match state
            .resolver
            .reconcile(candidate, &response.grounding_evidence)
            .await
        {
            Ok(reconciled) => reconciled,
            Err(e) => {
                stats.record_failure(&candidate.name, &e);
                continue;
            }
        };

        if let Some(existing) = find_existing(&reconciled.name, &reconciled.coordinates, &records) {
            info!(
                name = %reconciled.name,
                existing_id = %existing.id,
                existing_name = %existing.name,
                "candidate already in registry; skipped"
            );
            stats.skipped += 1;
            continue;
        }

        match state.registry.create(&reconciled.fields).await {
            Ok(created) => {
                info!(
                    record_id = %created.id,
                    name = %created.name,
                    style = created.primary_style().unwrap_or("-"),
                    resolved = reconciled.state == ResolutionState::Resolved,
                    "candidate inserted"
                );
                stats.changed += 1;
                // later candidates in this pass check against it too
                records.push(created);
            }
            Err(e) => stats.record_failure(&reconciled.name, &e),
        }
        sleep(state.write_delay).await;
    }

    info!(%stats, "discovery ingest finished");
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use crate::discovery::{DiscoveredCandidate, DiscoveryResponse, GroundingChunk};
    use crate::resolve::PlaceResolver;
    use crate::testutil::{record_at, FakeDiscovery, FakePlaces, FakeStore};

    fn discovered(name: &str, lat: f64, lng: f64) -> DiscoveredCandidate {
        DiscoveredCandidate {
            name: name.into(),
            location: None,
            city: None,
            country: None,
            description: None,
            style: None,
            lat,
            lng,
            is_prioritized: None,
            architect: None,
        }
    }

    fn state_with(store: FakeStore, response: DiscoveryResponse) -> AppState {
        let places = Arc::new(FakePlaces::default());
        places.with_details("ChIJnew", &["establishment"]);
        AppState {
            registry: Arc::new(store),
            discovery: Arc::new(FakeDiscovery { response }),
            resolver: PlaceResolver::new(places),
            write_delay: Duration::ZERO,
        }
    }

    #[tokio::test]
    async fn test_new_candidate_inserted_with_grounded_fields() {
        let response = DiscoveryResponse {
            candidates: vec![discovered("Chrysler Building", 40.74, -73.98)],
            grounding_evidence: vec![GroundingChunk {
                title: Some("Chrysler Building".into()),
                lat: Some(40.7516),
                lng: Some(-73.9755),
                uri: None,
                place_id: Some("ChIJnew".into()),
            }],
        };
        let state = state_with(FakeStore::default(), response);

        let stats = run(&state, "art deco towers in new york", None).await.unwrap();
        assert_eq!(stats.changed, 1);
        assert_eq!(stats.skipped, 0);

        let records = state.registry.list_all().await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].coordinates.lat, 40.7516);
        assert_eq!(records[0].place_id.as_deref(), Some("ChIJnew"));
    }

    #[tokio::test]
    async fn test_existing_candidate_skipped() {
        let store = FakeStore::with_records(vec![record_at(
            "existing",
            "Chrysler Building",
            40.7516,
            -73.9755,
        )]);
        let response = DiscoveryResponse {
            candidates: vec![discovered("Chrysler Building", 40.7514, -73.9750)],
            grounding_evidence: vec![],
        };
        let state = state_with(store, response);

        let stats = run(&state, "art deco towers", None).await.unwrap();
        assert_eq!(stats.changed, 0);
        assert_eq!(stats.skipped, 1);
        assert_eq!(state.registry.list_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_hidden_duplicate_still_blocks_insertion() {
        let mut hidden = record_at("hidden", "Chrysler Building", 40.7516, -73.9755);
        hidden.is_hidden = true;
        let store = FakeStore::with_records(vec![hidden]);
        let response = DiscoveryResponse {
            candidates: vec![discovered("Chrysler Building", 40.7514, -73.9750)],
            grounding_evidence: vec![],
        };
        let state = state_with(store, response);

        let stats = run(&state, "art deco towers", None).await.unwrap();
        assert_eq!(stats.skipped, 1);
        assert_eq!(state.registry.list_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_candidate_counted_failed_batch_continues() {
        let response = DiscoveryResponse {
            candidates: vec![
                discovered("Broken", f64::NAN, 13.0),
                discovered("Fine Tower", 52.0, 13.0),
            ],
            grounding_evidence: vec![],
        };
        let state = state_with(FakeStore::default(), response);

        let stats = run(&state, "towers", None).await.unwrap();
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.changed, 1);
        let records = state.registry.list_all().await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "Fine Tower");
    }

    #[tokio::test]
    async fn test_candidates_within_one_pass_do_not_duplicate() {
        let response = DiscoveryResponse {
            candidates: vec![
                discovered("Fine Tower", 52.0, 13.0),
                discovered("Fine Tower", 52.0001, 13.0001),
            ],
            grounding_evidence: vec![],
        };
        let state = state_with(FakeStore::default(), response);

        let stats = run(&state, "towers", None).await.unwrap();
        assert_eq!(stats.changed, 1);
        assert_eq!(stats.skipped, 1);
    }
}
