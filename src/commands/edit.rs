//! Manual edits: flag toggles and comment changes on a single record.
//!
//! Read-modify-write against the store, same as every other mutation path —
//! not atomic, safe under the one-writer-at-a-time assumption.

use anyhow::{bail, Result};
use chrono::Utc;
use tracing::info;

use crate::registry::types::{append_comment, remove_comment, update_comment, RecordPatch};
use crate::state::AppState;

pub async fn set_flag(state: &AppState, id: &str, flag: &str, value: bool) -> Result<()> {
    let patch = match flag {
        "hidden" => RecordPatch::hidden(value),
        "prioritized" => RecordPatch::prioritized(value),
        "favourite" => RecordPatch::favourite(value),
        _ => bail!("unknown flag '{}', expected hidden|prioritized|favourite", flag),
    };
    let record = state.registry.patch(id, &patch).await?;
    info!(record_id = %record.id, name = %record.name, flag, value, "flag updated");
    Ok(())
}

pub async fn comment_add(state: &AppState, id: &str, text: &str) -> Result<()> {
    let record = state.registry.get(id).await?;
    let comments = append_comment(&record.comments, text, Utc::now().timestamp())?;
    state
        .registry
        .patch(id, &RecordPatch::comments(comments))
        .await?;
    info!(record_id = %id, "comment added");
    Ok(())
}

pub async fn comment_edit(state: &AppState, id: &str, index: usize, text: &str) -> Result<()> {
    let record = state.registry.get(id).await?;
    let comments = update_comment(&record.comments, index, text, Utc::now().timestamp())?;
    state
        .registry
        .patch(id, &RecordPatch::comments(comments))
        .await?;
    info!(record_id = %id, index, "comment updated");
    Ok(())
}

pub async fn comment_remove(state: &AppState, id: &str, index: usize) -> Result<()> {
    let record = state.registry.get(id).await?;
    let comments = remove_comment(&record.comments, index)?;
    state
        .registry
        .patch(id, &RecordPatch::comments(comments))
        .await?;
    info!(record_id = %id, index, "comment removed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use crate::resolve::PlaceResolver;
    use crate::testutil::{record_at, FakeDiscovery, FakePlaces, FakeStore};

    fn state_with(store: FakeStore) -> AppState {
        AppState {
            registry: Arc::new(store),
            discovery: Arc::new(FakeDiscovery {
                response: crate::discovery::DiscoveryResponse {
                    candidates: vec![],
                    grounding_evidence: vec![],
                },
            }),
            resolver: PlaceResolver::new(Arc::new(FakePlaces::default())),
            write_delay: Duration::ZERO,
        }
    }

    #[tokio::test]
    async fn test_hide_and_unhide() {
        let state = state_with(FakeStore::with_records(vec![record_at(
            "r1", "Tower A", 52.0, 13.0,
        )]));

        set_flag(&state, "r1", "hidden", true).await.unwrap();
        assert!(state.registry.get("r1").await.unwrap().is_hidden);

        set_flag(&state, "r1", "hidden", false).await.unwrap();
        assert!(state.registry.get("r1").await.unwrap().is_live());

        assert!(set_flag(&state, "r1", "sparkly", true).await.is_err());
    }

    #[tokio::test]
    async fn test_comment_lifecycle() {
        let state = state_with(FakeStore::with_records(vec![record_at(
            "r1", "Tower A", 52.0, 13.0,
        )]));

        comment_add(&state, "r1", "worth a visit").await.unwrap();
        comment_add(&state, "r1", "closed on mondays").await.unwrap();
        let record = state.registry.get("r1").await.unwrap();
        assert_eq!(record.comments.len(), 2);

        comment_edit(&state, "r1", 1, "open again").await.unwrap();
        let record = state.registry.get("r1").await.unwrap();
        assert_eq!(record.comments[1].text, "open again");
        assert!(record.comments[1].updated_at.is_some());

        comment_remove(&state, "r1", 0).await.unwrap();
        let record = state.registry.get("r1").await.unwrap();
        assert_eq!(record.comments.len(), 1);
        assert_eq!(record.comments[0].text, "open again");

        assert!(comment_remove(&state, "r1", 9).await.is_err());
    }
}
