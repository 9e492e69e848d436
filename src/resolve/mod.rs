//! Place resolution: validating existing place identifiers and reconciling
//! newly discovered candidates against grounding evidence.

pub mod grounding;

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::discovery::{DiscoveredCandidate, GroundingChunk};
use crate::error::RegistryError;
use crate::places::classify::{classify, is_address_only, PlaceKind};
use crate::places::{PlaceCandidate, PlaceDetails, PlaceSearch};
use crate::registry::types::{Coordinates, Record, RecordPatch, MAX_IMAGES};
use grounding::{build_map_url, extract_place_id, find_chunk, MatchKind};

/// Outcome of a single existing-identifier repair attempt. Only `Replaced`
/// carries a patch; everything else leaves the record untouched. Tags that
/// fit neither type set surface as `RegistryError::AmbiguousClassification`.
#[derive(Debug)]
pub enum RepairOutcome {
    Replaced(RecordPatch),
    AlreadyPoi,
    /// The identifier is address-only but no better candidate was found.
    NoBetterCandidate,
}

/// Terminal states of a new candidate's place-identifier resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionState {
    /// A place identifier was found and its details fetch succeeded.
    Resolved,
    /// No identifier could be confirmed. The record persists without one and
    /// stays eligible for a later batch repair.
    Unresolved,
}

/// A discovery candidate after grounding reconciliation, ready for the
/// existence check and insertion.
#[derive(Debug)]
pub struct ReconciledCandidate {
    pub name: String,
    pub coordinates: Coordinates,
    pub state: ResolutionState,
    pub fields: RecordPatch,
}

pub struct PlaceResolver {
    places: Arc<dyn PlaceSearch>,
}

impl PlaceResolver {
    pub fn new(places: Arc<dyn PlaceSearch>) -> Self {
        Self { places }
    }

    fn text_query(name: &str, location: Option<&str>, city: Option<&str>, country: Option<&str>) -> String {
        if let Some(loc) = location.filter(|l| !l.trim().is_empty()) {
            return format!("{} {}", name, loc);
        }
        let mut query = name.to_string();
        for part in [city, country].into_iter().flatten() {
            if !part.trim().is_empty() {
                query.push(' ');
                query.push_str(part);
            }
        }
        query
    }

    /// First ranked text-search candidate that is not address-only.
    async fn first_poi_candidate(
        &self,
        query: &str,
    ) -> Result<Option<PlaceCandidate>, RegistryError> {
        let candidates = self.places.find_by_text(query).await?;
        let found = candidates.into_iter().find(|c| !is_address_only(&c.types));
        if let Some(c) = &found {
            debug!(
                place_id = %c.place_id,
                name = ?c.name,
                address = ?c.formatted_address,
                query,
                "POI candidate from text search"
            );
        }
        Ok(found)
    }

    /// Batch repair of historical bad data: if a record's place identifier
    /// turns out to be a bare address, re-query and pick the first candidate
    /// with a real identity. Existing data is never deleted or nulled out —
    /// with no better candidate the record is left as-is and reported.
    pub async fn repair_place_id(
        &self,
        record: &Record,
        details_cache: &mut HashMap<String, PlaceDetails>,
    ) -> Result<RepairOutcome, RegistryError> {
        let place_id = record.place_id.as_deref().ok_or_else(|| {
            RegistryError::Validation(format!("record {} has no place id", record.id))
        })?;

        let details = match details_cache.get(place_id) {
            Some(details) => details.clone(),
            None => {
                let details = self.places.get_details(place_id).await?;
                details_cache.insert(place_id.to_string(), details.clone());
                details
            }
        };

        match classify(&details.types) {
            PlaceKind::Poi => return Ok(RepairOutcome::AlreadyPoi),
            PlaceKind::Ambiguous => {
                debug!(record_id = %record.id, types = ?details.types, "ambiguous place types");
                return Err(RegistryError::AmbiguousClassification);
            }
            PlaceKind::AddressOnly => {}
        }

        let query = Self::text_query(
            &record.name,
            record.location.as_deref(),
            record.city.as_deref(),
            record.country.as_deref(),
        );
        let Some(better) = self.first_poi_candidate(&query).await? else {
            info!(record_id = %record.id, name = %record.name, "no POI candidate; leaving as-is");
            return Ok(RepairOutcome::NoBetterCandidate);
        };

        let map_url = build_map_url(
            &record.name,
            record.location.as_deref(),
            Some(&better.place_id),
            None,
            &record.coordinates,
        );
        info!(
            record_id = %record.id,
            old_place_id = %place_id,
            new_place_id = %better.place_id,
            candidate_name = ?better.name,
            "address-only place id replaced"
        );
        Ok(RepairOutcome::Replaced(RecordPatch::place_resolution(
            &better.place_id,
            Some(&map_url),
        )))
    }

    /// Reconcile a discovered candidate against the grounding evidence from
    /// the same pass: correct its coordinates when a name-matched chunk
    /// disagrees, extract and confirm a place identifier, and build the
    /// canonical map URL.
    pub async fn reconcile(
        &self,
        candidate: &DiscoveredCandidate,
        chunks: &[GroundingChunk],
    ) -> Result<ReconciledCandidate, RegistryError> {
        if candidate.name.trim().is_empty() {
            return Err(RegistryError::Validation("candidate has no name".into()));
        }
        let mut coordinates = Coordinates {
            lat: candidate.lat,
            lng: candidate.lng,
        };
        coordinates.validate()?;

        let matched = find_chunk(&candidate.name, &coordinates, chunks);
        let mut chunk_uri = None;
        let mut candidate_id = None;

        if let Some(m) = &matched {
            chunk_uri = m.chunk.uri.clone();
            candidate_id = extract_place_id(m.chunk);

            // Only a name match is trusted enough to move the point.
            if m.kind == MatchKind::Name {
                if let (Some(lat), Some(lng)) = (m.chunk.lat, m.chunk.lng) {
                    let corrected = Coordinates { lat, lng };
                    if corrected.validate().is_ok() {
                        debug!(
                            name = %candidate.name,
                            model_lat = coordinates.lat,
                            model_lng = coordinates.lng,
                            grounded_lat = lat,
                            grounded_lng = lng,
                            "coordinates corrected from grounding"
                        );
                        coordinates = corrected;
                    }
                }
            }
        }

        if candidate_id.is_none() {
            let query = Self::text_query(
                &candidate.name,
                candidate.location.as_deref(),
                candidate.city.as_deref(),
                candidate.country.as_deref(),
            );
            match self.first_poi_candidate(&query).await {
                Ok(found) => candidate_id = found.map(|c| c.place_id),
                // The record can still be inserted and repaired later.
                Err(e) => warn!(name = %candidate.name, error = %e, "text search failed"),
            }
        }

        let mut state = ResolutionState::Unresolved;
        let mut place_id = None;
        let mut map_url = None;
        let mut image_urls = Vec::new();
        let mut location = candidate.location.clone();

        if let Some(id) = candidate_id {
            match self.places.get_details(&id).await {
                Ok(details) => {
                    state = ResolutionState::Resolved;
                    map_url = details.canonical_url.clone();
                    image_urls = details.photos;
                    image_urls.truncate(MAX_IMAGES);
                    if location.is_none() {
                        location = details.formatted_address.clone();
                    }
                    debug!(
                        name = %candidate.name,
                        place_id = %id,
                        place_name = ?details.name,
                        "place identifier confirmed"
                    );
                    place_id = Some(id);
                }
                Err(e) => {
                    warn!(name = %candidate.name, place_id = %id, error = %e, "details fetch failed; left unresolved");
                }
            }
        }

        let map_url = map_url.unwrap_or_else(|| {
            build_map_url(
                &candidate.name,
                candidate.location.as_deref(),
                place_id.as_deref(),
                chunk_uri.as_deref(),
                &coordinates,
            )
        });

        let fields = RecordPatch {
            name: Some(candidate.name.clone()),
            location,
            city: candidate.city.clone(),
            country: candidate.country.clone(),
            lat: Some(coordinates.lat),
            lng: Some(coordinates.lng),
            place_id: place_id.clone(),
            map_url: Some(map_url),
            image_urls: if image_urls.is_empty() {
                None
            } else {
                Some(image_urls)
            },
            style: candidate.style.clone(),
            architect: candidate.architect.clone(),
            description: candidate.description.clone(),
            is_prioritized: candidate.is_prioritized,
            ..Default::default()
        };

        Ok(ReconciledCandidate {
            name: candidate.name.clone(),
            coordinates,
            state,
            fields,
        })
    }
}
