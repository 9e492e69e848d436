//! Matching grounding-evidence chunks to discovered candidates, extracting
//! place identifiers, and building canonical map URLs.

use url::Url;

use crate::discovery::GroundingChunk;
use crate::matching::name::shares_significant_portion;
use crate::registry::types::Coordinates;

/// Coordinate window for a proximity match, ≈500 m in degrees.
pub const PROXIMITY_DEGREES: f64 = 0.0045;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    /// Chunk title and candidate name substring-match. Strong enough to
    /// overwrite the candidate's coordinates.
    Name,
    /// Only the coordinates line up. Good for URL/place-id extraction, not
    /// trusted enough to move the point.
    Proximity,
}

#[derive(Debug)]
pub struct ChunkMatch<'a> {
    pub chunk: &'a GroundingChunk,
    pub kind: MatchKind,
}

/// Find the grounding chunk backing a candidate: first by title — substring
/// in either direction (case-insensitive), or base-name aliasing for titles
/// that differ only by qualifiers — then by coordinate proximity.
pub fn find_chunk<'a>(
    name: &str,
    coordinates: &Coordinates,
    chunks: &'a [GroundingChunk],
) -> Option<ChunkMatch<'a>> {
    let name_lower = name.to_lowercase();

    let by_name = chunks.iter().find(|c| {
        c.title.as_deref().is_some_and(|t| {
            let title_lower = t.to_lowercase();
            let substring = !title_lower.is_empty()
                && (title_lower.contains(&name_lower) || name_lower.contains(&title_lower));
            substring || shares_significant_portion(t, name)
        })
    });
    if let Some(chunk) = by_name {
        return Some(ChunkMatch {
            chunk,
            kind: MatchKind::Name,
        });
    }

    let by_proximity = chunks.iter().find(|c| match (c.lat, c.lng) {
        (Some(lat), Some(lng)) => {
            (lat - coordinates.lat).abs() <= PROXIMITY_DEGREES
                && (lng - coordinates.lng).abs() <= PROXIMITY_DEGREES
        }
        _ => false,
    });
    by_proximity.map(|chunk| ChunkMatch {
        chunk,
        kind: MatchKind::Proximity,
    })
}

/// Pull a place identifier out of a chunk: the explicit field when present,
/// otherwise parsed from the URI (`place_id=` query param or the segment
/// after `place/` in the path).
pub fn extract_place_id(chunk: &GroundingChunk) -> Option<String> {
    if let Some(id) = chunk.place_id.as_deref() {
        if !id.trim().is_empty() {
            return Some(strip_resource_prefix(id.trim()).to_string());
        }
    }
    chunk.uri.as_deref().and_then(place_id_from_uri)
}

/// `places/ChIJabc` resource names reduce to the bare identifier.
pub fn strip_resource_prefix(id: &str) -> &str {
    id.strip_prefix("places/").unwrap_or(id)
}

fn place_id_from_uri(uri: &str) -> Option<String> {
    let parsed = Url::parse(uri).ok()?;

    if let Some((_, value)) = parsed
        .query_pairs()
        .find(|(k, _)| k == "place_id" || k == "query_place_id")
    {
        let value = value.trim();
        if !value.is_empty() {
            return Some(strip_resource_prefix(value).to_string());
        }
    }

    let mut segments = parsed.path_segments()?;
    while let Some(segment) = segments.next() {
        if segment == "place" {
            let id = segments.next()?.trim();
            if id.is_empty() {
                return None;
            }
            return Some(strip_resource_prefix(id).to_string());
        }
    }
    None
}

fn encode(text: &str) -> String {
    url::form_urlencoded::byte_serialize(text.as_bytes()).collect()
}

/// Canonical map URL for a candidate, best evidence first:
/// place id + name, then a chunk URI that already encodes a place id, then a
/// text-search URL from name + location, then raw coordinates as last resort.
pub fn build_map_url(
    name: &str,
    location: Option<&str>,
    place_id: Option<&str>,
    chunk_uri: Option<&str>,
    coordinates: &Coordinates,
) -> String {
    if let Some(id) = place_id.filter(|id| !id.trim().is_empty()) {
        return format!(
            "https://www.google.com/maps/search/?api=1&query={}&query_place_id={}",
            encode(name),
            encode(strip_resource_prefix(id.trim()))
        );
    }

    if let Some(uri) = chunk_uri {
        if place_id_from_uri(uri).is_some() {
            return uri.to_string();
        }
    }

    if !name.trim().is_empty() {
        let query = match location {
            Some(loc) if !loc.trim().is_empty() => format!("{} {}", name, loc),
            _ => name.to_string(),
        };
        return format!(
            "https://www.google.com/maps/search/?api=1&query={}",
            encode(&query)
        );
    }

    format!(
        "https://www.google.com/maps/search/?api=1&query={},{}",
        coordinates.lat, coordinates.lng
    )
}
