//! Field-completeness scoring for keep/delete tie-breaks.

use crate::registry::types::Record;

/// Count populated fields, with description, image, and place identifier
/// weighted twice more on top of the base count. "0" and empty strings count
/// as absent. Purely a ranking signal, never a pass/fail filter.
pub fn score(record: &Record) -> u32 {
    let mut total = 0;

    for field in [
        record.city.as_deref(),
        record.country.as_deref(),
        record.place_id.as_deref(),
        record.primary_image(),
        record.description.as_deref(),
        record.location.as_deref(),
        record.style.as_deref(),
        record.architect.as_deref(),
    ] {
        if present(field) {
            total += 1;
        }
    }
    if coordinate_present(record.coordinates.lat) {
        total += 1;
    }
    if coordinate_present(record.coordinates.lng) {
        total += 1;
    }

    // Outsized-value fields count once above and twice more here.
    for field in [
        record.description.as_deref(),
        record.primary_image(),
        record.place_id.as_deref(),
    ] {
        if present(field) {
            total += 2;
        }
    }

    total
}

fn present(field: Option<&str>) -> bool {
    matches!(field, Some(s) if !s.trim().is_empty() && s.trim() != "0")
}

fn coordinate_present(axis: f64) -> bool {
    axis.is_finite() && axis != 0.0
}
