//! Address-only vs. point-of-interest classification of place type tags.

/// Tags that mark a place as a genuine point of interest.
const POI_TYPES: &[&str] = &[
    "establishment",
    "point_of_interest",
    "museum",
    "church",
    "university",
    "stadium",
    "library",
    "government_office",
    "place_of_worship",
    "courthouse",
    "tourist_attraction",
    "city_hall",
];

/// Tags that describe bare addresses and administrative areas.
const ADDRESS_TYPES: &[&str] = &[
    "street_address",
    "route",
    "premise",
    "subpremise",
    "postal_code",
    "neighborhood",
    "locality",
    "political",
    "administrative_area_level_1",
    "administrative_area_level_2",
    "country",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceKind {
    /// Only address-ish tags: the identifier points at a street address, not
    /// a building identity. Eligible for re-resolution.
    AddressOnly,
    /// At least one POI tag present.
    Poi,
    /// Tags outside both sets. Treated like a POI — never re-resolved — so a
    /// tag set we cannot read does not trigger a false replacement.
    Ambiguous,
}

pub fn classify(types: &[String]) -> PlaceKind {
    if types.iter().any(|t| POI_TYPES.contains(&t.as_str())) {
        return PlaceKind::Poi;
    }
    if types.iter().all(|t| ADDRESS_TYPES.contains(&t.as_str())) {
        return PlaceKind::AddressOnly;
    }
    PlaceKind::Ambiguous
}

/// True iff no POI tag is present and every tag is address-ish.
pub fn is_address_only(types: &[String]) -> bool {
    classify(types) == PlaceKind::AddressOnly
}
