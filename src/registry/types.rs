use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::RegistryError;

/// Upper bound on images carried by one record.
pub const MAX_IMAGES: usize = 3;
/// Upper bound on comments carried by one record.
pub const MAX_COMMENTS: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    /// Both axes must be finite real numbers. Runs before any create/patch
    /// reaches the record store.
    pub fn validate(&self) -> Result<(), RegistryError> {
        if self.lat.is_finite() && self.lng.is_finite() {
            Ok(())
        } else {
            Err(RegistryError::Validation(format!(
                "coordinates must be finite, got lat={} lng={}",
                self.lat, self.lng
            )))
        }
    }
}

/// A user comment. Timestamps are UTC epoch seconds; `updated_at` is set only
/// when the comment text has been edited after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub text: String,
    pub created_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<i64>,
}

/// Append a comment. Fails once the record already carries `MAX_COMMENTS`.
pub fn append_comment(
    comments: &[Comment],
    text: &str,
    now: i64,
) -> Result<Vec<Comment>, RegistryError> {
    if comments.len() >= MAX_COMMENTS {
        return Err(RegistryError::Validation(format!(
            "comment limit of {} reached",
            MAX_COMMENTS
        )));
    }
    if text.trim().is_empty() {
        return Err(RegistryError::Validation("comment text is empty".into()));
    }
    let mut out = comments.to_vec();
    out.push(Comment {
        text: text.to_string(),
        created_at: now,
        updated_at: None,
    });
    Ok(out)
}

/// Replace the text of the comment at `index`, stamping `updated_at`.
pub fn update_comment(
    comments: &[Comment],
    index: usize,
    text: &str,
    now: i64,
) -> Result<Vec<Comment>, RegistryError> {
    let mut out = comments.to_vec();
    let entry = out.get_mut(index).ok_or_else(|| {
        RegistryError::Validation(format!("no comment at index {}", index))
    })?;
    entry.text = text.to_string();
    entry.updated_at = Some(now);
    Ok(out)
}

/// Remove the comment at `index`.
pub fn remove_comment(
    comments: &[Comment],
    index: usize,
) -> Result<Vec<Comment>, RegistryError> {
    if index >= comments.len() {
        return Err(RegistryError::Validation(format!(
            "no comment at index {}",
            index
        )));
    }
    let mut out = comments.to_vec();
    out.remove(index);
    Ok(out)
}

/// A building record as the pipeline sees it. One live record should exist
/// per real-world building; the dedup sweep enforces that retroactively.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub id: String,
    pub name: String,
    pub location: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub coordinates: Coordinates,
    pub place_id: Option<String>,
    pub map_url: Option<String>,
    pub image_urls: Vec<String>,
    /// Comma-joined classification tags; the first tag is primary.
    pub style: Option<String>,
    pub architect: Option<String>,
    pub description: Option<String>,
    pub is_prioritized: bool,
    pub is_hidden: bool,
    pub is_favourite: bool,
    pub has_special_marker: bool,
    pub comments: Vec<Comment>,
}

impl Record {
    /// Hidden records are soft-deleted: visible to duplicate and existence
    /// checks, excluded from every other read path.
    pub fn is_live(&self) -> bool {
        !self.is_hidden
    }

    pub fn style_tags(&self) -> Vec<&str> {
        self.style
            .as_deref()
            .map(|s| {
                s.split(',')
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn primary_style(&self) -> Option<&str> {
        self.style_tags().first().copied()
    }

    pub fn primary_image(&self) -> Option<&str> {
        self.image_urls.first().map(String::as_str)
    }
}

/// Partial update payload. Unset fields are omitted from the wire body and
/// retained by the store.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lng: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub place_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub map_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_urls: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub architect: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_prioritized: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_hidden: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_favourite: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_special_marker: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comments: Option<Vec<Comment>>,
}

impl RecordPatch {
    pub fn place_resolution(place_id: &str, map_url: Option<&str>) -> Self {
        RecordPatch {
            place_id: Some(place_id.to_string()),
            map_url: map_url.map(str::to_string),
            ..Default::default()
        }
    }

    pub fn hidden(value: bool) -> Self {
        RecordPatch {
            is_hidden: Some(value),
            ..Default::default()
        }
    }

    pub fn prioritized(value: bool) -> Self {
        RecordPatch {
            is_prioritized: Some(value),
            ..Default::default()
        }
    }

    pub fn favourite(value: bool) -> Self {
        RecordPatch {
            is_favourite: Some(value),
            ..Default::default()
        }
    }

    pub fn comments(comments: Vec<Comment>) -> Self {
        RecordPatch {
            comments: Some(comments),
            ..Default::default()
        }
    }

    /// Reject a patch before it reaches the store: a set name must be
    /// non-empty, set coordinates must be finite, images capped.
    pub fn validate(&self) -> Result<(), RegistryError> {
        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                return Err(RegistryError::Validation("name is empty".into()));
            }
        }
        match (self.lat, self.lng) {
            (None, None) => {}
            (Some(lat), Some(lng)) => Coordinates { lat, lng }.validate()?,
            _ => {
                return Err(RegistryError::Validation(
                    "lat and lng must be set together".into(),
                ))
            }
        }
        if let Some(images) = &self.image_urls {
            if images.len() > MAX_IMAGES {
                return Err(RegistryError::Validation(format!(
                    "at most {} images allowed, got {}",
                    MAX_IMAGES,
                    images.len()
                )));
            }
        }
        if let Some(comments) = &self.comments {
            if comments.len() > MAX_COMMENTS {
                return Err(RegistryError::Validation(format!(
                    "at most {} comments allowed, got {}",
                    MAX_COMMENTS,
                    comments.len()
                )));
            }
        }
        Ok(())
    }
}

/// The record store's wire shape. Field types are loose on purpose — numbers
/// arrive as strings, image fields as a string or an array, flags as bools or
/// "true"/"1" strings, comments as an array or a JSON-encoded string. Every
/// tolerance for that lives here and nowhere else.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRecord {
    pub id: String,
    #[serde(default)]
    pub name: Option<Value>,
    #[serde(default)]
    pub location: Option<Value>,
    #[serde(default)]
    pub city: Option<Value>,
    #[serde(default)]
    pub country: Option<Value>,
    #[serde(default)]
    pub lat: Option<Value>,
    #[serde(default)]
    pub lng: Option<Value>,
    #[serde(default)]
    pub place_id: Option<Value>,
    #[serde(default)]
    pub map_url: Option<Value>,
    #[serde(default)]
    pub image_url: Option<Value>,
    #[serde(default)]
    pub image_urls: Option<Value>,
    #[serde(default)]
    pub style: Option<Value>,
    #[serde(default)]
    pub architect: Option<Value>,
    #[serde(default)]
    pub description: Option<Value>,
    #[serde(default)]
    pub is_prioritized: Option<Value>,
    #[serde(default)]
    pub is_hidden: Option<Value>,
    #[serde(default)]
    pub is_favourite: Option<Value>,
    #[serde(default)]
    pub has_special_marker: Option<Value>,
    #[serde(default)]
    pub comments: Option<Value>,
}

impl RawRecord {
    /// Map the loose wire shape to the typed model. Fails on a missing/empty
    /// name or non-finite coordinates; such records never enter the pipeline.
    pub fn into_record(self) -> Result<Record, RegistryError> {
        let name = as_text(self.name.as_ref())
            .ok_or_else(|| RegistryError::Validation(format!("record {} has no name", self.id)))?;

        let lat = as_float(self.lat.as_ref());
        let lng = as_float(self.lng.as_ref());
        let coordinates = match (lat, lng) {
            (Some(lat), Some(lng)) => Coordinates { lat, lng },
            _ => {
                return Err(RegistryError::Validation(format!(
                    "record {} has no usable coordinates",
                    self.id
                )))
            }
        };
        coordinates.validate()?;

        let mut image_urls = as_string_list(self.image_urls.as_ref());
        if image_urls.is_empty() {
            image_urls = as_string_list(self.image_url.as_ref());
        }
        image_urls.truncate(MAX_IMAGES);

        let mut comments = as_comments(self.comments.as_ref());
        comments.truncate(MAX_COMMENTS);

        Ok(Record {
            id: self.id,
            name,
            location: as_text(self.location.as_ref()),
            city: as_text(self.city.as_ref()),
            country: as_text(self.country.as_ref()),
            coordinates,
            place_id: as_text(self.place_id.as_ref()),
            map_url: as_text(self.map_url.as_ref()),
            image_urls,
            style: as_text(self.style.as_ref()),
            architect: as_text(self.architect.as_ref()),
            description: as_text(self.description.as_ref()),
            is_prioritized: as_flag(self.is_prioritized.as_ref()),
            is_hidden: as_flag(self.is_hidden.as_ref()),
            is_favourite: as_flag(self.is_favourite.as_ref()),
            has_special_marker: as_flag(self.has_special_marker.as_ref()),
            comments,
        })
    }
}

fn as_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn as_float(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn as_flag(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => matches!(s.trim(), "true" | "1"),
        Some(Value::Number(n)) => n.as_i64() == Some(1),
        _ => false,
    }
}

fn as_string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::String(s)) if !s.trim().is_empty() => vec![s.trim().to_string()],
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|v| v.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

fn as_comments(value: Option<&Value>) -> Vec<Comment> {
    match value {
        Some(Value::Array(_)) => {
            serde_json::from_value(value.unwrap().clone()).unwrap_or_default()
        }
        // Older rows carry the array JSON-encoded in a string field.
        Some(Value::String(s)) => serde_json::from_str(s).unwrap_or_default(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(body: Value) -> RawRecord {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn test_maps_well_formed_record() {
        let record = raw(json!({
            "id": "rec1",
            "name": "Chilehaus",
            "location": "Fischertwiete 2, Hamburg",
            "city": "Hamburg",
            "country": "Germany",
            "lat": 53.5482,
            "lng": 9.9997,
            "placeId": "ChIJAAAA",
            "style": "Brick Expressionism, Expressionism",
            "isHidden": false
        }))
        .into_record()
        .unwrap();

        assert_eq!(record.name, "Chilehaus");
        assert_eq!(record.primary_style(), Some("Brick Expressionism"));
        assert!(record.is_live());
    }

    #[test]
    fn test_numeric_strings_and_string_flags() {
        let record = raw(json!({
            "id": "rec2",
            "name": "Tower",
            "lat": "52.5",
            "lng": "13.4",
            "isHidden": "true",
            "isPrioritized": "1"
        }))
        .into_record()
        .unwrap();

        assert_eq!(record.coordinates.lat, 52.5);
        assert!(record.is_hidden);
        assert!(record.is_prioritized);
    }

    #[test]
    fn test_image_field_string_or_array() {
        let single = raw(json!({
            "id": "a", "name": "X", "lat": 1.0, "lng": 2.0,
            "imageUrl": "https://img/1.jpg"
        }))
        .into_record()
        .unwrap();
        assert_eq!(single.image_urls, vec!["https://img/1.jpg"]);

        let many = raw(json!({
            "id": "b", "name": "X", "lat": 1.0, "lng": 2.0,
            "imageUrls": ["https://img/1.jpg", "https://img/2.jpg", "https://img/3.jpg", "https://img/4.jpg"]
        }))
        .into_record()
        .unwrap();
        assert_eq!(many.image_urls.len(), MAX_IMAGES);
    }

    #[test]
    fn test_comments_array_or_encoded_string() {
        let inline = raw(json!({
            "id": "a", "name": "X", "lat": 1.0, "lng": 2.0,
            "comments": [{"text": "nice", "createdAt": 1700000000}]
        }))
        .into_record()
        .unwrap();
        assert_eq!(inline.comments.len(), 1);
        assert_eq!(inline.comments[0].text, "nice");

        let encoded = raw(json!({
            "id": "b", "name": "X", "lat": 1.0, "lng": 2.0,
            "comments": "[{\"text\":\"old\",\"createdAt\":1690000000,\"updatedAt\":1695000000}]"
        }))
        .into_record()
        .unwrap();
        assert_eq!(encoded.comments[0].updated_at, Some(1695000000));
    }

    #[test]
    fn test_rejects_missing_name_and_bad_coordinates() {
        assert!(raw(json!({"id": "a", "lat": 1.0, "lng": 2.0}))
            .into_record()
            .is_err());
        assert!(raw(json!({"id": "b", "name": "X", "lng": 2.0}))
            .into_record()
            .is_err());
        assert!(raw(json!({"id": "c", "name": "X", "lat": "abc", "lng": 2.0}))
            .into_record()
            .is_err());
    }

    #[test]
    fn test_comment_operations() {
        let comments = append_comment(&[], "first", 100).unwrap();
        let comments = append_comment(&comments, "second", 200).unwrap();
        assert_eq!(comments.len(), 2);
        assert_eq!(comments[1].created_at, 200);

        let updated = update_comment(&comments, 0, "edited", 300).unwrap();
        assert_eq!(updated[0].text, "edited");
        assert_eq!(updated[0].updated_at, Some(300));
        // Untouched entry keeps its state
        assert_eq!(updated[1].updated_at, None);

        let removed = remove_comment(&updated, 0).unwrap();
        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].text, "second");

        assert!(update_comment(&comments, 5, "x", 0).is_err());
        assert!(remove_comment(&comments, 5).is_err());
    }

    #[test]
    fn test_comment_limit() {
        let mut comments = Vec::new();
        for i in 0..MAX_COMMENTS {
            comments = append_comment(&comments, &format!("c{}", i), i as i64).unwrap();
        }
        assert!(append_comment(&comments, "one too many", 99).is_err());
    }

    #[test]
    fn test_patch_validation() {
        let ok = RecordPatch {
            name: Some("Tower".into()),
            lat: Some(52.0),
            lng: Some(13.0),
            ..Default::default()
        };
        assert!(ok.validate().is_ok());

        let nan = RecordPatch {
            lat: Some(f64::NAN),
            lng: Some(13.0),
            ..Default::default()
        };
        assert!(nan.validate().is_err());

        let half = RecordPatch {
            lat: Some(52.0),
            ..Default::default()
        };
        assert!(half.validate().is_err());

        let too_many_images = RecordPatch {
            image_urls: Some(vec!["a".into(), "b".into(), "c".into(), "d".into()]),
            ..Default::default()
        };
        assert!(too_many_images.validate().is_err());
    }

    #[test]
    fn test_patch_omits_unset_fields() {
        let patch = RecordPatch::hidden(true);
        let body = serde_json::to_value(&patch).unwrap();
        assert_eq!(body, json!({"isHidden": true}));
    }
}
