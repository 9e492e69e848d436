//! In-memory fakes of the collaborator traits for engine tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::discovery::{Discovery, DiscoveryResponse};
use crate::error::RegistryError;
use crate::places::{PlaceCandidate, PlaceDetails, PlaceSearch};
use crate::registry::types::{Coordinates, Record, RecordPatch};
use crate::registry::RecordStore;

pub fn record_at(id: &str, name: &str, lat: f64, lng: f64) -> Record {
    Record {
        id: id.into(),
        name: name.into(),
        location: None,
        city: None,
        country: None,
        coordinates: Coordinates { lat, lng },
        place_id: None,
        map_url: None,
        image_urls: vec![],
        style: None,
        architect: None,
        description: None,
        is_prioritized: false,
        is_hidden: false,
        is_favourite: false,
        has_special_marker: false,
        comments: vec![],
    }
}

#[derive(Default)]
pub struct FakeStore {
    records: Mutex<Vec<Record>>,
    fail_deletes: Mutex<HashSet<String>>,
    fail_patches: Mutex<HashSet<String>>,
    next_id: AtomicUsize,
}

impl FakeStore {
    pub fn with_records(records: Vec<Record>) -> Self {
        FakeStore {
            records: Mutex::new(records),
            ..Default::default()
        }
    }

    pub fn snapshot(&self) -> Vec<Record> {
        self.records.lock().unwrap().clone()
    }

    pub fn fail_delete(&self, id: &str) {
        self.fail_deletes.lock().unwrap().insert(id.to_string());
    }

    pub fn fail_patch(&self, id: &str) {
        self.fail_patches.lock().unwrap().insert(id.to_string());
    }
}

fn apply_patch(record: &mut Record, fields: &RecordPatch) {
    if let Some(v) = &fields.name {
        record.name = v.clone();
    }
    if let Some(v) = &fields.location {
        record.location = Some(v.clone());
    }
    if let Some(v) = &fields.city {
        record.city = Some(v.clone());
    }
    if let Some(v) = &fields.country {
        record.country = Some(v.clone());
    }
    if let Some(v) = fields.lat {
        record.coordinates.lat = v;
    }
    if let Some(v) = fields.lng {
        record.coordinates.lng = v;
    }
    if let Some(v) = &fields.place_id {
        record.place_id = Some(v.clone());
    }
    if let Some(v) = &fields.map_url {
        record.map_url = Some(v.clone());
    }
    if let Some(v) = &fields.image_urls {
        record.image_urls = v.clone();
    }
    if let Some(v) = &fields.style {
        record.style = Some(v.clone());
    }
    if let Some(v) = &fields.architect {
        record.architect = Some(v.clone());
    }
    if let Some(v) = &fields.description {
        record.description = Some(v.clone());
    }
    if let Some(v) = fields.is_prioritized {
        record.is_prioritized = v;
    }
    if let Some(v) = fields.is_hidden {
        record.is_hidden = v;
    }
    if let Some(v) = fields.is_favourite {
        record.is_favourite = v;
    }
    if let Some(v) = fields.has_special_marker {
        record.has_special_marker = v;
    }
    if let Some(v) = &fields.comments {
        record.comments = v.clone();
    }
}

#[async_trait]
impl RecordStore for FakeStore {
    async fn list_all(&self) -> Result<Vec<Record>, RegistryError> {
        Ok(self.snapshot())
    }

    async fn get(&self, id: &str) -> Result<Record, RegistryError> {
        self.snapshot()
            .into_iter()
            .find(|r| r.id == id)
            .ok_or_else(|| RegistryError::provider("registry", format!("404: {}", id)))
    }

    async fn create(&self, fields: &RecordPatch) -> Result<Record, RegistryError> {
        fields.validate()?;
        let name = fields
            .name
            .clone()
            .ok_or_else(|| RegistryError::Validation("create requires a name".into()))?;
        let (lat, lng) = match (fields.lat, fields.lng) {
            (Some(lat), Some(lng)) => (lat, lng),
            _ => {
                return Err(RegistryError::Validation(
                    "create requires coordinates".into(),
                ))
            }
        };

        let id = format!("rec{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        let mut record = record_at(&id, &name, lat, lng);
        apply_patch(&mut record, fields);
        record.comments = fields.comments.clone().unwrap_or_default();
        self.records.lock().unwrap().push(record.clone());
        Ok(record)
    }

    async fn patch(&self, id: &str, fields: &RecordPatch) -> Result<Record, RegistryError> {
        fields.validate()?;
        if self.fail_patches.lock().unwrap().contains(id) {
            return Err(RegistryError::provider("registry", "503 service unavailable"));
        }
        let mut records = self.records.lock().unwrap();
        let record = records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| RegistryError::provider("registry", format!("404: {}", id)))?;
        apply_patch(record, fields);
        Ok(record.clone())
    }

    async fn delete(&self, id: &str) -> Result<(), RegistryError> {
        if self.fail_deletes.lock().unwrap().contains(id) {
            return Err(RegistryError::provider("registry", "503 service unavailable"));
        }
        let mut records = self.records.lock().unwrap();
        let before = records.len();
        records.retain(|r| r.id != id);
        if records.len() == before {
            return Err(RegistryError::provider("registry", format!("404: {}", id)));
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct FakePlaces {
    pub details: Mutex<HashMap<String, PlaceDetails>>,
    pub search_results: Mutex<Vec<PlaceCandidate>>,
    pub details_calls: AtomicUsize,
    pub search_calls: AtomicUsize,
    fail_details: Mutex<HashSet<String>>,
}

impl FakePlaces {
    pub fn with_details(&self, id: &str, types: &[&str]) -> &Self {
        self.details.lock().unwrap().insert(
            id.to_string(),
            PlaceDetails {
                place_id: id.to_string(),
                name: None,
                types: types.iter().map(|s| s.to_string()).collect(),
                formatted_address: None,
                canonical_url: None,
                photos: vec![],
            },
        );
        self
    }

    pub fn set_details(&self, details: PlaceDetails) {
        self.details
            .lock()
            .unwrap()
            .insert(details.place_id.clone(), details);
    }

    pub fn set_search_results(&self, candidates: Vec<PlaceCandidate>) {
        *self.search_results.lock().unwrap() = candidates;
    }

    pub fn fail_details(&self, id: &str) {
        self.fail_details.lock().unwrap().insert(id.to_string());
    }
}

pub fn candidate(place_id: &str, name: &str, types: &[&str]) -> PlaceCandidate {
    PlaceCandidate {
        place_id: place_id.to_string(),
        name: Some(name.to_string()),
        types: types.iter().map(|s| s.to_string()).collect(),
        formatted_address: None,
    }
}

#[async_trait]
impl PlaceSearch for FakePlaces {
    async fn find_by_text(&self, _query: &str) -> Result<Vec<PlaceCandidate>, RegistryError> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.search_results.lock().unwrap().clone())
    }

    async fn get_details(&self, place_id: &str) -> Result<PlaceDetails, RegistryError> {
        self.details_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_details.lock().unwrap().contains(place_id) {
            return Err(RegistryError::provider("places", "503 service unavailable"));
        }
        self.details
            .lock()
            .unwrap()
            .get(place_id)
            .cloned()
            .ok_or_else(|| RegistryError::provider("places", format!("404: {}", place_id)))
    }
}

pub struct FakeDiscovery {
    pub response: DiscoveryResponse,
}

#[async_trait]
impl Discovery for FakeDiscovery {
    async fn discover(
        &self,
        _query: &str,
        _origin_hint: Option<&str>,
    ) -> Result<DiscoveryResponse, RegistryError> {
        Ok(self.response.clone())
    }
}
