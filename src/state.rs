use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;

use crate::config::AppConfig;
use crate::discovery::{Discovery, HttpDiscovery};
use crate::places::{HttpPlaceSearch, PlaceSearch};
use crate::registry::{HttpRecordStore, RecordStore};
use crate::resolve::PlaceResolver;

/// Everything a batch command needs, wired once at startup.
pub struct AppState {
    pub registry: Arc<dyn RecordStore>,
    pub discovery: Arc<dyn Discovery>,
    pub resolver: PlaceResolver,
    pub write_delay: Duration,
}

impl AppState {
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let places: Arc<dyn PlaceSearch> = Arc::new(HttpPlaceSearch::new(config)?);
        Ok(Self {
            registry: Arc::new(HttpRecordStore::new(config)?),
            discovery: Arc::new(HttpDiscovery::new(config)?),
            resolver: PlaceResolver::new(places),
            write_delay: config.write_delay,
        })
    }
}
