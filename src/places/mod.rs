//! Place-search collaborator: text search and place-details lookup.

pub mod classify;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;

use crate::config::AppConfig;
use crate::error::RegistryError;

const SERVICE: &str = "places";
const DETAILS_FIELDS: &str = "place_id,name,types,formatted_address,url,photos";

/// One ranked result from a text search.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceCandidate {
    pub place_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub types: Vec<String>,
    #[serde(default)]
    pub formatted_address: Option<String>,
}

/// Details for a known place identifier.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceDetails {
    pub place_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub types: Vec<String>,
    #[serde(default)]
    pub formatted_address: Option<String>,
    #[serde(default)]
    pub canonical_url: Option<String>,
    #[serde(default)]
    pub photos: Vec<String>,
}

#[async_trait]
pub trait PlaceSearch: Send + Sync {
    /// Ranked candidates for a free-text query.
    async fn find_by_text(&self, query: &str) -> Result<Vec<PlaceCandidate>, RegistryError>;
    /// Details for one place identifier.
    async fn get_details(&self, place_id: &str) -> Result<PlaceDetails, RegistryError>;
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    candidates: Vec<PlaceCandidate>,
}

#[derive(Debug, Deserialize)]
struct DetailsResponse {
    result: PlaceDetails,
}

pub struct HttpPlaceSearch {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpPlaceSearch {
    pub fn new(config: &AppConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(15))
            .build()
            .context("Failed to create places HTTP client")?;
        Ok(Self {
            client,
            base_url: config.places_base_url.trim_end_matches('/').to_string(),
            api_key: config.places_api_key.clone(),
        })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, RegistryError> {
        let mut req = self
            .client
            .get(format!("{}{}", self.base_url, path))
            .query(query);
        if let Some(key) = &self.api_key {
            req = req.query(&[("key", key.as_str())]);
        }

        let resp = req
            .send()
            .await
            .map_err(|e| RegistryError::provider(SERVICE, e))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(RegistryError::Provider {
                service: SERVICE,
                message: status.to_string(),
            });
        }
        resp.json()
            .await
            .map_err(|e| RegistryError::provider(SERVICE, e))
    }
}

#[async_trait]
impl PlaceSearch for HttpPlaceSearch {
    async fn find_by_text(&self, query: &str) -> Result<Vec<PlaceCandidate>, RegistryError> {
        let resp: SearchResponse = self
            .get_json(
                "/findplacefromtext",
                &[("input", query), ("inputtype", "textquery")],
            )
            .await?;
        Ok(resp.candidates)
    }

    async fn get_details(&self, place_id: &str) -> Result<PlaceDetails, RegistryError> {
        let resp: DetailsResponse = self
            .get_json(
                "/details",
                &[("place_id", place_id), ("fields", DETAILS_FIELDS)],
            )
            .await?;
        Ok(resp.result)
    }
}
