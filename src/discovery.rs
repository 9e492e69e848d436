//! Generative-discovery collaborator: a text/search model behind an HTTP
//! proxy that proposes candidate buildings for a query, together with
//! map-grounding evidence to corroborate or correct its free-text output.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::config::AppConfig;
use crate::error::RegistryError;

const SERVICE: &str = "discovery";

/// A candidate building proposed by the model. Coordinates are the model's
/// own guess and are only trusted after grounding reconciliation.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveredCandidate {
    pub name: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub style: Option<String>,
    pub lat: f64,
    pub lng: f64,
    #[serde(default)]
    pub is_prioritized: Option<bool>,
    #[serde(default)]
    pub architect: Option<String>,
}

/// One chunk of map-grounding evidence returned alongside the candidates.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroundingChunk {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lng: Option<f64>,
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default)]
    pub place_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveryResponse {
    #[serde(default)]
    pub candidates: Vec<DiscoveredCandidate>,
    #[serde(default)]
    pub grounding_evidence: Vec<GroundingChunk>,
}

#[async_trait]
pub trait Discovery: Send + Sync {
    async fn discover(
        &self,
        query: &str,
        origin_hint: Option<&str>,
    ) -> Result<DiscoveryResponse, RegistryError>;
}

pub struct HttpDiscovery {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl HttpDiscovery {
    pub fn new(config: &AppConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .context("Failed to create discovery HTTP client")?;
        Ok(Self {
            client,
            base_url: config.discovery_base_url.trim_end_matches('/').to_string(),
            model: config.discovery_model.clone(),
            api_key: config.discovery_api_key.clone(),
        })
    }
}

#[async_trait]
impl Discovery for HttpDiscovery {
    async fn discover(
        &self,
        query: &str,
        origin_hint: Option<&str>,
    ) -> Result<DiscoveryResponse, RegistryError> {
        let body = serde_json::json!({
            "model": self.model,
            "query": query,
            "originHint": origin_hint,
        });

        let mut req = self
            .client
            .post(format!("{}/discover", self.base_url))
            .json(&body);
        if let Some(key) = &self.api_key {
            req = req.header("Authorization", format!("Bearer {}", key));
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

        let parsed: DiscoveryResponse = resp
            .json()
            .await
            .map_err(|e| RegistryError::provider(SERVICE, e))?;
        debug!(
            query,
            candidates = parsed.candidates.len(),
            grounding = parsed.grounding_evidence.len(),
            "discovery response"
        );
        Ok(parsed)
    }
}
