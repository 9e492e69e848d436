//! The record store collaborator: a paginated REST store of building records
//! keyed by an opaque row id.
//!
//! Mutation follows read-modify-write and is not atomic. The pipeline assumes
//! a single background writer at a time; two concurrent writers to the same
//! record can lose an update.

pub mod types;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::AppConfig;
use crate::error::RegistryError;
use types::{RawRecord, Record, RecordPatch};

const SERVICE: &str = "registry";
const PAGE_LIMIT: usize = 100;

#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Every record in the store, hidden ones included — duplicate and
    /// existence checks must see soft-deleted rows.
    async fn list_all(&self) -> Result<Vec<Record>, RegistryError>;
    async fn get(&self, id: &str) -> Result<Record, RegistryError>;
    async fn create(&self, fields: &RecordPatch) -> Result<Record, RegistryError>;
    async fn patch(&self, id: &str, fields: &RecordPatch) -> Result<Record, RegistryError>;
    async fn delete(&self, id: &str) -> Result<(), RegistryError>;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecordPage {
    records: Vec<RawRecord>,
    #[serde(default)]
    next_offset: Option<usize>,
}

pub struct HttpRecordStore {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpRecordStore {
    pub fn new(config: &AppConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("Failed to create registry HTTP client")?;
        Ok(Self {
            client,
            base_url: config.registry_base_url.trim_end_matches('/').to_string(),
            api_key: config.registry_api_key.clone(),
        })
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let mut req = self
            .client
            .request(method, format!("{}{}", self.base_url, path));
        if let Some(key) = &self.api_key {
            req = req.header("Authorization", format!("Bearer {}", key));
        }
        req
    }

    async fn send(&self, req: reqwest::RequestBuilder) -> Result<reqwest::Response, RegistryError> {
        let resp = req
            .send()
            .await
            .map_err(|e| RegistryError::provider(SERVICE, e))?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(RegistryError::Provider {
                service: SERVICE,
                message: format!("{}: {}", status, body.chars().take(200).collect::<String>()),
            });
        }
        Ok(resp)
    }

    async fn parse_record(&self, resp: reqwest::Response) -> Result<Record, RegistryError> {
        let raw: RawRecord = resp
            .json()
            .await
            .map_err(|e| RegistryError::provider(SERVICE, e))?;
        raw.into_record()
    }
}

#[async_trait]
impl RecordStore for HttpRecordStore {
    async fn list_all(&self) -> Result<Vec<Record>, RegistryError> {
        let mut records = Vec::new();
        let mut offset = 0usize;

        loop {
            let resp = self
                .send(self.request(
                    reqwest::Method::GET,
                    &format!("/records?offset={}&limit={}", offset, PAGE_LIMIT),
                ))
                .await?;
            let page: RecordPage = resp
                .json()
                .await
                .map_err(|e| RegistryError::provider(SERVICE, e))?;

            let page_len = page.records.len();
            for raw in page.records {
                let id = raw.id.clone();
                match raw.into_record() {
                    Ok(record) => records.push(record),
                    // A malformed historical row must not sink a whole sweep.
                    Err(e) => warn!(record_id = %id, error = %e, "skipping unmappable record"),
                }
            }

            match page.next_offset {
                Some(next) if page_len > 0 => offset = next,
                _ => break,
            }
        }

        debug!(count = records.len(), "registry listed");
        Ok(records)
    }

    async fn get(&self, id: &str) -> Result<Record, RegistryError> {
        let resp = self
            .send(self.request(reqwest::Method::GET, &format!("/records/{}", id)))
            .await?;
        self.parse_record(resp).await
    }

    async fn create(&self, fields: &RecordPatch) -> Result<Record, RegistryError> {
        fields.validate()?;
        if fields.name.is_none() {
            return Err(RegistryError::Validation("create requires a name".into()));
        }
        if fields.lat.is_none() || fields.lng.is_none() {
            return Err(RegistryError::Validation(
                "create requires coordinates".into(),
            ));
        }
        let resp = self
            .send(self.request(reqwest::Method::POST, "/records").json(fields))
            .await?;
        self.parse_record(resp).await
    }

    async fn patch(&self, id: &str, fields: &RecordPatch) -> Result<Record, RegistryError> {
        fields.validate()?;
        let resp = self
            .send(
                self.request(reqwest::Method::PATCH, &format!("/records/{}", id))
                    .json(fields),
            )
            .await?;
        self.parse_record(resp).await
    }

    async fn delete(&self, id: &str) -> Result<(), RegistryError> {
        self.send(self.request(reqwest::Method::DELETE, &format!("/records/{}", id)))
            .await?;
        debug!(record_id = %id, "record deleted");
        Ok(())
    }
}
