use std::time::Duration;

use anyhow::Result;

/// Process configuration, read from the environment exactly once at startup
/// and passed down explicitly — no component reads env vars on its own.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub registry_base_url: String,
    pub registry_api_key: Option<String>,
    pub places_base_url: String,
    pub places_api_key: Option<String>,
    pub discovery_base_url: String,
    pub discovery_model: String,
    pub discovery_api_key: Option<String>,
    pub discovery_origin_hint: Option<String>,
    /// Pause between mutating collaborator calls, to stay inside third-party
    /// rate limits. Keep within roughly 150–400 ms.
    pub write_delay: Duration,
}

fn optional(key: &str) -> Option<String> {
    dotenv::var(key).ok().filter(|v| !v.is_empty())
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let write_delay_ms = dotenv::var("WRITE_DELAY_MS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(250);

        Ok(Self {
            registry_base_url: dotenv::var("REGISTRY_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:8080".to_string()),
            registry_api_key: optional("REGISTRY_API_KEY"),
            places_base_url: dotenv::var("PLACES_BASE_URL")
                .unwrap_or_else(|_| "https://maps.googleapis.com/maps/api/place".to_string()),
            places_api_key: optional("PLACES_API_KEY"),
            discovery_base_url: dotenv::var("DISCOVERY_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:8787".to_string()),
            discovery_model: dotenv::var("DISCOVERY_MODEL")
                .unwrap_or_else(|_| "gemini-2.0-flash".to_string()),
            discovery_api_key: optional("DISCOVERY_API_KEY"),
            discovery_origin_hint: optional("DISCOVERY_ORIGIN_HINT"),
            write_delay: Duration::from_millis(write_delay_ms),
        })
    }
}
