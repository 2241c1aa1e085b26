use crate::config::DashboardConfig;
use crate::error::AppError;
use crate::models::{GlobalSnapshot, HistoricalTimeline, RawTimeline, RegionRecord};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

/// HTTP client for the statistics API.
#[derive(Clone)]
pub struct StatsApi {
    client: reqwest::Client,
    config: DashboardConfig,
}

impl StatsApi {
    pub fn new(config: DashboardConfig) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, AppError> {
        let url = self.config.endpoint(path);
        debug!("GET {}", url);
        let res = self.client.get(&url).send().await?;

        let status = res.status();
        if !status.is_success() {
            let message = res.text().await.unwrap_or_default();
            warn!("{} answered {}: {}", url, status, message);
            return Err(AppError::Api { status, message });
        }

        let body = res.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    pub async fn get_worldwide(&self) -> Result<GlobalSnapshot, AppError> {
        self.get_json("all").await
    }

    pub async fn get_regions(&self) -> Result<Vec<RegionRecord>, AppError> {
        self.get_json("countries").await
    }

    pub async fn get_region(&self, code: &str) -> Result<GlobalSnapshot, AppError> {
        self.get_json(&format!("countries/{}", code)).await
    }

    pub async fn get_timeline(&self, days: u32) -> Result<HistoricalTimeline, AppError> {
        let raw: RawTimeline = self
            .get_json(&format!("historical/all?lastdays={}", days))
            .await?;
        HistoricalTimeline::try_from(raw)
    }
}
