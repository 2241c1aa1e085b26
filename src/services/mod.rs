pub mod stats;

use crate::config::DashboardConfig;
use crate::error::AppError;
use crate::models::{GlobalSnapshot, HistoricalTimeline, RegionRecord, Selection};
use async_trait::async_trait;
use stats::StatsApi;

#[async_trait]
pub trait StatsService: Clone + Send + Sync + 'static {
    async fn fetch_snapshot(&self, selection: &Selection) -> Result<GlobalSnapshot, AppError>;
    async fn fetch_regions(&self) -> Result<Vec<RegionRecord>, AppError>;
    async fn fetch_timeline(&self, days: u32) -> Result<HistoricalTimeline, AppError>;
}

#[derive(Clone)]
pub struct ProductionStatsService {
    api: StatsApi,
}

impl ProductionStatsService {
    pub fn new(config: DashboardConfig) -> Result<Self, AppError> {
        Ok(Self {
            api: StatsApi::new(config)?,
        })
    }

    pub fn config(&self) -> &DashboardConfig {
        self.api.config()
    }
}

#[async_trait]
impl StatsService for ProductionStatsService {
    async fn fetch_snapshot(&self, selection: &Selection) -> Result<GlobalSnapshot, AppError> {
        match selection {
            Selection::Worldwide => self.api.get_worldwide().await,
            Selection::Region(code) => self.api.get_region(code).await,
        }
    }

    async fn fetch_regions(&self) -> Result<Vec<RegionRecord>, AppError> {
        self.api.get_regions().await
    }

    async fn fetch_timeline(&self, days: u32) -> Result<HistoricalTimeline, AppError> {
        self.api.get_timeline(days).await
    }
}
