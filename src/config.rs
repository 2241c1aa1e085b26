use crate::error::AppError;
use once_cell::sync::Lazy;
use std::time::Duration;

pub const API_URL_ENV: &str = "OUTBREAK_API_URL";
pub const DEFAULT_API_ROOT: &str = "https://disease.sh/v3/covid-19";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_HISTORY_DAYS: u32 = 120;

static API_BASE: Lazy<String> = Lazy::new(|| {
    std::env::var(API_URL_ENV).unwrap_or_else(|_| DEFAULT_API_ROOT.to_string())
});

#[derive(Clone, Debug, PartialEq)]
pub struct DashboardConfig {
    pub api_root: String,
    pub request_timeout: Duration,
    pub history_days: u32,
    /// Periodic re-fetch of the region collection and current snapshot.
    /// Off unless set.
    pub refresh_interval: Option<Duration>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            api_root: API_BASE.clone(),
            request_timeout: DEFAULT_TIMEOUT,
            history_days: DEFAULT_HISTORY_DAYS,
            refresh_interval: None,
        }
    }
}

impl DashboardConfig {
    /// Reads the API root from the environment on every call, unlike
    /// `Default`, which caches it for the life of the process.
    pub fn from_env() -> Result<Self, AppError> {
        let api_root = match std::env::var(API_URL_ENV) {
            Ok(value) => value,
            Err(std::env::VarError::NotPresent) => DEFAULT_API_ROOT.to_string(),
            Err(e) => return Err(AppError::Config(format!("{}: {}", API_URL_ENV, e))),
        };
        Self {
            api_root,
            ..Self::default()
        }
        .validated()
    }

    pub fn with_api_root(mut self, root: impl Into<String>) -> Self {
        self.api_root = root.into();
        self
    }

    pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = Some(interval);
        self
    }

    pub fn validated(mut self) -> Result<Self, AppError> {
        let trimmed = self.api_root.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            return Err(AppError::Config("API root URL is empty".to_string()));
        }
        if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
            return Err(AppError::Config(format!(
                "API root URL must be http(s): {}",
                trimmed
            )));
        }
        if self.history_days == 0 {
            return Err(AppError::Config("history window must be at least one day".to_string()));
        }
        if self.refresh_interval == Some(Duration::ZERO) {
            return Err(AppError::Config("refresh interval must be non-zero".to_string()));
        }
        self.api_root = trimmed.to_string();
        Ok(self)
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.api_root, path.trim_start_matches('/'))
    }
}
