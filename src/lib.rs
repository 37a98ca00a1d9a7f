pub mod actions;
pub mod api;
pub mod cli;
pub mod client;
pub mod config;
pub mod db;
pub mod forms;
pub mod ui;
pub mod utils;

pub use db::DbPool;

use arc_swap::ArcSwap;
use config::Config;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;

use crate::api::rate_limit::RateLimiter;
use crate::db::SiteSettings;

pub struct AppState {
    pub config: Config,
    pub db: DbPool,
    pub rate_limiter: Arc<RateLimiter>,
    /// Current site settings, replaced whole on every save
    pub settings: ArcSwap<SiteSettings>,
    /// Outbound client for the chat upstream
    pub http: reqwest::Client,
    pub metrics_handle: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(config: Config, db: DbPool, settings: SiteSettings) -> Self {
        let rate_limiter = Arc::new(RateLimiter::new(config.rate_limit.clone()));
        Self {
            config,
            db,
            rate_limiter,
            settings: ArcSwap::from_pointee(settings),
            http: reqwest::Client::new(),
            metrics_handle: None,
        }
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics_handle = Some(handle);
        self
    }

    pub fn settings(&self) -> Arc<SiteSettings> {
        self.settings.load_full()
    }
}

/// State over a fresh in-memory database, for tests
#[cfg(test)]
pub(crate) async fn test_state() -> Arc<AppState> {
    test_state_with(Config::default()).await
}

#[cfg(test)]
pub(crate) async fn test_state_with(mut config: Config) -> Arc<AppState> {
    config.auth.admin_token = "test-admin-token".to_string();
    let db = db::init_memory().await.unwrap();
    Arc::new(AppState::new(config, db, SiteSettings::default()))
}
