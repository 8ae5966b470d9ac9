pub mod accounting;
pub mod api;
pub mod config;
pub mod db;
pub mod errors;
pub mod metrics;
pub mod models;
pub mod vision;

use std::sync::Arc;

use crate::accounting::{AdminGuard, Authenticator, TokenLedger};
use crate::config::AppConfig;
use crate::db::UserStore;
use crate::vision::{Classifier, ImageFetcher};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn UserStore>,
    pub config: AppConfig,
    pub authenticator: Authenticator,
    pub ledger: TokenLedger,
    pub admin: AdminGuard,
    pub fetcher: ImageFetcher,
    pub classifier: Arc<dyn Classifier>,
    pub metrics_handle: metrics_exporter_prometheus::PrometheusHandle,
}

impl AppState {
    /// Wire the accounting components around `store` according to `config`.
    pub fn new(
        config: AppConfig,
        store: Arc<dyn UserStore>,
        fetcher: ImageFetcher,
        classifier: Arc<dyn Classifier>,
        metrics_handle: metrics_exporter_prometheus::PrometheusHandle,
    ) -> anyhow::Result<Self> {
        let authenticator = Authenticator::new(store.clone(), config.hash_cost())?;
        let ledger = TokenLedger::new(store.clone(), config.allow_negative_refill);
        let admin = AdminGuard::new(&config.admin_secret)?;

        Ok(Self {
            store,
            config,
            authenticator,
            ledger,
            admin,
            fetcher,
            classifier,
            metrics_handle,
        })
    }
}
