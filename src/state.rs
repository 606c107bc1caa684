//! Shared application state
//!
//! Estado compartido de la aplicación que se pasa a través del router de
//! Axum y de los jobs de cron.

use std::sync::Arc;

use reqwest::Client;
use sqlx::PgPool;

use crate::config::environment::EnvironmentConfig;
use crate::services::routing_service::{HaversineEstimator, RouteEstimator};
use crate::services::trip_optimizer_service::OptimizerClient;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: EnvironmentConfig,
    pub http_client: Client,
    pub optimizer: OptimizerClient,
    pub estimator: Arc<dyn RouteEstimator>,
}

impl AppState {
    pub fn new(pool: PgPool, config: EnvironmentConfig) -> Self {
        let http_client = Client::new();
        let optimizer = OptimizerClient::new(http_client.clone(), config.optimizer_config());
        let estimator: Arc<dyn RouteEstimator> =
            Arc::new(HaversineEstimator::new(config.avg_speed_kmh));
        Self {
            pool,
            config,
            http_client,
            optimizer,
            estimator,
        }
    }
}
